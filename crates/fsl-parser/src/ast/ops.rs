//! Whole-tree operations: filtering, removal, sorting, merging, listing.

use serde::Serialize;

use crate::ast::{
    Declaration, DeclarationKind, Document, Function, Role, RoleMember,
};

/// One entry of [`Document::summaries`], shaped for the declarations JSON
/// listing: `{"type": ..., "name": ..., "resources": [...]?}`.
#[derive(Clone, Debug, Serialize)]
pub struct DeclarationSummary {
    /// The declaration kind.
    #[serde(rename = "type")]
    pub kind: DeclarationKind,
    /// The declared name.
    pub name: String,
    /// For roles only: the privilege resources, in member order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
}

impl Document {
    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Whether the document has no declarations.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// A new tree holding deep clones of the declarations of one kind.
    ///
    /// Trivia attached to the kept declarations travels with them (comment
    /// handles are shared, not copied); the document's trailing trivia does
    /// not.
    pub fn filter(&self, kind: DeclarationKind) -> Document {
        Document {
            declarations: self
                .declarations
                .iter()
                .filter(|d| d.kind() == kind)
                .cloned()
                .collect(),
            trailing: Vec::new(),
        }
    }

    /// Remove the first declaration matching `kind` and `name` in place.
    /// Returns whether anything was removed.
    pub fn remove(&mut self, kind: DeclarationKind, name: &str) -> bool {
        match self
            .declarations
            .iter()
            .position(|d| d.kind() == kind && d.name().text == name)
        {
            Some(index) => {
                self.declarations.remove(index);
                true
            }
            None => false,
        }
    }

    /// Delete, from every role, the privilege members granted on `resource`.
    pub fn strip_roles_resource(&mut self, resource: &str) {
        for role in self.roles_mut() {
            role.members.retain(|member| match member {
                RoleMember::Privileges(p) => p.resource.text != resource,
                RoleMember::Membership(_) => true,
            });
        }
    }

    /// Stable sort by kind tag, then by name.
    pub fn sort(&mut self) {
        self.declarations
            .sort_by(|a, b| (a.kind(), &a.name().text).cmp(&(b.kind(), &b.name().text)));
    }

    /// Concatenate two trees, consuming both.
    pub fn merge(mut self, other: Document) -> Document {
        self.declarations.extend(other.declarations);
        self.trailing.extend(other.trailing);
        self
    }

    /// Summaries of every declaration, in order.
    pub fn summaries(&self) -> Vec<DeclarationSummary> {
        self.declarations
            .iter()
            .map(|decl| DeclarationSummary {
                kind: decl.kind(),
                name: decl.name().text.clone(),
                resources: match decl {
                    Declaration::Role(role) => Some(
                        role.members
                            .iter()
                            .filter_map(|m| match m {
                                RoleMember::Privileges(p) => Some(p.resource.text.clone()),
                                RoleMember::Membership(_) => None,
                            })
                            .collect(),
                    ),
                    _ => None,
                },
            })
            .collect()
    }

    /// The function declarations, in order.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Function(f) => Some(f),
            _ => None,
        })
    }

    /// Mutable view of the function declarations, in order.
    pub fn functions_mut(&mut self) -> impl Iterator<Item = &mut Function> {
        self.declarations.iter_mut().filter_map(|d| match d {
            Declaration::Function(f) => Some(f),
            _ => None,
        })
    }

    /// Mutable view of the role declarations, in order.
    pub fn roles_mut(&mut self) -> impl Iterator<Item = &mut Role> {
        self.declarations.iter_mut().filter_map(|d| match d {
            Declaration::Role(r) => Some(r),
            _ => None,
        })
    }
}

#[cfg(test)]
mod test {
    use crate::ast::DeclarationKind;
    use crate::Parser;

    const SCHEMA: &str = r#"
role viewer {
  privileges Orders {
    read
  }
  privileges Users {
    read
  }
}

collection Users {
  name: String
}

function greet() {
  "hello"
}
"#;

    #[test]
    fn filter_keeps_exactly_one_kind() {
        let doc = Parser::new(SCHEMA).parse().unwrap();
        let roles = doc.filter(DeclarationKind::Role);
        assert_eq!(1, roles.len());
        assert_eq!("viewer", roles.declarations[0].name().text);
        // The source tree is untouched.
        assert_eq!(3, doc.len());
    }

    #[test]
    fn remove_shrinks_by_one_only_on_match() {
        let mut doc = Parser::new(SCHEMA).parse().unwrap();
        assert!(!doc.remove(DeclarationKind::Collection, "Orders"));
        assert_eq!(3, doc.len());
        assert!(doc.remove(DeclarationKind::Collection, "Users"));
        assert_eq!(2, doc.len());
    }

    #[test]
    fn sort_orders_by_kind_then_name() {
        let mut doc = Parser::new(SCHEMA).parse().unwrap();
        doc.sort();
        let names: Vec<&str> = doc
            .declarations
            .iter()
            .map(|d| d.name().text.as_str())
            .collect();
        assert_eq!(vec!["Users", "greet", "viewer"], names);
    }

    #[test]
    fn strip_roles_resource_deletes_matching_privileges() {
        let mut doc = Parser::new(SCHEMA).parse().unwrap();
        doc.strip_roles_resource("Orders");
        let summaries = doc.summaries();
        assert_eq!(summaries[0].resources.as_deref(), Some(&["Users".to_string()][..]));
    }

    #[test]
    fn summaries_shape() {
        let doc = Parser::new(SCHEMA).parse().unwrap();
        let json = serde_json::to_value(doc.summaries()).unwrap();
        assert_eq!(
            json[0]["type"], "role",
            "roles serialize with a type tag: {json}"
        );
        assert_eq!(json[0]["resources"][0], "Orders");
        assert!(json[1].get("resources").is_none());
    }

    #[test]
    fn merge_concatenates() {
        let a = Parser::new("collection A {\n  x: Int\n}").parse().unwrap();
        let b = Parser::new("collection B {\n  y: Int\n}").parse().unwrap();
        let merged = a.merge(b);
        assert_eq!(2, merged.len());
        assert_eq!("A", merged.declarations[0].name().text);
        assert_eq!("B", merged.declarations[1].name().text);
    }
}
