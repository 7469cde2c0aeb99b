//! Structural equality over the schema tree that ignores everything the
//! canonical printer is allowed to change: source locations, trivia, and
//! expression-blob indentation.

use crate::ast::*;

/// Position-insensitive structural equality.
///
/// Optional fields compare symmetrically: both absent is equal, exactly one
/// absent is unequal. Expression blobs compare as sequences of trimmed
/// lines, so re-indentation by the printer is invisible.
pub trait CodeEq {
    /// Whether `self` and `other` are the same code.
    fn code_eq(&self, other: &Self) -> bool;
}

impl<T: CodeEq> CodeEq for Option<T> {
    fn code_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => a.code_eq(b),
            _ => false,
        }
    }
}

impl<T: CodeEq> CodeEq for Box<T> {
    fn code_eq(&self, other: &Self) -> bool {
        (**self).code_eq(&**other)
    }
}

impl<T: CodeEq> CodeEq for Vec<T> {
    fn code_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.code_eq(b))
    }
}

impl CodeEq for Name {
    fn code_eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl CodeEq for Expr {
    fn code_eq(&self, other: &Self) -> bool {
        normalized_lines(&self.text).eq(normalized_lines(&other.text))
    }
}

/// Trimmed lines of a blob, with leading and trailing blank lines removed.
fn normalized_lines(text: &str) -> impl Iterator<Item = &str> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);
    lines.into_iter().take(end).skip(start)
}

impl CodeEq for Document {
    fn code_eq(&self, other: &Self) -> bool {
        self.declarations.code_eq(&other.declarations)
    }
}

impl CodeEq for Declaration {
    fn code_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Declaration::AccessProvider(a), Declaration::AccessProvider(b)) => a.code_eq(b),
            (Declaration::Collection(a), Declaration::Collection(b)) => a.code_eq(b),
            (Declaration::Function(a), Declaration::Function(b)) => a.code_eq(b),
            (Declaration::Role(a), Declaration::Role(b)) => a.code_eq(b),
            _ => false,
        }
    }
}

impl CodeEq for AccessProvider {
    fn code_eq(&self, other: &Self) -> bool {
        self.name.code_eq(&other.name) && self.members.code_eq(&other.members)
    }
}

impl CodeEq for AccessProviderMember {
    fn code_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                AccessProviderMember::Issuer { value: a, .. },
                AccessProviderMember::Issuer { value: b, .. },
            ) => a.code_eq(b),
            (
                AccessProviderMember::JwksUri { value: a, .. },
                AccessProviderMember::JwksUri { value: b, .. },
            ) => a.code_eq(b),
            (
                AccessProviderMember::Role { role: a, .. },
                AccessProviderMember::Role { role: b, .. },
            ) => a.code_eq(b),
            (
                AccessProviderMember::Ttl { value: a, .. },
                AccessProviderMember::Ttl { value: b, .. },
            ) => a == b,
            _ => false,
        }
    }
}

impl CodeEq for Collection {
    fn code_eq(&self, other: &Self) -> bool {
        self.name.code_eq(&other.name)
            && self.alias.code_eq(&other.alias)
            && self.members.code_eq(&other.members)
    }
}

impl CodeEq for CollectionMember {
    fn code_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CollectionMember::Field(a), CollectionMember::Field(b)) => a.code_eq(b),
            (CollectionMember::Computed(a), CollectionMember::Computed(b)) => a.code_eq(b),
            (CollectionMember::Check(a), CollectionMember::Check(b)) => a.code_eq(b),
            (CollectionMember::Unique(a), CollectionMember::Unique(b)) => a.code_eq(b),
            (CollectionMember::Index(a), CollectionMember::Index(b)) => a.code_eq(b),
            (CollectionMember::HistoryDays(a), CollectionMember::HistoryDays(b)) => a.code_eq(b),
            (CollectionMember::TtlDays(a), CollectionMember::TtlDays(b)) => a.code_eq(b),
            (CollectionMember::DocumentTtls(a), CollectionMember::DocumentTtls(b)) => {
                a.code_eq(b)
            }
            (CollectionMember::Migrations(a), CollectionMember::Migrations(b)) => a.code_eq(b),
            _ => false,
        }
    }
}

impl CodeEq for FieldDefinition {
    fn code_eq(&self, other: &Self) -> bool {
        self.name.code_eq(&other.name) && self.ty.code_eq(&other.ty)
    }
}

impl CodeEq for ComputedField {
    fn code_eq(&self, other: &Self) -> bool {
        self.name.code_eq(&other.name)
            && self.ty.code_eq(&other.ty)
            && self.body.code_eq(&other.body)
    }
}

impl CodeEq for CheckConstraint {
    fn code_eq(&self, other: &Self) -> bool {
        self.name.code_eq(&other.name) && self.predicate.code_eq(&other.predicate)
    }
}

impl CodeEq for UniqueConstraint {
    fn code_eq(&self, other: &Self) -> bool {
        self.terms.code_eq(&other.terms)
    }
}

impl CodeEq for IndexDefinition {
    fn code_eq(&self, other: &Self) -> bool {
        self.name.code_eq(&other.name) && self.body.code_eq(&other.body)
    }
}

impl CodeEq for DaysMember {
    fn code_eq(&self, other: &Self) -> bool {
        self.days == other.days
    }
}

impl CodeEq for FlagMember {
    fn code_eq(&self, other: &Self) -> bool {
        self.enabled == other.enabled
    }
}

impl CodeEq for MigrationsBlock {
    fn code_eq(&self, other: &Self) -> bool {
        self.body.code_eq(&other.body)
    }
}

impl CodeEq for Function {
    fn code_eq(&self, other: &Self) -> bool {
        self.name.code_eq(&other.name)
            && self.params.code_eq(&other.params)
            && self.ret.code_eq(&other.ret)
            && self.body.code_eq(&other.body)
            && self.role.code_eq(&other.role)
    }
}

impl CodeEq for Parameter {
    fn code_eq(&self, other: &Self) -> bool {
        self.name.code_eq(&other.name) && self.ty.code_eq(&other.ty)
    }
}

impl CodeEq for Role {
    fn code_eq(&self, other: &Self) -> bool {
        self.name.code_eq(&other.name) && self.members.code_eq(&other.members)
    }
}

impl CodeEq for RoleMember {
    fn code_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RoleMember::Privileges(a), RoleMember::Privileges(b)) => a.code_eq(b),
            (RoleMember::Membership(a), RoleMember::Membership(b)) => a.code_eq(b),
            _ => false,
        }
    }
}

impl CodeEq for Privileges {
    fn code_eq(&self, other: &Self) -> bool {
        self.resource.code_eq(&other.resource) && self.actions.code_eq(&other.actions)
    }
}

impl CodeEq for Action {
    fn code_eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.predicate.code_eq(&other.predicate)
    }
}

impl CodeEq for Membership {
    fn code_eq(&self, other: &Self) -> bool {
        self.collection.code_eq(&other.collection) && self.predicate.code_eq(&other.predicate)
    }
}

impl CodeEq for Type {
    fn code_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Named(a), Type::Named(b)) => a.code_eq(b),
            (Type::Object(a), Type::Object(b)) => {
                a.fields.code_eq(&b.fields) && a.wildcard.code_eq(&b.wildcard)
            }
            (Type::Union(al, ar), Type::Union(bl, br)) => al.code_eq(bl) && ar.code_eq(br),
            (Type::Optional(a), Type::Optional(b)) => a.code_eq(b),
            (Type::Template(an, ap), Type::Template(bn, bp)) => {
                an.code_eq(bn) && ap.code_eq(bp)
            }
            (Type::Tuple(a), Type::Tuple(b)) => a.code_eq(b),
            (Type::StringLiteral(a), Type::StringLiteral(b)) => a.code_eq(b),
            (Type::NumberLiteral(a), Type::NumberLiteral(b)) => a.code_eq(b),
            (Type::Function(a), Type::Function(b)) => {
                a.params.code_eq(&b.params) && a.ret.code_eq(&b.ret)
            }
            (Type::Isolated(a), Type::Isolated(b)) => a.code_eq(b),
            _ => false,
        }
    }
}

impl CodeEq for ObjectTypeField {
    fn code_eq(&self, other: &Self) -> bool {
        self.key.code_eq(&other.key)
            && self.optional == other.optional
            && self.ty.code_eq(&other.ty)
    }
}

impl CodeEq for FunctionTypeParams {
    fn code_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FunctionTypeParams::Short(a), FunctionTypeParams::Short(b)) => a.code_eq(b),
            (
                FunctionTypeParams::Long { params: ap, variadic: av },
                FunctionTypeParams::Long { params: bp, variadic: bv },
            ) => av == bv && ap.code_eq(bp),
            _ => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn blob_equality_ignores_indentation() {
        let a = Expr::new("\n  doc.balance >= 0\n");
        let b = Expr::new("doc.balance >= 0");
        assert!(a.code_eq(&b));
    }

    #[test]
    fn blob_equality_is_line_sensitive() {
        let a = Expr::new("a\nb");
        let b = Expr::new("a b");
        assert!(!a.code_eq(&b));
    }

    #[test]
    fn optional_fields_compare_symmetrically() {
        let none: Option<Expr> = None;
        let some = Some(Expr::new("true"));
        assert!(none.code_eq(&None));
        assert!(!none.code_eq(&some));
        assert!(!some.code_eq(&none));
    }

    #[test]
    fn names_ignore_locations() {
        use std::rc::Rc;
        let mut a = Name::new("Users");
        a.loc = Some(Location {
            file: Some(Rc::from("a.fsl")),
            index: 10,
            line: 2,
            column: 3,
        });
        let b = Name::new("Users");
        assert!(a.code_eq(&b));
    }
}
