//! Merging of same-named role declarations.

use thiserror::Error;

use fsl_parser::ast::{
    ActionKind, CodeEq, Declaration, Document, Membership, Privileges, Role, RoleMember,
};

/// Conflicts found while merging role declarations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeRolesError {
    /// The same action on the same resource was granted twice with
    /// predicates that are not code-equal.
    #[error("duplicate `{action}` privilege on `{resource}` with conflicting predicates")]
    DuplicateAction {
        /// The privilege resource.
        resource: String,
        /// The conflicting action.
        action: ActionKind,
    },
    /// The same collection was given two memberships that are not
    /// code-equal.
    #[error("duplicate membership for `{collection}` with conflicting predicates")]
    DuplicateMembership {
        /// The membership collection.
        collection: String,
    },
}

/// Consolidate multiple declarations of the same role into one, consuming
/// the document.
///
/// Privileges on the same resource union their actions; an action granted
/// twice collapses when its predicates are code-equal and conflicts
/// otherwise. Memberships for the same collection must be code-equal.
/// Output order: non-role declarations first in original order, then roles
/// in first-seen order. Idempotent.
pub fn merge_roles(document: Document) -> Result<Document, MergeRolesError> {
    let mut others: Vec<Declaration> = Vec::new();
    let mut roles: Vec<Role> = Vec::new();

    for declaration in document.declarations {
        match declaration {
            Declaration::Role(role) => {
                match roles.iter().position(|r| r.name.text == role.name.text) {
                    Some(index) => merge_into(&mut roles[index], role)?,
                    None => roles.push(role),
                }
            }
            other => others.push(other),
        }
    }

    others.extend(roles.into_iter().map(Declaration::Role));
    Ok(Document {
        declarations: others,
        trailing: document.trailing,
    })
}

fn merge_into(existing: &mut Role, incoming: Role) -> Result<(), MergeRolesError> {
    for member in incoming.members {
        match member {
            RoleMember::Privileges(privileges) => merge_privileges(existing, privileges)?,
            RoleMember::Membership(membership) => merge_membership(existing, membership)?,
        }
    }
    Ok(())
}

fn merge_privileges(role: &mut Role, incoming: Privileges) -> Result<(), MergeRolesError> {
    let position = role.members.iter().position(|member| {
        matches!(member, RoleMember::Privileges(p) if p.resource.text == incoming.resource.text)
    });
    let Some(position) = position else {
        role.members.push(RoleMember::Privileges(incoming));
        return Ok(());
    };
    if let RoleMember::Privileges(existing) = &mut role.members[position] {
        for action in incoming.actions {
            match existing.actions.iter().find(|a| a.kind == action.kind) {
                Some(previous) => {
                    if !previous.predicate.code_eq(&action.predicate) {
                        return Err(MergeRolesError::DuplicateAction {
                            resource: existing.resource.text.clone(),
                            action: action.kind,
                        });
                    }
                }
                None => existing.actions.push(action),
            }
        }
    }
    Ok(())
}

fn merge_membership(role: &mut Role, incoming: Membership) -> Result<(), MergeRolesError> {
    let position = role.members.iter().position(|member| {
        matches!(member, RoleMember::Membership(m) if m.collection.text == incoming.collection.text)
    });
    let Some(position) = position else {
        role.members.push(RoleMember::Membership(incoming));
        return Ok(());
    };
    if let RoleMember::Membership(existing) = &role.members[position] {
        if !existing.code_eq(&incoming) {
            return Err(MergeRolesError::DuplicateMembership {
                collection: incoming.collection.text,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use fsl_parser::ast::CodeEq;
    use fsl_parser::Parser;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn merged(input: &str) -> Result<Document, MergeRolesError> {
        merge_roles(Parser::new(input).parse().unwrap())
    }

    #[test]
    fn unions_actions_across_declarations() {
        let document = merged(indoc! {"
            role R {
              privileges Users {
                read
              }
            }

            role R {
              privileges Users {
                write
              }
            }
        "})
        .unwrap();
        assert_eq!(
            fsl_encoder::encode(&document),
            indoc! {"
                role R {
                  privileges Users {
                    read
                    write
                  }
                }
            "},
        );
    }

    #[test]
    fn equal_predicates_collapse() {
        let document = merged(indoc! {"
            role R {
              privileges Users {
                read {
                  .active
                }
              }
            }

            role R {
              privileges Users {
                read {
                  .active
                }
              }
            }
        "})
        .unwrap();
        let summaries = document.summaries();
        assert_eq!(1, summaries.len());
        assert!(fsl_encoder::encode(&document).matches("read").count() == 1);
    }

    #[test]
    fn conflicting_predicates_fail() {
        let err = merged(indoc! {"
            role R {
              privileges Users {
                read {
                  .active
                }
              }
            }

            role R {
              privileges Users {
                read {
                  .archived
                }
              }
            }
        "})
        .unwrap_err();
        assert_eq!(
            MergeRolesError::DuplicateAction {
                resource: "Users".to_string(),
                action: ActionKind::Read,
            },
            err,
        );
    }

    #[test]
    fn conflicting_memberships_fail() {
        let err = merged(indoc! {"
            role R {
              membership Users {
                .a
              }
            }

            role R {
              membership Users {
                .b
              }
            }
        "})
        .unwrap_err();
        assert_eq!(
            MergeRolesError::DuplicateMembership {
                collection: "Users".to_string(),
            },
            err,
        );
    }

    #[test]
    fn non_roles_come_first_then_roles_in_first_seen_order() {
        let document = merged(indoc! {"
            role B {
              membership Users
            }

            collection Users {
              name: String
            }

            role A {
              membership Users
            }

            role B {
              privileges Users {
                read
              }
            }
        "})
        .unwrap();
        let names: Vec<&str> = document
            .declarations
            .iter()
            .map(|d| d.name().text.as_str())
            .collect();
        assert_eq!(vec!["Users", "B", "A"], names);
    }

    #[test]
    fn merging_is_idempotent() {
        let input = indoc! {"
            role R {
              privileges Users {
                read
              }
              membership Users
            }

            role R {
              privileges Users {
                write
              }
              privileges Orders {
                read
              }
            }
        "};
        let once = merged(input).unwrap();
        let twice = merge_roles(once.clone()).unwrap();
        assert!(once.code_eq(&twice));
    }
}
