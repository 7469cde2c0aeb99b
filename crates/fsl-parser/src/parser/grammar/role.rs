use crate::ast::{Action, ActionKind, Extras, Membership, Privileges, Role, RoleMember};
use crate::parser::Parser;
use crate::{Error, TokenKind};

/// *Role*:
///     **role** Name **{** RoleMember* **}**
pub(crate) fn role(p: &mut Parser<'_>, leading: Extras) -> Result<Role, Error> {
    let keyword = p.expect_keyword("role")?;
    let name = p.expect_name()?;
    p.expect(TokenKind::LCurly)?;

    let mut members = Vec::new();
    loop {
        p.eat_separators()?;
        if p.at(TokenKind::RCurly)? {
            break;
        }
        let member_leading = p.take_extras();
        members.push(member(p, member_leading)?);
    }
    p.expect(TokenKind::RCurly)?;

    Ok(Role {
        name: p.name_node(&name),
        members,
        leading,
        loc: Some(p.location(&keyword)),
    })
}

/// *RoleMember*:
///     **privileges** Name **{** Action* **}**
///     | **membership** Name ExprBlock?
fn member(p: &mut Parser<'_>, leading: Extras) -> Result<RoleMember, Error> {
    let token = p.peek()?;
    match token.data() {
        "privileges" => {
            p.pop()?;
            let resource = p.expect_name()?;
            p.expect(TokenKind::LCurly)?;
            let mut actions = Vec::new();
            loop {
                p.eat_separators()?;
                if p.at(TokenKind::RCurly)? {
                    break;
                }
                let action_leading = p.take_extras();
                let keyword = p.expect_name()?;
                let Some(kind) = ActionKind::from_keyword(keyword.data()) else {
                    return Err(p.error("a privilege action", &keyword));
                };
                let predicate = if p.at(TokenKind::LCurly)? {
                    Some(p.expr_block()?)
                } else {
                    None
                };
                actions.push(Action {
                    kind,
                    predicate,
                    leading: action_leading,
                });
            }
            p.expect(TokenKind::RCurly)?;
            Ok(RoleMember::Privileges(Privileges {
                resource: p.name_node(&resource),
                actions,
                leading,
            }))
        }
        "membership" => {
            p.pop()?;
            let collection = p.expect_name()?;
            let predicate = if p.at(TokenKind::LCurly)? {
                Some(p.expr_block()?)
            } else {
                None
            };
            Ok(RoleMember::Membership(Membership {
                collection: p.name_node(&collection),
                predicate,
                leading,
            }))
        }
        _ => Err(p.error("a role member", &token)),
    }
}

#[cfg(test)]
mod test {
    use crate::ast::{ActionKind, Declaration, RoleMember};
    use crate::Parser;

    fn parse_role(input: &str) -> crate::ast::Role {
        let document = Parser::new(input).parse().unwrap();
        match document.declarations.into_iter().next().unwrap() {
            Declaration::Role(r) => r,
            other => panic!("expected a role, got {other:?}"),
        }
    }

    #[test]
    fn parses_privileges_and_membership() {
        let role = parse_role(
            "role moderator {\n  privileges Posts {\n    read\n    write {\n      .author == Query.identity()\n    }\n  }\n  membership Users {\n    .isModerator\n  }\n}",
        );
        assert_eq!("moderator", role.name.text);
        let RoleMember::Privileges(privileges) = &role.members[0] else {
            panic!("expected privileges");
        };
        assert_eq!("Posts", privileges.resource.text);
        assert_eq!(ActionKind::Read, privileges.actions[0].kind);
        assert!(privileges.actions[0].predicate.is_none());
        assert_eq!(ActionKind::Write, privileges.actions[1].kind);
        assert!(privileges.actions[1]
            .predicate
            .as_ref()
            .unwrap()
            .text
            .contains("Query.identity()"));
        let RoleMember::Membership(membership) = &role.members[1] else {
            panic!("expected membership");
        };
        assert_eq!("Users", membership.collection.text);
        assert!(membership.predicate.is_some());
    }

    #[test]
    fn membership_predicate_is_optional() {
        let role = parse_role("role everyone {\n  membership Users\n}");
        let RoleMember::Membership(membership) = &role.members[0] else {
            panic!("expected membership");
        };
        assert!(membership.predicate.is_none());
    }

    #[test]
    fn rejects_unknown_actions() {
        let err = Parser::new("role r {\n  privileges Users {\n    fly\n  }\n}")
            .parse()
            .unwrap_err();
        assert_eq!("a privilege action", err.expected());
    }
}
