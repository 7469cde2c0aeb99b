use crate::ast::{AccessProvider, AccessProviderMember, Extras};
use crate::parser::Parser;
use crate::{Error, TokenKind};

/// *AccessProvider*:
///     **access** **provider** Name **{** AccessProviderMember* **}**
pub(crate) fn access_provider(
    p: &mut Parser<'_>,
    leading: Extras,
) -> Result<AccessProvider, Error> {
    let keyword = p.expect_keyword("access")?;
    p.expect_keyword("provider")?;
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

    Ok(AccessProvider {
        name: p.name_node(&name),
        members,
        leading,
        loc: Some(p.location(&keyword)),
    })
}

/// *AccessProviderMember*:
///     **issuer** String | **jwks_uri** String | **role** Name | **ttl** Number
fn member(p: &mut Parser<'_>, leading: Extras) -> Result<AccessProviderMember, Error> {
    let keyword = p.expect_name()?;
    match keyword.data() {
        "issuer" => {
            let value = p.expect(TokenKind::StringValue)?;
            Ok(AccessProviderMember::Issuer {
                value: p.name_node(&value),
                leading,
            })
        }
        "jwks_uri" => {
            let value = p.expect(TokenKind::StringValue)?;
            Ok(AccessProviderMember::JwksUri {
                value: p.name_node(&value),
                leading,
            })
        }
        "role" => {
            let role = p.expect_name()?;
            Ok(AccessProviderMember::Role {
                role: p.name_node(&role),
                leading,
            })
        }
        "ttl" => {
            let value = p.expect_number()?;
            Ok(AccessProviderMember::Ttl {
                value: value.data().to_string(),
                leading,
            })
        }
        _ => Err(p.error("an access provider member", &keyword)),
    }
}

#[cfg(test)]
mod test {
    use crate::ast::Declaration;
    use crate::Parser;

    #[test]
    fn parses_all_member_kinds() {
        let input = r#"
access provider auth0 {
  issuer "https://example.auth0.com/"
  jwks_uri "https://example.auth0.com/jwks"
  role viewer
  role editor
  ttl 3600
}
"#;
        let document = Parser::new(input).parse().unwrap();
        let Declaration::AccessProvider(ap) = &document.declarations[0] else {
            panic!("expected an access provider");
        };
        assert_eq!("auth0", ap.name.text);
        assert_eq!(
            Some(r#""https://example.auth0.com/""#),
            ap.issuer().map(|n| n.text.as_str()),
        );
        assert_eq!(
            vec!["viewer", "editor"],
            ap.roles().map(|n| n.text.as_str()).collect::<Vec<_>>(),
        );
        assert_eq!(Some("3600"), ap.ttl());
    }

    #[test]
    fn rejects_unknown_members() {
        let err = Parser::new("access provider x {\n  color red\n}")
            .parse()
            .unwrap_err();
        assert_eq!("an access provider member", err.expected());
    }
}
