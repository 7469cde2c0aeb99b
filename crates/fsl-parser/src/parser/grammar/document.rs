use crate::ast::{Declaration, Document, Extra, Extras};
use crate::parser::grammar::{access_provider, collection, function, role};
use crate::parser::Parser;
use crate::{Error, TokenKind};

/// *Document*:
///     Declaration*
pub(crate) fn document(p: &mut Parser<'_>) -> Result<Document, Error> {
    let mut declarations = Vec::new();
    loop {
        let token = p.peek()?;
        if token.kind() == TokenKind::Eof {
            break;
        }
        let mut leading = p.take_extras();
        if !declarations.is_empty() {
            // The blank line separating top-level declarations belongs to
            // the printer, not the tree.
            if let Some(Extra::Blank) = leading.first() {
                leading.remove(0);
            }
        }
        declarations.push(declaration(p, leading)?);
    }
    let trailing = p.take_extras();
    Ok(Document {
        declarations,
        trailing,
    })
}

/// *Declaration*:
///     AccessProvider | Collection | Function | Role
fn declaration(p: &mut Parser<'_>, leading: Extras) -> Result<Declaration, Error> {
    let token = p.peek()?;
    if token.kind() == TokenKind::At {
        return function::function(p, leading).map(Declaration::Function);
    }
    match token.data() {
        "access" => {
            access_provider::access_provider(p, leading).map(Declaration::AccessProvider)
        }
        "collection" => collection::collection(p, leading).map(Declaration::Collection),
        "function" => function::function(p, leading).map(Declaration::Function),
        "role" => role::role(p, leading).map(Declaration::Role),
        _ => Err(p.error("a declaration", &token)),
    }
}

#[cfg(test)]
mod test {
    use crate::ast::{Declaration, Extra};
    use crate::Parser;

    #[test]
    fn parses_every_declaration_kind() {
        let input = r#"
access provider aws {
  issuer "https://example.com/"
  role admin
}

collection User {
  name: String
}

function greet(who: String): String {
  "hi " + who
}

role admin {
  membership User
}
"#;
        let document = Parser::new(input).parse().unwrap();
        assert_eq!(4, document.len());
        assert!(matches!(
            document.declarations[0],
            Declaration::AccessProvider(_)
        ));
        assert!(matches!(document.declarations[3], Declaration::Role(_)));
    }

    #[test]
    fn first_error_aborts() {
        let err = Parser::new("collection User {\n  name:\n}")
            .parse()
            .unwrap_err();
        assert_eq!("a type", err.expected());
    }

    #[test]
    fn comments_anchor_to_the_next_declaration() {
        let input = "// header\ncollection User {\n  name: String\n}\n// trailing\n";
        let document = Parser::new(input).parse().unwrap();
        assert_eq!(
            &[Extra::Comment("// header".into())],
            document.declarations[0].leading().as_slice(),
        );
        assert_eq!(
            &[Extra::Comment("// trailing".into())],
            document.trailing.as_slice(),
        );
    }

    #[test]
    fn blank_between_declarations_is_normalized_away() {
        let input = "collection A {\n  x: Int\n}\n\ncollection B {\n  y: Int\n}\n";
        let document = Parser::new(input).parse().unwrap();
        assert!(document.declarations[1].leading().is_empty());
    }
}
