use crate::ast::{Extras, Function, Parameter};
use crate::parser::grammar::ty;
use crate::parser::Parser;
use crate::{Error, TokenKind};

/// *Function*:
///     (**@role(** Name **)**)? **function** Name **(** Parameter,* **)**
///     (**:** Type)? ExprBlock
pub(crate) fn function(p: &mut Parser<'_>, leading: Extras) -> Result<Function, Error> {
    let role = if p.at(TokenKind::At)? {
        p.pop()?;
        p.expect_keyword("role")?;
        p.expect(TokenKind::LParen)?;
        let role = p.expect_name()?;
        p.expect(TokenKind::RParen)?;
        Some(p.name_node(&role))
    } else {
        None
    };

    let keyword = p.expect_keyword("function")?;
    let name = p.expect_name()?;

    p.expect(TokenKind::LParen)?;
    let mut params = Vec::new();
    while !p.at(TokenKind::RParen)? {
        let param_name = p.expect_name()?;
        let param_ty = if p.eat(TokenKind::Colon)? {
            Some(ty::fql_type(p)?)
        } else {
            None
        };
        params.push(Parameter {
            name: p.name_node(&param_name),
            ty: param_ty,
        });
        if !p.eat(TokenKind::Comma)? {
            break;
        }
    }
    p.expect(TokenKind::RParen)?;

    let ret = if p.eat(TokenKind::Colon)? {
        Some(ty::fql_type(p)?)
    } else {
        None
    };
    let body = p.expr_block()?;

    Ok(Function {
        name: p.name_node(&name),
        params,
        ret,
        body,
        role,
        leading,
        loc: Some(p.location(&keyword)),
    })
}

#[cfg(test)]
mod test {
    use crate::ast::Declaration;
    use crate::Parser;

    fn parse_function(input: &str) -> crate::ast::Function {
        let document = Parser::new(input).parse().unwrap();
        match document.declarations.into_iter().next().unwrap() {
            Declaration::Function(f) => f,
            other => panic!("expected a function, got {other:?}"),
        }
    }

    #[test]
    fn parses_signature_and_body() {
        let function = parse_function(
            "function add(a: Int, b: Int): Int {\n  a + b\n}",
        );
        assert_eq!("add", function.name.text);
        assert_eq!(2, function.params.len());
        assert!(function.ret.is_some());
        assert_eq!("\n  a + b\n", function.body.text);
    }

    #[test]
    fn parses_role_annotation() {
        let function = parse_function("@role(server)\nfunction secret() {\n  42\n}");
        assert_eq!(Some("server"), function.role.as_ref().map(|r| r.text.as_str()));
    }

    #[test]
    fn untyped_params_are_allowed() {
        let function = parse_function("function id(x) {\n  x\n}");
        assert!(function.params[0].ty.is_none());
    }

    #[test]
    fn body_keeps_nested_braces_and_strings() {
        let function = parse_function(
            "function tricky() {\n  let s = \"}\"\n  if (true) { s } else { \"{\" }\n}",
        );
        assert!(function.body.text.contains("else { \"{\" }"));
    }
}
