use crate::ast::{
    FunctionType, FunctionTypeParams, ObjectType, ObjectTypeField, Type,
};
use crate::parser::Parser;
use crate::{Error, TokenKind};

/// *Type*:
///     Union
///
/// Precedence, loosest first: `|` < `=>` < postfix `?` < template
/// application and primaries.
pub(crate) fn fql_type(p: &mut Parser<'_>) -> Result<Type, Error> {
    union_type(p)
}

/// *Union*:
///     Function (**|** Function)*
fn union_type(p: &mut Parser<'_>) -> Result<Type, Error> {
    let mut lhs = function_type(p)?;
    while p.at(TokenKind::Pipe)? {
        p.pop()?;
        let rhs = function_type(p)?;
        lhs = Type::Union(Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

/// *Function*:
///     **(** Type,* (**...** Type)? **)** **=>** Function
///     | Optional (**=>** Function)?
///
/// A parenthesized group is only a parameter list when `=>` follows;
/// otherwise it must hold exactly one type and stays an isolated group.
fn function_type(p: &mut Parser<'_>) -> Result<Type, Error> {
    if p.at(TokenKind::LParen)? {
        p.pop()?;
        let mut params = Vec::new();
        let mut variadic = false;
        while !p.at(TokenKind::RParen)? {
            if p.eat(TokenKind::Spread)? {
                variadic = true;
                params.push(fql_type(p)?);
                break;
            }
            params.push(fql_type(p)?);
            if !p.eat(TokenKind::Comma)? {
                break;
            }
        }
        p.expect(TokenKind::RParen)?;

        if p.at(TokenKind::FatArrow)? {
            p.pop()?;
            let ret = function_type(p)?;
            return Ok(Type::Function(FunctionType {
                params: FunctionTypeParams::Long { params, variadic },
                ret: Box::new(ret),
            }));
        }
        if variadic || params.len() != 1 {
            let token = p.peek()?;
            return Err(p.error("`=>`", &token));
        }
        let inner = params.remove(0);
        return postfix_optional(p, Type::Isolated(Box::new(inner)));
    }

    let operand = optional_type(p)?;
    if p.at(TokenKind::FatArrow)? {
        p.pop()?;
        let ret = function_type(p)?;
        return Ok(Type::Function(FunctionType {
            params: FunctionTypeParams::Short(Box::new(operand)),
            ret: Box::new(ret),
        }));
    }
    Ok(operand)
}

/// *Optional*:
///     Primary **?***
fn optional_type(p: &mut Parser<'_>) -> Result<Type, Error> {
    let ty = primary_type(p)?;
    postfix_optional(p, ty)
}

fn postfix_optional(p: &mut Parser<'_>, mut ty: Type) -> Result<Type, Error> {
    while p.at(TokenKind::Question)? {
        p.pop()?;
        ty = Type::Optional(Box::new(ty));
    }
    Ok(ty)
}

/// *Primary*:
///     Name (**<** Type,* **>**)? | ObjectType | Tuple | String | Number
fn primary_type(p: &mut Parser<'_>) -> Result<Type, Error> {
    let token = p.peek()?;
    match token.kind() {
        TokenKind::Name => {
            p.pop()?;
            let name = p.name_node(&token);
            if p.at(TokenKind::LAngle)? {
                p.pop()?;
                let mut args = vec![fql_type(p)?];
                while p.eat(TokenKind::Comma)? {
                    args.push(fql_type(p)?);
                }
                p.expect(TokenKind::RAngle)?;
                Ok(Type::Template(name, args))
            } else {
                Ok(Type::Named(name))
            }
        }
        TokenKind::LCurly => object_type(p),
        TokenKind::LBracket => {
            p.pop()?;
            let mut items = Vec::new();
            while !p.at(TokenKind::RBracket)? {
                items.push(fql_type(p)?);
                if !p.eat(TokenKind::Comma)? {
                    break;
                }
            }
            p.expect(TokenKind::RBracket)?;
            Ok(Type::Tuple(items))
        }
        TokenKind::StringValue => {
            p.pop()?;
            Ok(Type::StringLiteral(p.name_node(&token)))
        }
        TokenKind::Int | TokenKind::Float => {
            p.pop()?;
            Ok(Type::NumberLiteral(p.name_node(&token)))
        }
        _ => Err(p.error("a type", &token)),
    }
}

/// *ObjectType*:
///     **{** (Key **?**? **:** Type **,**?)* (**\*** **:** Type)? **}**
fn object_type(p: &mut Parser<'_>) -> Result<Type, Error> {
    p.expect(TokenKind::LCurly)?;
    let mut fields = Vec::new();
    let mut wildcard = None;
    loop {
        p.eat_separators()?;
        if p.at(TokenKind::RCurly)? {
            break;
        }
        if p.at(TokenKind::Star)? {
            p.pop()?;
            p.expect(TokenKind::Colon)?;
            wildcard = Some(Box::new(fql_type(p)?));
            continue;
        }
        let key = p.peek()?;
        if !matches!(key.kind(), TokenKind::Name | TokenKind::StringValue) {
            return Err(p.error("an object type key", &key));
        }
        p.pop()?;
        let optional = p.eat(TokenKind::Question)?;
        p.expect(TokenKind::Colon)?;
        let ty = fql_type(p)?;
        fields.push(ObjectTypeField {
            key: p.name_node(&key),
            ty,
            optional,
        });
    }
    p.expect(TokenKind::RCurly)?;
    Ok(Type::Object(ObjectType { fields, wildcard }))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Parser;
    use pretty_assertions::assert_eq;

    fn parse_type(input: &str) -> Type {
        let mut p = Parser::new(input);
        fql_type(&mut p).unwrap()
    }

    fn round_trip(input: &str) {
        assert_eq!(input, parse_type(input).to_string());
    }

    #[test]
    fn precedence_union_below_optional() {
        let ty = parse_type("String | Int?");
        let Type::Union(_, rhs) = ty else {
            panic!("expected a union");
        };
        assert!(matches!(*rhs, Type::Optional(_)));
    }

    #[test]
    fn template_application() {
        let ty = parse_type("Ref<Set<User>>");
        let Type::Template(name, args) = ty else {
            panic!("expected a template");
        };
        assert_eq!("Ref", name.text);
        assert!(matches!(args[0], Type::Template(_, _)));
    }

    #[test]
    fn isolated_group_takes_postfix_optional() {
        let ty = parse_type("(String | Int)?");
        let Type::Optional(inner) = ty else {
            panic!("expected an optional");
        };
        assert!(matches!(*inner, Type::Isolated(_)));
    }

    #[test]
    fn long_function_type_with_variadic() {
        let ty = parse_type("(String, ...Int) => Boolean");
        let Type::Function(f) = ty else {
            panic!("expected a function type");
        };
        let FunctionTypeParams::Long { params, variadic } = f.params else {
            panic!("expected long params");
        };
        assert!(variadic);
        assert_eq!(2, params.len());
    }

    #[test]
    fn short_function_type() {
        let ty = parse_type("Int => Int");
        let Type::Function(f) = ty else {
            panic!("expected a function type");
        };
        assert!(matches!(f.params, FunctionTypeParams::Short(_)));
    }

    #[test]
    fn object_type_with_wildcard() {
        let ty = parse_type(r#"{ name: String, nick?: String, *: Int }"#);
        let Type::Object(object) = ty else {
            panic!("expected an object type");
        };
        assert_eq!(2, object.fields.len());
        assert!(object.fields[1].optional);
        assert!(object.wildcard.is_some());
    }

    #[test]
    fn display_round_trips() {
        round_trip("String");
        round_trip("Ref<User>");
        round_trip("String | Int?");
        round_trip("(String | Int)?");
        round_trip("[String, Int]");
        round_trip(r#"{ status: "open" | "closed", *: Int }"#);
        round_trip("(String, ...Int) => Boolean");
        round_trip("Int => Int");
    }

    #[test]
    fn lone_group_requires_single_type() {
        let mut p = Parser::new("(A, B) x");
        assert!(fql_type(&mut p).is_err());
    }
}
