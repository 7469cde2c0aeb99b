use crate::ast::{
    CheckConstraint, Collection, CollectionMember, ComputedField, DaysMember, Extras,
    FieldDefinition, FlagMember, IndexDefinition, MigrationsBlock, UniqueConstraint,
};
use crate::parser::grammar::ty;
use crate::parser::Parser;
use crate::{Error, TokenKind};

/// *Collection*:
///     **collection** Name (**as** Type)? **{** CollectionMember* **}**
pub(crate) fn collection(p: &mut Parser<'_>, leading: Extras) -> Result<Collection, Error> {
    let keyword = p.expect_keyword("collection")?;
    let name = p.expect_name()?;
    let alias = if p.at_keyword("as")? {
        p.pop()?;
        Some(ty::fql_type(p)?)
    } else {
        None
    };
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

    Ok(Collection {
        name: p.name_node(&name),
        alias,
        members,
        leading,
        loc: Some(p.location(&keyword)),
    })
}

/// *CollectionMember*:
///     Field | ComputedField | CheckConstraint | UniqueConstraint | Index
///     | HistoryDays | TtlDays | DocumentTtls | Migrations
///
/// A member keyword followed by `:` is a plain field of that name, so
/// collections may have fields called `check`, `index`, and so on.
fn member(p: &mut Parser<'_>, leading: Extras) -> Result<CollectionMember, Error> {
    let token = p.peek()?;
    if token.kind() != TokenKind::Name {
        return Err(p.error("a collection member", &token));
    }
    let keyword_like = matches!(
        token.data(),
        "history_days"
            | "ttl_days"
            | "document_ttls"
            | "compute"
            | "check"
            | "unique"
            | "index"
            | "migrations"
    );
    if !keyword_like || p.peek2()?.kind() == TokenKind::Colon {
        let name = p.pop()?;
        let ty = if p.eat(TokenKind::Colon)? {
            Some(ty::fql_type(p)?)
        } else {
            None
        };
        return Ok(CollectionMember::Field(FieldDefinition {
            name: p.name_node(&name),
            ty,
            leading,
        }));
    }

    match token.data() {
        "history_days" => {
            p.pop()?;
            let days = p.expect_number()?;
            Ok(CollectionMember::HistoryDays(DaysMember {
                days: days.data().to_string(),
                leading,
            }))
        }
        "ttl_days" => {
            p.pop()?;
            let days = p.expect_number()?;
            Ok(CollectionMember::TtlDays(DaysMember {
                days: days.data().to_string(),
                leading,
            }))
        }
        "document_ttls" => {
            p.pop()?;
            let value = p.expect_name()?;
            let enabled = match value.data() {
                "true" => true,
                "false" => false,
                _ => return Err(p.error("`true` or `false`", &value)),
            };
            Ok(CollectionMember::DocumentTtls(FlagMember { enabled, leading }))
        }
        "compute" => {
            p.pop()?;
            let name = p.expect_name()?;
            let ty = if p.eat(TokenKind::Colon)? {
                Some(ty::fql_type(p)?)
            } else {
                None
            };
            let body = p.expr_block()?;
            Ok(CollectionMember::Computed(ComputedField {
                name: p.name_node(&name),
                ty,
                body,
                leading,
            }))
        }
        "check" => {
            p.pop()?;
            let name = p.expect_name()?;
            let predicate = p.expr_block()?;
            Ok(CollectionMember::Check(CheckConstraint {
                name: p.name_node(&name),
                predicate,
                leading,
            }))
        }
        "unique" => {
            p.pop()?;
            let terms = p.bracket_block()?;
            Ok(CollectionMember::Unique(UniqueConstraint { terms, leading }))
        }
        "index" => {
            p.pop()?;
            let name = p.expect_name()?;
            let body = p.expr_block()?;
            Ok(CollectionMember::Index(IndexDefinition {
                name: p.name_node(&name),
                body,
                leading,
            }))
        }
        "migrations" => {
            p.pop()?;
            let body = p.expr_block()?;
            Ok(CollectionMember::Migrations(MigrationsBlock { body, leading }))
        }
        _ => Err(p.error("a collection member", &token)),
    }
}
