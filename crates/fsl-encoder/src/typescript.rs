//! TypeScript declarations derived from collection definitions.
//!
//! Each collection becomes an `export interface` (or an `export type` when
//! the collection is declared `as` an alias type). Only collections
//! contribute; functions, roles and access providers have no TypeScript
//! surface.

use std::fmt::Write as _;

use fsl_parser::ast::{
    Collection, CollectionMember, Declaration, Document, FunctionTypeParams, Type,
};

/// Emit a `.d.ts` body for the document's collections.
pub fn typescript_definitions(document: &Document) -> String {
    let mut out = String::new();
    for declaration in &document.declarations {
        let Declaration::Collection(collection) = declaration else {
            continue;
        };
        if !out.is_empty() {
            out.push('\n');
        }
        emit_collection(&mut out, collection);
    }
    out
}

fn emit_collection(out: &mut String, collection: &Collection) {
    if let Some(alias) = &collection.alias {
        let _ = writeln!(
            out,
            "export type {} = {};",
            collection.name.text,
            ts_type(alias)
        );
        return;
    }
    let _ = writeln!(out, "export interface {} {{", collection.name.text);
    for member in &collection.members {
        match member {
            CollectionMember::Field(field) => {
                let (ty, optional) = field
                    .ty
                    .as_ref()
                    .map(unwrap_optional)
                    .unwrap_or(("unknown".to_string(), false));
                let question = if optional { "?" } else { "" };
                let _ = writeln!(out, "  {}{question}: {ty};", field.name.text);
            }
            CollectionMember::Computed(computed) => {
                let (ty, optional) = computed
                    .ty
                    .as_ref()
                    .map(unwrap_optional)
                    .unwrap_or(("unknown".to_string(), false));
                let question = if optional { "?" } else { "" };
                let _ = writeln!(out, "  readonly {}{question}: {ty};", computed.name.text);
            }
            _ => {}
        }
    }
    let _ = writeln!(out, "}}");
}

/// A top-level `T?` becomes an optional member rather than `T | null`.
fn unwrap_optional(ty: &Type) -> (String, bool) {
    match ty {
        Type::Optional(inner) => (ts_type(inner), true),
        other => (ts_type(other), false),
    }
}

fn ts_type(ty: &Type) -> String {
    match ty {
        Type::Named(name) => scalar(&name.text).to_string(),
        Type::Object(object) => {
            let mut parts: Vec<String> = object
                .fields
                .iter()
                .map(|field| {
                    let question = if field.optional { "?" } else { "" };
                    format!("{}{question}: {}", field.key.text, ts_type(&field.ty))
                })
                .collect();
            if let Some(wildcard) = &object.wildcard {
                parts.push(format!("[key: string]: {}", ts_type(wildcard)));
            }
            format!("{{ {} }}", parts.join("; "))
        }
        Type::Union(lhs, rhs) => format!("{} | {}", ts_type(lhs), ts_type(rhs)),
        Type::Optional(inner) => format!("{} | null", ts_type(inner)),
        Type::Template(name, params) => match name.text.as_str() {
            // A reference to a document is typed as the document itself.
            "Ref" if params.len() == 1 => ts_type(&params[0]),
            "Set" | "Array" if params.len() == 1 => format!("{}[]", ts_type(&params[0])),
            _ => format!(
                "{}<{}>",
                name.text,
                params.iter().map(ts_type).collect::<Vec<_>>().join(", ")
            ),
        },
        Type::Tuple(items) => format!(
            "[{}]",
            items.iter().map(ts_type).collect::<Vec<_>>().join(", ")
        ),
        Type::StringLiteral(name) | Type::NumberLiteral(name) => name.text.clone(),
        Type::Function(function) => {
            let params = match &function.params {
                FunctionTypeParams::Short(param) => format!("arg0: {}", ts_type(param)),
                FunctionTypeParams::Long { params, variadic } => params
                    .iter()
                    .enumerate()
                    .map(|(i, param)| {
                        if *variadic && i + 1 == params.len() {
                            format!("...rest: {}[]", ts_type(param))
                        } else {
                            format!("arg{i}: {}", ts_type(param))
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
            };
            format!("({params}) => {}", ts_type(&function.ret))
        }
        Type::Isolated(inner) => format!("({})", ts_type(inner)),
    }
}

fn scalar(name: &str) -> &str {
    match name {
        "String" => "string",
        "Int" | "Long" | "Double" | "Number" => "number",
        "Boolean" => "boolean",
        "Null" => "null",
        "Time" | "Date" => "string",
        "Any" => "unknown",
        other => other,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use fsl_parser::Parser;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn definitions(input: &str) -> String {
        typescript_definitions(&Parser::new(input).parse().unwrap())
    }

    #[test]
    fn interface_from_fields() {
        let out = definitions(
            "collection User {\n  name: String\n  age: Int?\n  tags: Set<String>\n  raw\n}",
        );
        assert_eq!(
            out,
            indoc! {"
                export interface User {
                  name: string;
                  age?: number;
                  tags: string[];
                  raw: unknown;
                }
            "},
        );
    }

    #[test]
    fn computed_fields_are_readonly() {
        let out = definitions(
            "collection User {\n  first: String\n  compute initials: String {\n    .first.take(1)\n  }\n}",
        );
        assert!(out.contains("readonly initials: string;"));
    }

    #[test]
    fn alias_collection_becomes_type() {
        let out = definitions("collection Person as { name: String, extra?: Int } {\n  x: Int\n}");
        assert_eq!(
            "export type Person = { name: string; extra?: number };\n",
            out,
        );
    }

    #[test]
    fn refs_unions_and_literals() {
        let out = definitions(
            "collection Order {\n  owner: Ref<User>\n  status: \"open\" | \"closed\"\n  pair: [String, Int]\n}",
        );
        assert!(out.contains("owner: User;"));
        assert!(out.contains(r#"status: "open" | "closed";"#));
        assert!(out.contains("pair: [string, number];"));
    }

    #[test]
    fn non_collections_contribute_nothing() {
        let out = definitions("role admin {\n  membership Users\n}");
        assert!(out.is_empty());
    }
}
