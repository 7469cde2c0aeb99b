//! Content-addressed function linking and role merging for FSL schemas.
//!
//! [`link`] renames every user-defined function to `<name>_<hash>`, where
//! the hash is the SHA-1 of the canonical printed form of the function's
//! strongly connected component, and rewrites every reference to it: calls
//! in other function bodies, role privilege resources, and role predicate
//! expressions. Because dependency references are rewritten before their
//! caller is hashed, a change to a function's body changes the mangled name
//! of everything that depends on it, directly or through a cycle.
//!
//! [`merge_roles`] consolidates same-named role declarations, deduplicating
//! privileges and memberships and rejecting conflicting definitions.
//!
//! ## Example
//! ```rust
//! use fsl_parser::Parser;
//!
//! let input = "function a() {\n  1\n}\n\nfunction b() {\n  a()\n}\n";
//! let mut document = Parser::new(input).parse().unwrap();
//! let mangled = fsl_linker::link(&mut document);
//! let b = document.functions().nth(1).unwrap();
//! assert!(b.body.text.contains(&mangled["a"]));
//! ```
#![forbid(unsafe_code)]
#![deny(missing_debug_implementations, nonstandard_style)]
#![warn(missing_docs, future_incompatible, unreachable_pub, rust_2018_idioms)]

mod cycles;
mod roles;

pub use roles::{merge_roles, MergeRolesError};

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexSet;
use sha1::{Digest, Sha1};

use fsl_parser::ast::{Declaration, Document, RoleMember};
use fsl_parser::walker;

/// Rewrite every UDF name in place to its content-addressed form and return
/// the `{original: mangled}` map.
///
/// Deterministic for a given tree: names are visited in lexicographic
/// order, dependencies in first-appearance order, and the hash input is the
/// canonical printed form, so two runs (or two code-equal trees) agree on
/// every mangled name. Non-function declarations are untouched except for
/// UDF references inside roles.
pub fn link(document: &mut Document) -> BTreeMap<String, String> {
    let names: BTreeSet<String> = document.functions().map(|f| f.name.text.clone()).collect();
    let mut deps: BTreeMap<String, IndexSet<String>> = BTreeMap::new();
    for function in document.functions() {
        let found = walker::identifiers(&function.body.text)
            .filter(|ident| names.contains(ident.text))
            .map(|ident| ident.text.to_string())
            .collect();
        deps.insert(function.name.text.clone(), found);
    }

    let mut unlinked = names;
    let mut mangled: BTreeMap<String, String> = BTreeMap::new();

    while !unlinked.is_empty() {
        // Leaves of the remaining graph: every dependency already mangled.
        let ready: Vec<String> = unlinked
            .iter()
            .filter(|name| {
                deps[name.as_str()]
                    .iter()
                    .all(|dep| mangled.contains_key(dep))
            })
            .cloned()
            .collect();
        if !ready.is_empty() {
            for name in ready {
                rewrite_function(document, &name, &mangled);
                let hash = hash_functions(document, std::slice::from_ref(&name));
                mangled.insert(name.clone(), format!("{name}_{hash}"));
                rename_function(document, &name, &mangled[&name]);
                unlinked.remove(&name);
            }
            continue;
        }

        // No leaves left: the remaining graph bottoms out in cycles. Only
        // cycles whose external dependencies are all mangled can link this
        // round; a cycle depending on another cycle waits for it.
        for cycle in cycles::find_cycles(&unlinked, &deps) {
            let in_cycle: BTreeSet<&String> = cycle.iter().collect();
            let external_ready = cycle.iter().all(|name| {
                deps[name.as_str()]
                    .iter()
                    .all(|dep| in_cycle.contains(dep) || mangled.contains_key(dep))
            });
            if !external_ready {
                continue;
            }
            for name in &cycle {
                rewrite_function(document, name, &mangled);
            }
            let hash = hash_functions(document, &cycle);
            // The whole cycle shares one hash, and every member is mangled
            // before any reference is rewritten so self-references resolve.
            for name in &cycle {
                mangled.insert(name.clone(), format!("{name}_{hash}"));
            }
            for name in &cycle {
                rewrite_function(document, name, &mangled);
                rename_function(document, name, &mangled[name]);
                unlinked.remove(name);
            }
        }
    }

    rewrite_roles(document, &mangled);
    mangled
}

/// SHA-1 over the concatenated canonical forms of the named functions, in
/// the given order.
fn hash_functions(document: &Document, names: &[String]) -> String {
    let mut hasher = Sha1::new();
    for name in names {
        for declaration in &document.declarations {
            if matches!(declaration, Declaration::Function(f) if f.name.text == *name) {
                hasher.update(fsl_encoder::encode_declaration(declaration).as_bytes());
            }
        }
    }
    hex::encode(hasher.finalize())
}

/// Rewrite references inside `name`'s body to their mangled forms.
fn rewrite_function(document: &mut Document, name: &str, mangled: &BTreeMap<String, String>) {
    if mangled.is_empty() {
        return;
    }
    for function in document.functions_mut() {
        if function.name.text != name {
            continue;
        }
        if let Some(rewritten) =
            walker::rewrite_identifiers(&function.body.text, |ident| {
                mangled.get(ident).map(String::as_str)
            })
        {
            function.body.text = rewritten;
        }
    }
}

fn rename_function(document: &mut Document, name: &str, new_name: &str) {
    for function in document.functions_mut() {
        if function.name.text == name {
            function.name.text = new_name.to_string();
        }
    }
}

/// Rewrite UDF references held by roles: privilege resources by exact
/// match, predicate blobs by identifier.
fn rewrite_roles(document: &mut Document, mangled: &BTreeMap<String, String>) {
    if mangled.is_empty() {
        return;
    }
    for role in document.roles_mut() {
        for member in &mut role.members {
            match member {
                RoleMember::Privileges(privileges) => {
                    if let Some(new_name) = mangled.get(&privileges.resource.text) {
                        privileges.resource.text = new_name.clone();
                    }
                    for action in &mut privileges.actions {
                        if let Some(predicate) = &mut action.predicate {
                            rewrite_expr(&mut predicate.text, mangled);
                        }
                    }
                }
                RoleMember::Membership(membership) => {
                    if let Some(predicate) = &mut membership.predicate {
                        rewrite_expr(&mut predicate.text, mangled);
                    }
                }
            }
        }
    }
}

fn rewrite_expr(text: &mut String, mangled: &BTreeMap<String, String>) {
    if let Some(rewritten) =
        walker::rewrite_identifiers(text, |ident| mangled.get(ident).map(String::as_str))
    {
        *text = rewritten;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use fsl_parser::Parser;

    fn linked(input: &str) -> (Document, BTreeMap<String, String>) {
        let mut document = Parser::new(input).parse().unwrap();
        let mangled = link(&mut document);
        (document, mangled)
    }

    #[test]
    fn leaf_hash_ignores_comment_trivia() {
        let (_, plain) = linked("function f() {\n  1\n}");
        let (_, commented) = linked("// docs\nfunction f() {\n  1\n}");
        assert_eq!(plain["f"], commented["f"]);
    }

    #[test]
    fn stacked_cycles_resolve_outside_in() {
        // a <-> b sits on top of c <-> d; c's hash must reach a and b.
        let input = "function a() {\n  b() + c()\n}\n\nfunction b() {\n  a()\n}\n\nfunction c() {\n  d()\n}\n\nfunction d() {\n  c()\n}\n";
        let (document, mangled) = linked(input);
        let a = document.functions().next().unwrap();
        assert!(a.body.text.contains(&mangled["b"]));
        assert!(a.body.text.contains(&mangled["c"]));
        let suffix = |name: &str| mangled[name].rsplit('_').next().unwrap().to_string();
        assert_eq!(suffix("a"), suffix("b"));
        assert_eq!(suffix("c"), suffix("d"));
        assert_ne!(suffix("a"), suffix("c"));
    }

    #[test]
    fn self_recursion_is_a_cycle_of_one() {
        let (document, mangled) = linked("function f(n: Int): Int {\n  if (n == 0) 1 else f(n - 1)\n}");
        let f = document.functions().next().unwrap();
        assert_eq!(f.name.text, mangled["f"]);
        assert!(f.body.text.contains(&mangled["f"]));
    }
}
