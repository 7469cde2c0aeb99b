//! WebAssembly bindings over the FSL schema toolchain.
//!
//! A parsed schema is held behind an opaque [`SchemaTree`] handle; dropping
//! it from JavaScript (the generated `free()`) releases the tree. Failed
//! operations throw, carrying the library error's message. The recoverable
//! canonical-printer inputs (mangled names and sources JSON) log to the
//! console and continue without symbol information.

use wee_alloc;
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

use std::collections::BTreeMap;

use serde::Serialize;
use tsify::Tsify;
use wasm_bindgen::prelude::*;

use fsl_encoder::Encoder;
use fsl_parser::ast::{Declaration, DeclarationKind, Document, RoleMember};
use fsl_parser::Parser;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn error(message: &str);
}

/// An owned schema tree.
#[wasm_bindgen]
pub struct SchemaTree {
    document: Document,
}

/// Parse FSL source into a tree.
#[wasm_bindgen]
pub fn parse(input: &str, filename: Option<String>) -> Result<SchemaTree, JsError> {
    let mut parser = Parser::new(input);
    if let Some(filename) = filename {
        parser = parser.filename(filename);
    }
    Ok(SchemaTree {
        document: parser.parse()?,
    })
}

/// Concatenate two trees, consuming both handles.
#[wasm_bindgen(js_name = mergeTrees)]
pub fn merge_trees(a: SchemaTree, b: SchemaTree) -> SchemaTree {
    SchemaTree {
        document: a.document.merge(b.document),
    }
}

/// Consolidate same-named roles, consuming the handle.
#[wasm_bindgen(js_name = mergeRoles)]
pub fn merge_roles(tree: SchemaTree) -> Result<SchemaTree, JsError> {
    Ok(SchemaTree {
        document: fsl_linker::merge_roles(tree.document)?,
    })
}

#[derive(Tsify, Serialize)]
#[tsify(into_wasm_abi)]
pub struct LinkResult {
    /// Original UDF name to its content-addressed replacement.
    pub mangled: BTreeMap<String, String>,
}

#[derive(Tsify, Serialize)]
pub struct DeclarationEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
}

#[derive(Tsify, Serialize)]
#[tsify(into_wasm_abi)]
pub struct DeclarationList {
    pub declarations: Vec<DeclarationEntry>,
}

#[wasm_bindgen]
impl SchemaTree {
    /// Deep-duplicate the tree.
    #[wasm_bindgen(js_name = clone)]
    pub fn clone_tree(&self) -> SchemaTree {
        SchemaTree {
            document: self.document.clone(),
        }
    }

    /// Number of declarations.
    pub fn length(&self) -> usize {
        self.document.len()
    }

    /// Stable sort by kind tag, then name.
    pub fn sort(&mut self) {
        self.document.sort();
    }

    /// Mangle every UDF in place; returns the name map.
    #[wasm_bindgen(js_name = linkFunctions)]
    pub fn link_functions(&mut self) -> LinkResult {
        LinkResult {
            mangled: fsl_linker::link(&mut self.document),
        }
    }

    /// A new tree with only the declarations of one kind.
    #[wasm_bindgen(js_name = filterByKind)]
    pub fn filter_by_kind(&self, kind: &str) -> Result<SchemaTree, JsError> {
        let kind: DeclarationKind = kind.parse()?;
        Ok(SchemaTree {
            document: self.document.filter(kind),
        })
    }

    /// Remove the first matching declaration; returns whether one existed.
    #[wasm_bindgen(js_name = removeDeclaration)]
    pub fn remove_declaration(&mut self, kind: &str, name: &str) -> Result<bool, JsError> {
        let kind: DeclarationKind = kind.parse()?;
        Ok(self.document.remove(kind, name))
    }

    /// Delete privilege members on `resource` from every role.
    #[wasm_bindgen(js_name = stripRolesResource)]
    pub fn strip_roles_resource(&mut self, resource: &str) {
        self.document.strip_roles_resource(resource);
    }

    /// List declarations; role entries carry their privilege resources.
    #[wasm_bindgen(js_name = listDeclarations)]
    pub fn list_declarations(&self) -> DeclarationList {
        DeclarationList {
            declarations: self
                .document
                .declarations
                .iter()
                .map(|declaration| DeclarationEntry {
                    kind: declaration.kind().as_str().to_string(),
                    name: declaration.name().text.clone(),
                    resources: match declaration {
                        Declaration::Role(role) => Some(
                            role.members
                                .iter()
                                .filter_map(|member| match member {
                                    RoleMember::Privileges(p) => {
                                        Some(p.resource.text.clone())
                                    }
                                    RoleMember::Membership(_) => None,
                                })
                                .collect(),
                        ),
                        _ => None,
                    },
                })
                .collect(),
        }
    }

    /// Canonical text, optionally with an inline source map.
    pub fn canonical(
        &self,
        source_map_filename: Option<String>,
        mangled_names_json: Option<String>,
        sources_json: Option<String>,
    ) -> String {
        let mut encoder = match source_map_filename {
            Some(filename) => Encoder::with_source_map(filename),
            None => Encoder::new(),
        };
        if let Some(json) = mangled_names_json {
            if let Err(err) = encoder.mangled_names(&json) {
                error(&err.to_string());
            }
        }
        if let Some(json) = sources_json {
            if let Err(err) = encoder.sources(&json) {
                error(&err.to_string());
            }
        }
        encoder.encode(&self.document)
    }

    /// TypeScript declarations for the tree's collections.
    #[wasm_bindgen(js_name = typescriptDefinitions)]
    pub fn typescript_definitions(&self) -> String {
        fsl_encoder::typescript::typescript_definitions(&self.document)
    }
}
