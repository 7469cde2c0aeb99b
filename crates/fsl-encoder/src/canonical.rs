//! The canonical printer.

use std::collections::HashMap;
use std::fmt;

use fsl_parser::ast::{
    AccessProvider, AccessProviderMember, Collection, CollectionMember, Declaration, Document,
    Expr, Extra, Extras, Function, Location, Name, Role, RoleMember,
};

use crate::source_map::SourceMapBuilder;
use crate::EncoderError;

/// Canonical text for a whole document with default options.
pub fn encode(document: &Document) -> String {
    Encoder::new().encode(document)
}

/// Canonical text for a single declaration, without trivia.
///
/// This is the linker's hash input, so it deliberately excludes anchored
/// comments and blank lines: two declarations that are the same code hash
/// the same however they were commented.
pub fn encode_declaration(declaration: &Declaration) -> String {
    let mut encoder = Encoder::new();
    encoder.declaration(declaration);
    encoder.out
}

/// Stateful canonical printer, optionally recording a source map.
///
/// ## Example
/// ```rust
/// use fsl_encoder::Encoder;
/// use fsl_parser::Parser;
///
/// let document = Parser::new("role admin {\n  membership Users\n}")
///     .filename("auth.fsl")
///     .parse()
///     .unwrap();
/// let output = Encoder::with_source_map("schema.fsl").encode(&document);
/// assert!(output.ends_with('\n'));
/// assert!(output.contains("//# sourceMappingURL=data:application/json;base64,"));
/// ```
#[derive(Debug)]
pub struct Encoder {
    out: String,
    line: usize,
    column: usize,
    map: Option<SourceMapBuilder>,
    /// Mangled name → original name, for source map symbols.
    original_names: HashMap<String, String>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    /// An encoder with no source map.
    pub fn new() -> Self {
        Self {
            out: String::new(),
            line: 0,
            column: 0,
            map: None,
            original_names: HashMap::new(),
        }
    }

    /// An encoder that records a source map for `output_file` and appends it
    /// as an inline base64 comment.
    pub fn with_source_map(output_file: impl Into<String>) -> Self {
        Self {
            map: Some(SourceMapBuilder::new(output_file)),
            ..Self::new()
        }
    }

    /// Supply the linker's `{original: mangled}` JSON so mangled identifier
    /// writes record their original name as the source map symbol.
    pub fn mangled_names(&mut self, json: &str) -> Result<(), EncoderError> {
        let map: HashMap<String, String> =
            serde_json::from_str(json).map_err(EncoderError::InvalidMangledNamesJson)?;
        self.original_names = map
            .into_iter()
            .map(|(original, mangled)| (mangled, original))
            .collect();
        Ok(())
    }

    /// Supply `{file: content}` JSON for the source map's `sourcesContent`.
    pub fn sources(&mut self, json: &str) -> Result<(), EncoderError> {
        let sources: HashMap<String, String> =
            serde_json::from_str(json).map_err(EncoderError::InvalidSourcesJson)?;
        if let Some(map) = &mut self.map {
            map.set_sources(sources);
        }
        Ok(())
    }

    /// Encode the document, consuming the encoder.
    pub fn encode(mut self, document: &Document) -> String {
        self.document(document);
        if let Some(map) = self.map.take() {
            if !self.out.ends_with('\n') {
                self.out.push('\n');
            }
            self.out.push_str(&map.finish());
            self.out.push('\n');
        }
        self.out
    }

    fn document(&mut self, document: &Document) {
        for (i, declaration) in document.declarations.iter().enumerate() {
            if i > 0 {
                self.newline();
            }
            self.extras(declaration.leading(), 0);
            self.declaration(declaration);
        }
        self.extras(&document.trailing, 0);
    }

    fn declaration(&mut self, declaration: &Declaration) {
        match declaration {
            Declaration::AccessProvider(ap) => self.access_provider(ap),
            Declaration::Collection(collection) => self.collection(collection),
            Declaration::Function(function) => self.function(function),
            Declaration::Role(role) => self.role(role),
        }
    }

    fn access_provider(&mut self, ap: &AccessProvider) {
        self.record_decl(ap.loc.as_ref());
        self.push("access provider ");
        self.write_name(&ap.name);
        self.push(" {");
        self.newline();

        let mut members: Vec<&AccessProviderMember> = ap.members.iter().collect();
        members.sort_by_key(|member| match member {
            AccessProviderMember::Issuer { .. } => 0u8,
            AccessProviderMember::JwksUri { .. } => 1,
            AccessProviderMember::Role { .. } => 2,
            AccessProviderMember::Ttl { .. } => 3,
        });
        for member in members {
            match member {
                AccessProviderMember::Issuer { value, leading } => {
                    self.extras(leading, 1);
                    self.indent(1);
                    self.push("issuer ");
                    self.write_name(value);
                    self.newline();
                }
                AccessProviderMember::JwksUri { value, leading } => {
                    self.extras(leading, 1);
                    self.indent(1);
                    self.push("jwks_uri ");
                    self.write_name(value);
                    self.newline();
                }
                AccessProviderMember::Role { role, leading } => {
                    self.extras(leading, 1);
                    self.indent(1);
                    self.push("role ");
                    self.write_name(role);
                    self.newline();
                }
                AccessProviderMember::Ttl { value, leading } => {
                    self.extras(leading, 1);
                    self.indent(1);
                    self.push("ttl ");
                    self.push(value);
                    self.newline();
                }
            }
        }
        self.push("}");
        self.newline();
    }

    fn collection(&mut self, collection: &Collection) {
        self.record_decl(collection.loc.as_ref());
        self.push("collection ");
        self.write_name(&collection.name);
        if let Some(alias) = &collection.alias {
            self.push(" as ");
            self.push(&alias.to_string());
        }
        self.push(" {");
        self.newline();

        let mut members: Vec<&CollectionMember> = collection.members.iter().collect();
        members.sort_by_key(|member| match member {
            CollectionMember::HistoryDays(_) => 0u8,
            CollectionMember::TtlDays(_) => 1,
            CollectionMember::DocumentTtls(_) => 2,
            CollectionMember::Field(_) => 3,
            CollectionMember::Computed(_) => 4,
            CollectionMember::Check(_) | CollectionMember::Unique(_) => 5,
            CollectionMember::Index(_) => 6,
            CollectionMember::Migrations(_) => 7,
        });
        for member in members {
            self.collection_member(member);
        }
        self.push("}");
        self.newline();
    }

    fn collection_member(&mut self, member: &CollectionMember) {
        match member {
            CollectionMember::Field(field) => {
                self.extras(&field.leading, 1);
                self.indent(1);
                self.write_name(&field.name);
                if let Some(ty) = &field.ty {
                    self.push(": ");
                    self.push(&ty.to_string());
                }
                self.newline();
            }
            CollectionMember::Computed(computed) => {
                self.extras(&computed.leading, 1);
                self.indent(1);
                self.push("compute ");
                self.write_name(&computed.name);
                if let Some(ty) = &computed.ty {
                    self.push(": ");
                    self.push(&ty.to_string());
                }
                self.push(" ");
                self.expr_block(&computed.body, 1);
                self.newline();
            }
            CollectionMember::Check(check) => {
                self.extras(&check.leading, 1);
                self.indent(1);
                self.push("check ");
                self.write_name(&check.name);
                self.push(" ");
                self.expr_block(&check.predicate, 1);
                self.newline();
            }
            CollectionMember::Unique(unique) => {
                self.extras(&unique.leading, 1);
                self.indent(1);
                self.push("unique [");
                self.push(unique.terms.text.trim());
                self.push("]");
                self.newline();
            }
            CollectionMember::Index(index) => {
                self.extras(&index.leading, 1);
                self.indent(1);
                self.push("index ");
                self.write_name(&index.name);
                self.push(" ");
                self.expr_block(&index.body, 1);
                self.newline();
            }
            CollectionMember::HistoryDays(days) => {
                self.extras(&days.leading, 1);
                self.indent(1);
                self.push("history_days ");
                self.push(&days.days);
                self.newline();
            }
            CollectionMember::TtlDays(days) => {
                self.extras(&days.leading, 1);
                self.indent(1);
                self.push("ttl_days ");
                self.push(&days.days);
                self.newline();
            }
            CollectionMember::DocumentTtls(flag) => {
                self.extras(&flag.leading, 1);
                self.indent(1);
                self.push("document_ttls ");
                self.push(if flag.enabled { "true" } else { "false" });
                self.newline();
            }
            CollectionMember::Migrations(migrations) => {
                self.extras(&migrations.leading, 1);
                self.indent(1);
                self.push("migrations ");
                self.expr_block(&migrations.body, 1);
                self.newline();
            }
        }
    }

    fn function(&mut self, function: &Function) {
        if let Some(role) = &function.role {
            self.push("@role(");
            self.write_name(role);
            self.push(")");
            self.newline();
        }
        self.record_decl(function.loc.as_ref());
        self.push("function ");
        self.write_name(&function.name);
        self.push("(");
        for (i, param) in function.params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.write_name(&param.name);
            if let Some(ty) = &param.ty {
                self.push(": ");
                self.push(&ty.to_string());
            }
        }
        self.push(")");
        if let Some(ret) = &function.ret {
            self.push(": ");
            self.push(&ret.to_string());
        }
        self.push(" ");
        self.expr_block(&function.body, 0);
        self.newline();
    }

    fn role(&mut self, role: &Role) {
        self.record_decl(role.loc.as_ref());
        self.push("role ");
        self.write_name(&role.name);
        self.push(" {");
        self.newline();

        let mut members: Vec<&RoleMember> = role.members.iter().collect();
        members.sort_by_key(|member| match member {
            RoleMember::Privileges(_) => 0u8,
            RoleMember::Membership(_) => 1,
        });
        for member in members {
            match member {
                RoleMember::Privileges(privileges) => {
                    self.extras(&privileges.leading, 1);
                    self.indent(1);
                    self.push("privileges ");
                    self.write_name(&privileges.resource);
                    self.push(" {");
                    self.newline();
                    for action in &privileges.actions {
                        self.extras(&action.leading, 2);
                        self.indent(2);
                        self.push(action.kind.as_str());
                        if let Some(predicate) = &action.predicate {
                            self.push(" ");
                            self.expr_block(predicate, 2);
                        }
                        self.newline();
                    }
                    self.indent(1);
                    self.push("}");
                    self.newline();
                }
                RoleMember::Membership(membership) => {
                    self.extras(&membership.leading, 1);
                    self.indent(1);
                    self.push("membership ");
                    self.write_name(&membership.collection);
                    if let Some(predicate) = &membership.predicate {
                        self.push(" ");
                        self.expr_block(predicate, 1);
                    }
                    self.newline();
                }
            }
        }
        self.push("}");
        self.newline();
    }

    /// Emit an expression blob between braces, re-indented to `depth + 1`.
    fn expr_block(&mut self, expr: &Expr, depth: usize) {
        self.push("{");
        self.newline();
        for line in reindent(&expr.text) {
            if line.is_empty() {
                self.newline();
                continue;
            }
            self.indent(depth + 1);
            self.record_blob_symbols(line, expr.loc.as_ref());
            self.push(line);
            self.newline();
        }
        self.indent(depth);
        self.push("}");
    }

    fn extras(&mut self, extras: &Extras, depth: usize) {
        for extra in extras {
            match extra {
                Extra::Comment(text) => {
                    self.indent(depth);
                    self.push(text);
                    self.newline();
                }
                Extra::Blank => self.newline(),
            }
        }
    }

    fn write_name(&mut self, name: &Name) {
        if let Some(loc) = name.loc.as_ref() {
            if let Some(map) = self.map.as_mut() {
                let symbol = self.original_names.get(&name.text).map(String::as_str);
                map.add(self.line, self.column, loc, symbol);
            }
        }
        self.push(&name.text);
    }

    fn record_decl(&mut self, loc: Option<&Location>) {
        if let (Some(map), Some(loc)) = (self.map.as_mut(), loc) {
            map.add(self.line, self.column, loc, None);
        }
    }

    /// Record mangled identifiers inside a blob line as symbol mappings
    /// pointing at the blob's original position.
    fn record_blob_symbols(&mut self, line: &str, loc: Option<&Location>) {
        if self.original_names.is_empty() {
            return;
        }
        let Some(loc) = loc else { return };
        let Some(map) = self.map.as_mut() else { return };
        for ident in fsl_parser::walker::identifiers(line) {
            if let Some(original) = self.original_names.get(ident.text) {
                map.add(self.line, self.column + ident.span.0, loc, Some(original.as_str()));
            }
        }
    }

    fn push(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }
        self.out.push_str(text);
    }

    fn newline(&mut self) {
        self.push("\n");
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.push("  ");
        }
    }
}

impl fmt::Display for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.out)
    }
}

/// Blob lines with surrounding blank lines dropped and the common leading
/// whitespace stripped; relative indentation survives. Blank interior lines
/// come back empty.
fn reindent(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    while lines.first().is_some_and(|line| line.trim().is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    let common = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .into_iter()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                &line[common..]
            }
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use fsl_parser::ast::CodeEq;
    use fsl_parser::Parser;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn collection_members_take_canonical_order() {
        let document = Parser::new(
            "collection Order { total: Number, unique [.number], history_days 30, number: Int }",
        )
        .parse()
        .unwrap();
        assert_eq!(
            encode(&document),
            indoc! {"
                collection Order {
                  history_days 30
                  total: Number
                  number: Int
                  unique [.number]
                }
            "},
        );
    }

    #[test]
    fn access_provider_members_take_canonical_order() {
        let document = Parser::new(
            "access provider auth0 {\n  ttl 300\n  role admin\n  issuer \"https://issuer/\"\n}",
        )
        .parse()
        .unwrap();
        assert_eq!(
            encode(&document),
            indoc! {r#"
                access provider auth0 {
                  issuer "https://issuer/"
                  role admin
                  ttl 300
                }
            "#},
        );
    }

    #[test]
    fn role_prints_privileges_before_membership() {
        let document = Parser::new(
            "role mod {\n  membership Users\n  privileges Posts {\n    read\n    write {\n      .open\n    }\n  }\n}",
        )
        .parse()
        .unwrap();
        assert_eq!(
            encode(&document),
            indoc! {"
                role mod {
                  privileges Posts {
                    read
                    write {
                      .open
                    }
                  }
                  membership Users
                }
            "},
        );
    }

    #[test]
    fn function_bodies_are_reindented() {
        let document = Parser::new("function add(a: Int, b: Int): Int {   a + b   }")
            .parse()
            .unwrap();
        assert_eq!(
            encode(&document),
            indoc! {"
                function add(a: Int, b: Int): Int {
                  a + b
                }
            "},
        );
    }

    #[test]
    fn blank_line_separates_declarations() {
        let document = Parser::new("collection A {\n  x: Int\n}\ncollection B {\n  y: Int\n}")
            .parse()
            .unwrap();
        assert_eq!(
            encode(&document),
            indoc! {"
                collection A {
                  x: Int
                }

                collection B {
                  y: Int
                }
            "},
        );
    }

    #[test]
    fn extras_are_preserved_at_their_anchors() {
        let input = indoc! {"
            // header
            collection User {
              name: String

              // age in years
              age: Int
            }
        "};
        let document = Parser::new(input).parse().unwrap();
        assert_eq!(encode(&document), input);
    }

    #[test]
    fn canonical_output_is_a_fixed_point() {
        let input = indoc! {r#"
            // providers
            access provider auth0 {
              issuer "https://issuer/"
              jwks_uri "https://issuer/jwks"
              role admin
              ttl 3600
            }

            collection Account as { owner: String } {
              history_days 7
              owner: String
              balance: Number
              compute negated: Number {
                -.balance
              }
              check positive {
                .balance >= 0
              }
              unique [.owner]
              index byOwner {
                terms [.owner]
              }
              migrations {
                add .balance
              }
            }

            @role(server)
            function interest(rate: Number): Number => Number {
              (balance) => balance * rate
            }

            role teller {
              privileges Account {
                read
                write {
                  .open
                }
              }
              membership Users {
                .isTeller
              }
            }
        "#};
        let first = encode(&Parser::new(input).parse().unwrap());
        let second = encode(&Parser::new(&first).parse().unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn round_trips_to_code_equal_tree() {
        let input = indoc! {r#"
            collection Account {
              balance: Number
              check positive {
                .balance >= 0
              }
            }

            function total(refs: Set<Account>): Number {
              refs.fold(0, (a, b) => a + b.balance)
            }
        "#};
        let document = Parser::new(input).parse().unwrap();
        let reparsed = Parser::new(&encode(&document)).parse().unwrap();
        assert!(document.code_eq(&reparsed));
    }

    #[test]
    fn source_map_symbols_cover_mangled_blob_references() {
        let input = "function caller() {\n  helper_0123()\n}\n";
        let document = Parser::new(input).filename("lib.fsl").parse().unwrap();
        let mut encoder = Encoder::with_source_map("schema.fsl");
        encoder
            .mangled_names(r#"{"helper": "helper_0123"}"#)
            .unwrap();
        let output = encoder.encode(&document);
        let comment = output
            .lines()
            .last()
            .expect("inline source map comment");
        assert!(comment.starts_with("//# sourceMappingURL=data:application/json;base64,"));

        use base64::engine::general_purpose::STANDARD;
        use base64::Engine as _;
        let payload = comment
            .strip_prefix("//# sourceMappingURL=data:application/json;base64,")
            .unwrap();
        let map: serde_json::Value =
            serde_json::from_slice(&STANDARD.decode(payload).unwrap()).unwrap();
        assert_eq!(map["sources"][0], "lib.fsl");
        assert_eq!(map["names"][0], "helper");
    }

    #[test]
    fn invalid_mangled_names_json_is_recoverable() {
        let mut encoder = Encoder::with_source_map("schema.fsl");
        assert!(matches!(
            encoder.mangled_names("not json"),
            Err(EncoderError::InvalidMangledNamesJson(_)),
        ));
        // The encoder still works, just without symbol info.
        let document = Parser::new("collection A {\n  x: Int\n}").parse().unwrap();
        assert!(encoder.encode(&document).contains("collection A {"));
    }
}
