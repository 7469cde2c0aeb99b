//! Source map recording for the canonical printer.
//!
//! Mappings relate positions in the generated canonical text back to the
//! original schema files, with the original UDF name attached as the symbol
//! for identifiers the linker mangled. The output is a standard v3 source
//! map, emitted inline as a base64 data URI comment.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use fsl_parser::ast::Location;
use serde::Serialize;

#[derive(Debug, Default)]
pub(crate) struct SourceMapBuilder {
    output_file: String,
    sources: Vec<String>,
    source_indices: HashMap<String, usize>,
    sources_content: HashMap<String, String>,
    names: Vec<String>,
    name_indices: HashMap<String, usize>,
    mappings: Vec<Mapping>,
}

#[derive(Debug)]
struct Mapping {
    generated_line: usize,
    generated_column: usize,
    source: usize,
    line: usize,
    column: usize,
    name: Option<usize>,
}

#[derive(Serialize)]
struct RawSourceMap<'a> {
    version: u32,
    file: &'a str,
    sources: &'a [String],
    #[serde(rename = "sourcesContent", skip_serializing_if = "Option::is_none")]
    sources_content: Option<Vec<Option<&'a str>>>,
    names: &'a [String],
    mappings: String,
}

impl SourceMapBuilder {
    pub(crate) fn new(output_file: impl Into<String>) -> Self {
        Self {
            output_file: output_file.into(),
            ..Self::default()
        }
    }

    /// Provide original file contents for the `sourcesContent` field.
    pub(crate) fn set_sources(&mut self, sources: HashMap<String, String>) {
        self.sources_content = sources;
    }

    /// Record that the generated position maps to `loc`, optionally naming
    /// the original symbol written there.
    ///
    /// Positions without a file are unmapped; they come from synthesized
    /// nodes with no original to point at.
    pub(crate) fn add(
        &mut self,
        generated_line: usize,
        generated_column: usize,
        loc: &Location,
        symbol: Option<&str>,
    ) {
        let Some(file) = &loc.file else {
            return;
        };
        let source = match self.source_indices.get(file.as_ref()) {
            Some(&index) => index,
            None => {
                let index = self.sources.len();
                self.sources.push(file.to_string());
                self.source_indices.insert(file.to_string(), index);
                index
            }
        };
        let name = symbol.map(|symbol| match self.name_indices.get(symbol) {
            Some(&index) => index,
            None => {
                let index = self.names.len();
                self.names.push(symbol.to_string());
                self.name_indices.insert(symbol.to_string(), index);
                index
            }
        });
        self.mappings.push(Mapping {
            generated_line,
            generated_column,
            source,
            // Source map positions are 0-based; parser positions are 1-based.
            line: loc.line.saturating_sub(1),
            column: loc.column.saturating_sub(1),
            name,
        });
    }

    /// Serialize and wrap into the inline `sourceMappingURL` comment.
    pub(crate) fn finish(self) -> String {
        let sources_content = if self.sources_content.is_empty() {
            None
        } else {
            Some(
                self.sources
                    .iter()
                    .map(|source| self.sources_content.get(source).map(String::as_str))
                    .collect(),
            )
        };
        let raw = RawSourceMap {
            version: 3,
            file: &self.output_file,
            sources: &self.sources,
            sources_content,
            names: &self.names,
            mappings: encode_mappings(&self.mappings),
        };
        let json = serde_json::to_string(&raw).expect("source map serialization is infallible");
        format!(
            "//# sourceMappingURL=data:application/json;base64,{}",
            STANDARD.encode(json)
        )
    }
}

/// Encode mappings as base64 VLQ segment lines.
fn encode_mappings(mappings: &[Mapping]) -> String {
    let mut out = String::new();
    let mut previous_source = 0i64;
    let mut previous_line = 0i64;
    let mut previous_column = 0i64;
    let mut previous_name = 0i64;
    let mut current_line = 0usize;
    let mut first_in_line = true;
    let mut previous_generated_column = 0i64;

    for mapping in mappings {
        while current_line < mapping.generated_line {
            out.push(';');
            current_line += 1;
            first_in_line = true;
            previous_generated_column = 0;
        }
        if !first_in_line {
            out.push(',');
        }
        first_in_line = false;

        encode_vlq(&mut out, mapping.generated_column as i64 - previous_generated_column);
        previous_generated_column = mapping.generated_column as i64;

        encode_vlq(&mut out, mapping.source as i64 - previous_source);
        previous_source = mapping.source as i64;
        encode_vlq(&mut out, mapping.line as i64 - previous_line);
        previous_line = mapping.line as i64;
        encode_vlq(&mut out, mapping.column as i64 - previous_column);
        previous_column = mapping.column as i64;

        if let Some(name) = mapping.name {
            encode_vlq(&mut out, name as i64 - previous_name);
            previous_name = name as i64;
        }
    }
    out
}

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn encode_vlq(out: &mut String, value: i64) {
    let mut vlq = if value < 0 {
        (((-value) as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };
    loop {
        let mut digit = (vlq & 0x1f) as usize;
        vlq >>= 5;
        if vlq != 0 {
            digit |= 0x20;
        }
        out.push(BASE64_ALPHABET[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}
