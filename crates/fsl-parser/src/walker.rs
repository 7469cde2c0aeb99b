//! Lazy identifier walker over FQL expression blobs.
//!
//! The toolchain never parses FQL expressions; the linker only needs to see
//! identifier-like tokens and where they sit. A minimal tokenizer suffices:
//! identifiers, string literals, numbers, comments, everything else. The
//! walker yields each identifier with its byte range so callers can match
//! and splice references without understanding the expression.

use std::ops::Range;

/// An identifier found inside an expression blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identifier<'a> {
    /// The identifier text.
    pub text: &'a str,
    /// Its byte range within the blob.
    pub span: (usize, usize),
}

/// Iterator over the identifiers of an expression blob.
#[derive(Clone, Debug)]
pub struct IdentifierWalker<'a> {
    src: &'a str,
    offset: usize,
}

/// Walk the identifiers of `blob` in source order.
pub fn identifiers(blob: &str) -> IdentifierWalker<'_> {
    IdentifierWalker { src: blob, offset: 0 }
}

impl<'a> Iterator for IdentifierWalker<'a> {
    type Item = Identifier<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.src.as_bytes();
        while self.offset < bytes.len() {
            let c = bytes[self.offset];
            match c {
                b'"' => self.skip_string(),
                b'/' if bytes.get(self.offset + 1) == Some(&b'/') => self.skip_comment(),
                c if c.is_ascii_digit() => self.skip_number(),
                c if is_ident_start(c) => {
                    let start = self.offset;
                    while self.offset < bytes.len() && is_ident_char(bytes[self.offset]) {
                        self.offset += 1;
                    }
                    return Some(Identifier {
                        text: &self.src[start..self.offset],
                        span: (start, self.offset),
                    });
                }
                _ => self.offset += 1,
            }
        }
        None
    }
}

impl IdentifierWalker<'_> {
    fn skip_string(&mut self) {
        let bytes = self.src.as_bytes();
        self.offset += 1;
        while self.offset < bytes.len() {
            match bytes[self.offset] {
                b'\\' => self.offset += 2,
                b'"' => {
                    self.offset += 1;
                    return;
                }
                _ => self.offset += 1,
            }
        }
    }

    fn skip_comment(&mut self) {
        let bytes = self.src.as_bytes();
        while self.offset < bytes.len() && bytes[self.offset] != b'\n' {
            self.offset += 1;
        }
    }

    fn skip_number(&mut self) {
        // Consume the full literal so `1e5` does not leak an `e5` identifier.
        let bytes = self.src.as_bytes();
        while self.offset < bytes.len()
            && (is_ident_char(bytes[self.offset]) || bytes[self.offset] == b'.')
        {
            self.offset += 1;
        }
    }
}

/// Replace every whole identifier for which `lookup` returns a substitute.
///
/// Returns `None` when nothing matched, leaving the caller's blob untouched.
pub fn rewrite_identifiers<'m, F>(blob: &str, mut lookup: F) -> Option<String>
where
    F: FnMut(&str) -> Option<&'m str>,
{
    let mut out: Option<String> = None;
    let mut copied = 0usize;
    for ident in identifiers(blob) {
        let Some(replacement) = lookup(ident.text) else {
            continue;
        };
        let (start, end) = ident.span;
        let out = out.get_or_insert_with(|| String::with_capacity(blob.len() + 16));
        out.push_str(&blob[copied..start]);
        out.push_str(replacement);
        copied = end;
    }
    out.map(|mut s| {
        s.push_str(&blob[copied..]);
        s
    })
}

/// Byte ranges of every identifier equal to `needle`.
pub fn find_references(blob: &str, needle: &str) -> Vec<Range<usize>> {
    identifiers(blob)
        .filter(|id| id.text == needle)
        .map(|id| id.span.0..id.span.1)
        .collect()
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn yields_identifiers_in_order() {
        let blob = r#"let x = greet(name) + "ignored person" // also ignored
      other(x)"#;
        let found: Vec<&str> = identifiers(blob).map(|id| id.text).collect();
        assert_eq!(vec!["let", "x", "greet", "name", "other", "x"], found);
    }

    #[test]
    fn numbers_do_not_leak_identifiers() {
        let found: Vec<&str> = identifiers("1e5 + 2.5x + x1").map(|id| id.text).collect();
        assert_eq!(vec!["x1"], found);
    }

    #[test]
    fn rewrite_replaces_whole_identifiers_only() {
        let rewritten = rewrite_identifiers("abc(ab) + ab_2", |id| match id {
            "ab" => Some("ab_ff"),
            _ => None,
        })
        .unwrap();
        assert_eq!("abc(ab_ff) + ab_2", rewritten);
    }

    #[test]
    fn rewrite_skips_strings_and_comments() {
        let blob = "f() // f()\n\"f\" + f";
        let rewritten = rewrite_identifiers(blob, |id| (id == "f").then_some("g")).unwrap();
        assert_eq!("g() // f()\n\"f\" + g", rewritten);
    }

    #[test]
    fn rewrite_returns_none_without_matches() {
        assert!(rewrite_identifiers("a + b", |_| None).is_none());
    }

    #[test]
    fn find_references_reports_spans() {
        let spans = find_references("f(f)", "f");
        assert_eq!(vec![0..1, 2..3], spans);
    }
}
