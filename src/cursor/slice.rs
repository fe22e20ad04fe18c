//! Slice-backed document cursor
//!
//! Zero-copy cursor over an in-memory document. Element names and attribute
//! values borrow from the input; only entity-decoded attribute values
//! allocate.

use super::{CursorStep, DocumentCursor};
use crate::core::attributes::parse_attributes;
use crate::core::tokenizer::{ParseError, Token, TokenKind, Tokenizer};
use crate::error::{ShredError, ShredResult};

/// Forward-only cursor over a byte slice
pub struct SliceCursor<'a> {
    tokenizer: Tokenizer<'a>,
    /// Names of currently open elements, outermost first
    open: Vec<&'a [u8]>,
    done: bool,
}

impl<'a> SliceCursor<'a> {
    /// Create a cursor over a complete document held in memory
    pub fn new(input: &'a [u8]) -> Self {
        SliceCursor {
            tokenizer: Tokenizer::new(input),
            open: Vec::with_capacity(8),
            done: false,
        }
    }

    /// Number of currently open elements
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    fn open_step(&mut self, token: &Token<'a>, empty: bool) -> CursorStep<'a> {
        let name = token.name.unwrap_or(b"");
        let region = self.tokenizer.tag_attribute_region(token);
        let attributes = parse_attributes(region);
        let depth = self.open.len();
        if !empty {
            self.open.push(name);
        }
        CursorStep::Open {
            name,
            depth,
            attributes,
        }
    }

    fn close_element(&mut self, token: &Token<'a>) -> ShredResult<()> {
        let name = token.name.unwrap_or(b"");
        match self.open.pop() {
            Some(expected) if expected == name => Ok(()),
            Some(expected) => Err(ShredError::malformed(
                format!(
                    "mismatched end tag: expected </{}>, found </{}>",
                    String::from_utf8_lossy(expected),
                    String::from_utf8_lossy(name),
                ),
                token.span.0,
            )),
            None => Err(ShredError::malformed(
                format!(
                    "end tag </{}> with no open element",
                    String::from_utf8_lossy(name)
                ),
                token.span.0,
            )),
        }
    }
}

impl From<ParseError> for ShredError {
    fn from(err: ParseError) -> Self {
        ShredError::Malformed {
            message: err.message,
            position: err.position,
        }
    }
}

impl DocumentCursor for SliceCursor<'_> {
    fn next_step(&mut self) -> ShredResult<CursorStep<'_>> {
        if self.done {
            return Ok(CursorStep::EndOfDocument {
                unclosed: self.open.len(),
            });
        }

        loop {
            let token = self.tokenizer.next_token()?;
            match token.kind {
                TokenKind::Eof => {
                    self.done = true;
                    return Ok(CursorStep::EndOfDocument {
                        unclosed: self.open.len(),
                    });
                }
                TokenKind::StartTag => return Ok(self.open_step(&token, false)),
                TokenKind::EmptyTag => return Ok(self.open_step(&token, true)),
                TokenKind::EndTag => self.close_element(&token)?,
                // Text, CDATA, comments, PIs and DOCTYPE carry no row data
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(input: &[u8]) -> Vec<(String, usize)> {
        let mut cursor = SliceCursor::new(input);
        let mut out = Vec::new();
        loop {
            match cursor.next_step().unwrap() {
                CursorStep::Open { name, depth, .. } => {
                    out.push((String::from_utf8_lossy(name).into_owned(), depth));
                }
                CursorStep::EndOfDocument { .. } => break,
            }
        }
        out
    }

    #[test]
    fn test_depth_tracking() {
        let out = steps(b"<a><b><c/></b><b/></a>");
        assert_eq!(
            out,
            vec![
                ("a".to_string(), 0),
                ("b".to_string(), 1),
                ("c".to_string(), 2),
                ("b".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_skips_non_element_content() {
        let out = steps(b"<?xml version=\"1.0\"?><!-- c --><a>text<![CDATA[x]]></a>");
        assert_eq!(out, vec![("a".to_string(), 0)]);
    }

    #[test]
    fn test_attributes_surface() {
        let mut cursor = SliceCursor::new(b"<Item sku=\"A\" qty=\"2\"/>");
        match cursor.next_step().unwrap() {
            CursorStep::Open { attributes, .. } => {
                assert_eq!(attributes.len(), 2);
                assert_eq!(attributes[0].name_str(), Some("sku"));
                assert_eq!(attributes[1].value_str(), Some("2"));
            }
            other => panic!("expected Open, got {other:?}"),
        }
    }

    #[test]
    fn test_unclosed_reported_at_end() {
        let mut cursor = SliceCursor::new(b"<a><b>");
        cursor.next_step().unwrap();
        cursor.next_step().unwrap();
        match cursor.next_step().unwrap() {
            CursorStep::EndOfDocument { unclosed } => assert_eq!(unclosed, 2),
            other => panic!("expected EndOfDocument, got {other:?}"),
        }
    }

    #[test]
    fn test_mismatched_end_tag() {
        let mut cursor = SliceCursor::new(b"<a></b>");
        cursor.next_step().unwrap();
        let err = cursor.next_step().unwrap_err();
        assert!(matches!(err, ShredError::Malformed { .. }));
    }

    #[test]
    fn test_end_of_document_is_sticky() {
        let mut cursor = SliceCursor::new(b"<a/>");
        cursor.next_step().unwrap();
        assert!(matches!(
            cursor.next_step().unwrap(),
            CursorStep::EndOfDocument { unclosed: 0 }
        ));
        assert!(matches!(
            cursor.next_step().unwrap(),
            CursorStep::EndOfDocument { unclosed: 0 }
        ));
    }
}
