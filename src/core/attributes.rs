//! XML attribute parsing
//!
//! Parses the attribute region of a tag (between the element name and the
//! closing '>' or '/>'). Lenient: unquoted values and valueless attributes
//! are accepted, invalid bytes are skipped.

use super::entities::decode_text;
use super::scanner::{is_name_char, is_name_start_char};
use std::borrow::Cow;

/// A parsed XML attribute
#[derive(Debug, Clone)]
pub struct Attribute<'a> {
    /// Attribute name as written (prefix included, if any)
    pub name: &'a [u8],
    /// Attribute value with entities decoded
    pub value: Cow<'a, [u8]>,
}

impl<'a> Attribute<'a> {
    /// Get the name as a string
    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(self.name).ok()
    }

    /// Get the value as a string
    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(self.value.as_ref()).ok()
    }
}

/// Parse attributes from raw tag content (after the element name)
pub fn parse_attributes(input: &[u8]) -> Vec<Attribute<'_>> {
    let mut attrs = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() || input[pos] == b'/' || input[pos] == b'>' || input[pos] == b'?' {
            break;
        }

        if !is_name_start_char(input[pos]) {
            pos += 1;
            continue;
        }
        let name_start = pos;
        while pos < input.len() && is_name_char(input[pos]) {
            pos += 1;
        }
        let name = &input[name_start..pos];

        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }

        if pos >= input.len() || input[pos] != b'=' {
            // Valueless attribute
            attrs.push(Attribute {
                name,
                value: Cow::Borrowed(b""),
            });
            continue;
        }
        pos += 1; // skip '='

        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() {
            break;
        }

        let quote = input[pos];
        let value = if quote == b'"' || quote == b'\'' {
            pos += 1;
            let value_start = pos;
            while pos < input.len() && input[pos] != quote {
                pos += 1;
            }
            let raw = &input[value_start..pos];
            if pos < input.len() {
                pos += 1; // skip closing quote
            }
            raw
        } else {
            // Unquoted value: non-standard but accepted
            let value_start = pos;
            while pos < input.len()
                && !is_whitespace(input[pos])
                && input[pos] != b'/'
                && input[pos] != b'>'
            {
                pos += 1;
            }
            &input[value_start..pos]
        };

        attrs.push(Attribute {
            name,
            value: decode_text(value),
        });
    }

    attrs
}

#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_attributes() {
        let attrs = parse_attributes(b" id=\"test\" class=\"foo\"");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].name_str(), Some("id"));
        assert_eq!(attrs[0].value_str(), Some("test"));
        assert_eq!(attrs[1].name_str(), Some("class"));
        assert_eq!(attrs[1].value_str(), Some("foo"));
    }

    #[test]
    fn test_single_quoted() {
        let attrs = parse_attributes(b" sku='A-1'");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].value_str(), Some("A-1"));
    }

    #[test]
    fn test_entity_in_value() {
        let attrs = parse_attributes(b" title=\"&lt;hello&gt;\"");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].value_str(), Some("<hello>"));
    }

    #[test]
    fn test_valueless_attribute() {
        let attrs = parse_attributes(b" checked other=\"1\"");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].name_str(), Some("checked"));
        assert_eq!(attrs[0].value_str(), Some(""));
    }

    #[test]
    fn test_whitespace_around_equals() {
        let attrs = parse_attributes(b"  id  =  \"test\"  ");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].value_str(), Some("test"));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_attributes(b"").is_empty());
    }
}
