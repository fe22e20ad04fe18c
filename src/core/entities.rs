//! XML entity decoding with Cow (zero-copy when possible)
//!
//! Decodes the five predefined entities plus numeric character references.
//! Attribute values are the only place the shredder needs decoded text.

use memchr::memchr;
use std::borrow::Cow;

/// Decode entity references in text, borrowing when no '&' is present.
///
/// Unknown or malformed references are passed through verbatim; the
/// shredder is lenient about content it only copies into row values.
pub fn decode_text(input: &[u8]) -> Cow<'_, [u8]> {
    let first_amp = match memchr(b'&', input) {
        Some(pos) => pos,
        None => return Cow::Borrowed(input),
    };

    let mut out = Vec::with_capacity(input.len());
    out.extend_from_slice(&input[..first_amp]);
    let mut pos = first_amp;

    while pos < input.len() {
        if input[pos] != b'&' {
            out.push(input[pos]);
            pos += 1;
            continue;
        }

        let end = match memchr(b';', &input[pos + 1..]) {
            Some(i) => pos + 1 + i,
            None => {
                // Bare '&' with no terminator: pass through
                out.extend_from_slice(&input[pos..]);
                break;
            }
        };

        if decode_entity(&input[pos + 1..end], &mut out) {
            pos = end + 1;
        } else {
            out.push(b'&');
            pos += 1;
        }
    }

    Cow::Owned(out)
}

/// Decode a single entity body (between '&' and ';') into `out`.
/// Returns false if the reference is not recognized.
fn decode_entity(body: &[u8], out: &mut Vec<u8>) -> bool {
    match body {
        b"amp" => out.push(b'&'),
        b"lt" => out.push(b'<'),
        b"gt" => out.push(b'>'),
        b"quot" => out.push(b'"'),
        b"apos" => out.push(b'\''),
        _ => {
            let code = match body {
                [b'#', b'x' | b'X', hex @ ..] => parse_u32(hex, 16),
                [b'#', dec @ ..] => parse_u32(dec, 10),
                _ => None,
            };
            match code.and_then(char::from_u32) {
                Some(c) => {
                    let mut buf = [0u8; 4];
                    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
                None => return false,
            }
        }
    }
    true
}

fn parse_u32(digits: &[u8], radix: u32) -> Option<u32> {
    if digits.is_empty() {
        return None;
    }
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| u32::from_str_radix(s, radix).ok())
}
