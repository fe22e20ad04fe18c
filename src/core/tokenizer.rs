//! XML tokenizer - pull-based token extraction
//!
//! Extracts tags, text, CDATA, comments, processing instructions and
//! DOCTYPE declarations from a byte slice. Structural errors (an unclosed
//! tag, an invalid name, an unterminated comment) surface as [`ParseError`];
//! everything above this layer propagates them unchanged.

use super::scanner::Scanner;

/// Type of XML token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Element start tag: `<element ...>`
    StartTag,
    /// Element end tag: `</element>`
    EndTag,
    /// Empty element: `<element .../>`
    EmptyTag,
    /// Text content between tags
    Text,
    /// CDATA section: `<![CDATA[...]]>`
    CData,
    /// Comment: `<!--...-->`
    Comment,
    /// Processing instruction or XML declaration: `<?...?>`
    ProcessingInstruction,
    /// DOCTYPE declaration
    DocType,
    /// End of input
    Eof,
}

/// A parsed XML token
#[derive(Debug, Clone)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw span in the input (start, end)
    pub span: (usize, usize),
    /// For tags: the element name
    pub name: Option<&'a [u8]>,
}

/// Tokenization failure with its input byte position
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        ParseError {
            message: message.into(),
            position,
        }
    }
}

/// Pull tokenizer over a byte slice
pub struct Tokenizer<'a> {
    input: &'a [u8],
    scanner: Scanner<'a>,
    done: bool,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer for the given input
    pub fn new(input: &'a [u8]) -> Self {
        Tokenizer {
            input,
            scanner: Scanner::new(input),
            done: false,
        }
    }

    /// Raw bytes of a tag's attribute region (between name and closing '>')
    pub fn tag_attribute_region(&self, token: &Token<'a>) -> &'a [u8] {
        let (start, end) = token.span;
        let name_len = token.name.map(|n| n.len()).unwrap_or(0);
        // span start points at '<'; skip '<' or '</' plus the name
        let mut from = start + 1 + name_len;
        if self.input.get(start + 1) == Some(&b'/') {
            from += 1;
        }
        let mut to = end;
        if self.input[..to].ends_with(b"/>") {
            to -= 2;
        } else if self.input[..to].ends_with(b">") {
            to -= 1;
        }
        &self.input[from.min(to)..to]
    }

    /// Get the next token. Returns an `Eof` token exactly once, then `Eof`
    /// again on every later call.
    pub fn next_token(&mut self) -> Result<Token<'a>, ParseError> {
        if self.done || self.scanner.is_eof() {
            self.done = true;
            let pos = self.scanner.position();
            return Ok(Token {
                kind: TokenKind::Eof,
                span: (pos, pos),
                name: None,
            });
        }

        match self.scanner.peek() {
            Some(b'<') => self.read_markup(),
            _ => self.read_text(),
        }
    }

    /// Read a text run up to the next '<' or end of input
    fn read_text(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.scanner.position();
        let end = self.scanner.find_tag_start().unwrap_or(self.input.len());
        self.scanner.advance(end - start);
        Ok(Token {
            kind: TokenKind::Text,
            span: (start, end),
            name: None,
        })
    }

    /// Read markup starting at '<'
    fn read_markup(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.scanner.position();
        match self.scanner.peek_at(1) {
            Some(b'/') => self.read_end_tag(start),
            Some(b'!') => self.read_bang_markup(start),
            Some(b'?') => self.read_delimited(start, b"?>", TokenKind::ProcessingInstruction),
            Some(_) => self.read_start_tag(start),
            None => Err(ParseError::new("input ends inside a tag", start)),
        }
    }

    fn read_start_tag(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(1); // '<'
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| ParseError::new("invalid element name", start + 1))?;

        let close = self
            .scanner
            .find_tag_end_quoted()
            .ok_or_else(|| ParseError::new("unclosed start tag", start))?;
        self.scanner.advance(close + 1 - self.scanner.position());

        let kind = if self.input[..close].ends_with(b"/") {
            TokenKind::EmptyTag
        } else {
            TokenKind::StartTag
        };
        Ok(Token {
            kind,
            span: (start, close + 1),
            name: Some(name),
        })
    }

    fn read_end_tag(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(2); // '</'
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| ParseError::new("invalid element name in end tag", start + 2))?;

        self.scanner.skip_whitespace();
        match self.scanner.peek() {
            Some(b'>') => {
                self.scanner.advance(1);
                Ok(Token {
                    kind: TokenKind::EndTag,
                    span: (start, self.scanner.position()),
                    name: Some(name),
                })
            }
            _ => Err(ParseError::new("unclosed end tag", start)),
        }
    }

    /// Read `<!...` markup: comment, CDATA or DOCTYPE
    fn read_bang_markup(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        if self.scanner.starts_with(b"<!--") {
            self.read_delimited(start, b"-->", TokenKind::Comment)
        } else if self.scanner.starts_with(b"<![CDATA[") {
            self.read_delimited(start, b"]]>", TokenKind::CData)
        } else {
            // DOCTYPE (internal subsets with nested '<' are not supported)
            let close = self
                .scanner
                .find_tag_end_quoted()
                .ok_or_else(|| ParseError::new("unterminated DOCTYPE", start))?;
            self.scanner.advance(close + 1 - self.scanner.position());
            Ok(Token {
                kind: TokenKind::DocType,
                span: (start, close + 1),
                name: None,
            })
        }
    }

    /// Read a construct terminated by a fixed delimiter
    fn read_delimited(
        &mut self,
        start: usize,
        terminator: &[u8],
        kind: TokenKind,
    ) -> Result<Token<'a>, ParseError> {
        let end = self
            .scanner
            .find_sequence(terminator)
            .ok_or_else(|| ParseError::new("unterminated markup", start))?;
        let after = end + terminator.len();
        self.scanner.advance(after - self.scanner.position());
        Ok(Token {
            kind,
            span: (start, after),
            name: None,
        })
    }
}
