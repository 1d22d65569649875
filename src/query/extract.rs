//! Separates predicate forms from the structural part of a query.
//!
//! Predicates such as `(#eq? @a @b)` are evaluated by this crate rather
//! than by the engine. The scanner copies the query source, overwrites
//! every predicate form with spaces (keeping newlines, so byte offsets and
//! rows reported by the engine still point into the original text), and
//! records each predicate's steps with the offset it was written at.

use crate::query::errors::{QueryError, QueryErrorKind};

/// One argument (or the operator) of a predicate form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateStep {
    Capture { name: String, offset: usize },
    String { value: String, offset: usize },
}

impl PredicateStep {
    pub fn offset(&self) -> usize {
        match self {
            PredicateStep::Capture { offset, .. } | PredicateStep::String { offset, .. } => *offset,
        }
    }
}

/// A predicate form as written, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPredicate {
    /// Offset of the form's opening parenthesis.
    pub offset: usize,
    /// Operator name, or `None` when the form does not start with one.
    pub operator: Option<String>,
    pub args: Vec<PredicateStep>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// The query with predicate forms blanked out.
    pub structural: String,
    /// Predicates in source order.
    pub predicates: Vec<RawPredicate>,
}

pub fn extract(source: &str) -> Result<Extracted, QueryError> {
    Scanner::new(source).run()
}

struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    structural: Vec<u8>,
    predicates: Vec<RawPredicate>,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            structural: source.as_bytes().to_vec(),
            predicates: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Extracted, QueryError> {
        let mut depth = 0usize;

        while let Some(&byte) = self.bytes.get(self.pos) {
            match byte {
                b';' => self.skip_comment(),
                b'"' => {
                    self.read_string()?;
                }
                b'(' if self.predicate_follows() => {
                    if depth == 0 {
                        return Err(self.error(self.pos, QueryErrorKind::Structure));
                    }
                    let start = self.pos;
                    let predicate = self.read_predicate()?;
                    self.blank(start, self.pos);
                    self.predicates.push(predicate);
                }
                b'(' | b'[' => {
                    depth += 1;
                    self.pos += 1;
                }
                b')' | b']' => {
                    depth = depth.saturating_sub(1);
                    self.pos += 1;
                }
                b'@' => {
                    self.pos += 1;
                    self.read_identifier();
                }
                _ => self.pos += 1,
            }
        }

        // Blanking replaces every byte of a form, so the copy stays valid UTF-8.
        let structural = String::from_utf8(self.structural)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());

        Ok(Extracted {
            structural,
            predicates: self.predicates,
        })
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    /// `(` followed, after optional whitespace, by `#`.
    fn predicate_follows(&self) -> bool {
        self.bytes[self.pos + 1..]
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|&b| b == b'#')
    }

    fn skip_comment(&mut self) {
        while let Some(&byte) = self.bytes.get(self.pos) {
            if byte == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(&byte) = self.bytes.get(self.pos) {
            match byte {
                b';' => self.skip_comment(),
                b if b.is_ascii_whitespace() => self.pos += 1,
                _ => break,
            }
        }
    }

    fn read_identifier(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek(0).is_some_and(|b| is_identifier_byte(Some(b))) {
            self.pos += 1;
        }
        &self.source[start..self.pos]
    }

    /// Read a string literal starting at the opening quote.
    fn read_string(&mut self) -> Result<String, QueryError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = Vec::new();

        loop {
            match self.peek(0) {
                None => return Err(self.error(start, QueryErrorKind::Syntax)),
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    let escaped = match self.peek(1) {
                        Some(b'n') => b'\n',
                        Some(b'r') => b'\r',
                        Some(b't') => b'\t',
                        Some(b'0') => b'\0',
                        Some(other) => other,
                        None => return Err(self.error(start, QueryErrorKind::Syntax)),
                    };
                    value.push(escaped);
                    self.pos += 2;
                }
                Some(byte) => {
                    value.push(byte);
                    self.pos += 1;
                }
            }
        }

        Ok(String::from_utf8_lossy(&value).into_owned())
    }

    /// Read `(#operator arg...)` starting at the opening parenthesis.
    fn read_predicate(&mut self) -> Result<RawPredicate, QueryError> {
        let offset = self.pos;
        self.pos += 1;
        self.skip_trivia();
        // Skip '#'.
        self.pos += 1;

        let operator = match self.read_identifier() {
            "" => None,
            name => Some(name.to_string()),
        };

        let mut args = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek(0) {
                None => return Err(self.error(offset, QueryErrorKind::Syntax)),
                Some(b')') => {
                    self.pos += 1;
                    break;
                }
                Some(b'@') => {
                    let at = self.pos;
                    self.pos += 1;
                    let name = self.read_identifier();
                    if name.is_empty() {
                        return Err(self.error(at, QueryErrorKind::Syntax));
                    }
                    args.push(PredicateStep::Capture {
                        name: name.to_string(),
                        offset: at + 1,
                    });
                }
                Some(b'"') => {
                    let at = self.pos;
                    let value = self.read_string()?;
                    args.push(PredicateStep::String { value, offset: at });
                }
                Some(byte) if is_identifier_byte(Some(byte)) => {
                    let at = self.pos;
                    let value = self.read_identifier().to_string();
                    args.push(PredicateStep::String { value, offset: at });
                }
                Some(_) => return Err(self.error(self.pos, QueryErrorKind::Syntax)),
            }
        }

        Ok(RawPredicate {
            offset,
            operator,
            args,
        })
    }

    fn blank(&mut self, start: usize, end: usize) {
        for byte in &mut self.structural[start..end] {
            if *byte != b'\n' {
                *byte = b' ';
            }
        }
    }

    fn error(&self, offset: usize, kind: QueryErrorKind) -> QueryError {
        QueryError::at(self.source, offset, kind)
    }
}

fn is_identifier_byte(byte: Option<u8>) -> bool {
    byte.is_some_and(|b| {
        b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'?' | b'!') || b >= 0x80
    })
}
