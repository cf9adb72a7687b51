use super::error::Error;
use std::ops::{Deref, Range};

/// Position of the next unconsumed character.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct Location {
    /// Zero-based line number.
    pub line: usize,
    pub char_offset: usize,
    pub byte_offset: usize,
}

impl Location {
    /// Character span of `len` characters starting here.
    pub fn range(&self, len: usize) -> Range<usize> {
        self.char_offset..(self.char_offset + len)
    }
}

#[derive(Debug, Copy, Clone)]
pub struct LocatedStr<'a> {
    s: &'a str,
    begin: Location,
}

impl<'a> Deref for LocatedStr<'a> {
    type Target = str;

    fn deref(&self) -> &'a Self::Target {
        self.s
    }
}

impl<'a> LocatedStr<'a> {
    pub fn as_str(&self) -> &'a str {
        self.s
    }

    /// Character span of the string, used for error labels.
    pub fn range(&self) -> Range<usize> {
        self.begin.range(self.s.chars().count())
    }

    pub fn location(&self) -> &Location {
        &self.begin
    }

    /// Creates an error on the line of the string with an error label using
    /// the span of the string.
    pub fn as_error(&self, message: impl ToString, label: impl ToString) -> Error {
        Error::new_with_line(message, self.begin.line).with_label(self.range(), label)
    }
}

impl std::fmt::Display for LocatedStr<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.s)
    }
}

#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    location: Location,
}

impl<'a> Scanner<'a> {
    pub fn new(s: &'a str) -> Self {
        Self {
            source: s,
            location: Location::default(),
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The unconsumed input.
    pub fn as_str(&self) -> &'a str {
        &self.source[self.location.byte_offset..]
    }

    pub fn starts_with(&self, s: &str) -> bool {
        self.as_str().starts_with(s)
    }

    pub fn peek(&self) -> Option<char> {
        self.as_str().chars().next()
    }

    pub fn next_if(&mut self, predicate: impl FnOnce(char) -> bool) -> Option<char> {
        match self.peek() {
            Some(c) if predicate(c) => self.next(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.peek().is_none()
    }

    pub fn expect(
        &mut self,
        what: impl ToString,
        predicate: impl FnOnce(char) -> bool,
    ) -> Result<char, Error> {
        let loc = self.location;
        match self.next() {
            Some(next) if predicate(next) => Ok(next),
            otherwise => Err(char_mismatch_error(what, otherwise, &loc)),
        }
    }

    pub fn expect_eq(&mut self, expected: char) -> Result<char, Error> {
        self.expect(display_char(expected), |c| c == expected)
    }

    /// Consumes characters while `predicate` matches.
    pub fn some(&mut self, mut predicate: impl FnMut(char) -> bool) -> LocatedStr<'a> {
        let begin = self.location;
        while self.next_if(&mut predicate).is_some() {}
        LocatedStr {
            s: &self.source[begin.byte_offset..self.location.byte_offset],
            begin,
        }
    }

    pub fn digits(&mut self) -> LocatedStr<'a> {
        self.some(|c| c.is_ascii_digit())
    }

    pub fn skip_space(&mut self, newline: bool) {
        let p = is_space(newline);
        while self.next_if(p).is_some() {}
    }

    pub fn rest_of_line(&mut self) -> LocatedStr<'a> {
        self.some(|c| c != '\n')
    }

    /// Consumes everything up to `delim` on the current line, the delimiter
    /// itself is left in the input.
    pub fn until_on_line(&mut self, delim: char) -> Result<LocatedStr<'a>, Error> {
        let matched = self.some(|c| c != delim && c != '\n');
        match self.peek() {
            Some(c) if c == delim => Ok(matched),
            otherwise => {
                let what = match otherwise {
                    Some(c) => display_char(c),
                    None => "end of input".to_string(),
                };
                Err(
                    Error::new_with_line("unexpected character", self.location.line).with_label(
                        self.location.range(1),
                        format!("expected {} before {}", display_char(delim), what),
                    ),
                )
            }
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = char;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.peek()?;
        if next == '\n' {
            self.location.line += 1;
        }
        self.location.char_offset += 1;
        self.location.byte_offset += next.len_utf8();
        Some(next)
    }
}

fn display_char(c: char) -> String {
    if c == '\n' {
        "newline".to_string()
    } else {
        format!("`{}`", c)
    }
}

fn char_mismatch_error(expected: impl ToString, actual: Option<char>, loc: &Location) -> Error {
    let expected = expected.to_string();
    let label = format!("expected {expected}");
    let message = match actual {
        Some(actual) => {
            let actual = display_char(actual);
            format!("expected {expected}, found {actual}")
        }
        None => "unexpected end of input".to_string(),
    };
    Error::new_with_line(message, loc.line).with_label(loc.range(1), label)
}

/// Returns a predicate matching whitespace.
pub fn is_space(newline: bool) -> fn(char) -> bool {
    if newline {
        |c: char| c == ' ' || c == '\t' || c == '\r' || c == '\n'
    } else {
        |c: char| c == ' ' || c == '\t' || c == '\r'
    }
}
