use super::{
    error::Error,
    scanner::{is_space, Scanner},
};
use std::{fs::read_to_string, io, path::Path};

pub enum SetError {
    InvalidKey(Error),
    InvalidValue(Error),
}

impl SetError {
    fn into_inner(self) -> Error {
        match self {
            Self::InvalidKey(e) | Self::InvalidValue(e) => e,
        }
    }
}

pub type SetResult = Result<(), SetError>;

/// Find the most similar item to `s` in `valid`.
/// If no item is sufficiently similar `None` is returned.
pub fn most_similar<'a, I>(s: &str, valid: I) -> Option<&'a str>
where
    I: Iterator<Item = &'a str>,
{
    let mut closest = "";
    let mut score = 0.0;
    for v in valid {
        let sim = strsim::jaro_winkler(v, s);
        if sim > score {
            closest = v;
            score = sim;
        }
    }
    if score >= 0.8 {
        Some(closest)
    } else {
        None
    }
}

pub trait Document {
    fn section(&mut self, path: &str) -> Result<&mut dyn Section, Error>;

    /// Looks up a field as `section.field`, returning its value as text.
    fn lookup(&self, key: &str) -> Option<String>;

    /// All `section.field` keys.
    fn keys(&self) -> Vec<String>;
}

pub trait Section {
    /// `section_name` is the name for the section defined in the `config` type
    /// to be used for error messages since the section type itself doesn't
    /// otherwise know its name in the config file.
    fn set(&mut self, section_name: &str, field: &str, scanner: &mut Scanner) -> SetResult;

    fn get(&self, field: &str) -> Option<String>;

    fn field_names(&self) -> &'static [&'static str];
}

pub trait Value: Sized {
    fn parse(scanner: &mut Scanner) -> Result<Self, Error>;

    /// The value as plain text, strings without quotes.
    fn to_text(&self) -> String;
}

/// Predicate matching section name characters.
fn is_section_char(c: char) -> bool {
    c.is_alphanumeric() || c == '.' || c == '_' || c == '-'
}

/// Predicate matching value name characters.
fn is_value_char(c: char) -> bool {
    // note: this also matches a leading digit which can never be valid value
    // name as value names are always valid rust identifiers but this doesn't
    // really matter as it will just cause a parsing error.
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parses INI style documents:
///
/// ```ini
/// # comment
/// [section]
/// field = value
/// ```
pub struct Parser {
    path: String,
    source: String,
}

impl Parser {
    pub fn new(path: &Path) -> io::Result<Self> {
        Ok(Self::from_source(
            &path.display().to_string(),
            read_to_string(path)?,
        ))
    }

    /// `path` is only used for error reports.
    pub fn from_source(path: &str, mut source: String) -> Self {
        if !source.ends_with('\n') {
            source.push('\n');
        }
        Self {
            path: path.to_string(),
            source,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn skip_non_content(scanner: &mut Scanner) {
        loop {
            match scanner.peek() {
                Some(space) if is_space(true)(space) => scanner.skip_space(true),
                Some('#') | Some(';') => {
                    scanner.rest_of_line();
                }
                _ => break,
            }
        }
    }

    /// Parses one line of content.
    fn parse_one_line(
        scanner: &mut Scanner,
        section_path: &mut Option<String>,
        doc: &mut dyn Document,
    ) -> Result<bool, Error> {
        Self::skip_non_content(scanner);
        if scanner.is_empty() {
            return Ok(false);
        }
        if scanner.starts_with("[") {
            scanner.next();
            scanner.skip_space(false);
            let section_name = scanner.some(is_section_char);
            scanner.skip_space(false);
            scanner.expect_eq(']')?;
            scanner.skip_space(false);
            let path = if section_name.starts_with('.') {
                let outer = section_path.as_deref().unwrap_or("");
                format!("{outer}{section_name}")
            } else {
                section_name.as_str().to_owned()
            };
            doc.section(path.as_str()).map_err(|mut e| {
                e.line = Some(section_name.location().line);
                if let Some((span, _)) = &mut e.label {
                    *span = section_name.range();
                }
                e
            })?;
            *section_path = Some(path);
        } else {
            let key = scanner.some(is_value_char);
            if key.is_empty() {
                let loc = scanner.location();
                return Err(Error::new_with_line("missing field name", loc.line)
                    .with_label(loc.range(1), "expected field name"));
            }
            scanner.skip_space(false);
            scanner.expect_eq('=').map_err(|e| {
                e.with_why(key.range(), "because the previous token was a field name")
            })?;
            scanner.skip_space(false);
            let section_path = section_path.as_ref().ok_or_else(|| {
                key.as_error(
                    "assignment outside section",
                    "expected section before this assignment",
                )
            })?;
            let section = doc.section(section_path.as_str())?;
            let start = *scanner.location();
            let r = section.set(section_path.as_str(), key.as_str(), scanner);
            let end = *scanner.location();
            if let Err(set_error) = r {
                let real_span = match &set_error {
                    SetError::InvalidKey(_) => key.range(),
                    SetError::InvalidValue(_) => {
                        start.char_offset..end.char_offset.max(start.char_offset + 1)
                    }
                };
                let mut error = set_error.into_inner();
                if let Some((span, _)) = &mut error.label {
                    if *span == (0..0) {
                        *span = real_span;
                    }
                }
                error.line.get_or_insert(key.location().line);
                return Err(error);
            }
            scanner.skip_space(false);
        }
        if matches!(scanner.peek(), Some('#') | Some(';')) {
            scanner.rest_of_line();
        }
        scanner.expect_eq('\n')?;
        Ok(true)
    }

    /// Parses the whole source into `doc`, stopping at the first error.
    pub fn parse(&self, doc: &mut dyn Document) -> Result<(), Error> {
        let mut section_path = None;
        let mut scanner = Scanner::new(&self.source);
        while Self::parse_one_line(&mut scanner, &mut section_path, doc)? {}
        Ok(())
    }

    /// Renders `error` against this parser's source.
    pub fn report(&self, error: &Error) -> String {
        error.render(&self.path, &self.source)
    }
}
