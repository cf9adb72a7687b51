use ariadne::{Config, Label, Report, ReportKind, Source};
use std::ops::{Deref, DerefMut, Range};

// This type is quit big but we don't want to box the `Error` type everywhere
// so we hide the actual data in a boxed value inside the error.
// Elements can still be accessed normally using the deref traits.
#[derive(Default)]
pub struct ErrorInner {
    pub(super) message: String,
    pub(super) line: Option<usize>,
    pub(super) label: Option<(Range<usize>, String)>,
    pub(super) why: Option<(Range<usize>, String)>,
    pub(super) help: Option<String>,
    pub(super) note: Option<String>,
}

/// A config syntax error, located by character spans in the source.
#[derive(Default)]
pub struct Error {
    inner: Box<ErrorInner>,
}

impl Deref for Error {
    type Target = ErrorInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for Error {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl Error {
    pub fn new(message: impl ToString) -> Self {
        Self {
            inner: Box::new(ErrorInner {
                message: message.to_string(),
                ..Default::default()
            }),
        }
    }

    /// Creates a new error on the given zero-based line.
    pub fn new_with_line(message: impl ToString, line: usize) -> Self {
        let mut this = Self::new(message);
        this.line = Some(line);
        this
    }

    pub fn with_label(mut self, span: Range<usize>, message: impl ToString) -> Self {
        self.label = Some((span, message.to_string()));
        self
    }

    pub fn with_why(mut self, span: Range<usize>, message: impl ToString) -> Self {
        self.why = Some((span, message.to_string()));
        self
    }

    pub fn with_help(mut self, help: impl ToString) -> Self {
        self.help = Some(help.to_string());
        self
    }

    pub fn with_note(mut self, note: impl ToString) -> Self {
        self.note = Some(note.to_string());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// One-based line number for messages.
    pub fn line_number(&self) -> Option<usize> {
        self.line.map(|l| l + 1)
    }

    /// Renders the error as a plain text report quoting `source`.
    pub fn render(&self, path: &str, source: &str) -> String {
        let offset = self.label.as_ref().map(|(span, _)| span.start).unwrap_or(0);
        let mut builder = Report::build(ReportKind::Error, path, offset)
            .with_config(Config::default().with_color(false))
            .with_message(&self.message);
        if let Some((span, msg)) = self.label.clone() {
            builder.add_label(Label::new((path, span)).with_message(msg));
        }
        if let Some((span, msg)) = self.why.clone() {
            builder.add_label(Label::new((path, span)).with_message(msg));
        }
        if let Some(msg) = &self.help {
            builder.set_help(msg);
        }
        if let Some(msg) = &self.note {
            builder.set_note(msg);
        }
        let mut buf = Vec::new();
        if builder
            .finish()
            .write((path, Source::from(source)), &mut buf)
            .is_err()
        {
            return self.to_string();
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cfg::Error({})", self.message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line_number() {
            Some(line) => write!(f, "line {line}: {}", self.message)?,
            None => f.write_str(&self.message)?,
        }
        if let Some((_, label)) = &self.label {
            write!(f, " ({label})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

/// Creates an error for value parsers, this does not specify the location of the
/// the error which is set by the main parser if parsing a value fails.
pub fn value_error(message: impl ToString, label: impl ToString) -> Error {
    Error::new(message).with_label(0..0, label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_render() {
        let source = "[controls]\ndebounce_ms = x\n";
        let error = Error::new_with_line("invalid number value", 1)
            .with_label(25..26, "expected digits")
            .with_help("use milliseconds");
        assert_eq!(
            error.to_string(),
            "line 2: invalid number value (expected digits)"
        );
        let report = error.render("config.ini", source);
        assert!(report.contains("invalid number value"));
        assert!(report.contains("expected digits"));
        assert!(report.contains("use milliseconds"));
        assert!(!report.contains('\x1b'));
    }
}
