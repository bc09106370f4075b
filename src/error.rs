//! Template check errors and their diagnostics

use std::fmt;

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in a run's text
pub type Span = std::ops::Range<usize>;

/// Numeric outcome codes of a template check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckCode {
    Success = 1,
    NameRepeat = -1,
    LabelFormatError = -2,
    NameEmpty = -3,
}

impl CheckCode {
    pub fn value(self) -> i32 {
        self as i32
    }

    pub fn is_error(self) -> bool {
        self.value() < 0
    }
}

impl fmt::Display for CheckCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckCode::Success => "SUCCESS",
            CheckCode::NameRepeat => "NAME_REPEAT",
            CheckCode::LabelFormatError => "LABEL_FORMAT_ERROR",
            CheckCode::NameEmpty => "NAME_EMPTY",
        };
        write!(f, "{} ({})", name, self.value())
    }
}

/// Structural template errors; any of them aborts the whole scan
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("label '{token}' is malformed, expected '{{{{label_type:label_name}}}}' (label_name may be empty, the ':' may not be omitted)")]
    LabelFormat {
        token: String,
        run_text: String,
        span: Span,
    },

    #[error("insertion point name '{name}' is repeated in the template, label '{token}', run text '{run_text}'")]
    NameRepeat {
        name: String,
        token: String,
        run_text: String,
        span: Span,
    },

    #[error("insertion point name is empty, label '{token}', run text '{run_text}'")]
    NameEmpty {
        token: String,
        run_text: String,
        span: Span,
    },
}

impl CheckError {
    pub fn code(&self) -> CheckCode {
        match self {
            CheckError::LabelFormat { .. } => CheckCode::LabelFormatError,
            CheckError::NameRepeat { .. } => CheckCode::NameRepeat,
            CheckError::NameEmpty { .. } => CheckCode::NameEmpty,
        }
    }

    /// The offending label token
    pub fn token(&self) -> &str {
        match self {
            CheckError::LabelFormat { token, .. }
            | CheckError::NameRepeat { token, .. }
            | CheckError::NameEmpty { token, .. } => token,
        }
    }

    /// Text of the run holding the token
    pub fn run_text(&self) -> &str {
        match self {
            CheckError::LabelFormat { run_text, .. }
            | CheckError::NameRepeat { run_text, .. }
            | CheckError::NameEmpty { run_text, .. } => run_text,
        }
    }

    /// Position of the token in the run text
    pub fn span(&self) -> &Span {
        match self {
            CheckError::LabelFormat { span, .. }
            | CheckError::NameRepeat { span, .. }
            | CheckError::NameEmpty { span, .. } => span,
        }
    }

    fn hint(&self) -> &'static str {
        match self {
            CheckError::LabelFormat { .. } => "expected exactly one ':' between type and name",
            CheckError::NameRepeat { .. } => "this name is already used by another label",
            CheckError::NameEmpty { .. } => "content labels need a name",
        }
    }

    /// Format the error with the run text as source context using ariadne
    pub fn format(&self, filename: &str) -> String {
        let source = self.run_text();
        let span = char_span(source, self.span());
        let mut buf = Vec::new();

        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_code(self.code().value())
            .with_message(self.to_string())
            .with_label(
                Label::new((filename, span))
                    .with_message(self.hint())
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

/// Convert a byte span into the char span ariadne expects
fn char_span(text: &str, span: &Span) -> Span {
    let clamp = |byte: usize| byte.min(text.len());
    let to_char = |byte: usize| {
        text.char_indices()
            .take_while(|(i, _)| *i < clamp(byte))
            .count()
    };
    to_char(span.start)..to_char(span.end)
}
