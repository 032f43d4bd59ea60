//! Error types and diagnostics for section-grammar parsing
//!
//! Value decoding, registration and handler failures are plain `thiserror`
//! enums. Everything that happens while a file is being parsed ends up as a
//! [`Diagnostic`] collected into the final [`ParseResult`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Classification of a diagnostic recorded during a parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Malformed token or quote, or an undecodable source line
    Lexical,
    /// A parameter failed to convert or failed enumeration validation
    Type,
    /// Keyword not registered in the current section
    UnknownDirective,
    /// Unmatched brace or excessive nesting; always fatal
    Structural,
    /// Source (or included file) unreadable; always fatal
    Io,
    /// A handler reported a failure
    Handler,
    /// The caller's validation hook rejected the parsed result
    Validation,
}

impl DiagnosticKind {
    /// Returns true if a diagnostic of this kind aborts the parse
    pub fn is_fatal(self) -> bool {
        matches!(self, DiagnosticKind::Structural | DiagnosticKind::Io)
    }

    /// Default severity for this kind
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::Lexical
            | DiagnosticKind::Type
            | DiagnosticKind::UnknownDirective => Severity::Warning,
            DiagnosticKind::Structural
            | DiagnosticKind::Io
            | DiagnosticKind::Handler
            | DiagnosticKind::Validation => Severity::Error,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::Lexical => "lexical error",
            DiagnosticKind::Type => "type error",
            DiagnosticKind::UnknownDirective => "unknown directive",
            DiagnosticKind::Structural => "structural error",
            DiagnosticKind::Io => "I/O error",
            DiagnosticKind::Handler => "handler error",
            DiagnosticKind::Validation => "validation error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

/// One problem found while parsing, with its source location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    /// File the problem was found in (the included file for nested includes)
    pub path: PathBuf,
    /// Line number (1-based, 0 when the problem is not tied to a line)
    pub line: u64,
    /// Section path down to the directive, e.g. `scene::sampler::min_filter`
    pub section: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        path: impl Into<PathBuf>,
        line: u64,
        section: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            path: path.into(),
            line,
            section: section.into(),
            message: message.into(),
        }
    }

    /// Overrides the default severity of the diagnostic kind
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Forwards the diagnostic to the `log` facade
    pub(crate) fn log(&self) {
        match self.severity {
            Severity::Warning => log::warn!("{}", self),
            Severity::Error => log::error!("{}", self),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        };
        write!(
            f,
            "{}, {}:{}: Directive <{}>: {} ({})",
            level,
            self.path.display(),
            self.line,
            self.section,
            self.message,
            self.kind
        )
    }
}

/// Outcome of one parse call
///
/// `success` is false only when the parse hit a fatal problem or the
/// validation hook failed; `diagnostics` may hold warnings either way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics with error severity
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// Diagnostics with warning severity
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    /// Number of diagnostics of the given kind
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.count(kind) > 0
    }
}

/// Failure to decode a single parameter value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    /// The text ended before the value (or one of its components) was read
    #[error("expected a <{expected}> value, found end of line")]
    Missing { expected: &'static str },

    /// Text could not be read as a number of the expected kind
    #[error("invalid <{expected}> value '{text}'")]
    InvalidNumber { text: String, expected: &'static str },

    /// Text could not be read as a boolean
    #[error("invalid <bool> value '{text}', expected true or false")]
    InvalidBool { text: String },

    /// A checked-text token is not a key of the validation table
    #[error("unknown value '{token}', expected one of: {candidates}")]
    UnknownToken { token: String, candidates: String },

    /// A quoted span was opened but never closed
    #[error("unterminated quote in '{text}'")]
    UnterminatedQuote { text: String },

    /// A name parameter decoded to an empty string
    #[error("empty <name> value")]
    EmptyName,

    /// A composite value is missing one of its components
    #[error("<{expected}> needs {count} components, component {index} is invalid: {reason}")]
    Component {
        expected: &'static str,
        index: usize,
        count: usize,
        reason: Box<ValueError>,
    },
}

impl ValueError {
    /// Lexical errors make the whole directive line unusable
    pub fn is_lexical(&self) -> bool {
        match self {
            ValueError::UnterminatedQuote { .. } => true,
            ValueError::Component { reason, .. } => reason.is_lexical(),
            _ => false,
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        if self.is_lexical() {
            DiagnosticKind::Lexical
        } else {
            DiagnosticKind::Type
        }
    }
}

/// Misuse of the registration API; these are programming errors caught at
/// startup, not problems in parsed files
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("parser '{keyword}' for section {section} already exists")]
    DuplicateParser { section: String, keyword: String },

    #[error("discard parser for section {section} already exists")]
    DuplicateDiscard { section: String },

    #[error("section {section} is reserved and cannot hold parsers")]
    ReservedSection { section: String },

    #[error("empty keyword registered in section {section}")]
    EmptyKeyword { section: String },
}

/// Failure reported by a handler or by the validation hook
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Error for a declared parameter the directive did not supply
    pub fn missing_parameter(index: usize, type_name: &str) -> Self {
        Self::new(format!(
            "directive needs a <{}> parameter at position {} that is currently missing",
            type_name,
            index + 1
        ))
    }

    /// Error for a handler that needs an object an ancestor section should
    /// have created
    pub fn missing_object(name: &str) -> Self {
        Self::new(format!("no {} initialised", name))
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Fatal engine error; aborts the parse
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("couldn't read file [{}]: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    Structural { message: String },
}

impl ParserError {
    pub fn structural(message: impl Into<String>) -> Self {
        ParserError::Structural {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        match self {
            ParserError::Io { .. } => DiagnosticKind::Io,
            ParserError::Structural { .. } => DiagnosticKind::Structural,
        }
    }
}
