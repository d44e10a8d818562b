use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::Serialize;
use std::fmt;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum McdocError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parser(#[from] ParserError),
}

impl McdocError {
    #[must_use]
    pub fn code_str(&self) -> &'static str {
        match self {
            McdocError::Lex(e) => e.code_str(),
            McdocError::Parser(e) => e.code_str(),
        }
    }

    #[must_use]
    pub fn span(&self) -> (usize, usize) {
        match self {
            McdocError::Lex(e) => e.span(),
            McdocError::Parser(e) => e.span(),
        }
    }
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum LexError {
    #[error("Unterminated string literal")]
    #[diagnostic(
        code(lexer::unterminated_string),
        help("The string was still open when the file or line ended.")
    )]
    UnterminatedString {
        #[label("String starts here")]
        span: SourceSpan,
    },

    #[error("Invalid escape sequence '\\{escape}'")]
    #[diagnostic(
        code(lexer::invalid_escape),
        help("Valid escapes are \\\\, \\\", \\b, \\f, \\n, \\r and \\t.")
    )]
    InvalidEscape {
        escape: char,
        #[label("Unknown escape")]
        span: SourceSpan,
    },

    #[error("Number '{literal}' does not fit in a {kind}")]
    #[diagnostic(code(lexer::number_out_of_range))]
    NumberOutOfRange {
        literal: String,
        kind: &'static str,
        #[label("Out of range for its suffix")]
        span: SourceSpan,
    },

    #[error("Doc comment does not start its line")]
    #[diagnostic(
        code(lexer::stray_doc_comment),
        help("A `///` comment must be the first token on its line.")
    )]
    StrayDocComment {
        #[label("Doc comment here")]
        span: SourceSpan,
    },
}

impl LexError {
    #[must_use]
    pub fn code_str(&self) -> &'static str {
        match self {
            LexError::UnterminatedString { .. } => "unterminated-string",
            LexError::InvalidEscape { .. } => "invalid-escape",
            LexError::NumberOutOfRange { .. } => "number-out-of-range-for-suffix",
            LexError::StrayDocComment { .. } => "stray-doc-comment",
        }
    }

    #[must_use]
    pub fn span(&self) -> (usize, usize) {
        let span = match self {
            LexError::UnterminatedString { span }
            | LexError::InvalidEscape { span, .. }
            | LexError::NumberOutOfRange { span, .. }
            | LexError::StrayDocComment { span } => span,
        };
        (span.offset(), span.len())
    }
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ParserError {
    #[error("Unexpected token")]
    #[diagnostic(
        code(parser::unexpected_token),
        help("The parser found a token it did not expect in this position.")
    )]
    UnexpectedToken {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expected {expected}, but found this")]
        span: SourceSpan,
        expected: String,
    },

    #[error("Unexpected end of file")]
    #[diagnostic(
        code(parser::unexpected_eof),
        help("The file ended unexpectedly. The parser expected more tokens.")
    )]
    UnexpectedEof {
        #[source_code]
        src: NamedSource<String>,
        #[label("File ended unexpectedly here")]
        span: SourceSpan,
    },

    #[error("Reserved word '{word}' used as an identifier")]
    #[diagnostic(
        code(parser::reserved_word),
        help("Keywords such as `int` or `struct` cannot name a declaration.")
    )]
    ReservedWord {
        #[source_code]
        src: NamedSource<String>,
        #[label("Reserved word")]
        span: SourceSpan,
        word: String,
    },

    #[error("Dynamic index in a dispatch statement")]
    #[diagnostic(
        code(parser::dynamic_index_in_dispatch),
        help("A `dispatch` statement may only register static keys.")
    )]
    DynamicIndexInDispatch {
        #[source_code]
        src: NamedSource<String>,
        #[label("Dynamic index")]
        span: SourceSpan,
    },

    #[error("`%fallback` cannot be registered by a dispatch statement")]
    #[diagnostic(code(parser::fallback_on_dispatch_lhs))]
    FallbackOnDispatchLhs {
        #[source_code]
        src: NamedSource<String>,
        #[label("`%fallback` key")]
        span: SourceSpan,
    },
}

impl ParserError {
    #[must_use]
    pub fn code_str(&self) -> &'static str {
        match self {
            ParserError::UnexpectedToken { .. } => "unexpected-token",
            ParserError::UnexpectedEof { .. } => "unexpected-eof",
            ParserError::ReservedWord { .. } => "reserved-word-as-identifier",
            ParserError::DynamicIndexInDispatch { .. } => "dynamic-index-in-dispatch-statement",
            ParserError::FallbackOnDispatchLhs { .. } => "fallback-on-dispatch-lhs",
        }
    }

    #[must_use]
    pub fn span(&self) -> (usize, usize) {
        let span = match self {
            ParserError::UnexpectedToken { span, .. }
            | ParserError::UnexpectedEof { span, .. }
            | ParserError::ReservedWord { span, .. }
            | ParserError::DynamicIndexInDispatch { span, .. }
            | ParserError::FallbackOnDispatchLhs { span, .. } => span,
        };
        (span.offset(), span.len())
    }
}

// --- Diagnostic records ---
//
// Queries never abort; everything the engine has to say about a project is
// collected as ordered records in a sink shared by the loader and the
// instantiation engine.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticRecord {
    pub severity: Severity,
    pub file: String,
    /// Byte offset and length in the originating file.
    pub span: (usize, usize),
    pub code: String,
    pub message: String,
}

impl DiagnosticRecord {
    #[must_use]
    pub fn error(
        file: impl Into<String>,
        span: (usize, usize),
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        DiagnosticRecord {
            severity: Severity::Error,
            file: file.into(),
            span,
            code: code.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn warning(
        file: impl Into<String>,
        span: (usize, usize),
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        DiagnosticRecord {
            severity: Severity::Warning,
            file: file.into(),
            span,
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DiagnosticRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}[{}]: {}",
            self.file, self.severity, self.code, self.message
        )
    }
}

/// Append-only collection of diagnostic records, shareable across the
/// loader and concurrent instantiation requests.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    records: Mutex<Vec<DiagnosticRecord>>,
}

impl DiagnosticSink {
    #[must_use]
    pub fn new() -> Self {
        DiagnosticSink::default()
    }

    pub fn push(&self, record: DiagnosticRecord) {
        lock_recovering(&self.records).push(record);
    }

    /// The records emitted so far, in emission order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DiagnosticRecord> {
        lock_recovering(&self.records).clone()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        lock_recovering(&self.records)
            .iter()
            .any(|r| r.severity == Severity::Error)
    }
}

// A poisoned lock only means another thread panicked mid-push; the record
// list itself is still usable.
pub(crate) fn lock_recovering<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
