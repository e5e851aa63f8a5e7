pub mod ansi;
pub mod json;
pub mod registry;
pub mod source_map;

pub use source_map::SourceMap;

use crate::heap::HeapError;
use crate::lexer::{LexError, Span};
use crate::reader::ReadError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<&'static str>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub suggestion: Option<String>,
    pub source: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Error, message.into())
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Warning, message.into())
    }

    fn new(severity: Severity, message: String) -> Self {
        Diagnostic {
            severity,
            code: None,
            message,
            labels: Vec::new(),
            notes: Vec::new(),
            suggestion: None,
            source: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_span(mut self, span: Span, label: impl Into<String>) -> Self {
        self.labels.push(Label { span, message: label.into() });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

// ---- From impls for the error types ----

impl From<&LexError> for Diagnostic {
    fn from(e: &LexError) -> Self {
        let span = Span {
            start: e.position,
            end: e.position + e.snippet.len().max(1),
        };
        let mut d = Diagnostic::error(format!("unexpected input '{}'", e.snippet))
            .with_code(e.code())
            .with_span(span, "here");
        if !e.suggestion.is_empty() {
            d = d.with_suggestion(e.suggestion.clone());
        }
        d
    }
}

impl From<&HeapError> for Diagnostic {
    fn from(e: &HeapError) -> Self {
        let d = Diagnostic::error(e.to_string()).with_code(e.code());
        match e {
            HeapError::OutOfMemory { .. } => {
                d.with_suggestion("raise the arena size with --heap-size")
            }
            _ => d,
        }
    }
}

impl From<&ReadError> for Diagnostic {
    fn from(e: &ReadError) -> Self {
        match e {
            ReadError::Lex(lex) => Diagnostic::from(lex),
            ReadError::Heap(heap) => Diagnostic::from(heap),
            ReadError::FixnumOutOfRange { span, .. } => Diagnostic::error(e.to_string())
                .with_code(e.code())
                .with_span(*span, "out of range")
                .with_note(format!(
                    "fixnums range from {} to {}",
                    crate::value::FIXNUM_MIN,
                    crate::value::FIXNUM_MAX
                )),
            ReadError::MissingDelimiter { span, .. } => Diagnostic::error(e.to_string())
                .with_code(e.code())
                .with_span(*span, "expected whitespace, ';' or end of input")
                .with_suggestion("separate datums with whitespace"),
            _ => {
                let d = Diagnostic::error(e.to_string()).with_code(e.code());
                match e.span() {
                    Some(span) => d.with_span(span, "here"),
                    None => d,
                }
            }
        }
    }
}
