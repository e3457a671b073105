//! ASDL Error Handling - Unified Encapsulated API
//!
//! Every failure in the crate is an [`AsdlError`]: a classified [`ErrorKind`]
//! plus optional source information (for errors that point into grammar text)
//! and diagnostic metadata for `miette` rendering.

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// SOURCE CONTEXT - Error reporting infrastructure
// ============================================================================

/// Named text an error can point into, usually a grammar description.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Context for text handed in by value with no file behind it.
    pub fn inline(content: impl Into<String>) -> Self {
        Self::from_file("<grammar>", content)
    }

    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

/// The single error type of the crate.
#[derive(Debug)]
pub struct AsdlError {
    /// What went wrong
    pub kind: ErrorKind,
    /// Where it happened, when the error points into source text
    pub source_info: Option<SourceInfo>,
    /// How to help
    pub diagnostic_info: DiagnosticInfo,
}

/// Every failure mode, grouped by the stage that raises it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    // Grammar loading
    #[error("grammar syntax error: {message}")]
    GrammarSyntax { message: String },
    #[error("grammar syntax error: duplicate constructor '{constructor}'")]
    DuplicateConstructor { constructor: String },
    #[error("grammar syntax error: constructor '{constructor}' references undeclared type '{type_name}'")]
    UndeclaredType {
        type_name: String,
        constructor: String,
    },
    #[error("grammar syntax error: field '{field}' has conflicting cardinality marker '{marker}'")]
    CardinalityConflict { field: String, marker: String },

    // Lookups and conversion
    #[error("unknown constructor '{constructor}'")]
    UnknownConstructor { constructor: String },
    #[error("unknown type '{type_name}'")]
    UnknownType { type_name: String },
    #[error("cannot extract field '{field}' from '{constructor}' node")]
    FieldExtraction { constructor: String, field: String },
    #[error("cannot coerce '{value}' to primitive type '{type_name}'")]
    PrimitiveCoercion { value: String, type_name: String },

    // Transition system
    #[error("grammar violation: {message}")]
    GrammarViolation { message: String },

    // Ambient
    #[error("configuration error: {message}")]
    Config { message: String },
    #[error("cannot read '{path}': {message}")]
    Io { path: String, message: String },
}

/// Context-specific source information
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub source: Arc<NamedSource<String>>,
    pub primary_span: SourceSpan,
}

/// Diagnostic enhancement data
#[derive(Debug, Clone)]
pub struct DiagnosticInfo {
    pub help: Option<String>,
    pub error_code: String,
}

/// Coarse classification matching the error taxonomy callers handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    GrammarSyntax,
    UnknownConstructor,
    FieldExtraction,
    PrimitiveCoercion,
    GrammarViolation,
    Config,
    Io,
}

impl ErrorKind {
    /// Get the error category for test assertions
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::GrammarSyntax { .. }
            | Self::DuplicateConstructor { .. }
            | Self::UndeclaredType { .. }
            | Self::CardinalityConflict { .. } => ErrorCategory::GrammarSyntax,

            Self::UnknownConstructor { .. } | Self::UnknownType { .. } => {
                ErrorCategory::UnknownConstructor
            }
            Self::FieldExtraction { .. } => ErrorCategory::FieldExtraction,
            Self::PrimitiveCoercion { .. } => ErrorCategory::PrimitiveCoercion,
            Self::GrammarViolation { .. } => ErrorCategory::GrammarViolation,
            Self::Config { .. } => ErrorCategory::Config,
            Self::Io { .. } => ErrorCategory::Io,
        }
    }

    /// Error code suffix for diagnostic codes
    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::GrammarSyntax { .. } => "grammar::syntax",
            Self::DuplicateConstructor { .. } => "grammar::duplicate_constructor",
            Self::UndeclaredType { .. } => "grammar::undeclared_type",
            Self::CardinalityConflict { .. } => "grammar::cardinality_conflict",
            Self::UnknownConstructor { .. } => "unknown_constructor",
            Self::UnknownType { .. } => "unknown_type",
            Self::FieldExtraction { .. } => "convert::field_extraction",
            Self::PrimitiveCoercion { .. } => "convert::primitive_coercion",
            Self::GrammarViolation { .. } => "transition::grammar_violation",
            Self::Config { .. } => "config",
            Self::Io { .. } => "io",
        }
    }

    fn primary_label(&self) -> &'static str {
        match self {
            Self::GrammarSyntax { .. } => "syntax error here",
            Self::DuplicateConstructor { .. } => "constructor already declared",
            Self::UndeclaredType { .. } => "undeclared type",
            Self::CardinalityConflict { .. } => "conflicting cardinality",
            _ => "here",
        }
    }
}

// ============================================================================
// CONSTRUCTORS
// ============================================================================

impl AsdlError {
    /// Error with no source location.
    pub fn new(kind: ErrorKind) -> Self {
        let error_code = format!("asdl::{}", kind.code_suffix());
        Self {
            kind,
            source_info: None,
            diagnostic_info: DiagnosticInfo {
                help: None,
                error_code,
            },
        }
    }

    /// Error pointing at `span` inside `source`.
    pub fn spanned(kind: ErrorKind, source: &SourceContext, span: SourceSpan) -> Self {
        let mut error = Self::new(kind);
        error.source_info = Some(SourceInfo {
            source: source.to_named_source(),
            primary_span: span,
        });
        error
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.diagnostic_info.help = Some(help.into());
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    pub fn grammar_syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::GrammarSyntax {
            message: message.into(),
        })
    }

    pub fn unknown_constructor(constructor: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownConstructor {
            constructor: constructor.into(),
        })
    }

    pub fn field_extraction(constructor: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(ErrorKind::FieldExtraction {
            constructor: constructor.into(),
            field: field.into(),
        })
        .with_help("the front end and the grammar disagree on this constructor's fields")
    }

    pub fn primitive_coercion(value: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(ErrorKind::PrimitiveCoercion {
            value: value.into(),
            type_name: type_name.into(),
        })
    }

    pub fn violation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::GrammarViolation {
            message: message.into(),
        })
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config {
            message: message.into(),
        })
    }

    pub fn io(path: impl Into<String>, error: &std::io::Error) -> Self {
        Self::new(ErrorKind::Io {
            path: path.into(),
            message: error.to_string(),
        })
    }
}

// ============================================================================
// TRAIT IMPLEMENTATIONS
// ============================================================================

impl std::error::Error for AsdlError {}

impl fmt::Display for AsdlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl Diagnostic for AsdlError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.diagnostic_info.error_code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diagnostic_info
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let info = self.source_info.as_ref()?;
        let labels = vec![LabeledSpan::new_with_span(
            Some(self.kind.primary_label().to_string()),
            info.primary_span,
        )];
        Some(Box::new(labels.into_iter()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.source_info
            .as_ref()
            .map(|info| &*info.source as &dyn miette::SourceCode)
    }
}

// ============================================================================
// ERROR FORMATTING UTILITIES
// ============================================================================

/// Prints an AsdlError with full miette diagnostics
pub fn print_error(error: AsdlError) {
    use miette::Report;
    let report = Report::new(error);
    eprintln!("{report:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_kind() {
        let err = AsdlError::unknown_constructor("Foo");
        assert_eq!(err.diagnostic_info.error_code, "asdl::unknown_constructor");
        assert_eq!(err.category(), ErrorCategory::UnknownConstructor);
        assert_eq!(err.to_string(), "unknown constructor 'Foo'");
    }

    #[test]
    fn test_spanned_error_has_label() {
        let src = SourceContext::inline("Expr = Num(int value");
        let err = AsdlError::spanned(
            ErrorKind::GrammarSyntax {
                message: "unbalanced field list".into(),
            },
            &src,
            (20..20).into(),
        );
        assert!(err.labels().is_some());
        assert!(err.source_code().is_some());
        assert_eq!(err.category(), ErrorCategory::GrammarSyntax);
    }
}
