//! Diagnostic types collected during resolution.
//!
//! Resolver diagnostics are data, not control flow: the pass records them
//! and keeps walking, and the presence of any error marks the pass as
//! failed (the transformer, by contrast, fails fast with its own error
//! type).

use serde::Serialize;

use crate::span::Span;

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Warning,
    Error,
}

/// A diagnostic message anchored to a source span.
#[derive(Clone, Debug, Serialize)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    #[must_use]
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            category: DiagnosticCategory::Error,
            message: message.into(),
            span,
        }
    }

    /// Create a new warning diagnostic.
    #[must_use]
    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            category: DiagnosticCategory::Warning,
            message: message.into(),
            span,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}
