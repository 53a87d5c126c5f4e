//! Transformation errors.
//!
//! Unlike resolver diagnostics these fail the file's transform
//! immediately: the transformer cannot safely synthesize a substitute
//! node for a malformed composition. Other files in a multi-file build
//! are unaffected.

use thiserror::Error;

use pyx_common::Span;

#[derive(Debug, Error)]
pub enum TransformError {
    /// A capitalized tag that is neither a known HTML convention nor a
    /// resolved view. Lowercase tags are always literal HTML.
    #[error(
        "undefined view component '{tag}'; views must be defined before use \
         (use a lowercase tag for literal HTML)"
    )]
    UnknownComponent { tag: String, span: Span },

    /// A `slot` attribute somewhere other than on a direct child of a
    /// composed view element.
    #[error(
        "slot attribute inside <{found_in}> is not on a direct child of \
         the composed view; slot attributes cannot be nested in elements \
         or control flow"
    )]
    MisplacedSlotAttribute { found_in: String, span: Span },

    /// Slot content addressed to a slot the target view never declares.
    #[error("view '{view}' declares no slot named '{slot}'")]
    UnknownSlot {
        view: String,
        slot: String,
        span: Span,
    },

    /// Children supplied to a view with no matching slot to put them in.
    #[error("view '{view}' does not accept children")]
    UnexpectedChildren { view: String, span: Span },

    /// A compound statement in a position that must lower to a single
    /// expression (e.g. control flow inside a slot's fallback content).
    #[error("compound statement cannot be lowered to a single expression here")]
    UnsupportedStatement { span: Span },

    /// The lowering recursion exceeded the configured depth bound.
    #[error("view body nested deeper than {limit} levels")]
    TooDeep { limit: u32, span: Span },
}

impl TransformError {
    /// The source span the error is anchored to.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            TransformError::UnknownComponent { span, .. }
            | TransformError::MisplacedSlotAttribute { span, .. }
            | TransformError::UnknownSlot { span, .. }
            | TransformError::UnexpectedChildren { span, .. }
            | TransformError::UnsupportedStatement { span }
            | TransformError::TooDeep { span, .. } => *span,
        }
    }
}
