//! Cross-file symbol lookup.
//!
//! The resolver performs no file I/O. When a from-import names a symbol
//! defined in another file, the orchestrator-supplied [`SymbolSource`]
//! answers what that symbol is; for views it returns enough of a
//! signature that composition can be lowered without the foreign AST.

use serde::Serialize;

/// What a composed element needs to know about a view defined in
/// another file: its declared parameters and its slots.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViewSignature {
    pub name: String,
    /// Declared parameter names, in order.
    pub params: Vec<String>,
    /// Slot names in first-seen source order; the empty string is the
    /// default slot.
    pub slots: Vec<String>,
}

impl ViewSignature {
    #[must_use]
    pub fn has_default_slot(&self) -> bool {
        self.slots.iter().any(|s| s.is_empty())
    }

    #[must_use]
    pub fn has_slot(&self, name: &str) -> bool {
        self.slots.iter().any(|s| s == name)
    }
}

/// An externally defined symbol, as reported by the orchestrator.
#[derive(Clone, Debug, PartialEq)]
pub enum ExternalSymbol {
    /// A view definition; carries the signature composition needs.
    View(ViewSignature),
    /// Any other exported value (function, constant, class).
    Value,
}

/// Orchestrator callback for resolving symbols exported by other files.
pub trait SymbolSource {
    /// Look up `name` as exported by `module` (a dotted module path).
    fn lookup(&self, module: &str, name: &str) -> Option<ExternalSymbol>;
}

/// A source that knows no external symbols. Single-file resolution.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSymbolSource;

impl SymbolSource for NullSymbolSource {
    fn lookup(&self, _module: &str, _name: &str) -> Option<ExternalSymbol> {
        None
    }
}
