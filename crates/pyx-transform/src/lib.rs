//! View lowering for the pyx compiler.
//!
//! Consumes a resolved module and rewrites every view definition into a
//! class: a constructor assigning declared parameters (plus keyword-only
//! slot parameters), and a `_render` method lowered from the markup
//! body. Composition of one view inside another becomes a constructor
//! call with slot content distributed across keyword arguments.
//!
//! # Architecture
//!
//! [`ModuleTransformer`] drives the pass: it owns the deterministic
//! counter that names synthesized children collections and constructs a
//! fresh [`ViewSession`] (slot table + render-context stack) for every
//! view, so no per-view state survives between views. Lowering appends
//! new nodes to the same AST arena the parser built; transformation
//! errors abort the current file and carry a span.

pub mod context;
pub mod error;
pub mod module;
pub mod rewrite;
pub mod slots;
pub mod view;

pub use context::RenderContexts;
pub use error::TransformError;
pub use module::ModuleTransformer;
pub use slots::{SlotInfo, analyze_slots};
pub use view::{ViewSession, ViewTransformer};

/// Runtime module the lowered output imports from.
pub const RUNTIME_MODULE: [&str; 2] = ["pyx", "runtime"];

/// Runtime support symbols, in import order: base view class, element
/// type, element constructor, escape function, fragment constructor,
/// render-provided-child helper.
pub const RUNTIME_SYMBOLS: [&str; 6] = [
    "BaseView",
    "Element",
    "el",
    "escape",
    "fragment",
    "render_child",
];
