//! LEGB scope resolution for the pyx compiler.
//!
//! A single pass over a parsed module that assigns every name reference
//! to a unique variable, tracks closures and class-scope isolation, and
//! produces a [`ResolutionTable`] the view transformer consumes.
//!
//! # Architecture
//!
//! The resolver walks the statement tree once, maintaining a stack of
//! scopes. Scopes, bindings and variables live in arenas inside the
//! resolver and are moved into the table at the end; identity is id
//! equality (`VariableId`), never pointer equality. Scope/binding errors
//! are collected as diagnostics and do not abort the walk — the pass as
//! a whole counts as failed when any error was recorded, but the table
//! is still complete enough for best-effort downstream output.

pub mod external;
pub mod resolver;
pub mod scope;
pub mod table;

pub use external::{ExternalSymbol, NullSymbolSource, SymbolSource, ViewSignature};
pub use resolver::Resolver;
pub use scope::{
    Binding, BindingId, Scope, ScopeId, ScopeKind, Variable, VariableFlags, VariableId,
    VariableState,
};
pub use table::{ResolutionTable, ViewBinding};
