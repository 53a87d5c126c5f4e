//! Arena-allocated typed AST for the pyx compiler.
//!
//! The AST is a pair of closed sum types (`ExprKind`, `StmtKind`) stored
//! in flat arenas inside [`Ast`] and addressed by stable integer ids
//! (`ExprId`, `StmtId`). Passes never hold node references; they key
//! their side tables by id, which keeps resolution results serializable
//! and comparable by value, and every pass dispatches with an exhaustive
//! `match` so a new node kind is a compile error in every pass that
//! forgot it.
//!
//! The external parser produces this AST; the view transformer extends
//! the same arena with synthesized output nodes and the pretty-printer
//! consumes the result. Nodes are never removed from the arena — a
//! transformed module simply points at different statement ids.

pub mod arena;
pub mod node;

pub use arena::{Ast, ExprId, StmtId};
pub use node::*;
