//! Common types and utilities for the pyx compiler.
//!
//! This crate provides foundational types used across all pyx crates:
//! - Source spans (`Span`)
//! - Diagnostics collected by the resolver (`Diagnostic`)
//! - Centralized limits and thresholds

pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory};

pub mod limits;

pub mod span;
pub use span::Span;
