//! Centralized limits and thresholds.

/// Maximum nesting depth the view transformer will lower before giving
/// up on a file. Recursion depth is the only bound on pathological
/// inputs; deeply nested control flow inside view bodies would otherwise
/// exhaust the call stack.
pub const MAX_LOWER_DEPTH: u32 = 500;

/// Maximum nesting depth for assignment-target destructuring
/// (`(a, (b, (c, ...)))`).
pub const MAX_TARGET_DEPTH: u32 = 100;
