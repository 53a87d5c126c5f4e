//! Render context stack.
//!
//! During hierarchical lowering, the active render context is the name
//! of the children collection that lowered siblings append into. One
//! stack per view; pushed for the view body and for every element whose
//! content needs hierarchical processing.

use smallvec::SmallVec;

/// Stack of active children-collection names. The top is the collection
/// lowered statements append into; an empty stack means expressions are
/// returned directly instead of appended.
#[derive(Debug, Default)]
pub struct RenderContexts {
    stack: SmallVec<[String; 4]>,
}

impl RenderContexts {
    #[must_use]
    pub fn new() -> RenderContexts {
        RenderContexts::default()
    }

    /// The innermost active collection name, if any.
    #[must_use]
    pub fn active(&self) -> Option<&str> {
        self.stack.last().map(String::as_str)
    }

    pub fn push(&mut self, name: String) {
        self.stack.push(name);
    }

    pub fn pop(&mut self) -> Option<String> {
        self.stack.pop()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

/// Build a fresh collection name from a deterministic per-compilation-
/// unit counter. Output is stable and diffable across runs.
pub(crate) fn fresh_context_name(prefix: &str, counter: &mut u32) -> String {
    let id = *counter;
    *counter += 1;
    // Tag names may contain characters that are not valid in a Python
    // identifier.
    let prefix: String = prefix
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("_{prefix}_children_{id}")
}
