//! The scope model: scopes, bindings and variables.
//!
//! Pure data, no behavior beyond small accessors. All three types live
//! in arenas and reference each other by id; `VariableId` equality is
//! the ground truth for "these two references denote the same binding".

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use serde::Serialize;

use pyx_common::Span;

/// Id of a scope. The module scope is always id 0 and every parent
/// chain terminates there.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ScopeId(pub u32);

/// Id of a variable. Shared by every reference the resolver judges to
/// denote the same variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct VariableId(pub u32);

/// Id of a binding (one name introduced in one scope).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct BindingId(pub u32);

/// What kind of construct introduced a scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ScopeKind {
    Module,
    Function,
    Class,
    View,
    Comprehension,
    Except,
    With,
}

impl ScopeKind {
    /// Function-like scopes participate in closure capture and are
    /// where `nonlocal` is legal.
    #[must_use]
    pub fn is_function_like(self) -> bool {
        matches!(self, ScopeKind::Function | ScopeKind::View)
    }
}

/// Lifecycle state of a variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum VariableState {
    /// Referenced but never bound anywhere; assumed builtin or forward
    /// reference.
    Undefined,
    /// Bound but not yet assigned a value.
    Declared,
    /// Assigned at least once.
    Defined,
    /// Terminal state of the lifecycle vocabulary; the resolver tracks
    /// use through [`VariableFlags::USED`] instead of demoting
    /// `Defined`.
    Used,
}

bitflags! {
    /// Classification and usage flags of a variable.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct VariableFlags: u16 {
        /// Function/view parameter.
        const PARAMETER = 1 << 0;
        /// Declared with `global`.
        const GLOBAL = 1 << 1;
        /// Declared with `nonlocal`.
        const NONLOCAL = 1 << 2;
        /// Bound by an import statement.
        const IMPORTED = 1 << 3;
        /// Parameter of a view definition.
        const VIEW_PARAMETER = 1 << 4;
        /// `except ... as e` handler variable.
        const EXCEPTION_VAR = 1 << 5;
        /// Referenced at least once.
        const USED = 1 << 6;
        /// Accessed from a scope nested below its defining scope.
        const CAPTURED = 1 << 7;
        /// Needs a cell for closure access.
        const CELL = 1 << 8;
    }
}

impl Serialize for VariableFlags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.bits())
    }
}

/// Metadata about one variable.
///
/// Mutated in place as the pass learns more; never deleted.
#[derive(Clone, Debug, Serialize)]
pub struct Variable {
    pub name: String,
    /// Absolute scope depth where defined (module = 0).
    pub definition_depth: u32,
    pub state: VariableState,
    pub flags: VariableFlags,
    /// Where first bound, if anywhere.
    pub first_def_span: Option<Span>,
    /// Where first referenced, if anywhere.
    pub first_use_span: Option<Span>,
    /// First reference preceded the first definition (late-binding
    /// detection; data only, not an error).
    pub used_before_def: bool,
}

impl Variable {
    #[must_use]
    pub fn is_captured(&self) -> bool {
        self.flags.contains(VariableFlags::CAPTURED)
    }

    #[must_use]
    pub fn is_cell(&self) -> bool {
        self.flags.contains(VariableFlags::CELL)
    }

    #[must_use]
    pub fn is_view_parameter(&self) -> bool {
        self.flags.contains(VariableFlags::VIEW_PARAMETER)
    }
}

/// One name introduced in one scope.
#[derive(Clone, Debug, Serialize)]
pub struct Binding {
    pub name: String,
    pub variable: VariableId,
    /// The scope that was active when the binding was created.
    pub scope: ScopeId,
    /// The inner-scope binding that shadows this one, if any.
    /// Diagnostic only, not used during lookup.
    pub shadowed_by: Option<BindingId>,
}

/// A scope in the scope tree.
///
/// Created on entering a scope-introducing construct; after the pass
/// finishes it stays addressable through the resolution table.
#[derive(Clone, Debug, Serialize)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// Absolute depth in the scope tree (module = 0).
    pub depth: u32,
    /// Names bound at this level only.
    pub bindings: FxHashMap<String, BindingId>,
    /// Names declared `global` in this scope.
    pub globals: FxHashMap<String, VariableId>,
    /// Names declared `nonlocal` in this scope.
    pub nonlocals: FxHashMap<String, VariableId>,
    /// Class scopes never participate in LEGB lookup performed from
    /// inside a nested function/view scope.
    pub is_class_scope: bool,
}

impl Scope {
    #[must_use]
    pub fn new(id: ScopeId, kind: ScopeKind, parent: Option<ScopeId>, depth: u32) -> Scope {
        Scope {
            id,
            kind,
            parent,
            depth,
            bindings: FxHashMap::default(),
            globals: FxHashMap::default(),
            nonlocals: FxHashMap::default(),
            is_class_scope: kind == ScopeKind::Class,
        }
    }
}
