//! The resolution table: everything the pass learned, id-keyed.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Serialize, Serializer};

use pyx_ast::{ExprId, StmtId};
use pyx_common::Diagnostic;

use crate::external::ViewSignature;
use crate::scope::{Binding, BindingId, Scope, ScopeId, Variable, VariableId};

/// What a markup element with a capitalized tag resolved to.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum ViewBinding {
    /// A view defined in this module.
    Local(StmtId),
    /// A view imported from another file.
    External(ViewSignature),
}

/// Results of one resolution pass over one module.
///
/// Every field is addressable by value (ids, names, spans) so external
/// debug/JSON/text exporters can dump the table losslessly.
#[derive(Debug, Default, Serialize)]
pub struct ResolutionTable {
    /// Variable arena; `VariableId` indexes here.
    pub variables: Vec<Variable>,
    /// Binding arena; `BindingId` indexes here.
    pub bindings: Vec<Binding>,
    /// Every scope created during the pass; `ScopeId` indexes here and
    /// id 0 is the module scope.
    pub scopes: Vec<Scope>,
    /// Name reference → resolved variable.
    #[serde(serialize_with = "sorted_pairs")]
    pub name_refs: FxHashMap<ExprId, VariableId>,
    /// Name reference → absolute depth of the scope the binding lives
    /// in (module = 0).
    #[serde(serialize_with = "sorted_pairs")]
    pub ref_depths: FxHashMap<ExprId, u32>,
    /// Names needing cells, keyed by name across the whole unit.
    #[serde(serialize_with = "sorted_names")]
    pub cell_vars: FxHashSet<String>,
    /// Free variable names, keyed by name across the whole unit.
    #[serde(serialize_with = "sorted_names")]
    pub free_vars: FxHashSet<String>,
    /// View parameter registry: parameter name → variable.
    pub view_params: FxHashMap<String, VariableId>,
    /// Views defined at module level: view name → definition statement.
    pub views: FxHashMap<String, StmtId>,
    /// Composition correspondence: element statement → the view it
    /// instantiates.
    #[serde(serialize_with = "sorted_pairs")]
    pub view_elements: FxHashMap<StmtId, ViewBinding>,
    /// Collected scope/binding errors. Non-fatal to the pass; their
    /// presence marks the pass as failed.
    pub errors: Vec<Diagnostic>,
}

impl ResolutionTable {
    #[inline]
    #[must_use]
    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.0 as usize]
    }

    #[inline]
    #[must_use]
    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id.0 as usize]
    }

    #[inline]
    #[must_use]
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    /// The variable a name reference resolved to, if it was resolved.
    #[must_use]
    pub fn resolved(&self, name: ExprId) -> Option<&Variable> {
        self.name_refs.get(&name).map(|id| self.variable(*id))
    }

    /// True when the given name reference denotes a view parameter.
    /// This single predicate drives which names the transformer turns
    /// into attribute accesses.
    #[must_use]
    pub fn is_view_parameter(&self, name: ExprId) -> bool {
        self.resolved(name).is_some_and(Variable::is_view_parameter)
    }

    /// The view a composed element is bound to, if any.
    #[must_use]
    pub fn view_for_element(&self, element: StmtId) -> Option<&ViewBinding> {
        self.view_elements.get(&element)
    }

    /// Whether the pass as a whole failed (any error collected).
    #[must_use]
    pub fn failed(&self) -> bool {
        self.errors.iter().any(Diagnostic::is_error)
    }
}

/// Id-keyed maps export as key-sorted pair lists: JSON objects cannot
/// carry integer keys, and sorting keeps dumps diffable.
fn sorted_pairs<K, V, S>(map: &FxHashMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
where
    K: Copy + Ord + Serialize,
    V: Serialize,
    S: Serializer,
{
    let mut entries: Vec<(&K, &V)> = map.iter().collect();
    entries.sort_by_key(|(key, _)| **key);
    serializer.collect_seq(entries)
}

fn sorted_names<S: Serializer>(set: &FxHashSet<String>, serializer: S) -> Result<S::Ok, S::Error> {
    let mut names: Vec<&String> = set.iter().collect();
    names.sort();
    serializer.collect_seq(names)
}
