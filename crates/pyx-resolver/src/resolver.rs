//! The single-pass LEGB resolver.
//!
//! Walks a module's statement tree once, maintaining a scope stack and
//! classifying every name reference. Functions, classes and views bind
//! their own name in the enclosing scope at the point the definition is
//! visited — there is no hoisting pass, so a reference to a sibling
//! defined later in the file falls back to an assumed-global
//! placeholder.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::{debug, trace};

use pyx_ast::{
    Ast, Comprehension, ExprId, ExprKind, Module, Parameter, Pattern, StmtId, StmtKind,
};
use pyx_common::limits::MAX_TARGET_DEPTH;
use pyx_common::{Diagnostic, Span};

use crate::external::{ExternalSymbol, SymbolSource, ViewSignature};
use crate::scope::{
    Binding, BindingId, Scope, ScopeId, ScopeKind, Variable, VariableFlags, VariableId,
    VariableState,
};
use crate::table::{ResolutionTable, ViewBinding};

/// Variable resolution for Python-like scoping.
///
/// One instance resolves one module and is consumed by [`Resolver::resolve`];
/// its mutable per-run state (scope stack, arenas, nesting counters) is
/// never shared across files.
pub struct Resolver<'a> {
    ast: &'a Ast,
    symbols: &'a dyn SymbolSource,

    // Scope management
    scopes: Vec<Scope>,
    stack: SmallVec<[ScopeId; 8]>,
    module_globals: FxHashMap<String, VariableId>,

    // Resolution results
    variables: Vec<Variable>,
    bindings: Vec<Binding>,
    name_refs: FxHashMap<ExprId, VariableId>,
    ref_depths: FxHashMap<ExprId, u32>,

    // Closure analysis, keyed by name across the unit
    cell_vars: FxHashSet<String>,
    free_vars: FxHashSet<String>,

    // View composition support
    views: FxHashMap<String, StmtId>,
    imported_views: FxHashMap<String, ViewSignature>,
    view_elements: FxHashMap<StmtId, ViewBinding>,

    errors: Vec<Diagnostic>,

    // Context tracking - counters, since scopes nest
    function_depth: u32,
    class_depth: u32,
    view_depth: u32,
}

impl<'a> Resolver<'a> {
    /// Create a resolver for one module. The module scope (id 0) is
    /// opened immediately.
    pub fn new(ast: &'a Ast, symbols: &'a dyn SymbolSource) -> Resolver<'a> {
        let mut resolver = Resolver {
            ast,
            symbols,
            scopes: Vec::new(),
            stack: SmallVec::new(),
            module_globals: FxHashMap::default(),
            variables: Vec::new(),
            bindings: Vec::new(),
            name_refs: FxHashMap::default(),
            ref_depths: FxHashMap::default(),
            cell_vars: FxHashSet::default(),
            free_vars: FxHashSet::default(),
            views: FxHashMap::default(),
            imported_views: FxHashMap::default(),
            view_elements: FxHashMap::default(),
            errors: Vec::new(),
            function_depth: 0,
            class_depth: 0,
            view_depth: 0,
        };
        resolver.begin_scope(ScopeKind::Module);
        resolver
    }

    /// Resolve the module and produce the resolution table.
    pub fn resolve(mut self, module: &Module) -> ResolutionTable {
        for &stmt in &module.body {
            self.visit_stmt(stmt);
        }

        // View parameter registry, extracted from the variable arena.
        let mut view_params = FxHashMap::default();
        for (index, variable) in self.variables.iter().enumerate() {
            if variable.is_view_parameter() {
                view_params.insert(variable.name.clone(), VariableId(index as u32));
            }
        }

        debug!(
            scopes = self.scopes.len(),
            variables = self.variables.len(),
            errors = self.errors.len(),
            "resolution finished"
        );

        ResolutionTable {
            variables: self.variables,
            bindings: self.bindings,
            scopes: self.scopes,
            name_refs: self.name_refs,
            ref_depths: self.ref_depths,
            cell_vars: self.cell_vars,
            free_vars: self.free_vars,
            view_params,
            views: self.views,
            view_elements: self.view_elements,
            errors: self.errors,
        }
    }

    // =========================================================================
    // Scope management
    // =========================================================================

    fn begin_scope(&mut self, kind: ScopeKind) {
        let id = ScopeId(self.scopes.len() as u32);
        let parent = self.stack.last().copied();
        let depth = self.stack.len() as u32;
        self.scopes.push(Scope::new(id, kind, parent, depth));
        self.stack.push(id);

        match kind {
            ScopeKind::Function => self.function_depth += 1,
            ScopeKind::Class => self.class_depth += 1,
            ScopeKind::View => self.view_depth += 1,
            _ => {}
        }
        trace!(
            ?kind,
            id = id.0,
            depth,
            functions = self.function_depth,
            classes = self.class_depth,
            views = self.view_depth,
            "begin scope"
        );
    }

    fn end_scope(&mut self) {
        if let Some(id) = self.stack.pop() {
            match self.scopes[id.0 as usize].kind {
                ScopeKind::Function => self.function_depth -= 1,
                ScopeKind::Class => self.class_depth -= 1,
                ScopeKind::View => self.view_depth -= 1,
                _ => {}
            }
            trace!(id = id.0, "end scope");
        }
    }

    #[inline]
    fn current(&self) -> ScopeId {
        *self.stack.last().expect("scope stack is never empty")
    }

    #[inline]
    fn current_depth(&self) -> u32 {
        self.stack.len() as u32 - 1
    }

    /// True when the current position is inside any function-like scope
    /// (function or view). Affects capture marking and the class-scope
    /// skip.
    fn in_function_scope(&self) -> bool {
        self.function_depth > 0 || self.view_depth > 0
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.errors.push(Diagnostic::error(message, span));
    }

    // =========================================================================
    // Variables and bindings
    // =========================================================================

    /// Create a new variable and its binding in the current scope.
    /// Records the shadow relationship on the nearest enclosing binding
    /// of the same name (diagnostic only).
    fn define_variable(&mut self, name: &str, span: Span) -> VariableId {
        let var_id = VariableId(self.variables.len() as u32);
        self.variables.push(Variable {
            name: name.to_string(),
            definition_depth: self.current_depth(),
            state: VariableState::Declared,
            flags: VariableFlags::empty(),
            first_def_span: Some(span),
            first_use_span: None,
            used_before_def: false,
        });

        let binding_id = BindingId(self.bindings.len() as u32);
        let current = self.current();
        self.bindings.push(Binding {
            name: name.to_string(),
            variable: var_id,
            scope: current,
            shadowed_by: None,
        });

        // Shadow tracking: the nearest enclosing binding of the same
        // name learns which inner binding shadows it.
        for &scope_id in self.stack.iter().rev().skip(1) {
            if let Some(&outer) = self.scopes[scope_id.0 as usize].bindings.get(name) {
                let slot = &mut self.bindings[outer.0 as usize].shadowed_by;
                if slot.is_none() {
                    *slot = Some(binding_id);
                }
                break;
            }
        }

        let scope = &mut self.scopes[current.0 as usize];
        scope.bindings.insert(name.to_string(), binding_id);
        if scope.kind == ScopeKind::Module {
            self.module_globals.insert(name.to_string(), var_id);
        }

        trace!(name, var = var_id.0, scope = current.0, "define variable");
        var_id
    }

    fn mark_used(&mut self, var: VariableId, span: Span) {
        let variable = &mut self.variables[var.0 as usize];
        variable.flags |= VariableFlags::USED;
        if variable.first_use_span.is_none() {
            variable.first_use_span = Some(span);
            if variable.first_def_span.is_none() {
                variable.used_before_def = true;
            }
        }
    }

    fn mark_captured(&mut self, var: VariableId) {
        let variable = &mut self.variables[var.0 as usize];
        variable.flags |= VariableFlags::CAPTURED | VariableFlags::CELL;
        let name = variable.name.clone();
        self.cell_vars.insert(name.clone());
        self.free_vars.insert(name);
    }

    fn record(&mut self, reference: ExprId, var: VariableId, depth: u32) {
        self.name_refs.insert(reference, var);
        self.ref_depths.insert(reference, depth);
    }

    // =========================================================================
    // Name resolution (LEGB)
    // =========================================================================

    /// Resolve a name reference: global/nonlocal declarations first,
    /// then Local -> Enclosing (skipping class scopes from inside
    /// function-like scopes) -> Global -> assumed builtin.
    fn resolve_name(&mut self, reference: ExprId, name: &str, span: Span) {
        let current = self.current();

        // Declared `global` in the current scope: bind to the module
        // variable, depth 0.
        if let Some(&var) = self.scopes[current.0 as usize].globals.get(name) {
            self.mark_used(var, span);
            self.record(reference, var, 0);
            return;
        }

        // Declared `nonlocal` in the current scope: bind to the
        // enclosing variable it was declared against.
        if let Some(&var) = self.scopes[current.0 as usize].nonlocals.get(name) {
            self.mark_used(var, span);
            self.mark_captured(var);
            let depth = self.enclosing_binding_depth(name, var);
            self.record(reference, var, depth);
            return;
        }

        // Local scope.
        if let Some(&binding) = self.scopes[current.0 as usize].bindings.get(name) {
            let var = self.bindings[binding.0 as usize].variable;
            self.mark_used(var, span);
            let depth = self.current_depth();
            self.record(reference, var, depth);
            return;
        }

        // Enclosing scopes, innermost first, module excluded. Class
        // scopes don't participate when resolving from inside a
        // function-like scope.
        for index in (1..self.stack.len().saturating_sub(1)).rev() {
            let scope_id = self.stack[index];
            let scope = &self.scopes[scope_id.0 as usize];
            if scope.is_class_scope && self.in_function_scope() {
                continue;
            }
            if let Some(&binding) = scope.bindings.get(name) {
                let var = self.bindings[binding.0 as usize].variable;
                self.mark_used(var, span);
                if self.in_function_scope() {
                    self.mark_captured(var);
                }
                self.record(reference, var, index as u32);
                return;
            }
        }

        // Module globals.
        if let Some(&var) = self.module_globals.get(name) {
            self.mark_used(var, span);
            self.record(reference, var, 0);
            return;
        }

        // Unknown: assumed builtin or forward reference, not an error.
        // Create a placeholder module-level variable.
        trace!(name, "unresolved name, assuming global");
        let var_id = VariableId(self.variables.len() as u32);
        self.variables.push(Variable {
            name: name.to_string(),
            definition_depth: 0,
            state: VariableState::Undefined,
            flags: VariableFlags::USED,
            first_def_span: None,
            first_use_span: Some(span),
            used_before_def: true,
        });
        self.module_globals.insert(name.to_string(), var_id);
        self.record(reference, var_id, 0);
    }

    /// Absolute depth of the scope whose binding maps `name` to `var`.
    fn enclosing_binding_depth(&self, name: &str, var: VariableId) -> u32 {
        for index in (0..self.stack.len().saturating_sub(1)).rev() {
            let scope = &self.scopes[self.stack[index].0 as usize];
            if let Some(&binding) = scope.bindings.get(name)
                && self.bindings[binding.0 as usize].variable == var
            {
                return index as u32;
            }
        }
        0
    }

    // =========================================================================
    // Assignment targets
    // =========================================================================

    /// Recursively destructure an assignment target. Bare names honor
    /// `global`/`nonlocal` before binding in the current scope;
    /// attribute/subscript targets only resolve their object side.
    fn analyze_assignment_target(&mut self, target: ExprId, depth: u32) {
        let ast = self.ast;
        let span = ast.expr_span(target);
        if depth > MAX_TARGET_DEPTH {
            self.error("assignment target nested too deeply", span);
            return;
        }
        match &ast.expr(target).kind {
            ExprKind::Name(name) => self.bind_target_name(target, name, span),
            ExprKind::Tuple(elements) | ExprKind::List(elements) => {
                for &element in elements {
                    self.analyze_assignment_target(element, depth + 1);
                }
            }
            ExprKind::Starred(inner) => self.analyze_assignment_target(*inner, depth + 1),
            ExprKind::Attribute { object, .. } => self.visit_expr(*object),
            ExprKind::Subscript { object, indices } => {
                self.visit_expr(*object);
                for &index in indices {
                    self.visit_expr(index);
                }
            }
            _ => self.error("invalid assignment target", span),
        }
    }

    /// Bind (or rebind) a bare-name target in the current scope,
    /// transitioning the variable to `Defined`.
    fn bind_target_name(&mut self, reference: ExprId, name: &str, span: Span) {
        let current = self.current();

        if let Some(&var) = self.scopes[current.0 as usize].globals.get(name) {
            self.define_existing(var, span);
            self.record(reference, var, 0);
            return;
        }

        if let Some(&var) = self.scopes[current.0 as usize].nonlocals.get(name) {
            self.define_existing(var, span);
            let depth = self.enclosing_binding_depth(name, var);
            self.record(reference, var, depth);
            return;
        }

        let var = match self.scopes[current.0 as usize].bindings.get(name) {
            Some(&binding) => {
                let var = self.bindings[binding.0 as usize].variable;
                self.define_existing(var, span);
                var
            }
            None => {
                let var = self.define_variable(name, span);
                self.variables[var.0 as usize].state = VariableState::Defined;
                var
            }
        };
        let depth = self.current_depth();
        self.record(reference, var, depth);
    }

    fn define_existing(&mut self, var: VariableId, span: Span) {
        let variable = &mut self.variables[var.0 as usize];
        variable.state = VariableState::Defined;
        if variable.first_def_span.is_none() {
            variable.first_def_span = Some(span);
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn visit_body(&mut self, body: &[StmtId]) {
        for &stmt in body {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, id: StmtId) {
        let ast = self.ast;
        let span = ast.stmt_span(id);
        match &ast.stmt(id).kind {
            StmtKind::Expr(expr) => self.visit_expr(*expr),
            StmtKind::Assign { targets, value } => {
                // Value first (right-hand side), then targets.
                self.visit_expr(*value);
                for &target in targets {
                    self.analyze_assignment_target(target, 0);
                }
            }
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.visit_expr(*value);
                }
            }
            StmtKind::Pass | StmtKind::Break | StmtKind::Continue => {}
            StmtKind::Global(names) => self.visit_global(names, span),
            StmtKind::Nonlocal(names) => self.visit_nonlocal(names, span),
            StmtKind::Import(aliases) => {
                for alias in aliases {
                    // `import a.b` binds `a`; `import a.b as c` binds `c`.
                    let bound = alias
                        .alias
                        .clone()
                        .or_else(|| alias.name.first().cloned())
                        .unwrap_or_default();
                    let var = self.define_variable(&bound, alias.span);
                    let variable = &mut self.variables[var.0 as usize];
                    variable.flags |= VariableFlags::IMPORTED;
                    variable.state = VariableState::Defined;
                }
            }
            StmtKind::ImportFrom { module, names, .. } => {
                let module_path = module.join(".");
                for alias in names {
                    let original = alias.name.last().cloned().unwrap_or_default();
                    let bound = alias.alias.clone().unwrap_or_else(|| original.clone());
                    let var = self.define_variable(&bound, alias.span);
                    let variable = &mut self.variables[var.0 as usize];
                    variable.flags |= VariableFlags::IMPORTED;
                    variable.state = VariableState::Defined;

                    // Views imported from other files participate in
                    // element binding through their signature.
                    if let Some(ExternalSymbol::View(signature)) =
                        self.symbols.lookup(&module_path, &original)
                    {
                        debug!(view = %bound, module = %module_path, "imported view");
                        self.imported_views.insert(bound, signature);
                    }
                }
            }
            StmtKind::Raise { exc, cause } => {
                if let Some(exc) = exc {
                    self.visit_expr(*exc);
                }
                if let Some(cause) = cause {
                    self.visit_expr(*cause);
                }
            }
            StmtKind::Assert { test, message } => {
                self.visit_expr(*test);
                if let Some(message) = message {
                    self.visit_expr(*message);
                }
            }
            StmtKind::If {
                condition,
                body,
                orelse,
            } => {
                self.visit_expr(*condition);
                self.visit_body(body);
                self.visit_body(orelse);
            }
            StmtKind::While {
                condition,
                body,
                orelse,
            } => {
                self.visit_expr(*condition);
                self.visit_body(body);
                self.visit_body(orelse);
            }
            StmtKind::For {
                target,
                iter,
                body,
                orelse,
                ..
            } => {
                // Iterable first; the target introduces bindings.
                self.visit_expr(*iter);
                self.analyze_assignment_target(*target, 0);
                self.visit_body(body);
                self.visit_body(orelse);
            }
            StmtKind::With { items, body, .. } => {
                for item in items {
                    self.visit_expr(item.context);
                    if let Some(target) = item.target {
                        self.analyze_assignment_target(target, 0);
                    }
                }
                self.visit_body(body);
            }
            StmtKind::Try {
                body,
                handlers,
                orelse,
                finally,
            } => {
                self.visit_body(body);
                for handler in handlers {
                    if let Some(ty) = handler.ty {
                        self.visit_expr(ty);
                    }
                    match handler.name {
                        Some(name_expr) => {
                            // `except E as e:` scopes the handler
                            // variable to the handler body.
                            self.begin_scope(ScopeKind::Except);
                            if let Some(name) = ast.name_text(name_expr).map(str::to_string) {
                                let name_span = ast.expr_span(name_expr);
                                let var = self.define_variable(&name, name_span);
                                let variable = &mut self.variables[var.0 as usize];
                                variable.flags |= VariableFlags::EXCEPTION_VAR;
                                variable.state = VariableState::Defined;
                                let depth = self.current_depth();
                                self.record(name_expr, var, depth);
                            }
                            self.visit_body(&handler.body);
                            self.end_scope();
                        }
                        None => self.visit_body(&handler.body),
                    }
                }
                self.visit_body(orelse);
                self.visit_body(finally);
            }
            StmtKind::Match { subject, cases } => {
                self.visit_expr(*subject);
                for case in cases {
                    self.bind_pattern(&case.pattern);
                    if let Some(guard) = case.guard {
                        self.visit_expr(guard);
                    }
                    self.visit_body(&case.body);
                }
            }
            StmtKind::FunctionDef(def) => {
                self.bind_definition_name(def.name);
                self.visit_parameter_annotations(&def.params);
                if let Some(returns) = def.returns {
                    self.visit_expr(returns);
                }
                self.begin_scope(ScopeKind::Function);
                self.bind_parameters(&def.params, false);
                self.visit_body(&def.body);
                self.end_scope();
            }
            StmtKind::ViewDef(def) => {
                self.bind_definition_name(def.name);
                if let Some(name) = ast.name_text(def.name) {
                    self.views.insert(name.to_string(), id);
                }
                self.visit_parameter_annotations(&def.params);
                self.begin_scope(ScopeKind::View);
                self.bind_parameters(&def.params, true);
                self.visit_body(&def.body);
                self.end_scope();
            }
            StmtKind::ClassDef(def) => {
                self.bind_definition_name(def.name);
                for base in &def.bases {
                    self.visit_expr(base.value);
                }
                self.begin_scope(ScopeKind::Class);
                self.visit_body(&def.body);
                self.end_scope();
            }
            StmtKind::Element(element) => {
                // Capitalized tags name view components; lowercase tags
                // are always literal HTML. Unresolved capitalized tags
                // stay unbound and become a transform error.
                let capitalized = element
                    .tag
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_uppercase());
                if capitalized {
                    if let Some(&view) = self.views.get(&element.tag) {
                        self.view_elements.insert(id, ViewBinding::Local(view));
                    } else if let Some(signature) = self.imported_views.get(&element.tag) {
                        self.view_elements
                            .insert(id, ViewBinding::External(signature.clone()));
                    }
                }
                for attribute in &element.attributes {
                    if let Some(value) = attribute.value {
                        self.visit_expr(value);
                    }
                }
                self.visit_body(&element.children);
            }
            StmtKind::Text(text) => {
                for part in &text.parts {
                    if let pyx_ast::TextPart::Interpolation { value, .. } = part {
                        self.visit_expr(*value);
                    }
                }
            }
        }
    }

    /// Bind a function/class/view name in the enclosing scope at the
    /// point the definition is visited.
    fn bind_definition_name(&mut self, name_expr: ExprId) {
        let ast = self.ast;
        if let Some(name) = ast.name_text(name_expr).map(str::to_string) {
            let span = ast.expr_span(name_expr);
            let var = self.define_variable(&name, span);
            self.variables[var.0 as usize].state = VariableState::Defined;
            let depth = self.current_depth();
            self.record(name_expr, var, depth);
        }
    }

    /// Annotations and defaults evaluate in the enclosing scope, before
    /// the definition's own scope opens.
    fn visit_parameter_annotations(&mut self, params: &[Parameter]) {
        for param in params {
            if let Some(annotation) = param.annotation {
                self.visit_expr(annotation);
            }
            if let Some(default) = param.default {
                self.visit_expr(default);
            }
        }
    }

    /// Bind parameters inside the freshly opened scope.
    fn bind_parameters(&mut self, params: &[Parameter], view: bool) {
        let ast = self.ast;
        for param in params {
            let Some(name_expr) = param.name else { continue };
            let Some(name) = ast.name_text(name_expr).map(str::to_string) else {
                continue;
            };
            let span = ast.expr_span(name_expr);
            let var = self.define_variable(&name, span);
            let variable = &mut self.variables[var.0 as usize];
            variable.flags |= VariableFlags::PARAMETER;
            if view {
                variable.flags |= VariableFlags::VIEW_PARAMETER;
            }
            variable.state = VariableState::Defined;
            let depth = self.current_depth();
            self.record(name_expr, var, depth);
        }
    }

    fn visit_global(&mut self, names: &[ExprId], span: Span) {
        let ast = self.ast;
        let current = self.current();
        if self.scopes[current.0 as usize].kind == ScopeKind::Module {
            self.error("'global' declaration at module level", span);
            return;
        }
        for &name_expr in names {
            let Some(name) = ast.name_text(name_expr).map(str::to_string) else {
                continue;
            };
            let name_span = ast.expr_span(name_expr);
            let var = match self.module_globals.get(&name) {
                Some(&var) => {
                    self.variables[var.0 as usize].flags |= VariableFlags::GLOBAL;
                    var
                }
                None => {
                    let var = VariableId(self.variables.len() as u32);
                    self.variables.push(Variable {
                        name: name.clone(),
                        definition_depth: 0,
                        state: VariableState::Declared,
                        flags: VariableFlags::GLOBAL,
                        first_def_span: Some(name_span),
                        first_use_span: None,
                        used_before_def: false,
                    });
                    self.module_globals.insert(name.clone(), var);
                    var
                }
            };
            let current = self.current().0 as usize;
            self.scopes[current]
                .globals
                .insert(name, var);
        }
    }

    fn visit_nonlocal(&mut self, names: &[ExprId], span: Span) {
        let ast = self.ast;
        let current_kind = self.scopes[self.current().0 as usize].kind;
        if !current_kind.is_function_like() {
            self.error("'nonlocal' declaration not in function scope", span);
            return;
        }
        for &name_expr in names {
            let Some(name) = ast.name_text(name_expr).map(str::to_string) else {
                continue;
            };
            // Search enclosing non-module scopes, innermost out. No
            // binding means an error and no variable is fabricated.
            let mut found = None;
            for index in (1..self.stack.len().saturating_sub(1)).rev() {
                let scope = &self.scopes[self.stack[index].0 as usize];
                if let Some(&binding) = scope.bindings.get(&name) {
                    found = Some(self.bindings[binding.0 as usize].variable);
                    break;
                }
            }
            match found {
                Some(var) => {
                    let variable = &mut self.variables[var.0 as usize];
                    variable.flags |= VariableFlags::CAPTURED | VariableFlags::NONLOCAL;
                    let current = self.current().0 as usize;
                    self.scopes[current]
                        .nonlocals
                        .insert(name, var);
                }
                None => {
                    let name_span = ast.expr_span(name_expr);
                    self.error(format!("no binding for nonlocal '{name}' found"), name_span);
                }
            }
        }
    }

    fn bind_pattern(&mut self, pattern: &Pattern) {
        let ast = self.ast;
        match pattern {
            Pattern::Value(expr) => self.visit_expr(*expr),
            Pattern::Capture(name_expr) => {
                if let Some(name) = ast.name_text(*name_expr).map(str::to_string) {
                    let span = ast.expr_span(*name_expr);
                    self.bind_target_name(*name_expr, &name, span);
                }
            }
            Pattern::Wildcard(_) => {}
            Pattern::Sequence(patterns) | Pattern::Or(patterns) => {
                for pattern in patterns {
                    self.bind_pattern(pattern);
                }
            }
            Pattern::Star(name) => {
                if let Some(name_expr) = name
                    && let Some(name) = ast.name_text(*name_expr).map(str::to_string)
                {
                    let span = ast.expr_span(*name_expr);
                    self.bind_target_name(*name_expr, &name, span);
                }
            }
            Pattern::Mapping {
                keys,
                patterns,
                rest,
            } => {
                for &key in keys {
                    self.visit_expr(key);
                }
                for pattern in patterns {
                    self.bind_pattern(pattern);
                }
                if let Some(rest_expr) = rest
                    && let Some(name) = ast.name_text(*rest_expr).map(str::to_string)
                {
                    let span = ast.expr_span(*rest_expr);
                    self.bind_target_name(*rest_expr, &name, span);
                }
            }
            Pattern::Class {
                cls,
                patterns,
                kwargs,
            } => {
                self.visit_expr(*cls);
                for pattern in patterns {
                    self.bind_pattern(pattern);
                }
                for (_, pattern) in kwargs {
                    self.bind_pattern(pattern);
                }
            }
            Pattern::As { pattern, name } => {
                if let Some(inner) = pattern {
                    self.bind_pattern(inner);
                }
                if let Some(text) = ast.name_text(*name).map(str::to_string) {
                    let span = ast.expr_span(*name);
                    self.bind_target_name(*name, &text, span);
                }
            }
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn visit_expr(&mut self, id: ExprId) {
        let ast = self.ast;
        let span = ast.expr_span(id);
        match &ast.expr(id).kind {
            ExprKind::Name(name) => self.resolve_name(id, name, span),
            ExprKind::Literal(_) => {}
            ExprKind::FString(parts) => {
                for part in parts {
                    if let pyx_ast::FStringPart::Expr(expr) = part {
                        self.visit_expr(*expr);
                    }
                }
            }
            // Only the object side of `x.attr` is a reference.
            ExprKind::Attribute { object, .. } => self.visit_expr(*object),
            ExprKind::Call { callee, args } => {
                self.visit_expr(*callee);
                for arg in args {
                    self.visit_expr(arg.value);
                }
            }
            ExprKind::Subscript { object, indices } => {
                self.visit_expr(*object);
                for &index in indices {
                    self.visit_expr(index);
                }
            }
            ExprKind::Binary { left, right, .. } => {
                self.visit_expr(*left);
                self.visit_expr(*right);
            }
            ExprKind::Unary { operand, .. } => self.visit_expr(*operand),
            ExprKind::Ternary {
                condition,
                if_true,
                if_false,
            } => {
                self.visit_expr(*condition);
                self.visit_expr(*if_true);
                self.visit_expr(*if_false);
            }
            ExprKind::List(elements) | ExprKind::Tuple(elements) | ExprKind::Set(elements) => {
                for &element in elements {
                    self.visit_expr(element);
                }
            }
            ExprKind::Dict(items) => {
                for item in items {
                    match item {
                        pyx_ast::DictItem::KeyValue { key, value } => {
                            self.visit_expr(*key);
                            self.visit_expr(*value);
                        }
                        pyx_ast::DictItem::Spread(expr) => self.visit_expr(*expr),
                    }
                }
            }
            ExprKind::Starred(inner) => self.visit_expr(*inner),
            ExprKind::Lambda { params, body } => {
                self.visit_parameter_annotations(params);
                self.begin_scope(ScopeKind::Function);
                self.bind_parameters(params, false);
                self.visit_expr(*body);
                self.end_scope();
            }
            ExprKind::ListComp {
                element,
                generators,
            }
            | ExprKind::SetComp {
                element,
                generators,
            }
            | ExprKind::Generator {
                element,
                generators,
            } => {
                let element = *element;
                self.visit_comprehension(generators, |resolver| resolver.visit_expr(element));
            }
            ExprKind::DictComp {
                key,
                value,
                generators,
            } => {
                let (key, value) = (*key, *value);
                self.visit_comprehension(generators, |resolver| {
                    resolver.visit_expr(key);
                    resolver.visit_expr(value);
                });
            }
            ExprKind::Await(inner) => self.visit_expr(*inner),
        }
    }

    /// Comprehensions get their own scope. The outermost iterable is
    /// evaluated in the enclosing scope (Python evaluation order);
    /// targets bind inside the comprehension scope.
    fn visit_comprehension(
        &mut self,
        generators: &[Comprehension],
        element: impl FnOnce(&mut Self),
    ) {
        let Some(first) = generators.first() else {
            return;
        };
        self.visit_expr(first.iter);
        self.begin_scope(ScopeKind::Comprehension);
        self.analyze_assignment_target(first.target, 0);
        for &condition in &first.conditions {
            self.visit_expr(condition);
        }
        for generator in &generators[1..] {
            self.visit_expr(generator.iter);
            self.analyze_assignment_target(generator.target, 0);
            for &condition in &generator.conditions {
                self.visit_expr(condition);
            }
        }
        element(self);
        self.end_scope();
    }
}
