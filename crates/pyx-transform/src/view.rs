//! View-to-class lowering.
//!
//! One [`ViewTransformer`] lowers one view definition using a fresh
//! [`ViewSession`]. The body is lowered in one of three regimes:
//!
//! - empty body: `return fragment([])`
//! - exactly one markup root with no control flow anywhere below it:
//!   a single return expression, no intermediate collection
//! - otherwise: one fresh children collection per active nesting level,
//!   every lowered child appended into the innermost one, and a
//!   `fragment` over the outermost returned at the end
//!
//! Elements bound to a view definition become constructor calls with
//! their children distributed across the target's slots; literal tags
//! become `el(...)` calls; text runs become literals, escape calls or
//! one f-string.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::debug;

use pyx_ast::{
    Argument, Ast, ClassDef, Element, ExprId, ExprKind, FStringPart, FunctionDef, LiteralValue,
    ParamKind, Parameter, StmtId, StmtKind, TextPart, ViewDef,
};
use pyx_common::Span;
use pyx_common::limits::MAX_LOWER_DEPTH;
use pyx_resolver::{ResolutionTable, ViewBinding};

use crate::context::{RenderContexts, fresh_context_name};
use crate::error::TransformError;
use crate::rewrite::{rewrite_expr, rewrite_stmt};
use crate::slots::{
    SlotInfo, analyze_slots, element_slot_target, find_nested_slot_attribute, slot_name,
};

/// Per-view transform state: the slot table and the render-context
/// stack. Constructed fresh for every view by the caller and never
/// shared across views.
pub struct ViewSession {
    pub slots: IndexMap<String, SlotInfo>,
    pub contexts: RenderContexts,
    depth: u32,
}

impl ViewSession {
    /// Run the slot discovery pre-pass over the view body and start
    /// with an empty context stack.
    #[must_use]
    pub fn new(ast: &Ast, body: &[StmtId]) -> ViewSession {
        ViewSession {
            slots: analyze_slots(ast, body),
            contexts: RenderContexts::new(),
            depth: 0,
        }
    }
}

/// Lowers one view definition to a class.
pub struct ViewTransformer<'a> {
    ast: &'a mut Ast,
    table: &'a ResolutionTable,
    session: ViewSession,
    /// Deterministic per-compilation-unit counter for children
    /// collection names, owned by the module transform.
    counter: &'a mut u32,
    /// View bindings for element copies created while stripping `slot`
    /// attributes; consulted after the resolution table.
    extra_bindings: FxHashMap<StmtId, ViewBinding>,
}

impl<'a> ViewTransformer<'a> {
    pub fn new(
        ast: &'a mut Ast,
        table: &'a ResolutionTable,
        session: ViewSession,
        counter: &'a mut u32,
    ) -> ViewTransformer<'a> {
        ViewTransformer {
            ast,
            table,
            session,
            counter,
            extra_bindings: FxHashMap::default(),
        }
    }

    /// Lower a view definition into a class extending `BaseView`, with
    /// a constructor and a `_render` method.
    pub fn transform_view_to_class(
        &mut self,
        def: &ViewDef,
        span: Span,
    ) -> Result<StmtId, TransformError> {
        let name = self
            .ast
            .name_text(def.name)
            .unwrap_or_default()
            .to_string();
        debug!(view = %name, slots = self.session.slots.len(), "lowering view");

        let init = self.create_init_method(def, span);
        let render = self.create_render_method(def, span)?;

        let name_span = self.ast.expr_span(def.name);
        let class_name = self.ast.name(name, name_span);
        let base = self.ast.name("BaseView", Span::DUMMY);
        let base_arg = Argument {
            name: None,
            value: base,
            span: Span::DUMMY,
        };
        Ok(self.ast.class_def(
            ClassDef {
                name: class_name,
                bases: vec![base_arg],
                body: vec![init, render],
            },
            span,
        ))
    }

    // =========================================================================
    // Constructor
    // =========================================================================

    /// `__init__`: declared view parameters as-is, then — when the view
    /// has slots — a bare `*` marker followed by keyword-only slot
    /// parameters: `children` for the default slot first, named slots
    /// in first-seen source order, all defaulting to `None`. The body
    /// assigns each parameter to an instance attribute.
    fn create_init_method(&mut self, def: &ViewDef, span: Span) -> StmtId {
        let declared: Vec<String> = def
            .params
            .iter()
            .filter_map(|param| {
                let name = param.name?;
                Some(self.ast.name_text(name)?.to_string())
            })
            .collect();

        let mut params = vec![self.ast.param("self", Span::DUMMY)];
        for param in &def.params {
            if param.name.is_some() {
                params.push(param.clone());
            }
        }

        let slot_params = self.slot_parameter_names();
        if !self.session.slots.is_empty() {
            params.push(Parameter {
                name: None,
                annotation: None,
                default: None,
                kind: ParamKind::Star,
                span: Span::DUMMY,
            });
            for slot_param in &slot_params {
                let name = self.ast.name(slot_param.clone(), Span::DUMMY);
                let default = self.ast.none_lit(Span::DUMMY);
                params.push(Parameter {
                    name: Some(name),
                    annotation: None,
                    default: Some(default),
                    kind: ParamKind::Normal,
                    span: Span::DUMMY,
                });
            }
        }

        // super().__init__()
        let super_name = self.ast.name("super", Span::DUMMY);
        let super_call = self.ast.call(super_name, vec![], Span::DUMMY);
        let init_attr = self.ast.attribute(super_call, "__init__", Span::DUMMY);
        let init_call = self.ast.call(init_attr, vec![], Span::DUMMY);
        let mut body = vec![self.ast.expr_stmt(init_call)];

        for text in &declared {
            body.push(self.self_assignment(text));
        }
        for slot_param in &slot_params {
            body.push(self.self_assignment(slot_param));
        }

        let init_name = self.ast.name("__init__", Span::DUMMY);
        self.ast.function_def(
            FunctionDef {
                name: init_name,
                params,
                returns: None,
                body,
                is_async: false,
            },
            span,
        )
    }

    /// Constructor parameter names for the view's slots: `children`
    /// first when a default slot exists, then named slots in first-seen
    /// order.
    fn slot_parameter_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        if self.session.slots.contains_key("") {
            names.push("children".to_string());
        }
        for name in self.session.slots.keys() {
            if !name.is_empty() {
                names.push(name.clone());
            }
        }
        names
    }

    /// `self.<name> = <name>`
    fn self_assignment(&mut self, name: &str) -> StmtId {
        let receiver = self.ast.name("self", Span::DUMMY);
        let target = self.ast.attribute(receiver, name, Span::DUMMY);
        let value = self.ast.name(name, Span::DUMMY);
        self.ast.assign(target, value, Span::DUMMY)
    }

    // =========================================================================
    // Render method
    // =========================================================================

    fn create_render_method(&mut self, def: &ViewDef, span: Span) -> Result<StmtId, TransformError> {
        let body = self.transform_view_body(&def.body)?;
        let params = vec![self.ast.param("self", Span::DUMMY)];
        let returns = self.ast.name("Element", Span::DUMMY);
        let render_name = self.ast.name("_render", Span::DUMMY);
        Ok(self.ast.function_def(
            FunctionDef {
                name: render_name,
                params,
                returns: Some(returns),
                body,
                is_async: false,
            },
            span,
        ))
    }

    /// Lower the view body under one of the three regimes.
    fn transform_view_body(&mut self, body: &[StmtId]) -> Result<Vec<StmtId>, TransformError> {
        if body.is_empty() {
            let elements = self.ast.list(vec![], Span::DUMMY);
            let fragment = self.fragment_call(elements);
            return Ok(vec![self.ast.return_stmt(Some(fragment), Span::DUMMY)]);
        }

        let single_markup = body.len() == 1 && self.ast.stmt(body[0]).kind.is_markup();
        if single_markup && !self.contains_control_flow(body) {
            // Fast path: one markup root, flat output. The root lowers
            // to an expression statement (plus any slot-content
            // prelude); return its value.
            let mut stmts = self.process_view_statement(body[0])?;
            self.return_trailing_expr(&mut stmts);
            return Ok(stmts);
        }

        // Hierarchical: everything appends into a fresh view-level
        // collection and the render method returns a fragment over it.
        let context = fresh_context_name("view", self.counter);
        let empty = self.ast.list(vec![], Span::DUMMY);
        let context_target = self.ast.name(context.clone(), Span::DUMMY);
        let mut stmts = vec![self.ast.assign(context_target, empty, Span::DUMMY)];

        self.session.contexts.push(context.clone());
        for &stmt in body {
            match self.process_view_statement(stmt) {
                Ok(lowered) => stmts.extend(lowered),
                Err(error) => {
                    self.session.contexts.pop();
                    return Err(error);
                }
            }
        }
        self.session.contexts.pop();

        let context_ref = self.ast.name(context, Span::DUMMY);
        let fragment = self.fragment_call(context_ref);
        stmts.push(self.ast.return_stmt(Some(fragment), Span::DUMMY));
        Ok(stmts)
    }

    /// Replace a trailing expression statement with a return of its
    /// value.
    fn return_trailing_expr(&mut self, stmts: &mut [StmtId]) {
        if let Some(last) = stmts.last_mut()
            && let StmtKind::Expr(expr) = self.ast.stmt(*last).kind
        {
            let span = self.ast.stmt_span(*last);
            *last = self.ast.return_stmt(Some(expr), span);
        }
    }

    // =========================================================================
    // Statement dispatch
    // =========================================================================

    /// Lower one statement of a view body (or of an active collection's
    /// content) into output statements.
    fn process_view_statement(&mut self, id: StmtId) -> Result<Vec<StmtId>, TransformError> {
        self.session.depth += 1;
        if self.session.depth > MAX_LOWER_DEPTH {
            self.session.depth -= 1;
            return Err(TransformError::TooDeep {
                limit: MAX_LOWER_DEPTH,
                span: self.ast.stmt_span(id),
            });
        }
        let result = self.process_view_statement_inner(id);
        self.session.depth -= 1;
        result
    }

    fn process_view_statement_inner(&mut self, id: StmtId) -> Result<Vec<StmtId>, TransformError> {
        let kind = self.ast.stmt(id).kind.clone();
        match kind {
            StmtKind::Element(element) if element.tag == "slot" => {
                let expr = self.slot_placeholder_expr(&element, self.ast.stmt_span(id))?;
                Ok(vec![self.emit(expr)])
            }
            StmtKind::Element(element) => self.process_element(id, &element),
            StmtKind::Text(text) => {
                let expr = self.transform_text_parts(&text.parts, self.ast.stmt_span(id));
                Ok(vec![self.emit(expr)])
            }
            StmtKind::For {
                target,
                iter,
                body,
                orelse,
                is_async,
            } => {
                let span = self.ast.stmt_span(id);
                // The iterable is rewritten; the target introduces
                // bindings and stays untouched.
                let iter = rewrite_expr(self.ast, self.table, iter);
                let body = self.process_block(&body)?;
                let orelse = self.process_block(&orelse)?;
                Ok(vec![self.ast.add_stmt(
                    StmtKind::For {
                        target,
                        iter,
                        body,
                        orelse,
                        is_async,
                    },
                    span,
                )])
            }
            StmtKind::If {
                condition,
                body,
                orelse,
            } => {
                let span = self.ast.stmt_span(id);
                let condition = rewrite_expr(self.ast, self.table, condition);
                let body = self.process_block(&body)?;
                let orelse = self.process_block(&orelse)?;
                Ok(vec![self.ast.add_stmt(
                    StmtKind::If {
                        condition,
                        body,
                        orelse,
                    },
                    span,
                )])
            }
            StmtKind::While {
                condition,
                body,
                orelse,
            } => {
                let span = self.ast.stmt_span(id);
                let condition = rewrite_expr(self.ast, self.table, condition);
                let body = self.process_block(&body)?;
                let orelse = self.process_block(&orelse)?;
                Ok(vec![self.ast.add_stmt(
                    StmtKind::While {
                        condition,
                        body,
                        orelse,
                    },
                    span,
                )])
            }
            StmtKind::Try {
                body,
                mut handlers,
                orelse,
                finally,
            } => {
                let span = self.ast.stmt_span(id);
                let body = self.process_block(&body)?;
                for handler in &mut handlers {
                    if let Some(ty) = handler.ty {
                        handler.ty = Some(rewrite_expr(self.ast, self.table, ty));
                    }
                    handler.body = self.process_block(&handler.body.clone())?;
                }
                let orelse = self.process_block(&orelse)?;
                let finally = self.process_block(&finally)?;
                Ok(vec![self.ast.add_stmt(
                    StmtKind::Try {
                        body,
                        handlers,
                        orelse,
                        finally,
                    },
                    span,
                )])
            }
            StmtKind::Match { subject, mut cases } => {
                let span = self.ast.stmt_span(id);
                let subject = rewrite_expr(self.ast, self.table, subject);
                for case in &mut cases {
                    if let Some(guard) = case.guard {
                        case.guard = Some(rewrite_expr(self.ast, self.table, guard));
                    }
                    case.body = self.process_block(&case.body.clone())?;
                }
                Ok(vec![
                    self.ast.add_stmt(StmtKind::Match { subject, cases }, span),
                ])
            }
            StmtKind::With {
                mut items,
                body,
                is_async,
            } => {
                let span = self.ast.stmt_span(id);
                for item in &mut items {
                    item.context = rewrite_expr(self.ast, self.table, item.context);
                }
                let body = self.process_block(&body)?;
                Ok(vec![self.ast.add_stmt(
                    StmtKind::With {
                        items,
                        body,
                        is_async,
                    },
                    span,
                )])
            }
            // A bare return in hierarchical mode returns the fragment
            // built so far.
            StmtKind::Return(None) => match self.session.contexts.active() {
                Some(context) => {
                    let span = self.ast.stmt_span(id);
                    let context_ref = self.ast.name(context.to_string(), span);
                    let fragment = self.fragment_call(context_ref);
                    Ok(vec![self.ast.return_stmt(Some(fragment), span)])
                }
                None => Ok(vec![id]),
            },
            // Everything else passes through the parameter rewrite with
            // its shape preserved.
            _ => Ok(vec![rewrite_stmt(self.ast, self.table, id)]),
        }
    }

    /// Lower a control-flow body through the same active render context
    /// so conditionally produced elements land in the right collection.
    fn process_block(&mut self, body: &[StmtId]) -> Result<Vec<StmtId>, TransformError> {
        let mut out = Vec::with_capacity(body.len());
        for &stmt in body {
            out.extend(self.process_view_statement(stmt)?);
        }
        Ok(out)
    }

    /// Append an expression into the active collection, or emit it as
    /// an expression statement when no context is active.
    fn emit(&mut self, expr: ExprId) -> StmtId {
        match self.session.contexts.active() {
            Some(context) => {
                let context = context.to_string();
                self.append_stmt(&context, expr)
            }
            None => self.ast.expr_stmt(expr),
        }
    }

    // =========================================================================
    // Elements
    // =========================================================================

    fn process_element(
        &mut self,
        id: StmtId,
        element: &Element,
    ) -> Result<Vec<StmtId>, TransformError> {
        if let Some(binding) = self.element_binding(id) {
            let (mut stmts, call) = self.compose_view(id, element, &binding)?;
            stmts.push(self.emit(call));
            return Ok(stmts);
        }

        if is_pascal_case(&element.tag) {
            return Err(TransformError::UnknownComponent {
                tag: element.tag.clone(),
                span: element.tag_span,
            });
        }

        if self.content_needs_statements(&element.children) {
            return self.transform_element_with_statements(element);
        }

        let expr = self.transform_element_expr(element)?;
        Ok(vec![self.emit(expr)])
    }

    /// Expression-mode lowering of a literal element with simple
    /// content: one `el(tag, content[, attrs])` call.
    fn transform_element_expr(&mut self, element: &Element) -> Result<ExprId, TransformError> {
        let attrs = self.transform_attributes(&element.attributes)?;
        let content = if element.children.is_empty() {
            self.ast.str_lit("", Span::DUMMY)
        } else {
            self.transform_content(&element.children)?
        };
        Ok(self.el_call(&element.tag, element.tag_span, content, attrs))
    }

    /// Statement-mode lowering of a literal element whose content needs
    /// hierarchical processing: a nested render context collects the
    /// children, exactly like a view body.
    fn transform_element_with_statements(
        &mut self,
        element: &Element,
    ) -> Result<Vec<StmtId>, TransformError> {
        let attrs = self.transform_attributes(&element.attributes)?;

        let context = fresh_context_name(&element.tag, self.counter);
        let empty = self.ast.list(vec![], Span::DUMMY);
        let context_target = self.ast.name(context.clone(), Span::DUMMY);
        let mut stmts = vec![self.ast.assign(context_target, empty, Span::DUMMY)];

        self.session.contexts.push(context.clone());
        for &child in &element.children {
            match self.process_view_statement(child) {
                Ok(lowered) => stmts.extend(lowered),
                Err(error) => {
                    self.session.contexts.pop();
                    return Err(error);
                }
            }
        }
        self.session.contexts.pop();

        let content = self.ast.name(context, Span::DUMMY);
        let call = self.el_call(&element.tag, element.tag_span, content, attrs);
        stmts.push(self.emit(call));
        Ok(stmts)
    }

    /// Attributes lower to a dict literal: valueless attributes become
    /// `True`, static string literals pass through unescaped, every
    /// other value is wrapped in an escape call.
    fn transform_attributes(
        &mut self,
        attributes: &[pyx_ast::HtmlAttribute],
    ) -> Result<Option<ExprId>, TransformError> {
        if attributes.is_empty() {
            return Ok(None);
        }
        let mut items = Vec::with_capacity(attributes.len());
        for attribute in attributes {
            let key = self.ast.str_lit(attribute.name.clone(), attribute.name_span);
            let value = match attribute.value {
                None => self.ast.bool_lit(true, attribute.span),
                Some(value) => {
                    let is_static_string = matches!(
                        &self.ast.expr(value).kind,
                        ExprKind::Literal(LiteralValue::Str(_))
                    );
                    let rewritten = rewrite_expr(self.ast, self.table, value);
                    if is_static_string {
                        rewritten
                    } else {
                        self.escape_call(rewritten)
                    }
                }
            };
            items.push(pyx_ast::DictItem::KeyValue { key, value });
        }
        Ok(Some(self.ast.dict(items, Span::DUMMY)))
    }

    // =========================================================================
    // Content (expression mode)
    // =========================================================================

    /// Lower element content to one expression: a single item directly,
    /// several items as a list.
    fn transform_content(&mut self, content: &[StmtId]) -> Result<ExprId, TransformError> {
        match content {
            [] => Ok(self.ast.str_lit("", Span::DUMMY)),
            [only] => self.transform_content_item(*only),
            _ => {
                let mut elements = Vec::with_capacity(content.len());
                for &item in content {
                    elements.push(self.transform_content_item(item)?);
                }
                Ok(self.ast.list(elements, Span::DUMMY))
            }
        }
    }

    fn transform_content_item(&mut self, id: StmtId) -> Result<ExprId, TransformError> {
        let kind = self.ast.stmt(id).kind.clone();
        match kind {
            StmtKind::Element(element) if element.tag == "slot" => {
                self.slot_placeholder_expr(&element, self.ast.stmt_span(id))
            }
            StmtKind::Element(element) => {
                if let Some(binding) = self.element_binding(id) {
                    // Expression-mode content normally has no control
                    // flow below it; a composition that still needs
                    // hoisted statements (control flow inside a slot
                    // fallback) cannot be a single expression.
                    let (prelude, call) = self.compose_view(id, &element, &binding)?;
                    if !prelude.is_empty() {
                        return Err(TransformError::UnsupportedStatement {
                            span: self.ast.stmt_span(id),
                        });
                    }
                    return Ok(call);
                }
                if is_pascal_case(&element.tag) {
                    return Err(TransformError::UnknownComponent {
                        tag: element.tag.clone(),
                        span: element.tag_span,
                    });
                }
                self.transform_element_expr(&element)
            }
            StmtKind::Text(text) => {
                Ok(self.transform_text_parts(&text.parts, self.ast.stmt_span(id)))
            }
            // A bare expression used as content is escaped like an
            // interpolation.
            StmtKind::Expr(expr) => {
                let rewritten = rewrite_expr(self.ast, self.table, expr);
                Ok(self.escape_call(rewritten))
            }
            // Slot fallback content reaches here unconditionally, so
            // control flow inside a fallback is reported rather than
            // silently dropped.
            _ => Err(TransformError::UnsupportedStatement {
                span: self.ast.stmt_span(id),
            }),
        }
    }

    /// Literal text and interpolations: a single part lowers directly,
    /// two or more parts build one f-string.
    fn transform_text_parts(&mut self, parts: &[TextPart], span: Span) -> ExprId {
        match parts {
            [] => self.ast.str_lit("", span),
            [TextPart::Text { value, span }] => self.ast.str_lit(value.clone(), *span),
            [TextPart::Interpolation { value, span }] => {
                let rewritten = rewrite_expr(self.ast, self.table, *value);
                self.escape_call_at(rewritten, *span)
            }
            _ => {
                let mut fstring_parts = Vec::with_capacity(parts.len());
                for part in parts {
                    match part {
                        TextPart::Text { value, .. } => {
                            fstring_parts.push(FStringPart::Text(value.clone()));
                        }
                        TextPart::Interpolation { value, span } => {
                            let rewritten = rewrite_expr(self.ast, self.table, *value);
                            let escaped = self.escape_call_at(rewritten, *span);
                            fstring_parts.push(FStringPart::Expr(escaped));
                        }
                    }
                }
                self.ast.fstring(fstring_parts, span)
            }
        }
    }

    // =========================================================================
    // Slots
    // =========================================================================

    /// A `<slot>` placeholder in the view's own body:
    /// `render_child(self.x) if self.x is not None else <fallback>`.
    fn slot_placeholder_expr(
        &mut self,
        element: &Element,
        span: Span,
    ) -> Result<ExprId, TransformError> {
        let name = slot_name(self.ast, element);
        let attr = if name.is_empty() {
            "children"
        } else {
            name.as_str()
        };

        let receiver = self.ast.name("self", span);
        let slot_attr = self.ast.attribute(receiver, attr, span);
        let none = self.ast.none_lit(span);
        let condition = self
            .ast
            .binary(slot_attr, pyx_ast::BinOp::IsNot, none, span);

        let provided_receiver = self.ast.name("self", span);
        let provided_attr = self.ast.attribute(provided_receiver, attr, span);
        let render_child = self.ast.name("render_child", span);
        let provided_arg = self.ast.arg(provided_attr);
        let provided = self.ast.call(render_child, vec![provided_arg], span);

        let fallback = if element.children.is_empty() {
            self.ast.str_lit("", span)
        } else {
            self.transform_content(&element.children)?
        };

        Ok(self.ast.ternary(condition, provided, fallback, span))
    }

    // =========================================================================
    // Composition
    // =========================================================================

    /// The view a composed element instantiates: the resolution table's
    /// correspondence, extended with bindings for stripped copies.
    fn element_binding(&self, id: StmtId) -> Option<ViewBinding> {
        self.extra_bindings
            .get(&id)
            .cloned()
            .or_else(|| self.table.view_for_element(id).cloned())
    }

    /// Declared parameter names and slot order of the composed view,
    /// from the local definition or the imported signature.
    fn target_signature(
        &self,
        binding: &ViewBinding,
    ) -> (String, Vec<String>, Vec<String>) {
        match binding {
            ViewBinding::Local(view) => {
                let StmtKind::ViewDef(def) = &self.ast.stmt(*view).kind else {
                    return (String::new(), Vec::new(), Vec::new());
                };
                let name = self
                    .ast
                    .name_text(def.name)
                    .unwrap_or_default()
                    .to_string();
                let params = def
                    .params
                    .iter()
                    .filter_map(|p| p.name.and_then(|n| self.ast.name_text(n)))
                    .map(str::to_string)
                    .collect();
                let slots = analyze_slots(self.ast, &def.body)
                    .keys()
                    .cloned()
                    .collect();
                (name, params, slots)
            }
            ViewBinding::External(signature) => (
                signature.name.clone(),
                signature.params.clone(),
                signature.slots.clone(),
            ),
        }
    }

    /// Lower a composition: a constructor call with matching attributes
    /// as keyword arguments and the element's children distributed
    /// across the target's slots. Returns prelude statements (children
    /// collections for control-flow-bearing buckets) plus the call.
    fn compose_view(
        &mut self,
        id: StmtId,
        element: &Element,
        binding: &ViewBinding,
    ) -> Result<(Vec<StmtId>, ExprId), TransformError> {
        let (view_name, params, slots) = self.target_signature(binding);
        let span = self.ast.stmt_span(id);

        let buckets = self.collect_slot_buckets(element)?;

        // Shape validation: children need a slot to land in.
        if !buckets.is_empty() && slots.is_empty() {
            return Err(TransformError::UnexpectedChildren {
                view: view_name,
                span,
            });
        }
        if buckets.contains_key("") && !slots.iter().any(String::is_empty) {
            return Err(TransformError::UnexpectedChildren {
                view: view_name,
                span,
            });
        }
        if let Some(unknown) = buckets.keys().find(|key| !slots.contains(*key)) {
            return Err(TransformError::UnknownSlot {
                view: view_name,
                slot: unknown.clone(),
                span,
            });
        }

        // Matching attributes become keyword arguments; non-matching
        // attributes are dropped. Constructor arguments are not escaped.
        let mut args = Vec::new();
        for attribute in &element.attributes {
            if attribute.name == "slot" || !params.contains(&attribute.name) {
                continue;
            }
            let value = match attribute.value {
                None => self.ast.bool_lit(true, attribute.span),
                Some(value) => rewrite_expr(self.ast, self.table, value),
            };
            args.push(Argument {
                name: Some(attribute.name.clone()),
                value,
                span: attribute.span,
            });
        }

        // Buckets in order: default first, then named slots in the
        // target's declaration order.
        let mut ordered: Vec<(String, Vec<StmtId>)> = Vec::new();
        let mut buckets = buckets;
        if let Some(content) = buckets.shift_remove("") {
            ordered.push((String::new(), content));
        }
        for slot in &slots {
            if slot.is_empty() {
                continue;
            }
            if let Some(content) = buckets.shift_remove(slot) {
                ordered.push((slot.clone(), content));
            }
        }

        let mut prelude = Vec::new();
        for (slot, content) in ordered {
            let value = self.lower_slot_bucket(&content, &mut prelude)?;
            let param = if slot.is_empty() {
                "children".to_string()
            } else {
                slot
            };
            args.push(Argument {
                name: Some(param),
                value,
                span,
            });
        }

        let callee = self.ast.name(view_name, span);
        Ok((prelude, self.ast.call(callee, args, span)))
    }

    /// Lower one slot bucket through the view-body rules: plain content
    /// becomes one expression, control-flow-bearing content is hoisted
    /// into a fresh collection and passed as `fragment(collection)`.
    fn lower_slot_bucket(
        &mut self,
        content: &[StmtId],
        prelude: &mut Vec<StmtId>,
    ) -> Result<ExprId, TransformError> {
        if !self.content_needs_statements(content) {
            return self.transform_content(content);
        }

        let context = fresh_context_name("slot", self.counter);
        let empty = self.ast.list(vec![], Span::DUMMY);
        let context_target = self.ast.name(context.clone(), Span::DUMMY);
        prelude.push(self.ast.assign(context_target, empty, Span::DUMMY));

        self.session.contexts.push(context.clone());
        for &stmt in content {
            match self.process_view_statement(stmt) {
                Ok(lowered) => prelude.extend(lowered),
                Err(error) => {
                    self.session.contexts.pop();
                    return Err(error);
                }
            }
        }
        self.session.contexts.pop();

        let context_ref = self.ast.name(context, Span::DUMMY);
        Ok(self.fragment_call(context_ref))
    }

    /// Partition a composed element's children by their `slot`
    /// attribute. The attribute is only legal on direct children; one
    /// found nested in an element or a control-flow body is a hard
    /// error, never a silent default-bucket placement.
    fn collect_slot_buckets(
        &mut self,
        element: &Element,
    ) -> Result<IndexMap<String, Vec<StmtId>>, TransformError> {
        let mut buckets: IndexMap<String, Vec<StmtId>> = IndexMap::new();
        for &child in &element.children {
            let kind = self.ast.stmt(child).kind.clone();
            match kind {
                StmtKind::Element(child_element) => {
                    // The child's own content must not carry slot
                    // attributes, labeled or not.
                    for &grandchild in &child_element.children {
                        if let Some(found_in) = find_nested_slot_attribute(self.ast, grandchild) {
                            return Err(TransformError::MisplacedSlotAttribute {
                                found_in,
                                span: self.ast.stmt_span(grandchild),
                            });
                        }
                    }
                    match element_slot_target(self.ast, &child_element) {
                        Some(slot) => {
                            let stripped = self.strip_slot_attribute(child, &child_element);
                            buckets.entry(slot).or_default().push(stripped);
                        }
                        None => buckets.entry(String::new()).or_default().push(child),
                    }
                }
                _ => {
                    if let Some(found_in) = find_nested_slot_attribute(self.ast, child) {
                        return Err(TransformError::MisplacedSlotAttribute {
                            found_in,
                            span: self.ast.stmt_span(child),
                        });
                    }
                    buckets.entry(String::new()).or_default().push(child);
                }
            }
        }
        Ok(buckets)
    }

    /// Copy of an element without its `slot` attribute (stripped before
    /// re-emission). A copy of a composed element keeps its view
    /// binding through `extra_bindings`.
    fn strip_slot_attribute(&mut self, id: StmtId, element: &Element) -> StmtId {
        let span = self.ast.stmt_span(id);
        let mut stripped = element.clone();
        stripped.attributes.retain(|a| a.name != "slot");
        let copy = self.ast.add_stmt(StmtKind::Element(stripped), span);
        if let Some(binding) = self.element_binding(id) {
            self.extra_bindings.insert(copy, binding);
        }
        copy
    }

    // =========================================================================
    // Structure predicates
    // =========================================================================

    /// Control flow anywhere in the subtree; the hierarchical trigger
    /// for view bodies.
    fn contains_control_flow(&self, body: &[StmtId]) -> bool {
        body.iter().any(|&stmt| {
            let kind = &self.ast.stmt(stmt).kind;
            if kind.is_control_flow() {
                return true;
            }
            match kind {
                StmtKind::Element(element) => self.contains_control_flow(&element.children),
                _ => false,
            }
        })
    }

    /// Whether element content (or a slot bucket) must be lowered at
    /// statement level: control flow anywhere, or a statement that has
    /// no expression form.
    fn content_needs_statements(&self, content: &[StmtId]) -> bool {
        content.iter().any(|&stmt| {
            let kind = &self.ast.stmt(stmt).kind;
            if kind.is_control_flow() {
                return true;
            }
            match kind {
                StmtKind::Element(element) => self.content_needs_statements(&element.children),
                StmtKind::Text(_) | StmtKind::Expr(_) => false,
                _ => true,
            }
        })
    }

    // =========================================================================
    // Output builders
    // =========================================================================

    /// `el(tag, content[, attrs])`
    fn el_call(
        &mut self,
        tag: &str,
        tag_span: Span,
        content: ExprId,
        attrs: Option<ExprId>,
    ) -> ExprId {
        let callee = self.ast.name("el", tag_span);
        let tag_lit = self.ast.str_lit(tag, tag_span);
        let mut args = vec![self.ast.arg(tag_lit), self.ast.arg(content)];
        if let Some(attrs) = attrs {
            args.push(self.ast.arg(attrs));
        }
        self.ast.call(callee, args, tag_span)
    }

    /// `escape(value)`
    fn escape_call(&mut self, value: ExprId) -> ExprId {
        let span = self.ast.expr_span(value);
        self.escape_call_at(value, span)
    }

    fn escape_call_at(&mut self, value: ExprId, span: Span) -> ExprId {
        let callee = self.ast.name("escape", span);
        let arg = self.ast.arg(value);
        self.ast.call(callee, vec![arg], span)
    }

    /// `fragment(children)`
    fn fragment_call(&mut self, children: ExprId) -> ExprId {
        let span = self.ast.expr_span(children);
        let callee = self.ast.name("fragment", span);
        let arg = self.ast.arg(children);
        self.ast.call(callee, vec![arg], span)
    }

    /// `collection.append(value)`
    fn append_stmt(&mut self, collection: &str, value: ExprId) -> StmtId {
        let span = self.ast.expr_span(value);
        let receiver = self.ast.name(collection, span);
        let append = self.ast.attribute(receiver, "append", span);
        let arg = self.ast.arg(value);
        let call = self.ast.call(append, vec![arg], span);
        self.ast.expr_stmt(call)
    }
}

/// PascalCase convention marks component tags; lowercase tags are
/// always literal HTML.
fn is_pascal_case(tag: &str) -> bool {
    tag.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}
