//! The AST arena and its typed builder API.
//!
//! All nodes live in two flat vectors owned by [`Ast`]; `ExprId` and
//! `StmtId` are indices into them. Ids are stable for the lifetime of
//! the arena — transformation appends new nodes and repoints statement
//! lists, it never moves or deletes existing nodes.

use serde::Serialize;

use pyx_common::Span;

use crate::node::*;

/// Stable id of an expression node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ExprId(pub u32);

/// Stable id of a statement node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct StmtId(pub u32);

/// Arena owning every AST node of one compilation unit.
#[derive(Debug, Default, Serialize)]
pub struct Ast {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
}

impl Ast {
    #[must_use]
    pub fn new() -> Ast {
        Ast::default()
    }

    /// Create an arena with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(exprs: usize, stmts: usize) -> Ast {
        Ast {
            exprs: Vec::with_capacity(exprs),
            stmts: Vec::with_capacity(stmts),
        }
    }

    // =========================================================================
    // Access
    // =========================================================================

    #[inline]
    #[must_use]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.0 as usize]
    }

    #[inline]
    #[must_use]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.0 as usize]
    }

    #[inline]
    #[must_use]
    pub fn expr_span(&self, id: ExprId) -> Span {
        self.expr(id).span
    }

    #[inline]
    #[must_use]
    pub fn stmt_span(&self, id: StmtId) -> Span {
        self.stmt(id).span
    }

    /// The identifier text of a `Name` expression, if `id` is one.
    #[must_use]
    pub fn name_text(&self, id: ExprId) -> Option<&str> {
        match &self.expr(id).kind {
            ExprKind::Name(text) => Some(text.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    #[must_use]
    pub fn stmt_count(&self) -> usize {
        self.stmts.len()
    }

    // =========================================================================
    // Node creation
    // =========================================================================

    pub fn add_expr(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(Expr { kind, span });
        id
    }

    pub fn add_stmt(&mut self, kind: StmtKind, span: Span) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(Stmt { kind, span });
        id
    }

    // -------------------------------------------------------------------------
    // Expression builders
    // -------------------------------------------------------------------------

    pub fn name(&mut self, text: impl Into<String>, span: Span) -> ExprId {
        self.add_expr(ExprKind::Name(text.into()), span)
    }

    pub fn str_lit(&mut self, value: impl Into<String>, span: Span) -> ExprId {
        self.add_expr(ExprKind::Literal(LiteralValue::Str(value.into())), span)
    }

    pub fn int_lit(&mut self, value: i64, span: Span) -> ExprId {
        self.add_expr(ExprKind::Literal(LiteralValue::Int(value)), span)
    }

    pub fn bool_lit(&mut self, value: bool, span: Span) -> ExprId {
        self.add_expr(ExprKind::Literal(LiteralValue::Bool(value)), span)
    }

    pub fn none_lit(&mut self, span: Span) -> ExprId {
        self.add_expr(ExprKind::Literal(LiteralValue::None), span)
    }

    /// `object.attr`
    pub fn attribute(&mut self, object: ExprId, attr: impl Into<String>, span: Span) -> ExprId {
        self.add_expr(
            ExprKind::Attribute {
                object,
                attr: attr.into(),
                attr_span: span,
            },
            span,
        )
    }

    pub fn call(&mut self, callee: ExprId, args: Vec<Argument>, span: Span) -> ExprId {
        self.add_expr(ExprKind::Call { callee, args }, span)
    }

    pub fn list(&mut self, elements: Vec<ExprId>, span: Span) -> ExprId {
        self.add_expr(ExprKind::List(elements), span)
    }

    pub fn dict(&mut self, items: Vec<DictItem>, span: Span) -> ExprId {
        self.add_expr(ExprKind::Dict(items), span)
    }

    pub fn fstring(&mut self, parts: Vec<FStringPart>, span: Span) -> ExprId {
        self.add_expr(ExprKind::FString(parts), span)
    }

    pub fn binary(&mut self, left: ExprId, op: BinOp, right: ExprId, span: Span) -> ExprId {
        self.add_expr(ExprKind::Binary { left, op, right }, span)
    }

    pub fn ternary(
        &mut self,
        condition: ExprId,
        if_true: ExprId,
        if_false: ExprId,
        span: Span,
    ) -> ExprId {
        self.add_expr(
            ExprKind::Ternary {
                condition,
                if_true,
                if_false,
            },
            span,
        )
    }

    /// A positional call argument.
    #[must_use]
    pub fn arg(&self, value: ExprId) -> Argument {
        Argument {
            name: None,
            value,
            span: self.expr_span(value),
        }
    }

    /// A keyword call argument.
    #[must_use]
    pub fn kwarg(&self, name: impl Into<String>, value: ExprId) -> Argument {
        Argument {
            name: Some(name.into()),
            value,
            span: self.expr_span(value),
        }
    }

    // -------------------------------------------------------------------------
    // Statement builders
    // -------------------------------------------------------------------------

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        let span = self.expr_span(expr);
        self.add_stmt(StmtKind::Expr(expr), span)
    }

    pub fn assign(&mut self, target: ExprId, value: ExprId, span: Span) -> StmtId {
        self.add_stmt(
            StmtKind::Assign {
                targets: vec![target],
                value,
            },
            span,
        )
    }

    pub fn return_stmt(&mut self, value: Option<ExprId>, span: Span) -> StmtId {
        self.add_stmt(StmtKind::Return(value), span)
    }

    pub fn function_def(&mut self, def: FunctionDef, span: Span) -> StmtId {
        self.add_stmt(StmtKind::FunctionDef(def), span)
    }

    pub fn class_def(&mut self, def: ClassDef, span: Span) -> StmtId {
        self.add_stmt(StmtKind::ClassDef(def), span)
    }

    pub fn import_from(
        &mut self,
        module: Vec<String>,
        names: Vec<ImportAlias>,
        span: Span,
    ) -> StmtId {
        self.add_stmt(
            StmtKind::ImportFrom {
                module,
                level: 0,
                names,
            },
            span,
        )
    }

    /// A plain named parameter with no annotation or default.
    pub fn param(&mut self, name: impl Into<String>, span: Span) -> Parameter {
        let name = self.name(name, span);
        Parameter {
            name: Some(name),
            annotation: None,
            default: None,
            kind: ParamKind::Normal,
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable_and_ordered() {
        let mut ast = Ast::new();
        let a = ast.name("a", Span::new(0, 1));
        let b = ast.name("b", Span::new(2, 3));
        assert_eq!(a, ExprId(0));
        assert_eq!(b, ExprId(1));
        assert_eq!(ast.name_text(a), Some("a"));
        assert_eq!(ast.expr_span(b), Span::new(2, 3));
    }

    #[test]
    fn name_text_rejects_non_names() {
        let mut ast = Ast::new();
        let lit = ast.int_lit(7, Span::DUMMY);
        assert_eq!(ast.name_text(lit), None);
    }

    #[test]
    fn builders_nest() {
        let mut ast = Ast::new();
        let obj = ast.name("self", Span::DUMMY);
        let attr = ast.attribute(obj, "title", Span::DUMMY);
        let arg = ast.arg(attr);
        let callee = ast.name("escape", Span::DUMMY);
        let call = ast.call(callee, vec![arg], Span::DUMMY);
        match &ast.expr(call).kind {
            ExprKind::Call { args, .. } => assert_eq!(args.len(), 1),
            other => panic!("expected call, got {other:?}"),
        }
    }
}
