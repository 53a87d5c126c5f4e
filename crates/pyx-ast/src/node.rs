//! AST node definitions.
//!
//! One variant per node kind, statements and expressions in separate
//! enums. Child links are arena ids, never references. Every node
//! carries a source span; nodes synthesized by the transformer use
//! `Span::DUMMY`.

use serde::Serialize;

use pyx_common::Span;

use crate::arena::{ExprId, StmtId};

// =============================================================================
// Expressions
// =============================================================================

/// An expression node: kind plus source span.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

/// Literal constant values.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum LiteralValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// One piece of an f-string: literal text or a `{expr}` replacement field.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum FStringPart {
    Text(String),
    Expr(ExprId),
}

/// A call argument, positional (`name` is `None`) or keyword.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Argument {
    pub name: Option<String>,
    pub value: ExprId,
    pub span: Span,
}

/// One `for target in iter [if cond]*` clause of a comprehension.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Comprehension {
    pub target: ExprId,
    pub iter: ExprId,
    pub conditions: Vec<ExprId>,
    pub is_async: bool,
}

/// Parameter position kind.
///
/// `Star` with no name is the bare `*` keyword-only marker; with a name
/// it is `*args`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ParamKind {
    Normal,
    Star,
    DoubleStar,
}

/// A formal parameter of a function, lambda or view.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Parameter {
    /// A `Name` expression, or `None` for the bare `*` marker.
    pub name: Option<ExprId>,
    pub annotation: Option<ExprId>,
    pub default: Option<ExprId>,
    pub kind: ParamKind,
    pub span: Span,
}

/// A dict display item.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum DictItem {
    KeyValue { key: ExprId, value: ExprId },
    Spread(ExprId),
}

/// Binary operators, comparisons and boolean connectives included.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    And,
    Or,
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Not,
    Neg,
    Pos,
    Invert,
}

/// Expression kinds.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum ExprKind {
    /// An identifier reference (or binding occurrence, in target
    /// position).
    Name(String),
    Literal(LiteralValue),
    FString(Vec<FStringPart>),
    Attribute {
        object: ExprId,
        attr: String,
        attr_span: Span,
    },
    Call {
        callee: ExprId,
        args: Vec<Argument>,
    },
    Subscript {
        object: ExprId,
        indices: Vec<ExprId>,
    },
    Binary {
        left: ExprId,
        op: BinOp,
        right: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    /// `if_true if condition else if_false`
    Ternary {
        condition: ExprId,
        if_true: ExprId,
        if_false: ExprId,
    },
    List(Vec<ExprId>),
    Tuple(Vec<ExprId>),
    Set(Vec<ExprId>),
    Dict(Vec<DictItem>),
    Starred(ExprId),
    Lambda {
        params: Vec<Parameter>,
        body: ExprId,
    },
    ListComp {
        element: ExprId,
        generators: Vec<Comprehension>,
    },
    SetComp {
        element: ExprId,
        generators: Vec<Comprehension>,
    },
    DictComp {
        key: ExprId,
        value: ExprId,
        generators: Vec<Comprehension>,
    },
    Generator {
        element: ExprId,
        generators: Vec<Comprehension>,
    },
    Await(ExprId),
}

// =============================================================================
// Statements
// =============================================================================

/// A statement node: kind plus source span.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// One name bound by an `import` or `from ... import` statement.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImportAlias {
    /// Dotted path (`["os", "path"]` for `os.path`); a single segment
    /// for from-import names.
    pub name: Vec<String>,
    pub alias: Option<String>,
    pub span: Span,
}

/// One `expr [as target]` item of a with statement.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WithItem {
    pub context: ExprId,
    pub target: Option<ExprId>,
}

/// An `except` clause.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExceptHandler {
    pub ty: Option<ExprId>,
    /// A `Name` expression for `except E as name:`.
    pub name: Option<ExprId>,
    pub body: Vec<StmtId>,
    pub is_star: bool,
    pub span: Span,
}

/// A `case` block of a match statement.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchCase {
    pub pattern: Pattern,
    pub guard: Option<ExprId>,
    pub body: Vec<StmtId>,
    pub span: Span,
}

/// Match patterns. Capture and as-patterns bind names; value patterns
/// are references.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Pattern {
    Value(ExprId),
    /// A `Name` expression bound on match.
    Capture(ExprId),
    Wildcard(Span),
    Sequence(Vec<Pattern>),
    /// `*rest`; `None` for `*_`.
    Star(Option<ExprId>),
    Mapping {
        keys: Vec<ExprId>,
        patterns: Vec<Pattern>,
        /// A `Name` expression for `**rest`.
        rest: Option<ExprId>,
    },
    Class {
        cls: ExprId,
        patterns: Vec<Pattern>,
        kwargs: Vec<(String, Pattern)>,
    },
    Or(Vec<Pattern>),
    As {
        pattern: Option<Box<Pattern>>,
        name: ExprId,
    },
}

/// A function definition (also used for synthesized methods).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FunctionDef {
    /// A `Name` expression.
    pub name: ExprId,
    pub params: Vec<Parameter>,
    pub returns: Option<ExprId>,
    pub body: Vec<StmtId>,
    pub is_async: bool,
}

/// A class definition (also the lowered form of a view).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassDef {
    /// A `Name` expression.
    pub name: ExprId,
    pub bases: Vec<Argument>,
    pub body: Vec<StmtId>,
}

/// A view definition: parameterized markup component, lowered to a
/// class by the transformer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViewDef {
    /// A `Name` expression.
    pub name: ExprId,
    pub params: Vec<Parameter>,
    pub body: Vec<StmtId>,
}

/// One attribute of a markup element. `value: None` is a valueless
/// (boolean) attribute.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HtmlAttribute {
    pub name: String,
    pub name_span: Span,
    pub value: Option<ExprId>,
    pub span: Span,
}

/// A markup element. Children are statements: nested elements, text
/// runs, and ordinary control flow.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Element {
    pub tag: String,
    pub tag_span: Span,
    pub attributes: Vec<HtmlAttribute>,
    pub children: Vec<StmtId>,
    pub self_closing: bool,
}

/// One piece of a text run: literal text or a `{expr}` interpolation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum TextPart {
    Text { value: String, span: Span },
    Interpolation { value: ExprId, span: Span },
}

/// A run of literal text and interpolations between elements.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TextRun {
    pub parts: Vec<TextPart>,
}

/// Statement kinds.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum StmtKind {
    Expr(ExprId),
    Assign {
        targets: Vec<ExprId>,
        value: ExprId,
    },
    Return(Option<ExprId>),
    Pass,
    Break,
    Continue,
    /// `global` declaration; each entry is a `Name` expression.
    Global(Vec<ExprId>),
    /// `nonlocal` declaration; each entry is a `Name` expression.
    Nonlocal(Vec<ExprId>),
    Import(Vec<ImportAlias>),
    ImportFrom {
        module: Vec<String>,
        /// Count of leading dots for relative imports.
        level: u32,
        names: Vec<ImportAlias>,
    },
    Raise {
        exc: Option<ExprId>,
        cause: Option<ExprId>,
    },
    Assert {
        test: ExprId,
        message: Option<ExprId>,
    },
    If {
        condition: ExprId,
        body: Vec<StmtId>,
        orelse: Vec<StmtId>,
    },
    While {
        condition: ExprId,
        body: Vec<StmtId>,
        orelse: Vec<StmtId>,
    },
    For {
        target: ExprId,
        iter: ExprId,
        body: Vec<StmtId>,
        orelse: Vec<StmtId>,
        is_async: bool,
    },
    With {
        items: Vec<WithItem>,
        body: Vec<StmtId>,
        is_async: bool,
    },
    Try {
        body: Vec<StmtId>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<StmtId>,
        finally: Vec<StmtId>,
    },
    Match {
        subject: ExprId,
        cases: Vec<MatchCase>,
    },
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    ViewDef(ViewDef),
    Element(Element),
    Text(TextRun),
}

impl StmtKind {
    /// True for the compound statements that force hierarchical view
    /// lowering when they appear in a view body.
    #[must_use]
    pub fn is_control_flow(&self) -> bool {
        matches!(
            self,
            StmtKind::If { .. }
                | StmtKind::While { .. }
                | StmtKind::For { .. }
                | StmtKind::With { .. }
                | StmtKind::Try { .. }
                | StmtKind::Match { .. }
        )
    }

    /// True for markup nodes (elements and text runs).
    #[must_use]
    pub fn is_markup(&self) -> bool {
        matches!(self, StmtKind::Element(_) | StmtKind::Text(_))
    }
}

/// A parsed source file: the statements at module level.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Module {
    pub body: Vec<StmtId>,
    pub span: Span,
}
