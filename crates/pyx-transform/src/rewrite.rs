//! Expression and statement rewriting.
//!
//! Shared by render lowering and plain statement passthrough: rebuild a
//! subtree, replacing every leaf name the resolution table classifies
//! as a view parameter with an attribute access on the implicit
//! receiver (`title` -> `self.title`). Binding positions — assignment,
//! loop and comprehension targets, lambda/function parameter lists,
//! match patterns — are left untouched: they introduce bindings, not
//! references.
//!
//! Nodes whose subtree contains no view parameter are returned as-is
//! (same id); only changed paths allocate new nodes.

use pyx_ast::{
    Ast, Comprehension, DictItem, ExceptHandler, ExprId, ExprKind, FStringPart, MatchCase, StmtId,
    StmtKind, WithItem,
};
use pyx_resolver::ResolutionTable;

/// Rewrite an expression, substituting view-parameter references.
/// Returns the original id when nothing below it changed.
pub fn rewrite_expr(ast: &mut Ast, table: &ResolutionTable, id: ExprId) -> ExprId {
    let span = ast.expr_span(id);
    let kind = ast.expr(id).kind.clone();
    match kind {
        ExprKind::Name(name) => {
            if table.is_view_parameter(id) {
                let receiver = ast.name("self", span);
                ast.add_expr(
                    ExprKind::Attribute {
                        object: receiver,
                        attr: name,
                        attr_span: span,
                    },
                    span,
                )
            } else {
                id
            }
        }
        ExprKind::Literal(_) => id,
        ExprKind::FString(parts) => {
            let mut changed = false;
            let parts: Vec<FStringPart> = parts
                .into_iter()
                .map(|part| match part {
                    FStringPart::Expr(expr) => {
                        let new = rewrite_expr(ast, table, expr);
                        changed |= new != expr;
                        FStringPart::Expr(new)
                    }
                    text => text,
                })
                .collect();
            if changed {
                ast.add_expr(ExprKind::FString(parts), span)
            } else {
                id
            }
        }
        ExprKind::Attribute {
            object,
            attr,
            attr_span,
        } => {
            let new_object = rewrite_expr(ast, table, object);
            if new_object != object {
                ast.add_expr(
                    ExprKind::Attribute {
                        object: new_object,
                        attr,
                        attr_span,
                    },
                    span,
                )
            } else {
                id
            }
        }
        ExprKind::Call { callee, args } => {
            let new_callee = rewrite_expr(ast, table, callee);
            let mut changed = new_callee != callee;
            let args = args
                .into_iter()
                .map(|mut arg| {
                    let new = rewrite_expr(ast, table, arg.value);
                    changed |= new != arg.value;
                    arg.value = new;
                    arg
                })
                .collect();
            if changed {
                ast.add_expr(
                    ExprKind::Call {
                        callee: new_callee,
                        args,
                    },
                    span,
                )
            } else {
                id
            }
        }
        ExprKind::Subscript { object, indices } => {
            let new_object = rewrite_expr(ast, table, object);
            let mut changed = new_object != object;
            let indices = indices
                .into_iter()
                .map(|index| {
                    let new = rewrite_expr(ast, table, index);
                    changed |= new != index;
                    new
                })
                .collect();
            if changed {
                ast.add_expr(
                    ExprKind::Subscript {
                        object: new_object,
                        indices,
                    },
                    span,
                )
            } else {
                id
            }
        }
        ExprKind::Binary { left, op, right } => {
            let new_left = rewrite_expr(ast, table, left);
            let new_right = rewrite_expr(ast, table, right);
            if new_left != left || new_right != right {
                ast.add_expr(
                    ExprKind::Binary {
                        left: new_left,
                        op,
                        right: new_right,
                    },
                    span,
                )
            } else {
                id
            }
        }
        ExprKind::Unary { op, operand } => {
            let new_operand = rewrite_expr(ast, table, operand);
            if new_operand != operand {
                ast.add_expr(
                    ExprKind::Unary {
                        op,
                        operand: new_operand,
                    },
                    span,
                )
            } else {
                id
            }
        }
        ExprKind::Ternary {
            condition,
            if_true,
            if_false,
        } => {
            let new_condition = rewrite_expr(ast, table, condition);
            let new_true = rewrite_expr(ast, table, if_true);
            let new_false = rewrite_expr(ast, table, if_false);
            if new_condition != condition || new_true != if_true || new_false != if_false {
                ast.add_expr(
                    ExprKind::Ternary {
                        condition: new_condition,
                        if_true: new_true,
                        if_false: new_false,
                    },
                    span,
                )
            } else {
                id
            }
        }
        ExprKind::List(elements) => {
            let (elements, changed) = rewrite_all(ast, table, elements);
            if changed {
                ast.add_expr(ExprKind::List(elements), span)
            } else {
                id
            }
        }
        ExprKind::Tuple(elements) => {
            let (elements, changed) = rewrite_all(ast, table, elements);
            if changed {
                ast.add_expr(ExprKind::Tuple(elements), span)
            } else {
                id
            }
        }
        ExprKind::Set(elements) => {
            let (elements, changed) = rewrite_all(ast, table, elements);
            if changed {
                ast.add_expr(ExprKind::Set(elements), span)
            } else {
                id
            }
        }
        ExprKind::Dict(items) => {
            let mut changed = false;
            let items = items
                .into_iter()
                .map(|item| match item {
                    DictItem::KeyValue { key, value } => {
                        let new_key = rewrite_expr(ast, table, key);
                        let new_value = rewrite_expr(ast, table, value);
                        changed |= new_key != key || new_value != value;
                        DictItem::KeyValue {
                            key: new_key,
                            value: new_value,
                        }
                    }
                    DictItem::Spread(expr) => {
                        let new = rewrite_expr(ast, table, expr);
                        changed |= new != expr;
                        DictItem::Spread(new)
                    }
                })
                .collect();
            if changed {
                ast.add_expr(ExprKind::Dict(items), span)
            } else {
                id
            }
        }
        ExprKind::Starred(inner) => {
            let new = rewrite_expr(ast, table, inner);
            if new != inner {
                ast.add_expr(ExprKind::Starred(new), span)
            } else {
                id
            }
        }
        // Lambda parameters introduce bindings; only the body is
        // rewritten.
        ExprKind::Lambda { params, body } => {
            let new_body = rewrite_expr(ast, table, body);
            if new_body != body {
                ast.add_expr(
                    ExprKind::Lambda {
                        params,
                        body: new_body,
                    },
                    span,
                )
            } else {
                id
            }
        }
        ExprKind::ListComp {
            element,
            generators,
        } => {
            let (element, generators, changed) =
                rewrite_comprehension(ast, table, element, generators);
            if changed {
                ast.add_expr(
                    ExprKind::ListComp {
                        element,
                        generators,
                    },
                    span,
                )
            } else {
                id
            }
        }
        ExprKind::SetComp {
            element,
            generators,
        } => {
            let (element, generators, changed) =
                rewrite_comprehension(ast, table, element, generators);
            if changed {
                ast.add_expr(
                    ExprKind::SetComp {
                        element,
                        generators,
                    },
                    span,
                )
            } else {
                id
            }
        }
        ExprKind::Generator {
            element,
            generators,
        } => {
            let (element, generators, changed) =
                rewrite_comprehension(ast, table, element, generators);
            if changed {
                ast.add_expr(
                    ExprKind::Generator {
                        element,
                        generators,
                    },
                    span,
                )
            } else {
                id
            }
        }
        ExprKind::DictComp {
            key,
            value,
            generators,
        } => {
            let new_key = rewrite_expr(ast, table, key);
            let (new_value, generators, mut changed) =
                rewrite_comprehension(ast, table, value, generators);
            changed |= new_key != key;
            if changed {
                ast.add_expr(
                    ExprKind::DictComp {
                        key: new_key,
                        value: new_value,
                        generators,
                    },
                    span,
                )
            } else {
                id
            }
        }
        ExprKind::Await(inner) => {
            let new = rewrite_expr(ast, table, inner);
            if new != inner {
                ast.add_expr(ExprKind::Await(new), span)
            } else {
                id
            }
        }
    }
}

fn rewrite_all(ast: &mut Ast, table: &ResolutionTable, ids: Vec<ExprId>) -> (Vec<ExprId>, bool) {
    let mut changed = false;
    let ids = ids
        .into_iter()
        .map(|expr| {
            let new = rewrite_expr(ast, table, expr);
            changed |= new != expr;
            new
        })
        .collect();
    (ids, changed)
}

/// Comprehension targets introduce bindings and stay untouched;
/// iterables, conditions and the element are rewritten.
fn rewrite_comprehension(
    ast: &mut Ast,
    table: &ResolutionTable,
    element: ExprId,
    generators: Vec<Comprehension>,
) -> (ExprId, Vec<Comprehension>, bool) {
    let new_element = rewrite_expr(ast, table, element);
    let mut changed = new_element != element;
    let generators = generators
        .into_iter()
        .map(|mut generator| {
            let new_iter = rewrite_expr(ast, table, generator.iter);
            changed |= new_iter != generator.iter;
            generator.iter = new_iter;
            generator.conditions = generator
                .conditions
                .into_iter()
                .map(|condition| {
                    let new = rewrite_expr(ast, table, condition);
                    changed |= new != condition;
                    new
                })
                .collect();
            generator
        })
        .collect();
    (new_element, generators, changed)
}

/// Rewrite a statement for plain passthrough, substituting
/// view-parameter references in expression positions while preserving
/// the statement's shape. Returns the original id when nothing changed.
pub fn rewrite_stmt(ast: &mut Ast, table: &ResolutionTable, id: StmtId) -> StmtId {
    let span = ast.stmt_span(id);
    let kind = ast.stmt(id).kind.clone();
    match kind {
        StmtKind::Expr(expr) => {
            let new = rewrite_expr(ast, table, expr);
            if new != expr {
                ast.add_stmt(StmtKind::Expr(new), span)
            } else {
                id
            }
        }
        // Targets introduce bindings and are left untouched.
        StmtKind::Assign { targets, value } => {
            let new_value = rewrite_expr(ast, table, value);
            if new_value != value {
                ast.add_stmt(
                    StmtKind::Assign {
                        targets,
                        value: new_value,
                    },
                    span,
                )
            } else {
                id
            }
        }
        StmtKind::Return(Some(value)) => {
            let new = rewrite_expr(ast, table, value);
            if new != value {
                ast.add_stmt(StmtKind::Return(Some(new)), span)
            } else {
                id
            }
        }
        StmtKind::Raise { exc, cause } => {
            let new_exc = exc.map(|e| rewrite_expr(ast, table, e));
            let new_cause = cause.map(|c| rewrite_expr(ast, table, c));
            if new_exc != exc || new_cause != cause {
                ast.add_stmt(
                    StmtKind::Raise {
                        exc: new_exc,
                        cause: new_cause,
                    },
                    span,
                )
            } else {
                id
            }
        }
        StmtKind::Assert { test, message } => {
            let new_test = rewrite_expr(ast, table, test);
            let new_message = message.map(|m| rewrite_expr(ast, table, m));
            if new_test != test || new_message != message {
                ast.add_stmt(
                    StmtKind::Assert {
                        test: new_test,
                        message: new_message,
                    },
                    span,
                )
            } else {
                id
            }
        }
        StmtKind::If {
            condition,
            body,
            orelse,
        } => {
            let new_condition = rewrite_expr(ast, table, condition);
            let (body, body_changed) = rewrite_body(ast, table, body);
            let (orelse, orelse_changed) = rewrite_body(ast, table, orelse);
            if new_condition != condition || body_changed || orelse_changed {
                ast.add_stmt(
                    StmtKind::If {
                        condition: new_condition,
                        body,
                        orelse,
                    },
                    span,
                )
            } else {
                id
            }
        }
        StmtKind::While {
            condition,
            body,
            orelse,
        } => {
            let new_condition = rewrite_expr(ast, table, condition);
            let (body, body_changed) = rewrite_body(ast, table, body);
            let (orelse, orelse_changed) = rewrite_body(ast, table, orelse);
            if new_condition != condition || body_changed || orelse_changed {
                ast.add_stmt(
                    StmtKind::While {
                        condition: new_condition,
                        body,
                        orelse,
                    },
                    span,
                )
            } else {
                id
            }
        }
        StmtKind::For {
            target,
            iter,
            body,
            orelse,
            is_async,
        } => {
            let new_iter = rewrite_expr(ast, table, iter);
            let (body, body_changed) = rewrite_body(ast, table, body);
            let (orelse, orelse_changed) = rewrite_body(ast, table, orelse);
            if new_iter != iter || body_changed || orelse_changed {
                ast.add_stmt(
                    StmtKind::For {
                        target,
                        iter: new_iter,
                        body,
                        orelse,
                        is_async,
                    },
                    span,
                )
            } else {
                id
            }
        }
        StmtKind::With {
            items,
            body,
            is_async,
        } => {
            let mut changed = false;
            let items: Vec<WithItem> = items
                .into_iter()
                .map(|mut item| {
                    let new = rewrite_expr(ast, table, item.context);
                    changed |= new != item.context;
                    item.context = new;
                    item
                })
                .collect();
            let (body, body_changed) = rewrite_body(ast, table, body);
            if changed || body_changed {
                ast.add_stmt(
                    StmtKind::With {
                        items,
                        body,
                        is_async,
                    },
                    span,
                )
            } else {
                id
            }
        }
        StmtKind::Try {
            body,
            handlers,
            orelse,
            finally,
        } => {
            let (body, mut changed) = rewrite_body(ast, table, body);
            let handlers: Vec<ExceptHandler> = handlers
                .into_iter()
                .map(|mut handler| {
                    if let Some(ty) = handler.ty {
                        let new = rewrite_expr(ast, table, ty);
                        changed |= new != ty;
                        handler.ty = Some(new);
                    }
                    let (handler_body, handler_changed) = rewrite_body(ast, table, handler.body);
                    changed |= handler_changed;
                    handler.body = handler_body;
                    handler
                })
                .collect();
            let (orelse, orelse_changed) = rewrite_body(ast, table, orelse);
            let (finally, finally_changed) = rewrite_body(ast, table, finally);
            if changed || orelse_changed || finally_changed {
                ast.add_stmt(
                    StmtKind::Try {
                        body,
                        handlers,
                        orelse,
                        finally,
                    },
                    span,
                )
            } else {
                id
            }
        }
        StmtKind::Match { subject, cases } => {
            let new_subject = rewrite_expr(ast, table, subject);
            let mut changed = new_subject != subject;
            let cases: Vec<MatchCase> = cases
                .into_iter()
                .map(|mut case| {
                    if let Some(guard) = case.guard {
                        let new = rewrite_expr(ast, table, guard);
                        changed |= new != guard;
                        case.guard = Some(new);
                    }
                    let (case_body, case_changed) = rewrite_body(ast, table, case.body);
                    changed |= case_changed;
                    case.body = case_body;
                    case
                })
                .collect();
            if changed {
                ast.add_stmt(
                    StmtKind::Match {
                        subject: new_subject,
                        cases,
                    },
                    span,
                )
            } else {
                id
            }
        }
        // Parameter lists introduce bindings; only the body (and the
        // return annotation) is rewritten.
        StmtKind::FunctionDef(mut def) => {
            let (body, body_changed) = rewrite_body(ast, table, def.body);
            let mut changed = body_changed;
            if let Some(returns) = def.returns {
                let new = rewrite_expr(ast, table, returns);
                changed |= new != returns;
                def.returns = Some(new);
            }
            if changed {
                def.body = body;
                ast.add_stmt(StmtKind::FunctionDef(def), span)
            } else {
                id
            }
        }
        _ => id,
    }
}

fn rewrite_body(ast: &mut Ast, table: &ResolutionTable, body: Vec<StmtId>) -> (Vec<StmtId>, bool) {
    let mut changed = false;
    let body = body
        .into_iter()
        .map(|stmt| {
            let new = rewrite_stmt(ast, table, stmt);
            changed |= new != stmt;
            new
        })
        .collect();
    (body, changed)
}
