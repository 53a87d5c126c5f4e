//! Slot discovery and slot-content validation.
//!
//! A pre-pass over one view's body finds every `<slot>` element —
//! looking inside plain elements' content and into control-flow bodies
//! and else-branches — and records them in first-seen source order.
//! The same module hosts the checks for `slot="..."` attributes on a
//! composed view's children: legal on direct children only.

use indexmap::IndexMap;

use pyx_ast::{Ast, Element, ExprKind, LiteralValue, StmtId, StmtKind};

/// One slot declared in a view body.
#[derive(Clone, Debug)]
pub struct SlotInfo {
    /// Slot name; empty string is the default slot.
    pub name: String,
    /// Fallback content rendered when the caller supplies nothing.
    pub fallback: Vec<StmtId>,
    /// The `<slot>` element itself.
    pub element: StmtId,
}

/// Discover every slot in a view body, keyed by name in first-seen
/// source order. A repeated name keeps its original position; the
/// latest fallback content wins.
#[must_use]
pub fn analyze_slots(ast: &Ast, body: &[StmtId]) -> IndexMap<String, SlotInfo> {
    let mut slots = IndexMap::new();
    for &stmt in body {
        analyze_slot_in_stmt(ast, stmt, &mut slots);
    }
    slots
}

fn analyze_slot_in_stmt(ast: &Ast, id: StmtId, slots: &mut IndexMap<String, SlotInfo>) {
    match &ast.stmt(id).kind {
        StmtKind::Element(element) => {
            if element.tag == "slot" {
                let name = slot_name(ast, element);
                slots.insert(
                    name.clone(),
                    SlotInfo {
                        name,
                        fallback: element.children.clone(),
                        element: id,
                    },
                );
            } else {
                for &child in &element.children {
                    analyze_slot_in_stmt(ast, child, slots);
                }
            }
        }
        StmtKind::If { body, orelse, .. }
        | StmtKind::While { body, orelse, .. }
        | StmtKind::For { body, orelse, .. } => {
            for &stmt in body.iter().chain(orelse) {
                analyze_slot_in_stmt(ast, stmt, slots);
            }
        }
        StmtKind::With { body, .. } => {
            for &stmt in body {
                analyze_slot_in_stmt(ast, stmt, slots);
            }
        }
        StmtKind::Try {
            body,
            handlers,
            orelse,
            finally,
        } => {
            for &stmt in body.iter().chain(orelse).chain(finally) {
                analyze_slot_in_stmt(ast, stmt, slots);
            }
            for handler in handlers {
                for &stmt in &handler.body {
                    analyze_slot_in_stmt(ast, stmt, slots);
                }
            }
        }
        StmtKind::Match { cases, .. } => {
            for case in cases {
                for &stmt in &case.body {
                    analyze_slot_in_stmt(ast, stmt, slots);
                }
            }
        }
        _ => {}
    }
}

/// The `name` attribute of a `<slot>` element; empty string (default
/// slot) when absent or not a string literal.
#[must_use]
pub fn slot_name(ast: &Ast, element: &Element) -> String {
    for attribute in &element.attributes {
        if attribute.name == "name"
            && let Some(value) = attribute.value
            && let ExprKind::Literal(LiteralValue::Str(text)) = &ast.expr(value).kind
        {
            return text.clone();
        }
    }
    String::new()
}

/// The `slot="..."` attribute value of a composed child; `None` when
/// the child carries no slot attribute, empty string for `slot=""`.
#[must_use]
pub fn element_slot_target(ast: &Ast, element: &Element) -> Option<String> {
    for attribute in &element.attributes {
        if attribute.name == "slot" {
            if let Some(value) = attribute.value
                && let ExprKind::Literal(LiteralValue::Str(text)) = &ast.expr(value).kind
            {
                return Some(text.clone());
            }
            return Some(String::new());
        }
    }
    None
}

#[must_use]
pub fn has_slot_attribute(element: &Element) -> bool {
    element.attributes.iter().any(|a| a.name == "slot")
}

/// Find a `slot` attribute anywhere below a statement — on a nested
/// element or inside a control-flow body. Returns the tag of the
/// element that carries it. Used to reject slot attributes that are
/// not on direct children of a composed view.
#[must_use]
pub fn find_nested_slot_attribute(ast: &Ast, id: StmtId) -> Option<String> {
    match &ast.stmt(id).kind {
        StmtKind::Element(element) => {
            if has_slot_attribute(element) {
                return Some(element.tag.clone());
            }
            element
                .children
                .iter()
                .find_map(|&child| find_nested_slot_attribute(ast, child))
        }
        StmtKind::If { body, orelse, .. }
        | StmtKind::While { body, orelse, .. }
        | StmtKind::For { body, orelse, .. } => body
            .iter()
            .chain(orelse)
            .find_map(|&stmt| find_nested_slot_attribute(ast, stmt)),
        StmtKind::With { body, .. } => body
            .iter()
            .find_map(|&stmt| find_nested_slot_attribute(ast, stmt)),
        StmtKind::Try {
            body,
            handlers,
            orelse,
            finally,
        } => body
            .iter()
            .chain(orelse)
            .chain(finally)
            .find_map(|&stmt| find_nested_slot_attribute(ast, stmt))
            .or_else(|| {
                handlers.iter().find_map(|handler| {
                    handler
                        .body
                        .iter()
                        .find_map(|&stmt| find_nested_slot_attribute(ast, stmt))
                })
            }),
        StmtKind::Match { cases, .. } => cases.iter().find_map(|case| {
            case.body
                .iter()
                .find_map(|&stmt| find_nested_slot_attribute(ast, stmt))
        }),
        _ => None,
    }
}
