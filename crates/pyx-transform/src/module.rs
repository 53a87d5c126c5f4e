//! Module-level driving of the view transform.
//!
//! Replaces every view definition in a module with its lowered class
//! and prepends one import of the runtime support symbols when any
//! view was lowered. Owns the deterministic counter used for children
//! collection names, so generated output is stable and diffable for
//! the whole compilation unit.

use tracing::debug;

use pyx_ast::{Ast, ImportAlias, Module, StmtId, StmtKind};
use pyx_common::Span;
use pyx_resolver::ResolutionTable;

use crate::error::TransformError;
use crate::view::{ViewSession, ViewTransformer};
use crate::{RUNTIME_MODULE, RUNTIME_SYMBOLS};

/// Transforms a resolved module. One instance per file; per-view state
/// lives in a fresh [`ViewSession`] per view.
pub struct ModuleTransformer<'a> {
    ast: &'a mut Ast,
    table: &'a ResolutionTable,
    next_context_id: u32,
}

impl<'a> ModuleTransformer<'a> {
    pub fn new(ast: &'a mut Ast, table: &'a ResolutionTable) -> ModuleTransformer<'a> {
        ModuleTransformer {
            ast,
            table,
            next_context_id: 1,
        }
    }

    /// Rewrite the module: every view definition becomes a class, other
    /// statements are kept as-is. The first transform error aborts this
    /// file; other files in a multi-file build are unaffected.
    pub fn transform_module(mut self, module: &Module) -> Result<Module, TransformError> {
        let mut body = Vec::with_capacity(module.body.len() + 1);
        let mut lowered_views = 0usize;

        for &stmt in &module.body {
            let view = match &self.ast.stmt(stmt).kind {
                StmtKind::ViewDef(def) => Some(def.clone()),
                _ => None,
            };
            match view {
                Some(def) => {
                    let span = self.ast.stmt_span(stmt);
                    let session = ViewSession::new(self.ast, &def.body);
                    let mut transformer = ViewTransformer::new(
                        &mut *self.ast,
                        self.table,
                        session,
                        &mut self.next_context_id,
                    );
                    body.push(transformer.transform_view_to_class(&def, span)?);
                    lowered_views += 1;
                }
                None => body.push(stmt),
            }
        }

        if lowered_views > 0 {
            body.insert(0, self.runtime_import());
        }
        debug!(views = lowered_views, "module transform finished");

        Ok(Module {
            body,
            span: module.span,
        })
    }

    /// `from pyx.runtime import BaseView, Element, el, escape,
    /// fragment, render_child`
    fn runtime_import(&mut self) -> StmtId {
        let module = RUNTIME_MODULE.iter().map(|s| s.to_string()).collect();
        let names = RUNTIME_SYMBOLS
            .iter()
            .map(|symbol| ImportAlias {
                name: vec![symbol.to_string()],
                alias: None,
                span: Span::DUMMY,
            })
            .collect();
        self.ast.import_from(module, names, Span::DUMMY)
    }
}
