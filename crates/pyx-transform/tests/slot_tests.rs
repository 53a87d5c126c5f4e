//! Slot discovery, constructor ordering, composition and slot
//! distribution, and slot misuse errors.

use pyx_ast::{
    Argument, Ast, ClassDef, Element, ExprId, ExprKind, FunctionDef, LiteralValue, Module,
    ParamKind, StmtId, StmtKind, TextPart, TextRun, ViewDef,
};
use pyx_common::Span;
use pyx_resolver::{NullSymbolSource, Resolver};
use pyx_transform::{ModuleTransformer, TransformError};

// =============================================================================
// Fixture builders
// =============================================================================

fn view(ast: &mut Ast, name: &str, params: &[&str], body: Vec<StmtId>) -> StmtId {
    let name_expr = ast.name(name, Span::DUMMY);
    let params = params.iter().map(|p| ast.param(*p, Span::DUMMY)).collect();
    ast.add_stmt(
        StmtKind::ViewDef(ViewDef {
            name: name_expr,
            params,
            body,
        }),
        Span::DUMMY,
    )
}

fn element(ast: &mut Ast, tag: &str, children: Vec<StmtId>) -> StmtId {
    element_with_attrs(ast, tag, vec![], children)
}

fn element_with_attrs(
    ast: &mut Ast,
    tag: &str,
    attributes: Vec<pyx_ast::HtmlAttribute>,
    children: Vec<StmtId>,
) -> StmtId {
    ast.add_stmt(
        StmtKind::Element(Element {
            tag: tag.to_string(),
            tag_span: Span::DUMMY,
            attributes,
            children,
            self_closing: false,
        }),
        Span::DUMMY,
    )
}

fn str_attr(ast: &mut Ast, name: &str, value: &str) -> pyx_ast::HtmlAttribute {
    let value = ast.str_lit(value, Span::DUMMY);
    pyx_ast::HtmlAttribute {
        name: name.to_string(),
        name_span: Span::DUMMY,
        value: Some(value),
        span: Span::DUMMY,
    }
}

/// `<slot/>` or `<slot name="...">fallback</slot>`
fn slot(ast: &mut Ast, name: Option<&str>, fallback: Vec<StmtId>) -> StmtId {
    let attributes = match name {
        Some(name) => vec![str_attr(ast, "name", name)],
        None => vec![],
    };
    element_with_attrs(ast, "slot", attributes, fallback)
}

fn text(ast: &mut Ast, value: &str) -> StmtId {
    ast.add_stmt(
        StmtKind::Text(TextRun {
            parts: vec![TextPart::Text {
                value: value.to_string(),
                span: Span::DUMMY,
            }],
        }),
        Span::DUMMY,
    )
}

/// `view Layout(): <main><slot/></main> <footer><slot name="footer"/></footer>`
fn layout_view(ast: &mut Ast) -> StmtId {
    let default_slot = slot(ast, None, vec![]);
    let main = element(ast, "main", vec![default_slot]);
    let footer_slot = slot(ast, Some("footer"), vec![]);
    let footer = element(ast, "footer", vec![footer_slot]);
    view(ast, "Layout", &[], vec![main, footer])
}

fn lower(ast: &mut Ast, body: Vec<StmtId>) -> Result<Module, TransformError> {
    let module = Module {
        body,
        span: Span::DUMMY,
    };
    let table = Resolver::new(ast, &NullSymbolSource).resolve(&module);
    assert!(!table.failed(), "resolution failed: {:?}", table.errors);
    ModuleTransformer::new(ast, &table).transform_module(&module)
}

// =============================================================================
// Inspection helpers
// =============================================================================

fn as_class<'a>(ast: &'a Ast, id: StmtId) -> &'a ClassDef {
    match &ast.stmt(id).kind {
        StmtKind::ClassDef(def) => def,
        other => panic!("expected class, got {other:?}"),
    }
}

fn as_function<'a>(ast: &'a Ast, id: StmtId) -> &'a FunctionDef {
    match &ast.stmt(id).kind {
        StmtKind::FunctionDef(def) => def,
        other => panic!("expected function, got {other:?}"),
    }
}

fn return_value(ast: &Ast, id: StmtId) -> ExprId {
    match &ast.stmt(id).kind {
        StmtKind::Return(Some(value)) => *value,
        other => panic!("expected return with value, got {other:?}"),
    }
}

fn call_parts<'a>(ast: &'a Ast, expr: ExprId) -> (&'a str, &'a [Argument]) {
    match &ast.expr(expr).kind {
        ExprKind::Call { callee, args } => {
            let name = ast.name_text(*callee).expect("callee is a name");
            (name, args)
        }
        other => panic!("expected call, got {other:?}"),
    }
}

fn param_name<'a>(ast: &'a Ast, function: &FunctionDef, index: usize) -> Option<&'a str> {
    function.params[index].name.and_then(|n| ast.name_text(n))
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn slot_parameters_follow_declared_params_default_first() {
    // view Panel(title): <h1><slot name="actions"/></h1> <div><slot/></div>
    //
    // `children` comes immediately after declared parameters, before
    // any named slot, even though the named slot appears first in
    // source.
    let mut ast = Ast::new();
    let actions_slot = slot(&mut ast, Some("actions"), vec![]);
    let h1 = element(&mut ast, "h1", vec![actions_slot]);
    let default_slot = slot(&mut ast, None, vec![]);
    let div = element(&mut ast, "div", vec![default_slot]);
    let panel = view(&mut ast, "Panel", &["title"], vec![h1, div]);

    let module = lower(&mut ast, vec![panel]).expect("transform succeeds");
    let class = as_class(&ast, module.body[1]);
    let init = as_function(&ast, class.body[0]);

    // self, title, *, children, actions
    assert_eq!(init.params.len(), 5);
    assert_eq!(param_name(&ast, init, 0), Some("self"));
    assert_eq!(param_name(&ast, init, 1), Some("title"));
    assert_eq!(init.params[2].kind, ParamKind::Star);
    assert_eq!(param_name(&ast, init, 3), Some("children"));
    assert_eq!(param_name(&ast, init, 4), Some("actions"));

    // Assignments in the same order after super().__init__().
    assert_eq!(init.body.len(), 4);
}

#[test]
fn named_slots_keep_first_seen_order() {
    let mut ast = Ast::new();
    let header_slot = slot(&mut ast, Some("header"), vec![]);
    let footer_slot = slot(&mut ast, Some("footer"), vec![]);
    let default_slot = slot(&mut ast, None, vec![]);
    let div = element(&mut ast, "div", vec![header_slot, default_slot, footer_slot]);
    let card = view(&mut ast, "Card", &[], vec![div]);

    let module = lower(&mut ast, vec![card]).expect("transform succeeds");
    let class = as_class(&ast, module.body[1]);
    let init = as_function(&ast, class.body[0]);

    // self, *, children, header, footer
    assert_eq!(param_name(&ast, init, 2), Some("children"));
    assert_eq!(param_name(&ast, init, 3), Some("header"));
    assert_eq!(param_name(&ast, init, 4), Some("footer"));
}

#[test]
fn composition_distributes_children_across_slots() {
    // view App(): <Layout><p slot="footer">Hi</p><p>Body</p></Layout>
    let mut ast = Ast::new();
    let layout = layout_view(&mut ast);

    let hi = text(&mut ast, "Hi");
    let footer_attr = str_attr(&mut ast, "slot", "footer");
    let footer_p = element_with_attrs(&mut ast, "p", vec![footer_attr], vec![hi]);
    let body_text = text(&mut ast, "Body");
    let body_p = element(&mut ast, "p", vec![body_text]);
    let usage = element(&mut ast, "Layout", vec![footer_p, body_p]);
    let app = view(&mut ast, "App", &[], vec![usage]);

    let module = lower(&mut ast, vec![layout, app]).expect("transform succeeds");
    let app_class = as_class(&ast, module.body[2]);
    let render = as_function(&ast, app_class.body[1]);

    // Fast path: a single return of the composition call.
    assert_eq!(render.body.len(), 1);
    let returned = return_value(&ast, render.body[0]);
    let (callee, args) = call_parts(&ast, returned);
    assert_eq!(callee, "Layout");

    // children first, then footer (target declaration order).
    assert_eq!(args.len(), 2);
    assert_eq!(args[0].name.as_deref(), Some("children"));
    assert_eq!(args[1].name.as_deref(), Some("footer"));

    // children = el("p", "Body")
    let (el, el_args) = call_parts(&ast, args[0].value);
    assert_eq!(el, "el");
    assert!(matches!(
        &ast.expr(el_args[0].value).kind,
        ExprKind::Literal(LiteralValue::Str(tag)) if tag == "p"
    ));

    // footer = el("p", "Hi") with the slot attribute stripped.
    let (el, el_args) = call_parts(&ast, args[1].value);
    assert_eq!(el, "el");
    assert_eq!(el_args.len(), 2, "slot attribute must be stripped");
}

#[test]
fn matching_attributes_become_constructor_kwargs() {
    // view Card(title): <div><slot/></div>
    // view App(): <Card title="Hello" badge="x"/>
    let mut ast = Ast::new();
    let default_slot = slot(&mut ast, None, vec![]);
    let div = element(&mut ast, "div", vec![default_slot]);
    let card = view(&mut ast, "Card", &["title"], vec![div]);

    let title = str_attr(&mut ast, "title", "Hello");
    let badge = str_attr(&mut ast, "badge", "x");
    let usage = element_with_attrs(&mut ast, "Card", vec![title, badge], vec![]);
    let app = view(&mut ast, "App", &[], vec![usage]);

    let module = lower(&mut ast, vec![card, app]).expect("transform succeeds");
    let app_class = as_class(&ast, module.body[2]);
    let render = as_function(&ast, app_class.body[1]);
    let returned = return_value(&ast, render.body[0]);
    let (callee, args) = call_parts(&ast, returned);
    assert_eq!(callee, "Card");

    // `badge` does not match a declared parameter and is dropped;
    // `title` is passed through unescaped.
    assert_eq!(args.len(), 1);
    assert_eq!(args[0].name.as_deref(), Some("title"));
    assert!(matches!(
        &ast.expr(args[0].value).kind,
        ExprKind::Literal(LiteralValue::Str(value)) if value == "Hello"
    ));
}

#[test]
fn slot_placeholder_renders_provided_child_or_fallback() {
    // view Box(): <slot>fallback</slot>
    let mut ast = Ast::new();
    let fallback = text(&mut ast, "fallback");
    let slot_el = slot(&mut ast, None, vec![fallback]);
    let boxed = view(&mut ast, "Box", &[], vec![slot_el]);

    let module = lower(&mut ast, vec![boxed]).expect("transform succeeds");
    let class = as_class(&ast, module.body[1]);
    let render = as_function(&ast, class.body[1]);
    let returned = return_value(&ast, render.body[0]);

    let ExprKind::Ternary {
        condition,
        if_true,
        if_false,
    } = &ast.expr(returned).kind
    else {
        panic!("expected conditional slot rendering");
    };

    // self.children is not None
    let ExprKind::Binary { left, op, right } = &ast.expr(*condition).kind else {
        panic!("expected is-not comparison");
    };
    assert_eq!(*op, pyx_ast::BinOp::IsNot);
    assert!(matches!(
        &ast.expr(*left).kind,
        ExprKind::Attribute { attr, .. } if attr == "children"
    ));
    assert!(matches!(
        &ast.expr(*right).kind,
        ExprKind::Literal(LiteralValue::None)
    ));

    // render_child(self.children)
    let (render_child, _) = call_parts(&ast, *if_true);
    assert_eq!(render_child, "render_child");

    // fallback text
    assert!(matches!(
        &ast.expr(*if_false).kind,
        ExprKind::Literal(LiteralValue::Str(value)) if value == "fallback"
    ));
}

#[test]
fn slot_attribute_nested_in_an_element_is_rejected() {
    // <Layout><div><p slot="footer">Hi</p></div></Layout>
    let mut ast = Ast::new();
    let layout = layout_view(&mut ast);

    let hi = text(&mut ast, "Hi");
    let footer_attr = str_attr(&mut ast, "slot", "footer");
    let nested_p = element_with_attrs(&mut ast, "p", vec![footer_attr], vec![hi]);
    let wrapper = element(&mut ast, "div", vec![nested_p]);
    let usage = element(&mut ast, "Layout", vec![wrapper]);
    let app = view(&mut ast, "App", &[], vec![usage]);

    let error = lower(&mut ast, vec![layout, app]).expect_err("must fail");
    assert!(matches!(
        error,
        TransformError::MisplacedSlotAttribute { .. }
    ));
}

#[test]
fn slot_attribute_inside_control_flow_is_rejected() {
    // <Layout>if cond: <p slot="footer"/></Layout>
    let mut ast = Ast::new();
    let layout = layout_view(&mut ast);

    let footer_attr = str_attr(&mut ast, "slot", "footer");
    let p = element_with_attrs(&mut ast, "p", vec![footer_attr], vec![]);
    let cond = ast.bool_lit(true, Span::DUMMY);
    let branch = ast.add_stmt(
        StmtKind::If {
            condition: cond,
            body: vec![p],
            orelse: vec![],
        },
        Span::DUMMY,
    );
    let usage = element(&mut ast, "Layout", vec![branch]);
    let app = view(&mut ast, "App", &[], vec![usage]);

    let error = lower(&mut ast, vec![layout, app]).expect_err("must fail");
    assert!(matches!(
        error,
        TransformError::MisplacedSlotAttribute { .. }
    ));
}

#[test]
fn children_for_a_slotless_view_are_rejected() {
    // view Plain(): <div/>
    // view App(): <Plain><p/></Plain>
    let mut ast = Ast::new();
    let div = element(&mut ast, "div", vec![]);
    let plain = view(&mut ast, "Plain", &[], vec![div]);
    let p = element(&mut ast, "p", vec![]);
    let usage = element(&mut ast, "Plain", vec![p]);
    let app = view(&mut ast, "App", &[], vec![usage]);

    let error = lower(&mut ast, vec![plain, app]).expect_err("must fail");
    match error {
        TransformError::UnexpectedChildren { view, .. } => assert_eq!(view, "Plain"),
        other => panic!("expected unexpected-children error, got {other}"),
    }
}

#[test]
fn unknown_slot_name_is_rejected() {
    // Layout declares `footer` and the default slot only.
    let mut ast = Ast::new();
    let layout = layout_view(&mut ast);

    let sidebar_attr = str_attr(&mut ast, "slot", "sidebar");
    let p = element_with_attrs(&mut ast, "p", vec![sidebar_attr], vec![]);
    let usage = element(&mut ast, "Layout", vec![p]);
    let app = view(&mut ast, "App", &[], vec![usage]);

    let error = lower(&mut ast, vec![layout, app]).expect_err("must fail");
    match error {
        TransformError::UnknownSlot { view, slot, .. } => {
            assert_eq!(view, "Layout");
            assert_eq!(slot, "sidebar");
        }
        other => panic!("expected unknown-slot error, got {other}"),
    }
}

#[test]
fn complex_slot_content_is_hoisted_into_a_collection() {
    // view App():
    //     <Layout>
    //         for item in items: <p>{item}</p>
    //     </Layout>
    let mut ast = Ast::new();
    let layout = layout_view(&mut ast);

    let item_ref = ast.name("item", Span::DUMMY);
    let interp = ast.add_stmt(
        StmtKind::Text(TextRun {
            parts: vec![TextPart::Interpolation {
                value: item_ref,
                span: Span::DUMMY,
            }],
        }),
        Span::DUMMY,
    );
    let p = element(&mut ast, "p", vec![interp]);
    let target = ast.name("item", Span::DUMMY);
    let items = ast.name("items", Span::DUMMY);
    let loop_stmt = ast.add_stmt(
        StmtKind::For {
            target,
            iter: items,
            body: vec![p],
            orelse: vec![],
            is_async: false,
        },
        Span::DUMMY,
    );
    let usage = element(&mut ast, "Layout", vec![loop_stmt]);
    let app = view(&mut ast, "App", &[], vec![usage]);

    let module = lower(&mut ast, vec![layout, app]).expect("transform succeeds");
    let app_class = as_class(&ast, module.body[2]);
    let render = as_function(&ast, app_class.body[1]);

    // Control flow in the subtree: hierarchical mode. View collection,
    // hoisted slot collection, the loop, the append of the composition,
    // and the closing fragment return.
    assert_eq!(render.body.len(), 5);
    let view_collection = match &ast.stmt(render.body[0]).kind {
        StmtKind::Assign { targets, .. } => {
            let name = ast.name_text(targets[0]).expect("collection name");
            assert!(name.starts_with("_view_children_"), "got {name}");
            name.to_string()
        }
        other => panic!("expected view collection, got {other:?}"),
    };
    let slot_collection = match &ast.stmt(render.body[1]).kind {
        StmtKind::Assign { targets, .. } => {
            let name = ast.name_text(targets[0]).expect("collection name");
            assert!(name.starts_with("_slot_children_"), "got {name}");
            name.to_string()
        }
        other => panic!("expected slot collection, got {other:?}"),
    };
    assert!(matches!(
        &ast.stmt(render.body[2]).kind,
        StmtKind::For { .. }
    ));

    // The composition is appended into the view collection with
    // children=fragment(slot collection).
    let StmtKind::Expr(append_call) = ast.stmt(render.body[3]).kind else {
        panic!("expected append statement");
    };
    let ExprKind::Call { callee, args } = &ast.expr(append_call).kind else {
        panic!("expected call");
    };
    let ExprKind::Attribute { object, attr, .. } = &ast.expr(*callee).kind else {
        panic!("expected method call");
    };
    assert_eq!(ast.name_text(*object), Some(view_collection.as_str()));
    assert_eq!(attr, "append");
    let (layout_call, layout_args) = call_parts(&ast, args[0].value);
    assert_eq!(layout_call, "Layout");
    assert_eq!(layout_args[0].name.as_deref(), Some("children"));
    let (fragment, fragment_args) = call_parts(&ast, layout_args[0].value);
    assert_eq!(fragment, "fragment");
    assert_eq!(
        ast.name_text(fragment_args[0].value),
        Some(slot_collection.as_str())
    );

    let returned = return_value(&ast, render.body[4]);
    let (callee, args) = call_parts(&ast, returned);
    assert_eq!(callee, "fragment");
    assert_eq!(ast.name_text(args[0].value), Some(view_collection.as_str()));
}
