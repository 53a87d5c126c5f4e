//! View definitions, view parameters, and element-to-view binding.

use pyx_ast::{
    Ast, Element, ExprId, Module, StmtId, StmtKind, TextPart, TextRun, ViewDef,
};
use pyx_common::Span;
use pyx_resolver::{
    ExternalSymbol, NullSymbolSource, ResolutionTable, Resolver, SymbolSource, ViewBinding,
    ViewSignature,
};

fn resolve(ast: &Ast, body: Vec<StmtId>) -> ResolutionTable {
    let module = Module {
        body,
        span: Span::DUMMY,
    };
    Resolver::new(ast, &NullSymbolSource).resolve(&module)
}

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
    ast.add_stmt(
        StmtKind::Element(Element {
            tag: tag.to_string(),
            tag_span: Span::DUMMY,
            attributes: vec![],
            children,
            self_closing: false,
        }),
        Span::DUMMY,
    )
}

fn interpolation(ast: &mut Ast, name: &str) -> (StmtId, ExprId) {
    let expr = ast.name(name, Span::DUMMY);
    let text = ast.add_stmt(
        StmtKind::Text(TextRun {
            parts: vec![TextPart::Interpolation {
                value: expr,
                span: Span::DUMMY,
            }],
        }),
        Span::DUMMY,
    );
    (text, expr)
}

#[test]
fn view_parameters_are_flagged_and_registered() {
    // view Card(title): <div>{title}</div>
    let mut ast = Ast::new();
    let (text, title_ref) = interpolation(&mut ast, "title");
    let div = element(&mut ast, "div", vec![text]);
    let card = view(&mut ast, "Card", &["title"], vec![div]);

    let table = resolve(&ast, vec![card]);

    assert!(table.errors.is_empty());
    assert!(table.is_view_parameter(title_ref));
    let registered = table.view_params.get("title").expect("registry entry");
    assert_eq!(*registered, table.name_refs[&title_ref]);
    assert!(table.views.contains_key("Card"));
}

#[test]
fn capitalized_element_binds_to_local_view() {
    // view Card(title): <div/>
    // view Page():     <Card/>
    let mut ast = Ast::new();
    let div = element(&mut ast, "div", vec![]);
    let card = view(&mut ast, "Card", &["title"], vec![div]);
    let usage = element(&mut ast, "Card", vec![]);
    let page = view(&mut ast, "Page", &[], vec![usage]);

    let table = resolve(&ast, vec![card, page]);

    match table.view_for_element(usage) {
        Some(ViewBinding::Local(def)) => assert_eq!(*def, card),
        other => panic!("expected local view binding, got {other:?}"),
    }
}

#[test]
fn lowercase_tags_never_bind() {
    // A view named like an HTML tag must not capture literal markup.
    let mut ast = Ast::new();
    let body = element(&mut ast, "span", vec![]);
    let card = view(&mut ast, "Card", &[], vec![body]);
    let usage = element(&mut ast, "card", vec![]);
    let page = view(&mut ast, "Page", &[], vec![usage]);

    let table = resolve(&ast, vec![card, page]);

    assert!(table.view_for_element(usage).is_none());
}

#[test]
fn unresolved_capitalized_tag_stays_unbound_without_error() {
    // Visit-time binding: a sibling defined later does not resolve.
    let mut ast = Ast::new();
    let usage = element(&mut ast, "Card", vec![]);
    let page = view(&mut ast, "Page", &[], vec![usage]);
    let div = element(&mut ast, "div", vec![]);
    let card = view(&mut ast, "Card", &[], vec![div]);

    let table = resolve(&ast, vec![page, card]);

    assert!(table.view_for_element(usage).is_none());
    assert!(table.errors.is_empty());
}

struct OneView;

impl SymbolSource for OneView {
    fn lookup(&self, module: &str, name: &str) -> Option<ExternalSymbol> {
        (module == "ui.cards" && name == "Card").then(|| {
            ExternalSymbol::View(ViewSignature {
                name: "Card".to_string(),
                params: vec!["title".to_string()],
                slots: vec![String::new()],
            })
        })
    }
}

#[test]
fn imported_view_binds_through_symbol_source() {
    // from ui.cards import Card
    // view Page(): <Card/>
    let mut ast = Ast::new();
    let import = ast.import_from(
        vec!["ui".to_string(), "cards".to_string()],
        vec![pyx_ast::ImportAlias {
            name: vec!["Card".to_string()],
            alias: None,
            span: Span::DUMMY,
        }],
        Span::DUMMY,
    );
    let usage = element(&mut ast, "Card", vec![]);
    let page = view(&mut ast, "Page", &[], vec![usage]);

    let module = Module {
        body: vec![import, page],
        span: Span::DUMMY,
    };
    let table = Resolver::new(&ast, &OneView).resolve(&module);

    match table.view_for_element(usage) {
        Some(ViewBinding::External(signature)) => {
            assert_eq!(signature.name, "Card");
            assert_eq!(signature.params, vec!["title".to_string()]);
            assert!(signature.has_default_slot());
        }
        other => panic!("expected external view binding, got {other:?}"),
    }
}

#[test]
fn element_attribute_expressions_are_resolved() {
    // view Badge(label): <span title={label}/>
    let mut ast = Ast::new();
    let label_ref = ast.name("label", Span::DUMMY);
    let span_el = ast.add_stmt(
        StmtKind::Element(Element {
            tag: "span".to_string(),
            tag_span: Span::DUMMY,
            attributes: vec![pyx_ast::HtmlAttribute {
                name: "title".to_string(),
                name_span: Span::DUMMY,
                value: Some(label_ref),
                span: Span::DUMMY,
            }],
            children: vec![],
            self_closing: true,
        }),
        Span::DUMMY,
    );
    let badge = view(&mut ast, "Badge", &["label"], vec![span_el]);

    let table = resolve(&ast, vec![badge]);

    assert!(table.errors.is_empty());
    assert!(table.is_view_parameter(label_ref));
}
