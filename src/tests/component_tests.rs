//! 组件展开测试：参数、槽位、命名空间、递归上限

use std::collections::HashMap;

use crate::error::CompileError;
use crate::parser::markup::{parse, Node};
use crate::runtime::component::{instantiate, ComponentDefinition, ComponentRegistry};
use crate::runtime::{Document, Value};
use crate::script::ClosureEngine;

fn definition(source: &str) -> ComponentDefinition {
    let nodes = parse(source).unwrap();
    ComponentDefinition::from_node(nodes[0].as_element().unwrap(), None).unwrap()
}

#[test]
fn test_params_substitute_into_attrs_and_text() {
    let def = definition(concat!(
        r#"<component name="badge" label="'x'" width="10">"#,
        r#"<box width="$width"><text>[$label]</text></box>"#,
        "</component>",
    ));

    let mut params = HashMap::new();
    params.insert("label".to_string(), "hi".to_string());
    params.insert("width".to_string(), "20".to_string());

    let expanded = instantiate(&def, &params, &[]);
    assert_eq!(expanded.attr("width"), Some("20"));
    match &expanded.children[0].as_element().unwrap().children[0] {
        Node::Text(text) => assert_eq!(text, "[hi]"),
        other => panic!("expected text, got {:?}", other),
    }
}

#[test]
fn test_longer_param_name_wins_over_prefix() {
    let def = definition(concat!(
        r#"<component name="pair" value="'1'" value2="'2'">"#,
        "<text>$value2/$value</text>",
        "</component>",
    ));

    let mut params = HashMap::new();
    params.insert("value".to_string(), "a".to_string());
    params.insert("value2".to_string(), "b".to_string());

    let expanded = instantiate(&def, &params, &[]);
    match &expanded.children[0] {
        Node::Text(text) => assert_eq!(text, "b/a"),
        other => panic!("expected text, got {:?}", other),
    }
}

#[test]
fn test_slot_receives_caller_children() {
    let def = definition(r#"<component name="card"><box><slot/></box></component>"#);
    let children = parse("<text>inner</text>").unwrap();

    let expanded = instantiate(&def, &HashMap::new(), &children);
    let inner = expanded.children[0].as_element().unwrap();
    assert_eq!(inner.tag, "text");
}

#[test]
fn test_slot_removed_when_no_children() {
    let def = definition(r#"<component name="card"><box><slot/></box></component>"#);
    let expanded = instantiate(&def, &HashMap::new(), &[]);
    assert!(expanded.children.is_empty());
}

#[test]
fn test_component_requires_single_template() {
    let nodes = parse(r#"<component name="bad"><a></a><b></b></component>"#).unwrap();
    let err = ComponentDefinition::from_node(nodes[0].as_element().unwrap(), None).unwrap_err();
    assert!(matches!(err, CompileError::MalformedDocument(_)));
}

#[test]
fn test_duplicate_name_in_same_namespace_rejected() {
    let mut registry = ComponentRegistry::new();
    registry
        .register(definition(r#"<component name="card"><box></box></component>"#))
        .unwrap();
    let err = registry
        .register(definition(r#"<component name="card"><text>x</text></component>"#))
        .unwrap_err();
    assert_eq!(err, CompileError::DuplicateComponentName("card".to_string()));
}

#[test]
fn test_same_name_in_different_namespaces_coexists() {
    let mut registry = ComponentRegistry::new();
    let library =
        parse(r#"<complib namespace="ui"><component name="card"><box></box></component></complib>"#)
            .unwrap();
    registry.register_library(library[0].as_element().unwrap()).unwrap();
    registry
        .register(definition(r#"<component name="card"><text>x</text></component>"#))
        .unwrap();

    assert_eq!(registry.resolve("ui.card", None).unwrap().template.tag, "box");
    assert_eq!(registry.resolve("card", None).unwrap().template.tag, "text");
}

#[test]
fn test_library_namespace_resolves_first_for_siblings() {
    let mut registry = ComponentRegistry::new();
    let library = parse(concat!(
        r#"<complib namespace="ui">"#,
        r#"<component name="icon"><text>*</text></component>"#,
        "</complib>",
    ))
    .unwrap();
    registry.register_library(library[0].as_element().unwrap()).unwrap();
    registry
        .register(definition(r#"<component name="icon"><text>#</text></component>"#))
        .unwrap();

    // 库模板内部的未加前缀引用命中库自己的命名空间
    let inside = registry.resolve("icon", Some("ui")).unwrap();
    match &inside.template.children[0] {
        Node::Text(text) => assert_eq!(text, "*"),
        other => panic!("expected text, got {:?}", other),
    }

    // 库外的未加前缀引用落到全局定义
    let outside = registry.resolve("icon", None).unwrap();
    match &outside.template.children[0] {
        Node::Text(text) => assert_eq!(text, "#"),
        other => panic!("expected text, got {:?}", other),
    }
}

#[test]
fn test_component_expands_inside_document() {
    let mut engine = ClosureEngine::new();
    let doc = Document::compile(
        concat!(
            r#"<component name="greeting" who="'world'">"#,
            "<text eid=\"g\">hello $who</text>",
            "</component>",
            r#"<page><greeting who="rust"/></page>"#,
        ),
        ComponentRegistry::new(),
        &mut engine,
    )
    .unwrap();

    let id = doc.by_eid("g").unwrap();
    assert_eq!(doc.node(id).tag(), "text");
}

#[test]
fn test_default_param_expression_is_evaluated() {
    let mut engine = ClosureEngine::new();
    let doc = Document::compile(
        concat!(
            r#"<component name="counter" initial="2">"#,
            r#"<field name="count" value="$initial"></field>"#,
            "</component>",
            r#"<page><counter eid="c"/></page>"#,
        ),
        ComponentRegistry::new(),
        &mut engine,
    )
    .unwrap();

    let id = doc.by_eid("c").unwrap();
    let scope = doc.node(id).scope;
    assert_eq!(doc.scopes.lookup(scope, "count"), Some(Value::Number(2.0)));
}

#[test]
fn test_recursive_component_hits_depth_bound() {
    let mut engine = ClosureEngine::new();
    let err = Document::compile(
        concat!(
            r#"<component name="loop"><box><loop/></box></component>"#,
            "<page><loop/></page>",
        ),
        ComponentRegistry::new(),
        &mut engine,
    )
    .unwrap_err();

    assert!(matches!(err, CompileError::RecursiveComponent { .. }));
}

#[test]
fn test_duplicate_eid_rejected() {
    let mut engine = ClosureEngine::new();
    let err = Document::compile(
        r#"<page><text eid="x">a</text><text eid="x">b</text></page>"#,
        ComponentRegistry::new(),
        &mut engine,
    )
    .unwrap_err();

    assert_eq!(err, CompileError::DuplicateEid("x".to_string()));
}

#[test]
fn test_document_debug_prints_summary() {
    let mut engine = ClosureEngine::new();
    let doc = Document::compile(
        r#"<page><text eid="x">a</text></page>"#,
        ComponentRegistry::new(),
        &mut engine,
    )
    .unwrap();

    // 宏表装的是闭包，Debug 输出的是摘要而不是逐字段内容
    let printed = format!("{:?}", doc);
    assert!(printed.contains("Document"));
    assert!(printed.contains("nodes"));
}
