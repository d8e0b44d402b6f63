//! 渲染测试：渲染树结构、pre-content、原生宏、缓存拼接

use std::rc::Rc;

use crate::error::RuntimeError;
use crate::runtime::{ComponentRegistry, Document, Session, Value};
use crate::script::ClosureEngine;

#[test]
fn test_render_tree_mirrors_structure() {
    let mut engine = ClosureEngine::new();
    let mut doc = Document::compile(
        r#"<tower eid="root"><text eid="a">one</text><text eid="b">two</text></tower>"#,
        ComponentRegistry::new(),
        &mut engine,
    )
    .unwrap();

    let tree = crate::renderer::render(&mut doc, &mut engine).unwrap();
    assert_eq!(tree.tag, "tower");
    assert_eq!(tree.eid.as_deref(), Some("root"));
    assert_eq!(tree.children.len(), 2);
    assert_eq!(tree.children[0].text[0].content, "one");
    assert_eq!(tree.children[1].text[0].content, "two");
}

#[test]
fn test_render_without_changes_is_idempotent() {
    let mut engine = ClosureEngine::new();
    engine.on_source("declare", |host, scope, _| {
        host.set(scope, "n", Value::Number(7.0));
        Ok(Value::Nil)
    });
    let mut doc = Document::compile(
        concat!(
            "<page><script>declare</script>",
            r#"<box eid="card">count: $n</box></page>"#,
        ),
        ComponentRegistry::new(),
        &mut engine,
    )
    .unwrap();

    // 没有 pre-content、状态不变时，两趟渲染产出完全相同
    let first = crate::renderer::render(&mut doc, &mut engine).unwrap();
    let second = crate::renderer::render(&mut doc, &mut engine).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_render_tree_serializes_to_json() {
    let mut engine = ClosureEngine::new();
    let mut doc = Document::compile(
        r#"<page><text>hi</text></page>"#,
        ComponentRegistry::new(),
        &mut engine,
    )
    .unwrap();

    let tree = crate::renderer::render(&mut doc, &mut engine).unwrap();
    let json = serde_json::to_value(&tree).unwrap();
    assert_eq!(json["tag"], "page");
    assert_eq!(json["children"][0]["text"][0]["content"], "hi");
    // 内部的 arena 下标不泄漏到序列化输出
    assert!(json.get("node").is_none());
}

#[test]
fn test_pre_content_runs_every_pass_before_children() {
    let mut engine = ClosureEngine::new();
    engine.on_source("tick", |host, scope, _| {
        let n = host.get(scope, "n").as_number().unwrap_or(0.0);
        host.set(scope, "n", Value::Number(n + 1.0));
        Ok(Value::Nil)
    });
    engine.on_source("start", |host, scope, _| {
        host.set(scope, "n", Value::Number(0.0));
        Ok(Value::Nil)
    });

    let doc = Document::compile(
        concat!(
            "<page><script>start</script>",
            r#"<box pre-content="tick" eid="clock">n = $n</box></page>"#,
        ),
        ComponentRegistry::new(),
        &mut engine,
    )
    .unwrap();

    let mut session = Session::new(doc, Box::new(engine));

    let first = session.render().unwrap();
    assert_eq!(find_eid(&first, "clock").unwrap().text[0].content, "n = 1");

    // 带 pre-content 的文档每趟整树重渲染
    let second = session.render().unwrap();
    assert_eq!(find_eid(&second, "clock").unwrap().text[0].content, "n = 2");
}

#[test]
fn test_remote_pre_content_is_rejected_at_compile() {
    let mut engine = ClosureEngine::new();
    let err = Document::compile(
        r#"<page><box pre-content=":GET /x; SWAP IN self">x</box></page>"#,
        ComponentRegistry::new(),
        &mut engine,
    )
    .unwrap_err();
    assert!(matches!(err, crate::CompileError::MalformedDocument(_)));
}

#[test]
fn test_native_macro_expands_in_text() {
    let mut engine = ClosureEngine::new();
    let mut doc = Document::compile(
        "<page><text>[!upper(abc)]</text></page>",
        ComponentRegistry::new(),
        &mut engine,
    )
    .unwrap();

    doc.define_native_macro("upper", Rc::new(|args| Ok(args[0].to_uppercase())));

    let tree = crate::renderer::render(&mut doc, &mut engine).unwrap();
    assert_eq!(tree.children[0].text[0].content, "ABC");
}

#[test]
fn test_unknown_macro_fails_render() {
    let mut engine = ClosureEngine::new();
    let mut doc = Document::compile(
        "<page><text>[!nope()]</text></page>",
        ComponentRegistry::new(),
        &mut engine,
    )
    .unwrap();

    let err = crate::renderer::render(&mut doc, &mut engine).unwrap_err();
    assert!(matches!(err, RuntimeError::Compile(crate::CompileError::UnknownMacro(_))));
}

#[test]
fn test_script_defined_macro_expands_in_scope() {
    let mut engine = ClosureEngine::new();
    let double = engine.func(|_host, _scope, args| {
        let n = args.first().and_then(Value::as_number).unwrap_or(0.0);
        Ok(Value::Number(n * 2.0))
    });
    engine.on_source("register", move |host, scope, _| {
        host.define_macro(scope, "double", double);
        Ok(Value::Nil)
    });

    let mut doc = Document::compile(
        "<page><script>register</script><text>[!double(21)]</text></page>",
        ComponentRegistry::new(),
        &mut engine,
    )
    .unwrap();

    let tree = crate::renderer::render(&mut doc, &mut engine).unwrap();
    assert_eq!(tree.children[0].text[0].content, "42");
}

#[test]
fn test_builtin_and_script_aliases() {
    let mut engine = ClosureEngine::new();
    engine.on_source("register_alias", |host, _scope, _| {
        host.define_alias("shout", "bold");
        Ok(Value::Nil)
    });

    let mut doc = Document::compile(
        "<page><script>register_alias</script><text>[b]x[/][shout]y[/]</text></page>",
        ComponentRegistry::new(),
        &mut engine,
    )
    .unwrap();

    let tree = crate::renderer::render(&mut doc, &mut engine).unwrap();
    // 两段都解析成 bold，相邻同样式合并成一个跨度
    let spans = &tree.children[0].text;
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].content, "xy");
    assert_eq!(spans[0].styles, vec!["bold".to_string()]);
}

#[test]
fn test_dirty_subtree_rerenders_after_change() {
    let mut engine = ClosureEngine::new();
    engine.on_source("declare_label", |host, scope, _| {
        host.set(scope, "label", Value::Str("before".to_string()));
        Ok(Value::Nil)
    });
    engine.on_source("rename", |host, _scope, _| {
        // 显式寻址卡片的作用域，跨作用域写
        let target = host
            .scope_by_eid("card")
            .ok_or_else(|| crate::ScriptError::new("card is gone"))?;
        host.set(target, "label", Value::Str("after".to_string()));
        Ok(Value::Nil)
    });

    let doc = Document::compile(
        concat!(
            "<page>",
            r#"<box eid="card"><script>declare_label</script>$label</box>"#,
            r#"<button eid="b" on-submit="rename">go</button>"#,
            "</page>",
        ),
        ComponentRegistry::new(),
        &mut engine,
    )
    .unwrap();

    let mut session = Session::new(doc, Box::new(engine));

    let first = session.render().unwrap();
    assert_eq!(find_eid(&first, "card").unwrap().text[0].content, "before");

    // 变更只弄脏卡片实例，拼接回缓存树后读到新值
    session.submit("b").unwrap();
    let second = session.render().unwrap();
    assert_eq!(find_eid(&second, "card").unwrap().text[0].content, "after");
}

fn find_eid<'a>(
    tree: &'a crate::renderer::RenderNode,
    eid: &str,
) -> Option<&'a crate::renderer::RenderNode> {
    if tree.eid.as_deref() == Some(eid) {
        return Some(tree);
    }
    tree.children.iter().find_map(|child| find_eid(child, eid))
}
