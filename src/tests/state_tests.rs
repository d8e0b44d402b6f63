//! 状态引擎测试：两阶段初始化、写合并、遮蔽、回调链上限

use crate::error::RuntimeError;
use crate::runtime::scope::ScopeArena;
use crate::runtime::{ComponentRegistry, Document, Session, Value};
use crate::script::{ClosureEngine, ScriptHost};

#[test]
fn test_lookup_walks_parent_chain() {
    let mut arena = ScopeArena::new();
    let root = arena.create(None);
    let child = arena.create(Some(root));

    arena.declare(root, "theme", Value::Str("dark".to_string()));
    assert_eq!(arena.lookup(child, "theme"), Some(Value::Str("dark".to_string())));
    assert_eq!(arena.lookup(child, "missing"), None);
}

#[test]
fn test_child_write_shadows_parent() {
    let mut arena = ScopeArena::new();
    let root = arena.create(None);
    let child = arena.create(Some(root));

    arena.declare(root, "v", Value::Number(1.0));
    arena.set(child, "v", Value::Number(2.0));

    assert_eq!(arena.lookup(child, "v"), Some(Value::Number(2.0)));
    assert_eq!(arena.lookup(root, "v"), Some(Value::Number(1.0)));
}

#[test]
fn test_writes_coalesce_within_a_turn() {
    let mut arena = ScopeArena::new();
    let scope = arena.create(None);
    arena.declare(scope, "x", Value::Number(5.0));

    arena.begin_turn();
    arena.set(scope, "x", Value::Number(7.0));
    arena.set(scope, "x", Value::Number(9.0));

    let changes = arena.take_changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].2, Value::Number(9.0));
}

#[test]
fn test_reverted_write_is_not_a_change() {
    let mut arena = ScopeArena::new();
    let scope = arena.create(None);
    arena.declare(scope, "x", Value::Number(5.0));

    arena.begin_turn();
    arena.set(scope, "x", Value::Number(7.0));
    arena.set(scope, "x", Value::Number(5.0));

    assert!(arena.take_changes().is_empty());
}

#[test]
fn test_destroyed_scope_drops_pending_changes() {
    let mut arena = ScopeArena::new();
    let keep = arena.create(None);
    let gone = arena.create(None);

    arena.begin_turn();
    arena.set(keep, "a", Value::Number(1.0));
    arena.set(gone, "b", Value::Number(2.0));
    arena.destroy(gone);

    let changes = arena.take_changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].0, keep);
}

#[test]
fn test_declares_run_before_all_inits() {
    let mut engine = ClosureEngine::new();

    // init 回调读一个在后面的脚本里才声明的变量
    let probe = engine.func(|host, scope, _| {
        let late = host.get(scope, "late");
        host.set(scope, "seen", late);
        Ok(Value::Nil)
    });
    engine.on_source("register_probe", move |host, scope, _| {
        host.on_init(scope, probe);
        Ok(Value::Nil)
    });
    engine.on_source("declare_late", |host, scope, _| {
        host.set(scope, "late", Value::Number(7.0));
        Ok(Value::Nil)
    });

    let doc = Document::compile(
        concat!(
            "<page><box eid=\"b\"><script>register_probe</script></box></page>",
            "<script>declare_late</script>",
        ),
        ComponentRegistry::new(),
        &mut engine,
    )
    .unwrap();

    let scope = doc.scope_by_eid("b").unwrap();
    assert_eq!(doc.scopes.lookup(scope, "seen"), Some(Value::Number(7.0)));
}

#[test]
fn test_on_change_fires_once_per_settled_turn() {
    let mut engine = ClosureEngine::new();

    let counter = engine.func(|host, scope, _| {
        let fired = host.get(scope, "fired").as_number().unwrap_or(0.0);
        host.set(scope, "fired", Value::Number(fired + 1.0));
        Ok(Value::Nil)
    });
    engine.on_source("wire", move |host, scope, _| {
        host.set(scope, "x", Value::Number(0.0));
        host.set(scope, "fired", Value::Number(0.0));
        host.subscribe(scope, "x", counter);
        Ok(Value::Nil)
    });
    engine.on_source("bump_twice", |host, scope, _| {
        host.set(scope, "x", Value::Number(1.0));
        host.set(scope, "x", Value::Number(2.0));
        Ok(Value::Nil)
    });

    let doc = Document::compile(
        concat!(
            "<page><script>wire</script>",
            "<button eid=\"b\" on-submit=\"bump_twice\">go</button></page>",
        ),
        ComponentRegistry::new(),
        &mut engine,
    )
    .unwrap();

    let mut session = Session::new(doc, Box::new(engine));
    session.submit("b").unwrap();

    let scope = session.doc.scope_by_eid("b").unwrap();
    // 同一轮写两次只结算一次净变更
    assert_eq!(session.doc.scopes.lookup(scope, "fired"), Some(Value::Number(1.0)));
    assert_eq!(session.doc.scopes.lookup(scope, "x"), Some(Value::Number(2.0)));
}

#[test]
fn test_callback_chain_overflow_is_reported() {
    let mut engine = ClosureEngine::new();

    let feedback = engine.func(|host, scope, args| {
        let current = args
            .first()
            .and_then(Value::as_number)
            .unwrap_or(0.0);
        host.set(scope, "x", Value::Number(current + 1.0));
        Ok(Value::Nil)
    });
    engine.on_source("wire", move |host, scope, _| {
        host.set(scope, "x", Value::Number(0.0));
        host.subscribe(scope, "x", feedback);
        Ok(Value::Nil)
    });
    engine.on_source("poke", |host, scope, _| {
        host.set(scope, "x", Value::Number(1.0));
        Ok(Value::Nil)
    });

    let doc = Document::compile(
        concat!(
            "<page><script>wire</script>",
            "<button eid=\"b\" on-submit=\"poke\">go</button></page>",
        ),
        ComponentRegistry::new(),
        &mut engine,
    )
    .unwrap();

    let mut session = Session::new(doc, Box::new(engine));
    let err = session.submit("b").unwrap_err();
    assert!(matches!(err, RuntimeError::CallbackChainOverflow { .. }));
    assert!(!session.drain_diagnostics().is_empty());
}

#[test]
fn test_scope_by_eid_allows_cross_scope_addressing() {
    let mut engine = ClosureEngine::new();
    engine.on_source("declare_here", |host, scope, _| {
        host.set(scope, "local", Value::Number(1.0));
        Ok(Value::Nil)
    });

    let mut doc = Document::compile(
        "<page><box eid=\"a\"><script>declare_here</script></box><box eid=\"other\">x</box></page>",
        ComponentRegistry::new(),
        &mut engine,
    )
    .unwrap();

    let a_scope = doc.scope_by_eid("a").unwrap();
    let other_scope = doc.scope_by_eid("other").unwrap();
    assert_ne!(a_scope, other_scope);

    // 显式寻址后的跨作用域写
    doc.set(a_scope, "local", Value::Number(9.0));
    assert_eq!(doc.scopes.lookup(a_scope, "local"), Some(Value::Number(9.0)));
}
