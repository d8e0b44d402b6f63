//! 会话 - 动作分发、远程指令、子树替换与变更结算
//!
//! 一个会话持有一份文档、一个脚本引擎和可选的传输层。动作轮
//! （submit/change 一次）串行执行：触发 -> 指令 -> 结算订阅链。
//! 远程指令先拿到完整响应再改树，失败时文档保持原样。

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use serde_json::Value as JsonValue;

use crate::error::RuntimeError;
use crate::parser::markup::{parse, Node};
use crate::renderer::{self, RenderNode};
use crate::runtime::action::{ActionDescriptor, Instruction, Method, Trigger};
use crate::runtime::document::{Document, NodeId};
use crate::runtime::scope::{ScopeId, MAX_CHANGE_CHAIN};
use crate::runtime::value::Value;
use crate::script::ScriptEngine;

/// 远程指令的传输层；测试里用桩实现
pub trait Transport {
    fn request(
        &mut self,
        method: Method,
        endpoint: &str,
        body: &JsonValue,
    ) -> Result<String, RuntimeError>;
}

/// 基于 ureq 的阻塞 HTTP 传输
pub struct HttpTransport {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: ureq::AgentBuilder::new()
                .timeout(std::time::Duration::from_secs(10))
                .build(),
        }
    }
}

impl Transport for HttpTransport {
    fn request(
        &mut self,
        method: Method,
        endpoint: &str,
        body: &JsonValue,
    ) -> Result<String, RuntimeError> {
        let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}{}", self.base_url, endpoint)
        };

        let request = self.agent.request(method.as_str(), &url);
        let response = match method {
            Method::Get | Method::Delete => request.call(),
            _ => request.send_json(body.clone()),
        }
        .map_err(|err| RuntimeError::RemoteDispatch(err.to_string()))?;

        response
            .into_string()
            .map_err(|err| RuntimeError::RemoteDispatch(err.to_string()))
    }
}

/// 替换模式：拿目标节点和响应片段改树
pub type SwapFn =
    fn(&mut Document, NodeId, &[Node], &mut dyn ScriptEngine) -> Result<(), RuntimeError>;

fn swap_in(
    doc: &mut Document,
    target: NodeId,
    fragment: &[Node],
    engine: &mut dyn ScriptEngine,
) -> Result<(), RuntimeError> {
    doc.replace_children(target, fragment, engine)
        .map_err(RuntimeError::from)
}

fn swap_node(
    doc: &mut Document,
    target: NodeId,
    fragment: &[Node],
    engine: &mut dyn ScriptEngine,
) -> Result<(), RuntimeError> {
    doc.replace_sibling(target, 0, fragment, engine)
        .map_err(RuntimeError::from)
}

fn swap_before(
    doc: &mut Document,
    target: NodeId,
    fragment: &[Node],
    engine: &mut dyn ScriptEngine,
) -> Result<(), RuntimeError> {
    doc.replace_sibling(target, -1, fragment, engine)
        .map_err(RuntimeError::from)
}

fn swap_after(
    doc: &mut Document,
    target: NodeId,
    fragment: &[Node],
    engine: &mut dyn ScriptEngine,
) -> Result<(), RuntimeError> {
    doc.replace_sibling(target, 1, fragment, engine)
        .map_err(RuntimeError::from)
}

static BUILTIN_SWAP_MODES: Lazy<HashMap<&'static str, SwapFn>> = Lazy::new(|| {
    let mut modes: HashMap<&'static str, SwapFn> = HashMap::new();
    modes.insert("", swap_node);
    modes.insert("IN", swap_in);
    modes.insert("BEFORE", swap_before);
    modes.insert("AFTER", swap_after);
    modes
});

/// 动作轮里收集的非致命问题
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub message: String,
}

/// 交互会话：文档 + 引擎 + 传输 + 渲染缓存
pub struct Session {
    pub doc: Document,
    engine: Box<dyn ScriptEngine>,
    transport: Option<Box<dyn Transport>>,
    swap_modes: HashMap<String, SwapFn>,
    diagnostics: Vec<Diagnostic>,
    dirty: HashSet<NodeId>,
    cached: Option<RenderNode>,
}

impl Session {
    pub fn new(doc: Document, engine: Box<dyn ScriptEngine>) -> Session {
        Session {
            doc,
            engine,
            transport: None,
            swap_modes: BUILTIN_SWAP_MODES
                .iter()
                .map(|(name, func)| (name.to_string(), *func))
                .collect(),
            diagnostics: Vec::new(),
            dirty: HashSet::new(),
            cached: None,
        }
    }

    pub fn with_transport(mut self, transport: Box<dyn Transport>) -> Session {
        self.transport = Some(transport);
        self
    }

    /// 注册或覆盖一个替换模式；模式名大小写不敏感
    pub fn register_swap_mode(&mut self, name: &str, func: SwapFn) {
        self.swap_modes.insert(name.to_uppercase(), func);
    }

    pub fn drain_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn engine_mut(&mut self) -> &mut dyn ScriptEngine {
        self.engine.as_mut()
    }

    /// 触发节点的 `on-submit` 动作并结算
    pub fn submit(&mut self, eid: &str) -> Result<(), RuntimeError> {
        self.report(|session| session.fire(eid, Trigger::Submit))
    }

    /// 写入字段值、触发 `on-change` 并结算
    pub fn change(&mut self, eid: &str, raw: &str) -> Result<(), RuntimeError> {
        self.report(|session| {
            let id = session
                .doc
                .by_eid(eid)
                .ok_or_else(|| RuntimeError::TargetNotFound(format!("#{}", eid)))?;

            let node = session.doc.node(id);
            let name = node
                .attr("name")
                .map(str::to_string)
                .or_else(|| node.eid.clone())
                .ok_or_else(|| RuntimeError::TargetNotFound(format!("#{}", eid)))?;
            let scope = node.scope;
            let action = node.action_for(Trigger::Change).cloned();

            session.doc.scopes.begin_turn();
            session.doc.scopes.set(scope, &name, Value::from_literal(raw));
            if let Some(action) = action {
                session.run_action(id, &action)?;
            }
            session.settle()
        })
    }

    fn report<F>(&mut self, turn: F) -> Result<(), RuntimeError>
    where
        F: FnOnce(&mut Session) -> Result<(), RuntimeError>,
    {
        let result = turn(self);
        if let Err(err) = &result {
            self.diagnostics.push(Diagnostic {
                message: err.to_string(),
            });
        }
        result
    }

    fn fire(&mut self, eid: &str, trigger: Trigger) -> Result<(), RuntimeError> {
        let id = self
            .doc
            .by_eid(eid)
            .ok_or_else(|| RuntimeError::TargetNotFound(format!("#{}", eid)))?;
        let action = self.doc.node(id).action_for(trigger).cloned();

        self.doc.scopes.begin_turn();
        if let Some(action) = action {
            self.run_action(id, &action)?;
        }
        self.settle()
    }

    fn run_action(&mut self, origin: NodeId, action: &ActionDescriptor) -> Result<(), RuntimeError> {
        match action {
            ActionDescriptor::Local(stmt) => {
                let scope = self.doc.node(origin).scope;
                self.engine.eval(stmt, scope, &mut self.doc)?;
                Ok(())
            }
            ActionDescriptor::Remote(instructions) => self.run_remote(origin, instructions),
        }
    }

    /// 顺序执行一串远程指令。HTTP 指令把响应片段留给后续的
    /// SWAP 指令；任何一步失败都中止整个序列。
    fn run_remote(
        &mut self,
        origin: NodeId,
        instructions: &[Instruction],
    ) -> Result<(), RuntimeError> {
        let mut fragment: Option<Vec<Node>> = None;

        for instruction in instructions {
            match instruction {
                Instruction::Http {
                    method,
                    endpoint,
                    container,
                } => {
                    let body = match method {
                        Method::Post | Method::Put | Method::Patch => {
                            self.doc.serialize_form(origin, container.as_deref())?
                        }
                        Method::Get | Method::Delete => JsonValue::Null,
                    };
                    let transport = self.transport.as_mut().ok_or_else(|| {
                        RuntimeError::RemoteDispatch("session has no transport".to_string())
                    })?;
                    let response = transport.request(*method, endpoint, &body)?;
                    fragment = Some(
                        parse(&response)
                            .map_err(|err| RuntimeError::Compile(err.into()))?,
                    );
                }
                Instruction::Swap { mode, target } => {
                    // 响应片段留给序列里后续的每条树指令，不消耗
                    let nodes = fragment.clone().ok_or_else(|| {
                        RuntimeError::RemoteDispatch(
                            "SWAP has no preceding response to splice".to_string(),
                        )
                    })?;
                    let target_id = self.doc.resolve_target(origin, target)?;
                    let key = mode.as_deref().unwrap_or("").to_uppercase();
                    let swap = *self.swap_modes.get(&key).ok_or_else(|| {
                        RuntimeError::RemoteDispatch(format!("unknown swap mode '{}'", key))
                    })?;
                    swap(&mut self.doc, target_id, &nodes, self.engine.as_mut())?;
                    // 树形变了，缓存的渲染树整棵作废
                    self.cached = None;
                }
                Instruction::Insert { mode, target } => {
                    let nodes = fragment.clone().ok_or_else(|| {
                        RuntimeError::RemoteDispatch(
                            "INSERT has no preceding response to splice".to_string(),
                        )
                    })?;
                    let target_id = self.doc.resolve_target(origin, target)?;
                    match mode.as_str() {
                        "BEFORE" => {
                            self.doc
                                .insert_sibling(target_id, 0, &nodes, self.engine.as_mut())
                        }
                        "AFTER" => {
                            self.doc
                                .insert_sibling(target_id, 1, &nodes, self.engine.as_mut())
                        }
                        _ => self
                            .doc
                            .insert_children(target_id, 0, &nodes, self.engine.as_mut()),
                    }
                    .map_err(RuntimeError::from)?;
                    self.cached = None;
                }
                Instruction::Append { target } => {
                    let nodes = fragment.clone().ok_or_else(|| {
                        RuntimeError::RemoteDispatch(
                            "APPEND has no preceding response to splice".to_string(),
                        )
                    })?;
                    let target_id = self.doc.resolve_target(origin, target)?;
                    let end = self.doc.node(target_id).children.len();
                    self.doc
                        .insert_children(target_id, end, &nodes, self.engine.as_mut())
                        .map_err(RuntimeError::from)?;
                    self.cached = None;
                }
            }
        }
        Ok(())
    }

    /// 写合并结算：每轮取净变更、触发订阅；链深超限即报错
    fn settle(&mut self) -> Result<(), RuntimeError> {
        for _ in 0..MAX_CHANGE_CHAIN {
            let changes = self.doc.scopes.take_changes();
            if changes.is_empty() {
                return Ok(());
            }
            for (scope, name, value) in changes {
                self.mark_dirty(scope);
                for sub in self.doc.scopes.subscriptions(scope) {
                    if sub.variable == name {
                        self.engine
                            .call(sub.callback, &[value.clone()], scope, &mut self.doc)?;
                    }
                }
            }
        }

        let leftover = self.doc.scopes.take_changes();
        match leftover.into_iter().next() {
            Some((_, variable, _)) => Err(RuntimeError::CallbackChainOverflow { variable }),
            None => Ok(()),
        }
    }

    fn mark_dirty(&mut self, scope: ScopeId) {
        match self.doc.owner_of_scope(scope) {
            Some(owner) => {
                self.dirty.insert(owner);
            }
            None => {
                // 作用域没有拥有者节点（已摘除等），保守整树重渲染
                self.cached = None;
            }
        }
    }

    /// 渲染当前快照。干净的实例子树直接复用缓存；任何带
    /// pre-content 的文档每趟都整树重渲染。
    pub fn render(&mut self) -> Result<RenderNode, RuntimeError> {
        if self.cached.is_none() || self.doc.has_pre_content() {
            let tree = renderer::render(&mut self.doc, self.engine.as_mut())?;
            self.cached = Some(tree);
            self.dirty.clear();
        } else if !self.dirty.is_empty() {
            let dirty: Vec<NodeId> = self.dirty.drain().collect();
            for id in dirty {
                let subtree =
                    renderer::render_subtree(&mut self.doc, self.engine.as_mut(), id)?;
                let spliced = match &mut self.cached {
                    Some(cached) => renderer::splice(cached, subtree),
                    None => false,
                };
                if !spliced {
                    // 节点已经不在缓存树里，回退整树
                    let tree = renderer::render(&mut self.doc, self.engine.as_mut())?;
                    self.cached = Some(tree);
                    break;
                }
            }
        }

        match &self.cached {
            Some(tree) => Ok(tree.clone()),
            None => {
                let tree = renderer::render(&mut self.doc, self.engine.as_mut())?;
                self.cached = Some(tree.clone());
                Ok(tree)
            }
        }
    }
}
