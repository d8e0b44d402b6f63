//! 文档运行时 - 扁平节点 arena、组件展开、两阶段初始化、子树替换
//!
//! 所有节点存放在扁平 arena 里，`eid` 映射到 arena 下标；`self`/`#eid`
//! 寻址一律走下标查询，不持有反向引用。

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use once_cell::sync::Lazy;
use serde_json::Value as JsonValue;

use crate::error::{CompileError, RuntimeError, ScriptError};
use crate::parser::markup::{parse, Element, Node};
use crate::parser::style::{self, Selector, StylePatch, StyleRule};
use crate::runtime::action::{parse_action, ActionDescriptor, Trigger};
use crate::runtime::component::{instantiate, ComponentRegistry, MAX_EXPANSION_DEPTH};
use crate::runtime::scope::{ScopeArena, ScopeId};
use crate::runtime::value::Value;
use crate::script::{FuncRef, ScriptEngine, ScriptHost};

/// 节点句柄（arena 下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Arena 里的节点内容
#[derive(Debug, Clone)]
pub enum NodeKind {
    Element { tag: String, attrs: Vec<(String, String)> },
    Text(String),
}

/// Arena 节点：子树结构、归属作用域、样式与动作
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// 归属作用域（最近拥有作用域的祖先，或自己的）
    pub scope: ScopeId,
    /// 该节点自己引入了作用域（组件实例根或带脚本的元素）
    pub own_scope: bool,
    /// 节点自身 `<style>` 块的裸属性
    pub style: StylePatch,
    pub actions: Vec<(Trigger, ActionDescriptor)>,
    pub eid: Option<String>,
    pub groups: Vec<String>,
}

impl NodeData {
    pub fn tag(&self) -> &str {
        match &self.kind {
            NodeKind::Element { tag, .. } => tag,
            NodeKind::Text(_) => "",
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn action_for(&self, trigger: Trigger) -> Option<&ActionDescriptor> {
        self.actions
            .iter()
            .find(|(kind, _)| *kind == trigger)
            .map(|(_, action)| action)
    }
}

/// 带作用域限定的样式规则（节点样式块里的子选择器只作用于该子树）
#[derive(Debug, Clone)]
struct ScopedRule {
    rule: StyleRule,
    root: Option<NodeId>,
}

/// 原生文本宏
pub type NativeMacro = Rc<dyn Fn(&[String]) -> Result<String, ScriptError>>;

/// 内置样式别名；脚本注册的同名别名优先
static BUILTIN_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut aliases = HashMap::new();
    aliases.insert("b", "bold");
    aliases.insert("i", "italic");
    aliases.insert("u", "underline");
    aliases.insert("d", "dim");
    aliases.insert("s", "strikethrough");
    aliases
});

/// 一份编译后的文档：节点 arena + 作用域 arena + 各类注册表
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
    pub scopes: ScopeArena,
    registry: ComponentRegistry,
    rules: Vec<ScopedRule>,
    native_macros: HashMap<String, NativeMacro>,
    aliases: HashMap<String, String>,
    eids: HashMap<String, NodeId>,
    scope_owners: HashMap<ScopeId, NodeId>,
    root_scope: ScopeId,
    pre_content_count: usize,
    // 两阶段初始化的待处理队列
    pending_scripts: Vec<(ScopeId, String)>,
    pending_scopes: Vec<ScopeId>,
    pending_init_stmts: Vec<(ScopeId, String)>,
}

// native_macros 的闭包表不可打印，手写摘要
impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .field("eids", &self.eids.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Document {
    /// 编译文档：解析、注册组件库、展开内容树、两阶段初始化
    pub fn compile(
        source: &str,
        registry: ComponentRegistry,
        engine: &mut dyn ScriptEngine,
    ) -> Result<Document, CompileError> {
        let parsed = parse(source)?;

        let mut scopes = ScopeArena::new();
        let root_scope = scopes.create(None);

        let mut doc = Document {
            nodes: Vec::new(),
            root: NodeId(0),
            scopes,
            registry,
            rules: Vec::new(),
            native_macros: HashMap::new(),
            aliases: HashMap::new(),
            eids: HashMap::new(),
            scope_owners: HashMap::new(),
            root_scope,
            pre_content_count: 0,
            pending_scripts: Vec::new(),
            pending_scopes: Vec::new(),
            pending_init_stmts: Vec::new(),
        };
        doc.pending_scopes.push(root_scope);

        let mut content_root: Option<NodeId> = None;

        for node in &parsed {
            match node {
                Node::Script(body) => {
                    doc.pending_scripts.push((root_scope, body.clone()));
                }
                Node::Style(body) => {
                    doc.collect_rules(body, None);
                }
                Node::Element(element) if element.tag == "complib" => {
                    doc.registry.register_library(element)?;
                }
                Node::Element(element) if element.tag == "component" => {
                    let def = crate::runtime::component::ComponentDefinition::from_node(
                        element, None,
                    )?;
                    doc.registry.register(def)?;
                }
                Node::Element(element) => {
                    if content_root.is_some() {
                        return Err(CompileError::MalformedDocument(
                            "documents must have exactly one content node".to_string(),
                        ));
                    }
                    let id = doc.attach_element(element, None, root_scope, None, 0, engine)?;
                    content_root = Some(id);
                }
                Node::Text(_) => {}
            }
        }

        doc.root = content_root.ok_or_else(|| {
            CompileError::MalformedDocument("document has no content node".to_string())
        })?;
        doc.scope_owners.insert(root_scope, doc.root);

        doc.run_pending(engine)?;
        Ok(doc)
    }

    /// 声明 + 接线：先跑所有待处理脚本正文，再按创建顺序调用 `init`。
    /// 初始化期间的写入不触发订阅；订阅从第一个动作轮开始生效。
    fn run_pending(&mut self, engine: &mut dyn ScriptEngine) -> Result<(), CompileError> {
        self.scopes.begin_turn();

        let scripts = std::mem::take(&mut self.pending_scripts);
        for (scope, source) in scripts {
            engine.eval(&source, scope, self)?;
        }

        let wired = std::mem::take(&mut self.pending_scopes);
        for scope in wired {
            if let Some(func) = self.scopes.init_of(scope) {
                engine.call(func, &[], scope, self)?;
            }
        }

        let stmts = std::mem::take(&mut self.pending_init_stmts);
        for (scope, stmt) in stmts {
            engine.eval(&stmt, scope, self)?;
        }

        self.scopes.begin_turn();
        Ok(())
    }

    fn new_scope(&mut self, parent: ScopeId) -> ScopeId {
        let scope = self.scopes.create(Some(parent));
        self.pending_scopes.push(scope);
        scope
    }

    fn collect_rules(&mut self, body: &str, root: Option<NodeId>) -> StylePatch {
        let block = style::parse_block(body);
        for rule in block.rules {
            self.rules.push(ScopedRule { rule, root });
        }
        block.own
    }

    /// 元素挂接：自定义标签先经注册表展开成实例
    fn attach_element(
        &mut self,
        element: &Element,
        parent: Option<NodeId>,
        scope: ScopeId,
        namespace: Option<&str>,
        depth: usize,
        engine: &mut dyn ScriptEngine,
    ) -> Result<NodeId, CompileError> {
        if depth > MAX_EXPANSION_DEPTH {
            return Err(CompileError::RecursiveComponent {
                name: element.tag.clone(),
                depth,
            });
        }

        if let Some(def) = self.registry.resolve(&element.tag, namespace).cloned() {
            // 绑定参数：显式属性优先，缺省值表达式在空作用域里求值
            let mut params = HashMap::new();
            for param in &def.params {
                let value = match element.attr(&param.name) {
                    Some(explicit) => explicit.to_string(),
                    None => {
                        let scratch = self.scopes.create(None);
                        let value = engine.eval(&param.default, scratch, self)?;
                        self.scopes.destroy(scratch);
                        value.display()
                    }
                };
                params.insert(param.name.clone(), value);
            }

            let mut expanded = instantiate(&def, &params, &element.children);

            // 调用处的 eid 落到实例根上（模板自带 eid 时保留模板的）
            if let Some(eid) = element.eid() {
                if expanded.eid().is_none() {
                    expanded.set_attr("eid", eid);
                }
            }

            let instance_scope = self.new_scope(scope);
            let id = self.attach_element(
                &expanded,
                parent,
                instance_scope,
                def.namespace.as_deref(),
                depth + 1,
                engine,
            )?;
            self.nodes[id.0].own_scope = true;
            self.scope_owners.insert(instance_scope, id);
            return Ok(id);
        }

        // 普通元素：带脚本的元素引入自己的作用域
        let has_script = element
            .children
            .iter()
            .any(|child| matches!(child, Node::Script(_)));
        let node_scope = if has_script { self.new_scope(scope) } else { scope };

        let mut attrs = Vec::new();
        let mut eid = None;
        let mut groups = Vec::new();
        let mut actions = Vec::new();

        for (name, value) in &element.attrs {
            if name == "eid" {
                eid = Some(value.clone());
                continue;
            }
            if name == "groups" {
                groups = value.split_whitespace().map(str::to_string).collect();
                continue;
            }
            if let Some(trigger) = Trigger::from_attr(name) {
                let action = parse_action(value)?;
                let local_only = trigger == Trigger::Init || trigger == Trigger::PreContent;
                if local_only && matches!(action, ActionDescriptor::Remote(_)) {
                    return Err(CompileError::MalformedDocument(format!(
                        "{:?} triggers cannot dispatch remote directives",
                        trigger
                    )));
                }
                if trigger == Trigger::PreContent {
                    self.pre_content_count += 1;
                }
                actions.push((trigger, action));
                continue;
            }
            attrs.push((name.clone(), value.clone()));
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind: NodeKind::Element {
                tag: element.tag.clone(),
                attrs,
            },
            parent,
            children: Vec::new(),
            scope: node_scope,
            own_scope: has_script,
            style: StylePatch::default(),
            actions,
            eid: eid.clone(),
            groups,
        });

        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        if has_script {
            self.scope_owners.insert(node_scope, id);
        }

        if let Some(eid) = eid {
            if self.eids.insert(eid.clone(), id).is_some() {
                return Err(CompileError::DuplicateEid(eid));
            }
        }

        // init 语句在接线之后跑一次
        for (trigger, action) in self.nodes[id.0].actions.clone() {
            if trigger == Trigger::Init {
                if let ActionDescriptor::Local(stmt) = action {
                    self.pending_init_stmts.push((node_scope, stmt));
                }
            }
        }

        // 表单字段把当前值保存为作用域变量
        if element.tag == "field" {
            if let Some(name) = field_name_of(element) {
                let initial = element.attr("value").unwrap_or_default();
                self.scopes
                    .declare(node_scope, &name, Value::from_literal(initial));
            }
        }

        for child in &element.children {
            match child {
                Node::Script(body) => {
                    self.pending_scripts.push((node_scope, body.clone()));
                }
                Node::Style(body) => {
                    let own = self.collect_rules(body, Some(id));
                    self.nodes[id.0].style.merge(&own);
                }
                Node::Text(text) => {
                    let text_id = NodeId(self.nodes.len());
                    self.nodes.push(NodeData {
                        kind: NodeKind::Text(text.clone()),
                        parent: Some(id),
                        children: Vec::new(),
                        scope: node_scope,
                        own_scope: false,
                        style: StylePatch::default(),
                        actions: Vec::new(),
                        eid: None,
                        groups: Vec::new(),
                    });
                    self.nodes[id.0].children.push(text_id);
                }
                Node::Element(el) => {
                    self.attach_element(el, Some(id), node_scope, namespace, depth, engine)?;
                }
            }
        }

        Ok(id)
    }

    // ---- 查询 ----

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_scope(&self) -> ScopeId {
        self.root_scope
    }

    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    pub fn by_eid(&self, eid: &str) -> Option<NodeId> {
        self.eids.get(eid).copied()
    }

    /// 作用域对应的实例根节点
    pub fn owner_of_scope(&self, scope: ScopeId) -> Option<NodeId> {
        self.scope_owners.get(&scope).copied()
    }

    pub fn has_pre_content(&self) -> bool {
        self.pre_content_count > 0
    }

    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes[id.0].parent;
        }
        false
    }

    /// 全局与作用域限定规则在该节点上的合并补丁。
    /// 同一具体度按文档顺序后者覆盖前者，更具体的选择器整体优先。
    pub fn rule_patch(&self, id: NodeId) -> StylePatch {
        let node = &self.nodes[id.0];
        let tag = node.tag();
        let groups: Vec<&str> = node.groups.iter().map(String::as_str).collect();

        let mut matched: Vec<&ScopedRule> = self
            .rules
            .iter()
            .filter(|scoped| match scoped.root {
                Some(root) => self.is_ancestor(root, id),
                None => true,
            })
            .filter(|scoped| scoped.rule.selector.matches(tag, &groups))
            .collect();
        matched.sort_by_key(|scoped| scoped.rule.selector.specificity());

        let mut patch = StylePatch::default();
        for scoped in matched {
            patch.merge(&scoped.rule.patch);
        }
        patch
    }

    /// 目标解析：`self`、`#eid` 或全文档内唯一匹配的后代选择器
    pub fn resolve_target(&self, from: NodeId, target: &str) -> Result<NodeId, RuntimeError> {
        let target = target.trim();

        if target == "self" {
            return Ok(from);
        }

        if let Some(eid) = target.strip_prefix('#') {
            return self
                .by_eid(eid)
                .ok_or_else(|| RuntimeError::TargetNotFound(target.to_string()));
        }

        let selector = Selector::parse(target)
            .ok_or_else(|| RuntimeError::TargetNotFound(target.to_string()))?;

        let mut matches = Vec::new();
        self.collect_matches(self.root, &selector, &mut matches);

        match matches.as_slice() {
            [only] => Ok(*only),
            _ => Err(RuntimeError::TargetNotFound(target.to_string())),
        }
    }

    fn collect_matches(&self, id: NodeId, selector: &Selector, out: &mut Vec<NodeId>) {
        let node = &self.nodes[id.0];
        if let NodeKind::Element { tag, .. } = &node.kind {
            let groups: Vec<&str> = node.groups.iter().map(String::as_str).collect();
            if selector.matches(tag, &groups) {
                out.push(id);
            }
        }
        for child in &node.children {
            self.collect_matches(*child, selector, out);
        }
    }

    /// 序列化最近包围表单的字段值作为请求体
    pub fn serialize_form(&self, from: NodeId, container: Option<&str>) -> Result<JsonValue, RuntimeError> {
        let form_root = match container {
            Some(selector) => self.resolve_target(from, selector)?,
            None => self.enclosing_form(from),
        };

        let mut body = serde_json::Map::new();
        self.collect_fields(form_root, &mut body);
        Ok(JsonValue::Object(body))
    }

    fn enclosing_form(&self, from: NodeId) -> NodeId {
        let mut current = self.nodes[from.0].parent;
        while let Some(id) = current {
            if self.nodes[id.0].tag().starts_with("form") {
                return id;
            }
            current = self.nodes[id.0].parent;
        }
        self.nodes[from.0].parent.unwrap_or(from)
    }

    fn collect_fields(&self, id: NodeId, out: &mut serde_json::Map<String, JsonValue>) {
        let node = &self.nodes[id.0];
        if node.tag() == "field" {
            let name = node
                .attr("name")
                .map(str::to_string)
                .or_else(|| node.eid.clone());
            if let Some(name) = name {
                let value = self
                    .scopes
                    .lookup(node.scope, &name)
                    .unwrap_or(Value::Nil);
                out.insert(name, value.to_json());
            }
        }
        for child in &node.children {
            self.collect_fields(*child, out);
        }
    }

    // ---- 子树替换 ----

    /// 替换目标节点的内容（`SWAP IN`，必须支持的最小模式）
    pub fn replace_children(
        &mut self,
        target: NodeId,
        fragment: &[Node],
        engine: &mut dyn ScriptEngine,
    ) -> Result<(), CompileError> {
        let old_children = std::mem::take(&mut self.nodes[target.0].children);
        for child in &old_children {
            self.discard_subtree(*child);
        }

        let scope = self.nodes[target.0].scope;
        for node in fragment {
            match node {
                Node::Element(el) => {
                    self.attach_element(el, Some(target), scope, None, 0, engine)?;
                }
                Node::Text(text) => {
                    let text_id = NodeId(self.nodes.len());
                    self.nodes.push(NodeData {
                        kind: NodeKind::Text(text.clone()),
                        parent: Some(target),
                        children: Vec::new(),
                        scope,
                        own_scope: false,
                        style: StylePatch::default(),
                        actions: Vec::new(),
                        eid: None,
                        groups: Vec::new(),
                    });
                    self.nodes[target.0].children.push(text_id);
                }
                Node::Script(body) => {
                    self.pending_scripts.push((scope, body.clone()));
                }
                Node::Style(body) => {
                    let own = self.collect_rules(body, Some(target));
                    self.nodes[target.0].style.merge(&own);
                }
            }
        }

        self.run_pending(engine)
    }

    /// 替换兄弟位置上的节点本身（默认模式与 BEFORE/AFTER 的偏移语义）
    pub fn replace_sibling(
        &mut self,
        target: NodeId,
        offset: isize,
        fragment: &[Node],
        engine: &mut dyn ScriptEngine,
    ) -> Result<(), CompileError> {
        let Some(parent) = self.nodes[target.0].parent else {
            return Err(CompileError::MalformedDocument(
                "cannot replace the content root itself".to_string(),
            ));
        };

        let position = self.nodes[parent.0]
            .children
            .iter()
            .position(|child| *child == target)
            .unwrap_or(0);
        let len = self.nodes[parent.0].children.len() as isize;
        let index = (position as isize + offset).clamp(0, len - 1) as usize;

        let removed = self.nodes[parent.0].children.remove(index);
        self.discard_subtree(removed);

        let scope = self.nodes[parent.0].scope;
        let mut inserted = Vec::new();
        for node in fragment {
            if let Node::Element(el) = node {
                let id = self.attach_element(el, None, scope, None, 0, engine)?;
                self.nodes[id.0].parent = Some(parent);
                inserted.push(id);
            }
        }
        for (at, id) in inserted.into_iter().enumerate() {
            self.nodes[parent.0].children.insert(index + at, id);
        }

        self.run_pending(engine)
    }

    /// 把片段插进目标的子节点列表，不摘除任何已有节点；
    /// `index` 超出末尾时收口到末尾
    pub fn insert_children(
        &mut self,
        target: NodeId,
        index: usize,
        fragment: &[Node],
        engine: &mut dyn ScriptEngine,
    ) -> Result<(), CompileError> {
        let scope = self.nodes[target.0].scope;
        let mut inserted = Vec::new();
        for node in fragment {
            match node {
                Node::Element(el) => {
                    let id = self.attach_element(el, None, scope, None, 0, engine)?;
                    self.nodes[id.0].parent = Some(target);
                    inserted.push(id);
                }
                Node::Text(text) => {
                    let text_id = NodeId(self.nodes.len());
                    self.nodes.push(NodeData {
                        kind: NodeKind::Text(text.clone()),
                        parent: Some(target),
                        children: Vec::new(),
                        scope,
                        own_scope: false,
                        style: StylePatch::default(),
                        actions: Vec::new(),
                        eid: None,
                        groups: Vec::new(),
                    });
                    inserted.push(text_id);
                }
                Node::Script(body) => {
                    self.pending_scripts.push((scope, body.clone()));
                }
                Node::Style(body) => {
                    let own = self.collect_rules(body, Some(target));
                    self.nodes[target.0].style.merge(&own);
                }
            }
        }

        let at = index.min(self.nodes[target.0].children.len());
        for (offset, id) in inserted.into_iter().enumerate() {
            self.nodes[target.0].children.insert(at + offset, id);
        }

        self.run_pending(engine)
    }

    /// 在目标的兄弟位置插入片段（`offset` 0 为前、1 为后），
    /// 目标本身保持原位
    pub fn insert_sibling(
        &mut self,
        target: NodeId,
        offset: usize,
        fragment: &[Node],
        engine: &mut dyn ScriptEngine,
    ) -> Result<(), CompileError> {
        let Some(parent) = self.nodes[target.0].parent else {
            return Err(CompileError::MalformedDocument(
                "cannot insert beside the content root".to_string(),
            ));
        };

        let position = self.nodes[parent.0]
            .children
            .iter()
            .position(|child| *child == target)
            .unwrap_or(0);

        let scope = self.nodes[parent.0].scope;
        let mut inserted = Vec::new();
        for node in fragment {
            if let Node::Element(el) = node {
                let id = self.attach_element(el, None, scope, None, 0, engine)?;
                self.nodes[id.0].parent = Some(parent);
                inserted.push(id);
            }
        }
        for (at, id) in inserted.into_iter().enumerate() {
            self.nodes[parent.0].children.insert(position + offset + at, id);
        }

        self.run_pending(engine)
    }

    /// 摘除子树：作用域连同订阅立即失效，eid 索引同步清理。
    /// 节点槽位留在 arena 里不回收，已发出的 `NodeId` 始终稳定；
    /// 长会话里反复替换会让 arena 单调增长
    fn discard_subtree(&mut self, id: NodeId) {
        let node = self.nodes[id.0].clone();

        if let Some(eid) = &node.eid {
            if self.eids.get(eid) == Some(&id) {
                self.eids.remove(eid);
            }
        }
        if node.own_scope {
            self.scopes.destroy(node.scope);
            self.scope_owners.remove(&node.scope);
        }
        for (trigger, _) in &node.actions {
            if *trigger == Trigger::PreContent {
                self.pre_content_count = self.pre_content_count.saturating_sub(1);
            }
        }
        self.rules.retain(|scoped| scoped.root != Some(id));

        for child in node.children {
            self.discard_subtree(child);
        }
    }

    // ---- 宏与别名 ----

    /// 注册进程内原生文本宏（文档级全局表）
    pub fn define_native_macro(&mut self, name: &str, expander: NativeMacro) {
        self.native_macros.insert(name.to_string(), expander);
    }

    pub fn native_macro(&self, name: &str) -> Option<NativeMacro> {
        self.native_macros.get(name).cloned()
    }

    pub fn alias_target(&self, name: &str) -> Option<String> {
        if let Some(target) = self.aliases.get(name) {
            return Some(target.clone());
        }
        BUILTIN_ALIASES.get(name).map(|target| target.to_string())
    }
}

fn field_name_of(element: &Element) -> Option<String> {
    element
        .attr("name")
        .map(str::to_string)
        .or_else(|| element.eid().map(str::to_string))
}

impl ScriptHost for Document {
    fn get(&self, scope: ScopeId, name: &str) -> Value {
        self.scopes.lookup(scope, name).unwrap_or(Value::Nil)
    }

    fn set(&mut self, scope: ScopeId, name: &str, value: Value) {
        self.scopes.set(scope, name, value);
    }

    fn subscribe(&mut self, scope: ScopeId, name: &str, callback: FuncRef) {
        self.scopes.subscribe(scope, name, callback);
    }

    fn on_init(&mut self, scope: ScopeId, callback: FuncRef) {
        self.scopes.set_init(scope, callback);
    }

    fn define_macro(&mut self, scope: ScopeId, name: &str, expander: FuncRef) {
        self.scopes.define_macro(scope, name, expander);
    }

    fn define_alias(&mut self, name: &str, target: &str) {
        self.aliases.insert(name.to_string(), target.to_string());
    }

    fn scope_by_eid(&self, eid: &str) -> Option<ScopeId> {
        self.by_eid(eid).map(|id| self.nodes[id.0].scope)
    }
}
