//! 渲染器 - 文档树到可序列化渲染树
//!
//! 每趟渲染执行 pre-content 动作、解析样式级联、展开行内标记，
//! 产出与节点一一对应的 [`RenderNode`] 树。渲染树整体可 JSON
//! 序列化，布局与绘制交给外部终端后端。

pub mod style_resolver;

use serde::Serialize;

use crate::error::{CompileError, RuntimeError, ScriptError};
use crate::parser::inline::{self, InlineResolver, StyledText};
use crate::parser::style::{Style, StylePatch};
use crate::runtime::action::{ActionDescriptor, Trigger};
use crate::runtime::document::{Document, NodeId, NodeKind};
use crate::runtime::scope::ScopeId;
use crate::runtime::value::Value;
use crate::script::ScriptEngine;

/// 渲染树节点：标签、最终样式、展开后的文本与子节点
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderNode {
    #[serde(skip)]
    pub node: usize,
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eid: Option<String>,
    pub style: Style,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub text: StyledText,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderNode>,
}

/// 整棵文档的渲染趟
pub fn render(
    doc: &mut Document,
    engine: &mut dyn ScriptEngine,
) -> Result<RenderNode, RuntimeError> {
    let root = doc.root();
    render_node(doc, engine, root, &StylePatch::default())
}

/// 只重渲染一棵子树，祖先继承链按当前树重建
pub fn render_subtree(
    doc: &mut Document,
    engine: &mut dyn ScriptEngine,
    id: NodeId,
) -> Result<RenderNode, RuntimeError> {
    let inherited = style_resolver::inherited_patch(doc, id);
    render_node(doc, engine, id, &inherited)
}

/// 把重渲染的子树拼回缓存的渲染树；目标按 arena 下标定位
pub fn splice(tree: &mut RenderNode, replacement: RenderNode) -> bool {
    match find_mut(tree, replacement.node) {
        Some(slot) => {
            *slot = replacement;
            true
        }
        None => false,
    }
}

fn find_mut(tree: &mut RenderNode, node: usize) -> Option<&mut RenderNode> {
    if tree.node == node {
        return Some(tree);
    }
    for child in &mut tree.children {
        if let Some(found) = find_mut(child, node) {
            return Some(found);
        }
    }
    None
}

fn render_node(
    doc: &mut Document,
    engine: &mut dyn ScriptEngine,
    id: NodeId,
    inherited: &StylePatch,
) -> Result<RenderNode, RuntimeError> {
    // pre-content 在子节点渲染之前执行，本地语句限定在编译期保证
    let pre_content = doc.node(id).action_for(Trigger::PreContent).cloned();
    if let Some(ActionDescriptor::Local(stmt)) = pre_content {
        let scope = doc.node(id).scope;
        engine.eval(&stmt, scope, doc)?;
    }

    let node = doc.node(id);
    let tag = node.tag().to_string();
    let eid = node.eid.clone();
    let scope = node.scope;
    let own = node.style.clone();
    let children: Vec<NodeId> = node.children.clone();
    let field_name = field_variable(doc, id);

    let style = style_resolver::resolve(doc, id, inherited);
    let child_inherited = style_resolver::inherit(inherited, &own);

    let mut text = Vec::new();
    let mut rendered_children = Vec::new();

    for child in children {
        match doc.node(child).kind.clone() {
            NodeKind::Text(raw) => {
                let mut resolver = ScopedResolver {
                    doc: &mut *doc,
                    engine: &mut *engine,
                    scope,
                };
                let spans = inline::expand(&raw, &mut resolver).map_err(render_error)?;
                text.extend(spans);
            }
            NodeKind::Element { .. } => {
                rendered_children.push(render_node(doc, engine, child, &child_inherited)?);
            }
        }
    }

    // 表单字段显示的是当前作用域变量值，而不是标记里的初始值
    if let Some(name) = field_name {
        let value = doc.scopes.lookup(scope, &name).unwrap_or(Value::Nil);
        if !value.display().is_empty() {
            text = vec![crate::parser::inline::TextSpan {
                content: value.display(),
                styles: Vec::new(),
            }];
        }
    }

    Ok(RenderNode {
        node: id.0,
        tag,
        eid,
        style,
        text,
        children: rendered_children,
    })
}

fn field_variable(doc: &Document, id: NodeId) -> Option<String> {
    let node = doc.node(id);
    if node.tag() != "field" {
        return None;
    }
    node.attr("name")
        .map(str::to_string)
        .or_else(|| node.eid.clone())
}

fn render_error(err: CompileError) -> RuntimeError {
    RuntimeError::Compile(err)
}

/// 行内展开的作用域上下文：变量、作用域宏与原生宏、全局别名
struct ScopedResolver<'a> {
    doc: &'a mut Document,
    engine: &'a mut dyn ScriptEngine,
    scope: ScopeId,
}

impl InlineResolver for ScopedResolver<'_> {
    fn variable(&mut self, name: &str) -> Option<String> {
        match self.doc.scopes.lookup(self.scope, name) {
            Some(value) if !value.is_nil() => Some(value.display()),
            _ => None,
        }
    }

    fn expand_macro(
        &mut self,
        name: &str,
        args: &[String],
    ) -> Result<Option<String>, ScriptError> {
        if let Some(native) = self.doc.native_macro(name) {
            return native(args).map(Some);
        }
        if let Some(func) = self.doc.scopes.lookup_macro(self.scope, name) {
            let values: Vec<Value> = args
                .iter()
                .map(|arg| Value::from_literal(arg))
                .collect();
            let out = self.engine.call(func, &values, self.scope, self.doc)?;
            return Ok(Some(out.display()));
        }
        Ok(None)
    }

    fn alias(&mut self, name: &str) -> Option<String> {
        self.doc.alias_target(name)
    }
}
