//! 组件注册表 - 具名带槽模板，把自定义标签展开成子树

use std::collections::HashMap;

use crate::error::CompileError;
use crate::parser::markup::{Element, Node};

/// 组件展开的最大递归深度
pub const MAX_EXPANSION_DEPTH: usize = 32;

/// 声明的参数：名字 + 默认值表达式
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub default: String,
}

/// 组件定义：注册一次，之后不可变
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDefinition {
    pub name: String,
    pub namespace: Option<String>,
    pub params: Vec<Parameter>,
    pub template: Element,
}

impl ComponentDefinition {
    /// `<component name="counter" initial="0">` 节点 -> 定义。
    /// name 以外的属性都是带默认值表达式的参数；模板是唯一的元素子节点。
    pub fn from_node(node: &Element, namespace: Option<&str>) -> Result<Self, CompileError> {
        let name = node
            .attr("name")
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                CompileError::MalformedDocument("components must have a name".to_string())
            })?
            .to_string();

        let params = node
            .attrs
            .iter()
            .filter(|(key, _)| key != "name")
            .map(|(key, value)| Parameter {
                name: key.clone(),
                default: value.clone(),
            })
            .collect();

        let mut templates = node.children.iter().filter_map(Node::as_element);
        let template = templates.next().cloned().ok_or_else(|| {
            CompileError::MalformedDocument(format!("component '{}' has no template", name))
        })?;
        if templates.next().is_some() {
            return Err(CompileError::MalformedDocument(format!(
                "component '{}' must have exactly one template subtree",
                name
            )));
        }

        Ok(Self {
            name,
            namespace: namespace.map(str::to_string),
            params,
            template,
        })
    }

    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}

/// 组件注册表；文档编译期填充，渲染开始后只读
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    defs: HashMap<String, ComponentDefinition>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, def: ComponentDefinition) -> Result<(), CompileError> {
        let name = def.qualified_name();
        if self.defs.contains_key(&name) {
            return Err(CompileError::DuplicateComponentName(name));
        }
        self.defs.insert(name, def);
        Ok(())
    }

    /// `<complib namespace="form">` 库文档：批量注册其子组件
    pub fn register_library(&mut self, library: &Element) -> Result<(), CompileError> {
        let namespace = library.attr("namespace").filter(|ns| !ns.is_empty());

        for child in &library.children {
            let Some(element) = child.as_element() else {
                continue;
            };
            if element.tag != "component" {
                continue;
            }
            self.register(ComponentDefinition::from_node(element, namespace)?)?;
        }

        Ok(())
    }

    /// 标签解析：库模板内部的未加前缀引用先在库自己的命名空间里找
    pub fn resolve(&self, tag: &str, namespace: Option<&str>) -> Option<&ComponentDefinition> {
        if let Some(ns) = namespace {
            if let Some(def) = self.defs.get(&format!("{}.{}", ns, tag)) {
                return Some(def);
            }
        }
        self.defs.get(tag)
    }
}

/// 模板实例化：替换 `$param` 占位符并拼接槽位
///
/// 参数值由调用方先解析好（显式属性或默认值表达式求值的结果）。
/// 第一个 `<slot/>` 被调用方子节点原样替换；没有子节点时移除。
pub fn instantiate(
    def: &ComponentDefinition,
    params: &HashMap<String, String>,
    children: &[Node],
) -> Element {
    let mut expanded = def.template.clone();
    substitute_element(&mut expanded, params);
    fill_slot(&mut expanded, children);
    expanded
}

fn substitute_element(element: &mut Element, params: &HashMap<String, String>) {
    for (_, value) in element.attrs.iter_mut() {
        *value = substitute_text(value, params);
    }
    for child in element.children.iter_mut() {
        match child {
            Node::Element(el) => substitute_element(el, params),
            Node::Text(text) | Node::Script(text) | Node::Style(text) => {
                *text = substitute_text(text, params);
            }
        }
    }
}

/// `$name` 占位符替换，长名优先避免前缀截断
fn substitute_text(text: &str, params: &HashMap<String, String>) -> String {
    if !text.contains('$') {
        return text.to_string();
    }

    let mut names: Vec<&String> = params.keys().collect();
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));

    let mut result = text.to_string();
    for name in names {
        result = result.replace(&format!("${}", name), &params[name]);
    }
    result
}

/// 返回 true 表示找到并处理了槽位
fn fill_slot(element: &mut Element, children: &[Node]) -> bool {
    for (index, child) in element.children.iter().enumerate() {
        if matches!(child, Node::Element(el) if el.tag == "slot") {
            element.children.remove(index);
            for (offset, node) in children.iter().enumerate() {
                element.children.insert(index + offset, node.clone());
            }
            return true;
        }
    }

    for child in element.children.iter_mut() {
        if let Node::Element(el) = child {
            if fill_slot(el, children) {
                return true;
            }
        }
    }

    false
}
