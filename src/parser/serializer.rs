//! 规范序列化 - 往返属性：parse(serialize(t)) 与 t 结构等价

use super::markup::{encode_entities, Element, Node};

/// 节点序列 -> 规范文本
pub fn serialize(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, &mut out);
    }
    out
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(element) => write_element(element, out),
        Node::Text(text) => out.push_str(&encode_entities(text)),
        Node::Script(body) => write_block("script", body, out),
        Node::Style(body) => write_block("style", body, out),
    }
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.tag);

    for (name, value) in &element.attrs {
        out.push(' ');
        out.push_str(name);
        if !value.is_empty() {
            out.push_str("=\"");
            out.push_str(&encode_entities(value));
            out.push('"');
        }
    }

    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    for child in &element.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
}

/// script/style 正文原样输出，不做实体转义
fn write_block(tag: &str, body: &str, out: &mut String) {
    if body.is_empty() {
        out.push('<');
        out.push_str(tag);
        out.push_str("/>");
        return;
    }

    out.push('<');
    out.push_str(tag);
    out.push('>');
    out.push_str(body);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}
