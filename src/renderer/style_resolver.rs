//! 样式级联 - 默认值、全局规则、祖先裸属性、节点裸属性逐层合并

use crate::parser::style::{Style, StylePatch};
use crate::runtime::document::{Document, NodeId};

/// 单个节点的最终样式。`inherited` 是祖先样式块裸属性自外向内
/// 合并的结果（不含本节点自己的）。
pub fn resolve(doc: &Document, id: NodeId, inherited: &StylePatch) -> Style {
    let mut style = Style::default();
    doc.rule_patch(id).apply(&mut style);
    inherited.apply(&mut style);
    doc.node(id).style.apply(&mut style);
    style
}

/// 子节点继承的补丁：父链补丁叠加本节点的裸属性
pub fn inherit(parent: &StylePatch, own: &StylePatch) -> StylePatch {
    let mut merged = parent.clone();
    merged.merge(own);
    merged
}

/// 从根到 `id` 的祖先链重建继承补丁，部分重渲染子树时用
pub fn inherited_patch(doc: &Document, id: NodeId) -> StylePatch {
    let mut chain = Vec::new();
    let mut current = doc.node(id).parent;
    while let Some(ancestor) = current {
        chain.push(ancestor);
        current = doc.node(ancestor).parent;
    }

    let mut patch = StylePatch::default();
    for ancestor in chain.into_iter().rev() {
        patch.merge(&doc.node(ancestor).style);
    }
    patch
}
