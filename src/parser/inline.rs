//! 行内标记引擎 - 宏调用、别名展开、样式跨度、变量插值
//!
//! 求值顺序：宏（参数为字面字符串）-> 别名重写 -> 跨度渲染。
//! `$name` 插值在扫描时用当前作用域值做字符串强制转换；
//! 插入的值按字面内容处理，不再参与扫描（引用透明）。

use serde::Serialize;

use crate::error::{CompileError, ScriptError};

/// 一段带样式的文本
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextSpan {
    pub content: String,
    pub styles: Vec<String>,
}

pub type StyledText = Vec<TextSpan>;

/// 展开所需的上下文能力，由渲染器（或测试桩）实现
pub trait InlineResolver {
    /// 作用域变量查询，已做字符串强制转换；未声明返回 `None`
    fn variable(&mut self, name: &str) -> Option<String>;

    /// 宏调用；未注册的名字返回 `Ok(None)`
    fn expand_macro(
        &mut self,
        name: &str,
        args: &[String],
    ) -> Result<Option<String>, ScriptError>;

    /// 别名查询；未注册返回 `None`（软失败，原样保留）
    fn alias(&mut self, name: &str) -> Option<String>;
}

/// 文本内容 -> 带样式的跨度序列
pub fn expand(text: &str, resolver: &mut dyn InlineResolver) -> Result<StyledText, CompileError> {
    let mut spans = Vec::new();
    let mut stack: Vec<String> = Vec::new();

    scan(text, resolver, true, &mut stack, &mut spans)?;

    merge_adjacent(spans)
}

fn scan(
    text: &str,
    resolver: &mut dyn InlineResolver,
    allow_macros: bool,
    stack: &mut Vec<String>,
    spans: &mut Vec<TextSpan>,
) -> Result<(), CompileError> {
    let chars: Vec<char> = text.chars().collect();
    let mut pos = 0;
    let mut content = String::new();

    while pos < chars.len() {
        let c = chars[pos];

        // `[[` 转义成字面 `[`
        if c == '[' && chars.get(pos + 1) == Some(&'[') {
            content.push('[');
            pos += 2;
            continue;
        }

        if c == '[' {
            let Some(end) = find_token_end(&chars, pos + 1) else {
                // 没有闭合的 `[` 按字面处理
                content.push('[');
                pos += 1;
                continue;
            };
            let token: String = chars[pos + 1..end].iter().collect();
            pos = end + 1;

            // 宏调用：`[!name(a,b)]`，返回值参与别名和跨度两个后续阶段
            if let Some(call) = token.strip_prefix('!') {
                if !allow_macros {
                    flush(&mut content, stack, spans);
                    content.push('[');
                    content.push_str(&token);
                    content.push(']');
                    continue;
                }

                let (name, args) = parse_call(call);
                let expanded = resolver
                    .expand_macro(&name, &args)
                    .map_err(CompileError::Script)?
                    .ok_or_else(|| CompileError::UnknownMacro(name.clone()))?;

                flush(&mut content, stack, spans);
                scan(&expanded, resolver, false, stack, spans)?;
                continue;
            }

            // 跨度闭合
            if token == "/" {
                flush(&mut content, stack, spans);
                stack.pop();
                continue;
            }

            // 跨度开启，先做别名重写
            flush(&mut content, stack, spans);
            let style = resolver.alias(&token).unwrap_or(token);
            stack.push(style);
            continue;
        }

        // 变量插值；未声明的 `$name` 原样保留
        if c == '$' {
            let mut name = String::new();
            let mut cursor = pos + 1;
            while cursor < chars.len() {
                let vc = chars[cursor];
                if vc.is_alphanumeric() || vc == '_' || vc == '.' {
                    name.push(vc);
                    cursor += 1;
                } else {
                    break;
                }
            }

            if name.is_empty() {
                content.push('$');
                pos += 1;
                continue;
            }

            match resolver.variable(&name) {
                Some(value) => content.push_str(&value),
                None => {
                    content.push('$');
                    content.push_str(&name);
                }
            }
            pos = cursor;
            continue;
        }

        content.push(c);
        pos += 1;
    }

    flush(&mut content, stack, spans);
    Ok(())
}

/// `name(a,b)` -> 名字与字面参数；参数不做递归展开
fn parse_call(call: &str) -> (String, Vec<String>) {
    let Some(open) = call.find('(') else {
        return (call.trim().to_string(), Vec::new());
    };

    let name = call[..open].trim().to_string();
    let inner = call[open + 1..].trim_end_matches(')');

    if inner.trim().is_empty() {
        return (name, Vec::new());
    }

    let args = inner
        .split(',')
        .map(|arg| arg.trim().to_string())
        .collect();

    (name, args)
}

fn find_token_end(chars: &[char], from: usize) -> Option<usize> {
    let mut pos = from;
    while pos < chars.len() {
        if chars[pos] == ']' {
            return Some(pos);
        }
        if chars[pos] == '\n' {
            return None;
        }
        pos += 1;
    }
    None
}

fn flush(content: &mut String, stack: &[String], spans: &mut Vec<TextSpan>) {
    if content.is_empty() {
        return;
    }
    spans.push(TextSpan {
        content: std::mem::take(content),
        styles: stack.to_vec(),
    });
}

/// 相邻同样式跨度合并，保证渲染幂等时输出可比较
fn merge_adjacent(spans: Vec<TextSpan>) -> Result<StyledText, CompileError> {
    let mut merged: StyledText = Vec::new();

    for span in spans {
        if let Some(last) = merged.last_mut() {
            if last.styles == span.styles {
                last.content.push_str(&span.content);
                continue;
            }
        }
        merged.push(span);
    }

    Ok(merged)
}
