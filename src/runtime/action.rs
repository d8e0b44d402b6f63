//! 动作描述符 - 触发器、本地脚本与远程指令

use crate::error::CompileError;

/// 触发器种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// `on-submit`
    Submit,
    /// `on-change`
    Change,
    /// `pre-content`：每个渲染趟、子节点渲染之前
    PreContent,
    /// `init`：接线之后执行一次
    Init,
}

impl Trigger {
    pub fn from_attr(name: &str) -> Option<Trigger> {
        match name {
            "on-submit" => Some(Trigger::Submit),
            "on-change" => Some(Trigger::Change),
            "pre-content" => Some(Trigger::PreContent),
            "init" => Some(Trigger::Init),
            _ => None,
        }
    }
}

/// 远程指令的 HTTP 方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    fn from_verb(verb: &str) -> Option<Method> {
        match verb {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "PATCH" => Some(Method::Patch),
            "DELETE" => Some(Method::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// 远程指令序列中的一条
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// `POST /add [container]`：序列化表单并发请求，结果留给后续指令
    Http {
        method: Method,
        endpoint: String,
        container: Option<String>,
    },
    /// `SWAP [mode] target`：用上一条请求的片段替换目标
    Swap {
        mode: Option<String>,
        target: String,
    },
    /// `INSERT IN|BEFORE|AFTER target`：插入片段，不摘除任何节点
    Insert { mode: String, target: String },
    /// `APPEND IN target`：把片段追加为目标的最后一批子节点
    Append { target: String },
}

/// 动作值：本地脚本语句，或以 `:` 开头的远程指令串
#[derive(Debug, Clone, PartialEq)]
pub enum ActionDescriptor {
    Local(String),
    Remote(Vec<Instruction>),
}

/// 属性值 -> 动作描述符
pub fn parse_action(value: &str) -> Result<ActionDescriptor, CompileError> {
    let Some(directives) = value.trim().strip_prefix(':') else {
        return Ok(ActionDescriptor::Local(value.trim().to_string()));
    };

    let mut instructions = Vec::new();

    for line in directives.split(|c| c == ';' || c == '\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or_default().to_uppercase();
        let args: Vec<&str> = parts.collect();

        if let Some(method) = Method::from_verb(&verb) {
            let [endpoint, rest @ ..] = args.as_slice() else {
                return Err(CompileError::MalformedDocument(format!(
                    "{} needs an endpoint in '{}'",
                    verb, line
                )));
            };
            if rest.len() > 1 {
                return Err(CompileError::MalformedDocument(format!(
                    "too many arguments for {} in '{}'",
                    verb, line
                )));
            }
            instructions.push(Instruction::Http {
                method,
                endpoint: endpoint.to_string(),
                container: rest.first().map(|s| s.to_string()),
            });
            continue;
        }

        if verb == "SWAP" {
            let (mode, target) = match args.as_slice() {
                [target] => (None, target.to_string()),
                [mode, target] => (Some(mode.to_uppercase()), target.to_string()),
                _ => {
                    return Err(CompileError::MalformedDocument(format!(
                        "SWAP needs a target in '{}'",
                        line
                    )))
                }
            };
            instructions.push(Instruction::Swap { mode, target });
            continue;
        }

        if verb == "INSERT" {
            let [mode, target] = args.as_slice() else {
                return Err(CompileError::MalformedDocument(format!(
                    "INSERT needs a mode and a target in '{}'",
                    line
                )));
            };
            let mode = mode.to_uppercase();
            if !matches!(mode.as_str(), "IN" | "BEFORE" | "AFTER") {
                return Err(CompileError::MalformedDocument(format!(
                    "unknown INSERT mode '{}' in '{}'",
                    mode, line
                )));
            }
            instructions.push(Instruction::Insert {
                mode,
                target: target.to_string(),
            });
            continue;
        }

        if verb == "APPEND" {
            let [mode, target] = args.as_slice() else {
                return Err(CompileError::MalformedDocument(format!(
                    "APPEND needs 'IN' and a target in '{}'",
                    line
                )));
            };
            if !mode.eq_ignore_ascii_case("IN") {
                return Err(CompileError::MalformedDocument(format!(
                    "unknown APPEND mode '{}' in '{}'",
                    mode, line
                )));
            }
            instructions.push(Instruction::Append {
                target: target.to_string(),
            });
            continue;
        }

        return Err(CompileError::MalformedDocument(format!(
            "unknown verb '{}' in directive '{}'",
            verb, line
        )));
    }

    if instructions.is_empty() {
        return Err(CompileError::MalformedDocument(
            "empty remote directive".to_string(),
        ));
    }

    Ok(ActionDescriptor::Remote(instructions))
}
