//! 错误类型 - 按阶段划分：解析、编译、运行时

use std::fmt;

/// 解析阶段错误（加载时致命，整个文档被拒绝）
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// 到达输入末尾时标签仍未闭合
    UnclosedTag { tag: String },
    /// 闭合标签与当前打开的标签不匹配
    MismatchedClosingTag { expected: String, found: String },
    /// 属性格式非法
    InvalidAttribute { tag: String, detail: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnclosedTag { tag } => {
                write!(f, "unclosed tag <{}>", tag)
            }
            ParseError::MismatchedClosingTag { expected, found } => {
                write!(f, "mismatched closing tag: expected </{}>, found </{}>", expected, found)
            }
            ParseError::InvalidAttribute { tag, detail } => {
                write!(f, "invalid attribute in <{}>: {}", tag, detail)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// 编译/展开阶段错误（加载时致命）
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    Parse(ParseError),
    /// 同一命名空间内组件重名
    DuplicateComponentName(String),
    /// 组件展开超出最大深度（直接或间接自引用）
    RecursiveComponent { name: String, depth: usize },
    /// 行内文本引用了未注册的宏
    UnknownMacro(String),
    /// 同一文档快照内 eid 重复
    DuplicateEid(String),
    /// 声明阶段脚本执行失败
    Script(ScriptError),
    /// 文档结构非法（内容节点数量、指令语法等）
    MalformedDocument(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Parse(err) => write!(f, "{}", err),
            CompileError::DuplicateComponentName(name) => {
                write!(f, "component '{}' is already registered", name)
            }
            CompileError::RecursiveComponent { name, depth } => {
                write!(f, "component '{}' exceeds expansion depth {}", name, depth)
            }
            CompileError::UnknownMacro(name) => write!(f, "unknown macro '{}'", name),
            CompileError::DuplicateEid(eid) => write!(f, "duplicate eid '{}'", eid),
            CompileError::Script(err) => write!(f, "script error: {}", err),
            CompileError::MalformedDocument(detail) => write!(f, "malformed document: {}", detail),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> Self {
        CompileError::Parse(err)
    }
}

impl From<ScriptError> for CompileError {
    fn from(err: ScriptError) -> Self {
        CompileError::Script(err)
    }
}

/// 运行时错误（只中止当前动作，之前已提交的状态保持不变）
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    Script(ScriptError),
    /// 替换目标没有唯一匹配到当前树中的节点
    TargetNotFound(String),
    /// 远程指令失败（传输错误或非成功状态）
    RemoteDispatch(String),
    /// `on_change` 回调链超出深度上限
    CallbackChainOverflow { variable: String },
    /// 渲染或替换片段时的编译失败
    Compile(CompileError),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Script(err) => write!(f, "script error: {}", err),
            RuntimeError::TargetNotFound(target) => {
                write!(f, "nothing matched target '{}'", target)
            }
            RuntimeError::RemoteDispatch(detail) => write!(f, "remote dispatch failed: {}", detail),
            RuntimeError::CallbackChainOverflow { variable } => {
                write!(f, "on_change chain for '{}' exceeded the depth bound", variable)
            }
            RuntimeError::Compile(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<ScriptError> for RuntimeError {
    fn from(err: ScriptError) -> Self {
        RuntimeError::Script(err)
    }
}

impl From<CompileError> for RuntimeError {
    fn from(err: CompileError) -> Self {
        RuntimeError::Compile(err)
    }
}

/// 脚本执行错误，由外部解释器报告
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptError {
    pub message: String,
}

impl ScriptError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ScriptError {}
