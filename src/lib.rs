//! Hyperdoc - 声明式终端超媒体引擎
//! 标记编译、组件展开、响应式状态与远程指令驱动的子树替换

// 错误类型
pub mod error;

// 标记/样式/行内解析器
pub mod parser;

// 脚本能力接口
pub mod script;

// 文档运行时与会话
pub mod runtime;

// 渲染树
pub mod renderer;

pub use error::{CompileError, ParseError, RuntimeError, ScriptError};
pub use parser::{clean_text, parse, serialize, Node, StyledText, TextSpan};
pub use renderer::RenderNode;
pub use runtime::{ComponentRegistry, Document, Session, Transport, Value};
pub use script::{ClosureEngine, FuncRef, ScriptEngine, ScriptHost};

// 单元测试
#[cfg(test)]
mod tests;
