//! 运行时 - 值模型、作用域、组件展开、文档与会话

pub mod action;
pub mod component;
pub mod document;
pub mod scope;
pub mod session;
pub mod value;

pub use action::{ActionDescriptor, Instruction, Method, Trigger};
pub use component::{ComponentDefinition, ComponentRegistry, MAX_EXPANSION_DEPTH};
pub use document::{Document, NativeMacro, NodeId};
pub use scope::{ScopeArena, ScopeId, MAX_CHANGE_CHAIN};
pub use session::{Diagnostic, HttpTransport, Session, SwapFn, Transport};
pub use value::Value;
