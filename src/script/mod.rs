//! 脚本能力接口 - 嵌入脚本由外部解释器执行，核心只注入能力
//!
//! 核心从不解释脚本文本：声明阶段把 `<script>` 正文交给引擎，引擎
//! 通过 [`ScriptHost`] 回调声明变量、注册订阅和宏。回调以不透明的
//! [`FuncRef`] 句柄存回核心，之后由核心按需再交给引擎调用。

use std::collections::HashMap;

use crate::error::ScriptError;
use crate::runtime::scope::ScopeId;
use crate::runtime::value::Value;

/// 引擎侧持有的函数句柄，核心只负责保存与回传
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncRef(pub u64);

/// 核心暴露给脚本引擎的宿主能力
pub trait ScriptHost {
    /// 沿父链读变量；未声明返回 `Nil`
    fn get(&self, scope: ScopeId, name: &str) -> Value;

    /// 写被寻址作用域的变量（遮蔽语义，写合并）
    fn set(&mut self, scope: ScopeId, name: &str, value: Value);

    /// 注册 `on_change` 订阅，按注册顺序触发
    fn subscribe(&mut self, scope: ScopeId, name: &str, callback: FuncRef);

    /// 注册 `init` 回调，接线阶段统一调用
    fn on_init(&mut self, scope: ScopeId, callback: FuncRef);

    /// 注册作用域级文本宏
    fn define_macro(&mut self, scope: ScopeId, name: &str, expander: FuncRef);

    /// 注册全局样式别名
    fn define_alias(&mut self, name: &str, target: &str);

    /// 显式寻址：按 eid 找到拥有该节点的作用域
    fn scope_by_eid(&self, eid: &str) -> Option<ScopeId>;
}

/// 外部脚本解释器的注入接口
pub trait ScriptEngine {
    /// 在给定作用域里执行一段脚本正文
    fn eval(
        &mut self,
        source: &str,
        scope: ScopeId,
        host: &mut dyn ScriptHost,
    ) -> Result<Value, ScriptError>;

    /// 调用之前捕获的回调
    fn call(
        &mut self,
        func: FuncRef,
        args: &[Value],
        scope: ScopeId,
        host: &mut dyn ScriptHost,
    ) -> Result<Value, ScriptError>;
}

type ScriptFn = Box<dyn FnMut(&mut dyn ScriptHost, ScopeId, &[Value]) -> Result<Value, ScriptError>>;

/// 基于闭包的引擎：按脚本正文精确匹配注册的处理闭包
///
/// 足够驱动测试和不需要完整解释器的嵌入场景。字面量（数字、布尔、
/// 带引号的字符串）内置求值，组件参数默认值表达式无需注册。
#[derive(Default)]
pub struct ClosureEngine {
    sources: HashMap<String, ScriptFn>,
    funcs: HashMap<FuncRef, ScriptFn>,
    next_func: u64,
}

impl ClosureEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为某段脚本正文注册处理闭包；正文按去空白后的内容匹配
    pub fn on_source<F>(&mut self, source: &str, handler: F)
    where
        F: FnMut(&mut dyn ScriptHost, ScopeId, &[Value]) -> Result<Value, ScriptError> + 'static,
    {
        self.sources.insert(source.trim().to_string(), Box::new(handler));
    }

    /// 注册一个可被捕获回调引用的闭包
    pub fn func<F>(&mut self, handler: F) -> FuncRef
    where
        F: FnMut(&mut dyn ScriptHost, ScopeId, &[Value]) -> Result<Value, ScriptError> + 'static,
    {
        self.next_func += 1;
        let func = FuncRef(self.next_func);
        self.funcs.insert(func, Box::new(handler));
        func
    }

    fn eval_literal(source: &str) -> Option<Value> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Some(Value::Nil);
        }
        if trimmed == "true" {
            return Some(Value::Bool(true));
        }
        if trimmed == "false" {
            return Some(Value::Bool(false));
        }
        if let Ok(num) = trimmed.parse::<f64>() {
            return Some(Value::Number(num));
        }
        if trimmed.len() >= 2 {
            let bytes = trimmed.as_bytes();
            if (bytes[0] == b'"' && bytes[trimmed.len() - 1] == b'"')
                || (bytes[0] == b'\'' && bytes[trimmed.len() - 1] == b'\'')
            {
                return Some(Value::Str(trimmed[1..trimmed.len() - 1].to_string()));
            }
        }
        None
    }
}

impl ScriptEngine for ClosureEngine {
    fn eval(
        &mut self,
        source: &str,
        scope: ScopeId,
        host: &mut dyn ScriptHost,
    ) -> Result<Value, ScriptError> {
        if let Some(value) = Self::eval_literal(source) {
            return Ok(value);
        }

        match self.sources.get_mut(source.trim()) {
            Some(handler) => handler(host, scope, &[]),
            None => Err(ScriptError::new(format!(
                "no handler registered for script: {}",
                source.trim()
            ))),
        }
    }

    fn call(
        &mut self,
        func: FuncRef,
        args: &[Value],
        scope: ScopeId,
        host: &mut dyn ScriptHost,
    ) -> Result<Value, ScriptError> {
        match self.funcs.get_mut(&func) {
            Some(handler) => handler(host, scope, args),
            None => Err(ScriptError::new(format!("dangling FuncRef({})", func.0))),
        }
    }
}
