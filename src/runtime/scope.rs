//! 响应式作用域 - 变量、订阅、写合并

use std::collections::HashMap;

use crate::runtime::value::Value;
use crate::script::FuncRef;

/// `on_change` 回调链的深度上限；超出后中止当前动作
pub const MAX_CHANGE_CHAIN: usize = 16;

/// 作用域句柄（arena 下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub usize);

/// 一条 `(变量, 回调)` 订阅
#[derive(Debug, Clone)]
pub struct Subscription {
    pub variable: String,
    pub callback: FuncRef,
}

/// 单个组件实例的状态作用域
#[derive(Debug, Default)]
pub struct StateScope {
    pub parent: Option<ScopeId>,
    vars: HashMap<String, Value>,
    subs: Vec<Subscription>,
    pub init: Option<FuncRef>,
    /// 作用域级脚本宏表
    pub macros: HashMap<String, FuncRef>,
    alive: bool,
}

/// 作用域 arena；所有跨作用域访问都通过下标，不存在反向引用
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<StateScope>,
    /// 本轮的首写基线，按首写顺序记录 (作用域, 变量, 基线值)
    changelog: Vec<(ScopeId, String, Value)>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(StateScope {
            parent,
            alive: true,
            ..StateScope::default()
        });
        id
    }

    pub fn is_alive(&self, id: ScopeId) -> bool {
        self.scopes.get(id.0).map(|s| s.alive).unwrap_or(false)
    }

    /// 销毁作用域：变量与订阅立即失效
    pub fn destroy(&mut self, id: ScopeId) {
        if let Some(scope) = self.scopes.get_mut(id.0) {
            scope.alive = false;
            scope.vars.clear();
            scope.subs.clear();
            scope.init = None;
            scope.macros.clear();
        }
        self.changelog.retain(|(sid, _, _)| *sid != id);
    }

    /// 沿父链查找变量
    pub fn lookup(&self, from: ScopeId, name: &str) -> Option<Value> {
        let mut current = Some(from);
        while let Some(id) = current {
            let scope = self.scopes.get(id.0)?;
            if let Some(value) = scope.vars.get(name) {
                return Some(value.clone());
            }
            current = scope.parent;
        }
        None
    }

    /// 写变量：总是写到被寻址的作用域本身——子作用域遮蔽而非隐式
    /// 修改父作用域，跨作用域写必须显式寻址目标作用域。
    /// 首写基线进入变更日志用于写合并。
    pub fn set(&mut self, target: ScopeId, name: &str, value: Value) {
        let baseline = self
            .scopes
            .get(target.0)
            .and_then(|s| s.vars.get(name).cloned())
            .unwrap_or(Value::Nil);

        let seen = self
            .changelog
            .iter()
            .any(|(sid, var, _)| *sid == target && var == name);
        if !seen {
            self.changelog.push((target, name.to_string(), baseline));
        }

        if let Some(scope) = self.scopes.get_mut(target.0) {
            if scope.alive {
                scope.vars.insert(name.to_string(), value);
            }
        }
    }

    /// 在指定作用域里声明变量，不走父链
    pub fn declare(&mut self, id: ScopeId, name: &str, value: Value) {
        if let Some(scope) = self.scopes.get_mut(id.0) {
            if scope.alive {
                scope.vars.insert(name.to_string(), value);
            }
        }
    }

    pub fn subscribe(&mut self, id: ScopeId, name: &str, callback: FuncRef) {
        if let Some(scope) = self.scopes.get_mut(id.0) {
            scope.subs.push(Subscription {
                variable: name.to_string(),
                callback,
            });
        }
    }

    /// 注册顺序的订阅快照
    pub fn subscriptions(&self, id: ScopeId) -> Vec<Subscription> {
        self.scopes
            .get(id.0)
            .filter(|s| s.alive)
            .map(|s| s.subs.clone())
            .unwrap_or_default()
    }

    pub fn set_init(&mut self, id: ScopeId, callback: FuncRef) {
        if let Some(scope) = self.scopes.get_mut(id.0) {
            scope.init = Some(callback);
        }
    }

    pub fn init_of(&self, id: ScopeId) -> Option<FuncRef> {
        self.scopes.get(id.0).and_then(|s| s.init)
    }

    pub fn define_macro(&mut self, id: ScopeId, name: &str, expander: FuncRef) {
        if let Some(scope) = self.scopes.get_mut(id.0) {
            scope.macros.insert(name.to_string(), expander);
        }
    }

    /// 最近包围作用域的宏查找
    pub fn lookup_macro(&self, from: ScopeId, name: &str) -> Option<FuncRef> {
        let mut current = Some(from);
        while let Some(id) = current {
            let scope = self.scopes.get(id.0)?;
            if scope.alive {
                if let Some(func) = scope.macros.get(name) {
                    return Some(*func);
                }
            }
            current = scope.parent;
        }
        None
    }

    /// 开始一个动作轮，丢弃上一轮残留的基线
    pub fn begin_turn(&mut self) {
        self.changelog.clear();
    }

    /// 结算一步：取出终值与基线不同的变量（写合并——一轮内多次写
    /// 只按最终值比较一次），并清空日志供下一步链式传播使用。
    pub fn take_changes(&mut self) -> Vec<(ScopeId, String, Value)> {
        let log = std::mem::take(&mut self.changelog);
        let mut changes = Vec::new();

        for (id, name, baseline) in log {
            if !self.is_alive(id) {
                continue;
            }
            let current = self
                .scopes
                .get(id.0)
                .and_then(|s| s.vars.get(&name).cloned())
                .unwrap_or(Value::Nil);
            if current != baseline {
                changes.push((id, name, current));
            }
        }

        changes
    }
}
