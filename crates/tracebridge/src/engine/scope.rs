//! 引擎侧作用域模型
//! Engine-side scope model
//!
//! 引擎为"活动作用域"暴露两种互有重叠的能力形态：基础作用域与传播作用域。
//! 封闭的种类判别让转换层用一次 match 完成分派。
//! The engine exposes two overlapping capability shapes for "an active
//! scope": basic and propagating. The closed kind discriminator lets the
//! translation layer dispatch with a single match.

use super::span::SpanRef;
use crate::bridge::scope::WrappedScope;
use std::fmt;
use std::sync::Arc;

/// 基础活动作用域：只界定激活区间
/// Basic active scope: only bounds the activation period
pub trait EngineScope: Send + Sync {
    /// 作用域绑定的 span
    /// The span bound to this scope
    fn span(&self) -> SpanRef;
    /// 关闭作用域；必须恰好停用一次
    /// Close the scope; deactivates exactly once
    fn close(&self);
}

/// 带异步传播能力的活动作用域
/// Active scope with asynchronous-propagation capability
pub trait PropagatingScope: Send + Sync {
    fn span(&self) -> SpanRef;
    fn close(&self);
    /// 开关异步传播
    /// Toggle asynchronous propagation
    fn set_async_propagation(&self, enabled: bool);
    /// 是否正在异步传播
    /// Whether asynchronous propagation is on
    fn is_async_propagating(&self) -> bool;
    /// 捕获一个延续；未开启异步传播时返回 None
    /// Capture a continuation; None when async propagation is off
    fn capture(&self) -> Option<Continuation>;
}

/// 延续的引擎实现契约
/// Engine contract for continuations
pub trait EngineContinuation: Send + Sync {
    /// 在当前执行上下文重新激活被捕获的作用域
    /// Re-activate the captured scope on the current execution context
    fn activate(&self) -> ScopeRef;
}

/// 不透明的延续句柄 - 适配层从不检查其内容
/// Opaque continuation handle - the adapter never inspects its contents
#[derive(Clone)]
pub struct Continuation {
    inner: Arc<dyn EngineContinuation>,
}

impl Continuation {
    pub fn new(inner: Arc<dyn EngineContinuation>) -> Self {
        Self { inner }
    }

    pub fn activate(&self) -> ScopeRef {
        self.inner.activate()
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Continuation")
    }
}

/// 作用域种类判别 - 封闭的变体集合
/// Scope-kind discriminator - the closed variant set
#[derive(Clone)]
pub enum ScopeRef {
    /// 基础作用域
    /// Basic scope
    Basic(Arc<dyn EngineScope>),
    /// 传播作用域
    /// Propagating scope
    Propagating(Arc<dyn PropagatingScope>),
    /// 自定义管理器包装出的双能力作用域
    /// Dual-capability scope produced by the custom-manager wrapper
    Wrapped(Arc<WrappedScope>),
}

impl ScopeRef {
    pub fn span(&self) -> SpanRef {
        match self {
            ScopeRef::Basic(scope) => scope.span(),
            ScopeRef::Propagating(scope) => scope.span(),
            ScopeRef::Wrapped(scope) => scope.span(),
        }
    }

    pub fn close(&self) {
        match self {
            ScopeRef::Basic(scope) => scope.close(),
            ScopeRef::Propagating(scope) => scope.close(),
            ScopeRef::Wrapped(scope) => scope.close(),
        }
    }

    /// 基础作用域上开关传播是惰性的
    /// Toggling propagation on a basic scope is inert
    pub fn set_async_propagation(&self, enabled: bool) {
        match self {
            ScopeRef::Basic(_) => {}
            ScopeRef::Propagating(scope) => scope.set_async_propagation(enabled),
            ScopeRef::Wrapped(scope) => scope.set_async_propagation(enabled),
        }
    }

    pub fn is_async_propagating(&self) -> bool {
        match self {
            ScopeRef::Basic(_) => false,
            ScopeRef::Propagating(scope) => scope.is_async_propagating(),
            ScopeRef::Wrapped(scope) => scope.is_async_propagating(),
        }
    }

    pub fn capture(&self) -> Option<Continuation> {
        match self {
            ScopeRef::Basic(_) => None,
            ScopeRef::Propagating(scope) => scope.capture(),
            ScopeRef::Wrapped(scope) => scope.capture(),
        }
    }
}

impl PartialEq for ScopeRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ScopeRef::Basic(a), ScopeRef::Basic(b)) => Arc::ptr_eq(a, b),
            (ScopeRef::Propagating(a), ScopeRef::Propagating(b)) => Arc::ptr_eq(a, b),
            // 包装作用域以被包装委托的身份判等
            // Wrapped scopes compare by the identity of the wrapped delegate
            (ScopeRef::Wrapped(a), ScopeRef::Wrapped(b)) => a.as_ref() == b.as_ref(),
            _ => false,
        }
    }
}

impl Eq for ScopeRef {}

impl fmt::Debug for ScopeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeRef::Basic(_) => f.write_str("ScopeRef::Basic"),
            ScopeRef::Propagating(_) => f.write_str("ScopeRef::Propagating"),
            ScopeRef::Wrapped(_) => f.write_str("ScopeRef::Wrapped"),
        }
    }
}
