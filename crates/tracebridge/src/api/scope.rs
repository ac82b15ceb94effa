//! 标准 API 的作用域与作用域管理器
//! Standard-API scope and scope manager
//!
//! 作用域界定 span 的激活区间；若底层对象具备异步传播能力则保留之，
//! 否则相关操作降级为无操作而不是失败
//! A scope bounds a span's activation period; async-propagation
//! capability is preserved when the underlying object offers it and
//! degrades to no-ops otherwise

use super::span::Span;
use crate::bridge::convert::Converter;
use crate::engine::scope::{Continuation, EngineScope, PropagatingScope};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// 异步传播能力契约；第三方作用域可选择实现
/// Async-propagation capability contract; third-party scopes may offer it
pub trait ScopePropagation: Send + Sync {
    fn set_async_propagation(&self, enabled: bool);
    fn is_async_propagating(&self) -> bool;
    fn capture(&self) -> Option<Continuation>;
}

/// 第三方作用域句柄：外部作用域管理器返回的作用域实现此契约
/// Third-party scope handle: scopes returned by external scope managers
/// implement this contract
pub trait ScopeHandle: Send + Sync {
    /// 作用域绑定的 span
    /// The span bound to this scope
    fn span(&self) -> Span;
    /// 关闭作用域；必须恰好停用一次
    /// Close the scope; deactivates exactly once
    fn close(&self);
    /// 能力探测，包装时只调用一次
    /// Capability probe, consulted once at wrap time
    fn propagation(&self) -> Option<Arc<dyn ScopePropagation>> {
        None
    }
}

#[derive(Clone)]
enum ScopeKind {
    Basic {
        scope: Arc<dyn EngineScope>,
        converter: Converter,
    },
    Propagating {
        scope: Arc<dyn PropagatingScope>,
        converter: Converter,
    },
    Custom {
        handle: Arc<dyn ScopeHandle>,
        propagation: Option<Arc<dyn ScopePropagation>>,
    },
}

/// 标准 API 的作用域
/// Standard-API scope
#[derive(Clone)]
pub struct Scope {
    kind: ScopeKind,
}

impl Scope {
    pub(crate) fn basic(scope: Arc<dyn EngineScope>, converter: Converter) -> Self {
        Self {
            kind: ScopeKind::Basic { scope, converter },
        }
    }

    pub(crate) fn propagating(scope: Arc<dyn PropagatingScope>, converter: Converter) -> Self {
        Self {
            kind: ScopeKind::Propagating { scope, converter },
        }
    }

    /// 从第三方作用域句柄构建；传播能力在此一次性探测并固定
    /// Build from a third-party scope handle; the propagation capability
    /// is probed once here and fixed
    pub fn from_handle(handle: Arc<dyn ScopeHandle>) -> Self {
        let propagation = handle.propagation();
        Self {
            kind: ScopeKind::Custom {
                handle,
                propagation,
            },
        }
    }

    /// 作用域绑定的 span
    /// The span bound to this scope
    pub fn span(&self) -> Span {
        match &self.kind {
            ScopeKind::Basic { scope, converter } => converter.to_span(scope.span()),
            ScopeKind::Propagating { scope, converter } => converter.to_span(scope.span()),
            ScopeKind::Custom { handle, .. } => handle.span(),
        }
    }

    /// 关闭作用域
    /// Close the scope
    pub fn close(&self) {
        match &self.kind {
            ScopeKind::Basic { scope, .. } => scope.close(),
            ScopeKind::Propagating { scope, .. } => scope.close(),
            ScopeKind::Custom { handle, .. } => handle.close(),
        }
    }

    /// 是否具备异步传播能力
    /// Whether async-propagation capability is present
    pub fn supports_async_propagation(&self) -> bool {
        match &self.kind {
            ScopeKind::Basic { .. } => false,
            ScopeKind::Propagating { .. } => true,
            ScopeKind::Custom { propagation, .. } => propagation.is_some(),
        }
    }

    /// 开关异步传播；无能力时为无操作
    /// Toggle async propagation; inert without the capability
    pub fn set_async_propagation(&self, enabled: bool) {
        match &self.kind {
            ScopeKind::Basic { .. } => {}
            ScopeKind::Propagating { scope, .. } => scope.set_async_propagation(enabled),
            ScopeKind::Custom {
                propagation: Some(propagation),
                ..
            } => propagation.set_async_propagation(enabled),
            ScopeKind::Custom { .. } => {}
        }
    }

    /// 是否正在异步传播；无能力时恒为 false
    /// Whether async propagation is on; always false without the capability
    pub fn is_async_propagating(&self) -> bool {
        match &self.kind {
            ScopeKind::Basic { .. } => false,
            ScopeKind::Propagating { scope, .. } => scope.is_async_propagating(),
            ScopeKind::Custom {
                propagation: Some(propagation),
                ..
            } => propagation.is_async_propagating(),
            ScopeKind::Custom { .. } => false,
        }
    }

    /// 捕获延续；无能力时恒为 None
    /// Capture a continuation; always None without the capability
    pub fn capture(&self) -> Option<Continuation> {
        match &self.kind {
            ScopeKind::Basic { .. } => None,
            ScopeKind::Propagating { scope, .. } => scope.capture(),
            ScopeKind::Custom {
                propagation: Some(propagation),
                ..
            } => propagation.capture(),
            ScopeKind::Custom { .. } => None,
        }
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (ScopeKind::Basic { scope: a, .. }, ScopeKind::Basic { scope: b, .. }) => {
                Arc::ptr_eq(a, b)
            }
            (
                ScopeKind::Propagating { scope: a, .. },
                ScopeKind::Propagating { scope: b, .. },
            ) => Arc::ptr_eq(a, b),
            (ScopeKind::Custom { handle: a, .. }, ScopeKind::Custom { handle: b, .. }) => {
                Arc::ptr_eq(a, b)
            }
            _ => false,
        }
    }
}

impl Eq for Scope {}

impl Hash for Scope {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.kind {
            ScopeKind::Basic { scope, .. } => {
                state.write_usize(Arc::as_ptr(scope) as *const () as usize)
            }
            ScopeKind::Propagating { scope, .. } => {
                state.write_usize(Arc::as_ptr(scope) as *const () as usize)
            }
            ScopeKind::Custom { handle, .. } => {
                state.write_usize(Arc::as_ptr(handle) as *const () as usize)
            }
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ScopeKind::Basic { .. } => f.write_str("Scope(basic)"),
            ScopeKind::Propagating { .. } => f.write_str("Scope(propagating)"),
            ScopeKind::Custom { .. } => f.write_str("Scope(custom)"),
        }
    }
}

/// 作用域管理器契约；外部自定义管理器同样实现此 trait
/// Scope-manager contract; externally supplied managers implement this too
pub trait ScopeManager: Send + Sync {
    /// 激活 span；finish_on_close 决定关闭作用域时是否同时结束 span
    /// Activate a span; finish_on_close decides whether closing the scope
    /// also finishes the span
    fn activate(&self, span: &Span, finish_on_close: bool) -> Scope;
    /// 当前活动作用域
    /// The currently active scope
    fn active(&self) -> Option<Scope>;
    /// 当前活动 span
    /// The currently active span
    fn active_span(&self) -> Option<Span>;
}
