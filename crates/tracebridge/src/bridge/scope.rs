//! 作用域管理适配器
//! Scope-manager adapters
//!
//! 两种互斥的配置，构建时二选一并终身固定：默认模式直接委托引擎内建的
//! 活动 span 跟踪；自定义模式包装外部管理器，让引擎仍能观察激活并请求
//! 延续
//! Two mutually exclusive configurations fixed at construction time: the
//! default mode delegates to the engine's built-in tracking, the custom
//! mode wraps an external manager so the engine can still observe
//! activations and request continuations

use crate::api::scope::{Scope, ScopeManager};
use crate::api::span::Span;
use crate::bridge::convert::Converter;
use crate::engine::scope::{Continuation, ScopeRef};
use crate::engine::span::SpanRef;
use crate::engine::tracer::{EngineScopeManager, TracerEngine};
use std::fmt;
use std::sync::Arc;

/// 默认模式：转发到引擎内建的作用域跟踪
/// Default mode: forward to the engine's built-in scope tracking
pub struct DefaultScopeManager {
    engine: Arc<dyn TracerEngine>,
    converter: Converter,
}

impl DefaultScopeManager {
    pub(crate) fn new(engine: Arc<dyn TracerEngine>, converter: Converter) -> Self {
        Self { engine, converter }
    }
}

impl ScopeManager for DefaultScopeManager {
    fn activate(&self, span: &Span, finish_on_close: bool) -> Scope {
        let scope = self
            .engine
            .activate_span(self.converter.to_span_ref(span), finish_on_close);
        self.converter.to_scope(scope)
    }

    fn active(&self) -> Option<Scope> {
        self.engine
            .active_scope()
            .map(|scope| self.converter.to_scope(scope))
    }

    fn active_span(&self) -> Option<Span> {
        self.engine
            .active_span()
            .map(|span| self.converter.to_span(span))
    }
}

/// 自定义模式：把外部管理器包装成引擎的作用域管理 SPI
/// Custom mode: wrap the external manager behind the engine's
/// scope-manager SPI
pub struct CustomScopeManager {
    delegate: Arc<dyn ScopeManager>,
    converter: Converter,
}

impl CustomScopeManager {
    pub(crate) fn new(delegate: Arc<dyn ScopeManager>, converter: Converter) -> Self {
        Self { delegate, converter }
    }
}

impl EngineScopeManager for CustomScopeManager {
    fn activate(&self, span: SpanRef, finish_on_close: bool) -> ScopeRef {
        let span = self.converter.to_span(span);
        let scope = self.delegate.activate(&span, finish_on_close);
        ScopeRef::Wrapped(Arc::new(WrappedScope::new(scope)))
    }

    fn active(&self) -> Option<ScopeRef> {
        self.delegate
            .active()
            .map(|scope| ScopeRef::Wrapped(Arc::new(WrappedScope::new(scope))))
    }

    fn active_span(&self) -> Option<SpanRef> {
        self.delegate
            .active_span()
            .map(|span| self.converter.to_span_ref(&span))
    }
}

/// 双能力作用域：引擎视角下既是基础作用域也是传播作用域
/// Dual-capability scope: both a basic and a propagating scope from the
/// engine's point of view
///
/// 外部作用域是否支持异步传播在包装时探测一次并固定；没有能力时，
/// 传播操作是惰性的
/// Whether the external scope supports async propagation is probed once
/// at wrap time and fixed; without the capability the propagation
/// operations are inert
pub struct WrappedScope {
    delegate: Scope,
    supports_propagation: bool,
}

impl WrappedScope {
    pub(crate) fn new(delegate: Scope) -> Self {
        let supports_propagation = delegate.supports_async_propagation();
        Self {
            delegate,
            supports_propagation,
        }
    }

    pub(crate) fn delegate(&self) -> &Scope {
        &self.delegate
    }

    pub fn span(&self) -> SpanRef {
        self.delegate.span().to_ref()
    }

    pub fn close(&self) {
        self.delegate.close();
    }

    pub fn set_async_propagation(&self, enabled: bool) {
        if self.supports_propagation {
            self.delegate.set_async_propagation(enabled);
        }
    }

    pub fn is_async_propagating(&self) -> bool {
        self.supports_propagation && self.delegate.is_async_propagating()
    }

    pub fn capture(&self) -> Option<Continuation> {
        if self.supports_propagation {
            self.delegate.capture()
        } else {
            None
        }
    }
}

impl PartialEq for WrappedScope {
    fn eq(&self, other: &Self) -> bool {
        // 以被包装委托的身份判等
        // Equality is the identity of the wrapped delegate
        self.delegate == other.delegate
    }
}

impl Eq for WrappedScope {}

impl fmt::Debug for WrappedScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedScope")
            .field("supports_propagation", &self.supports_propagation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::scope::{ScopeHandle, ScopePropagation};
    use crate::bridge::tracer::Tracer;
    use crate::engine::local::LocalEngine;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// 不支持异步传播的外部作用域
    /// External scope without async-propagation support
    struct PlainScope {
        span: Span,
        manager: Arc<RecordingManager>,
    }

    impl ScopeHandle for PlainScope {
        fn span(&self) -> Span {
            self.span.clone()
        }

        fn close(&self) {
            self.manager.stack.lock().pop();
            self.manager.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// 支持异步传播的外部作用域
    /// External scope with async-propagation support
    struct PropagatingHandle {
        span: Span,
        flag: Arc<AtomicBool>,
    }

    struct HandleCapability {
        flag: Arc<AtomicBool>,
    }

    impl ScopePropagation for HandleCapability {
        fn set_async_propagation(&self, enabled: bool) {
            self.flag.store(enabled, Ordering::SeqCst);
        }

        fn is_async_propagating(&self) -> bool {
            self.flag.load(Ordering::SeqCst)
        }

        fn capture(&self) -> Option<Continuation> {
            None
        }
    }

    impl ScopeHandle for PropagatingHandle {
        fn span(&self) -> Span {
            self.span.clone()
        }

        fn close(&self) {}

        fn propagation(&self) -> Option<Arc<dyn ScopePropagation>> {
            Some(Arc::new(HandleCapability {
                flag: self.flag.clone(),
            }))
        }
    }

    /// 记录激活的外部管理器
    /// External manager that records activations
    #[derive(Default)]
    struct RecordingManager {
        stack: Mutex<Vec<Scope>>,
        activated: AtomicUsize,
        closed: AtomicUsize,
    }

    impl ScopeManager for Arc<RecordingManager> {
        fn activate(&self, span: &Span, _finish_on_close: bool) -> Scope {
            self.activated.fetch_add(1, Ordering::SeqCst);
            let scope = Scope::from_handle(Arc::new(PlainScope {
                span: span.clone(),
                manager: self.clone(),
            }));
            self.stack.lock().push(scope.clone());
            scope
        }

        fn active(&self) -> Option<Scope> {
            self.stack.lock().last().cloned()
        }

        fn active_span(&self) -> Option<Span> {
            self.active().map(|scope| scope.span())
        }
    }

    fn custom_tracer() -> (Tracer, Arc<RecordingManager>) {
        let manager = Arc::new(RecordingManager::default());
        let tracer = Tracer::builder()
            .scope_manager(Arc::new(manager.clone()))
            .build(LocalEngine::builder());
        (tracer, manager)
    }

    #[test]
    fn test_custom_manager_observes_activation() {
        let (tracer, manager) = custom_tracer();

        let scope = tracer.build_span("op").start_active(false);
        assert_eq!(manager.activated.load(Ordering::SeqCst), 1);
        assert_eq!(tracer.active_span(), Some(scope.span()));

        scope.close();
        assert_eq!(manager.closed.load(Ordering::SeqCst), 1);
        assert!(tracer.active_span().is_none());
    }

    #[test]
    fn test_engine_sees_custom_activation() {
        let (tracer, _manager) = custom_tracer();

        let scope = tracer.build_span("parent").start_active(false);
        // 引擎从自定义管理器取活动 span 并自动挂接父级
        // The engine consults the custom manager for the active span and
        // auto-parents against it
        let child = tracer.build_span("child").start();
        assert_eq!(
            child.context().trace_id(),
            scope.span().context().trace_id()
        );
        child.finish();
        scope.close();
    }

    #[test]
    fn test_plain_external_scope_has_inert_propagation() {
        let (tracer, _manager) = custom_tracer();

        let scope = tracer.build_span("op").start_active(false);
        assert!(!scope.supports_async_propagation());

        // 切换开关也不会让能力出现
        // Toggling does not conjure the capability
        scope.set_async_propagation(true);
        assert!(!scope.is_async_propagating());
        assert!(scope.capture().is_none());
        scope.close();
    }

    #[test]
    fn test_wrapped_scope_forwards_capability_when_present() {
        let flag = Arc::new(AtomicBool::new(false));
        let scope = Scope::from_handle(Arc::new(PropagatingHandle {
            span: Span::noop(),
            flag: flag.clone(),
        }));

        let wrapped = WrappedScope::new(scope);
        assert!(!wrapped.is_async_propagating());
        wrapped.set_async_propagation(true);
        assert!(wrapped.is_async_propagating());
        assert!(flag.load(Ordering::SeqCst));
        // 该能力实现不产出延续
        // This capability implementation yields no continuation
        assert!(wrapped.capture().is_none());
    }

    #[test]
    fn test_wrapped_scope_equality_is_delegate_identity() {
        let manager = Arc::new(RecordingManager::default());
        let scope = manager.activate(&Span::noop(), false);

        let a = WrappedScope::new(scope.clone());
        let b = WrappedScope::new(scope);
        let c = WrappedScope::new(manager.activate(&Span::noop(), false));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
