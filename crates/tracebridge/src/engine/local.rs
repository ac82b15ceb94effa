//! 进程内参考引擎
//!
//! 契约的最小真实现：标识符生成、线程栈式活动作用域、按 trace 缓冲并在根
//! span 完成时应用拦截器。供测试与示例使用；上报、采样等都不在这里。

use super::codec::{
    CarrierGetter, CarrierSetter, ContextExtractor, ContextInjector, TextHeaderCodec,
};
use super::context::{EngineContext, LocalContext};
use super::id::{SpanId, TraceId};
use super::scope::{Continuation, EngineContinuation, PropagatingScope, ScopeRef};
use super::span::{EngineSpan, LogRecord, SpanData, SpanRef, TagValue};
use super::tracer::{
    EngineBuilder, EngineError, EngineScopeManager, EngineSpanBuilder, ScopeListener,
    TraceInterceptor, TracerEngine,
};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, ThreadId};
use tracing::debug;

fn datetime_from_micros(timestamp_micros: u64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(timestamp_micros as i64).unwrap_or_else(Utc::now)
}

/// 参考引擎配置
#[derive(Debug, Clone)]
pub struct LocalEngineConfig {
    /// 服务名称
    pub service_name: String,
    /// 完成缓冲区上限，超出的 span 被丢弃
    pub max_finished_spans: usize,
}

impl Default for LocalEngineConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown-service".to_string(),
            max_finished_spans: 2048,
        }
    }
}

impl LocalEngineConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    pub fn with_max_finished_spans(mut self, max: usize) -> Self {
        self.max_finished_spans = max;
        self
    }
}

/// 每线程的活动作用域栈，由引擎持有
#[derive(Default)]
struct ScopeStack {
    stacks: Mutex<HashMap<ThreadId, Vec<Arc<LocalScope>>>>,
}

impl ScopeStack {
    fn push(&self, scope: Arc<LocalScope>) {
        self.stacks
            .lock()
            .entry(thread::current().id())
            .or_default()
            .push(scope);
    }

    // 作用域必须在激活它的线程上关闭
    fn remove(&self, target: *const LocalScope) {
        let id = thread::current().id();
        let mut stacks = self.stacks.lock();
        if let Some(stack) = stacks.get_mut(&id) {
            stack.retain(|scope| !std::ptr::eq(Arc::as_ptr(scope), target));
            if stack.is_empty() {
                stacks.remove(&id);
            }
        }
    }

    fn top(&self) -> Option<Arc<LocalScope>> {
        self.stacks
            .lock()
            .get(&thread::current().id())
            .and_then(|stack| stack.last().cloned())
    }
}

struct EngineShared {
    config: LocalEngineConfig,
    injector: Arc<dyn ContextInjector>,
    extractor: Arc<dyn ContextExtractor>,
    scope_manager: Option<Arc<dyn EngineScopeManager>>,
    scopes: ScopeStack,
    interceptors: RwLock<Vec<Arc<dyn TraceInterceptor>>>,
    listeners: RwLock<Vec<Arc<dyn ScopeListener>>>,
    pending: Mutex<HashMap<u64, Vec<SpanData>>>,
    finished: Mutex<Vec<SpanData>>,
    closed: AtomicBool,
}

impl EngineShared {
    fn active_scope(&self) -> Option<ScopeRef> {
        if let Some(manager) = &self.scope_manager {
            return manager.active();
        }
        self.scopes
            .top()
            .map(|scope| ScopeRef::Propagating(scope))
    }

    fn active_span(&self) -> Option<SpanRef> {
        if let Some(manager) = &self.scope_manager {
            return manager.active_span();
        }
        self.scopes.top().map(|scope| scope.span.clone())
    }

    fn notify_activated(&self) {
        for listener in self.listeners.read().iter() {
            listener.after_scope_activated();
        }
    }

    fn notify_closed(&self) {
        for listener in self.listeners.read().iter() {
            listener.after_scope_closed();
        }
    }

    // local_root：没有父级，或父级在另一个进程（提取而来）
    // local_root: no parent, or the parent lives in another process
    fn record_finished(&self, data: SpanData, local_root: bool) {
        if self.closed.load(Ordering::SeqCst) {
            debug!("engine closed, dropping finished span");
            return;
        }
        let key = data.trace_id.as_u64();
        let completed = {
            let mut pending = self.pending.lock();
            pending.entry(key).or_default().push(data);
            // trace 在其本地根 span 完成时冲刷；迟到的 span 由 flush/close 兜底
            if local_root { pending.remove(&key) } else { None }
        };
        if let Some(trace) = completed {
            self.complete_trace(trace);
        }
    }

    fn complete_trace(&self, mut trace: Vec<SpanData>) {
        for interceptor in self.interceptors.read().iter() {
            trace = interceptor.on_trace_complete(trace);
            if trace.is_empty() {
                return;
            }
        }
        let mut finished = self.finished.lock();
        for span in trace {
            if finished.len() >= self.config.max_finished_spans {
                debug!("finished span buffer full, dropping span");
                break;
            }
            finished.push(span);
        }
    }

    fn flush_pending(&self) {
        let drained: Vec<Vec<SpanData>> = {
            let mut pending = self.pending.lock();
            pending.drain().map(|(_, trace)| trace).collect()
        };
        for trace in drained {
            self.complete_trace(trace);
        }
    }
}

fn activate_scope(shared: &Arc<EngineShared>, span: SpanRef, finish_on_close: bool) -> ScopeRef {
    if let Some(manager) = &shared.scope_manager {
        return manager.activate(span, finish_on_close);
    }
    let scope = Arc::new(LocalScope {
        shared: shared.clone(),
        span,
        finish_on_close,
        closed: AtomicBool::new(false),
        async_propagating: AtomicBool::new(true),
    });
    shared.scopes.push(scope.clone());
    shared.notify_activated();
    ScopeRef::Propagating(scope)
}

struct SpanState {
    operation_name: String,
    tags: HashMap<String, TagValue>,
    logs: Vec<LogRecord>,
    start_time: DateTime<Utc>,
}

struct LocalSpan {
    shared: Arc<EngineShared>,
    context: Arc<LocalContext>,
    parent_span_id: Option<SpanId>,
    local_root: bool,
    state: Mutex<SpanState>,
    finished: AtomicBool,
}

impl LocalSpan {
    fn finish_with(&self, end_time: DateTime<Utc>) {
        // 恰好结束一次
        if self.finished.swap(true, Ordering::SeqCst) {
            return;
        }
        let data = {
            let state = self.state.lock();
            SpanData {
                trace_id: self.context.trace_id(),
                span_id: self.context.span_id(),
                parent_span_id: self.parent_span_id,
                operation_name: state.operation_name.clone(),
                service_name: self.shared.config.service_name.clone(),
                start_time: state.start_time,
                end_time,
                tags: state.tags.clone(),
                baggage: self.context.baggage_items().into_iter().collect(),
                logs: state.logs.clone(),
            }
        };
        self.shared.record_finished(data, self.local_root);
    }
}

impl EngineSpan for LocalSpan {
    fn context(&self) -> EngineContext {
        EngineContext::Local(self.context.clone())
    }

    fn set_tag(&self, key: &str, value: TagValue) {
        if self.finished.load(Ordering::SeqCst) {
            return;
        }
        self.state.lock().tags.insert(key.to_string(), value);
    }

    fn set_operation_name(&self, name: &str) {
        if self.finished.load(Ordering::SeqCst) {
            return;
        }
        self.state.lock().operation_name = name.to_string();
    }

    fn set_baggage_item(&self, key: &str, value: &str) {
        self.context.set_baggage_item(key, value);
    }

    fn baggage_item(&self, key: &str) -> Option<String> {
        self.context.baggage_item(key)
    }

    fn add_log(&self, timestamp_micros: Option<u64>, fields: Vec<(String, Value)>) {
        if self.finished.load(Ordering::SeqCst) {
            return;
        }
        let timestamp = timestamp_micros
            .map(datetime_from_micros)
            .unwrap_or_else(Utc::now);
        self.state.lock().logs.push(LogRecord { timestamp, fields });
    }

    fn finish(&self) {
        self.finish_with(Utc::now());
    }

    fn finish_at(&self, timestamp_micros: u64) {
        self.finish_with(datetime_from_micros(timestamp_micros));
    }
}

struct LocalScope {
    shared: Arc<EngineShared>,
    span: SpanRef,
    finish_on_close: bool,
    closed: AtomicBool,
    async_propagating: AtomicBool,
}

impl PropagatingScope for LocalScope {
    fn span(&self) -> SpanRef {
        self.span.clone()
    }

    fn close(&self) {
        // 恰好停用一次
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shared.scopes.remove(self as *const LocalScope);
        if self.finish_on_close {
            self.span.finish();
        }
        self.shared.notify_closed();
    }

    fn set_async_propagation(&self, enabled: bool) {
        self.async_propagating.store(enabled, Ordering::SeqCst);
    }

    fn is_async_propagating(&self) -> bool {
        self.async_propagating.load(Ordering::SeqCst)
    }

    fn capture(&self) -> Option<Continuation> {
        if !self.is_async_propagating() {
            return None;
        }
        Some(Continuation::new(Arc::new(LocalContinuation {
            shared: self.shared.clone(),
            span: self.span.clone(),
        })))
    }
}

struct LocalContinuation {
    shared: Arc<EngineShared>,
    span: SpanRef,
}

impl EngineContinuation for LocalContinuation {
    fn activate(&self) -> ScopeRef {
        activate_scope(&self.shared, self.span.clone(), false)
    }
}

struct LocalSpanBuilder {
    shared: Arc<EngineShared>,
    operation_name: String,
    parent: Option<EngineContext>,
    ignore_active: bool,
    tags: HashMap<String, TagValue>,
    start_time: Option<DateTime<Utc>>,
}

impl LocalSpanBuilder {
    fn new(shared: Arc<EngineShared>, operation_name: &str) -> Self {
        Self {
            shared,
            operation_name: operation_name.to_string(),
            parent: None,
            ignore_active: false,
            tags: HashMap::new(),
            start_time: None,
        }
    }

    fn into_span(self) -> Arc<LocalSpan> {
        let LocalSpanBuilder {
            shared,
            operation_name,
            parent,
            ignore_active,
            mut tags,
            start_time,
        } = self;

        let inherited = match parent {
            Some(ctx) if !ctx.is_none() => Some(ctx),
            // 显式空父级：既不挂接也不回退到活动 span
            Some(_) => None,
            None if !ignore_active => shared
                .active_span()
                .map(|span| span.context())
                .filter(|ctx| !ctx.is_none()),
            None => None,
        };

        let (trace_id, parent_span_id, local_root, baggage) = match &inherited {
            Some(EngineContext::Local(parent)) => (
                parent.trace_id(),
                Some(parent.span_id()),
                false,
                parent.baggage_items().into_iter().collect(),
            ),
            // 提取的父级在另一个进程：本 span 是本地根
            // An extracted parent lives in another process: this span is
            // the local root
            Some(EngineContext::Extracted(parent)) => {
                for (key, value) in parent.tags() {
                    tags.entry(key.clone())
                        .or_insert_with(|| TagValue::String(value.clone()));
                }
                (
                    parent.trace_id(),
                    Some(parent.span_id()),
                    true,
                    parent.baggage_items().into_iter().collect(),
                )
            }
            // 标签上下文没有链路：开启新 trace，但继承标签与 baggage
            Some(EngineContext::Tag(parent)) => {
                for (key, value) in parent.tags() {
                    tags.entry(key.clone())
                        .or_insert_with(|| TagValue::String(value.clone()));
                }
                (
                    TraceId::new(),
                    None,
                    true,
                    parent.baggage_items().into_iter().collect(),
                )
            }
            Some(EngineContext::None) | None => (TraceId::new(), None, true, HashMap::new()),
        };

        let context = Arc::new(LocalContext::with_baggage(trace_id, SpanId::new(), baggage));
        Arc::new(LocalSpan {
            shared,
            context,
            parent_span_id,
            local_root,
            state: Mutex::new(SpanState {
                operation_name,
                tags,
                logs: Vec::new(),
                start_time: start_time.unwrap_or_else(Utc::now),
            }),
            finished: AtomicBool::new(false),
        })
    }
}

impl EngineSpanBuilder for LocalSpanBuilder {
    fn as_child_of(&mut self, parent: EngineContext) {
        self.parent = Some(parent);
    }

    fn ignore_active_span(&mut self) {
        self.ignore_active = true;
    }

    fn with_tag(&mut self, key: &str, value: TagValue) {
        self.tags.insert(key.to_string(), value);
    }

    fn with_start_timestamp(&mut self, timestamp_micros: u64) {
        self.start_time = Some(datetime_from_micros(timestamp_micros));
    }

    fn start(self: Box<Self>) -> SpanRef {
        SpanRef::Live((*self).into_span())
    }

    fn start_active(self: Box<Self>, finish_on_close: bool) -> ScopeRef {
        let shared = self.shared.clone();
        let span = SpanRef::Live((*self).into_span());
        activate_scope(&shared, span, finish_on_close)
    }
}

/// 参考引擎构建器
pub struct LocalEngineBuilder {
    config: LocalEngineConfig,
    injector: Option<Arc<dyn ContextInjector>>,
    extractor: Option<Arc<dyn ContextExtractor>>,
    scope_manager: Option<Arc<dyn EngineScopeManager>>,
}

impl Default for LocalEngineBuilder {
    fn default() -> Self {
        Self {
            config: LocalEngineConfig::default(),
            injector: None,
            extractor: None,
            scope_manager: None,
        }
    }
}

impl LocalEngineBuilder {
    pub fn config(mut self, config: LocalEngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn service_name(mut self, service_name: impl Into<String>) -> Self {
        self.config.service_name = service_name.into();
        self
    }

    pub fn injector(mut self, injector: Arc<dyn ContextInjector>) -> Self {
        self.injector = Some(injector);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn ContextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn scope_manager(mut self, manager: Arc<dyn EngineScopeManager>) -> Self {
        self.scope_manager = Some(manager);
        self
    }

    /// 构建并返回可克隆的具体句柄（测试中常用来读取完成缓冲）
    pub fn build_local(self) -> LocalEngine {
        let codec = Arc::new(TextHeaderCodec::new());
        LocalEngine {
            shared: Arc::new(EngineShared {
                config: self.config,
                injector: self.injector.unwrap_or_else(|| codec.clone()),
                extractor: self.extractor.unwrap_or(codec),
                scope_manager: self.scope_manager,
                scopes: ScopeStack::default(),
                interceptors: RwLock::new(Vec::new()),
                listeners: RwLock::new(Vec::new()),
                pending: Mutex::new(HashMap::new()),
                finished: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }
}

impl EngineBuilder for LocalEngineBuilder {
    fn install_scope_manager(&mut self, manager: Arc<dyn EngineScopeManager>) {
        self.scope_manager = Some(manager);
    }

    fn build(self) -> Arc<dyn TracerEngine> {
        Arc::new(self.build_local())
    }
}

/// 进程内参考引擎；句柄可克隆，克隆共享同一内部状态
#[derive(Clone)]
pub struct LocalEngine {
    shared: Arc<EngineShared>,
}

impl LocalEngine {
    pub fn builder() -> LocalEngineBuilder {
        LocalEngineBuilder::default()
    }

    /// 已完成（且通过拦截器）的 span 数据
    pub fn finished_spans(&self) -> Vec<SpanData> {
        self.shared.finished.lock().clone()
    }
}

impl TracerEngine for LocalEngine {
    fn build_span(&self, operation_name: &str) -> Box<dyn EngineSpanBuilder> {
        Box::new(LocalSpanBuilder::new(self.shared.clone(), operation_name))
    }

    fn activate_span(&self, span: SpanRef, finish_on_close: bool) -> ScopeRef {
        activate_scope(&self.shared, span, finish_on_close)
    }

    fn active_scope(&self) -> Option<ScopeRef> {
        self.shared.active_scope()
    }

    fn active_span(&self) -> Option<SpanRef> {
        self.shared.active_span()
    }

    fn trace_id(&self) -> String {
        self.shared
            .active_span()
            .and_then(|span| span.context().trace_id())
            .map(|id| id.to_string())
            .unwrap_or_else(|| "0".to_string())
    }

    fn span_id(&self) -> String {
        self.shared
            .active_span()
            .and_then(|span| span.context().span_id())
            .map(|id| id.to_string())
            .unwrap_or_else(|| "0".to_string())
    }

    fn inject(&self, context: &EngineContext, setter: &mut dyn CarrierSetter) {
        self.shared.injector.inject(context, setter);
    }

    fn extract(&self, getter: &dyn CarrierGetter) -> Option<EngineContext> {
        self.shared.extractor.extract(getter)
    }

    fn add_trace_interceptor(&self, interceptor: Arc<dyn TraceInterceptor>) -> bool {
        let mut interceptors = self.shared.interceptors.write();
        if interceptors
            .iter()
            .any(|existing| Arc::ptr_eq(existing, &interceptor))
        {
            return false;
        }
        interceptors.push(interceptor);
        interceptors.sort_by_key(|interceptor| interceptor.priority());
        true
    }

    fn add_scope_listener(&self, listener: Arc<dyn ScopeListener>) {
        self.shared.listeners.write().push(listener);
    }

    fn flush(&self) -> Result<(), EngineError> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(EngineError::Closed);
        }
        self.shared.flush_pending();
        Ok(())
    }

    fn close(&self) -> Result<(), EngineError> {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return Err(EngineError::Closed);
        }
        self.shared.flush_pending();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn engine() -> LocalEngine {
        LocalEngine::builder().service_name("test-service").build_local()
    }

    #[test]
    fn test_root_span_flushes_on_finish() {
        let engine = engine();
        let mut builder = engine.build_span("op");
        builder.with_tag("k", TagValue::from("v"));
        let span = builder.start();
        span.finish();

        let finished = engine.finished_spans();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].operation_name, "op");
        assert_eq!(finished[0].service_name, "test-service");
        assert_eq!(finished[0].tags.get("k"), Some(&TagValue::from("v")));
        assert!(finished[0].is_root());
    }

    #[test]
    fn test_child_flushes_with_root() {
        let engine = engine();
        let parent = engine.build_span("parent").start();
        let mut child_builder = engine.build_span("child");
        child_builder.as_child_of(parent.context());
        let child = child_builder.start();

        child.finish();
        assert!(engine.finished_spans().is_empty());

        parent.finish();
        let finished = engine.finished_spans();
        assert_eq!(finished.len(), 2);

        let parent_data = finished.iter().find(|s| s.operation_name == "parent").unwrap();
        let child_data = finished.iter().find(|s| s.operation_name == "child").unwrap();
        assert_eq!(child_data.trace_id, parent_data.trace_id);
        assert_eq!(child_data.parent_span_id, Some(parent_data.span_id));
    }

    #[test]
    fn test_active_scope_is_a_stack() {
        let engine = engine();
        assert!(engine.active_span().is_none());
        assert_eq!(engine.trace_id(), "0");

        let outer = engine.build_span("outer").start_active(true);
        let outer_span = outer.span();
        assert_eq!(engine.active_span(), Some(outer_span.clone()));
        assert_ne!(engine.trace_id(), "0");

        let inner = engine.build_span("inner").start_active(true);
        assert_eq!(engine.active_span(), Some(inner.span()));
        // 自动从活动 span 继承父级
        let inner_ctx = inner.span().context();
        assert_eq!(inner_ctx.trace_id(), outer_span.context().trace_id());

        inner.close();
        assert_eq!(engine.active_span(), Some(outer_span));
        outer.close();
        assert!(engine.active_span().is_none());
        assert_eq!(engine.finished_spans().len(), 2);
    }

    #[test]
    fn test_scope_close_is_idempotent() {
        let engine = engine();
        let scope = engine.build_span("op").start_active(true);
        scope.close();
        scope.close();
        assert_eq!(engine.finished_spans().len(), 1);
    }

    #[test]
    fn test_ignore_active_span() {
        let engine = engine();
        let outer = engine.build_span("outer").start_active(true);
        let mut builder = engine.build_span("detached");
        builder.ignore_active_span();
        let detached = builder.start();

        assert_ne!(
            detached.context().trace_id(),
            outer.span().context().trace_id()
        );
        detached.finish();
        outer.close();
    }

    #[test]
    fn test_continuation_reactivates_span() {
        let engine = engine();
        let scope = engine.build_span("op").start_active(false);
        let span = scope.span();
        let continuation = scope.capture().expect("async propagation is on by default");
        scope.close();
        assert!(engine.active_span().is_none());

        let resumed = continuation.activate();
        assert_eq!(engine.active_span(), Some(span));
        resumed.close();
        assert!(engine.active_span().is_none());
    }

    #[test]
    fn test_capture_requires_async_propagation() {
        let engine = engine();
        let scope = engine.build_span("op").start_active(true);
        assert!(scope.is_async_propagating());

        scope.set_async_propagation(false);
        assert!(!scope.is_async_propagating());
        assert!(scope.capture().is_none());
        scope.close();
    }

    #[test]
    fn test_trace_interceptor() {
        struct DropAll;
        impl TraceInterceptor for DropAll {
            fn on_trace_complete(&self, _trace: Vec<SpanData>) -> Vec<SpanData> {
                Vec::new()
            }
        }

        let engine = engine();
        let interceptor: Arc<dyn TraceInterceptor> = Arc::new(DropAll);
        assert!(engine.add_trace_interceptor(interceptor.clone()));
        assert!(!engine.add_trace_interceptor(interceptor));

        engine.build_span("op").start().finish();
        assert!(engine.finished_spans().is_empty());
    }

    #[test]
    fn test_scope_listener_notified() {
        #[derive(Default)]
        struct Counting {
            activated: AtomicUsize,
            closed: AtomicUsize,
        }
        impl ScopeListener for Counting {
            fn after_scope_activated(&self) {
                self.activated.fetch_add(1, Ordering::SeqCst);
            }
            fn after_scope_closed(&self) {
                self.closed.fetch_add(1, Ordering::SeqCst);
            }
        }

        let engine = engine();
        let listener = Arc::new(Counting::default());
        engine.add_scope_listener(listener.clone());

        let scope = engine.build_span("op").start_active(true);
        assert_eq!(listener.activated.load(Ordering::SeqCst), 1);
        scope.close();
        assert_eq!(listener.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_explicit_timestamps() {
        let engine = engine();
        let mut builder = engine.build_span("op");
        builder.with_start_timestamp(1_000_000);
        let span = builder.start();
        span.finish();
        // finish_at 在已结束的 span 上是惰性的
        if let SpanRef::Live(live) = &span {
            live.finish_at(9_000_000);
        }

        let finished = engine.finished_spans();
        assert_eq!(finished.len(), 1);
        assert_eq!(
            finished[0].start_time,
            datetime_from_micros(1_000_000)
        );
    }

    #[test]
    fn test_finish_at_duration() {
        let engine = engine();
        let mut builder = engine.build_span("op");
        builder.with_start_timestamp(1_000_000);
        let span = builder.start();
        if let SpanRef::Live(live) = &span {
            live.finish_at(3_500_000);
        }

        let finished = engine.finished_spans();
        assert_eq!(finished[0].duration_ms(), 2500);
    }

    #[test]
    fn test_close_twice_errors() {
        let engine = engine();
        assert!(engine.close().is_ok());
        assert!(matches!(engine.close(), Err(EngineError::Closed)));
        assert!(matches!(engine.flush(), Err(EngineError::Closed)));
    }

    #[test]
    fn test_flush_drains_orphaned_spans() {
        let engine = engine();
        let root = engine.build_span("root").start();
        let mut child_builder = engine.build_span("child");
        child_builder.as_child_of(root.context());
        let child = child_builder.start();
        child.finish();

        assert!(engine.finished_spans().is_empty());
        engine.flush().unwrap();
        assert_eq!(engine.finished_spans().len(), 1);
    }
}
