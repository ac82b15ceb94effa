//! 面向应用的 tracer 门面与传播桥
//! Application-facing tracer facade and propagation bridge
//!
//! 纯同步的透传层：不起线程、不做 I/O，所有真实追踪工作都在引擎里
//! A purely synchronous call-through layer: no threads, no I/O, all
//! actual tracing work happens in the engine

use crate::api::propagation::{
    ExtractCarrier, Format, InjectCarrier, TextMapExtract, TextMapInject,
};
use crate::api::scope::{Scope, ScopeManager};
use crate::api::span::{Span, SpanContext};
use crate::bridge::builder::SpanBuilder;
use crate::bridge::convert::Converter;
use crate::bridge::log::{DefaultLogHandler, LogHandler};
use crate::bridge::scope::{CustomScopeManager, DefaultScopeManager};
use crate::engine::codec::{CarrierGetter, CarrierSetter};
use crate::engine::tracer::{EngineBuilder, ScopeListener, TraceInterceptor, TracerEngine};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// 标准追踪 API 的入口
/// Entry point of the standard tracing API
pub struct Tracer {
    engine: Arc<dyn TracerEngine>,
    scope_manager: Arc<dyn ScopeManager>,
    converter: Converter,
}

impl Tracer {
    pub fn builder() -> TracerBuilder {
        TracerBuilder::default()
    }

    /// 默认模式快捷方式：直接挂到一个已构建的引擎上
    /// Default-mode shortcut: attach to an already built engine
    pub fn with_engine(engine: Arc<dyn TracerEngine>) -> Self {
        Self::builder().build_with_engine(engine)
    }

    /// 创建 span 构建器
    /// Create a span builder
    pub fn build_span(&self, operation_name: &str) -> SpanBuilder {
        SpanBuilder::new(self.engine.build_span(operation_name), self.converter.clone())
    }

    /// 把上下文注入载体；不支持的载体形态记录调试日志且不写入任何条目
    /// Inject a context into a carrier; unsupported carrier shapes log at
    /// debug and write nothing
    pub fn inject(&self, context: &SpanContext, format: Format, carrier: InjectCarrier<'_>) {
        match carrier {
            InjectCarrier::TextMap(map) => {
                let context = self.converter.to_context(context);
                let mut setter = TextMapSetter { carrier: map };
                self.engine.inject(&context, &mut setter);
            }
            InjectCarrier::Binary(_) => {
                debug!(%format, "unsupported carrier for propagation, nothing injected");
            }
        }
    }

    /// 从载体提取上下文；不支持的载体形态记录调试日志并返回 None
    /// Extract a context from a carrier; unsupported carrier shapes log
    /// at debug and return None
    pub fn extract(&self, format: Format, carrier: ExtractCarrier<'_>) -> Option<SpanContext> {
        match carrier {
            ExtractCarrier::TextMap(map) => {
                // 载体可能只允许单遍迭代，而解码器会反复查询：先整体快照一次
                // The carrier may be single-pass while the decoder queries
                // repeatedly: snapshot it once up front
                let snapshot = SnapshotGetter::new(map);
                self.engine
                    .extract(&snapshot)
                    .map(|context| self.converter.to_span_context(context))
            }
            ExtractCarrier::Binary(_) => {
                debug!(%format, "unsupported carrier for propagation, nothing extracted");
                None
            }
        }
    }

    /// 激活 span；关闭返回的作用域不会结束 span
    /// Activate a span; closing the returned scope does not finish it
    pub fn activate_span(&self, span: &Span) -> Scope {
        self.scope_manager.activate(span, false)
    }

    /// 当前活动 span
    /// The currently active span
    pub fn active_span(&self) -> Option<Span> {
        self.scope_manager.active_span()
    }

    /// 生效中的作用域管理器
    /// The scope manager in effect
    pub fn scope_manager(&self) -> Arc<dyn ScopeManager> {
        self.scope_manager.clone()
    }

    /// 当前 trace 标识符；无活动 trace 时为 "0"
    /// Current trace identifier; "0" without an active trace
    pub fn trace_id(&self) -> String {
        self.engine.trace_id()
    }

    /// 当前 span 标识符；无活动 span 时为 "0"
    /// Current span identifier; "0" without an active span
    pub fn span_id(&self) -> String {
        self.engine.span_id()
    }

    /// 注册追踪拦截器（透传）
    /// Register a trace interceptor (pass-through)
    pub fn add_trace_interceptor(&self, interceptor: Arc<dyn TraceInterceptor>) -> bool {
        self.engine.add_trace_interceptor(interceptor)
    }

    /// 注册作用域监听器（透传）
    /// Register a scope listener (pass-through)
    pub fn add_scope_listener(&self, listener: Arc<dyn ScopeListener>) {
        self.engine.add_scope_listener(listener)
    }

    /// 关闭引擎；失败只记录日志，不向调用方抛出
    /// Close the engine; failures are logged, never surfaced to the caller
    pub fn close(&self) {
        if let Err(err) = self.engine.close() {
            warn!("failed to close trace engine: {err}");
        }
    }
}

/// tracer 构建配置；构建完成后全部不可变
/// Tracer construction configuration; immutable once built
pub struct TracerBuilder {
    scope_manager: Option<Arc<dyn ScopeManager>>,
    log_handler: Arc<dyn LogHandler>,
}

impl Default for TracerBuilder {
    fn default() -> Self {
        Self {
            scope_manager: None,
            log_handler: Arc::new(DefaultLogHandler),
        }
    }
}

impl TracerBuilder {
    /// 使用外部提供的作用域管理器（自定义模式）
    /// Use an externally supplied scope manager (custom mode)
    pub fn scope_manager(mut self, manager: Arc<dyn ScopeManager>) -> Self {
        self.scope_manager = Some(manager);
        self
    }

    /// 替换日志处理器
    /// Replace the log handler
    pub fn log_handler(mut self, handler: Arc<dyn LogHandler>) -> Self {
        self.log_handler = handler;
        self
    }

    /// 装配引擎并构建 tracer
    /// Assemble the engine and build the tracer
    pub fn build<B: EngineBuilder>(self, mut engine: B) -> Tracer {
        let converter = Converter::new(self.log_handler);
        match self.scope_manager {
            Some(manager) => {
                // 引擎通过包装后的 SPI 继续观察外部管理器的激活
                // The engine keeps observing the external manager's
                // activations through the wrapped SPI
                engine.install_scope_manager(Arc::new(CustomScopeManager::new(
                    manager.clone(),
                    converter.clone(),
                )));
                let engine = engine.build();
                Tracer {
                    engine,
                    scope_manager: manager,
                    converter,
                }
            }
            None => {
                let engine = engine.build();
                let scope_manager =
                    Arc::new(DefaultScopeManager::new(engine.clone(), converter.clone()));
                Tracer {
                    engine,
                    scope_manager,
                    converter,
                }
            }
        }
    }

    /// 挂到已构建的引擎上；已构建的引擎无法再安装自定义管理器
    /// Attach to an already built engine; a custom manager can no longer
    /// be installed on it
    pub fn build_with_engine(self, engine: Arc<dyn TracerEngine>) -> Tracer {
        if self.scope_manager.is_some() {
            warn!("custom scope manager requires assembling the engine through build(), ignoring");
        }
        let converter = Converter::new(self.log_handler);
        let scope_manager = Arc::new(DefaultScopeManager::new(engine.clone(), converter.clone()));
        Tracer {
            engine,
            scope_manager,
            converter,
        }
    }
}

/// 注入适配：carrier.put(key, value)
/// Inject adapter: carrier.put(key, value)
struct TextMapSetter<'a> {
    carrier: &'a mut dyn TextMapInject,
}

impl CarrierSetter for TextMapSetter<'_> {
    fn set(&mut self, key: &str, value: &str) {
        self.carrier.put(key, value);
    }
}

/// 提取适配：载体条目的一次性快照
/// Extract adapter: a one-time snapshot of the carrier's entries
struct SnapshotGetter {
    entries: HashMap<String, String>,
}

impl SnapshotGetter {
    fn new(carrier: &dyn TextMapExtract) -> Self {
        Self {
            entries: carrier.entries().into_iter().collect(),
        }
    }
}

impl CarrierGetter for SnapshotGetter {
    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::local::LocalEngine;

    fn tracer() -> Tracer {
        Tracer::builder().build(LocalEngine::builder())
    }

    #[test]
    fn test_inject_into_unsupported_carrier_is_silent() {
        let tracer = tracer();
        let span = tracer.build_span("op").start();

        let mut buffer: Vec<u8> = Vec::new();
        tracer.inject(
            &span.context(),
            Format::Binary,
            InjectCarrier::Binary(&mut buffer),
        );
        assert!(buffer.is_empty());
        span.finish();
    }

    #[test]
    fn test_extract_from_unsupported_carrier_is_silent() {
        let tracer = tracer();
        let buffer = [1u8, 2, 3];
        assert!(
            tracer
                .extract(Format::Binary, ExtractCarrier::Binary(&buffer))
                .is_none()
        );
    }

    #[test]
    fn test_inject_writes_linkage_and_baggage() {
        let tracer = tracer();
        let span = tracer.build_span("op").start();
        span.set_baggage_item("user", "42");

        let mut carrier: HashMap<String, String> = HashMap::new();
        tracer.inject(
            &span.context(),
            Format::HttpHeaders,
            InjectCarrier::TextMap(&mut carrier),
        );

        assert!(carrier.contains_key("x-tracebridge-trace-id"));
        assert!(carrier.contains_key("x-tracebridge-parent-id"));
        assert_eq!(
            carrier.get("x-tracebridge-baggage-user").map(String::as_str),
            Some("42")
        );
        span.finish();
    }

    #[test]
    fn test_noop_context_injects_nothing_linked() {
        let tracer = tracer();
        let mut carrier: HashMap<String, String> = HashMap::new();
        tracer.inject(
            &SpanContext::noop(),
            Format::TextMap,
            InjectCarrier::TextMap(&mut carrier),
        );
        assert!(carrier.is_empty());
    }

    #[test]
    fn test_activate_span_does_not_finish_on_close() {
        let tracer = tracer();
        let span = tracer.build_span("op").start();

        let scope = tracer.activate_span(&span);
        assert_eq!(tracer.active_span(), Some(span.clone()));
        assert_ne!(tracer.trace_id(), "0");
        assert_ne!(tracer.span_id(), "0");

        scope.close();
        assert!(tracer.active_span().is_none());
        assert_eq!(tracer.trace_id(), "0");
        span.finish();
    }

    #[test]
    fn test_close_twice_logs_instead_of_failing() {
        let tracer = tracer();
        tracer.close();
        tracer.close();
    }
}
