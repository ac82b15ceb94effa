//! Span 构建适配器
//! Span builder adapter
//!
//! 每次 build_span 包装一个引擎构建器，把引用语义、标签类型、时间戳和
//! 启动方式翻译到引擎侧
//! Wraps one engine builder per build_span call, translating reference
//! semantics, tag types, timestamps and start modes to the engine side

use crate::api::scope::Scope;
use crate::api::span::{Span, SpanContext, Tag};
use crate::bridge::convert::Converter;
use crate::engine::context::EngineContext;
use crate::engine::span::TagValue;
use crate::engine::tracer::EngineSpanBuilder;
use tracing::debug;

/// "child of" 引用种类
/// The "child of" reference kind
pub const CHILD_OF: &str = "child_of";
/// "follows from" 引用种类
/// The "follows from" reference kind
pub const FOLLOWS_FROM: &str = "follows_from";

/// 面向应用的 span 构建器
/// Application-facing span builder
pub struct SpanBuilder {
    delegate: Box<dyn EngineSpanBuilder>,
    converter: Converter,
}

impl SpanBuilder {
    pub(crate) fn new(delegate: Box<dyn EngineSpanBuilder>, converter: Converter) -> Self {
        Self { delegate, converter }
    }

    /// 以上下文为父级；缺失的上下文仍作为显式空父级转发
    /// Parent by context; an absent context is still forwarded as an
    /// explicit empty parent
    pub fn as_child_of(mut self, parent: Option<&SpanContext>) -> Self {
        let context = parent
            .map(|parent| self.converter.to_context(parent))
            .unwrap_or(EngineContext::None);
        self.delegate.as_child_of(context);
        self
    }

    /// 以 span 为父级；缺失的 span 是无操作
    /// Parent by span; an absent span is a no-op
    pub fn as_child_of_span(mut self, parent: Option<&Span>) -> Self {
        if let Some(parent) = parent {
            let context = self.converter.to_span_ref(parent).context();
            self.delegate.as_child_of(context);
        }
        self
    }

    /// 添加引用；只接受 child_of 与 follows_from，其余记录日志后丢弃
    /// Add a reference; only child_of and follows_from are accepted, the
    /// rest are logged and dropped
    pub fn add_reference(mut self, reference_type: &str, referenced: Option<&SpanContext>) -> Self {
        let Some(referenced) = referenced else {
            return self;
        };

        let context = self.converter.to_context(referenced);
        if !context.has_trace() {
            debug!("expected a local or extracted context, dropping reference");
            return self;
        }

        if reference_type == CHILD_OF || reference_type == FOLLOWS_FROM {
            self.delegate.as_child_of(context);
        } else {
            debug!(
                reference_type,
                "only child_of and follows_from references are supported"
            );
        }
        self
    }

    /// 不从当前活动 span 自动继承父级
    /// Do not inherit a parent from the currently active span
    pub fn ignore_active_span(mut self) -> Self {
        self.delegate.ignore_active_span();
        self
    }

    /// 设置标签（同键后写覆盖）
    /// Set a tag (last write per key wins)
    pub fn with_tag(mut self, key: &str, value: impl Into<TagValue>) -> Self {
        self.delegate.with_tag(key, value.into());
        self
    }

    /// 用类型化标签键设置标签
    /// Set a tag through a typed tag key
    pub fn with_typed_tag<T: Into<TagValue>>(self, tag: &Tag<T>, value: T) -> Self {
        self.with_tag(tag.key(), value)
    }

    /// 覆盖开始时间；不调用则由引擎取当前时刻
    /// Override the start time; the engine uses the current instant otherwise
    pub fn with_start_timestamp(mut self, timestamp_micros: u64) -> Self {
        self.delegate.with_start_timestamp(timestamp_micros);
        self
    }

    /// 构建并启动 span，不激活
    /// Build and start the span without activating it
    pub fn start(self) -> Span {
        let SpanBuilder { delegate, converter } = self;
        converter.to_span(delegate.start())
    }

    /// start 的别名，语义相同
    /// Alias of start with identical semantics
    pub fn start_manual(self) -> Span {
        self.start()
    }

    /// 构建、启动并激活 span
    /// Build, start and activate the span in one step
    pub fn start_active(self, finish_on_close: bool) -> Scope {
        let SpanBuilder { delegate, converter } = self;
        converter.to_scope(delegate.start_active(finish_on_close))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::tracer::Tracer;
    use crate::engine::local::LocalEngine;
    use std::sync::Arc;

    fn tracer_with_engine() -> (Tracer, LocalEngine) {
        let engine = LocalEngine::builder().service_name("test-service").build_local();
        let tracer = Tracer::with_engine(Arc::new(engine.clone()));
        (tracer, engine)
    }

    #[test]
    fn test_child_of_context_becomes_ancestor() {
        let (tracer, engine) = tracer_with_engine();

        let parent = tracer.build_span("parent").start();
        let child = tracer
            .build_span("child")
            .as_child_of(Some(&parent.context()))
            .start();

        child.finish();
        parent.finish();

        let finished = engine.finished_spans();
        let parent_data = finished.iter().find(|s| s.operation_name == "parent").unwrap();
        let child_data = finished.iter().find(|s| s.operation_name == "child").unwrap();
        assert_eq!(child_data.trace_id, parent_data.trace_id);
        assert_eq!(child_data.parent_span_id, Some(parent_data.span_id));
    }

    #[test]
    fn test_add_reference_follows_from_is_parentage() {
        let (tracer, engine) = tracer_with_engine();

        let parent = tracer.build_span("parent").start();
        let child = tracer
            .build_span("child")
            .add_reference(FOLLOWS_FROM, Some(&parent.context()))
            .start();

        child.finish();
        parent.finish();

        let finished = engine.finished_spans();
        let parent_data = finished.iter().find(|s| s.operation_name == "parent").unwrap();
        let child_data = finished.iter().find(|s| s.operation_name == "child").unwrap();
        assert_eq!(child_data.parent_span_id, Some(parent_data.span_id));
    }

    #[test]
    fn test_add_reference_unknown_kind_leaves_ancestry_alone() {
        let (tracer, engine) = tracer_with_engine();

        let other = tracer.build_span("other").start();
        let span = tracer
            .build_span("op")
            .add_reference("causes", Some(&other.context()))
            .start();

        span.finish();
        other.finish();

        let finished = engine.finished_spans();
        let span_data = finished.iter().find(|s| s.operation_name == "op").unwrap();
        assert!(span_data.is_root());
        let other_data = finished.iter().find(|s| s.operation_name == "other").unwrap();
        assert_ne!(span_data.trace_id, other_data.trace_id);
    }

    #[test]
    fn test_add_reference_rejects_tag_context() {
        use std::collections::HashMap;

        let (tracer, engine) = tracer_with_engine();

        // 仅 baggage 的载体提取出标签上下文
        // A baggage-only carrier extracts to a tag context
        let mut carrier: HashMap<String, String> = HashMap::new();
        carrier.insert(
            "x-tracebridge-baggage-user".to_string(),
            "42".to_string(),
        );
        let tag_context = tracer
            .extract(
                crate::api::propagation::Format::TextMap,
                crate::api::propagation::ExtractCarrier::TextMap(&carrier),
            )
            .unwrap();
        assert_eq!(tag_context.trace_id(), "0");

        tracer
            .build_span("op")
            .add_reference(CHILD_OF, Some(&tag_context))
            .start()
            .finish();

        assert!(engine.finished_spans()[0].is_root());
    }

    #[test]
    fn test_null_parent_span_is_noop() {
        let (tracer, engine) = tracer_with_engine();

        tracer
            .build_span("op")
            .as_child_of_span(None)
            .add_reference(CHILD_OF, None)
            .start()
            .finish();

        let finished = engine.finished_spans();
        assert_eq!(finished.len(), 1);
        assert!(finished[0].is_root());
    }

    #[test]
    fn test_tags_last_write_wins() {
        let (tracer, engine) = tracer_with_engine();

        tracer
            .build_span("op")
            .with_tag("k", "first")
            .with_tag("k", "second")
            .with_tag("n", 42i64)
            .with_tag("flag", true)
            .with_tag("ratio", 0.5f64)
            .start()
            .finish();

        let finished = engine.finished_spans();
        let tags = &finished[0].tags;
        assert_eq!(tags.get("k"), Some(&TagValue::from("second")));
        assert_eq!(tags.get("n"), Some(&TagValue::Int(42)));
        assert_eq!(tags.get("flag"), Some(&TagValue::Bool(true)));
        assert_eq!(tags.get("ratio"), Some(&TagValue::Float(0.5)));
    }

    #[test]
    fn test_typed_tags() {
        use crate::api::span::tags;

        let (tracer, engine) = tracer_with_engine();

        tracer
            .build_span("op")
            .with_typed_tag(&tags::COMPONENT, "http-client")
            .with_typed_tag(&tags::ERROR, true)
            .start()
            .finish();

        let finished = engine.finished_spans();
        assert_eq!(
            finished[0].tags.get("component"),
            Some(&TagValue::from("http-client"))
        );
        assert_eq!(finished[0].tags.get("error"), Some(&TagValue::Bool(true)));
    }

    #[test]
    fn test_start_active_deactivates_once() {
        let (tracer, engine) = tracer_with_engine();

        let scope = tracer.build_span("op").start_active(true);
        assert!(tracer.active_span().is_some());
        scope.close();
        scope.close();
        assert!(tracer.active_span().is_none());
        assert_eq!(engine.finished_spans().len(), 1);
    }

    #[test]
    fn test_ignore_active_span() {
        let (tracer, engine) = tracer_with_engine();

        let outer = tracer.build_span("outer").start_active(true);
        tracer
            .build_span("detached")
            .ignore_active_span()
            .start()
            .finish();
        outer.close();

        let finished = engine.finished_spans();
        let detached = finished.iter().find(|s| s.operation_name == "detached").unwrap();
        assert!(detached.is_root());
    }
}
