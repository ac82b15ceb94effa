//! 标准 API 的 Span 与 SpanContext
//! Standard-API Span and SpanContext
//!
//! Span 是引擎 span 上的轻量视图，不持有任何追踪状态；SpanContext 恰好
//! 包装一个引擎上下文实例，判等与哈希基于该实例的身份
//! A Span is a thin view over an engine span and owns no tracing state; a
//! SpanContext wraps exactly one engine context instance, with equality
//! and hashing based on that instance's identity

use crate::bridge::log::LogHandler;
use crate::engine::context::{EngineContext, ExtractedContext, LocalContext, TagContext};
use crate::engine::span::{EngineSpan, SpanRef, TagValue};
use lazy_static::lazy_static;
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

/// 类型化标签键
/// Typed tag key
pub struct Tag<T> {
    key: &'static str,
    _marker: PhantomData<fn(T)>,
}

impl<T> Tag<T> {
    pub const fn new(key: &'static str) -> Self {
        Self {
            key,
            _marker: PhantomData,
        }
    }

    pub const fn key(&self) -> &'static str {
        self.key
    }
}

/// 常用标签键
/// Common tag keys
pub mod tags {
    use super::Tag;

    pub const COMPONENT: Tag<&str> = Tag::new("component");
    pub const ERROR: Tag<bool> = Tag::new("error");
    pub const HTTP_METHOD: Tag<&str> = Tag::new("http.method");
    pub const HTTP_STATUS: Tag<i64> = Tag::new("http.status_code");
    pub const HTTP_URL: Tag<&str> = Tag::new("http.url");
    pub const PEER_SERVICE: Tag<&str> = Tag::new("peer.service");
}

#[derive(Clone)]
enum SpanInner {
    Live {
        span: Arc<dyn EngineSpan>,
        log: Arc<dyn LogHandler>,
    },
    Noop,
}

/// 标准 API 的 span 视图
/// Standard-API span view
#[derive(Clone)]
pub struct Span {
    inner: SpanInner,
}

lazy_static! {
    static ref NOOP_SPAN: Span = Span {
        inner: SpanInner::Noop,
    };
    static ref NOOP_CONTEXT: SpanContext = SpanContext {
        kind: ContextKind::Noop,
    };
}

impl Span {
    pub(crate) fn wrap(span: Arc<dyn EngineSpan>, log: Arc<dyn LogHandler>) -> Self {
        Self {
            inner: SpanInner::Live { span, log },
        }
    }

    /// 规范的无操作 span 单例
    /// The canonical no-op span singleton
    pub fn noop() -> Self {
        NOOP_SPAN.clone()
    }

    pub fn is_noop(&self) -> bool {
        matches!(self.inner, SpanInner::Noop)
    }

    pub(crate) fn to_ref(&self) -> SpanRef {
        match &self.inner {
            SpanInner::Live { span, .. } => SpanRef::Live(span.clone()),
            SpanInner::Noop => SpanRef::Noop,
        }
    }

    /// span 的上下文
    /// The span's context
    pub fn context(&self) -> SpanContext {
        match &self.inner {
            SpanInner::Live { span, .. } => SpanContext::from_engine(span.context()),
            SpanInner::Noop => SpanContext::noop(),
        }
    }

    /// 设置标签（同键后写覆盖）
    /// Set a tag (last write per key wins)
    pub fn set_tag(&self, key: &str, value: impl Into<TagValue>) -> &Self {
        if let SpanInner::Live { span, .. } = &self.inner {
            span.set_tag(key, value.into());
        }
        self
    }

    /// 用类型化标签键设置标签
    /// Set a tag through a typed tag key
    pub fn set_typed_tag<T: Into<TagValue>>(&self, tag: &Tag<T>, value: T) -> &Self {
        self.set_tag(tag.key(), value)
    }

    /// 记录一组日志字段
    /// Record a set of log fields
    pub fn log(&self, fields: &[(&str, Value)]) -> &Self {
        if let SpanInner::Live { span, log } = &self.inner {
            log.log_fields(&SpanRef::Live(span.clone()), None, fields);
        }
        self
    }

    /// 以显式时间记录一组日志字段
    /// Record log fields with an explicit timestamp
    pub fn log_at(&self, timestamp_micros: u64, fields: &[(&str, Value)]) -> &Self {
        if let SpanInner::Live { span, log } = &self.inner {
            log.log_fields(&SpanRef::Live(span.clone()), Some(timestamp_micros), fields);
        }
        self
    }

    /// 记录一个事件
    /// Record an event
    pub fn log_event(&self, event: &str) -> &Self {
        if let SpanInner::Live { span, log } = &self.inner {
            log.log_event(&SpanRef::Live(span.clone()), None, event);
        }
        self
    }

    /// 以显式时间记录一个事件
    /// Record an event with an explicit timestamp
    pub fn log_event_at(&self, timestamp_micros: u64, event: &str) -> &Self {
        if let SpanInner::Live { span, log } = &self.inner {
            log.log_event(&SpanRef::Live(span.clone()), Some(timestamp_micros), event);
        }
        self
    }

    /// 设置 baggage 条目
    /// Set a baggage item
    pub fn set_baggage_item(&self, key: &str, value: &str) -> &Self {
        if let SpanInner::Live { span, .. } = &self.inner {
            span.set_baggage_item(key, value);
        }
        self
    }

    /// 读取 baggage 条目
    /// Read a baggage item
    pub fn baggage_item(&self, key: &str) -> Option<String> {
        match &self.inner {
            SpanInner::Live { span, .. } => span.baggage_item(key),
            SpanInner::Noop => None,
        }
    }

    /// 修改操作名
    /// Change the operation name
    pub fn set_operation_name(&self, operation_name: &str) -> &Self {
        if let SpanInner::Live { span, .. } = &self.inner {
            span.set_operation_name(operation_name);
        }
        self
    }

    /// 结束 span
    /// Finish the span
    pub fn finish(&self) {
        if let SpanInner::Live { span, .. } = &self.inner {
            span.finish();
        }
    }

    /// 以显式时间结束 span
    /// Finish the span at an explicit timestamp
    pub fn finish_at(&self, timestamp_micros: u64) {
        if let SpanInner::Live { span, .. } = &self.inner {
            span.finish_at(timestamp_micros);
        }
    }
}

impl PartialEq for Span {
    fn eq(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (SpanInner::Live { span: a, .. }, SpanInner::Live { span: b, .. }) => {
                Arc::ptr_eq(a, b)
            }
            (SpanInner::Noop, SpanInner::Noop) => true,
            _ => false,
        }
    }
}

impl Eq for Span {}

impl Hash for Span {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.inner {
            SpanInner::Live { span, .. } => {
                state.write_usize(Arc::as_ptr(span) as *const () as usize)
            }
            SpanInner::Noop => state.write_usize(0),
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            SpanInner::Live { span, .. } => write!(f, "Span({:?})", span.context()),
            SpanInner::Noop => f.write_str("Span(noop)"),
        }
    }
}

#[derive(Clone)]
enum ContextKind {
    Local(Arc<LocalContext>),
    Extracted(Arc<ExtractedContext>),
    Tag(Arc<TagContext>),
    Noop,
}

/// 标准 API 的 span 上下文
/// Standard-API span context
///
/// 没有链路的种类（Tag/Noop）将 trace/span 标识符报告为 "0"
/// Kinds without linkage (Tag/Noop) report trace/span ids as "0"
#[derive(Clone)]
pub struct SpanContext {
    kind: ContextKind,
}

impl SpanContext {
    /// 规范的无操作上下文单例
    /// The canonical no-op context singleton
    pub fn noop() -> Self {
        NOOP_CONTEXT.clone()
    }

    pub fn is_noop(&self) -> bool {
        matches!(self.kind, ContextKind::Noop)
    }

    pub(crate) fn from_engine(context: EngineContext) -> Self {
        let kind = match context {
            EngineContext::Local(ctx) => ContextKind::Local(ctx),
            EngineContext::Extracted(ctx) => ContextKind::Extracted(ctx),
            EngineContext::Tag(ctx) => ContextKind::Tag(ctx),
            EngineContext::None => ContextKind::Noop,
        };
        Self { kind }
    }

    pub(crate) fn to_engine(&self) -> EngineContext {
        match &self.kind {
            ContextKind::Local(ctx) => EngineContext::Local(ctx.clone()),
            ContextKind::Extracted(ctx) => EngineContext::Extracted(ctx.clone()),
            ContextKind::Tag(ctx) => EngineContext::Tag(ctx.clone()),
            ContextKind::Noop => EngineContext::None,
        }
    }

    /// trace 标识符的字符串形式
    /// The trace identifier as a string
    pub fn trace_id(&self) -> String {
        match &self.kind {
            ContextKind::Local(ctx) => ctx.trace_id().to_string(),
            ContextKind::Extracted(ctx) => ctx.trace_id().to_string(),
            ContextKind::Tag(_) | ContextKind::Noop => "0".to_string(),
        }
    }

    /// span 标识符的字符串形式
    /// The span identifier as a string
    pub fn span_id(&self) -> String {
        match &self.kind {
            ContextKind::Local(ctx) => ctx.span_id().to_string(),
            ContextKind::Extracted(ctx) => ctx.span_id().to_string(),
            ContextKind::Tag(_) | ContextKind::Noop => "0".to_string(),
        }
    }

    /// 全部 baggage 条目
    /// All baggage items
    pub fn baggage_items(&self) -> Vec<(String, String)> {
        match &self.kind {
            ContextKind::Local(ctx) => ctx.baggage_items(),
            ContextKind::Extracted(ctx) => ctx.baggage_items(),
            ContextKind::Tag(ctx) => ctx.baggage_items(),
            ContextKind::Noop => Vec::new(),
        }
    }
}

impl PartialEq for SpanContext {
    fn eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (ContextKind::Local(a), ContextKind::Local(b)) => Arc::ptr_eq(a, b),
            (ContextKind::Extracted(a), ContextKind::Extracted(b)) => Arc::ptr_eq(a, b),
            (ContextKind::Tag(a), ContextKind::Tag(b)) => Arc::ptr_eq(a, b),
            (ContextKind::Noop, ContextKind::Noop) => true,
            _ => false,
        }
    }
}

impl Eq for SpanContext {}

impl Hash for SpanContext {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.kind {
            ContextKind::Local(ctx) => state.write_usize(Arc::as_ptr(ctx) as usize),
            ContextKind::Extracted(ctx) => state.write_usize(Arc::as_ptr(ctx) as usize),
            ContextKind::Tag(ctx) => state.write_usize(Arc::as_ptr(ctx) as usize),
            ContextKind::Noop => state.write_usize(0),
        }
    }
}

impl fmt::Debug for SpanContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpanContext({}:{})", self.trace_id(), self.span_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::id::{SpanId, TraceId};
    use std::collections::HashMap;

    #[test]
    fn test_noop_span_is_inert() {
        let span = Span::noop();
        assert!(span.is_noop());
        span.set_tag("k", "v")
            .set_baggage_item("b", "1")
            .set_operation_name("renamed")
            .log_event("event");
        span.finish();

        assert!(span.baggage_item("b").is_none());
        assert!(span.context().is_noop());
        assert_eq!(span, Span::noop());
    }

    #[test]
    fn test_context_id_strings() {
        let local = SpanContext::from_engine(EngineContext::Local(Arc::new(
            LocalContext::new(TraceId::from_raw(7), SpanId::from_raw(9)),
        )));
        assert_eq!(local.trace_id(), "7");
        assert_eq!(local.span_id(), "9");

        let tag = SpanContext::from_engine(EngineContext::Tag(Arc::new(TagContext::empty())));
        assert_eq!(tag.trace_id(), "0");
        assert_eq!(tag.span_id(), "0");

        assert_eq!(SpanContext::noop().trace_id(), "0");
    }

    #[test]
    fn test_context_equality_is_identity() {
        let shared = Arc::new(TagContext::empty());
        let a = SpanContext::from_engine(EngineContext::Tag(shared.clone()));
        let b = SpanContext::from_engine(EngineContext::Tag(shared));
        let c = SpanContext::from_engine(EngineContext::Tag(Arc::new(TagContext::empty())));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(SpanContext::noop(), SpanContext::noop());
    }

    #[test]
    fn test_extracted_context_baggage() {
        let mut baggage = HashMap::new();
        baggage.insert("user".to_string(), "42".to_string());
        let ctx = SpanContext::from_engine(EngineContext::Extracted(Arc::new(
            ExtractedContext::new(
                TraceId::from_raw(1),
                SpanId::from_raw(2),
                HashMap::new(),
                baggage,
            ),
        )));

        assert_eq!(ctx.trace_id(), "1");
        assert_eq!(
            ctx.baggage_items(),
            vec![("user".to_string(), "42".to_string())]
        );
    }
}
