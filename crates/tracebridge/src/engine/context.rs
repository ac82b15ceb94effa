//! 引擎侧上下文变体
//! Engine-side context variants
//!
//! 引擎可以产出的几种上下文表示：本地创建、从传播头提取、仅含标签、以及空上下文
//! The context representations the engine can produce: locally created,
//! recovered from propagation headers, tag-only, and none

use super::id::{SpanId, TraceId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 本地创建的 span 上下文 - 持有真实标识符和可变 baggage
/// Locally-created span context - real identifiers plus mutable baggage
pub struct LocalContext {
    trace_id: TraceId,
    span_id: SpanId,
    baggage: RwLock<HashMap<String, String>>,
}

impl LocalContext {
    pub fn new(trace_id: TraceId, span_id: SpanId) -> Self {
        Self::with_baggage(trace_id, span_id, HashMap::new())
    }

    pub fn with_baggage(
        trace_id: TraceId,
        span_id: SpanId,
        baggage: HashMap<String, String>,
    ) -> Self {
        Self {
            trace_id,
            span_id,
            baggage: RwLock::new(baggage),
        }
    }

    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    /// 设置 baggage 条目（同键覆盖）
    /// Set a baggage item (same key overwrites)
    pub fn set_baggage_item(&self, key: &str, value: &str) {
        self.baggage
            .write()
            .insert(key.to_string(), value.to_string());
    }

    /// 获取 baggage 条目
    /// Get a baggage item
    pub fn baggage_item(&self, key: &str) -> Option<String> {
        self.baggage.read().get(key).cloned()
    }

    /// 获取全部 baggage 条目
    /// Get all baggage items
    pub fn baggage_items(&self) -> Vec<(String, String)> {
        self.baggage
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl fmt::Debug for LocalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocalContext({}:{})", self.trace_id, self.span_id)
    }
}

/// 仅含标签/baggage 的上下文 - 没有分布式追踪链路
/// Tag/baggage-only context - no distributed-trace linkage
#[derive(Debug, Clone, Default)]
pub struct TagContext {
    tags: HashMap<String, String>,
    baggage: HashMap<String, String>,
}

impl TagContext {
    pub fn new(tags: HashMap<String, String>, baggage: HashMap<String, String>) -> Self {
        Self { tags, baggage }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn tags(&self) -> &HashMap<String, String> {
        &self.tags
    }

    pub fn baggage_item(&self, key: &str) -> Option<&str> {
        self.baggage.get(key).map(String::as_str)
    }

    pub fn baggage_items(&self) -> Vec<(String, String)> {
        self.baggage
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// 提取得到的上下文 - 标签上下文的细化，携带从传播头恢复的真实标识符
/// Extracted context - a tag-context refinement carrying real identifiers
/// recovered from propagation headers
#[derive(Debug, Clone)]
pub struct ExtractedContext {
    trace_id: TraceId,
    span_id: SpanId,
    tags: HashMap<String, String>,
    baggage: HashMap<String, String>,
}

impl ExtractedContext {
    pub fn new(
        trace_id: TraceId,
        span_id: SpanId,
        tags: HashMap<String, String>,
        baggage: HashMap<String, String>,
    ) -> Self {
        Self {
            trace_id,
            span_id,
            tags,
            baggage,
        }
    }

    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    pub fn tags(&self) -> &HashMap<String, String> {
        &self.tags
    }

    pub fn baggage_item(&self, key: &str) -> Option<&str> {
        self.baggage.get(key).map(String::as_str)
    }

    pub fn baggage_items(&self) -> Vec<(String, String)> {
        self.baggage
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// 上下文种类判别 - 封闭的变体集合
/// Context-kind discriminator - the closed variant set
///
/// 判等与哈希都基于被包装实例的指针身份，而不是结构内容
/// Equality and hashing are pointer identity of the wrapped instance,
/// never structural content
#[derive(Clone)]
pub enum EngineContext {
    /// 本地创建的上下文
    /// Locally-created context
    Local(Arc<LocalContext>),
    /// 从传播头提取的上下文
    /// Context extracted from propagation headers
    Extracted(Arc<ExtractedContext>),
    /// 仅含标签/baggage 的上下文
    /// Tag/baggage-only context
    Tag(Arc<TagContext>),
    /// 空上下文
    /// Absent context
    None,
}

impl EngineContext {
    /// 真实 trace 标识符（仅 Local/Extracted 有）
    /// Real trace identifier (Local/Extracted only)
    pub fn trace_id(&self) -> Option<TraceId> {
        match self {
            EngineContext::Local(ctx) => Some(ctx.trace_id()),
            EngineContext::Extracted(ctx) => Some(ctx.trace_id()),
            EngineContext::Tag(_) | EngineContext::None => None,
        }
    }

    /// 真实 span 标识符（仅 Local/Extracted 有）
    /// Real span identifier (Local/Extracted only)
    pub fn span_id(&self) -> Option<SpanId> {
        match self {
            EngineContext::Local(ctx) => Some(ctx.span_id()),
            EngineContext::Extracted(ctx) => Some(ctx.span_id()),
            EngineContext::Tag(_) | EngineContext::None => None,
        }
    }

    /// 全部 baggage 条目
    /// All baggage items
    pub fn baggage_items(&self) -> Vec<(String, String)> {
        match self {
            EngineContext::Local(ctx) => ctx.baggage_items(),
            EngineContext::Extracted(ctx) => ctx.baggage_items(),
            EngineContext::Tag(ctx) => ctx.baggage_items(),
            EngineContext::None => Vec::new(),
        }
    }

    /// 是否为空上下文
    /// Whether the context is absent
    pub fn is_none(&self) -> bool {
        matches!(self, EngineContext::None)
    }

    /// 是否携带分布式追踪链路
    /// Whether it carries distributed-trace linkage
    pub fn has_trace(&self) -> bool {
        matches!(self, EngineContext::Local(_) | EngineContext::Extracted(_))
    }
}

impl PartialEq for EngineContext {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (EngineContext::Local(a), EngineContext::Local(b)) => Arc::ptr_eq(a, b),
            (EngineContext::Extracted(a), EngineContext::Extracted(b)) => Arc::ptr_eq(a, b),
            (EngineContext::Tag(a), EngineContext::Tag(b)) => Arc::ptr_eq(a, b),
            (EngineContext::None, EngineContext::None) => true,
            _ => false,
        }
    }
}

impl Eq for EngineContext {}

impl fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineContext::Local(ctx) => write!(f, "EngineContext::Local({:?})", ctx),
            EngineContext::Extracted(ctx) => {
                write!(f, "EngineContext::Extracted({}:{})", ctx.trace_id, ctx.span_id)
            }
            EngineContext::Tag(_) => write!(f, "EngineContext::Tag"),
            EngineContext::None => write!(f, "EngineContext::None"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_context_baggage() {
        let ctx = LocalContext::new(TraceId::new(), SpanId::new());
        assert!(ctx.baggage_items().is_empty());

        ctx.set_baggage_item("user", "42");
        ctx.set_baggage_item("user", "43");
        assert_eq!(ctx.baggage_item("user").as_deref(), Some("43"));
        assert_eq!(ctx.baggage_items().len(), 1);
    }

    #[test]
    fn test_equality_is_identity() {
        let a = Arc::new(LocalContext::new(TraceId::new(), SpanId::new()));
        let ctx1 = EngineContext::Local(a.clone());
        let ctx2 = EngineContext::Local(a);
        let other = EngineContext::Local(Arc::new(LocalContext::new(
            TraceId::new(),
            SpanId::new(),
        )));

        assert_eq!(ctx1, ctx2);
        assert_ne!(ctx1, other);
        assert_eq!(EngineContext::None, EngineContext::None);
        assert_ne!(ctx1, EngineContext::None);
    }

    #[test]
    fn test_variant_accessors() {
        let tag = EngineContext::Tag(Arc::new(TagContext::empty()));
        assert!(tag.trace_id().is_none());
        assert!(!tag.has_trace());

        let extracted = EngineContext::Extracted(Arc::new(ExtractedContext::new(
            TraceId::from_raw(7),
            SpanId::from_raw(8),
            HashMap::new(),
            HashMap::new(),
        )));
        assert_eq!(extracted.trace_id(), Some(TraceId::from_raw(7)));
        assert!(extracted.has_trace());
    }
}
