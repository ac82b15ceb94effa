//! 引擎侧 Span 模型
//!
//! 真实 span 的契约、span 句柄以及拦截器可见的完成数据

use super::context::EngineContext;
use super::id::{SpanId, TraceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Span 标签值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl From<&str> for TagValue {
    fn from(v: &str) -> Self {
        TagValue::String(v.to_string())
    }
}

impl From<String> for TagValue {
    fn from(v: String) -> Self {
        TagValue::String(v)
    }
}

impl From<bool> for TagValue {
    fn from(v: bool) -> Self {
        TagValue::Bool(v)
    }
}

impl From<i64> for TagValue {
    fn from(v: i64) -> Self {
        TagValue::Int(v)
    }
}

impl From<i32> for TagValue {
    fn from(v: i32) -> Self {
        TagValue::Int(v as i64)
    }
}

impl From<u32> for TagValue {
    fn from(v: u32) -> Self {
        TagValue::Int(v as i64)
    }
}

impl From<f64> for TagValue {
    fn from(v: f64) -> Self {
        TagValue::Float(v)
    }
}

/// 挂在 span 上的一条日志记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// 记录时间
    pub timestamp: DateTime<Utc>,
    /// 日志字段
    pub fields: Vec<(String, Value)>,
}

/// 完成的 span 数据，供拦截器和完成缓冲区使用
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanData {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: Option<SpanId>,
    pub operation_name: String,
    pub service_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub tags: HashMap<String, TagValue>,
    pub baggage: HashMap<String, String>,
    pub logs: Vec<LogRecord>,
}

impl SpanData {
    /// 持续时间（毫秒）
    pub fn duration_ms(&self) -> i64 {
        (self.end_time - self.start_time).num_milliseconds()
    }

    /// 是否为本地根 span
    pub fn is_root(&self) -> bool {
        self.parent_span_id.is_none()
    }
}

/// 引擎内真实 span 的契约
///
/// 生命周期、计时与缓冲由引擎负责；适配层只透传调用
pub trait EngineSpan: Send + Sync {
    /// 获取 span 的上下文
    fn context(&self) -> EngineContext;
    /// 设置标签（同键覆盖）
    fn set_tag(&self, key: &str, value: TagValue);
    /// 修改操作名
    fn set_operation_name(&self, name: &str);
    /// 设置 baggage 条目
    fn set_baggage_item(&self, key: &str, value: &str);
    /// 读取 baggage 条目
    fn baggage_item(&self, key: &str) -> Option<String>;
    /// 追加一条日志记录；时间缺省为当前时刻
    fn add_log(&self, timestamp_micros: Option<u64>, fields: Vec<(String, Value)>);
    /// 结束 span
    fn finish(&self);
    /// 以显式时间结束 span
    fn finish_at(&self, timestamp_micros: u64);
}

/// Span 句柄：真实引擎 span 或无操作哨兵
#[derive(Clone)]
pub enum SpanRef {
    /// 真实引擎 span
    Live(Arc<dyn EngineSpan>),
    /// 无操作哨兵
    Noop,
}

impl SpanRef {
    pub fn context(&self) -> EngineContext {
        match self {
            SpanRef::Live(span) => span.context(),
            SpanRef::Noop => EngineContext::None,
        }
    }

    pub fn finish(&self) {
        if let SpanRef::Live(span) = self {
            span.finish();
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, SpanRef::Noop)
    }
}

impl PartialEq for SpanRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SpanRef::Live(a), SpanRef::Live(b)) => Arc::ptr_eq(a, b),
            (SpanRef::Noop, SpanRef::Noop) => true,
            _ => false,
        }
    }
}

impl Eq for SpanRef {}

impl fmt::Debug for SpanRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanRef::Live(span) => write!(f, "SpanRef::Live({:?})", span.context()),
            SpanRef::Noop => write!(f, "SpanRef::Noop"),
        }
    }
}
