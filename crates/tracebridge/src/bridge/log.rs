//! Span 日志处理
//! Span log handling
//!
//! 决定标准 API 的日志调用如何落到引擎 span 上；处理器在 tracer 构建时
//! 一次性给定，之后不可变
//! Decides how standard-API log calls land on the engine span; the
//! handler is supplied once at tracer construction and immutable after

use crate::engine::span::SpanRef;
use serde_json::Value;

/// 事件字段名，单事件日志折叠为 {event: name}
/// Event field name, single-event logs collapse to {event: name}
pub const EVENT_FIELD: &str = "event";

/// 日志处理器契约
/// Log handler contract
pub trait LogHandler: Send + Sync {
    /// 记录一组字段
    /// Record a set of fields
    fn log_fields(&self, span: &SpanRef, timestamp_micros: Option<u64>, fields: &[(&str, Value)]);

    /// 记录一个事件
    /// Record an event
    fn log_event(&self, span: &SpanRef, timestamp_micros: Option<u64>, event: &str);
}

/// 默认实现：字段原样落为引擎 span 的日志记录
/// Default implementation: fields land verbatim as engine span log records
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultLogHandler;

impl LogHandler for DefaultLogHandler {
    fn log_fields(&self, span: &SpanRef, timestamp_micros: Option<u64>, fields: &[(&str, Value)]) {
        if let SpanRef::Live(span) = span {
            span.add_log(
                timestamp_micros,
                fields
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.clone()))
                    .collect(),
            );
        }
    }

    fn log_event(&self, span: &SpanRef, timestamp_micros: Option<u64>, event: &str) {
        self.log_fields(
            span,
            timestamp_micros,
            &[(EVENT_FIELD, Value::String(event.to_string()))],
        );
    }
}
