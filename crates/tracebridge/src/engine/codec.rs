//! 传播编解码接缝
//! Propagation codec seam
//!
//! 与载体形态无关的 key/value 读写契约，以及默认的文本头编解码器
//! Format-agnostic key/value read/write contracts plus the default
//! text-header codec

use super::context::{EngineContext, ExtractedContext, TagContext};
use super::id::{ParseIdError, SpanId, TraceId};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// 注入侧写入契约
/// Inject-side write contract
pub trait CarrierSetter {
    fn set(&mut self, key: &str, value: &str);
}

/// 提取侧读取契约；解码器可能多次查询
/// Extract-side read contract; the decoder may query repeatedly
pub trait CarrierGetter {
    fn keys(&self) -> Vec<String>;
    fn get(&self, key: &str) -> Option<&str>;
}

/// 上下文注入器（编码器接缝）
/// Context injector (the encoder seam)
pub trait ContextInjector: Send + Sync {
    fn inject(&self, context: &EngineContext, setter: &mut dyn CarrierSetter);
}

/// 上下文提取器（解码器接缝）
/// Context extractor (the decoder seam)
pub trait ContextExtractor: Send + Sync {
    fn extract(&self, getter: &dyn CarrierGetter) -> Option<EngineContext>;
}

/// 编解码错误；在接缝处降级处理，从不向调用方抛出
/// Codec errors; degraded at the seam, never surfaced to callers
#[derive(Debug, Error)]
pub enum CodecError {
    /// 传播头中的标识符无法解析
    /// An identifier in a propagation header failed to parse
    #[error("invalid id in header {header}: {source}")]
    InvalidId {
        header: &'static str,
        source: ParseIdError,
    },
    /// 标识符头不完整
    /// Incomplete identifier headers
    #[error("missing companion header for {present}")]
    IncompleteIds { present: &'static str },
}

/// 默认文本头编解码器
/// Default text-header codec
///
/// 标识符以定宽十六进制上线；提取时对头名大小写不敏感
/// Identifiers travel as fixed-width hex; extraction is case-insensitive
/// on header names
#[derive(Debug, Default, Clone, Copy)]
pub struct TextHeaderCodec;

impl TextHeaderCodec {
    /// trace 标识符头
    /// trace identifier header
    pub const TRACE_ID_KEY: &'static str = "x-tracebridge-trace-id";
    /// 父 span 标识符头
    /// parent span identifier header
    pub const PARENT_ID_KEY: &'static str = "x-tracebridge-parent-id";
    /// baggage 头前缀
    /// baggage header prefix
    pub const BAGGAGE_PREFIX: &'static str = "x-tracebridge-baggage-";

    pub fn new() -> Self {
        Self
    }

    fn parse_ids(getter: &dyn CarrierGetter) -> Result<Option<(TraceId, SpanId)>, CodecError> {
        let mut trace_hex: Option<String> = None;
        let mut span_hex: Option<String> = None;

        for key in getter.keys() {
            let lower = key.to_ascii_lowercase();
            if lower == Self::TRACE_ID_KEY {
                trace_hex = getter.get(&key).map(str::to_string);
            } else if lower == Self::PARENT_ID_KEY {
                span_hex = getter.get(&key).map(str::to_string);
            }
        }

        match (trace_hex, span_hex) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(CodecError::IncompleteIds {
                present: Self::TRACE_ID_KEY,
            }),
            (None, Some(_)) => Err(CodecError::IncompleteIds {
                present: Self::PARENT_ID_KEY,
            }),
            (Some(trace), Some(span)) => {
                let trace_id =
                    TraceId::from_hex(trace.trim()).map_err(|source| CodecError::InvalidId {
                        header: Self::TRACE_ID_KEY,
                        source,
                    })?;
                let span_id =
                    SpanId::from_hex(span.trim()).map_err(|source| CodecError::InvalidId {
                        header: Self::PARENT_ID_KEY,
                        source,
                    })?;
                Ok(Some((trace_id, span_id)))
            }
        }
    }

    fn collect_baggage(getter: &dyn CarrierGetter) -> HashMap<String, String> {
        let mut baggage = HashMap::new();
        for key in getter.keys() {
            let lower = key.to_ascii_lowercase();
            if let Some(name) = lower.strip_prefix(Self::BAGGAGE_PREFIX) {
                if !name.is_empty() {
                    if let Some(value) = getter.get(&key) {
                        baggage.insert(name.to_string(), value.to_string());
                    }
                }
            }
        }
        baggage
    }
}

impl ContextInjector for TextHeaderCodec {
    fn inject(&self, context: &EngineContext, setter: &mut dyn CarrierSetter) {
        if let (Some(trace_id), Some(span_id)) = (context.trace_id(), context.span_id()) {
            setter.set(Self::TRACE_ID_KEY, &trace_id.to_hex());
            setter.set(Self::PARENT_ID_KEY, &span_id.to_hex());
        }
        for (key, value) in context.baggage_items() {
            setter.set(&format!("{}{}", Self::BAGGAGE_PREFIX, key), &value);
        }
    }
}

impl ContextExtractor for TextHeaderCodec {
    fn extract(&self, getter: &dyn CarrierGetter) -> Option<EngineContext> {
        let baggage = Self::collect_baggage(getter);
        match Self::parse_ids(getter) {
            Ok(Some((trace_id, span_id))) => Some(EngineContext::Extracted(Arc::new(
                ExtractedContext::new(trace_id, span_id, HashMap::new(), baggage),
            ))),
            // 没有识别出链路头：降级为仅含标签/baggage 的上下文
            // No linkage headers recognized: degrade to a tag-only context
            Ok(None) => Some(EngineContext::Tag(Arc::new(TagContext::new(
                HashMap::new(),
                baggage,
            )))),
            Err(err) => {
                debug!("discarding unparsable propagation headers: {err}");
                Some(EngineContext::Tag(Arc::new(TagContext::new(
                    HashMap::new(),
                    baggage,
                ))))
            }
        }
    }
}
