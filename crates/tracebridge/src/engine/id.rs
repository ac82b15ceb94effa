//! 追踪标识符类型
//! Trace identifier types
//!
//! 引擎侧的 trace/span 标识符，64 位随机非零值
//! Engine-side trace/span identifiers, 64-bit random non-zero values

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 标识符解析错误
/// Identifier parse error
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid id hex string: {0:?}")]
pub struct ParseIdError(pub String);

/// Trace ID - 64 位
/// Trace ID - 64 bits
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(u64);

impl TraceId {
    /// 零值哨兵，字符串形式为 "0"
    /// Zero sentinel, renders as the string "0"
    pub const ZERO: TraceId = TraceId(0);

    /// 创建新的随机 Trace ID（非零）
    /// Create a new random Trace ID (non-zero)
    pub fn new() -> Self {
        loop {
            let raw = rand::random::<u64>();
            if raw != 0 {
                return Self(raw);
            }
        }
    }

    /// 从原始值创建
    /// Create from a raw value
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// 获取原始值
    /// Get the raw value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// 从十六进制字符串解析（最多 16 个字符）
    /// Parse from a hexadecimal string (up to 16 characters)
    pub fn from_hex(hex: &str) -> Result<Self, ParseIdError> {
        if hex.is_empty() || hex.len() > 16 {
            return Err(ParseIdError(hex.to_string()));
        }
        u64::from_str_radix(hex, 16)
            .map(Self)
            .map_err(|_| ParseIdError(hex.to_string()))
    }

    /// 转换为定宽十六进制字符串
    /// Convert to a fixed-width hexadecimal string
    pub fn to_hex(&self) -> String {
        format!("{:016x}", self.0)
    }

    /// 是否有效（非零）
    /// Whether it is valid (non-zero)
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TraceId({})", self.0)
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Span ID - 64 位
/// Span ID - 64 bits
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpanId(u64);

impl SpanId {
    /// 零值哨兵，字符串形式为 "0"
    /// Zero sentinel, renders as the string "0"
    pub const ZERO: SpanId = SpanId(0);

    /// 创建新的随机 Span ID（非零）
    /// Create a new random Span ID (non-zero)
    pub fn new() -> Self {
        loop {
            let raw = rand::random::<u64>();
            if raw != 0 {
                return Self(raw);
            }
        }
    }

    /// 从原始值创建
    /// Create from a raw value
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// 获取原始值
    /// Get the raw value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// 从十六进制字符串解析（最多 16 个字符）
    /// Parse from a hexadecimal string (up to 16 characters)
    pub fn from_hex(hex: &str) -> Result<Self, ParseIdError> {
        if hex.is_empty() || hex.len() > 16 {
            return Err(ParseIdError(hex.to_string()));
        }
        u64::from_str_radix(hex, 16)
            .map(Self)
            .map_err(|_| ParseIdError(hex.to_string()))
    }

    /// 转换为定宽十六进制字符串
    /// Convert to a fixed-width hexadecimal string
    pub fn to_hex(&self) -> String {
        format!("{:016x}", self.0)
    }

    /// 是否有效（非零）
    /// Whether it is valid (non-zero)
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl Default for SpanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpanId({})", self.0)
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_id() {
        let id = TraceId::new();
        assert!(id.is_valid());
        assert_eq!(id.to_hex().len(), 16);

        let parsed = TraceId::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, parsed);

        assert!(!TraceId::ZERO.is_valid());
        assert_eq!(TraceId::ZERO.to_string(), "0");
    }

    #[test]
    fn test_span_id() {
        let id = SpanId::new();
        assert!(id.is_valid());

        let parsed = SpanId::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, parsed);

        assert_eq!(SpanId::ZERO.to_string(), "0");
    }

    #[test]
    fn test_from_hex_rejects_garbage() {
        assert!(TraceId::from_hex("").is_err());
        assert!(TraceId::from_hex("not-hex").is_err());
        assert!(TraceId::from_hex("0123456789abcdef0").is_err());
        assert_eq!(SpanId::from_hex("2a").unwrap(), SpanId::from_raw(42));
    }
}
