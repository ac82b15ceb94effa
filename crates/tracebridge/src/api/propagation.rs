//! 传播格式与载体契约
//! Propagation formats and carrier contracts
//!
//! 只有 map 式的文本载体被支持；其它载体形态在桥接层记录调试日志并降级
//! Only map-like text carriers are supported; other carrier shapes are
//! logged at the bridge and degraded

use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// 注入/提取格式
/// Inject/extract format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// 任意文本 map
    /// Arbitrary text map
    TextMap,
    /// HTTP 头
    /// HTTP headers
    HttpHeaders,
    /// 二进制
    /// Binary
    Binary,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::TextMap => f.write_str("text_map"),
            Format::HttpHeaders => f.write_str("http_headers"),
            Format::Binary => f.write_str("binary"),
        }
    }
}

/// 文本载体注入契约：map 式 key/value 写入
/// Text-carrier inject contract: map-like key/value insertion
pub trait TextMapInject {
    fn put(&mut self, key: &str, value: &str);
}

/// 文本载体提取契约：一次性枚举全部条目
/// Text-carrier extract contract: enumerate all entries once
///
/// 桥接层在提取前把条目整体快照一次，载体可以是单遍迭代的
/// The bridge snapshots the entries once before extraction, so the
/// carrier may be single-pass
pub trait TextMapExtract {
    fn entries(&self) -> Vec<(String, String)>;
}

impl TextMapInject for HashMap<String, String> {
    fn put(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }
}

impl TextMapExtract for HashMap<String, String> {
    fn entries(&self) -> Vec<(String, String)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl TextMapInject for BTreeMap<String, String> {
    fn put(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }
}

impl TextMapExtract for BTreeMap<String, String> {
    fn entries(&self) -> Vec<(String, String)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

/// 注入侧载体形态
/// Inject-side carrier shapes
pub enum InjectCarrier<'a> {
    /// map 式文本载体
    /// Map-like text carrier
    TextMap(&'a mut dyn TextMapInject),
    /// 二进制载体（不支持，注入为无操作）
    /// Binary carrier (unsupported, injection is a no-op)
    Binary(&'a mut Vec<u8>),
}

/// 提取侧载体形态
/// Extract-side carrier shapes
pub enum ExtractCarrier<'a> {
    /// map 式文本载体
    /// Map-like text carrier
    TextMap(&'a dyn TextMapExtract),
    /// 二进制载体（不支持，提取不产出上下文）
    /// Binary carrier (unsupported, extraction yields no context)
    Binary(&'a [u8]),
}
