//! 两套对象模型之间的集中转换器
//! The centralized converter between the two object models
//!
//! 所有转换都是全函数且无副作用：任何输入都有定义好的输出，未知或缺失的
//! 值转换为对应的无操作哨兵，绝不失败
//! Every conversion is total and side-effect-free: all inputs have a
//! defined output, unknown or absent values convert to the matching no-op
//! sentinel, and nothing ever fails

use crate::api::scope::Scope;
use crate::api::span::{Span, SpanContext};
use crate::bridge::log::{DefaultLogHandler, LogHandler};
use crate::engine::context::EngineContext;
use crate::engine::scope::ScopeRef;
use crate::engine::span::SpanRef;
use std::sync::Arc;

/// 转换器；克隆成本低，可随处携带
/// The converter; cheap to clone and carried everywhere
#[derive(Clone)]
pub struct Converter {
    log: Arc<dyn LogHandler>,
}

impl Converter {
    pub fn new(log: Arc<dyn LogHandler>) -> Self {
        Self { log }
    }

    /// 标准 span 视图 → 引擎 span 句柄
    /// Standard span view → engine span handle
    pub fn to_span_ref(&self, span: &Span) -> SpanRef {
        span.to_ref()
    }

    /// 引擎 span 句柄 → 标准 span 视图
    /// Engine span handle → standard span view
    pub fn to_span(&self, span: SpanRef) -> Span {
        match span {
            SpanRef::Live(span) => Span::wrap(span, self.log.clone()),
            SpanRef::Noop => Span::noop(),
        }
    }

    /// 引擎作用域句柄 → 标准作用域
    /// Engine scope handle → standard scope
    pub fn to_scope(&self, scope: ScopeRef) -> Scope {
        match scope {
            // 自定义管理器包装出的作用域：还原被包装的原始标准作用域
            // Custom-manager wrapped scope: restore the original standard scope
            ScopeRef::Wrapped(wrapped) => wrapped.delegate().clone(),
            ScopeRef::Propagating(scope) => Scope::propagating(scope, self.clone()),
            ScopeRef::Basic(scope) => Scope::basic(scope, self.clone()),
        }
    }

    /// 引擎上下文 → 标准上下文
    /// Engine context → standard context
    pub fn to_span_context(&self, context: EngineContext) -> SpanContext {
        SpanContext::from_engine(context)
    }

    /// 标准上下文 → 引擎上下文
    /// Standard context → engine context
    pub fn to_context(&self, context: &SpanContext) -> EngineContext {
        context.to_engine()
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(Arc::new(DefaultLogHandler))
    }
}
