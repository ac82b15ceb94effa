//! 标准的、厂商无关的追踪 API 表面
//! The standard, vendor-neutral tracing API surface
//!
//! 应用代码只面对这里的类型；所有真实的追踪工作都委托给内部引擎
//! Application code only faces these types; all actual tracing work is
//! delegated to the internal engine

pub mod propagation;
pub mod scope;
pub mod span;

pub use propagation::{ExtractCarrier, Format, InjectCarrier, TextMapExtract, TextMapInject};
pub use scope::{Scope, ScopeHandle, ScopeManager, ScopePropagation};
pub use span::{Span, SpanContext, Tag, tags};
