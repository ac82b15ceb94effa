//! 翻译层
//! The translation layer
//!
//! 把标准 API 的调用与取值翻译到引擎侧，再把引擎产出翻译回来；不做任何
//! 追踪决策
//! Translates standard-API calls and values to the engine side and engine
//! results back; makes no tracing decisions of its own

pub mod builder;
pub mod convert;
pub mod log;
pub mod scope;
pub mod tracer;

pub use builder::{CHILD_OF, FOLLOWS_FROM, SpanBuilder};
pub use convert::Converter;
pub use log::{DefaultLogHandler, EVENT_FIELD, LogHandler};
pub use scope::{CustomScopeManager, DefaultScopeManager, WrappedScope};
pub use tracer::{Tracer, TracerBuilder};
