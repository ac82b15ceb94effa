//! 内部追踪引擎对象模型
//! Internal trace engine object model
//!
//! 提供引擎侧的标识符、上下文变体、span/作用域契约、传播编解码接缝，
//! 以及一个进程内参考引擎
//! Provides engine-side identifiers, context variants, span/scope
//! contracts, the propagation codec seam, and an in-process reference
//! engine

pub mod codec;
pub mod context;
pub mod id;
pub mod local;
pub mod scope;
pub mod span;
pub mod tracer;

pub use codec::{
    CarrierGetter, CarrierSetter, CodecError, ContextExtractor, ContextInjector, TextHeaderCodec,
};
pub use context::{EngineContext, ExtractedContext, LocalContext, TagContext};
pub use id::{ParseIdError, SpanId, TraceId};
pub use local::{LocalEngine, LocalEngineBuilder, LocalEngineConfig};
pub use scope::{Continuation, EngineContinuation, EngineScope, PropagatingScope, ScopeRef};
pub use span::{EngineSpan, LogRecord, SpanData, SpanRef, TagValue};
pub use tracer::{
    EngineBuilder, EngineError, EngineScopeManager, EngineSpanBuilder, ScopeListener,
    TraceInterceptor, TracerEngine,
};
