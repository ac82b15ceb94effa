//! TraceBridge - vendor-neutral tracing facade over a pluggable trace engine
//!
//! This crate lets application code instrument itself against a standard
//! tracing surface (spans, scopes, span contexts, inject/extract
//! propagation) while all actual trace construction, sampling, buffering
//! and transmission stay inside an internal trace engine with its own
//! object model:
//! - A pure translation layer between the two object models
//! - Reference semantics (child-of, follows-from) mapped onto engine parentage
//! - Pluggable scope management, including externally supplied managers
//! - Best-effort propagation over map-like carriers
//!
//! # Example
//!
//! ```rust
//! use tracebridge::{LocalEngine, Tracer};
//!
//! let tracer = Tracer::builder().build(LocalEngine::builder());
//!
//! let scope = tracer
//!     .build_span("handle-request")
//!     .with_tag("component", "http")
//!     .start_active(true);
//! scope.span().set_baggage_item("user", "42");
//! scope.close();
//!
//! tracer.close();
//! ```

pub mod api;
pub mod bridge;
pub mod engine;

pub use api::propagation::{ExtractCarrier, Format, InjectCarrier, TextMapExtract, TextMapInject};
pub use api::scope::{Scope, ScopeHandle, ScopeManager, ScopePropagation};
pub use api::span::{Span, SpanContext, Tag, tags};
pub use bridge::builder::{CHILD_OF, FOLLOWS_FROM, SpanBuilder};
pub use bridge::convert::Converter;
pub use bridge::log::{DefaultLogHandler, LogHandler};
pub use bridge::tracer::{Tracer, TracerBuilder};
pub use engine::local::{LocalEngine, LocalEngineBuilder, LocalEngineConfig};
pub use engine::scope::Continuation;
pub use engine::span::{SpanData, TagValue};
