//! 内部追踪引擎契约
//! Internal trace engine contracts
//!
//! 采样、缓冲与上报都在契约的另一侧；桥接层只依赖这里声明的能力
//! Sampling, buffering and transmission live on the other side of these
//! contracts; the bridge layer depends only on the capabilities declared here

use super::codec::{CarrierGetter, CarrierSetter};
use super::context::EngineContext;
use super::scope::ScopeRef;
use super::span::{SpanData, SpanRef, TagValue};
use std::sync::Arc;
use thiserror::Error;

/// 引擎层错误
/// Engine-level errors
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// 引擎已经关闭
    /// The engine is already closed
    #[error("engine is already closed")]
    Closed,
    /// 刷新失败
    /// Flush failed
    #[error("flush failed: {0}")]
    Flush(String),
}

/// 引擎 span 构建器：每次 build_span 一个实例，不可复用
/// Engine span builder: one instance per build_span call, not reusable
pub trait EngineSpanBuilder {
    /// 设置父级上下文；传入空上下文表示显式无父，并抑制自动挂接活动 span
    /// Set the parent context; an absent context means "explicitly no
    /// parent" and suppresses automatic parenting from the active span
    fn as_child_of(&mut self, parent: EngineContext);
    /// 不从当前活动 span 自动继承父级
    /// Do not inherit a parent from the currently active span
    fn ignore_active_span(&mut self);
    /// 设置标签（同键后写覆盖）
    /// Set a tag (last write per key wins)
    fn with_tag(&mut self, key: &str, value: TagValue);
    /// 覆盖开始时间；不调用则由引擎取当前时刻
    /// Override the start time; the engine uses the current instant otherwise
    fn with_start_timestamp(&mut self, timestamp_micros: u64);
    /// 构建并启动 span，不激活
    /// Build and start the span without activating it
    fn start(self: Box<Self>) -> SpanRef;
    /// 构建、启动并激活 span
    /// Build, start and activate the span in one step
    fn start_active(self: Box<Self>, finish_on_close: bool) -> ScopeRef;
}

/// 作用域管理 SPI - 安装了外部管理器时引擎统一使用的能力
/// Scope-manager SPI - the uniform capability the engine consults when an
/// external manager is installed
pub trait EngineScopeManager: Send + Sync {
    fn activate(&self, span: SpanRef, finish_on_close: bool) -> ScopeRef;
    fn active(&self) -> Option<ScopeRef>;
    fn active_span(&self) -> Option<SpanRef>;
}

/// 追踪拦截器：整条 trace 完成时依优先级逐个调用
/// Trace interceptor: invoked in priority order when a whole trace completes
pub trait TraceInterceptor: Send + Sync {
    /// 返回（可能被改写的）trace；返回空集丢弃整条 trace
    /// Returns the (possibly rewritten) trace; an empty set drops it
    fn on_trace_complete(&self, trace: Vec<SpanData>) -> Vec<SpanData>;

    fn priority(&self) -> i32 {
        0
    }
}

/// 作用域激活监听器
/// Scope-activation listener
pub trait ScopeListener: Send + Sync {
    fn after_scope_activated(&self);
    fn after_scope_closed(&self);
}

/// 内部追踪引擎
/// The internal trace engine
pub trait TracerEngine: Send + Sync {
    /// 创建 span 构建器
    /// Create a span builder
    fn build_span(&self, operation_name: &str) -> Box<dyn EngineSpanBuilder>;
    /// 激活 span
    /// Activate a span
    fn activate_span(&self, span: SpanRef, finish_on_close: bool) -> ScopeRef;
    /// 当前活动作用域
    /// Currently active scope
    fn active_scope(&self) -> Option<ScopeRef>;
    /// 当前活动 span
    /// Currently active span
    fn active_span(&self) -> Option<SpanRef>;
    /// 当前 trace 标识符的字符串形式；无活动 trace 时为 "0"
    /// Current trace identifier as a string; "0" without an active trace
    fn trace_id(&self) -> String;
    /// 当前 span 标识符的字符串形式；无活动 span 时为 "0"
    /// Current span identifier as a string; "0" without an active span
    fn span_id(&self) -> String;
    /// 通过配置的注入器写出上下文
    /// Write out a context through the configured injector
    fn inject(&self, context: &EngineContext, setter: &mut dyn CarrierSetter);
    /// 通过配置的提取器读回上下文
    /// Read back a context through the configured extractor
    fn extract(&self, getter: &dyn CarrierGetter) -> Option<EngineContext>;
    /// 注册追踪拦截器；重复注册返回 false
    /// Register a trace interceptor; false on duplicate registration
    fn add_trace_interceptor(&self, interceptor: Arc<dyn TraceInterceptor>) -> bool;
    /// 注册作用域监听器
    /// Register a scope listener
    fn add_scope_listener(&self, listener: Arc<dyn ScopeListener>);
    /// 刷新未完成的缓冲
    /// Flush pending buffers
    fn flush(&self) -> Result<(), EngineError>;
    /// 关闭引擎
    /// Shut the engine down
    fn close(&self) -> Result<(), EngineError>;
}

/// 引擎装配入口 - 桥接层构建 tracer 时据此装配引擎
/// Engine assembly entry - the bridge assembles the engine through this
/// when building a tracer
pub trait EngineBuilder {
    /// 在构建前安装作用域管理器（自定义模式）
    /// Install a scope manager before building (custom mode)
    fn install_scope_manager(&mut self, manager: Arc<dyn EngineScopeManager>);
    /// 构建引擎
    /// Build the engine
    fn build(self) -> Arc<dyn TracerEngine>
    where
        Self: Sized;
}
