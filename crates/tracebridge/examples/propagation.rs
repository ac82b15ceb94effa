//! 跨进程传播演示：注入到 header map，再在"下游"提取并挂接
//! Cross-process propagation demo: inject into a header map, then extract
//! downstream and parent against it

use std::collections::HashMap;
use std::sync::Arc;

use tracebridge::{ExtractCarrier, Format, InjectCarrier, LocalEngine, Tracer};

fn main() {
    let engine = LocalEngine::builder().service_name("demo").build_local();
    let tracer = Tracer::with_engine(Arc::new(engine.clone()));

    // 上游：开 span、放 baggage、注入
    // Upstream: start a span, set baggage, inject
    let client = tracer.build_span("client-request").start();
    client.set_baggage_item("user", "42");

    let mut headers: HashMap<String, String> = HashMap::new();
    tracer.inject(
        &client.context(),
        Format::HttpHeaders,
        InjectCarrier::TextMap(&mut headers),
    );
    println!("headers on the wire: {headers:#?}");
    client.finish();

    // 下游：提取并挂接
    // Downstream: extract and parent
    let parent = tracer
        .extract(Format::HttpHeaders, ExtractCarrier::TextMap(&headers))
        .expect("map carriers are supported");
    println!("extracted parent {parent:?} baggage={:?}", parent.baggage_items());

    let scope = tracer
        .build_span("server-handler")
        .as_child_of(Some(&parent))
        .start_active(true);
    scope.span().set_tag("component", "http");
    scope.close();

    tracer.close();
    for span in engine.finished_spans() {
        println!(
            "finished {} trace={} parent={:?}",
            span.operation_name, span.trace_id, span.parent_span_id
        );
    }
}
