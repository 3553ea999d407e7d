use chrono::{Duration, TimeZone, Utc};
use cellscope_core::model::span::{InstanceKind, InstanceRef, Span, SpanKind};

fn span(
    trace_id: &str,
    span_id: &str,
    parent: Option<&str>,
    service: &str,
    operation: &str,
    kind: SpanKind,
    cell: Option<&str>,
    start_offset_ms: i64,
    duration_ms: i64,
) -> Span {
    let base = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
    Span {
        trace_id: trace_id.to_string(),
        span_id: span_id.to_string(),
        parent_span_id: parent.map(str::to_string),
        service: service.to_string(),
        operation: operation.to_string(),
        kind,
        cell: cell.map(|name| InstanceRef {
            name: name.to_string(),
            kind: InstanceKind::Cell,
        }),
        start_ts: base + Duration::milliseconds(start_offset_ms),
        end_ts: base + Duration::milliseconds(start_offset_ms + duration_ms),
        action_id: None,
    }
}

/// A request entering through the global gateway, crossing into the
/// hr cell and from there into the stock-options cell, with sidecar auth
/// filter and mixer noise sprinkled in the way the mesh records it.
pub fn sample_trace(trace_id: &str) -> Vec<Span> {
    vec![
        span(trace_id, "ingress", None, "global-gateway", "GET /hr", SpanKind::Client, None, 0, 900),
        span(trace_id, "hr-auth", Some("ingress"), "hr--sidecar", "oauth2-filter inbound", SpanKind::Server, Some("hr"), 10, 20),
        span(trace_id, "hr-gw", Some("hr-auth"), "hr--gateway", "GET /hr", SpanKind::Server, Some("hr"), 40, 800),
        span(trace_id, "mixer-report", Some("hr-gw"), "istio-mixer", "Report", SpanKind::Client, None, 50, 5),
        span(trace_id, "hr-emp", Some("hr-gw"), "hr--employee", "GET /employee", SpanKind::Server, Some("hr"), 60, 700),
        span(trace_id, "hr-out", Some("hr-emp"), "hr--employee", "GET /options", SpanKind::Client, Some("hr"), 100, 500),
        span(trace_id, "stock-gw", Some("hr-out"), "stock--gateway", "GET /options", SpanKind::Server, Some("stock-options"), 120, 450),
        span(trace_id, "stock-svc", Some("stock-gw"), "stock--options", "GET /options", SpanKind::Server, Some("stock-options"), 140, 400),
    ]
}

pub fn sample_trace_json(trace_id: &str) -> String {
    serde_json::to_string_pretty(&sample_trace(trace_id)).unwrap_or_default()
}
