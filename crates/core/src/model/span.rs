use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of a remote call a span was recorded on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpanKind {
    Client,
    Server,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InstanceKind {
    #[default]
    Cell,
    Composite,
}

/// Reference to the deployable unit that owns a span. System spans
/// (gateways, mesh infrastructure) carry none.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceRef {
    pub name: String,
    #[serde(default)]
    pub kind: InstanceKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Span {
    pub trace_id: String,
    pub span_id: String,
    #[serde(default)]
    pub parent_span_id: Option<String>,
    pub service: String,
    pub operation: String,
    pub kind: SpanKind,
    #[serde(default)]
    pub cell: Option<InstanceRef>,
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
    /// Drill-down annotation written back after cell-level diagram
    /// generation. The authoritative channel is the `ActionIdMap` the
    /// generator returns; this field is a convenience mirror of it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
}

impl Span {
    pub fn duration_ms(&self) -> i64 {
        (self.end_ts - self.start_ts).num_milliseconds().max(0)
    }

    pub fn cell_name(&self) -> Option<&str> {
        self.cell.as_ref().map(|c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_json(kind: &str) -> String {
        format!(
            r#"{{
                "trace_id": "t1",
                "span_id": "s1",
                "service": "orders",
                "operation": "GET /orders",
                "kind": "{kind}",
                "cell": {{"name": "checkout"}},
                "start_ts": "2026-02-01T00:00:00Z",
                "end_ts": "2026-02-01T00:00:01.500Z"
            }}"#
        )
    }

    #[test]
    fn deserializes_known_kinds() {
        let client: Span = serde_json::from_str(&sample_json("CLIENT")).unwrap();
        let server: Span = serde_json::from_str(&sample_json("SERVER")).unwrap();
        assert_eq!(client.kind, SpanKind::Client);
        assert_eq!(server.kind, SpanKind::Server);
    }

    #[test]
    fn unknown_kind_falls_back_to_other() {
        let span: Span = serde_json::from_str(&sample_json("PRODUCER")).unwrap();
        assert_eq!(span.kind, SpanKind::Other);
    }

    #[test]
    fn instance_kind_defaults_to_cell() {
        let span: Span = serde_json::from_str(&sample_json("SERVER")).unwrap();
        let cell = span.cell.unwrap();
        assert_eq!(cell.name, "checkout");
        assert_eq!(cell.kind, InstanceKind::Cell);
    }

    #[test]
    fn duration_is_non_negative() {
        let start = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 1).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let span = Span {
            trace_id: "t1".to_string(),
            span_id: "s1".to_string(),
            parent_span_id: None,
            service: "orders".to_string(),
            operation: "GET /orders".to_string(),
            kind: SpanKind::Server,
            cell: None,
            start_ts: start,
            end_ts: end,
            action_id: None,
        };
        assert_eq!(span.duration_ms(), 0);
    }
}
