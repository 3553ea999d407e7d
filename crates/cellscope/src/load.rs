use std::fs;
use std::path::Path;

use cellscope_core::error::{CellscopeError, Result};
use cellscope_core::model::span::Span;
use tracing::debug;

/// Reads a trace file: a JSON array of span records, the shape the
/// observability backend returns for one trace.
pub fn load_spans(path: &Path) -> Result<Vec<Span>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| CellscopeError::Io(format!("failed reading {}: {e}", path.display())))?;
    let spans: Vec<Span> = serde_json::from_str(&raw)
        .map_err(|e| CellscopeError::Parse(format!("failed parsing {}: {e}", path.display())))?;
    debug!(spans = spans.len(), path = %path.display(), "loaded trace file");
    Ok(spans)
}
