use thiserror::Error;

#[derive(Debug, Error)]
pub enum CellscopeError {
    #[error("malformed trace: {0}")]
    MalformedTrace(String),

    #[error("drill-down target not found: {0}")]
    DrillDownNotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, CellscopeError>;
