// Error handling for the WindCube source

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WindCubeError>;

#[derive(Error, Debug)]
pub enum WindCubeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Unsupported compression type: {0}")]
    UnsupportedCompression(u8),

    #[error("Decompression failed: {0}")]
    Decompression(String),

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Buffer size mismatch for {resource}: expected {expected} slots, got {data} values and {status} status bytes")]
    BufferSize {
        resource: String,
        expected: usize,
        data: usize,
        status: usize,
    },

    #[error("Unsupported representation {0}")]
    UnsupportedRepresentation(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reason a data row was dropped by the row decoder. Never returned to
/// callers, only logged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeWarning {
    #[error("line {line}: expected {expected} cells, found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: unparseable timestamp {text:?}")]
    Timestamp { line: usize, text: String },

    #[error("line {line}: non-numeric value {text:?} in column {column}")]
    Value {
        line: usize,
        column: usize,
        text: String,
    },
}
