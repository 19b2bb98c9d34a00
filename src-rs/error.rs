use thiserror::Error;

/// Result alias for fallible evidence operations.
pub type Result<T> = std::result::Result<T, EvidenceError>;

#[derive(Debug, Error)]
pub enum EvidenceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown HTTP method: {0}")]
    UnknownMethod(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
