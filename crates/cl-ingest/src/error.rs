//! Errors raised converting between `Value` and the host serialization
//! formats.

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("value is not representable as {format}: {message}")]
    NotRepresentable { format: &'static str, message: String },
}

pub type Result<T> = std::result::Result<T, IngestError>;
