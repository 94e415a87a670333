use thiserror::Error;

/// Errors raised while importing or exporting a trail definition.
#[derive(Debug, Error)]
pub enum TrailError {
    #[error("Failed to read trail file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid trail JSON: {0}")]
    Json(#[from] serde_json::Error),
}
