//! Error types surfaced by the adjustment engine.
//!
//! Only conditions the caller must react to become errors. Degenerate curves,
//! near-zero denominators and mask capacity overflow are absorbed where they
//! occur and never reach this type.

/// Failures reported to the host application.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Source data or device capability the engine cannot work with.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),
    /// A render was requested before any image was loaded.
    #[error("no source image loaded")]
    NoSourceImage,
    /// The sidecar document is structurally valid JSON but not a FOTIQ sidecar.
    #[error("invalid sidecar: {0}")]
    Sidecar(String),
    /// The render device failed while executing a frame.
    #[error("render backend failure: {0}")]
    Backend(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
