//! Error types for the bunker compositor.

use crate::asset::AssetKind;

/// Top-level error type for asset preparation, layout, and compositing.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// A source image is malformed or has zero size.
    #[error("invalid {kind} asset: {reason}")]
    InvalidAsset {
        /// Which asset failed.
        kind: AssetKind,
        /// Human-readable description of the problem.
        reason: String,
    },

    /// A required asset (background or room template) is not available.
    #[error("missing required {0} asset")]
    MissingAsset(AssetKind),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Image decode or encode error.
    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),

    /// Scene manifest serialization error.
    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Worker pool setup error.
    #[error("batch error: {0}")]
    Batch(String),

    /// A single scene failed; carries the scene index for diagnosis.
    #[error("scene {index} failed: {source}")]
    Scene {
        /// Zero-based scene index.
        index: usize,
        /// Underlying failure.
        #[source]
        source: Box<ComposeError>,
    },
}

impl ComposeError {
    /// Shorthand for [`ComposeError::InvalidAsset`].
    pub fn invalid(kind: AssetKind, reason: impl Into<String>) -> Self {
        Self::InvalidAsset {
            kind,
            reason: reason.into(),
        }
    }

    /// Wrap an error with the index of the scene it came from.
    pub fn in_scene(self, index: usize) -> Self {
        match self {
            already @ Self::Scene { .. } => already,
            other => Self::Scene {
                index,
                source: Box::new(other),
            },
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ComposeError>;
