//! Error types for the spam detector.

use std::path::PathBuf;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised while loading or evaluating the model artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid artifact {name}: {reason}")]
    InvalidArtifact { name: String, reason: String },

    #[error("Feature shape mismatch: model expects {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Label code {code} is outside the encoder's {classes} classes")]
    UnknownLabelCode { code: usize, classes: usize },

    #[error("Unknown label: {0}")]
    UnknownLabel(String),
}

/// Per-request classification errors.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("Model call failed: {0}")]
    Model(#[from] ModelError),
}

/// HTTP server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server terminated: {0}")]
    Serve(#[source] std::io::Error),
}
