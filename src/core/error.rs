//! Error types for the viewer

use thiserror::Error;

/// Main error type for the viewer
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed container: {0}")]
    Format(String),

    #[error("primitive is missing the {0} attribute")]
    MissingAttribute(&'static str),

    #[error("skin has {got} joints, renderer supports at most {max}")]
    Capacity { got: usize, max: usize },

    #[error("node {0} is part of a parent cycle")]
    Cycle(usize),

    #[error("animation '{name}' not found, available: {available:?}")]
    AnimationNotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scene description: {0}")]
    Json(#[from] serde_json::Error),
}
