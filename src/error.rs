//! Error types for the classification pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while normalizing, training or predicting
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unrecognized input JSON format: {0}")]
    InputFormat(String),

    #[error("{kind} not found: {}", path.display())]
    MissingResource { kind: &'static str, path: PathBuf },

    #[error("Cannot train: {0}")]
    TrainingPrecondition(String),

    #[error("Invalid label '{0}'. Allowed: int, float, bool, uuid, email, enum, string")]
    InvalidLabel(String),

    #[error("Active learning session aborted by operator; manual labels discarded")]
    Aborted,

    #[error("Model artifact error: {0}")]
    Artifact(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn missing_input(path: impl Into<PathBuf>) -> Self {
        Self::MissingResource {
            kind: "Input file",
            path: path.into(),
        }
    }

    pub fn missing_model(path: impl Into<PathBuf>) -> Self {
        Self::MissingResource {
            kind: "Model file",
            path: path.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
