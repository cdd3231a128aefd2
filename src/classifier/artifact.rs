//! The persisted model: fitted vectorizer and classifier, stored together
//!
//! A vectorizer and a classifier fitted on different data are incompatible,
//! so they only ever travel as one file. The file is a single bitcode blob,
//! read and written whole.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::gbdt_model::GbdtClassifier;
use super::vectorizer::DictVectorizer;
use crate::error::{PipelineError, Result};
use crate::models::TypeLabel;

/// Bumped whenever the serialized layout changes.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub format_version: u32,
    /// RFC 3339 UTC time of the fit
    pub trained_at: String,
    /// Rows used to fit the classifier (training partition)
    pub training_rows: usize,
    /// Holdout accuracy, when a holdout existed
    pub holdout_accuracy: Option<f64>,
}

#[derive(Serialize, Deserialize)]
pub struct ModelArtifact {
    pub meta: ArtifactMeta,
    pub vectorizer: DictVectorizer,
    pub classifier: GbdtClassifier,
}

impl ModelArtifact {
    pub fn new(vectorizer: DictVectorizer, classifier: GbdtClassifier, meta: ArtifactMeta) -> Self {
        Self {
            meta,
            vectorizer,
            classifier,
        }
    }

    pub fn classes(&self) -> &[TypeLabel] {
        self.classifier.classes()
    }

    /// Write the artifact, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = bitcode::serialize(self)
            .map_err(|e| PipelineError::Artifact(format!("failed to serialize model: {e}")))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        tracing::info!("Saved model to {}", path.display());
        Ok(())
    }

    /// Read an artifact written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::missing_model(path));
        }
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let artifact: Self = bitcode::deserialize(bytes)
            .map_err(|e| PipelineError::Artifact(format!("failed to parse model: {e}")))?;

        if artifact.meta.format_version != FORMAT_VERSION {
            return Err(PipelineError::Artifact(format!(
                "unsupported model format version {} (expected {})",
                artifact.meta.format_version, FORMAT_VERSION
            )));
        }
        if artifact.vectorizer.len() != artifact.classifier.feature_size() {
            return Err(PipelineError::Artifact(format!(
                "vectorizer has {} columns but classifier expects {}",
                artifact.vectorizer.len(),
                artifact.classifier.feature_size()
            )));
        }
        Ok(artifact)
    }
}
