//! Parameter type classifier
//!
//! Heuristic labels bootstrap a training set, a one-vs-rest GBDT ensemble
//! learns from it, and low-confidence predictions can be routed to an
//! operator for labeling and a full retrain.
//!
//! Flow: templates -> dataset (features + labels) -> train -> artifact ->
//! predict -> (active learning -> retrain -> predict) -> merge

pub mod active;
pub mod artifact;
pub mod baseline;
pub mod dataset;
pub mod features;
pub mod gbdt_model;
pub mod heuristic;
pub mod metrics;
mod patterns;
pub mod predict;
pub mod train;
pub mod vectorizer;

pub use active::{
    ActiveConfig, ActiveLearner, ConsoleLabelSource, LabelAnswer, LabelPrompt, LabelSource,
    ManualLabel, ScriptedLabelSource,
};
pub use artifact::ModelArtifact;
pub use baseline::baseline_value;
pub use dataset::Dataset;
pub use features::{FeatureExtractor, FeatureRecord, FeatureValue};
pub use gbdt_model::{GbdtClassifier, GbdtParams};
pub use metrics::ClassificationReport;
pub use predict::{predict, PredictionRecord};
pub use train::{train, TrainConfig, TrainOutcome};

use crate::models::TypeLabel;

/// Summary of a batch of predictions against a confidence threshold
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionSummary {
    pub total: usize,
    pub low_confidence: usize,
    pub mean_confidence: f64,
    pub by_label: std::collections::BTreeMap<TypeLabel, usize>,
}

impl PredictionSummary {
    pub fn from_predictions(predictions: &[PredictionRecord], threshold: f64) -> Self {
        let mut by_label = std::collections::BTreeMap::new();
        let mut low_confidence = 0;
        let mut confidence_sum = 0.0;

        for p in predictions {
            *by_label.entry(p.predicted).or_insert(0) += 1;
            if p.confidence < threshold {
                low_confidence += 1;
            }
            confidence_sum += p.confidence;
        }

        Self {
            total: predictions.len(),
            low_confidence,
            mean_confidence: if predictions.is_empty() {
                0.0
            } else {
                confidence_sum / predictions.len() as f64
            },
            by_label,
        }
    }
}
