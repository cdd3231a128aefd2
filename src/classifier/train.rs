//! Training for the parameter type classifier
//!
//! Vectorizes the labeled dataset, holds out a stratified slice for
//! evaluation, fits the GBDT ensemble and packages the result as a
//! [`ModelArtifact`]. Every call fits from scratch.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::artifact::{ArtifactMeta, ModelArtifact, FORMAT_VERSION};
use super::dataset::Dataset;
use super::features::FeatureRecord;
use super::gbdt_model::{GbdtClassifier, GbdtParams};
use super::metrics::ClassificationReport;
use super::vectorizer::{DictVectorizer, FeatureVector};
use crate::error::{PipelineError, Result};
use crate::models::TypeLabel;

/// Training configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub gbdt: GbdtParams,
    /// Fraction of each class held out for evaluation (0.0 - 1.0)
    pub holdout_fraction: f64,
    /// Seed for the holdout split
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            gbdt: GbdtParams::default(),
            holdout_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Training result
pub struct TrainOutcome {
    pub artifact: ModelArtifact,
    /// Holdout evaluation, absent when nothing could be held out
    pub report: Option<ClassificationReport>,
    pub train_rows: usize,
    pub holdout_rows: usize,
    pub class_counts: BTreeMap<TypeLabel, usize>,
}

/// Split row indices into (train, holdout), stratified by label.
///
/// Each class contributes `round(n * fraction)` rows to the holdout but
/// always keeps at least one row for training. Both index lists come back
/// sorted.
pub fn stratified_split(labels: &[TypeLabel], fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut by_class: BTreeMap<TypeLabel, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(i);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut holdout = Vec::new();

    for (_, mut rows) in by_class {
        rows.shuffle(&mut rng);
        let wanted = (rows.len() as f64 * fraction).round() as usize;
        let n_holdout = wanted.min(rows.len() - 1);
        holdout.extend_from_slice(&rows[..n_holdout]);
        train.extend_from_slice(&rows[n_holdout..]);
    }

    train.sort_unstable();
    holdout.sort_unstable();
    (train, holdout)
}

/// Fit a fresh vectorizer + classifier pair on `dataset`.
pub fn train(dataset: &Dataset, config: &TrainConfig) -> Result<TrainOutcome> {
    if dataset.is_empty() {
        return Err(PipelineError::TrainingPrecondition(
            "no training data found in templates".into(),
        ));
    }

    let class_counts = dataset.class_counts();
    if class_counts.len() < 2 {
        let only = class_counts
            .keys()
            .next()
            .map(|l| l.to_string())
            .unwrap_or_default();
        return Err(PipelineError::TrainingPrecondition(format!(
            "need at least two distinct labels, every row is labeled '{only}'"
        )));
    }

    tracing::info!(
        "Training on {} rows ({} with provided labels)",
        dataset.len(),
        dataset.provided_count()
    );
    for (label, count) in &class_counts {
        tracing::debug!("  {label}: {count}");
    }

    let records: Vec<&FeatureRecord> = dataset.rows.iter().map(|r| &r.features).collect();
    let (vectorizer, vectors) = DictVectorizer::fit_transform(&records);
    let labels = dataset.labels();

    let (train_idx, holdout_idx) =
        stratified_split(&labels, config.holdout_fraction, config.seed);
    tracing::info!(
        "Training: {} rows, Holdout: {} rows, {} feature columns",
        train_idx.len(),
        holdout_idx.len(),
        vectorizer.len()
    );

    let pick = |idx: &[usize]| -> (Vec<FeatureVector>, Vec<TypeLabel>) {
        idx.iter().map(|&i| (vectors[i].clone(), labels[i])).unzip()
    };
    let (x_train, y_train) = pick(&train_idx);
    let (x_holdout, y_holdout) = pick(&holdout_idx);

    let classifier = GbdtClassifier::fit(&x_train, &y_train, &config.gbdt)?;

    let report = if x_holdout.is_empty() {
        tracing::warn!("Holdout split is empty; skipping evaluation");
        None
    } else {
        let predicted: Vec<TypeLabel> = classifier
            .predict(&x_holdout)
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        let report = ClassificationReport::from_predictions(&y_holdout, &predicted);
        tracing::info!("Holdout accuracy: {:.2}%", report.accuracy * 100.0);
        Some(report)
    };

    let meta = ArtifactMeta {
        format_version: FORMAT_VERSION,
        trained_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        training_rows: x_train.len(),
        holdout_accuracy: report.as_ref().map(|r| r.accuracy),
    };

    Ok(TrainOutcome {
        artifact: ModelArtifact::new(vectorizer, classifier, meta),
        report,
        train_rows: train_idx.len(),
        holdout_rows: holdout_idx.len(),
        class_counts,
    })
}
