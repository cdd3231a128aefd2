//! GBDT ensemble for multi-class parameter typing
//!
//! The `gbdt` crate trains binary models, so the multi-class classifier is
//! one-vs-rest: one `LogLikelyhood` booster per label seen in training. Each
//! booster yields P(label | x) against the rest; the per-class scores are
//! normalised into a distribution over the known labels.
//!
//! Note: the gbdt crate internally uses `f32` (`ValueType`), while feature
//! vectors store `f64`. Conversions happen at the crate boundary.

use gbdt::config::Config;
use gbdt::decision_tree::Data;
use gbdt::gradient_boost::GBDT;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::vectorizer::FeatureVector;
use crate::error::{PipelineError, Result};
use crate::models::TypeLabel;

#[inline]
fn to_f32(features: &FeatureVector) -> Vec<f32> {
    features.iter().map(|&v| v as f32).collect()
}

// ---------------------------------------------------------------------------
// Booster hyperparameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GbdtParams {
    /// Boosting iterations per class
    pub num_trees: usize,
    pub max_depth: u32,
    /// Shrinkage / step size
    pub learning_rate: f64,
    pub min_leaf_size: usize,
}

impl Default for GbdtParams {
    fn default() -> Self {
        Self {
            num_trees: 50,
            max_depth: 4,
            learning_rate: 0.1,
            min_leaf_size: 1,
        }
    }
}

/// Train a binary booster. `labels` use 1.0 for the positive class and
/// -1.0 for the rest (LogLikelyhood convention).
pub fn train_binary(features: &[FeatureVector], labels: &[f64], params: &GbdtParams) -> Result<GBDT> {
    if features.is_empty() {
        return Err(PipelineError::TrainingPrecondition(
            "no training samples provided".into(),
        ));
    }
    if features.len() != labels.len() {
        return Err(PipelineError::TrainingPrecondition(format!(
            "feature count ({}) does not match label count ({})",
            features.len(),
            labels.len()
        )));
    }

    let mut cfg = Config::new();
    cfg.set_feature_size(features[0].len());
    cfg.set_max_depth(params.max_depth);
    cfg.set_iterations(params.num_trees);
    cfg.set_shrinkage(params.learning_rate as f32);
    cfg.set_loss("LogLikelyhood");
    cfg.set_debug(false);
    cfg.set_training_optimization_level(2);
    cfg.set_min_leaf_size(params.min_leaf_size);

    let mut gbdt = GBDT::new(&cfg);

    let mut training_data: Vec<Data> = features
        .iter()
        .zip(labels.iter())
        .map(|(f, &label)| Data::new_training_data(to_f32(f), 1.0_f32, label as f32, None))
        .collect();

    gbdt.fit(&mut training_data);

    Ok(gbdt)
}

// ---------------------------------------------------------------------------
// One-vs-rest classifier
// ---------------------------------------------------------------------------

/// Multi-class tree ensemble over [`TypeLabel`]s
#[derive(Serialize, Deserialize)]
pub struct GbdtClassifier {
    /// Labels known to the model, in canonical order
    classes: Vec<TypeLabel>,
    /// One booster per entry of `classes`
    models: Vec<GBDT>,
    feature_size: usize,
}

impl GbdtClassifier {
    /// Fit one booster per distinct label. Boosters train in parallel.
    pub fn fit(features: &[FeatureVector], labels: &[TypeLabel], params: &GbdtParams) -> Result<Self> {
        let mut classes: Vec<TypeLabel> = labels.to_vec();
        classes.sort();
        classes.dedup();

        if classes.len() < 2 {
            return Err(PipelineError::TrainingPrecondition(format!(
                "need at least two distinct labels, found {}",
                classes.len()
            )));
        }

        let feature_size = features.first().map_or(0, |f| f.len());

        let models = classes
            .par_iter()
            .map(|&class| {
                let binary: Vec<f64> = labels
                    .iter()
                    .map(|&l| if l == class { 1.0 } else { -1.0 })
                    .collect();
                train_binary(features, &binary, params)
            })
            .collect::<Result<Vec<GBDT>>>()?;

        Ok(Self {
            classes,
            models,
            feature_size,
        })
    }

    pub fn classes(&self) -> &[TypeLabel] {
        &self.classes
    }

    pub fn feature_size(&self) -> usize {
        self.feature_size
    }

    /// Class probability rows, one per input, each summing to 1 over
    /// [`classes`](Self::classes).
    pub fn predict_proba(&self, features: &[FeatureVector]) -> Vec<Vec<f64>> {
        if features.is_empty() {
            return Vec::new();
        }

        let data: Vec<Data> = features
            .iter()
            .map(|f| Data::new_test_data(to_f32(f), None))
            .collect();

        // scores[class][row]
        let scores: Vec<Vec<f32>> = self.models.iter().map(|m| m.predict(&data)).collect();

        (0..features.len())
            .map(|row| {
                let raw: Vec<f64> = scores
                    .iter()
                    .map(|s| {
                        let p = s.get(row).copied().unwrap_or(0.0) as f64;
                        if p.is_finite() {
                            p.clamp(0.0, 1.0)
                        } else {
                            0.0
                        }
                    })
                    .collect();
                normalise(raw)
            })
            .collect()
    }

    /// Predicted label and its probability row for each input.
    pub fn predict(&self, features: &[FeatureVector]) -> Vec<(TypeLabel, Vec<f64>)> {
        self.predict_proba(features)
            .into_iter()
            .map(|probs| (self.classes[argmax(&probs)], probs))
            .collect()
    }
}

fn normalise(raw: Vec<f64>) -> Vec<f64> {
    let total: f64 = raw.iter().sum();
    if total > 0.0 {
        raw.into_iter().map(|p| p / total).collect()
    } else {
        let n = raw.len() as f64;
        raw.into_iter().map(|_| 1.0 / n).collect()
    }
}

/// Index of the largest value; ties go to the lowest index.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three separable clusters on the first two columns.
    fn clusters() -> (Vec<FeatureVector>, Vec<TypeLabel>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..12 {
            let jitter = i as f64 * 0.01;
            features.push(vec![1.0, 0.0, jitter]);
            labels.push(TypeLabel::Int);
            features.push(vec![0.0, 1.0, jitter]);
            labels.push(TypeLabel::Email);
            features.push(vec![0.0, 0.0, 5.0 + jitter]);
            labels.push(TypeLabel::String);
        }
        (features, labels)
    }

    fn small_params() -> GbdtParams {
        GbdtParams {
            num_trees: 10,
            max_depth: 3,
            learning_rate: 0.3,
            min_leaf_size: 1,
        }
    }

    #[test]
    fn test_train_binary_validation_errors() {
        let result = train_binary(&[], &[], &small_params());
        assert!(matches!(result, Err(PipelineError::TrainingPrecondition(_))));

        let result = train_binary(&[vec![1.0], vec![2.0]], &[1.0], &small_params());
        match result {
            Err(e) => assert!(e.to_string().contains("does not match"), "got: {e}"),
            Ok(_) => panic!("expected error for mismatched lengths"),
        }
    }

    #[test]
    fn test_single_class_rejected() {
        let features = vec![vec![1.0], vec![2.0]];
        let labels = vec![TypeLabel::String, TypeLabel::String];
        let result = GbdtClassifier::fit(&features, &labels, &small_params());
        assert!(matches!(result, Err(PipelineError::TrainingPrecondition(_))));
    }

    #[test]
    fn test_fit_and_predict_clusters() {
        let (features, labels) = clusters();
        let clf = GbdtClassifier::fit(&features, &labels, &small_params()).unwrap();

        assert_eq!(
            clf.classes(),
            &[TypeLabel::Int, TypeLabel::Email, TypeLabel::String]
        );
        assert_eq!(clf.feature_size(), 3);

        let preds = clf.predict(&[vec![1.0, 0.0, 0.05], vec![0.0, 1.0, 0.05]]);
        assert_eq!(preds[0].0, TypeLabel::Int);
        assert_eq!(preds[1].0, TypeLabel::Email);
    }

    #[test]
    fn test_probabilities_are_a_distribution() {
        let (features, labels) = clusters();
        let clf = GbdtClassifier::fit(&features, &labels, &small_params()).unwrap();

        for probs in clf.predict_proba(&features) {
            assert_eq!(probs.len(), 3);
            assert!(probs.iter().all(|&p| (0.0..=1.0).contains(&p)));
            let total: f64 = probs.iter().sum();
            assert!((total - 1.0).abs() < 1e-9, "sum was {total}");
        }
    }

    #[test]
    fn test_predict_empty_batch() {
        let (features, labels) = clusters();
        let clf = GbdtClassifier::fit(&features, &labels, &small_params()).unwrap();
        assert!(clf.predict_proba(&[]).is_empty());
    }

    #[test]
    fn test_argmax_ties_prefer_first() {
        assert_eq!(argmax(&[0.5, 0.5]), 0);
        assert_eq!(argmax(&[0.2, 0.3, 0.5]), 2);
    }

    #[test]
    fn test_normalise_zero_mass_is_uniform() {
        assert_eq!(normalise(vec![0.0, 0.0]), vec![0.5, 0.5]);
    }
}
