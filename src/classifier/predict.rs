//! Scoring templates with a trained artifact

use std::collections::BTreeMap;

use serde::Serialize;

use super::artifact::ModelArtifact;
use super::features::FeatureExtractor;
use super::vectorizer::FeatureVector;
use crate::models::{Template, TypeLabel};

/// Prediction for one parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub template_index: usize,
    pub param_index: usize,
    pub name: String,
    pub original_value: String,
    pub predicted: TypeLabel,
    /// Probability mass on `predicted`, in [0, 1]
    pub confidence: f64,
    /// Distribution over the classifier's known labels
    pub probabilities: BTreeMap<TypeLabel, f64>,
}

/// Predict a label and class distribution for every parameter.
pub fn predict(templates: &[Template], artifact: &ModelArtifact) -> Vec<PredictionRecord> {
    let extractor = FeatureExtractor::new();

    let mut vectors: Vec<FeatureVector> = Vec::new();
    let mut positions = Vec::new();
    for (t_idx, template) in templates.iter().enumerate() {
        let ctx = template.context();
        for (p_idx, param) in template.params.iter().enumerate() {
            let features = extractor.extract(param, &ctx);
            vectors.push(artifact.vectorizer.transform(&features));
            positions.push((t_idx, p_idx, param));
        }
    }

    if vectors.is_empty() {
        return Vec::new();
    }

    let classes = artifact.classes();
    artifact
        .classifier
        .predict(&vectors)
        .into_iter()
        .zip(positions)
        .map(|((predicted, probs), (t_idx, p_idx, param))| {
            let probabilities: BTreeMap<TypeLabel, f64> =
                classes.iter().copied().zip(probs).collect();
            let confidence = probabilities.get(&predicted).copied().unwrap_or(0.0);
            PredictionRecord {
                template_index: t_idx,
                param_index: p_idx,
                name: param.name.clone(),
                original_value: param.original_value.clone(),
                predicted,
                confidence,
                probabilities,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::dataset;
    use crate::classifier::gbdt_model::GbdtParams;
    use crate::classifier::train::{train, TrainConfig};
    use crate::models::Parameter;

    fn trained() -> ModelArtifact {
        let mut params = Vec::new();
        for i in 0..8 {
            params.push(Parameter::new(format!("page_{i}"), format!("{}", i + 10)));
            params.push(Parameter::new(format!("note_{i}"), format!("hello there {i}")));
        }
        let templates = vec![Template {
            method: "GET".into(),
            params,
            ..Default::default()
        }];
        let config = TrainConfig {
            gbdt: GbdtParams {
                num_trees: 10,
                max_depth: 3,
                learning_rate: 0.3,
                min_leaf_size: 1,
            },
            ..Default::default()
        };
        train(&dataset::build(&templates), &config).unwrap().artifact
    }

    #[test]
    fn test_empty_input_yields_empty_predictions() {
        let artifact = trained();
        assert!(predict(&[], &artifact).is_empty());
        assert!(predict(&[Template::default()], &artifact).is_empty());
    }

    #[test]
    fn test_confidence_and_distribution() {
        let artifact = trained();
        let templates = vec![
            Template {
                method: "POST".into(),
                params: vec![Parameter::new("page", "4"), Parameter::new("unseen_name", "")],
                ..Default::default()
            },
            Template {
                params: vec![Parameter::new("note", "some text")],
                ..Default::default()
            },
        ];

        let preds = predict(&templates, &artifact);
        assert_eq!(preds.len(), 3);
        assert_eq!((preds[2].template_index, preds[2].param_index), (1, 0));

        for p in &preds {
            assert!((0.0..=1.0).contains(&p.confidence));
            let total: f64 = p.probabilities.values().sum();
            assert!((total - 1.0).abs() < 1e-9);
            assert_eq!(p.probabilities.len(), artifact.classes().len());
            assert_eq!(p.confidence, p.probabilities[&p.predicted]);
        }
        assert_eq!(preds[0].predicted, TypeLabel::Int);
        assert_eq!(preds[2].predicted, TypeLabel::String);
    }
}
