//! Merging predictions back into templates and writing enriched output

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::normalize::InputFormat;
use crate::classifier::baseline::baseline_value;
use crate::classifier::PredictionRecord;
use crate::error::Result;
use crate::models::{Template, TypeLabel};

/// Provenance block written alongside the enriched templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputMeta {
    /// RFC 3339 UTC timestamp
    pub generated_at: String,
    /// Model artifact path used for prediction
    pub model: String,
    pub input_format: InputFormat,
}

impl OutputMeta {
    pub fn new(model: &Path, input_format: InputFormat) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            model: model.display().to_string(),
            input_format,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedOutput {
    pub meta: OutputMeta,
    pub templates: Vec<Template>,
}

/// Copy `templates` and annotate every addressed parameter with its
/// predicted type, confidence and baseline value.
///
/// Parameters with options always come out as `enum` at confidence 1.0.
pub fn merge(templates: &[Template], predictions: &[PredictionRecord]) -> Vec<Template> {
    let mut merged = templates.to_vec();

    for pred in predictions {
        let Some(param) = merged
            .get_mut(pred.template_index)
            .and_then(|t| t.params.get_mut(pred.param_index))
        else {
            tracing::warn!(
                "Prediction for '{}' addresses missing parameter ({}, {}), skipping",
                pred.name,
                pred.template_index,
                pred.param_index
            );
            continue;
        };

        let (label, confidence) = if param.has_options() {
            (TypeLabel::Enum, 1.0)
        } else {
            (pred.predicted, pred.confidence)
        };

        param.baseline_value = Some(baseline_value(param, label));
        param.predicted_type = Some(label);
        param.predicted_confidence = Some(confidence);
    }

    merged
}

/// Write enriched output as pretty JSON, replacing any existing file.
pub fn write_output(path: &Path, output: &EnrichedOutput) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(output)?;
    std::fs::write(path, json)?;
    tracing::info!("Wrote enriched templates to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Parameter;
    use std::collections::BTreeMap;

    fn pred(t: usize, p: usize, label: TypeLabel, confidence: f64) -> PredictionRecord {
        PredictionRecord {
            template_index: t,
            param_index: p,
            name: String::new(),
            original_value: String::new(),
            predicted: label,
            confidence,
            probabilities: BTreeMap::new(),
        }
    }

    fn templates() -> Vec<Template> {
        vec![Template {
            id: "t".into(),
            template: "/search".into(),
            method: "GET".into(),
            params: vec![
                Parameter::new("page", "2"),
                Parameter::new("sort", "asc").with_options(vec!["asc".into(), "desc".into()]),
            ],
        }]
    }

    #[test]
    fn test_merge_annotates_copy() {
        let input = templates();
        let merged = merge(
            &input,
            &[pred(0, 0, TypeLabel::Int, 0.8), pred(0, 1, TypeLabel::String, 0.4)],
        );

        assert!(input[0].params[0].predicted_type.is_none());

        let page = &merged[0].params[0];
        assert_eq!(page.predicted_type, Some(TypeLabel::Int));
        assert_eq!(page.predicted_confidence, Some(0.8));
        assert_eq!(page.baseline_value.as_deref(), Some("1"));

        let sort = &merged[0].params[1];
        assert_eq!(sort.predicted_type, Some(TypeLabel::Enum));
        assert_eq!(sort.predicted_confidence, Some(1.0));
        assert_eq!(sort.baseline_value.as_deref(), Some("asc"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let preds = [pred(0, 0, TypeLabel::Int, 0.8), pred(0, 1, TypeLabel::Enum, 0.9)];
        let once = merge(&templates(), &preds);
        let twice = merge(&once, &preds);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_out_of_range_predictions_skipped() {
        let merged = merge(
            &templates(),
            &[pred(3, 0, TypeLabel::Int, 0.8), pred(0, 9, TypeLabel::Int, 0.8)],
        );
        assert_eq!(merged, templates());
    }

    #[test]
    fn test_write_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");
        let output = EnrichedOutput {
            meta: OutputMeta::new(Path::new("model.bin"), InputFormat::List),
            templates: merge(&templates(), &[pred(0, 0, TypeLabel::Int, 0.8)]),
        };
        write_output(&path, &output).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["meta"]["input_format"], "list");
        assert!(written["meta"]["generated_at"].as_str().unwrap().ends_with('Z'));
        assert_eq!(written["templates"][0]["params"][0]["predicted_type"], "int");
        assert_eq!(written["templates"][0]["params"][0]["baseline_value"], "1");

        let back: EnrichedOutput = serde_json::from_value(written).unwrap();
        assert_eq!(back.templates, output.templates);
    }
}
