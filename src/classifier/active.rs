//! Active learning: ask an operator to label the least confident predictions
//!
//! Candidate selection is a pure function of the predictions. The blocking
//! question/answer exchange goes through a [`LabelSource`], so the console,
//! a file of scripted answers, or a test harness can all sit behind it.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::path::Path;

use console::{style, Term};
use serde::{Deserialize, Serialize};

use super::dataset;
use super::predict::PredictionRecord;
use super::train::{train, TrainConfig, TrainOutcome};
use crate::error::{PipelineError, Result};
use crate::models::{Template, TypeLabel};

/// Default confidence below which a prediction is worth a human look.
pub const DEFAULT_THRESHOLD: f64 = 0.70;
/// Default maximum number of questions per session.
pub const DEFAULT_BATCH_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveConfig {
    /// Predictions with confidence strictly below this are candidates
    pub threshold: f64,
    pub batch_size: usize,
}

impl Default for ActiveConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// An operator-supplied label for one parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualLabel {
    pub template_index: usize,
    pub param_index: usize,
    pub label: TypeLabel,
}

/// What the operator is shown for one candidate
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPrompt {
    /// 1-based position in this session
    pub position: usize,
    pub total: usize,
    pub template_id: String,
    pub template_url: String,
    pub param_name: String,
    pub original_value: String,
    pub predicted: TypeLabel,
    pub confidence: f64,
}

/// One operator response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelAnswer {
    /// Raw text entered; empty means skip
    Text(String),
    /// End the whole session
    Abort,
}

/// Something that can answer labeling prompts, one at a time
pub trait LabelSource {
    /// Announce a session of `total` prompts. Optional.
    fn begin(&mut self, _total: usize) -> Result<()> {
        Ok(())
    }

    fn ask(&mut self, prompt: &LabelPrompt) -> Result<LabelAnswer>;
}

// ---------------------------------------------------------------------------
// Label sources
// ---------------------------------------------------------------------------

/// Interactive terminal source. Prompts on stderr, reads answers from
/// `reader` (stdin in the CLI). Blocks without timeout; end of input aborts.
pub struct ConsoleLabelSource<R> {
    term: Term,
    reader: R,
}

impl ConsoleLabelSource<BufReader<std::io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(std::io::stdin()))
    }
}

impl<R: BufRead> ConsoleLabelSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            term: Term::stderr(),
            reader,
        }
    }
}

impl<R: BufRead> LabelSource for ConsoleLabelSource<R> {
    fn begin(&mut self, total: usize) -> Result<()> {
        self.term.write_line(&format!(
            "\n{} please label up to {} low-confidence items. Type a label or press ENTER to skip.",
            style("Active learning:").cyan().bold(),
            total
        ))?;
        self.term.write_line(&format!(
            "Allowed labels: {}\n",
            style(TypeLabel::allowed()).dim()
        ))?;
        Ok(())
    }

    fn ask(&mut self, prompt: &LabelPrompt) -> Result<LabelAnswer> {
        self.term.write_line(&format!(
            "Item {}/{} | template_id={} | param='{}' | original_value='{}' | predicted={} ({:.2})",
            prompt.position,
            prompt.total,
            prompt.template_id,
            style(&prompt.param_name).bold(),
            prompt.original_value,
            style(prompt.predicted).yellow(),
            prompt.confidence
        ))?;
        self.term
            .write_line(&format!("{} {}", style("Context URL:").dim(), prompt.template_url))?;
        self.term.write_str("Enter label (or press ENTER to skip): ")?;

        // Undecodable bytes become replacement chars and fail label parsing.
        let mut buf = Vec::new();
        if self.reader.read_until(b'\n', &mut buf)? == 0 {
            self.term.write_line("")?;
            return Ok(LabelAnswer::Abort);
        }
        Ok(LabelAnswer::Text(String::from_utf8_lossy(&buf).trim().to_string()))
    }
}

/// Replays pre-recorded answers in order. Running out of answers skips.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLabelSource {
    answers: VecDeque<String>,
}

impl ScriptedLabelSource {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }

    /// One answer per line; blank lines are skips.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::MissingResource {
                kind: "Labels file",
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Self::new(content.lines().map(str::trim)))
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl LabelSource for ScriptedLabelSource {
    fn ask(&mut self, _prompt: &LabelPrompt) -> Result<LabelAnswer> {
        Ok(LabelAnswer::Text(self.answers.pop_front().unwrap_or_default()))
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Predictions below `threshold`, most uncertain first, at most `batch_size`.
///
/// The sort is stable, so equal confidences keep their input order.
pub fn select_candidates<'a>(
    predictions: &'a [PredictionRecord],
    config: &ActiveConfig,
) -> Vec<&'a PredictionRecord> {
    let mut low: Vec<&PredictionRecord> = predictions
        .iter()
        .filter(|p| p.confidence < config.threshold)
        .collect();
    low.sort_by(|a, b| a.confidence.total_cmp(&b.confidence));
    low.truncate(config.batch_size);
    low
}

/// Runs one labeling session over a set of predictions
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveLearner {
    config: ActiveConfig,
}

impl ActiveLearner {
    pub fn new(config: ActiveConfig) -> Self {
        Self { config }
    }

    /// Ask `source` about each candidate and collect the accepted labels in
    /// presentation order. Templates are only read, never modified.
    pub fn solicit(
        &self,
        templates: &[Template],
        predictions: &[PredictionRecord],
        source: &mut dyn LabelSource,
    ) -> Result<Vec<ManualLabel>> {
        // Parameters with options are pinned to enum and never offered.
        let open: Vec<PredictionRecord> = predictions
            .iter()
            .filter(|p| !has_options(templates, p))
            .cloned()
            .collect();
        if open.len() < predictions.len() {
            tracing::debug!(
                "Not offering {} parameter(s) with fixed options",
                predictions.len() - open.len()
            );
        }

        let candidates = select_candidates(&open, &self.config);
        if candidates.is_empty() {
            tracing::info!(
                "No low-confidence items (threshold {:.2})",
                self.config.threshold
            );
            return Ok(Vec::new());
        }

        source.begin(candidates.len())?;

        let total = candidates.len();
        let mut labels = Vec::new();
        for (i, item) in candidates.into_iter().enumerate() {
            let template = templates.get(item.template_index);
            let prompt = LabelPrompt {
                position: i + 1,
                total,
                template_id: template.map(|t| t.id.clone()).unwrap_or_default(),
                template_url: template.map(|t| t.template.clone()).unwrap_or_default(),
                param_name: item.name.clone(),
                original_value: item.original_value.clone(),
                predicted: item.predicted,
                confidence: item.confidence,
            };

            let answer = match source.ask(&prompt)? {
                LabelAnswer::Abort => {
                    tracing::warn!(
                        "Active learning aborted; discarding {} label(s)",
                        labels.len()
                    );
                    return Err(PipelineError::Aborted);
                }
                LabelAnswer::Text(text) => text,
            };

            let answer = answer.trim();
            if answer.is_empty() {
                tracing::debug!("Skipped '{}'", item.name);
                continue;
            }

            match answer.parse::<TypeLabel>() {
                Ok(label) => {
                    tracing::debug!("Labeled '{}' as {}", item.name, label);
                    labels.push(ManualLabel {
                        template_index: item.template_index,
                        param_index: item.param_index,
                        label,
                    });
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid label '{}' for '{}'; skipped. Allowed: {}",
                        answer,
                        item.name,
                        TypeLabel::allowed()
                    );
                }
            }
        }

        tracing::info!("Collected {} manual label(s)", labels.len());
        Ok(labels)
    }
}

fn has_options(templates: &[Template], prediction: &PredictionRecord) -> bool {
    templates
        .get(prediction.template_index)
        .and_then(|t| t.params.get(prediction.param_index))
        .is_some_and(|param| param.has_options())
}

/// Copy `templates`, apply the manual labels as explicit types, and train a
/// fresh model on the result. The caller's templates are left untouched.
pub fn retrain(
    templates: &[Template],
    manual_labels: &[ManualLabel],
    config: &TrainConfig,
) -> Result<TrainOutcome> {
    let labeled = apply_manual_labels(templates, manual_labels);
    train(&dataset::build(&labeled), config)
}

/// Deep copy with manual labels written into each addressed parameter's
/// `type`. Out-of-range positions are skipped.
pub fn apply_manual_labels(templates: &[Template], manual_labels: &[ManualLabel]) -> Vec<Template> {
    let mut copy = templates.to_vec();
    for ml in manual_labels {
        match copy
            .get_mut(ml.template_index)
            .and_then(|t| t.params.get_mut(ml.param_index))
        {
            Some(param) => param.explicit_type = Some(ml.label.to_string()),
            None => tracing::debug!(
                "Skipping manual label for missing position ({}, {})",
                ml.template_index,
                ml.param_index
            ),
        }
    }
    copy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Parameter;
    use std::collections::BTreeMap;
    use std::io::Cursor;

    fn record(t: usize, p: usize, name: &str, confidence: f64) -> PredictionRecord {
        PredictionRecord {
            template_index: t,
            param_index: p,
            name: name.into(),
            original_value: String::new(),
            predicted: TypeLabel::String,
            confidence,
            probabilities: BTreeMap::new(),
        }
    }

    fn templates() -> Vec<Template> {
        vec![Template {
            id: "t0".into(),
            template: "https://example.com/form".into(),
            method: "POST".into(),
            params: vec![
                Parameter::new("a", "1"),
                Parameter::new("b", "x"),
                Parameter::new("c", "y"),
            ],
        }]
    }

    /// Records every prompt it is shown
    struct Recorder {
        inner: ScriptedLabelSource,
        seen: Vec<LabelPrompt>,
    }

    impl LabelSource for Recorder {
        fn ask(&mut self, prompt: &LabelPrompt) -> Result<LabelAnswer> {
            self.seen.push(prompt.clone());
            self.inner.ask(prompt)
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        let preds = vec![
            record(0, 0, "low", 0.55),
            record(0, 1, "high", 0.95),
            record(0, 2, "edge", 0.70),
        ];
        let picked = select_candidates(&preds, &ActiveConfig::default());
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "low");
    }

    #[test]
    fn test_batch_cap_keeps_globally_lowest() {
        let preds: Vec<_> = (0..30)
            .map(|i| record(0, i, &format!("p{i}"), 0.65 - (i as f64) * 0.01))
            .collect();
        let config = ActiveConfig {
            threshold: 0.7,
            batch_size: 5,
        };
        let picked = select_candidates(&preds, &config);
        assert_eq!(picked.len(), 5);
        let names: Vec<_> = picked.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["p29", "p28", "p27", "p26", "p25"]);
    }

    #[test]
    fn test_solicit_records_valid_labels_in_order() {
        let preds = vec![
            record(0, 0, "a", 0.6),
            record(0, 1, "b", 0.3),
            record(0, 2, "c", 0.5),
        ];
        let mut source = Recorder {
            inner: ScriptedLabelSource::new(["email", "", "int"]),
            seen: Vec::new(),
        };

        let labels = ActiveLearner::default()
            .solicit(&templates(), &preds, &mut source)
            .unwrap();

        assert_eq!(
            labels,
            vec![
                ManualLabel { template_index: 0, param_index: 1, label: TypeLabel::Email },
                ManualLabel { template_index: 0, param_index: 0, label: TypeLabel::Int },
            ]
        );
        let order: Vec<_> = source.seen.iter().map(|p| p.param_name.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
        assert_eq!(source.seen[0].template_url, "https://example.com/form");
        assert_eq!(source.seen[0].position, 1);
        assert_eq!(source.seen[0].total, 3);
    }

    #[test]
    fn test_invalid_answer_is_skipped() {
        let preds = vec![record(0, 0, "a", 0.1), record(0, 1, "b", 0.2)];
        let mut source = ScriptedLabelSource::new(["number", "bool"]);
        let labels = ActiveLearner::default()
            .solicit(&templates(), &preds, &mut source)
            .unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].param_index, 1);
        assert_eq!(labels[0].label, TypeLabel::Bool);
    }

    #[test]
    fn test_no_candidates_asks_nothing() {
        let preds = vec![record(0, 0, "a", 0.99)];
        let mut source = ScriptedLabelSource::new(["int"]);
        let labels = ActiveLearner::default()
            .solicit(&templates(), &preds, &mut source)
            .unwrap();
        assert!(labels.is_empty());
        assert_eq!(source.remaining(), 1);
    }

    #[test]
    fn test_console_eof_aborts_session() {
        let preds = vec![record(0, 0, "a", 0.1), record(0, 1, "b", 0.2)];
        let mut source = ConsoleLabelSource::new(Cursor::new("int\n"));
        let result = ActiveLearner::default().solicit(&templates(), &preds, &mut source);
        assert!(matches!(result, Err(PipelineError::Aborted)));
    }

    #[test]
    fn test_console_reads_answers() {
        let preds = vec![record(0, 0, "a", 0.1), record(0, 1, "b", 0.2)];
        let mut source = ConsoleLabelSource::new(Cursor::new("  uuid  \n\n"));
        let labels = ActiveLearner::default()
            .solicit(&templates(), &preds, &mut source)
            .unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].label, TypeLabel::Uuid);
    }

    #[test]
    fn test_console_undecodable_answer_is_skipped() {
        let preds = vec![record(0, 0, "a", 0.1), record(0, 1, "b", 0.2)];
        let mut source = ConsoleLabelSource::new(Cursor::new(b"\xff\xfe\nint\n".to_vec()));
        let labels = ActiveLearner::default()
            .solicit(&templates(), &preds, &mut source)
            .unwrap();
        assert_eq!(
            labels,
            vec![ManualLabel { template_index: 0, param_index: 1, label: TypeLabel::Int }]
        );
    }

    #[test]
    fn test_options_params_are_not_offered() {
        let mut tpls = templates();
        tpls[0].params[0] = Parameter::new("a", "").with_options(vec!["asc".into(), "desc".into()]);
        let preds = vec![
            record(0, 0, "a", 0.05),
            record(0, 1, "b", 0.2),
            record(0, 2, "c", 0.3),
        ];
        let config = ActiveConfig {
            threshold: 0.7,
            batch_size: 1,
        };
        let mut source = Recorder {
            inner: ScriptedLabelSource::new(["string"]),
            seen: Vec::new(),
        };

        let labels = ActiveLearner::new(config)
            .solicit(&tpls, &preds, &mut source)
            .unwrap();

        let asked: Vec<_> = source.seen.iter().map(|p| p.param_name.as_str()).collect();
        assert_eq!(asked, vec!["b"]);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].param_index, 1);
    }

    #[test]
    fn test_apply_manual_labels_copies_and_skips_bad_indices() {
        let original = templates();
        let manual = vec![
            ManualLabel { template_index: 0, param_index: 2, label: TypeLabel::Uuid },
            ManualLabel { template_index: 0, param_index: 9, label: TypeLabel::Int },
            ManualLabel { template_index: 4, param_index: 0, label: TypeLabel::Int },
        ];

        let labeled = apply_manual_labels(&original, &manual);

        assert_eq!(labeled[0].params[2].explicit_type.as_deref(), Some("uuid"));
        assert!(labeled[0].params[0].explicit_type.is_none());
        assert!(original[0].params[2].explicit_type.is_none());
        assert_eq!(original, templates());
    }

    #[test]
    fn test_scripted_source_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.txt");
        std::fs::write(&path, "int\n\nemail\n").unwrap();
        let source = ScriptedLabelSource::from_file(&path).unwrap();
        assert_eq!(source.remaining(), 3);

        let missing = ScriptedLabelSource::from_file(&dir.path().join("nope.txt"));
        assert!(matches!(missing, Err(PipelineError::MissingResource { .. })));
    }
}
