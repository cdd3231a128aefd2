//! Predict command - score parameters, optionally learn from the operator,
//! and write enriched templates

use anyhow::{Context, Result};
use console::style;
use std::path::PathBuf;

use paramtype::classifier::active::retrain;
use paramtype::classifier::{
    predict, ActiveLearner, ConsoleLabelSource, LabelSource, ModelArtifact, PredictionRecord,
    PredictionSummary, ScriptedLabelSource,
};
use paramtype::config::PipelineConfig;
use paramtype::error::PipelineError;
use paramtype::templates::{self, EnrichedOutput, OutputMeta};

#[derive(Debug)]
pub struct PredictOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub train: bool,
    pub active: bool,
    pub labels_file: Option<PathBuf>,
}

/// Run the predict command
pub fn run(config: &PipelineConfig, opts: &PredictOptions) -> Result<()> {
    let input = super::load_input(&opts.input)?;
    let model_path = &config.model.path;

    let artifact = if opts.train {
        super::train::train_and_save(&input.templates, config)?
    } else {
        load_model(config)?
    };

    let mut predictions = predict(&input.templates, &artifact);
    print_summary(&predictions, config.active.threshold);

    if opts.active {
        let learner = ActiveLearner::new(config.active_config());
        let mut source: Box<dyn LabelSource> = match &opts.labels_file {
            Some(path) => Box::new(
                ScriptedLabelSource::from_file(path)
                    .with_context(|| format!("Failed to read labels from {}", path.display()))?,
            ),
            None => Box::new(ConsoleLabelSource::stdin()),
        };

        let labels = learner
            .solicit(&input.templates, &predictions, source.as_mut())
            .context("Active learning did not complete; no model or output written")?;

        if labels.is_empty() {
            println!("  No manual labels collected, keeping current model");
        } else {
            println!(
                "\nRetraining with {} manual label(s)...",
                style(labels.len()).cyan()
            );
            let outcome = retrain(&input.templates, &labels, &config.train_config())
                .context("Retraining failed")?;
            super::train::print_outcome(&outcome);
            outcome
                .artifact
                .save(model_path)
                .with_context(|| format!("Failed to save model to {}", model_path.display()))?;
            println!(
                "{} Updated model saved to: {}",
                style("✓").green(),
                style(model_path.display()).cyan()
            );

            predictions = predict(&input.templates, &outcome.artifact);
            print_summary(&predictions, config.active.threshold);
        }
    }

    let output = EnrichedOutput {
        meta: OutputMeta::new(model_path, input.format),
        templates: templates::merge(&input.templates, &predictions),
    };
    templates::write_output(&opts.output, &output)
        .with_context(|| format!("Failed to write {}", opts.output.display()))?;
    println!(
        "{} Saved enriched templates to: {}",
        style("✓").green(),
        style(opts.output.display()).cyan()
    );
    Ok(())
}

fn load_model(config: &PipelineConfig) -> Result<ModelArtifact> {
    let path = &config.model.path;
    match ModelArtifact::load(path) {
        Ok(artifact) => {
            tracing::debug!(
                "Loaded model trained at {} ({} rows)",
                artifact.meta.trained_at,
                artifact.meta.training_rows
            );
            Ok(artifact)
        }
        Err(e @ PipelineError::MissingResource { .. }) => {
            anyhow::bail!("{e}. Run 'paramtype train' first or pass --train.")
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load model from {}", path.display())),
    }
}

fn print_summary(predictions: &[PredictionRecord], threshold: f64) {
    let summary = PredictionSummary::from_predictions(predictions, threshold);
    if summary.total == 0 {
        println!("  {} No parameters to predict", style("[--]").dim());
        return;
    }

    let labels: Vec<String> = summary
        .by_label
        .iter()
        .map(|(label, count)| format!("{label}={count}"))
        .collect();
    println!(
        "\nPredicted {} parameters: {}",
        style(summary.total).cyan(),
        labels.join(", ")
    );
    println!(
        "  Mean confidence {:.2}, {} below {:.2}",
        summary.mean_confidence,
        style(summary.low_confidence).yellow(),
        threshold
    );
}
