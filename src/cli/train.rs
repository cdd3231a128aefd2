//! Train command - fit a classifier and save it

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use paramtype::classifier::{dataset, train, ModelArtifact, TrainOutcome};
use paramtype::config::PipelineConfig;
use paramtype::models::Template;

/// Run the train command
pub fn run(input: &Path, config: &PipelineConfig) -> Result<()> {
    let input = super::load_input(input)?;
    train_and_save(&input.templates, config)?;
    Ok(())
}

/// Build the dataset, fit, save to the configured model path, and print
/// the evaluation. Nothing is written if training fails.
pub(super) fn train_and_save(templates: &[Template], config: &PipelineConfig) -> Result<ModelArtifact> {
    let dataset = dataset::build(templates);
    println!(
        "\nTraining classifier on {} parameters ({} with explicit labels)...",
        style(dataset.len()).cyan(),
        dataset.provided_count()
    );

    let outcome = train(&dataset, &config.train_config()).context("Training failed")?;
    print_outcome(&outcome);

    outcome
        .artifact
        .save(&config.model.path)
        .with_context(|| format!("Failed to save model to {}", config.model.path.display()))?;
    println!(
        "{} Model saved to: {}",
        style("✓").green(),
        style(config.model.path.display()).cyan()
    );
    Ok(outcome.artifact)
}

pub(super) fn print_outcome(outcome: &TrainOutcome) {
    let classes: Vec<String> = outcome
        .class_counts
        .iter()
        .map(|(label, count)| format!("{label}={count}"))
        .collect();
    println!("  Classes: {}", classes.join(", "));
    println!(
        "  Training rows: {}, holdout rows: {}",
        outcome.train_rows, outcome.holdout_rows
    );

    match &outcome.report {
        Some(report) => println!("\n{}\n", report),
        None => println!(
            "  {} Holdout too small to evaluate",
            style("[--]").dim()
        ),
    }
}
