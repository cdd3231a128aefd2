//! Label command - show bootstrap labels and features without training

use anyhow::Result;
use console::style;
use std::path::Path;

use paramtype::classifier::dataset::{self, LabelSource};

/// Run the label command
pub fn run(input: &Path) -> Result<()> {
    let input = super::load_input(input)?;
    let dataset = dataset::build(&input.templates);

    if dataset.is_empty() {
        println!("\n  {} No parameters found", style("[--]").dim());
        return Ok(());
    }

    println!();
    for (row, pos) in dataset.rows.iter().zip(&dataset.index) {
        let source = match row.source {
            LabelSource::Provided => style("provided").green(),
            LabelSource::Heuristic => style("heuristic").dim(),
        };
        println!(
            "[{}.{}] {} = '{}' -> {} ({})",
            pos.template_index,
            pos.param_index,
            style(&row.raw.name).bold(),
            row.raw.value,
            style(row.label).yellow(),
            source
        );
        if !row.raw.template.is_empty() {
            println!("      {}", style(&row.raw.template).dim());
        }
        let features: Vec<String> = row
            .features
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        println!("      {}", features.join(" "));
    }

    let summary: Vec<String> = dataset
        .class_counts()
        .iter()
        .map(|(label, count)| format!("{label}={count}"))
        .collect();
    println!(
        "\n{} parameters ({} with explicit labels): {}",
        dataset.len(),
        dataset.provided_count(),
        summary.join(", ")
    );
    Ok(())
}
