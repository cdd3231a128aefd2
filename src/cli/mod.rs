//! CLI command definitions and handlers

mod label;
mod predict;
mod train;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use std::path::{Path, PathBuf};

use paramtype::config::{PipelineConfig, PROJECT_CONFIG_FILE};
use paramtype::templates::{self, NormalizedInput};

/// Parse a confidence threshold (0.0-1.0)
fn parse_threshold(s: &str) -> Result<f64, String> {
    let t: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if (0.0..=1.0).contains(&t) {
        Ok(t)
    } else {
        Err("threshold must be between 0 and 1".to_string())
    }
}

/// Parse a batch size (at least 1)
fn parse_batch_size(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("batch size must be at least 1".to_string())
    } else {
        Ok(n)
    }
}

/// paramtype - infer HTTP parameter types from crawler output
#[derive(Parser, Debug)]
#[command(name = "paramtype")]
#[command(
    version,
    about = "Infer semantic types of HTTP request parameters and synthesize safe baseline values",
    after_help = "\
Examples:
  paramtype train -i templates.json                 Train and save a model
  paramtype predict -i templates.json               Predict with the saved model
  paramtype predict -i templates.json --train       Train, then predict
  paramtype predict -i templates.json --active      Label uncertain items, retrain, predict
  paramtype label -i templates.json                 Show heuristic labels and features"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a classifier from heuristic and explicit labels
    Train {
        /// Templates JSON from the crawler
        #[arg(long, short = 'i')]
        input: PathBuf,

        /// Where to save the model (default: from config)
        #[arg(long, short = 'm')]
        model: Option<PathBuf>,
    },

    /// Predict parameter types and write enriched templates
    #[command(after_help = "\
Examples:
  paramtype predict -i t.json -o out.json
  paramtype predict -i t.json --active --threshold 0.6 --batch-size 10
  paramtype predict -i t.json --active --labels-file answers.txt")]
    Predict {
        /// Templates JSON from the crawler
        #[arg(long, short = 'i')]
        input: PathBuf,

        /// Output path for enriched templates
        #[arg(long, short = 'o', default_value = paramtype::config::DEFAULT_OUTPUT_PATH)]
        output: PathBuf,

        /// Model path (default: from config)
        #[arg(long, short = 'm')]
        model: Option<PathBuf>,

        /// Train on the input before predicting
        #[arg(long)]
        train: bool,

        /// Ask for labels on low-confidence predictions, then retrain
        #[arg(long)]
        active: bool,

        /// Confidence below which items are offered for labeling
        #[arg(long, value_parser = parse_threshold)]
        threshold: Option<f64>,

        /// Maximum number of items to label per session
        #[arg(long, value_parser = parse_batch_size)]
        batch_size: Option<usize>,

        /// Read labels from a file (one per line, blank = skip) instead of the terminal
        #[arg(long, requires = "active")]
        labels_file: Option<PathBuf>,
    },

    /// Show the heuristic label and features of every parameter
    Label {
        /// Templates JSON from the crawler
        #[arg(long, short = 'i')]
        input: PathBuf,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Initialize user config file with commented defaults
    Init,
    /// Show effective config and paths
    Show,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Train { input, model } => {
            let config = load_config(model, None, None)?;
            train::run(&input, &config)
        }

        Commands::Predict {
            input,
            output,
            model,
            train,
            active,
            threshold,
            batch_size,
            labels_file,
        } => {
            let config = load_config(model, threshold, batch_size)?;
            predict::run(
                &config,
                &predict::PredictOptions {
                    input,
                    output,
                    train,
                    active,
                    labels_file,
                },
            )
        }

        Commands::Label { input } => label::run(&input),

        Commands::Config { action } => run_config_action(action),
    }
}

/// Effective config: files and environment, then CLI flags.
fn load_config(
    model: Option<PathBuf>,
    threshold: Option<f64>,
    batch_size: Option<usize>,
) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::load().context("Failed to load configuration")?;
    if let Some(model) = model {
        config.model.path = model;
    }
    if let Some(threshold) = threshold {
        config.active.threshold = threshold;
    }
    if let Some(batch_size) = batch_size {
        config.active.batch_size = batch_size;
    }
    config.validate()?;
    Ok(config)
}

/// Read and normalize the input templates.
fn load_input(path: &Path) -> Result<NormalizedInput> {
    let input = templates::load_templates(path)
        .with_context(|| format!("Failed to read templates from {}", path.display()))?;
    let params: usize = input.templates.iter().map(|t| t.params.len()).sum();
    println!(
        "{} Loaded {} templates ({} parameters, {} format)",
        style("✓").green(),
        style(input.templates.len()).cyan(),
        style(params).cyan(),
        input.format
    );
    Ok(input)
}

fn run_config_action(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = PipelineConfig::init_user_config()?;
            println!("{} Config initialized at: {}", style("✓").green(), path.display());
            println!("\nProject overrides go in ./{}", PROJECT_CONFIG_FILE);
            println!("\nOr set via environment:");
            println!("  export PARAMTYPE_MODEL=\"models/param_type_model.bin\"");
            println!("  export PARAMTYPE_THRESHOLD=0.6");
            Ok(())
        }
        ConfigAction::Show => show_config(),
    }
}

fn show_config() -> Result<()> {
    let config = PipelineConfig::load()?;
    println!("Config paths:");
    if let Some(user_path) = PipelineConfig::user_config_path() {
        let status = if user_path.exists() { "✓" } else { "(not found)" };
        println!("  User:    {} {}", user_path.display(), status);
    }
    let proj_status = if Path::new(PROJECT_CONFIG_FILE).exists() {
        "✓"
    } else {
        "(not found)"
    };
    println!("  Project: ./{} {}", PROJECT_CONFIG_FILE, proj_status);
    println!();
    print!("{}", config.to_toml()?);
    Ok(())
}
