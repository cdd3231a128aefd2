//! Layered pipeline configuration
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults
//! 2. User config (`~/.config/paramtype/config.toml`)
//! 3. Project config (`./paramtype.toml`)
//! 4. Environment (`PARAMTYPE_MODEL`, `PARAMTYPE_THRESHOLD`, `PARAMTYPE_BATCH_SIZE`)
//!
//! CLI flags are applied on top by the caller.
//!
//! ```toml
//! [model]
//! path = "param_type_model.bin"
//!
//! [training]
//! num_trees = 50
//! max_depth = 4
//! learning_rate = 0.1
//! min_leaf_size = 1
//! holdout_fraction = 0.2
//! seed = 42
//!
//! [active]
//! threshold = 0.7
//! batch_size = 20
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::active::{ActiveConfig, DEFAULT_BATCH_SIZE, DEFAULT_THRESHOLD};
use crate::classifier::gbdt_model::GbdtParams;
use crate::classifier::train::TrainConfig;
use crate::error::{PipelineError, Result};

pub const DEFAULT_MODEL_PATH: &str = "param_type_model.bin";
pub const DEFAULT_OUTPUT_PATH: &str = "param_templates_with_predicted_types.json";
pub const PROJECT_CONFIG_FILE: &str = "paramtype.toml";

/// Effective configuration after all layers are applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub model: ModelSection,
    pub training: TrainingSection,
    pub active: ActiveSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSection {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSection {
    pub num_trees: usize,
    pub max_depth: u32,
    pub learning_rate: f64,
    pub min_leaf_size: usize,
    pub holdout_fraction: f64,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSection {
    pub threshold: f64,
    pub batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let train = TrainConfig::default();
        Self {
            model: ModelSection {
                path: PathBuf::from(DEFAULT_MODEL_PATH),
            },
            training: TrainingSection {
                num_trees: train.gbdt.num_trees,
                max_depth: train.gbdt.max_depth,
                learning_rate: train.gbdt.learning_rate,
                min_leaf_size: train.gbdt.min_leaf_size,
                holdout_fraction: train.holdout_fraction,
                seed: train.seed,
            },
            active: ActiveSection {
                threshold: DEFAULT_THRESHOLD,
                batch_size: DEFAULT_BATCH_SIZE,
            },
        }
    }
}

/// One config file, where every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    model: ModelFile,
    #[serde(default)]
    training: TrainingFile,
    #[serde(default)]
    active: ActiveFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelFile {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TrainingFile {
    num_trees: Option<usize>,
    max_depth: Option<u32>,
    learning_rate: Option<f64>,
    min_leaf_size: Option<usize>,
    holdout_fraction: Option<f64>,
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ActiveFile {
    threshold: Option<f64>,
    batch_size: Option<usize>,
}

impl PipelineConfig {
    /// Load from the user config, `./paramtype.toml` and the environment.
    pub fn load() -> Result<Self> {
        let project = PathBuf::from(PROJECT_CONFIG_FILE);
        Self::load_from(
            Self::user_config_path().as_deref(),
            Some(&project),
            |key| std::env::var(key).ok(),
        )
    }

    /// Load from explicit file locations and an environment lookup.
    ///
    /// Missing files are skipped; unreadable or invalid ones are errors.
    pub fn load_from(
        user: Option<&Path>,
        project: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = Self::default();

        for path in [user, project].into_iter().flatten() {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                config.apply_toml(&content).map_err(|e| match e {
                    PipelineError::Config(msg) => {
                        PipelineError::Config(format!("{}: {}", path.display(), msg))
                    }
                    other => other,
                })?;
                debug!("Loaded config from {}", path.display());
            }
        }

        config.apply_env(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Layer the keys present in `content` over this config.
    pub fn apply_toml(&mut self, content: &str) -> Result<()> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| PipelineError::Config(e.to_string()))?;

        if let Some(path) = file.model.path {
            self.model.path = path;
        }

        let t = &mut self.training;
        let f = file.training;
        if let Some(v) = f.num_trees {
            t.num_trees = v;
        }
        if let Some(v) = f.max_depth {
            t.max_depth = v;
        }
        if let Some(v) = f.learning_rate {
            t.learning_rate = v;
        }
        if let Some(v) = f.min_leaf_size {
            t.min_leaf_size = v;
        }
        if let Some(v) = f.holdout_fraction {
            t.holdout_fraction = v;
        }
        if let Some(v) = f.seed {
            t.seed = v;
        }

        if let Some(v) = file.active.threshold {
            self.active.threshold = v;
        }
        if let Some(v) = file.active.batch_size {
            self.active.batch_size = v;
        }
        Ok(())
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(path) = env("PARAMTYPE_MODEL").filter(|s| !s.is_empty()) {
            self.model.path = PathBuf::from(path);
        }
        if let Some(raw) = env("PARAMTYPE_THRESHOLD") {
            self.active.threshold = raw.trim().parse().map_err(|_| {
                PipelineError::Config(format!("PARAMTYPE_THRESHOLD is not a number: '{raw}'"))
            })?;
        }
        if let Some(raw) = env("PARAMTYPE_BATCH_SIZE") {
            self.active.batch_size = raw.trim().parse().map_err(|_| {
                PipelineError::Config(format!(
                    "PARAMTYPE_BATCH_SIZE is not a positive integer: '{raw}'"
                ))
            })?;
        }
        Ok(())
    }

    /// Check value ranges. Called after every layer, including CLI overrides.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.active.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(PipelineError::Config(format!(
                "active.threshold must be within [0, 1], got {threshold}"
            )));
        }
        if self.active.batch_size == 0 {
            return Err(PipelineError::Config(
                "active.batch_size must be at least 1".into(),
            ));
        }
        let fraction = self.training.holdout_fraction;
        if !(0.0..1.0).contains(&fraction) {
            return Err(PipelineError::Config(format!(
                "training.holdout_fraction must be within [0, 1), got {fraction}"
            )));
        }
        if self.training.num_trees == 0 {
            return Err(PipelineError::Config(
                "training.num_trees must be at least 1".into(),
            ));
        }
        if self.training.learning_rate.is_nan() || self.training.learning_rate <= 0.0 {
            return Err(PipelineError::Config(
                "training.learning_rate must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn train_config(&self) -> TrainConfig {
        let t = &self.training;
        TrainConfig {
            gbdt: GbdtParams {
                num_trees: t.num_trees,
                max_depth: t.max_depth,
                learning_rate: t.learning_rate,
                min_leaf_size: t.min_leaf_size,
            },
            holdout_fraction: t.holdout_fraction,
            seed: t.seed,
        }
    }

    pub fn active_config(&self) -> ActiveConfig {
        ActiveConfig {
            threshold: self.active.threshold,
            batch_size: self.active.batch_size,
        }
    }

    /// Render as TOML, for `config show`.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("paramtype").join("config.toml"))
    }

    /// Create the user config with a commented template, if it doesn't exist yet.
    pub fn init_user_config() -> Result<PathBuf> {
        let path = Self::user_config_path().ok_or_else(|| {
            PipelineError::Config("could not determine config directory".into())
        })?;
        init_config_at(&path)?;
        Ok(path)
    }
}

/// Write the config template to `path` unless a file is already there.
/// Returns whether a file was written.
pub fn init_config_at(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, CONFIG_TEMPLATE)?;
    Ok(true)
}

const CONFIG_TEMPLATE: &str = r#"# paramtype configuration
# Project settings in ./paramtype.toml override this file.

[model]
# Where the trained classifier is saved and loaded
# path = "param_type_model.bin"

[training]
# num_trees = 50
# max_depth = 4
# learning_rate = 0.1
# min_leaf_size = 1
# Fraction of each class held out for evaluation
# holdout_fraction = 0.2
# seed = 42

[active]
# Predictions below this confidence are offered for manual labeling
# threshold = 0.7
# Maximum questions per session
# batch_size = 20
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.model.path, PathBuf::from("param_type_model.bin"));
        assert_eq!(config.active.threshold, 0.70);
        assert_eq!(config.active.batch_size, 20);
        assert_eq!(config.train_config(), TrainConfig::default());
        assert_eq!(config.active_config(), ActiveConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_overrides_only_given_keys() {
        let mut config = PipelineConfig::default();
        config
            .apply_toml("[training]\nnum_trees = 10\n\n[active]\nbatch_size = 5\n")
            .unwrap();
        assert_eq!(config.training.num_trees, 10);
        assert_eq!(config.training.max_depth, 4);
        assert_eq!(config.active.batch_size, 5);
        assert_eq!(config.active.threshold, 0.70);
    }

    #[test]
    fn test_layer_priority() {
        let dir = tempfile::tempdir().unwrap();
        let user = dir.path().join("user.toml");
        let project = dir.path().join("project.toml");
        std::fs::write(&user, "[model]\npath = \"user.bin\"\n[active]\nthreshold = 0.5\n").unwrap();
        std::fs::write(&project, "[model]\npath = \"project.bin\"\n").unwrap();

        let config = PipelineConfig::load_from(Some(&user), Some(&project), no_env).unwrap();
        assert_eq!(config.model.path, PathBuf::from("project.bin"));
        assert_eq!(config.active.threshold, 0.5);

        let config = PipelineConfig::load_from(Some(&user), Some(&project), |key| match key {
            "PARAMTYPE_MODEL" => Some("env.bin".into()),
            "PARAMTYPE_THRESHOLD" => Some("0.9".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.model.path, PathBuf::from("env.bin"));
        assert_eq!(config.active.threshold, 0.9);
    }

    #[test]
    fn test_missing_files_use_defaults() {
        let config = PipelineConfig::load_from(
            Some(Path::new("/nonexistent/user.toml")),
            Some(Path::new("/nonexistent/paramtype.toml")),
            no_env,
        )
        .unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_env = PipelineConfig::load_from(None, None, |key| {
            (key == "PARAMTYPE_BATCH_SIZE").then(|| "lots".to_string())
        });
        assert!(matches!(bad_env, Err(PipelineError::Config(_))));

        let mut config = PipelineConfig::default();
        config.active.threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.active.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.training.holdout_fraction = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let mut config = PipelineConfig::default();
        assert!(matches!(
            config.apply_toml("this is [[ not valid toml"),
            Err(PipelineError::Config(_))
        ));
        assert!(matches!(
            config.apply_toml("[active]\nthreshhold = 0.4\n"),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let mut config = PipelineConfig::default();
        config.apply_toml(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_init_config_at() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paramtype").join("config.toml");
        assert!(init_config_at(&path).unwrap());
        assert!(!init_config_at(&path).unwrap());
        assert!(std::fs::read_to_string(&path).unwrap().contains("[active]"));
    }

    #[test]
    fn test_show_round_trips() {
        let config = PipelineConfig::default();
        let rendered = config.to_toml().unwrap();
        let mut back = PipelineConfig::default();
        back.active.batch_size = 1;
        back.apply_toml(&rendered).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_user_config_path() {
        if let Some(p) = PipelineConfig::user_config_path() {
            assert!(p.ends_with("paramtype/config.toml"));
        }
    }
}
