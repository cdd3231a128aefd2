//! Configuration module for paramtype
//!
//! This module handles:
//! - User configuration (~/.config/paramtype/config.toml)
//! - Project configuration (./paramtype.toml)
//! - Environment overrides
//! - Range validation of thresholds and training parameters

mod pipeline_config;

pub use pipeline_config::{
    init_config_at, ActiveSection, ModelSection, PipelineConfig, TrainingSection,
    DEFAULT_MODEL_PATH, DEFAULT_OUTPUT_PATH, PROJECT_CONFIG_FILE,
};
