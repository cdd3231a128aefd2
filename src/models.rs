//! Core data models for paramtype
//!
//! Templates and parameters are created by the normalizer from crawler
//! output, and only mutated afterwards by merging predictions into a copy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

/// Semantic type of a request parameter.
///
/// The set is closed: anything else is rejected as training input.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TypeLabel {
    Int,
    Float,
    Bool,
    Uuid,
    Email,
    Enum,
    String,
}

impl TypeLabel {
    /// All labels in canonical order.
    pub const ALL: [TypeLabel; 7] = [
        TypeLabel::Int,
        TypeLabel::Float,
        TypeLabel::Bool,
        TypeLabel::Uuid,
        TypeLabel::Email,
        TypeLabel::Enum,
        TypeLabel::String,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeLabel::Int => "int",
            TypeLabel::Float => "float",
            TypeLabel::Bool => "bool",
            TypeLabel::Uuid => "uuid",
            TypeLabel::Email => "email",
            TypeLabel::Enum => "enum",
            TypeLabel::String => "string",
        }
    }

    /// Comma-separated list of accepted label names, for prompts and errors.
    pub fn allowed() -> String {
        Self::ALL
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for TypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeLabel {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| PipelineError::InvalidLabel(s.to_string()))
    }
}

/// One request field of a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Parameter {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub original_value: String,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub required: bool,
    /// Externally supplied label, kept verbatim so it round-trips to output
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub explicit_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_type: Option<TypeLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_value: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, original_value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            original_value: original_value.into(),
            ..Default::default()
        }
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = Some(options);
        self
    }

    /// Non-empty options, if any.
    pub fn options(&self) -> Option<&[String]> {
        self.options.as_deref().filter(|o| !o.is_empty())
    }

    pub fn has_options(&self) -> bool {
        self.options().is_some()
    }

    /// The explicit `type` when it names a known label.
    pub fn ground_truth(&self) -> Option<TypeLabel> {
        let raw = self.explicit_type.as_deref()?;
        match raw.parse::<TypeLabel>() {
            Ok(label) => Some(label),
            Err(_) => {
                tracing::debug!(
                    "ignoring unrecognised type '{}' on parameter '{}'",
                    raw,
                    self.name
                );
                None
            }
        }
    }
}

/// A discovered request endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Template {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub params: Vec<Parameter>,
}

impl Template {
    /// Request context handed to the feature extractor.
    pub fn context(&self) -> RequestContext<'_> {
        RequestContext {
            method: &self.method,
            template: &self.template,
        }
    }
}

/// The owning template's method and URL, as seen by one parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestContext<'a> {
    pub method: &'a str,
    pub template: &'a str,
}
