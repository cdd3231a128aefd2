//! Feature extraction for parameter type classification
//!
//! Turns one parameter plus its request context into a flat record of
//! named numeric and categorical signals. Training and prediction go
//! through the same extractor so the schema never drifts between them.

use std::collections::BTreeMap;

use super::patterns;
use crate::models::{Parameter, RequestContext};

/// A single feature value
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    /// Counts, lengths and 0/1 flags
    Num(f64),
    /// Categorical value, one-hot encoded by the vectorizer
    Cat(String),
}

impl FeatureValue {
    fn flag(b: bool) -> Self {
        FeatureValue::Num(if b { 1.0 } else { 0.0 })
    }

    fn count(n: usize) -> Self {
        FeatureValue::Num(n as f64)
    }
}

impl std::fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureValue::Num(n) => write!(f, "{n}"),
            FeatureValue::Cat(s) => write!(f, "{s:?}"),
        }
    }
}

/// Feature name -> value, ordered by name
pub type FeatureRecord = BTreeMap<&'static str, FeatureValue>;

/// Display-only fields kept next to a feature record. Never vectorized.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawFields {
    pub name: String,
    pub value: String,
    pub template: String,
}

/// Names of every feature [`FeatureExtractor::extract`] emits.
pub const FEATURE_NAMES: &[&str] = &[
    "has_options",
    "method_GET",
    "method_POST",
    "name_has_date",
    "name_has_email",
    "name_has_id_token",
    "name_has_num",
    "name_len",
    "name_prefix_2",
    "name_prefix_3",
    "name_starts_is",
    "name_suffix_2",
    "name_suffix_3",
    "options_count",
    "required",
    "val_has_alpha",
    "val_has_at",
    "val_has_special",
    "val_is_bool_token",
    "val_is_digits",
    "val_is_float",
    "val_is_int",
    "val_is_uuid",
    "val_len",
];

/// Extracts feature records from parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the feature record for one parameter.
    pub fn extract(&self, param: &Parameter, ctx: &RequestContext<'_>) -> FeatureRecord {
        let name = param.name.as_str();
        let value = param.original_value.as_str();
        let method = ctx.method.to_ascii_uppercase();
        let options_count = param.options().map_or(0, |o| o.len());

        let mut f = FeatureRecord::new();

        // Name signals
        f.insert("name_len", FeatureValue::count(name.chars().count()));
        f.insert(
            "name_has_id_token",
            FeatureValue::flag(patterns::id_token().is_match(name)),
        );
        f.insert(
            "name_has_num",
            FeatureValue::flag(name.chars().any(|c| c.is_ascii_digit())),
        );
        f.insert(
            "name_has_date",
            FeatureValue::flag(patterns::date_token().is_match(name)),
        );
        f.insert(
            "name_has_email",
            FeatureValue::flag(patterns::email_token().is_match(name)),
        );
        f.insert(
            "name_starts_is",
            FeatureValue::flag(patterns::bool_prefix().is_match(name)),
        );

        // Value signals
        f.insert("val_len", FeatureValue::count(value.chars().count()));
        f.insert(
            "val_is_digits",
            FeatureValue::flag(!value.is_empty() && value.chars().all(|c| c.is_ascii_digit())),
        );
        f.insert(
            "val_has_alpha",
            FeatureValue::flag(value.chars().any(|c| c.is_ascii_alphabetic())),
        );
        f.insert(
            "val_has_special",
            FeatureValue::flag(value.chars().any(|c| !c.is_ascii_alphanumeric())),
        );
        f.insert(
            "val_is_uuid",
            FeatureValue::flag(patterns::uuid().is_match(value)),
        );
        f.insert(
            "val_is_bool_token",
            FeatureValue::flag(patterns::is_bool_token(value)),
        );
        f.insert(
            "val_is_int",
            FeatureValue::flag(patterns::integer().is_match(value)),
        );
        f.insert(
            "val_is_float",
            FeatureValue::flag(patterns::decimal().is_match(value)),
        );
        f.insert("val_has_at", FeatureValue::flag(value.contains('@')));

        // Request context and declared shape
        f.insert("required", FeatureValue::flag(param.required));
        f.insert("method_POST", FeatureValue::flag(method == "POST"));
        f.insert("method_GET", FeatureValue::flag(method == "GET"));
        f.insert("has_options", FeatureValue::flag(options_count > 0));
        f.insert("options_count", FeatureValue::count(options_count));

        // Naming conventions such as `_id` or `is_`
        let lower = name.to_lowercase();
        f.insert("name_prefix_2", FeatureValue::Cat(prefix(&lower, 2)));
        f.insert("name_prefix_3", FeatureValue::Cat(prefix(&lower, 3)));
        f.insert("name_suffix_2", FeatureValue::Cat(suffix(&lower, 2)));
        f.insert("name_suffix_3", FeatureValue::Cat(suffix(&lower, 3)));

        f
    }

    /// Raw name/value/URL for operator display.
    pub fn raw_fields(&self, param: &Parameter, ctx: &RequestContext<'_>) -> RawFields {
        RawFields {
            name: param.name.clone(),
            value: param.original_value.clone(),
            template: ctx.template.to_string(),
        }
    }
}

fn prefix(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn suffix(s: &str, n: usize) -> String {
    let len = s.chars().count();
    s.chars().skip(len.saturating_sub(n)).collect()
}
