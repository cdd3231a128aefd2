//! Dataset construction from normalized templates
//!
//! One row per parameter, in template order, plus a parallel index that maps
//! each row back to its (template, parameter) position.

use std::collections::BTreeMap;

use super::features::{FeatureExtractor, FeatureRecord, RawFields};
use super::heuristic;
use crate::models::{Template, TypeLabel};

/// Where a label came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    /// The parameter's explicit `type` (input ground truth or a manual label)
    Provided,
    /// The bootstrap heuristic
    Heuristic,
}

/// A feature record with its training label
#[derive(Debug, Clone)]
pub struct LabeledRow {
    pub features: FeatureRecord,
    pub label: TypeLabel,
    pub source: LabelSource,
    pub raw: RawFields,
}

/// Position of a row in the template collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPosition {
    pub template_index: usize,
    pub param_index: usize,
}

/// Feature table plus row index
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub rows: Vec<LabeledRow>,
    pub index: Vec<RowPosition>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn labels(&self) -> Vec<TypeLabel> {
        self.rows.iter().map(|r| r.label).collect()
    }

    /// Row count per label, in canonical label order
    pub fn class_counts(&self) -> BTreeMap<TypeLabel, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.label).or_insert(0) += 1;
        }
        counts
    }

    pub fn provided_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.source == LabelSource::Provided)
            .count()
    }
}

/// Build the labeled feature table for every parameter of every template.
pub fn build(templates: &[Template]) -> Dataset {
    let extractor = FeatureExtractor::new();
    let mut dataset = Dataset::default();

    for (t_idx, template) in templates.iter().enumerate() {
        let ctx = template.context();
        for (p_idx, param) in template.params.iter().enumerate() {
            // Enumerated options pin the label to `enum` whatever `type` says
            let (label, source) = match param.ground_truth() {
                Some(label) if !param.has_options() => (label, LabelSource::Provided),
                _ => (heuristic::label_parameter(param), LabelSource::Heuristic),
            };

            dataset.rows.push(LabeledRow {
                features: extractor.extract(param, &ctx),
                label,
                source,
                raw: extractor.raw_fields(param, &ctx),
            });
            dataset.index.push(RowPosition {
                template_index: t_idx,
                param_index: p_idx,
            });
        }
    }

    dataset
}
