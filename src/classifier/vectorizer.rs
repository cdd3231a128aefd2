//! Dict-style feature vectorizer
//!
//! Maps feature records onto a fixed numeric column layout learned at fit
//! time. Numeric features get one column each; categorical features are
//! one-hot encoded as `name=value` columns. Columns are sorted by name so
//! the layout is reproducible for the same training data.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::features::{FeatureRecord, FeatureValue};

/// Dense feature vector produced by [`DictVectorizer::transform`]
pub type FeatureVector = Vec<f64>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DictVectorizer {
    vocabulary: BTreeMap<String, usize>,
}

fn column_name(name: &str, value: &FeatureValue) -> String {
    match value {
        FeatureValue::Num(_) => name.to_string(),
        FeatureValue::Cat(v) => format!("{name}={v}"),
    }
}

impl DictVectorizer {
    /// Learn the column layout from a set of records.
    pub fn fit(records: &[&FeatureRecord]) -> Self {
        let columns: BTreeSet<String> = records
            .iter()
            .flat_map(|r| r.iter().map(|(name, value)| column_name(name, value)))
            .collect();

        let vocabulary = columns
            .into_iter()
            .enumerate()
            .map(|(i, c)| (c, i))
            .collect();

        Self { vocabulary }
    }

    /// Fit and transform in one pass.
    pub fn fit_transform(records: &[&FeatureRecord]) -> (Self, Vec<FeatureVector>) {
        let vectorizer = Self::fit(records);
        let vectors = records.iter().map(|r| vectorizer.transform(r)).collect();
        (vectorizer, vectors)
    }

    /// Encode one record. Columns unseen at fit time are dropped.
    pub fn transform(&self, record: &FeatureRecord) -> FeatureVector {
        let mut out = vec![0.0; self.vocabulary.len()];
        for (name, value) in record {
            if let Some(&col) = self.vocabulary.get(&column_name(name, value)) {
                out[col] = match value {
                    FeatureValue::Num(n) => *n,
                    FeatureValue::Cat(_) => 1.0,
                };
            }
        }
        out
    }

    /// Number of output columns
    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&'static str, FeatureValue)]) -> FeatureRecord {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn test_one_hot_layout() {
        let a = record(&[
            ("len", FeatureValue::Num(3.0)),
            ("suffix", FeatureValue::Cat("_id".into())),
        ]);
        let b = record(&[
            ("len", FeatureValue::Num(5.0)),
            ("suffix", FeatureValue::Cat("ail".into())),
        ]);

        let (dv, vectors) = DictVectorizer::fit_transform(&[&a, &b]);
        let columns: Vec<_> = dv.vocabulary.iter().map(|(c, &i)| (c.as_str(), i)).collect();
        assert_eq!(columns, vec![("len", 0), ("suffix=_id", 1), ("suffix=ail", 2)]);
        assert_eq!(vectors[0], vec![3.0, 1.0, 0.0]);
        assert_eq!(vectors[1], vec![5.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unknown_category_maps_to_zeros() {
        let a = record(&[("suffix", FeatureValue::Cat("_id".into()))]);
        let dv = DictVectorizer::fit(&[&a]);

        let unseen = record(&[
            ("suffix", FeatureValue::Cat("xyz".into())),
            ("extra", FeatureValue::Num(9.0)),
        ]);
        assert_eq!(dv.transform(&unseen), vec![0.0]);
    }

    #[test]
    fn test_empty_fit() {
        let dv = DictVectorizer::fit(&[]);
        assert!(dv.is_empty());
        assert!(dv.transform(&FeatureRecord::new()).is_empty());
    }
}
