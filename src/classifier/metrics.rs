//! Holdout evaluation: accuracy plus per-class precision/recall/F1

use std::collections::BTreeMap;
use std::fmt;

use crate::models::TypeLabel;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of holdout rows with this true label
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub per_class: BTreeMap<TypeLabel, ClassMetrics>,
    pub total: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ClassificationReport {
    /// Compare true and predicted labels pairwise. Classes with no support
    /// and no predictions are left out; undefined ratios report as 0.
    pub fn from_predictions(truth: &[TypeLabel], predicted: &[TypeLabel]) -> Self {
        let total = truth.len().min(predicted.len());
        let pairs = || truth.iter().zip(predicted.iter());

        let correct = pairs().filter(|(t, p)| t == p).count();

        let mut per_class = BTreeMap::new();
        for label in TypeLabel::ALL {
            let tp = pairs().filter(|(t, p)| **t == label && **p == label).count();
            let support = pairs().filter(|(t, _)| **t == label).count();
            let predicted_count = pairs().filter(|(_, p)| **p == label).count();
            if support == 0 && predicted_count == 0 {
                continue;
            }

            let precision = ratio(tp, predicted_count);
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            per_class.insert(
                label,
                ClassMetrics {
                    precision,
                    recall,
                    f1,
                    support,
                },
            );
        }

        Self {
            accuracy: ratio(correct, total),
            per_class,
            total,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  {:<8} {:>9} {:>9} {:>9} {:>9}",
            "label", "precision", "recall", "f1", "support"
        )?;
        for (label, m) in &self.per_class {
            writeln!(
                f,
                "  {:<8} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                label.as_str(),
                m.precision,
                m.recall,
                m.f1,
                m.support
            )?;
        }
        write!(
            f,
            "\n  accuracy: {:.2}% ({} holdout rows)",
            self.accuracy * 100.0,
            self.total
        )
    }
}
