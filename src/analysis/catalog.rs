//! Metric and test-condition catalog for a loaded document set.

use super::normalize::METRIC_ORIENTATION;
use crate::models::Document;
use std::collections::BTreeSet;

/// Preferred metric when none is requested.
pub const DEFAULT_METRIC: &str = "Stability Score";

/// All metric names and test keys seen across a document set, sorted.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub metrics: Vec<String>,
    pub test_conditions: Vec<String>,
}

impl Catalog {
    pub fn from_documents(documents: &[Document]) -> Self {
        let mut metrics = BTreeSet::new();
        let mut test_conditions = BTreeSet::new();

        for doc in documents {
            for (key, record) in &doc.tests {
                test_conditions.insert(key.clone());
                metrics.extend(record.metrics.keys().cloned());
            }
        }

        Self {
            metrics: metrics.into_iter().collect(),
            test_conditions: test_conditions.into_iter().collect(),
        }
    }

    pub fn has_metric(&self, metric: &str) -> bool {
        self.metrics.iter().any(|m| m == metric)
    }

    pub fn has_test(&self, test_key: &str) -> bool {
        self.test_conditions.iter().any(|t| t == test_key)
    }

    /// "Stability Score" when present, otherwise the first metric.
    pub fn default_metric(&self) -> Option<&str> {
        if self.has_metric(DEFAULT_METRIC) {
            Some(DEFAULT_METRIC)
        } else {
            self.metrics.first().map(String::as_str)
        }
    }

    /// Key radar metrics present in this set, in orientation-table order.
    pub fn default_radar_metrics(&self) -> Vec<String> {
        METRIC_ORIENTATION
            .iter()
            .map(|(name, _)| *name)
            .filter(|name| self.has_metric(name))
            .map(String::from)
            .collect()
    }
}
