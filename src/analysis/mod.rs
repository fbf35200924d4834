//! Cross-file analysis.
//!
//! Metric comparison (grouped bars), test-condition profiles (radar),
//! shared descriptive statistics, and the metric catalog.

pub mod aggregator;
pub mod catalog;
pub mod normalize;
pub mod prompts;
pub mod stats;

pub use aggregator::{compare_metric, compare_test};
pub use catalog::Catalog;
