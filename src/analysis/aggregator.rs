//! Cross-file metric aggregation.
//!
//! Both entry points are pure functions of the document list. Missing
//! values stay missing all the way through: they become `Cell::Missing`
//! in tables and omitted points in charts, never zeros.

use super::normalize::{normalize_scores, orientation, raw_radial_range};
use super::prompts::{metric_prompt, test_prompt};
use super::stats::append_descriptive_columns;
use crate::models::{
    BarChart, BarPoint, BarSeries, Cell, ChartSpec, Comparison, ComparisonResult,
    ComparisonTable, Document, MetricValue, RadarChart, RadarTrace, RadarVertex, TableRow,
};
use std::collections::BTreeSet;
use tracing::debug;

/// Row header for metric-mode tables, followed by the metric name.
pub const TEST_CONDITION_LABEL: &str = "Test Condition";
/// Row header for radar-mode tables.
pub const METRIC_LABEL: &str = "Metric";

/// One present value in the long-form table.
#[derive(Debug, Clone, PartialEq)]
struct Observation<'a> {
    test_key: &'a str,
    file_index: usize,
    value: &'a MetricValue,
}

/// Compare one metric across every test condition and document.
pub fn compare_metric(metric: &str, documents: &[Document]) -> ComparisonResult {
    let file_names = file_names(documents);

    let test_keys: BTreeSet<&str> = documents
        .iter()
        .flat_map(|doc| {
            doc.tests
                .iter()
                .filter(|(_, record)| record.metrics.contains_key(metric))
                .map(|(key, _)| key.as_str())
        })
        .collect();

    // Long form: only combinations that actually carry a value.
    let observations: Vec<Observation> = test_keys
        .iter()
        .flat_map(|&test_key| {
            documents.iter().enumerate().filter_map(move |(file_index, doc)| {
                doc.metric(test_key, metric).map(|value| Observation {
                    test_key,
                    file_index,
                    value,
                })
            })
        })
        .collect();

    debug!(
        "Metric '{}': {} test conditions, {} observations",
        metric,
        test_keys.len(),
        observations.len()
    );

    // Pivot: rows = test keys, one column per document.
    let mut table = ComparisonTable::new(
        format!("{} ({})", TEST_CONDITION_LABEL, metric),
        file_names.clone(),
    );
    for test_key in &test_keys {
        let mut cells = vec![Cell::Missing; documents.len()];
        for obs in observations.iter().filter(|o| o.test_key == *test_key) {
            cells[obs.file_index] = Cell::from(Some(obs.value));
        }
        table.rows.push(TableRow {
            label: test_key.to_string(),
            cells,
        });
    }
    append_descriptive_columns(&mut table, documents.len());

    let series = file_names
        .iter()
        .enumerate()
        .map(|(file_index, name)| BarSeries {
            name: name.clone(),
            points: observations
                .iter()
                .filter(|o| o.file_index == file_index)
                .filter_map(|o| {
                    o.value.as_number().map(|value| BarPoint {
                        category: o.test_key.to_string(),
                        value,
                    })
                })
                .collect(),
        })
        .collect();

    let chart = BarChart {
        title: format!("{} Comparison (n={} files)", metric, documents.len()),
        value_label: format!("{} Value", metric),
        categories: test_keys.iter().map(|k| k.to_string()).collect(),
        series,
    };

    ComparisonResult::Metric(Comparison {
        subject: metric.to_string(),
        table,
        chart: ChartSpec::Bar(chart),
        prompt: metric_prompt(metric, documents.len()),
    })
}

/// Compare several metrics for a single test condition (radar view).
///
/// An empty `metrics` list yields [`ComparisonResult::Empty`].
pub fn compare_test(
    test_key: &str,
    metrics: &[String],
    documents: &[Document],
    normalize: bool,
) -> ComparisonResult {
    if metrics.is_empty() {
        return ComparisonResult::Empty;
    }

    let file_names = file_names(documents);

    // raw[metric][document]
    let raw: Vec<Vec<Option<f64>>> = metrics
        .iter()
        .map(|metric| {
            documents
                .iter()
                .map(|doc| doc.number(test_key, metric))
                .collect()
        })
        .collect();

    let display: Vec<Vec<Option<f64>>> = if normalize {
        metrics
            .iter()
            .zip(&raw)
            .map(|(metric, values)| normalize_scores(values, orientation(metric)))
            .collect()
    } else {
        raw.clone()
    };

    let radial_range = if normalize {
        (0.0, 100.0)
    } else {
        raw_radial_range(raw.iter().flatten().flatten().copied())
    };

    let traces = file_names
        .iter()
        .enumerate()
        .map(|(file_index, name)| RadarTrace {
            name: name.clone(),
            vertices: metrics
                .iter()
                .enumerate()
                .map(|(metric_index, metric)| RadarVertex {
                    metric: metric.clone(),
                    display: display[metric_index][file_index],
                    raw: raw[metric_index][file_index],
                })
                .collect(),
        })
        .collect();

    let title = if normalize {
        format!("Comprehensive Profile for {} (Normalized)", test_key)
    } else {
        format!("Comprehensive Profile for {}", test_key)
    };

    let chart = RadarChart {
        title,
        axes: metrics.to_vec(),
        traces,
        radial_range,
        normalized: normalize,
    };

    let mut table = ComparisonTable::new(METRIC_LABEL, file_names);
    for metric in metrics {
        table.rows.push(TableRow {
            label: metric.clone(),
            cells: documents
                .iter()
                .map(|doc| Cell::from(doc.metric(test_key, metric)))
                .collect(),
        });
    }
    append_descriptive_columns(&mut table, documents.len());

    ComparisonResult::Radar(Comparison {
        subject: test_key.to_string(),
        table,
        chart: ChartSpec::Radar(chart),
        prompt: test_prompt(test_key, metrics, documents.len()),
    })
}

fn file_names(documents: &[Document]) -> Vec<String> {
    documents.iter().map(|d| d.file_name.clone()).collect()
}
