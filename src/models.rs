//! Data models for posturography comparisons.
//!
//! This module contains the parsed export structures ([`Document`],
//! [`TestRecord`], [`MetricValue`]) and the derived comparison shapes
//! handed to the report generator and the interpretation client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder in the user prompt that is replaced by the rendered table.
pub const SUMMARY_PLACEHOLDER: &str = "---SUMMARY_TEXT---";

/// A single extracted metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Numeric measurement.
    Number(f64),
    /// Categorical label (only produced for "Stability Class").
    Category(String),
}

impl MetricValue {
    /// Returns the numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetricValue::Number(v) => Some(*v),
            MetricValue::Category(_) => None,
        }
    }
}

/// One named test condition within an export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    /// Original descriptive label, trailing colon stripped.
    pub full_name: String,
    /// Metric name to value. Never empty in a parsed document.
    pub metrics: BTreeMap<String, MetricValue>,
}

/// One parsed export file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// User-visible identifier, unique within a comparison.
    pub file_name: String,
    /// Test date, or the processing time when the export has none.
    pub date: DateTime<Utc>,
    /// Whether `date` came from a `* Test Date:` line.
    pub date_from_export: bool,
    /// Test key to record.
    pub tests: BTreeMap<String, TestRecord>,
}

impl Document {
    /// Look up a metric for a test condition.
    pub fn metric(&self, test_key: &str, metric: &str) -> Option<&MetricValue> {
        self.tests.get(test_key)?.metrics.get(metric)
    }

    /// Look up a numeric metric for a test condition.
    ///
    /// Categorical values and absent entries both yield `None`.
    pub fn number(&self, test_key: &str, metric: &str) -> Option<f64> {
        self.metric(test_key, metric)?.as_number()
    }

    /// Total number of metrics across all tests.
    pub fn metric_count(&self) -> usize {
        self.tests.values().map(|t| t.metrics.len()).sum()
    }
}

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<Option<&MetricValue>> for Cell {
    fn from(value: Option<&MetricValue>) -> Self {
        match value {
            Some(MetricValue::Number(v)) => Cell::Number(*v),
            Some(MetricValue::Category(s)) => Cell::Text(s.clone()),
            None => Cell::Missing,
        }
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map(Cell::Number).unwrap_or(Cell::Missing)
    }
}

/// One table row; `cells` align with [`ComparisonTable::columns`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub label: String,
    pub cells: Vec<Cell>,
}

/// Generic 2-D table for display and prompt rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    /// Header of the row-label column (e.g. "Test Condition").
    pub index_label: String,
    /// Data column headers, in display order.
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl ComparisonTable {
    /// Creates an empty table with the given headers.
    pub fn new(index_label: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            index_label: index_label.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by header.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell lookup by row label and column header.
    pub fn cell(&self, row: &str, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows
            .iter()
            .find(|r| r.label == row)
            .and_then(|r| r.cells.get(idx))
    }
}

/// One bar in a grouped-bar chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarPoint {
    pub category: String,
    pub value: f64,
}

/// One series (file) in a grouped-bar chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub name: String,
    pub points: Vec<BarPoint>,
}

/// Grouped-bar chart description: categories x series x scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChart {
    pub title: String,
    pub value_label: String,
    pub categories: Vec<String>,
    pub series: Vec<BarSeries>,
}

/// One radar vertex. `display` is what gets plotted, `raw` is shown on hover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarVertex {
    pub metric: String,
    pub display: Option<f64>,
    pub raw: Option<f64>,
}

/// One polygon (document) in a radar chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarTrace {
    pub name: String,
    pub vertices: Vec<RadarVertex>,
}

/// Radial-polygon chart description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarChart {
    pub title: String,
    /// Metric axis labels, in requested order.
    pub axes: Vec<String>,
    pub traces: Vec<RadarTrace>,
    /// Radial axis bounds `(lower, upper)`.
    pub radial_range: (f64, f64),
    pub normalized: bool,
}

/// Chart description handed to a rendering sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartSpec {
    Bar(BarChart),
    Radar(RadarChart),
}

/// Prompt pair for the interpretation service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterpretationPrompt {
    pub system: String,
    /// User message containing [`SUMMARY_PLACEHOLDER`].
    pub user_template: String,
}

impl InterpretationPrompt {
    pub fn is_empty(&self) -> bool {
        self.system.is_empty() && self.user_template.is_empty()
    }

    /// Substitute the rendered table into the user message.
    pub fn render_user(&self, table_text: &str) -> String {
        self.user_template.replace(SUMMARY_PLACEHOLDER, table_text)
    }
}

/// Output of a single analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Metric name (metric mode) or test key (radar mode).
    pub subject: String,
    pub table: ComparisonTable,
    pub chart: ChartSpec,
    pub prompt: InterpretationPrompt,
}

/// Result of an analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "comparison", rename_all = "lowercase")]
pub enum ComparisonResult {
    Metric(Comparison),
    Radar(Comparison),
    Empty,
}

impl ComparisonResult {
    pub fn comparison(&self) -> Option<&Comparison> {
        match self {
            ComparisonResult::Metric(c) | ComparisonResult::Radar(c) => Some(c),
            ComparisonResult::Empty => None,
        }
    }

    pub fn mode_name(&self) -> &'static str {
        match self {
            ComparisonResult::Metric(_) => "Metric Comparison",
            ComparisonResult::Radar(_) => "Comprehensive Profile",
            ComparisonResult::Empty => "None",
        }
    }
}

/// A file that could not be turned into a [`Document`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadFailure {
    pub file_name: String,
    pub reason: String,
}

/// Metadata about a comparison report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    /// Files in comparison order, with their test dates.
    pub files: Vec<(String, DateTime<Utc>)>,
    pub mode: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

/// The complete comparison report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub result: ComparisonResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
    pub failures: Vec<LoadFailure>,
}
