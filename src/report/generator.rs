//! Report generation.
//!
//! Renders comparison tables as plain text (for the interpretation
//! prompt), and whole reports as Markdown or JSON.

use crate::models::{
    BarChart, Cell, ChartSpec, ComparisonTable, LoadFailure, RadarChart, Report,
    ReportMetadata,
};
use anyhow::Result;

const NORMALIZED_DISCLAIMER: &str = "**Disclaimer:** Values are normalized to a 0-100 scale for \
visual comparison. '100' represents the 'best' score (e.g., high Stability Score, low Sway Path). \
Hover values show the original measurements.";

const RAW_NOTE: &str = "**Note:** Values are shown in their original units. Each metric uses a \
different scale, so focus on relative trends rather than absolute magnitudes.";

/// Options for Markdown rendering.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownOptions {
    pub include_prompts: bool,
    pub include_chart: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            include_prompts: true,
            include_chart: true,
        }
    }
}

impl From<&crate::config::ReportConfig> for MarkdownOptions {
    fn from(config: &crate::config::ReportConfig) -> Self {
        Self {
            include_prompts: config.include_prompts,
            include_chart: config.include_chart,
        }
    }
}

/// Format a cell for display. Missing cells render as `-`.
pub fn format_cell(cell: &Cell) -> String {
    match cell {
        Cell::Number(v) => format!("{}", v),
        Cell::Text(s) => s.clone(),
        Cell::Missing => "-".to_string(),
    }
}

/// Render a table as aligned plain text.
pub fn render_table_text(table: &ComparisonTable) -> String {
    if table.is_empty() {
        return "(no data)".to_string();
    }

    let mut header = vec![table.index_label.clone()];
    header.extend(table.columns.iter().cloned());

    let body: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            let mut line = vec![row.label.clone()];
            line.extend(row.cells.iter().map(format_cell));
            line
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for line in &body {
        for (i, value) in line.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(value.chars().count());
            }
        }
    }

    let render_line = |values: &[String]| -> String {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let width = widths.get(i).copied().unwrap_or(0);
                if i == 0 {
                    format!("{:<width$}", v, width = width)
                } else {
                    format!("{:>width$}", v, width = width)
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![render_line(&header)];
    lines.extend(body.iter().map(|line| render_line(line)));
    lines.join("\n")
}

/// Render a table as a Markdown table.
pub fn render_table_markdown(table: &ComparisonTable) -> String {
    if table.is_empty() {
        return "_No data available for this selection._\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!("| {} |", table.index_label));
    for column in &table.columns {
        out.push_str(&format!(" {} |", column));
    }
    out.push('\n');

    out.push_str("|:---|");
    for _ in &table.columns {
        out.push_str("---:|");
    }
    out.push('\n');

    for row in &table.rows {
        out.push_str(&format!("| {} |", row.label));
        for cell in &row.cells {
            out.push_str(&format!(" {} |", format_cell(cell)));
        }
        out.push('\n');
    }

    out
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, options: MarkdownOptions) -> String {
    let mut output = String::new();

    output.push_str("# SwayLens Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));

    match report.result.comparison() {
        Some(comparison) => {
            if options.include_chart {
                output.push_str(&generate_chart_section(&comparison.chart));
            }

            output.push_str("## Data Summary\n\n");
            output.push_str(&render_table_markdown(&comparison.table));
            output.push('\n');

            if options.include_prompts && !comparison.prompt.is_empty() {
                output.push_str("## Interpretation Prompt\n\n");
                output.push_str("<details>\n<summary>System instruction</summary>\n\n```\n");
                output.push_str(comparison.prompt.system.trim());
                output.push_str("\n```\n</details>\n\n");
            }
        }
        None => {
            output.push_str("## Data Summary\n\n");
            output.push_str("_Nothing to compare: no metrics were selected._\n\n");
        }
    }

    if let Some(ref interpretation) = report.interpretation {
        output.push_str("## Clinical Interpretation\n\n");
        output.push_str(interpretation.trim());
        output.push_str("\n\n");
    }

    output.push_str(&generate_failures_section(&report.failures));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Analysis Mode:** {}\n", metadata.mode));
    if !metadata.subject.is_empty() {
        section.push_str(&format!("- **Subject:** {}\n", metadata.subject));
    }
    if let Some(ref model) = metadata.model_used {
        section.push_str(&format!("- **Model Used:** `{}`\n", model));
    }
    section.push_str(&format!("- **Files Compared:** {}\n", metadata.files.len()));
    for (name, date) in &metadata.files {
        section.push_str(&format!("  - `{}` ({})\n", name, date.format("%Y-%m-%d")));
    }
    section.push('\n');

    section
}

/// Generate the chart description section.
fn generate_chart_section(chart: &ChartSpec) -> String {
    match chart {
        ChartSpec::Bar(bar) => generate_bar_section(bar),
        ChartSpec::Radar(radar) => generate_radar_section(radar),
    }
}

fn generate_bar_section(chart: &BarChart) -> String {
    let mut section = String::new();

    section.push_str(&format!("## Visualization: {}\n\n", chart.title));
    section.push_str(&format!(
        "*Grouped bars: {} test condition(s) x {} file(s), y = {}*\n\n",
        chart.categories.len(),
        chart.series.len(),
        chart.value_label
    ));

    for series in &chart.series {
        let points: Vec<String> = series
            .points
            .iter()
            .map(|p| format!("{} = {}", p.category, p.value))
            .collect();
        let points = if points.is_empty() {
            "no values".to_string()
        } else {
            points.join(", ")
        };
        section.push_str(&format!("- **{}:** {}\n", series.name, points));
    }
    section.push('\n');

    section
}

fn generate_radar_section(chart: &RadarChart) -> String {
    let mut section = String::new();

    section.push_str(&format!("## Visualization: {}\n\n", chart.title));
    section.push_str(&format!(
        "*Radar axes: {} | radial range [{}, {}]*\n\n",
        chart.axes.join(", "),
        chart.radial_range.0,
        chart.radial_range.1
    ));

    for trace in &chart.traces {
        let vertices: Vec<String> = trace
            .vertices
            .iter()
            .map(|v| match (v.display, v.raw) {
                (Some(display), Some(raw)) if chart.normalized => {
                    format!("{} = {:.1} (original {:.3})", v.metric, display, raw)
                }
                (Some(display), _) => format!("{} = {}", v.metric, display),
                (None, _) => format!("{} = -", v.metric),
            })
            .collect();
        section.push_str(&format!("- **{}:** {}\n", trace.name, vertices.join("; ")));
    }
    section.push('\n');

    section.push_str(if chart.normalized {
        NORMALIZED_DISCLAIMER
    } else {
        RAW_NOTE
    });
    section.push_str("\n\n");

    section
}

/// Generate the load failures section.
fn generate_failures_section(failures: &[LoadFailure]) -> String {
    if failures.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Files Not Included\n\n");
    for failure in failures {
        section.push_str(&format!("- `{}`: {}\n", failure.file_name, failure.reason));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(
        "*Report generated by SwayLens. Interpretations are decision support, not a diagnosis.*\n",
    );

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{compare_metric, compare_test};
    use crate::models::ComparisonResult;
    use crate::parser::parse;
    use chrono::Utc;

    const SAMPLE: &str = include_str!("../../fixtures/sample_export.txt");

    fn create_test_report(result: ComparisonResult) -> Report {
        let doc = parse(SAMPLE, "visit1.txt").unwrap();
        Report {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                files: vec![(doc.file_name.clone(), doc.date)],
                mode: result.mode_name().to_string(),
                subject: result
                    .comparison()
                    .map(|c| c.subject.clone())
                    .unwrap_or_default(),
                model_used: Some("test-model".to_string()),
            },
            result,
            interpretation: Some("### Interpretation for Stability Score\nStable.".to_string()),
            failures: vec![LoadFailure {
                file_name: "broken.txt".to_string(),
                reason: "no data could be parsed from this file".to_string(),
            }],
        }
    }

    fn documents() -> Vec<crate::models::Document> {
        let first = parse(SAMPLE, "visit1.txt").unwrap();
        let second = parse(&SAMPLE.replace("92.4", "95.0"), "visit2.txt").unwrap();
        vec![first, second]
    }

    #[test]
    fn test_render_table_text() {
        let result = compare_metric("Stability Score", &documents());
        let text = render_table_text(&result.comparison().unwrap().table);
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("Test Condition (Stability Score)"));
        assert!(lines[0].contains("visit1.txt"));
        assert!(lines[0].ends_with("% Change"));
        assert_eq!(lines.len(), 5);
        let nseo = lines.iter().find(|l| l.starts_with("NSEO")).unwrap();
        assert!(nseo.contains("92.4"));
        assert!(nseo.contains("95"));
        assert!(nseo.contains("2.6"));
    }

    #[test]
    fn test_render_table_text_missing_cells() {
        let result = compare_test(
            "NSEO",
            &["Fatigue Ratio".to_string()],
            &documents(),
            true,
        );
        let text = render_table_text(&result.comparison().unwrap().table);
        assert!(text.contains('-'));
        assert!(!text.contains("NaN"));
        assert!(!text.contains("0.0"));
    }

    #[test]
    fn test_render_empty_table() {
        assert_eq!(render_table_text(&ComparisonTable::default()), "(no data)");
    }

    #[test]
    fn test_generate_markdown_report_metric() {
        let report = create_test_report(compare_metric("Stability Score", &documents()));
        let markdown = generate_markdown_report(&report, MarkdownOptions::default());

        assert!(markdown.contains("# SwayLens Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("Stability Score Comparison (n=2 files)"));
        assert!(markdown.contains("## Data Summary"));
        assert!(markdown.contains("| Test Condition (Stability Score) |"));
        assert!(markdown.contains("## Interpretation Prompt"));
        assert!(markdown.contains("## Clinical Interpretation"));
        assert!(markdown.contains("broken.txt"));
    }

    #[test]
    fn test_generate_markdown_report_radar_disclaimer() {
        let metrics = vec!["Stability Score".to_string(), "Sway Path Length".to_string()];
        let normalized = create_test_report(compare_test("NSEO", &metrics, &documents(), true));
        let markdown = generate_markdown_report(&normalized, MarkdownOptions::default());
        assert!(markdown.contains("**Disclaimer:**"));
        assert!(markdown.contains("(original 92.400)"));

        let raw = create_test_report(compare_test("NSEO", &metrics, &documents(), false));
        let markdown = generate_markdown_report(
            &raw,
            MarkdownOptions {
                include_prompts: false,
                include_chart: true,
            },
        );
        assert!(markdown.contains("**Note:**"));
        assert!(!markdown.contains("## Interpretation Prompt"));
    }

    #[test]
    fn test_generate_markdown_report_empty() {
        let report = create_test_report(ComparisonResult::Empty);
        let markdown = generate_markdown_report(&report, MarkdownOptions::default());
        assert!(markdown.contains("Nothing to compare"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report(compare_metric("Stability Score", &documents()));
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"mode\": \"metric\""));
        assert!(json.contains("\"kind\": \"bar\""));
        assert!(json.contains("\"failures\""));
    }
}
