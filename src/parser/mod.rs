//! Posturography export parser.
//!
//! Turns one raw text export into a [`Document`]. The parser is
//! best-effort: unrecognised lines are skipped, and a file only fails
//! when no `Test N:` block yields any metric.

pub mod rules;

use crate::models::{Document, TestRecord};
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

static TEST_DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Test \d+: ").expect("valid regex"));

static ACRONYM_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\w\s]+) \(([A-Z]{4})\)").expect("valid regex"));

static TRAILING_ACRONYM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]{4}):?$").expect("valid regex"));

static TEST_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}/\d{1,2}/\d{4})").expect("valid regex"));

const DATE_PREFIX: &str = "* Test Date:";
const VARIANT_PREFIX: &str = "Foam Eyes Closed";

/// Parse an export. Returns `None` when nothing usable was found.
pub fn parse(content: &str, file_name: &str) -> Option<Document> {
    let mut blocks = TEST_DELIMITER.split(content);
    // Text before the first delimiter is preamble.
    blocks.next();
    let blocks: Vec<&str> = blocks.collect();

    if blocks.is_empty() {
        debug!("{}: no 'Test N:' blocks found", file_name);
        return None;
    }

    let mut date: Option<DateTime<Utc>> = None;
    let mut tests = BTreeMap::new();

    for block in blocks {
        let mut lines = block.split('\n');
        let header = lines.next().unwrap_or("").trim();

        let Some(test_key) = derive_test_key(header) else {
            debug!("{}: skipping block with header '{}'", file_name, header);
            continue;
        };

        let mut record = TestRecord {
            full_name: header.strip_suffix(':').unwrap_or(header).to_string(),
            metrics: BTreeMap::new(),
        };

        for line in lines {
            let line = line.trim();

            if line.starts_with(DATE_PREFIX) {
                if date.is_none() {
                    date = parse_test_date(line);
                }
                continue;
            }

            let Some(field) = line.strip_prefix('*') else {
                continue;
            };
            let Some((key, value)) = field.split_once(':') else {
                continue;
            };

            for (name, value) in rules::extract(key.trim(), value.trim()) {
                record.metrics.insert(name, value);
            }
        }

        if record.metrics.is_empty() {
            debug!("{}: test '{}' produced no metrics", file_name, test_key);
            continue;
        }

        tests.insert(test_key, record);
    }

    if tests.is_empty() {
        return None;
    }

    Some(Document {
        file_name: file_name.to_string(),
        date_from_export: date.is_some(),
        date: date.unwrap_or_else(Utc::now),
        tests,
    })
}

/// Derive the short test key from a block header.
///
/// Precedence: `Words (ABCD)` acronym (with the trailing variant word for
/// "Foam Eyes Closed" headers), then a trailing 4-letter token, then the
/// text before the first colon.
pub fn derive_test_key(header: &str) -> Option<String> {
    let key = if let Some(caps) = ACRONYM_HEADER.captures(header) {
        let description = caps[1].trim();
        let acronym = caps[2].trim();

        if description.starts_with(VARIANT_PREFIX) {
            let variant = description.split(' ').last().unwrap_or("");
            format!("{} {}", acronym, variant)
        } else {
            acronym.to_string()
        }
    } else if let Some(caps) = TRAILING_ACRONYM.captures(header) {
        caps[1].to_string()
    } else {
        header.split(':').next().unwrap_or("").trim().to_string()
    };

    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

fn parse_test_date(line: &str) -> Option<DateTime<Utc>> {
    let caps = TEST_DATE.captures(line)?;
    let date = NaiveDate::parse_from_str(&caps[1], "%m/%d/%Y").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricValue;
    use chrono::Datelike;

    const SAMPLE: &str = include_str!("../../fixtures/sample_export.txt");

    #[test]
    fn test_no_delimiter_returns_none() {
        assert!(parse("", "empty.txt").is_none());
        assert!(parse("Patient: Jane\n* Stability Score: 80", "x.txt").is_none());
        assert!(parse("Test A: Foo (ABCD)\n* Score: 1", "x.txt").is_none());
    }

    #[test]
    fn test_blocks_without_metrics_return_none() {
        let content = "Test 1: Sensory Organization (NSEO):\n* Operator: Smith\nnoise\n";
        assert!(parse(content, "x.txt").is_none());
    }

    #[test]
    fn test_derive_test_key() {
        assert_eq!(
            derive_test_key("Sensory Organization (NSEO)").as_deref(),
            Some("NSEO")
        );
        assert_eq!(
            derive_test_key("Foam Eyes Closed Rt (FECR)").as_deref(),
            Some("FECR Rt")
        );
        assert_eq!(
            derive_test_key("Perturbed Stance Eyes Closed (PSEC):").as_deref(),
            Some("PSEC")
        );
        assert_eq!(derive_test_key("Quick check QSEO:").as_deref(), Some("QSEO"));
        assert_eq!(
            derive_test_key("Custom balance: extra").as_deref(),
            Some("Custom balance")
        );
        assert_eq!(derive_test_key(""), None);
        assert_eq!(derive_test_key(": nothing before"), None);
    }

    #[test]
    fn test_parse_sample_export() {
        let doc = parse(SAMPLE, "visit1.txt").expect("sample parses");

        assert_eq!(doc.file_name, "visit1.txt");
        assert!(doc.date_from_export);
        assert_eq!(doc.date.year(), 2024);
        assert_eq!(doc.date.month(), 3);
        assert_eq!(doc.date.day(), 7);

        let keys: Vec<&str> = doc.tests.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["FECR Lt", "FECR Rt", "NSEC", "NSEO"]);

        let nseo = &doc.tests["NSEO"];
        assert_eq!(nseo.full_name, "Normal Stance Eyes Open (NSEO)");
        assert_eq!(doc.number("NSEO", "Stability Score"), Some(92.4));
        assert_eq!(doc.number("NSEO", "Sway Center Xo"), Some(1.5));
        assert_eq!(doc.number("NSEO", "Sway Center Yo"), Some(-2.3));
        assert_eq!(doc.number("NSEO", "Sway Area (Max)"), Some(3.2));
        assert_eq!(doc.number("NSEO", "Sway Area (95%)"), Some(1.1));
        assert_eq!(doc.number("NSEO", "Sway Velocity (Ave)"), Some(0.011));
        assert_eq!(
            doc.metric("NSEO", "Stability Class"),
            Some(&MetricValue::Category("A".to_string()))
        );
        assert!(doc.metric("NSEO", "Operator").is_none());
        assert!(doc.metric("NSEO", "Test Date").is_none());
    }

    #[test]
    fn test_empty_block_is_dropped() {
        let doc = parse(SAMPLE, "visit1.txt").expect("sample parses");
        assert!(!doc.tests.contains_key("CALI"));
        assert!(doc.tests.values().all(|t| !t.metrics.is_empty()));
    }

    #[test]
    fn test_first_valid_date_wins() {
        let content = "Test 1: Normal Stance Eyes Open (NSEO)\n\
                       * Test Date: 13/45/2024\n\
                       * Test Date: 1/2/2023\n\
                       * Stability Score: 80\n\
                       Test 2: Normal Stance Eyes Closed (NSEC)\n\
                       * Test Date: 5/6/2022\n\
                       * Stability Score: 70\n";
        let doc = parse(content, "dates.txt").expect("parses");
        assert!(doc.date_from_export);
        assert_eq!(doc.date.year(), 2023);
        assert_eq!(doc.date.month(), 1);
        assert_eq!(doc.date.day(), 2);
    }

    #[test]
    fn test_missing_date_falls_back_to_now() {
        let before = Utc::now();
        let doc = parse("Test 1: X (ABCD)\n* Score: 1\n", "x.txt").expect("parses");
        assert!(!doc.date_from_export);
        assert!(doc.date >= before);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let first = parse(SAMPLE, "visit1.txt").expect("parses");
        let second = parse(SAMPLE, "visit1.txt").expect("parses");
        assert_eq!(first, second);
    }

    #[test]
    fn test_crlf_lines() {
        let content = "Test 1: Normal Stance Eyes Open (NSEO):\r\n* Stability Score: 88.0\r\n";
        let doc = parse(content, "crlf.txt").expect("parses");
        assert_eq!(doc.tests["NSEO"].full_name, "Normal Stance Eyes Open (NSEO)");
        assert_eq!(doc.number("NSEO", "Stability Score"), Some(88.0));
    }
}
