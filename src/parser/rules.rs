//! Field-line value rules.
//!
//! Each `* Key: value` line is offered to an ordered chain of rules. The
//! first rule that claims the line decides which metrics it yields; a
//! claimed line may still yield nothing if a numeric token fails to
//! convert. Lines no rule claims are dropped.

use crate::models::MetricValue;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static BRACKETED_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\s*([-+]?[\d.]+)\s*m\s*,\s*([-+]?[\d.]+)\s*m\s*\]").expect("valid regex")
});

static PAIRED_QUALIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((Max & 95%|Max & Ave|Max & Min)\)").expect("valid regex")
});

static PAIRED_VALUES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([-+]?[\d.]+)\s*(?:m/s²|m/s|m²|m)?\s*&\s*([-+]?[\d.]+)\s*(?:m/s²|m/s|m²|m)?")
        .expect("valid regex")
});

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([-+]?[\d.]+)").expect("valid regex"));

/// Metrics produced by a rule that claimed a line.
pub type Extracted = Vec<(String, MetricValue)>;

/// A single value-shape rule.
pub trait FieldRule: Sync {
    /// Short name used in debug logs.
    fn name(&self) -> &'static str;

    /// Returns `None` to decline the line, `Some` to claim it.
    fn apply(&self, key: &str, value: &str) -> Option<Extracted>;
}

/// `* Sway Center: [1.5 m, -2.3 m]` -> `Sway Center Xo`, `Sway Center Yo`.
pub struct SwayCenterRule;

impl FieldRule for SwayCenterRule {
    fn name(&self) -> &'static str {
        "sway-center"
    }

    fn apply(&self, key: &str, value: &str) -> Option<Extracted> {
        if !key.contains("Sway Center") {
            return None;
        }
        let caps = BRACKETED_PAIR.captures(value)?;

        let mut out = Vec::with_capacity(2);
        push_number(&mut out, format!("{} Xo", key), &caps[1]);
        push_number(&mut out, format!("{} Yo", key), &caps[2]);
        Some(out)
    }
}

/// `* Sway Area (Max & 95%): 3.2 m & 1.1 m` -> `Sway Area (Max)`, `Sway Area (95%)`.
pub struct PairedQualifierRule;

impl FieldRule for PairedQualifierRule {
    fn name(&self) -> &'static str {
        "paired-qualifier"
    }

    fn apply(&self, key: &str, value: &str) -> Option<Extracted> {
        let qualifier = PAIRED_QUALIFIER.captures(key)?;
        let values = PAIRED_VALUES.captures(value)?;

        let (first_label, second_label) = qualifier[1].split_once('&')?;
        let root = key.split('(').next().unwrap_or(key).trim();

        let mut out = Vec::with_capacity(2);
        push_number(
            &mut out,
            format!("{} ({})", root, first_label.trim()),
            &values[1],
        );
        push_number(
            &mut out,
            format!("{} ({})", root, second_label.trim()),
            &values[2],
        );
        Some(out)
    }
}

/// Any value starting with a numeric token.
pub struct LeadingNumberRule;

impl FieldRule for LeadingNumberRule {
    fn name(&self) -> &'static str {
        "leading-number"
    }

    fn apply(&self, key: &str, value: &str) -> Option<Extracted> {
        let caps = LEADING_NUMBER.captures(value)?;
        let mut out = Vec::with_capacity(1);
        push_number(&mut out, key.to_string(), &caps[1]);
        Some(out)
    }
}

/// `* Stability Class: B | Moderate` -> categorical `B`.
pub struct StabilityClassRule;

impl FieldRule for StabilityClassRule {
    fn name(&self) -> &'static str {
        "stability-class"
    }

    fn apply(&self, key: &str, value: &str) -> Option<Extracted> {
        if key != "Stability Class" {
            return None;
        }
        let class = value.split('|').next().unwrap_or("").trim();
        Some(vec![(
            key.to_string(),
            MetricValue::Category(class.to_string()),
        )])
    }
}

/// Rules in priority order.
pub static RULES: [&dyn FieldRule; 4] = [
    &SwayCenterRule,
    &PairedQualifierRule,
    &LeadingNumberRule,
    &StabilityClassRule,
];

/// Run the rule chain over one key/value pair.
pub fn extract(key: &str, value: &str) -> Extracted {
    for rule in RULES.iter() {
        if let Some(metrics) = rule.apply(key, value) {
            debug!("{} claimed '{}' ({} metrics)", rule.name(), key, metrics.len());
            return metrics;
        }
    }
    debug!("No rule matched '{}: {}'", key, value);
    Vec::new()
}

fn push_number(out: &mut Extracted, name: String, token: &str) {
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => out.push((name, MetricValue::Number(v))),
        _ => debug!("Skipping '{}': malformed number '{}'", name, token),
    }
}
