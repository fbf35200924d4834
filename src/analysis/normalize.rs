//! Radar-chart scaling.
//!
//! Normalized mode maps each metric to a 0-100 score where 100 is the
//! best observed value. Raw mode keeps original units and only sizes the
//! radial axis.

/// Which direction of a metric is clinically better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    High,
    Low,
}

/// Fixed orientation table for the key radar metrics.
pub const METRIC_ORIENTATION: [(&str, Orientation); 7] = [
    ("Stability Score", Orientation::High),
    ("Sway Path Length", Orientation::Low),
    ("Sway Velocity (Ave)", Orientation::Low),
    ("Area 95% Conf. Ellipse", Orientation::Low),
    ("Fatigue Ratio", Orientation::Low),
    ("Adaptation Ratio", Orientation::High),
    ("Directionality", Orientation::Low),
];

/// Orientation of a metric. Metrics outside the table count as high-is-better.
pub fn orientation(metric: &str) -> Orientation {
    METRIC_ORIENTATION
        .iter()
        .find(|(name, _)| *name == metric)
        .map(|(_, o)| *o)
        .unwrap_or(Orientation::High)
}

/// Normalize one metric's values across documents to 0-100.
///
/// Missing values stay missing. A degenerate range (all equal, or a
/// single value) maps every present value to 100.
pub fn normalize_scores(values: &[Option<f64>], orientation: Orientation) -> Vec<Option<f64>> {
    let Some((min, max)) = bounds(values.iter().flatten().copied()) else {
        return vec![None; values.len()];
    };

    values
        .iter()
        .map(|value| {
            value.filter(|v| v.is_finite()).map(|v| {
                let score = if max == min {
                    1.0
                } else {
                    let scaled = (v - min) / (max - min);
                    match orientation {
                        Orientation::High => scaled,
                        Orientation::Low => 1.0 - scaled,
                    }
                };
                score.clamp(0.0, 1.0) * 100.0
            })
        })
        .collect()
}

/// Radial axis range for raw (unnormalized) values.
///
/// Zero is always included when every value is positive, a flat range is
/// widened by one unit, and no values at all gives `[0, 1]`.
pub fn raw_radial_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let Some((min, max)) = bounds(values) else {
        return (0.0, 1.0);
    };

    let lower = if min > 0.0 { 0.0 } else { min };
    let upper = if max == min { max + 1.0 } else { max };
    (lower, upper)
}

/// Min and max of the finite values.
fn bounds(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
