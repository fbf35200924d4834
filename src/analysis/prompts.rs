//! Prompt text for the clinical interpretation service.

use crate::models::{InterpretationPrompt, SUMMARY_PLACEHOLDER};

const ROLE: &str = "You are a clinical expert in vestibular and balance disorders, \
specializing in interpreting posturography data.";

/// Prompt for a single-metric comparison across test conditions.
pub fn metric_prompt(metric: &str, file_count: usize) -> InterpretationPrompt {
    let system = format!(
        "{ROLE}
- Analyze the provided data summary for the SINGLE METRIC: {metric}.
- The summary covers {file_count} file(s).
- Provide a brief, clinically-oriented interpretation.
- If n=2, focus on the magnitude and direction of change.
- If n>2, focus on the mean and standard deviation.
- If n=1, describe the single-point data relative to typical expectations (e.g., high/low sway).
- Always mention which test conditions (e.g., \"NSEO\", \"FECR Rt\") show the most significant findings.
- Be concise, professional, and use clear language. Do not make a diagnosis.
- Structure your response with a summary, key findings, and potential implications.
- Start with a clear heading: \"### Interpretation for {metric}\".
"
    );

    let user_template = format!(
        "Here is a summary of posturography data for the metric \"{metric}\". \
Please provide a clinical interpretation based on this table.
---
{SUMMARY_PLACEHOLDER}
---
"
    );

    InterpretationPrompt {
        system,
        user_template,
    }
}

/// Prompt for a multi-metric profile of one test condition.
pub fn test_prompt(test_key: &str, metrics: &[String], file_count: usize) -> InterpretationPrompt {
    let metric_list = metrics.join(", ");

    let system = format!(
        "{ROLE}
- Analyze the provided data summary, which shows a COMPREHENSIVE PROFILE for the SINGLE TEST CONDITION: {test_key}.
- The table shows ORIGINAL values for these metrics only: {metric_list}.
- The summary covers {file_count} file(s).
- Provide a holistic interpretation of performance under this test condition ({test_key}), \
comparing the files using only the metrics provided in the table.
- For n=2, compare the overall profile change.
- For n>2, comment on the average profile and variability.
- For n=1, comment on the single profile.
- Be concise, professional, and use clear language. Do not make a diagnosis.
- Structure your response with a summary, key findings, and potential implications for this test condition.
- Start with a clear heading: \"### Comprehensive Interpretation for {test_key}\".
"
    );

    let user_template = format!(
        "Here is a summary of key posturography metrics for the test condition \"{test_key}\". \
Please provide a holistic clinical interpretation comparing the files based only on these metrics.
---
{SUMMARY_PLACEHOLDER}
---
"
    );

    InterpretationPrompt {
        system,
        user_template,
    }
}
