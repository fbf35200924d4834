//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// SwayLens - posturography export comparison
///
/// Parse balance-test exports, compare metrics across visits with
/// bar-chart and radar-chart data, and optionally ask a local LLM for a
/// clinical interpretation.
///
/// Examples:
///   swaylens visit1.txt visit2.txt
///   swaylens exports/ --metric "Sway Path Length"
///   swaylens visit1.txt visit2.txt --test NSEO --raw
///   swaylens exports/ --test "FECR Rt" --radar-metrics "Stability Score,Fatigue Ratio"
///   swaylens exports/ --list
///   swaylens visit1.txt visit2.txt --interpret --model llama3.2:latest
///   swaylens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Export files or directories containing exports
    #[arg(value_name = "INPUT", required_unless_present = "init_config")]
    pub inputs: Vec<PathBuf>,

    /// Compare a single metric across all test conditions (bar chart)
    ///
    /// Defaults to "Stability Score" when present, else the first metric.
    #[arg(long, value_name = "METRIC", conflicts_with = "test")]
    pub metric: Option<String>,

    /// Build a comprehensive profile for one test condition (radar chart)
    #[arg(long, value_name = "TEST_KEY")]
    pub test: Option<String>,

    /// Metrics for the radar profile (comma-separated)
    ///
    /// Defaults to the key radar metrics present in the loaded files.
    #[arg(long, value_name = "METRICS", value_delimiter = ',', requires = "test")]
    pub radar_metrics: Option<Vec<String>>,

    /// Show radar values in original units instead of a 0-100 scale
    #[arg(long, requires = "test")]
    pub raw: bool,

    /// List available metrics and test conditions, then exit
    #[arg(long)]
    pub list: bool,

    /// Request a clinical interpretation from the LLM
    #[arg(long)]
    pub interpret: bool,

    /// Ollama model used for interpretation
    #[arg(short, long, env = "SWAYLENS_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Interpretation request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// File extensions picked up in directories (comma-separated)
    #[arg(long, value_name = "EXTS", value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,

    /// Leave the interpretation prompts out of the report
    #[arg(long)]
    pub no_prompts: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .swaylens.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .swaylens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.inputs.is_empty() {
            return Err("At least one input file or directory is required".to_string());
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref metric) = self.metric {
            if metric.trim().is_empty() {
                return Err("Metric name cannot be empty".to_string());
            }
        }

        if let Some(ref metrics) = self.radar_metrics {
            if metrics.iter().all(|m| m.trim().is_empty()) {
                return Err("--radar-metrics needs at least one metric name".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.list && self.interpret {
            return Err("Cannot use --interpret with --list".to_string());
        }

        Ok(())
    }

    /// Radar metrics as given, trimmed, blanks removed.
    pub fn requested_radar_metrics(&self) -> Option<Vec<String>> {
        self.radar_metrics.as_ref().map(|metrics| {
            metrics
                .iter()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            inputs: vec![PathBuf::from("visit1.txt")],
            metric: None,
            test: None,
            radar_metrics: None,
            raw: false,
            list: false,
            interpret: false,
            model: None,
            ollama_url: None,
            temperature: None,
            timeout: None,
            output: None,
            format: OutputFormat::Markdown,
            extensions: None,
            no_prompts: false,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.ollama_url = Some("localhost:11434".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_temperature() {
        let mut args = make_args();
        args.temperature = Some(1.5);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_requested_radar_metrics_trimmed() {
        let mut args = make_args();
        args.radar_metrics = Some(vec![
            " Stability Score".to_string(),
            "".to_string(),
            "Fatigue Ratio ".to_string(),
        ]);
        assert_eq!(
            args.requested_radar_metrics(),
            Some(vec![
                "Stability Score".to_string(),
                "Fatigue Ratio".to_string()
            ])
        );
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "swaylens",
            "a.txt",
            "b.txt",
            "--test",
            "NSEO",
            "--radar-metrics",
            "Stability Score,Directionality",
            "--raw",
        ])
        .unwrap();
        assert_eq!(args.inputs.len(), 2);
        assert_eq!(args.test.as_deref(), Some("NSEO"));
        assert!(args.raw);
        assert_eq!(args.radar_metrics.map(|m| m.len()), Some(2));
    }
}
