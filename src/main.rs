//! SwayLens - posturography export comparison
//!
//! A CLI tool that parses balance-test exports, compares metrics across
//! visits, and optionally asks a local Ollama model for a clinical
//! interpretation of the comparison.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (no parsable files, unknown metric, write failure, etc.)

mod analysis;
mod cli;
mod config;
mod interpret;
mod loader;
mod models;
mod parser;
mod report;

use analysis::Catalog;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use interpret::{Interpreter, InterpreterConfig};
use loader::{ExportLoader, LoadConfig};
use models::{ComparisonResult, Document, Report, ReportMetadata};
use report::MarkdownOptions;
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if args.init_config {
        return handle_init_config();
    }

    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(config.log_level(args.quiet));

    info!("SwayLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Effective config: {:?}", config);

    match run(args, config).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Comparison failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .swaylens.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the model, file extensions, and report sections.");
    Ok(())
}

/// Initialize logging at the merged verbosity level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete comparison workflow. Returns the exit code.
async fn run(args: Args, config: Config) -> Result<i32> {
    // Step 1: Load exports
    let loader_config = LoadConfig {
        show_progress: !args.quiet,
        ..LoadConfig::from(&config.loader)
    };
    let outcome = ExportLoader::new(loader_config).load(&args.inputs);

    for failure in &outcome.failures {
        eprintln!("⚠️  Error in {}: {}", failure.file_name, failure.reason);
    }

    if outcome.documents.is_empty() {
        bail!("No valid data could be extracted from the provided files");
    }

    let documents = outcome.documents;
    if !args.quiet {
        println!("📄 Loaded {} file(s):", documents.len());
        for doc in &documents {
            let date_note = if doc.date_from_export {
                ""
            } else {
                " (no test date)"
            };
            println!(
                "   {} - {}{}",
                doc.file_name,
                doc.date.format("%Y-%m-%d"),
                date_note
            );
        }
    }

    let catalog = Catalog::from_documents(&documents);

    if args.list {
        print_catalog(&catalog);
        return Ok(0);
    }

    // Step 2: Compare
    let result = select_comparison(&args, &catalog, &documents)?;

    let Some(comparison) = result.comparison() else {
        println!("\nNo metrics selected, nothing to compare.");
        return Ok(0);
    };

    let table_text = report::render_table_text(&comparison.table);
    if !args.quiet {
        println!("\n📊 {}: {}\n", result.mode_name(), comparison.subject);
        println!("{}\n", table_text);
    }

    // Step 3: Interpret
    let interpretation = if args.interpret {
        let interpreter = Interpreter::new(InterpreterConfig::from(&config.model))?;
        println!(
            "🤖 Requesting interpretation from {}...",
            interpreter.model_name()
        );
        println!(
            "   ⏳ This may take a while. Timeout: {}s",
            config.model.timeout_seconds
        );
        let text = interpreter
            .interpret_or_message(&comparison.prompt, &table_text)
            .await;
        Some(text)
    } else {
        None
    };

    // Step 4: Build and save the report
    let metadata = ReportMetadata {
        generated_at: Utc::now(),
        files: documents
            .iter()
            .map(|d| (d.file_name.clone(), d.date))
            .collect(),
        mode: result.mode_name().to_string(),
        subject: comparison.subject.clone(),
        model_used: args.interpret.then(|| config.model.name.clone()),
    };

    let report = Report {
        metadata,
        result: result.clone(),
        interpretation,
        failures: outcome.failures,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&report, MarkdownOptions::from(&config.report))
        }
    };

    let output_path = Path::new(&config.general.output);
    std::fs::write(output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    if let Some(ref text) = report.interpretation {
        if !args.quiet {
            println!("\n🩺 Clinical Interpretation:\n");
            println!("{}", text.trim());
        }
    }

    println!(
        "\n✅ Comparison complete! Report saved to: {}",
        output_path.display()
    );

    Ok(0)
}

/// Pick the comparison mode from the arguments and run it.
fn select_comparison(
    args: &Args,
    catalog: &Catalog,
    documents: &[Document],
) -> Result<ComparisonResult> {
    if let Some(ref test_key) = args.test {
        if !catalog.has_test(test_key) {
            bail!(
                "Test condition '{}' not found. Available: {}",
                test_key,
                catalog.test_conditions.join(", ")
            );
        }

        let metrics = match args.requested_radar_metrics() {
            Some(requested) => {
                for metric in requested.iter().filter(|m| !catalog.has_metric(m)) {
                    warn!("Metric '{}' not found in any loaded file", metric);
                }
                requested
            }
            None => catalog.default_radar_metrics(),
        };

        info!(
            "Profiling {} with {} metric(s), normalized: {}",
            test_key,
            metrics.len(),
            !args.raw
        );
        return Ok(analysis::compare_test(
            test_key,
            &metrics,
            documents,
            !args.raw,
        ));
    }

    let metric = match args.metric {
        Some(ref metric) => {
            if !catalog.has_metric(metric) {
                bail!(
                    "Metric '{}' not found. Use --list to see available metrics",
                    metric
                );
            }
            metric.as_str()
        }
        None => match catalog.default_metric() {
            Some(metric) => metric,
            None => bail!("The loaded files contain no metrics"),
        },
    };

    info!("Comparing metric '{}' across {} file(s)", metric, documents.len());
    Ok(analysis::compare_metric(metric, documents))
}

/// Handle --list: print available metrics and test conditions.
fn print_catalog(catalog: &Catalog) {
    println!("\n🧪 Test conditions ({}):", catalog.test_conditions.len());
    for test_key in &catalog.test_conditions {
        println!("   {}", test_key);
    }

    println!("\n📏 Metrics ({}):", catalog.metrics.len());
    for metric in &catalog.metrics {
        println!("   {}", metric);
    }

    let radar = catalog.default_radar_metrics();
    if !radar.is_empty() {
        println!("\n   Default radar metrics: {}", radar.join(", "));
    }
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
