//! Export loader.
//!
//! Resolves files and directories into export paths, parses each file on
//! its own, and collects per-file failures without aborting the batch.

use crate::models::{Document, LoadFailure};
use crate::parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Why a single file produced no document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read file: {0}")]
    Read(#[from] std::io::Error),

    #[error("file is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error("no data could be parsed from this file, please check the file format")]
    NoData,

    #[error("a file named '{0}' is already loaded")]
    DuplicateName(String),
}

/// Configuration for loading exports.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Extensions picked up when walking directories (e.g. ["txt"]).
    pub extensions: Vec<String>,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
    /// Show a spinner while parsing.
    pub show_progress: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["txt".to_string()],
            max_file_size: 5 * 1024 * 1024, // 5MB
            show_progress: false,
        }
    }
}

impl From<&crate::config::LoaderConfig> for LoadConfig {
    fn from(config: &crate::config::LoaderConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            max_file_size: config.max_file_size,
            show_progress: false,
        }
    }
}

/// Parsed documents plus the files that failed.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Successfully parsed documents, oldest test date first.
    pub documents: Vec<Document>,
    pub failures: Vec<LoadFailure>,
}

/// Loads posturography exports from disk.
pub struct ExportLoader {
    config: LoadConfig,
}

impl ExportLoader {
    pub fn new(config: LoadConfig) -> Self {
        Self { config }
    }

    /// Expand inputs into a list of export paths.
    ///
    /// Files are taken as given; directories are walked for matching
    /// extensions, skipping hidden entries, in sorted order.
    pub fn resolve(&self, inputs: &[PathBuf]) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        for input in inputs {
            if !input.is_dir() {
                paths.push(input.clone());
                continue;
            }

            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!("Cannot read directory entry: {}", e);
                        None
                    }
                })
                .filter(|e| e.file_type().is_file() && self.matches(e.path()))
                .map(|e| e.into_path())
                .collect();
            found.sort();

            debug!("Found {} exports in {}", found.len(), input.display());
            paths.extend(found);
        }

        paths
    }

    /// Load every input, isolating failures per file.
    pub fn load(&self, inputs: &[PathBuf]) -> LoadOutcome {
        let paths = self.resolve(inputs);
        let mut outcome = LoadOutcome::default();
        let mut seen = HashSet::new();

        let spinner = if self.config.show_progress {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message("Parsing files...");
            Some(pb)
        } else {
            None
        };

        for path in &paths {
            let file_name = display_name(path);
            if let Some(ref pb) = spinner {
                pb.set_message(format!("Parsing {}", file_name));
                pb.tick();
            }

            let result = if seen.contains(&file_name) {
                Err(LoadError::DuplicateName(file_name.clone()))
            } else {
                self.load_file(path, &file_name)
            };

            match result {
                Ok(doc) => {
                    debug!(
                        "{}: {} tests, {} metrics",
                        file_name,
                        doc.tests.len(),
                        doc.metric_count()
                    );
                    seen.insert(file_name);
                    outcome.documents.push(doc);
                }
                Err(e) => {
                    warn!("{}: {}", file_name, e);
                    outcome.failures.push(LoadFailure {
                        file_name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        // Stable: files without a test date keep their relative order.
        outcome.documents.sort_by_key(|d| d.date);

        info!(
            "Parsed {} of {} file(s)",
            outcome.documents.len(),
            paths.len()
        );

        outcome
    }

    /// Read and parse one export.
    pub fn load_file(&self, path: &Path, file_name: &str) -> Result<Document, LoadError> {
        let size = fs::metadata(path)?.len();
        if size > self.config.max_file_size {
            return Err(LoadError::TooLarge {
                size,
                limit: self.config.max_file_size,
            });
        }

        let bytes = fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);

        parser::parse(&content, file_name).ok_or(LoadError::NoData)
    }

    /// Check if a path has one of the configured extensions.
    pub fn matches(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.config
            .extensions
            .iter()
            .any(|wanted| wanted.eq_ignore_ascii_case(ext))
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = include_str!("../../fixtures/sample_export.txt");

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_failures_are_isolated() {
        let temp = TempDir::new().unwrap();
        let good = write(temp.path(), "good.txt", SAMPLE);
        let bad = write(temp.path(), "bad.txt", "nothing to see here");
        let missing = temp.path().join("missing.txt");

        let loader = ExportLoader::new(LoadConfig::default());
        let outcome = loader.load(&[bad, good, missing]);

        assert_eq!(outcome.documents.len(), 1);
        assert_eq!(outcome.documents[0].file_name, "good.txt");
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.failures[0].file_name, "bad.txt");
        assert!(outcome.failures[0].reason.contains("no data"));
        assert_eq!(outcome.failures[1].file_name, "missing.txt");
    }

    #[test]
    fn test_directory_walk() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "b.txt", SAMPLE);
        write(temp.path(), "nested/a.txt", SAMPLE);
        write(temp.path(), "notes.md", SAMPLE);
        write(temp.path(), ".hidden/c.txt", SAMPLE);

        let loader = ExportLoader::new(LoadConfig::default());
        let paths = loader.resolve(&[temp.path().to_path_buf()]);
        let names: Vec<String> = paths.iter().map(|p| display_name(p)).collect();

        assert_eq!(names, vec!["b.txt", "a.txt"]);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let temp = TempDir::new().unwrap();
        let first = write(temp.path(), "one/visit.txt", SAMPLE);
        let second = write(temp.path(), "two/visit.txt", SAMPLE);

        let loader = ExportLoader::new(LoadConfig::default());
        let outcome = loader.load(&[first, second]);

        assert_eq!(outcome.documents.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].reason.contains("already loaded"));
    }

    #[test]
    fn test_documents_sorted_by_date() {
        let temp = TempDir::new().unwrap();
        let later = write(
            temp.path(),
            "later.txt",
            "Test 1: Normal Stance Eyes Open (NSEO)\n* Test Date: 6/1/2024\n* Stability Score: 70\n",
        );
        let earlier = write(
            temp.path(),
            "earlier.txt",
            "Test 1: Normal Stance Eyes Open (NSEO)\n* Test Date: 1/15/2024\n* Stability Score: 60\n",
        );

        let loader = ExportLoader::new(LoadConfig::default());
        let outcome = loader.load(&[later, earlier]);

        let names: Vec<&str> = outcome
            .documents
            .iter()
            .map(|d| d.file_name.as_str())
            .collect();
        assert_eq!(names, vec!["earlier.txt", "later.txt"]);
    }

    #[test]
    fn test_size_limit() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "big.txt", SAMPLE);

        let loader = ExportLoader::new(LoadConfig {
            max_file_size: 10,
            ..LoadConfig::default()
        });
        let err = loader.load_file(&path, "big.txt").unwrap_err();
        assert!(matches!(err, LoadError::TooLarge { .. }));
    }
}
