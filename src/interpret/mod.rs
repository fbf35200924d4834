//! Clinical interpretation via a local LLM.
//!
//! This module sends the rendered comparison table to Ollama and returns
//! free text suitable for Markdown display.

pub mod client;

pub use client::{Interpreter, InterpreterConfig};
