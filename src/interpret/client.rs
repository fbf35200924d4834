//! Ollama chat client for clinical interpretations.
//!
//! One request per interpretation: a system message and a user message,
//! no streaming, no retry. A busy flag rejects overlapping requests.

use crate::models::InterpretationPrompt;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from the interpretation service.
#[derive(Debug, Error)]
pub enum InterpretError {
    #[error("an interpretation is already being generated")]
    Busy,

    #[error("the comparison has no interpretation prompt")]
    EmptyPrompt,

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("cannot connect to Ollama at {0}, is Ollama running?")]
    Connect(String),

    #[error("Ollama API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to send request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("failed to parse Ollama response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Configuration for the interpreter.
#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    pub ollama_url: String,
    pub model_name: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            model_name: "llama3.2:latest".to_string(),
            temperature: 0.2,
            timeout_seconds: 300,
        }
    }
}

impl From<&crate::config::ModelConfig> for InterpreterConfig {
    fn from(config: &crate::config::ModelConfig) -> Self {
        Self {
            ollama_url: config.ollama_url.clone(),
            model_name: config.name.clone(),
            temperature: config.temperature,
            timeout_seconds: config.timeout_seconds,
        }
    }
}

/// Message in the chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// Clears the busy flag when dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Client for the interpretation service.
pub struct Interpreter {
    config: InterpreterConfig,
    http_client: reqwest::Client,
    busy: AtomicBool,
}

impl Interpreter {
    /// Create a new interpreter.
    pub fn new(config: InterpreterConfig) -> Result<Self, InterpretError> {
        info!(
            "Initializing interpreter with model {} at {}",
            config.model_name, config.ollama_url
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(InterpretError::Request)?;

        Ok(Self {
            config,
            http_client,
            busy: AtomicBool::new(false),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.config.model_name
    }

    /// Ask for an interpretation of a rendered comparison table.
    pub async fn interpret(
        &self,
        prompt: &InterpretationPrompt,
        table_text: &str,
    ) -> Result<String, InterpretError> {
        if prompt.is_empty() {
            return Err(InterpretError::EmptyPrompt);
        }

        let _guard = self.acquire()?;
        let messages = build_messages(prompt, table_text);
        self.send_chat(messages).await
    }

    /// Like [`Interpreter::interpret`], but any failure becomes display text.
    pub async fn interpret_or_message(
        &self,
        prompt: &InterpretationPrompt,
        table_text: &str,
    ) -> String {
        match self.interpret(prompt, table_text).await {
            Ok(text) => text,
            Err(e) => format!("An error occurred: {}", e),
        }
    }

    fn acquire(&self) -> Result<BusyGuard<'_>, InterpretError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| InterpretError::Busy)?;
        Ok(BusyGuard(&self.busy))
    }

    async fn send_chat(&self, messages: Vec<ChatMessage>) -> Result<String, InterpretError> {
        let url = format!("{}/api/chat", self.config.ollama_url.trim_end_matches('/'));

        let request = OllamaChatRequest {
            model: self.config.model_name.clone(),
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        };

        debug!("Sending interpretation request to {}", url);

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InterpretError::Timeout(self.config.timeout_seconds)
                } else if e.is_connect() {
                    InterpretError::Connect(self.config.ollama_url.clone())
                } else {
                    InterpretError::Request(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(InterpretError::Api { status, body });
        }

        let chat_response: OllamaChatResponse =
            response.json().await.map_err(InterpretError::Decode)?;

        info!(
            "Received interpretation ({} chars)",
            chat_response.message.content.len()
        );
        Ok(chat_response.message.content)
    }
}

/// System and user messages for one interpretation request.
pub fn build_messages(prompt: &InterpretationPrompt, table_text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system".to_string(),
            content: prompt.system.clone(),
        },
        ChatMessage {
            role: "user".to_string(),
            content: prompt.render_user(table_text),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SUMMARY_PLACEHOLDER;

    fn prompt() -> InterpretationPrompt {
        InterpretationPrompt {
            system: "You are a clinician.".to_string(),
            user_template: format!("Table:\n{}\n", SUMMARY_PLACEHOLDER),
        }
    }

    #[test]
    fn test_interpreter_config_default() {
        let config = InterpreterConfig::default();
        assert_eq!(config.model_name, "llama3.2:latest");
        assert_eq!(config.timeout_seconds, 300);
    }

    #[test]
    fn test_build_messages_substitutes_table() {
        let messages = build_messages(&prompt(), "NSEO | 1.0");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "Table:\nNSEO | 1.0\n");
    }

    #[test]
    fn test_busy_guard_blocks_and_releases() {
        let interpreter = Interpreter::new(InterpreterConfig::default()).unwrap();
        assert!(!interpreter.busy.load(Ordering::Acquire));

        let guard = interpreter.acquire().unwrap();
        assert!(interpreter.busy.load(Ordering::Acquire));
        assert!(matches!(interpreter.acquire(), Err(InterpretError::Busy)));

        drop(guard);
        assert!(!interpreter.busy.load(Ordering::Acquire));
        assert!(interpreter.acquire().is_ok());
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected() {
        let interpreter = Interpreter::new(InterpreterConfig::default()).unwrap();
        let result = interpreter
            .interpret(&InterpretationPrompt::default(), "table")
            .await;
        assert!(matches!(result, Err(InterpretError::EmptyPrompt)));
        assert!(!interpreter.busy.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn test_connection_failure_becomes_message() {
        let interpreter = Interpreter::new(InterpreterConfig {
            ollama_url: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 5,
            ..InterpreterConfig::default()
        })
        .unwrap();

        let text = interpreter.interpret_or_message(&prompt(), "table").await;
        assert!(text.starts_with("An error occurred:"));
        assert!(!interpreter.busy.load(Ordering::Acquire));
    }
}
