//! Text-generation providers behind one text-in, text-out contract.
//!
//! The backend is chosen once from [`ProviderConfig::kind`] and held as an
//! [`AppGenerator`]. A backend whose credentials are missing does not fail:
//! it answers with a fixed sentinel naming what is missing, so insight text
//! degrades instead of erroring. Transport and provider-side failures are
//! returned as [`ProviderError`] unchanged.
//!
//! Callers that prefer a placeholder over a failure wrap a generator with
//! [`with_fallback`].

mod fallback;
mod gemini;
mod openai;
mod tabular;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{Map, Value};

use crate::config::{ProviderConfig, ProviderKind};
use crate::context::AppGenerator;
use crate::error::{AppError, ProviderError};

pub use fallback::{with_fallback, WithFallback};
pub use gemini::GeminiProvider;
pub use openai::ChatProvider;
pub use tabular::HuggingFaceProvider;

pub const OPENAI_NOT_CONFIGURED: &str = "OpenAI not configured.";
pub const DEEPSEEK_NOT_CONFIGURED: &str = "DeepSeek not configured.";
pub const GOOGLE_NOT_CONFIGURED: &str = "Google AI Studio not configured.";
pub const AZURE_NOT_CONFIGURED: &str = "Azure OpenAI not configured.";
pub const HUGGINGFACE_NOT_CONFIGURED: &str = "Hugging Face not configured.";
pub const TASK_NOT_SUPPORTED: &str = "Task not supported.";

/// Every in-band sentinel a provider may answer with.
pub const SENTINELS: &[&str] = &[
    OPENAI_NOT_CONFIGURED,
    DEEPSEEK_NOT_CONFIGURED,
    GOOGLE_NOT_CONFIGURED,
    AZURE_NOT_CONFIGURED,
    HUGGINGFACE_NOT_CONFIGURED,
    TASK_NOT_SUPPORTED,
];

/// Whether `text` is a degraded-condition sentinel rather than generated output.
pub fn is_sentinel(text: &str) -> bool {
    SENTINELS.contains(&text.trim())
}

/// Error bodies are truncated to this many characters.
const MAX_ERROR_BODY: usize = 320;

/// What a tabular model should do with its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Qa,
    Summarization,
}

impl Task {
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Qa => "qa",
            Task::Summarization => "summarization",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Task {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qa" => Ok(Task::Qa),
            "summarization" | "summarize" => Ok(Task::Summarization),
            other => Err(format!("Unknown task '{}'", other)),
        }
    }
}

/// Rows of string cells under named columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row. Missing cells are padded with empty strings.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells.into_iter().map(Into::into).collect();
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column-major JSON object (`{"column": ["cell", ...]}`) as table-QA models expect.
    pub fn to_columns_json(&self) -> Value {
        let mut object = Map::new();
        for (index, column) in self.columns.iter().enumerate() {
            let cells = self
                .rows
                .iter()
                .map(|row| Value::String(row.get(index).cloned().unwrap_or_default()))
                .collect();
            object.insert(column.clone(), Value::Array(cells));
        }
        Value::Object(object)
    }

    /// One line per row, `column: cell` pairs separated by `; `.
    pub fn to_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .filter(|(_, cell)| !cell.is_empty())
                    .map(|(column, cell)| format!("{}: {}", column, cell))
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A single generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub table: Option<Table>,
    pub task: Option<Task>,
}

impl GenerateRequest {
    /// Prompt-only request.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            table: None,
            task: None,
        }
    }

    /// Prompt with a table for `task`.
    pub fn tabular(prompt: impl Into<String>, table: Table, task: Task) -> Self {
        Self {
            prompt: prompt.into(),
            table: Some(table),
            task: Some(task),
        }
    }
}

/// A configured text-generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Display name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Whether the backend consumes tables rather than free-form prompts.
    fn supports_tables(&self) -> bool {
        false
    }

    /// Generate text. Missing configuration yields a sentinel, not an error.
    async fn generate(&self, request: &GenerateRequest) -> Result<String, ProviderError>;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for &T {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn supports_tables(&self) -> bool {
        (**self).supports_tables()
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, ProviderError> {
        (**self).generate(request).await
    }
}

/// Builds the generator selected by `config.kind`.
pub fn build(config: &ProviderConfig) -> Result<AppGenerator, AppError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

    let generator: AppGenerator = match config.kind {
        ProviderKind::DefaultChat => Arc::new(ChatProvider::openai(client, config)),
        ProviderKind::AlternateChat => Arc::new(ChatProvider::deepseek(client, config)),
        ProviderKind::EnterpriseChat => Arc::new(ChatProvider::azure(client, config)),
        ProviderKind::GenerativeSingleShot => Arc::new(GeminiProvider::new(client, config)),
        ProviderKind::Tabular => Arc::new(HuggingFaceProvider::new(client, config)),
    };
    Ok(generator)
}

/// Passes a successful response through; converts anything else to a status error.
async fn ensure_success(
    provider: &'static str,
    response: Response,
) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        provider,
        status: status.as_u16(),
        body: truncate(&body, MAX_ERROR_BODY),
    })
}

fn transport(provider: &'static str) -> impl FnOnce(reqwest::Error) -> ProviderError {
    move |source| ProviderError::Transport { provider, source }
}

fn malformed(provider: &'static str, message: impl fmt::Display) -> ProviderError {
    ProviderError::Malformed {
        provider,
        message: message.to_string(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_parsing_is_lenient_about_case() {
        assert_eq!("QA".parse(), Ok(Task::Qa));
        assert_eq!("summarization".parse(), Ok(Task::Summarization));
        assert!("translate".parse::<Task>().is_err());
    }

    #[test]
    fn test_table_serializations() {
        let mut table = Table::new(["title", "status"]);
        table.push_row(["Vendor outage", "open"]);
        table.push_row(["Unpatched servers"]);

        assert_eq!(
            table.to_columns_json(),
            serde_json::json!({
                "title": ["Vendor outage", "Unpatched servers"],
                "status": ["open", ""],
            })
        );
        assert_eq!(
            table.to_text(),
            "title: Vendor outage; status: open\ntitle: Unpatched servers"
        );
    }

    #[test]
    fn test_sentinels_are_recognized() {
        assert!(is_sentinel("OpenAI not configured."));
        assert!(is_sentinel(" Task not supported.\n"));
        assert!(!is_sentinel("Risk levels are elevated."));
    }

    #[test]
    fn test_truncate_appends_ellipsis() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("abc", 3), "abc");
    }

    #[test]
    fn test_build_selects_configured_backend() {
        let mut config = ProviderConfig::default();
        for (kind, name, tables) in [
            (ProviderKind::DefaultChat, "OpenAI", false),
            (ProviderKind::AlternateChat, "DeepSeek", false),
            (ProviderKind::EnterpriseChat, "Azure OpenAI", false),
            (ProviderKind::GenerativeSingleShot, "Google AI Studio", false),
            (ProviderKind::Tabular, "Hugging Face", true),
        ] {
            config.kind = kind;
            let generator = build(&config).unwrap();
            assert_eq!(generator.name(), name);
            assert_eq!(generator.supports_tables(), tables);
        }
    }
}
