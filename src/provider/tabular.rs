//! Hugging Face inference for table question answering and summarization.
//!
//! Unsupported combinations (no table, or no recognized task) answer with
//! [`TASK_NOT_SUPPORTED`] instead of failing.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::ProviderConfig;
use crate::error::ProviderError;

use super::{
    ensure_success, malformed, non_blank, transport, GenerateRequest, Table, Task, TextGenerator,
    HUGGINGFACE_NOT_CONFIGURED, TASK_NOT_SUPPORTED,
};

const NAME: &str = "Hugging Face";

#[derive(Debug, Deserialize)]
struct QaAnswer {
    answer: String,
}

#[derive(Debug, Deserialize)]
struct Summary {
    summary_text: String,
}

/// Table-QA and summarization models on the Hugging Face inference API.
#[derive(Debug, Clone)]
pub struct HuggingFaceProvider {
    client: Client,
    base_url: String,
    qa_model: String,
    summarization_model: String,
    api_key: Option<String>,
}

impl HuggingFaceProvider {
    pub fn new(client: Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            base_url: config.huggingface_base_url.trim_end_matches('/').to_string(),
            qa_model: config.huggingface_qa_model.clone(),
            summarization_model: config.huggingface_summarization_model.clone(),
            api_key: non_blank(&config.huggingface_api_key).map(str::to_string),
        }
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        api_key: &str,
        model: &str,
        payload: serde_json::Value,
    ) -> Result<T, ProviderError> {
        let url = format!("{}/models/{}", self.base_url, model);
        tracing::debug!(provider = NAME, model, "Sending inference request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(transport(NAME))?;
        let response = ensure_success(NAME, response).await?;
        response.json().await.map_err(|e| malformed(NAME, e))
    }

    async fn answer(&self, api_key: &str, query: &str, table: &Table) -> Result<String, ProviderError> {
        let payload = json!({
            "inputs": {
                "query": query,
                "table": table.to_columns_json(),
            }
        });
        let body: QaAnswer = self.call(api_key, &self.qa_model, payload).await?;
        Ok(body.answer.trim().to_string())
    }

    async fn summarize(&self, api_key: &str, prompt: &str, table: &Table) -> Result<String, ProviderError> {
        let rows = table.to_text();
        let text = if prompt.trim().is_empty() {
            rows
        } else {
            format!("{}\n{}", prompt.trim(), rows)
        };
        let payload = json!({ "inputs": text });

        let body: Vec<Summary> = self
            .call(api_key, &self.summarization_model, payload)
            .await?;
        let summary = body
            .into_iter()
            .next()
            .ok_or_else(|| malformed(NAME, "response did not include a summary"))?;
        Ok(summary.summary_text.trim().to_string())
    }
}

#[async_trait]
impl TextGenerator for HuggingFaceProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn supports_tables(&self) -> bool {
        true
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, ProviderError> {
        let Some(api_key) = &self.api_key else {
            tracing::debug!(provider = NAME, "Provider not configured");
            return Ok(HUGGINGFACE_NOT_CONFIGURED.to_string());
        };

        match (request.task, &request.table) {
            (Some(Task::Qa), Some(table)) => self.answer(api_key, &request.prompt, table).await,
            (Some(Task::Summarization), Some(table)) => {
                self.summarize(api_key, &request.prompt, table).await
            }
            _ => Ok(TASK_NOT_SUPPORTED.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn risks() -> Table {
        let mut table = Table::new(["title", "status"]);
        table.push_row(["Vendor outage", "open"]);
        table.push_row(["Data leak", "closed"]);
        table
    }

    async fn configured(server: &MockServer) -> HuggingFaceProvider {
        let config = ProviderConfig {
            huggingface_api_key: Some("hf-key".to_string()),
            huggingface_base_url: server.uri(),
            ..ProviderConfig::default()
        };
        HuggingFaceProvider::new(Client::new(), &config)
    }

    #[tokio::test]
    async fn test_qa_sends_column_major_table() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/google/tapas-large-finetuned-wtq"))
            .and(header("authorization", "Bearer hf-key"))
            .and(body_json(json!({
                "inputs": {
                    "query": "Which risks are open?",
                    "table": {
                        "title": ["Vendor outage", "Data leak"],
                        "status": ["open", "closed"],
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "answer": "Vendor outage",
                "coordinates": [[0, 0]],
                "cells": ["Vendor outage"],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = configured(&server)
            .await
            .generate(&GenerateRequest::tabular("Which risks are open?", risks(), Task::Qa))
            .await
            .unwrap();
        assert_eq!(text, "Vendor outage");
    }

    #[tokio::test]
    async fn test_summarization_serializes_table_to_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/facebook/bart-large-cnn"))
            .and(body_json(json!({
                "inputs": "Summarize these risks.\ntitle: Vendor outage; status: open\ntitle: Data leak; status: closed"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{ "summary_text": "One open risk remains." }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let text = configured(&server)
            .await
            .generate(&GenerateRequest::tabular(
                "Summarize these risks.",
                risks(),
                Task::Summarization,
            ))
            .await
            .unwrap();
        assert_eq!(text, "One open risk remains.");
    }

    // Deliberately lenient: unsupported input degrades to a sentinel, not an error.
    #[tokio::test]
    async fn test_unsupported_combinations_return_sentinel() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let provider = configured(&server).await;

        let no_table = GenerateRequest {
            prompt: "Summarize".to_string(),
            table: None,
            task: Some(Task::Summarization),
        };
        let no_task = GenerateRequest {
            prompt: "Summarize".to_string(),
            table: Some(risks()),
            task: None,
        };
        for request in [no_table, no_task, GenerateRequest::text("hi")] {
            assert_eq!(provider.generate(&request).await.unwrap(), TASK_NOT_SUPPORTED);
        }
    }

    #[tokio::test]
    async fn test_missing_key_returns_sentinel() {
        let provider = HuggingFaceProvider::new(Client::new(), &ProviderConfig::default());
        let text = provider
            .generate(&GenerateRequest::tabular("q", risks(), Task::Qa))
            .await
            .unwrap();
        assert_eq!(text, HUGGINGFACE_NOT_CONFIGURED);
    }

    #[tokio::test]
    async fn test_model_loading_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(503)
                    .set_body_json(json!({ "error": "Model is currently loading" })),
            )
            .mount(&server)
            .await;

        let err = configured(&server)
            .await
            .generate(&GenerateRequest::tabular("q", risks(), Task::Summarization))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 503, .. }));
    }
}
