//! Google AI Studio single-shot generation.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::ProviderConfig;
use crate::error::ProviderError;

use super::{
    ensure_success, malformed, non_blank, transport, GenerateRequest, TextGenerator,
    GOOGLE_NOT_CONFIGURED,
};

const NAME: &str = "Google AI Studio";

/// `generateContent` call against a Gemini model.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiProvider {
    pub fn new(client: Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            base_url: config.google_base_url.trim_end_matches('/').to_string(),
            model: config.google_model.clone(),
            api_key: non_blank(&config.google_api_key).map(str::to_string),
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, ProviderError> {
        let Some(api_key) = &self.api_key else {
            tracing::debug!(provider = NAME, "Provider not configured");
            return Ok(GOOGLE_NOT_CONFIGURED.to_string());
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let payload = json!({
            "contents": [
                {
                    "parts": [
                        { "text": request.prompt }
                    ]
                }
            ]
        });

        tracing::debug!(provider = NAME, model = %self.model, "Sending generateContent request");
        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&payload)
            .send()
            .await
            .map_err(transport(NAME))?;
        let response = ensure_success(NAME, response).await?;

        let body: Value = response.json().await.map_err(|e| malformed(NAME, e))?;

        let parts = body["candidates"]
            .as_array()
            .and_then(|candidates| candidates.first())
            .and_then(|candidate| candidate["content"]["parts"].as_array())
            .ok_or_else(|| malformed(NAME, "response did not include candidates"))?;

        Ok(parts
            .iter()
            .filter_map(|part| part["text"].as_str())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_missing_key_returns_sentinel() {
        let provider = GeminiProvider::new(Client::new(), &ProviderConfig::default());
        let text = provider
            .generate(&GenerateRequest::text("hello"))
            .await
            .unwrap();
        assert_eq!(text, GOOGLE_NOT_CONFIGURED);
    }

    #[tokio::test]
    async fn test_joins_candidate_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-pro:generateContent"))
            .and(query_param("key", "g-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [
                    { "content": { "parts": [ { "text": "Risk is rising." }, { "text": "Review vendors." } ] } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = ProviderConfig {
            google_api_key: Some("g-key".to_string()),
            google_base_url: server.uri(),
            ..ProviderConfig::default()
        };
        let text = GeminiProvider::new(Client::new(), &config)
            .generate(&GenerateRequest::text("Summarize"))
            .await
            .unwrap();
        assert_eq!(text, "Risk is rising.\nReview vendors.");
    }

    #[tokio::test]
    async fn test_missing_candidates_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "promptFeedback": {} })))
            .mount(&server)
            .await;

        let config = ProviderConfig {
            google_api_key: Some("g-key".to_string()),
            google_base_url: server.uri(),
            ..ProviderConfig::default()
        };
        let err = GeminiProvider::new(Client::new(), &config)
            .generate(&GenerateRequest::text("Summarize"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Malformed { provider: NAME, .. }));
    }
}
