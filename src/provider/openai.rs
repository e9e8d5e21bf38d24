//! Chat-completion backends: OpenAI, DeepSeek and Azure OpenAI.
//!
//! All three speak the same request and response shape; they differ in
//! endpoint layout and in how the credential is presented.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::ProviderConfig;
use crate::error::ProviderError;

use super::{
    ensure_success, malformed, non_blank, transport, GenerateRequest, TextGenerator,
    AZURE_NOT_CONFIGURED, DEEPSEEK_NOT_CONFIGURED, OPENAI_NOT_CONFIGURED,
};

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone)]
enum Auth {
    Bearer(String),
    /// Azure expects the key in an `api-key` header.
    ApiKeyHeader(String),
}

#[derive(Debug, Clone)]
struct ChatTarget {
    url: String,
    auth: Auth,
    /// Azure routes by deployment and takes no model in the body.
    model: Option<String>,
}

/// Single-turn chat completion against an OpenAI-shaped API.
#[derive(Debug, Clone)]
pub struct ChatProvider {
    name: &'static str,
    not_configured: &'static str,
    client: Client,
    target: Option<ChatTarget>,
}

impl ChatProvider {
    /// OpenAI; needs `openai_api_key`.
    pub fn openai(client: Client, config: &ProviderConfig) -> Self {
        let target = non_blank(&config.openai_api_key).map(|key| ChatTarget {
            url: format!(
                "{}/chat/completions",
                config.openai_base_url.trim_end_matches('/')
            ),
            auth: Auth::Bearer(key.to_string()),
            model: Some(config.openai_model.clone()),
        });
        Self {
            name: "OpenAI",
            not_configured: OPENAI_NOT_CONFIGURED,
            client,
            target,
        }
    }

    /// DeepSeek; needs `deepseek_api_key`.
    pub fn deepseek(client: Client, config: &ProviderConfig) -> Self {
        let target = non_blank(&config.deepseek_api_key).map(|key| ChatTarget {
            url: format!(
                "{}/chat/completions",
                config.deepseek_base_url.trim_end_matches('/')
            ),
            auth: Auth::Bearer(key.to_string()),
            model: Some(config.deepseek_model.clone()),
        });
        Self {
            name: "DeepSeek",
            not_configured: DEEPSEEK_NOT_CONFIGURED,
            client,
            target,
        }
    }

    /// Azure OpenAI; needs key, endpoint and deployment.
    pub fn azure(client: Client, config: &ProviderConfig) -> Self {
        let target = match (
            non_blank(&config.azure_openai_key),
            non_blank(&config.azure_openai_endpoint),
            non_blank(&config.azure_openai_deployment),
        ) {
            (Some(key), Some(endpoint), Some(deployment)) => Some(ChatTarget {
                url: format!(
                    "{}/openai/deployments/{}/chat/completions?api-version={}",
                    endpoint.trim_end_matches('/'),
                    deployment,
                    config.azure_api_version
                ),
                auth: Auth::ApiKeyHeader(key.to_string()),
                model: None,
            }),
            _ => None,
        };
        Self {
            name: "Azure OpenAI",
            not_configured: AZURE_NOT_CONFIGURED,
            client,
            target,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.target.is_some()
    }
}

#[async_trait]
impl TextGenerator for ChatProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, ProviderError> {
        let Some(target) = &self.target else {
            tracing::debug!(provider = self.name, "Provider not configured");
            return Ok(self.not_configured.to_string());
        };

        let mut payload = json!({
            "messages": [
                {
                    "role": "user",
                    "content": request.prompt,
                }
            ],
        });
        if let Some(model) = &target.model {
            payload["model"] = json!(model);
        }

        let builder = self.client.post(&target.url).json(&payload);
        let builder = match &target.auth {
            Auth::Bearer(key) => builder.bearer_auth(key),
            Auth::ApiKeyHeader(key) => builder.header("api-key", key),
        };

        tracing::debug!(provider = self.name, "Sending chat completion request");
        let response = builder.send().await.map_err(transport(self.name))?;
        let response = ensure_success(self.name, response).await?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| malformed(self.name, e))?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| malformed(self.name, "response did not include choices"))?;

        Ok(choice.message.content.unwrap_or_default().trim().to_string())
    }
}
