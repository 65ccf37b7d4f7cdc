//! Chat Completions transport shared by Azure OpenAI and OpenAI-compatible
//! endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::LlmError;
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
};
use crate::llm::{LlmBackend, LlmConfig};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Chat Completions client.
pub struct ChatCompletionsProvider {
    backend: LlmBackend,
    api_key: SecretString,
    model: String,
    url: String,
    api_version: Option<String>,
    http: reqwest::Client,
}

impl ChatCompletionsProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.expose_secret().is_empty() {
            return Err(LlmError::AuthFailed {
                provider: provider_name(config.backend).to_string(),
            });
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: provider_name(config.backend).to_string(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            backend: config.backend,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            url: completions_url(config.backend, &config.base_url, &config.model),
            api_version: config.api_version.clone(),
            http,
        })
    }

    fn provider(&self) -> &'static str {
        provider_name(self.backend)
    }

    fn build_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let mut body = json!({ "messages": request.messages });
        if self.backend == LlmBackend::OpenAi {
            body["model"] = json!(self.model);
        }
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        body
    }
}

fn provider_name(backend: LlmBackend) -> &'static str {
    match backend {
        LlmBackend::AzureOpenAi => "azure-openai",
        LlmBackend::OpenAi => "openai",
    }
}

/// Endpoint URL for a backend. Azure scopes by deployment; the api-version
/// goes into the query string at request time.
fn completions_url(backend: LlmBackend, base_url: &str, model: &str) -> String {
    let base = base_url.trim_end_matches('/');
    match backend {
        LlmBackend::AzureOpenAi => {
            format!("{base}/openai/deployments/{model}/chat/completions")
        }
        LlmBackend::OpenAi => format!("{base}/chat/completions"),
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
    #[serde(default)]
    error: Option<WireError>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct WireError {
    #[serde(default)]
    message: String,
}

/// Turn a chat-completions body into a `CompletionResponse`.
fn parse_response(provider: &str, raw: &str) -> Result<CompletionResponse, LlmError> {
    let wire: WireResponse = serde_json::from_str(raw)?;
    if let Some(error) = wire.error {
        let reason = if error.message.is_empty() {
            "Unbekannter API-Fehler".to_string()
        } else {
            error.message
        };
        return Err(LlmError::InvalidResponse {
            provider: provider.to_string(),
            reason,
        });
    }
    let choice = wire
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse {
            provider: provider.to_string(),
            reason: "response contained no choices".into(),
        })?;
    let usage = wire.usage.unwrap_or(WireUsage {
        prompt_tokens: 0,
        completion_tokens: 0,
    });
    Ok(CompletionResponse {
        content: choice.message.content.unwrap_or_default().trim().to_string(),
        input_tokens: usage.prompt_tokens,
        output_tokens: usage.completion_tokens,
        finish_reason: FinishReason::from_wire(choice.finish_reason.as_deref()),
    })
}

#[async_trait]
impl LlmProvider for ChatCompletionsProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.build_body(&request);
        let mut builder = self.http.post(&self.url).json(&body);
        builder = match self.backend {
            LlmBackend::AzureOpenAi => {
                let version = self.api_version.as_deref().unwrap_or_default();
                builder
                    .query(&[("api-version", version)])
                    .header("api-key", self.api_key.expose_secret())
            }
            LlmBackend::OpenAi => builder.bearer_auth(self.api_key.expose_secret()),
        };

        let response = builder.send().await.map_err(|e| LlmError::RequestFailed {
            provider: self.provider().to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(LlmError::AuthFailed {
                provider: self.provider().to_string(),
            });
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(LlmError::RateLimited {
                provider: self.provider().to_string(),
                retry_after,
            });
        }

        let raw = response.text().await.map_err(|e| LlmError::RequestFailed {
            provider: self.provider().to_string(),
            reason: format!("Leere Antwort: {e}"),
        })?;

        let parsed = parse_response(self.provider(), &raw)?;
        debug!(
            provider = self.provider(),
            status = status.as_u16(),
            input_tokens = parsed.input_tokens,
            output_tokens = parsed.output_tokens,
            "Completion received"
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn azure_url_is_deployment_scoped() {
        let url = completions_url(
            LlmBackend::AzureOpenAi,
            "https://res.openai.azure.com/",
            "gpt4o",
        );
        assert_eq!(
            url,
            "https://res.openai.azure.com/openai/deployments/gpt4o/chat/completions"
        );
    }

    #[test]
    fn openai_url_appends_path() {
        let url = completions_url(LlmBackend::OpenAi, "https://api.openai.com/v1", "gpt-4o");
        assert_eq!(url, "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn parse_response_extracts_first_choice() {
        let raw = r#"{
            "choices": [{"message": {"role": "assistant", "content": "  {\"action\": \"add_card\"}  "}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 12}
        }"#;
        let response = parse_response("azure-openai", raw).unwrap();
        assert_eq!(response.content, r#"{"action": "add_card"}"#);
        assert_eq!(response.input_tokens, 120);
        assert_eq!(response.output_tokens, 12);
        assert_eq!(response.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn parse_response_surfaces_api_error() {
        let raw = r#"{"error": {"code": "DeploymentNotFound", "message": "The deployment does not exist"}}"#;
        let err = parse_response("azure-openai", raw).unwrap_err();
        match err {
            LlmError::InvalidResponse { reason, .. } => {
                assert_eq!(reason, "The deployment does not exist");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_response_without_choices_fails() {
        let err = parse_response("openai", r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse { .. }));
    }

    #[test]
    fn body_includes_model_only_for_openai() {
        let request = CompletionRequest::new(vec![crate::llm::ChatMessage::user("hallo")])
            .with_max_tokens(1000)
            .with_temperature(0.3);

        let openai = ChatCompletionsProvider::new(&LlmConfig {
            backend: LlmBackend::OpenAi,
            api_key: SecretString::from("sk"),
            model: "gpt-4o-mini".into(),
            base_url: "https://api.openai.com/v1".into(),
            api_version: None,
        })
        .unwrap();
        let body = openai.build_body(&request);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0]["role"], "user");

        let azure = ChatCompletionsProvider::new(&LlmConfig {
            backend: LlmBackend::AzureOpenAi,
            api_key: SecretString::from("k"),
            model: "deployment".into(),
            base_url: "https://res.openai.azure.com/".into(),
            api_version: Some("2024-02-15-preview".into()),
        })
        .unwrap();
        assert!(azure.build_body(&request).get("model").is_none());
    }
}
