use crate::traits::CompletionProvider;
use crate::GenerationError;
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub prompt: String,
    pub system_instruction: Option<String>,
    pub temperature: Option<f32>,
    pub json_output: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    Completed(String),
    RateLimited { retry_after_secs: Option<u64> },
    Failed { status: Option<u16>, message: String },
}

impl CompletionOutcome {
    pub fn into_text(self) -> Result<String, GenerationError> {
        match self {
            Self::Completed(text) => Ok(text),
            Self::RateLimited { retry_after_secs } => {
                Err(GenerationError::RateLimited { retry_after_secs })
            }
            Self::Failed { status, message } => Err(GenerationError::Provider(match status {
                Some(code) => format!("status {code}: {message}"),
                None => message,
            })),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn generate_url(&self) -> Result<Url, GenerationError> {
        let mut base = self.endpoint.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Url::parse(&base)?.join(&format!("v1beta/models/{}:generateContent", self.model))?)
    }
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

impl<'a> From<&'a CompletionRequest> for GenerateContentRequest<'a> {
    fn from(request: &'a CompletionRequest) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            system_instruction: request.system_instruction.as_deref().map(|text| Content {
                parts: vec![Part { text }],
            }),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                response_mime_type: request.json_output.then_some("application/json"),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Maps an HTTP status, optional `Retry-After` value and body onto an outcome.
pub fn decode_generate_response(
    status: u16,
    retry_after: Option<&str>,
    body: &str,
) -> Result<CompletionOutcome, GenerationError> {
    if status == StatusCode::TOO_MANY_REQUESTS.as_u16() {
        return Ok(CompletionOutcome::RateLimited {
            retry_after_secs: retry_after.and_then(|value| value.trim().parse().ok()),
        });
    }

    if !(200..300).contains(&status) {
        return Ok(CompletionOutcome::Failed {
            status: Some(status),
            message: body.trim().to_string(),
        });
    }

    let response: GenerateContentResponse = serde_json::from_str(body)?;
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Ok(CompletionOutcome::Failed {
            status: Some(status),
            message: "response had no candidate text".to_string(),
        });
    }

    Ok(CompletionOutcome::Completed(text))
}

pub struct GeminiProvider {
    client: Arc<Client>,
    config: GeminiConfig,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        if config.api_key.trim().is_empty() {
            return Err(GenerationError::MissingCredentials(
                "gemini api key is empty".to_string(),
            ));
        }

        Ok(Self {
            client: Arc::new(Client::new()),
            config,
        })
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionOutcome, GenerationError> {
        let url = self.config.generate_url()?;
        debug!(model = %self.config.model, prompt_chars = request.prompt.len(), "sending completion request");

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&GenerateContentRequest::from(request))
            .send()
            .await?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        let outcome = decode_generate_response(status, retry_after.as_deref(), &body)?;
        match &outcome {
            CompletionOutcome::Completed(text) => {
                info!(status, chars = text.len(), "completion received")
            }
            CompletionOutcome::RateLimited { retry_after_secs } => {
                warn!(?retry_after_secs, "completion rate limited")
            }
            CompletionOutcome::Failed { status, message } => {
                warn!(?status, %message, "completion failed")
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_url_targets_model() -> Result<(), GenerationError> {
        let config = GeminiConfig {
            endpoint: "http://localhost:8080".to_string(),
            ..GeminiConfig::new("key")
        };
        assert_eq!(
            config.generate_url()?.as_str(),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
        Ok(())
    }

    #[test]
    fn request_body_uses_camel_case_fields() -> Result<(), GenerationError> {
        let request = CompletionRequest {
            prompt: "Gere uma questão".to_string(),
            system_instruction: Some("Você é um especialista".to_string()),
            temperature: Some(0.7),
            json_output: true,
        };
        let body = serde_json::to_value(GenerateContentRequest::from(&request))?;
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Gere uma questão");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Você é um especialista");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        Ok(())
    }

    #[test]
    fn plain_request_omits_optional_fields() -> Result<(), GenerationError> {
        let request = CompletionRequest {
            prompt: "oi".to_string(),
            ..CompletionRequest::default()
        };
        let body = serde_json::to_value(GenerateContentRequest::from(&request))?;
        assert!(body.get("systemInstruction").is_none());
        assert!(body["generationConfig"].get("temperature").is_none());
        Ok(())
    }

    #[test]
    fn successful_response_concatenates_parts() -> Result<(), GenerationError> {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"[{\"stem\":"},{"text":"\"x\"}]"}]}}]}"#;
        assert_eq!(
            decode_generate_response(200, None, body)?,
            CompletionOutcome::Completed(r#"[{"stem":"x"}]"#.to_string())
        );
        Ok(())
    }

    #[test]
    fn rate_limit_is_a_distinct_outcome() -> Result<(), GenerationError> {
        assert_eq!(
            decode_generate_response(429, Some("30"), "quota")?,
            CompletionOutcome::RateLimited {
                retry_after_secs: Some(30)
            }
        );
        let error = decode_generate_response(429, None, "")?.into_text();
        assert!(matches!(
            error,
            Err(GenerationError::RateLimited {
                retry_after_secs: None
            })
        ));
        Ok(())
    }

    #[test]
    fn error_status_and_empty_candidates_fail() -> Result<(), GenerationError> {
        assert!(matches!(
            decode_generate_response(500, None, "boom")?,
            CompletionOutcome::Failed {
                status: Some(500),
                ..
            }
        ));
        assert!(matches!(
            decode_generate_response(200, None, r#"{"candidates":[]}"#)?,
            CompletionOutcome::Failed { .. }
        ));
        Ok(())
    }

    #[test]
    fn malformed_success_body_is_a_serialization_error() {
        assert!(matches!(
            decode_generate_response(200, None, "not json"),
            Err(GenerationError::Serialization(_))
        ));
    }

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(matches!(
            GeminiProvider::new(GeminiConfig::new("  ")),
            Err(GenerationError::MissingCredentials(_))
        ));
    }
}
