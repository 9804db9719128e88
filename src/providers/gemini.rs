use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::ProviderError;
use crate::providers::Provider;

/// Default public Gemini API endpoint
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Gemini client for the generateContent API
#[derive(Debug)]
pub struct Gemini {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to the public API)
    endpoint: String,
}

/// Gemini generateContent request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    /// The model to use, kept out of the body (it is part of the URL)
    #[serde(skip)]
    model: String,

    /// System instruction guiding tone and context
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,

    /// The conversation contents
    contents: Vec<GeminiContent>,

    /// Generation parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// One content block (role plus text parts)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiContent {
    /// Role of the content ("user" or "model"); absent on system instructions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Text parts
    pub parts: Vec<GeminiPart>,
}

/// A single text part
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiPart {
    /// The text payload
    pub text: String,
}

/// Generation parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Response MIME type; plain text for translation
    pub response_mime_type: String,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Gemini generateContent response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    /// Generated candidates; empty when generation was blocked outright
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,

    /// Feedback about the prompt itself (input-side safety filtering)
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// One generated candidate
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    /// Generated content; may be absent when the candidate was cut off
    #[serde(default)]
    pub content: Option<GeminiContent>,

    /// Why generation stopped ("STOP", "SAFETY", "MAX_TOKENS", ...)
    #[serde(default)]
    pub finish_reason: Option<String>,

    /// Safety ratings attached to the candidate
    #[serde(default)]
    pub safety_ratings: Vec<SafetyRating>,
}

/// Input-side safety feedback
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Block reason when the prompt was rejected
    #[serde(default)]
    pub block_reason: Option<String>,

    /// Safety ratings for the prompt
    #[serde(default)]
    pub safety_ratings: Vec<SafetyRating>,
}

/// One safety rating entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyRating {
    /// Harm category name
    pub category: String,

    /// Whether this category caused a block
    #[serde(default)]
    pub blocked: bool,
}

impl GeminiRequest {
    /// Create a new request for the given model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_instruction: None,
            contents: Vec::new(),
            generation_config: Some(GenerationConfig {
                response_mime_type: "text/plain".to_string(),
                temperature: None,
            }),
        }
    }

    /// Set the system instruction
    pub fn system_instruction(mut self, text: impl Into<String>) -> Self {
        self.system_instruction = Some(GeminiContent {
            role: None,
            parts: vec![GeminiPart { text: text.into() }],
        });
        self
    }

    /// Add a user message
    pub fn user_text(mut self, text: impl Into<String>) -> Self {
        self.contents.push(GeminiContent {
            role: Some("user".to_string()),
            parts: vec![GeminiPart { text: text.into() }],
        });
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        if let Some(config) = self.generation_config.as_mut() {
            config.temperature = Some(temperature);
        }
        self
    }

    /// Model this request targets
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl GeminiResponse {
    /// True when the prompt itself was rejected by the safety filter
    pub fn prompt_blocked(&self) -> bool {
        self.prompt_feedback.as_ref().is_some_and(|fb| {
            fb.block_reason.is_some() || fb.safety_ratings.iter().any(|r| r.blocked)
        })
    }

    /// Categories that caused a prompt-side block
    pub fn prompt_block_categories(&self) -> Vec<String> {
        self.prompt_feedback
            .as_ref()
            .map(|fb| {
                fb.safety_ratings
                    .iter()
                    .filter(|r| r.blocked)
                    .map(|r| r.category.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First candidate, if any was generated
    pub fn first_candidate(&self) -> Option<&GeminiCandidate> {
        self.candidates.first()
    }
}

impl Gemini {
    /// Create a new Gemini client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        let endpoint = endpoint.into();
        let endpoint = if endpoint.is_empty() {
            DEFAULT_GEMINI_ENDPOINT.to_string()
        } else {
            endpoint
        };

        // Fail early on an unparseable endpoint instead of on the first request
        Url::parse(&endpoint)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint '{}': {}", endpoint, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint,
        })
    }

    fn request_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.endpoint.trim_end_matches('/'),
            model,
            self.api_key
        )
    }
}

#[async_trait]
impl Provider for Gemini {
    type Request = GeminiRequest;
    type Response = GeminiResponse;

    async fn complete(&self, request: GeminiRequest) -> Result<GeminiResponse, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::AuthenticationError(
                "Gemini API key is empty".to_string(),
            ));
        }

        let url = self.request_url(request.model());

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to send request to Gemini API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        response
            .json::<GeminiResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Gemini API response: {}", e)))
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let request = GeminiRequest::new("gemini-2.0-flash").user_text("Hello");
        self.complete(request).await?;
        Ok(())
    }

    fn extract_text(response: &GeminiResponse) -> String {
        response
            .first_candidate()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}
