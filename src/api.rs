//! Generative model interaction.
//!
//! This module provides the interface the pipeline uses to talk to the
//! generative model, plus its Gemini implementation.
//!
//! # Architecture
//!
//! - [`GenerativeModel`]: Core trait for text and image generation
//! - [`GeminiClient`]: Implementation backed by the Gemini `generateContent` REST API
//!
//! Every call is a single attempt. Callers decide whether a failure is fatal
//! (drafting, topic synthesis) or degrades to a fallback (fact-check, hero image).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, instrument, warn};

use crate::config::GeminiSettings;
use crate::error::{Error, Result};

/// Trait for async generative model interaction.
///
/// Implementors turn a prompt into either markdown/plain text or raw image
/// bytes. The pipeline is generic over this trait so it can run against a
/// scripted model in tests.
pub trait GenerativeModel {
    /// Generate text for `prompt`.
    ///
    /// When `grounded` is set the model may consult web search to stay current.
    async fn generate_text(&self, prompt: &str, grounded: bool) -> Result<String>;

    /// Generate an image for `prompt` and return its decoded bytes.
    ///
    /// Fails if the response carries no part with an `image/*` media type.
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>>;
}

// --- Gemini wire types ---

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<GeminiInlineData>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GeminiInlineData {
    pub mime_type: String,
    /// Base64 payload.
    pub data: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
}

#[derive(Deserialize, Debug)]
pub struct GeminiCandidate {
    pub content: Option<GeminiContent>,
}

#[derive(Deserialize, Debug)]
pub struct GeminiResponse {
    pub candidates: Option<Vec<GeminiCandidate>>,
    pub error: Option<GeminiError>,
}

#[derive(Deserialize, Debug)]
pub struct GeminiError {
    pub message: String,
}

impl GeminiRequest {
    fn user_prompt(prompt: &str) -> Self {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                    inline_data: None,
                }],
            }],
            tools: Vec::new(),
            generation_config: None,
        }
    }
}

impl GeminiResponse {
    fn into_parts(self) -> Result<Vec<GeminiPart>> {
        if let Some(error) = self.error {
            return Err(Error::Model(format!("Gemini API error: {}", error.message)));
        }
        self.candidates
            .and_then(|candidates| candidates.into_iter().next())
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .ok_or_else(|| Error::Model("No content returned from Gemini".to_string()))
    }
}

/// Concatenate the text parts of a response.
fn collect_text(parts: &[GeminiPart]) -> Option<String> {
    let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
    (!text.is_empty()).then_some(text)
}

/// Decode the first part whose media type is an image.
fn first_image(parts: &[GeminiPart]) -> Result<Vec<u8>> {
    let inline = parts
        .iter()
        .filter_map(|p| p.inline_data.as_ref())
        .find(|d| d.mime_type.starts_with("image/"))
        .ok_or_else(|| Error::Model("Gemini response did not contain inline image data".into()))?;

    STANDARD
        .decode(inline.data.trim())
        .map_err(|e| Error::Model(format!("invalid base64 image payload: {e}")))
}

/// Gemini REST client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    settings: GeminiSettings,
}

impl GeminiClient {
    pub fn new(http: Client, settings: GeminiSettings) -> Self {
        Self { http, settings }
    }

    #[instrument(level = "info", skip_all, fields(model = %model))]
    async fn generate_content(
        &self,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<Vec<GeminiPart>> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            model
        );

        let t0 = Instant::now();
        let res = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.settings.api_key)
            .json(request)
            .send()
            .await?;

        let status = res.status();
        debug!(
            %status,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Gemini API response received"
        );

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%status, "Gemini API call failed");
            return Err(Error::Model(format!("Gemini API returned {status}: {body}")));
        }

        res.json::<GeminiResponse>().await?.into_parts()
    }
}

impl GenerativeModel for GeminiClient {
    async fn generate_text(&self, prompt: &str, grounded: bool) -> Result<String> {
        let mut request = GeminiRequest::user_prompt(prompt);
        if grounded {
            request.tools.push(serde_json::json!({ "google_search": {} }));
        }

        let parts = self
            .generate_content(&self.settings.text_model, &request)
            .await?;
        collect_text(&parts).ok_or_else(|| Error::Model("Gemini returned no text".to_string()))
    }

    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>> {
        let mut request = GeminiRequest::user_prompt(prompt);
        request.generation_config = Some(GenerationConfig {
            response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
        });

        let parts = self
            .generate_content(&self.settings.image_model, &request)
            .await?;
        first_image(&parts)
    }
}
