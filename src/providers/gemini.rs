//! Google Gemini generateContent backend. Key differences from the
//! chat-completion shape:
//! - Uses `contents` with `parts` instead of `messages` with `content`.
//! - Sampling parameters live under `generationConfig`, with `max_tokens`
//!   spelled `maxOutputTokens` and `top_p` spelled `topP`.
//! - Reply text sits at `candidates[0].content.parts[0].text`.
//! - The API key is a `?key=` query parameter, not a header.
//!
//! The same struct doubles as the image-capable backend: with
//! `responseModalities` requested, parts may carry `inlineData` objects
//! holding a MIME type and a base64 payload.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{truncate_body, GenerationProvider};
use crate::config::{ImageBackendConfig, ProviderConfig, SamplingParams};
use crate::{Error, Result};

/// An inline image part from a mixed text/image reply, still base64-coded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

pub struct GeminiProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    sampling: SamplingParams,
}

impl GeminiProvider {
    /// Text-generation backend from the provider configuration.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Self::build(
            &config.base_url,
            &config.api_key,
            &config.model,
            config.sampling,
            config.timeout,
        )
    }

    /// Image-capable backend from the image configuration.
    pub fn image_backend(config: &ImageBackendConfig) -> Result<Self> {
        Self::build(
            &config.api_base,
            &config.api_key,
            &config.model,
            config.sampling,
            config.timeout,
        )
    }

    fn build(
        api_base: &str,
        api_key: &str,
        model: &str,
        sampling: SamplingParams,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            sampling,
        })
    }

    fn generation_config(&self) -> Value {
        json!({
            "temperature": self.sampling.temperature,
            "topP": self.sampling.top_p,
            "maxOutputTokens": self.sampling.max_tokens,
        })
    }

    async fn invoke(&self, body: &Value) -> Result<Value> {
        let url = format!(
            "{}/v1beta/{}:generateContent?key={}",
            self.api_base, self.model, self.api_key
        );
        let resp = self.client.post(&url).json(body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(Error::provider(
                "gemini",
                format!("HTTP {status}: {}", truncate_body(&text)),
            ));
        }
        serde_json::from_str(&text)
            .map_err(|e| Error::provider("gemini", format!("malformed reply: {e}")))
    }

    /// Ask for a mixed text/image reply and return the first inline image
    /// part, if the model produced one. `image_only` restricts the reply
    /// modalities to images, used for the last-resort attempt.
    pub async fn generate_with_image(
        &self,
        prompt: &str,
        image_only: bool,
    ) -> Result<Option<InlineImage>> {
        let modalities = if image_only {
            json!(["IMAGE"])
        } else {
            json!(["TEXT", "IMAGE"])
        };
        let mut gen_config = self.generation_config();
        gen_config["responseModalities"] = modalities;
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": gen_config,
        });
        debug!(model = %self.model, image_only, "sending image generation request");

        let reply = self.invoke(&body).await?;
        Ok(extract_inline_image(&reply))
    }
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": self.generation_config(),
        });
        debug!(model = %self.model, "sending generateContent request");

        let reply = self.invoke(&body).await?;
        reply
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| {
                Error::provider("gemini", "reply missing candidates[0].content.parts[0].text")
            })
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/v1beta/models?key={}", self.api_base, self.api_key);
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(Error::provider(
                "gemini",
                format!("HTTP {status}: {}", truncate_body(&text)),
            ));
        }
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| Error::provider("gemini", format!("malformed model list: {e}")))?;
        let models = value
            .pointer("/models")
            .and_then(|m| m.as_array())
            .map(|rows| {
                rows.iter()
                    .filter_map(|m| m.get("name").and_then(|n| n.as_str()))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Ok(models)
    }
}

/// Scan the reply's candidate parts for inline binary data. Accepts both
/// the REST casing (`inlineData`/`mimeType`) and the snake_case variant
/// some gateways emit.
fn extract_inline_image(reply: &Value) -> Option<InlineImage> {
    let parts = reply.pointer("/candidates/0/content/parts")?.as_array()?;
    for part in parts {
        let Some(inline) = part.get("inlineData").or_else(|| part.get("inline_data")) else {
            continue;
        };
        let mime_type = inline
            .get("mimeType")
            .or_else(|| inline.get("mime_type"))
            .and_then(|m| m.as_str())
            .unwrap_or("image/png")
            .to_string();
        if let Some(data) = inline.get("data").and_then(|d| d.as_str()) {
            return Some(InlineImage {
                mime_type,
                data: data.to_string(),
            });
        }
    }
    None
}
