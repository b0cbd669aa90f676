//! Chat-completion backends.
//!
//! One implementation covers both chat-completion flavors: the hosted
//! multi-model gateway (OpenRouter, which wants attribution headers) and
//! any OpenAI-compatible endpoint such as LM Studio or LocalAI. The wire
//! shape is identical: `POST {base_url}/chat/completions` with a
//! single-turn message list, reply text at `choices[0].message.content`.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{truncate_body, GenerationProvider};
use crate::config::{ProviderConfig, SamplingParams};
use crate::{Error, Result};

pub struct ChatCompletionProvider {
    name: &'static str,
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    sampling: SamplingParams,
    extra_headers: Vec<(&'static str, &'static str)>,
}

impl ChatCompletionProvider {
    /// Backend for the hosted OpenRouter gateway.
    pub fn open_router(config: &ProviderConfig) -> Result<Self> {
        Self::build(
            "openrouter",
            config,
            vec![
                ("HTTP-Referer", "https://github.com/infiniweb"),
                ("X-Title", "Infinite AI Web"),
            ],
        )
    }

    /// Backend for a local or hosted OpenAI-compatible endpoint.
    pub fn openai_compatible(config: &ProviderConfig) -> Result<Self> {
        Self::build("openai", config, Vec::new())
    }

    fn build(
        name: &'static str,
        config: &ProviderConfig,
        extra_headers: Vec<(&'static str, &'static str)>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            name,
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            sampling: config.sampling,
            extra_headers,
        })
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        let mut req = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body);
        for (k, v) in &self.extra_headers {
            req = req.header(*k, *v);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(Error::provider(
                self.name,
                format!("HTTP {status}: {}", truncate_body(&text)),
            ));
        }
        serde_json::from_str(&text)
            .map_err(|e| Error::provider(self.name, format!("malformed reply: {e}")))
    }
}

#[async_trait]
impl GenerationProvider for ChatCompletionProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.sampling.temperature,
            "max_tokens": self.sampling.max_tokens,
            "top_p": self.sampling.top_p,
        });
        debug!(provider = self.name, model = %self.model, "sending chat completion request");

        let reply = self
            .post_json(&format!("{}/chat/completions", self.base_url), &body)
            .await?;

        reply
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| {
                Error::provider(self.name, "reply missing choices[0].message.content")
            })
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let resp = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(Error::provider(
                self.name,
                format!("HTTP {status}: {}", truncate_body(&text)),
            ));
        }
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| Error::provider(self.name, format!("malformed model list: {e}")))?;
        let models = value
            .pointer("/data")
            .and_then(|d| d.as_array())
            .map(|rows| {
                rows.iter()
                    .filter_map(|m| m.get("id").and_then(|id| id.as_str()))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Ok(models)
    }
}
