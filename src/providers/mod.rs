//! Pluggable generation backends.
//!
//! Every backend implements one capability: send a prompt, return the raw
//! model text. Response-protocol parsing happens elsewhere, so a new
//! provider only needs to speak its own wire format. Selection is a
//! configuration-time choice made once by [`create_provider`]; the rest of
//! the pipeline works through `Box<dyn GenerationProvider>`.

pub mod chat;
pub mod gemini;

use async_trait::async_trait;

use crate::config::{ProviderConfig, ProviderKind};
use crate::Result;

pub use chat::ChatCompletionProvider;
pub use gemini::{GeminiProvider, InlineImage};

/// Interface to a hosted model that completes a prompt with raw text.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Short identifier used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Send the prompt and return the raw reply text, unparsed.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// List model identifiers available at this backend.
    async fn list_models(&self) -> Result<Vec<String>>;
}

/// Construct the configured backend.
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn GenerationProvider>> {
    match config.kind {
        ProviderKind::OpenRouter => Ok(Box::new(ChatCompletionProvider::open_router(config)?)),
        ProviderKind::OpenAiCompatible => {
            Ok(Box::new(ChatCompletionProvider::openai_compatible(config)?))
        }
        ProviderKind::Gemini => Ok(Box::new(GeminiProvider::new(config)?)),
    }
}

/// Bound error-message snippets taken from provider reply bodies.
pub(crate) fn truncate_body(body: &str) -> String {
    const LIMIT: usize = 200;
    if body.len() <= LIMIT {
        body.to_string()
    } else {
        let mut end = LIMIT;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    }
}
