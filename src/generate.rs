//! Request-to-content pipeline.
//!
//! The single entry point the HTTP layer calls: normalize the path, probe
//! the cache, and on a miss run prompt construction, provider dispatch,
//! reply parsing, HTML post-processing, optional image enrichment, and
//! cache persistence. Image-typed paths bypass text generation entirely.

use tracing::{info, warn};

use crate::cache::CacheStore;
use crate::config::AppConfig;
use crate::html::process_html;
use crate::imagegen::ImageSynthesizer;
use crate::path::RequestPath;
use crate::prompt::{build_prompt, FormFields};
use crate::providers::{create_provider, GenerationProvider};
use crate::reply::{parse_reply, Body, GeneratedResponse};
use crate::Result;

pub struct ContentPipeline {
    provider: Box<dyn GenerationProvider>,
    images: ImageSynthesizer,
    cache: CacheStore,
}

impl ContentPipeline {
    pub fn new(
        provider: Box<dyn GenerationProvider>,
        images: ImageSynthesizer,
        cache: CacheStore,
    ) -> Self {
        Self {
            provider,
            images,
            cache,
        }
    }

    /// Assemble the pipeline from process configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let provider = create_provider(&config.provider)?;
        let images = ImageSynthesizer::new(config.image_backend.as_ref());
        let cache = CacheStore::new(&config.cache_root)?;
        Ok(Self::new(provider, images, cache))
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Serve a request path: cache hit when allowed, generation otherwise.
    ///
    /// Provider and protocol failures propagate to the caller; a failed
    /// cache save degrades to "generated but not persisted" and the caller
    /// still receives the content.
    pub async fn respond(
        &self,
        raw_path: &str,
        form: Option<&FormFields>,
        use_cache: bool,
    ) -> Result<GeneratedResponse> {
        let path = RequestPath::normalize(raw_path);

        if use_cache {
            if let Some((content_type, bytes)) = self.cache.load(&path) {
                info!(path = %path, "serving from cache");
                return Ok(GeneratedResponse::bytes(content_type, bytes));
            }
        }

        let response = self.generate(raw_path, &path, form).await?;

        if use_cache && !self.cache.save(&path, &response.content_type, response.body.as_bytes())
        {
            warn!(path = %path, "response generated but not persisted");
        }

        Ok(response)
    }

    async fn generate(
        &self,
        raw_path: &str,
        path: &RequestPath,
        form: Option<&FormFields>,
    ) -> Result<GeneratedResponse> {
        if path.is_image_path() {
            info!(path = %path, "generating image");
            let (bytes, mime) = self
                .images
                .generate(&path.subject(), path.extension().as_deref())
                .await?;
            return Ok(GeneratedResponse::bytes(mime, bytes));
        }

        let prompt = build_prompt(raw_path, form);
        info!(path = %path, provider = self.provider.name(), "generating content");
        let raw = self.provider.generate(&prompt).await?;
        let mut response = parse_reply(&raw)?;

        if response.is_html() {
            if let Some(payload) = response.body.as_text() {
                let processed = process_html(payload, path);
                let enriched = self
                    .images
                    .embed_illustration(&processed, path, &self.cache)
                    .await;
                response.body = Body::Text(enriched);
            }
        }

        Ok(response)
    }
}
