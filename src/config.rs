//! Process configuration.
//!
//! All knobs are read from the environment once at startup into immutable
//! structs and passed explicitly to the components that need them. Nothing
//! here is re-read after initialization.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::{Error, Result};

const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_OPENAI_BASE_URL: &str = "http://localhost:1234/v1";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

const DEFAULT_OPENROUTER_MODEL: &str = "meta-llama/llama-3.1-70b-instruct";
const DEFAULT_OPENAI_MODEL: &str = "local-model";
const DEFAULT_GEMINI_MODEL: &str = "models/gemini-2.0-flash-exp";
const DEFAULT_GEMINI_IMAGE_MODEL: &str = "models/gemini-2.0-flash-exp";

/// Which generation backend handles text requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Hosted multi-model gateway speaking the chat-completions shape.
    OpenRouter,
    /// Any OpenAI-compatible endpoint (LM Studio, LocalAI, the real thing).
    OpenAiCompatible,
    /// Google Gemini generateContent API.
    Gemini,
}

impl ProviderKind {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openrouter" => Ok(ProviderKind::OpenRouter),
            "openai" => Ok(ProviderKind::OpenAiCompatible),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(Error::Config(format!(
                "unsupported AI_PROVIDER `{other}` (expected openrouter, openai, or gemini)"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::OpenAiCompatible => "openai",
            ProviderKind::Gemini => "gemini",
        }
    }
}

/// Global sampling parameters, shared by every backend.
#[derive(Debug, Clone, Copy)]
pub struct SamplingParams {
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            max_tokens: 8192,
        }
    }
}

/// Configuration for the selected text-generation backend.
///
/// Selected once per process; immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub sampling: SamplingParams,
    pub timeout: Duration,
}

/// Configuration for the image-capable backend, when credentials exist.
///
/// Independent of the text provider selection so that e.g. OpenRouter text
/// generation can still pair with Gemini image synthesis.
#[derive(Debug, Clone)]
pub struct ImageBackendConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub sampling: SamplingParams,
    pub timeout: Duration,
}

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub image_backend: Option<ImageBackendConfig>,
    pub cache_root: PathBuf,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Read the full configuration from the environment.
    ///
    /// Call `dotenvy::dotenv()` beforehand if a `.env` file should be
    /// honored; this function only looks at the process environment.
    pub fn from_env() -> Result<Self> {
        let sampling = SamplingParams {
            temperature: env_parse("TEMPERATURE", 0.7),
            top_p: env_parse("TOP_P", 0.95),
            max_tokens: env_parse("MAX_TOKENS", 8192),
        };
        let timeout = Duration::from_secs(env_parse("REQUEST_TIMEOUT_SECS", 120));

        let kind = ProviderKind::parse(&env_or("AI_PROVIDER", "openrouter"))?;
        let provider = match kind {
            ProviderKind::OpenRouter => ProviderConfig {
                kind,
                api_key: require_env("OPENROUTER_API_KEY")?,
                base_url: validated_base_url(&env_or(
                    "OPENROUTER_BASE_URL",
                    DEFAULT_OPENROUTER_BASE_URL,
                ))?,
                model: env_or("OPENROUTER_MODEL", DEFAULT_OPENROUTER_MODEL),
                sampling,
                timeout,
            },
            ProviderKind::OpenAiCompatible => ProviderConfig {
                kind,
                // Self-hosted endpoints commonly ignore the key but the
                // chat-completions shape still wants a bearer token.
                api_key: env_or("OPENAI_API_KEY", "default-key"),
                base_url: validated_base_url(&env_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL))?,
                model: env_or("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
                sampling,
                timeout,
            },
            ProviderKind::Gemini => ProviderConfig {
                kind,
                api_key: require_env("GEMINI_API_KEY")?,
                base_url: validated_base_url(&env_or("GEMINI_API_BASE", DEFAULT_GEMINI_API_BASE))?,
                model: env_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
                sampling,
                timeout,
            },
        };

        let image_backend = non_empty_env("GEMINI_API_KEY").map(|api_key| ImageBackendConfig {
            api_key,
            api_base: env_or("GEMINI_API_BASE", DEFAULT_GEMINI_API_BASE),
            model: env_or("GEMINI_IMAGE_MODEL", DEFAULT_GEMINI_IMAGE_MODEL),
            sampling,
            timeout,
        });

        Ok(Self {
            provider,
            image_backend,
            cache_root: PathBuf::from(env_or("WEB_DIR", "web")),
            host: env_or("HOST", "127.0.0.1"),
            port: env_parse("PORT", 8080),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    non_empty_env(key).unwrap_or_else(|| default.to_string())
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn require_env(key: &str) -> Result<String> {
    non_empty_env(key).ok_or_else(|| Error::Config(format!("missing required env var {key}")))
}

fn validated_base_url(raw: &str) -> Result<String> {
    Url::parse(raw).map_err(|e| Error::Config(format!("invalid base URL `{raw}`: {e}")))?;
    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!(
            ProviderKind::parse("OpenRouter").unwrap(),
            ProviderKind::OpenRouter
        );
        assert_eq!(
            ProviderKind::parse(" openai ").unwrap(),
            ProviderKind::OpenAiCompatible
        );
        assert_eq!(ProviderKind::parse("gemini").unwrap(), ProviderKind::Gemini);
        assert!(ProviderKind::parse("mistral").is_err());
    }

    #[test]
    fn test_validated_base_url_strips_trailing_slash() {
        assert_eq!(
            validated_base_url("https://openrouter.ai/api/v1/").unwrap(),
            "https://openrouter.ai/api/v1"
        );
        assert!(validated_base_url("not a url").is_err());
    }

    #[test]
    fn test_sampling_defaults() {
        let s = SamplingParams::default();
        assert_eq!(s.max_tokens, 8192);
        assert!((s.temperature - 0.7).abs() < f64::EPSILON);
        assert!((s.top_p - 0.95).abs() < f64::EPSILON);
    }
}
