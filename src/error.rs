use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the generation pipeline.
///
/// Provider- and protocol-level failures propagate to the request boundary
/// and become a rendered error page. Cache and image-synthesis failures are
/// contained where they occur and degrade gracefully; their variants exist
/// so call sites can log them with context.
#[derive(Debug, Error)]
pub enum Error {
    /// The model returned no usable text. Fatal for the request.
    #[error("provider returned an empty reply")]
    EmptyResponse,

    /// Non-2xx status or a malformed reply from a generation backend.
    #[error("provider error ({provider}): {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    /// Network-level failure talking to a generation backend.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Inline image payload could not be decoded. Recovered locally by
    /// advancing to the next prompt attempt or the fallback renderer.
    #[error("image decode error: {0}")]
    ImageDecode(String),

    #[error("cache read error at {path}: {source}")]
    CacheRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cache write error at {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a provider error with a formatted message.
    pub fn provider(provider: &'static str, message: impl Into<String>) -> Self {
        Error::Provider {
            provider,
            message: message.into(),
        }
    }
}
