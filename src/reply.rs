//! Model reply protocol.
//!
//! The prompt instructs the model to answer with a declared MIME content
//! type on the first line and the payload on the rest. Models comply
//! imperfectly: leading blank lines, a literal `Content-Type:` echo, and
//! markdown code fences around the whole reply all occur in practice and
//! are tolerated here. A reply with no usable first line is fatal for the
//! request and propagates as [`Error::EmptyResponse`].

use crate::{Error, Result};

/// A parsed model reply: declared content type plus payload.
///
/// `content_type` is never empty; for textual types the payload excludes
/// the content-type header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedResponse {
    pub content_type: String,
    pub body: Body,
}

/// Reply payload, textual for model text replies and binary for images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Text(String),
    Bytes(Vec<u8>),
}

impl Body {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Body::Text(s) => s.as_bytes(),
            Body::Bytes(b) => b,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Body::Text(s) => s.into_bytes(),
            Body::Bytes(b) => b,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(s) => Some(s),
            Body::Bytes(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl GeneratedResponse {
    pub fn text(content_type: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            body: Body::Text(payload.into()),
        }
    }

    pub fn bytes(content_type: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            body: Body::Bytes(payload),
        }
    }

    pub fn is_html(&self) -> bool {
        self.content_type == "text/html"
    }
}

/// Split a raw model reply into declared content type and payload.
pub fn parse_reply(raw: &str) -> Result<GeneratedResponse> {
    let cleaned = strip_code_fence(raw);
    let mut lines = cleaned.lines();

    let content_type = loop {
        let line = lines.next().ok_or(Error::EmptyResponse)?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        break strip_header_echo(trimmed).to_string();
    };
    if content_type.is_empty() {
        return Err(Error::EmptyResponse);
    }

    let payload = lines.collect::<Vec<_>>().join("\n");
    Ok(GeneratedResponse::text(content_type, payload))
}

/// Models often echo the prompt's trailing `Content-Type:` cue verbatim.
fn strip_header_echo(line: &str) -> &str {
    let lower = line.to_ascii_lowercase();
    if lower.starts_with("content-type:") {
        line["content-type:".len()..].trim()
    } else {
        line
    }
}

/// Remove a markdown code fence wrapping the entire reply, if present.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return raw;
    }
    let Some(first_newline) = trimmed.find('\n') else {
        return raw;
    };
    let inner = &trimmed[first_newline + 1..];
    match inner.rfind("```") {
        Some(end) => &inner[..end],
        None => inner,
    }
}
