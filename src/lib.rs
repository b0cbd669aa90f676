//! # infiniweb
//!
//! A web server that synthesizes every page on demand. Instead of storing a
//! fixed site, arbitrary URL paths are routed to a generative model backend
//! and whatever the model returns is served, with results persisted in a
//! path-addressed disk cache whose directory layout mirrors the site.
//!
//! The interesting part is the request-to-content pipeline:
//!
//! 1. A URL path (and optional submitted form data) is turned into a
//!    deterministic prompt ([`prompt`]).
//! 2. The prompt is dispatched to one of several pluggable generation
//!    backends ([`providers`]).
//! 3. The raw model reply is parsed against a two-part protocol: a declared
//!    content type on the first line, payload on the rest ([`reply`]).
//! 4. HTML payloads are normalized into a consistent document shell with
//!    shared styling and back navigation ([`html`]), optionally enriched
//!    with a generated illustration ([`imagegen`]).
//! 5. The result is stored under a mirrored directory tree so subsequent
//!    requests never touch the provider again ([`cache`]).
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Immutable process configuration from the environment |
//! | [`path`] | URL path normalization and display titles |
//! | [`prompt`] | Instruction template rendering |
//! | [`providers`] | Pluggable generation backends |
//! | [`reply`] | Two-part model reply protocol parser |
//! | [`html`] | HTML payload post-processing |
//! | [`imagegen`] | Image synthesis with a local fallback renderer |
//! | [`cache`] | Path-addressed disk cache and listing index |
//! | [`generate`] | Pipeline orchestration |
//! | [`server`] | HTTP surface (axum) |
//! | [`templates`] | Static page markup and the shared style block |

pub mod cache;
pub mod config;
pub mod error;
pub mod generate;
pub mod html;
pub mod imagegen;
pub mod path;
pub mod prompt;
pub mod providers;
pub mod reply;
pub mod server;
pub mod templates;

pub use cache::{CacheStats, CacheStore};
pub use config::{AppConfig, ProviderConfig, ProviderKind, SamplingParams};
pub use error::Error;
pub use generate::ContentPipeline;
pub use path::RequestPath;
pub use reply::{Body, GeneratedResponse};

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
