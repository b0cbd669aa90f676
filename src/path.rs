//! URL path normalization.
//!
//! A [`RequestPath`] is the canonical cache key for a request: leading and
//! trailing slashes removed, the empty path mapped to the `index` sentinel.
//! Normalization is total over any string input and idempotent.

use std::fmt;

/// Recognized image extensions. A path ending in one of these short-circuits
/// the pipeline into pure binary generation (no HTML wrapping).
pub const IMAGE_EXTENSIONS: [&str; 6] = [".png", ".jpg", ".jpeg", ".gif", ".webp", ".bmp"];

/// A normalized request path: ordered non-empty segments, no leading or
/// trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestPath(String);

impl RequestPath {
    /// Normalize a raw URL path. Never fails: empty input becomes the
    /// sentinel path `index`. Empty and dot segments are dropped so the
    /// result is always a safe relative path under the cache root.
    pub fn normalize(raw: &str) -> Self {
        let joined = raw
            .split('/')
            .filter(|s| !s.is_empty() && *s != "." && *s != "..")
            .collect::<Vec<_>>()
            .join("/");
        if joined.is_empty() {
            Self("index".to_string())
        } else {
            Self(joined)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// The final path segment.
    pub fn last_segment(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// True iff the last segment ends in a recognized image extension,
    /// case-insensitive.
    pub fn is_image_path(&self) -> bool {
        let last = self.last_segment().to_ascii_lowercase();
        IMAGE_EXTENSIONS.iter().any(|ext| last.ends_with(ext))
    }

    /// Lowercased extension of the last segment, without the dot.
    pub fn extension(&self) -> Option<String> {
        let last = self.last_segment();
        last.rsplit_once('.')
            .filter(|(stem, _)| !stem.is_empty())
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }

    /// Human-oriented topic string: a legacy leading `web/` segment is
    /// stripped, hyphens become spaces, segment separators become ` - `,
    /// and each word is capitalized.
    pub fn display_title(&self) -> String {
        let path = self.0.strip_prefix("web/").unwrap_or(&self.0);
        let spaced = path.replace('-', " ").replace('/', " - ");
        spaced
            .split_whitespace()
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Display title with any recognized image extension removed, used when
    /// the path names a picture rather than a page.
    pub fn subject(&self) -> String {
        let lower = self.0.to_ascii_lowercase();
        let stripped = IMAGE_EXTENSIONS
            .iter()
            .find(|ext| lower.ends_with(*ext))
            .map(|ext| &self.0[..self.0.len() - ext.len()])
            .unwrap_or(&self.0);
        RequestPath::normalize(stripped).display_title()
    }
}

impl fmt::Display for RequestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
