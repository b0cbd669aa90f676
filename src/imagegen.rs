//! Image synthesis.
//!
//! Image-typed paths short-circuit into this sub-pipeline, and HTML
//! generation may call into it to embed an illustration. Remote synthesis
//! is a finite ordered list of prompt phrasings tried against the
//! image-capable backend, followed by one image-only-mode attempt with a
//! more creative phrasing, followed by a locally rendered placeholder.
//! Standalone image requests therefore always receive valid image bytes;
//! enrichment simply skips the illustration when every remote attempt
//! fails.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::config::ImageBackendConfig;
use crate::path::RequestPath;
use crate::providers::GeminiProvider;
use crate::{Error, Result};

/// Prompt phrasings tried in order against the remote backend.
pub const PROMPT_STYLES: [&str; 4] = [
    "detailed visual image of",
    "realistic image of",
    "3D rendered image of",
    "professional photograph of",
];

/// Last-resort phrasing, sent in image-only mode.
const CREATIVE_STYLE: &str = "imaginative, visually striking illustration of";

const FALLBACK_WIDTH: u32 = 800;
const FALLBACK_HEIGHT: u32 = 600;

static BASE64_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9+/]+={0,2}$").expect("static regex"));

pub struct ImageSynthesizer {
    backend: Option<GeminiProvider>,
}

impl ImageSynthesizer {
    /// Build from the optional image backend configuration. A missing or
    /// broken backend leaves only the local fallback renderer.
    pub fn new(config: Option<&ImageBackendConfig>) -> Self {
        let backend = config.and_then(|c| match GeminiProvider::image_backend(c) {
            Ok(b) => Some(b),
            Err(e) => {
                warn!(error = %e, "image backend unavailable, falling back to local rendering");
                None
            }
        });
        Self { backend }
    }

    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Run the remote attempt chain for a subject. `None` when every
    /// attempt fails; decode failures advance to the next phrasing.
    pub async fn try_remote(&self, subject: &str) -> Option<(Vec<u8>, String)> {
        let backend = self.backend.as_ref()?;

        for style in PROMPT_STYLES {
            let prompt = format!("{style} {subject}");
            if let Some(found) = attempt(backend, &prompt, false).await {
                return Some(found);
            }
        }
        // The stock phrasings struck out (often a policy refusal in text
        // form); one image-only attempt with a looser prompt.
        attempt(backend, &format!("{CREATIVE_STYLE} {subject}"), true).await
    }

    /// Standalone image generation: the remote chain, then the local
    /// fallback in the format matching `extension`.
    pub async fn generate(
        &self,
        subject: &str,
        extension: Option<&str>,
    ) -> Result<(Vec<u8>, String)> {
        if let Some((bytes, mime)) = self.try_remote(subject).await {
            return Ok((bytes, mime));
        }
        debug!(subject, "all remote attempts failed, rendering fallback image");
        fallback_image(subject, extension)
    }

    /// Enrich a generated HTML page with an illustration: the image is
    /// written content-addressed under `static/images/` and an `<img>` tag
    /// is spliced after the first level-1 heading. Every failure leaves the
    /// page unchanged.
    pub async fn embed_illustration(
        &self,
        html: &str,
        path: &RequestPath,
        cache: &CacheStore,
    ) -> String {
        if self.backend.is_none() {
            return html.to_string();
        }
        let subject = path.display_title();
        let Some((bytes, mime)) = self.try_remote(&subject).await else {
            debug!(path = %path, "no illustration generated for page");
            return html.to_string();
        };
        let file = format!("{}.{}", content_hash(&subject), extension_for_mime(&mime));
        let relative = format!("static/images/{file}");
        if let Err(e) = cache.write_asset(&relative, &bytes) {
            warn!(error = %e, "failed to store illustration");
            return html.to_string();
        }
        splice_illustration(html, &format!("/{relative}"), &subject)
    }
}

async fn attempt(
    backend: &GeminiProvider,
    prompt: &str,
    image_only: bool,
) -> Option<(Vec<u8>, String)> {
    match backend.generate_with_image(prompt, image_only).await {
        Ok(Some(inline)) => match decode_inline_payload(&inline.data) {
            Ok(bytes) if looks_like_image(&bytes) => Some((bytes, inline.mime_type)),
            Ok(_) => {
                debug!(prompt, "decoded payload is not an image, trying next phrasing");
                None
            }
            Err(e) => {
                warn!(prompt, error = %e, "image payload decode failed");
                None
            }
        },
        Ok(None) => {
            debug!(prompt, "reply carried no inline image");
            None
        }
        Err(e) => {
            warn!(prompt, error = %e, "image generation attempt failed");
            None
        }
    }
}

/// Decode an inline image payload: a data URL has its prefix stripped
/// before base64 decoding, a bare base64 string is padded to a multiple of
/// four, anything else is treated as already-binary.
pub fn decode_inline_payload(data: &str) -> Result<Vec<u8>> {
    if let Some(rest) = data.strip_prefix("data:") {
        let encoded = rest
            .split_once("base64,")
            .map(|(_, enc)| enc)
            .ok_or_else(|| Error::ImageDecode("data URL without base64 payload".to_string()))?;
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        return BASE64
            .decode(compact.as_bytes())
            .map_err(|e| Error::ImageDecode(format!("data URL decode failed: {e}")));
    }

    let compact: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    if BASE64_RE.is_match(&compact) {
        let mut padded = compact;
        while padded.len() % 4 != 0 {
            padded.push('=');
        }
        return BASE64
            .decode(padded.as_bytes())
            .map_err(|e| Error::ImageDecode(format!("base64 decode failed: {e}")));
    }

    Ok(data.as_bytes().to_vec())
}

fn looks_like_image(bytes: &[u8]) -> bool {
    image::guess_format(bytes).is_ok()
}

/// Render the local placeholder: a solid canvas whose color derives from
/// the prompt, framed by a darker border, encoded in the requested format
/// (PNG when the extension is unrecognized).
pub fn fallback_image(prompt: &str, extension: Option<&str>) -> Result<(Vec<u8>, String)> {
    let (format, mime) = format_for_extension(extension);
    let canvas = render_placeholder(prompt);

    match encode(&canvas, format) {
        Ok(bytes) => Ok((bytes, mime.to_string())),
        Err(e) => {
            warn!(error = %e, ?format, "fallback encode failed, retrying as PNG");
            let bytes = encode(&canvas, ImageFormat::Png)?;
            Ok((bytes, "image/png".to_string()))
        }
    }
}

fn render_placeholder(prompt: &str) -> RgbImage {
    let (r, g, b) = color_from_prompt(prompt);
    let border = Rgb([r / 2, g / 2, b / 2]);
    let fill = Rgb([r, g, b]);

    let mut img = RgbImage::new(FALLBACK_WIDTH, FALLBACK_HEIGHT);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let on_border = x < 8 || y < 8 || x >= FALLBACK_WIDTH - 8 || y >= FALLBACK_HEIGHT - 8;
        *pixel = if on_border { border } else { fill };
    }
    img
}

fn encode(img: &RgbImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut buf, format)
        .map_err(|e| Error::ImageDecode(format!("placeholder encode failed: {e}")))?;
    Ok(buf.into_inner())
}

fn color_from_prompt(prompt: &str) -> (u8, u8, u8) {
    let digest = Sha256::digest(prompt.as_bytes());
    (digest[0], digest[1], digest[2])
}

fn content_hash(subject: &str) -> String {
    let digest = Sha256::digest(subject.as_bytes());
    digest
        .iter()
        .take(8)
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn format_for_extension(extension: Option<&str>) -> (ImageFormat, &'static str) {
    match extension {
        Some("png") => (ImageFormat::Png, "image/png"),
        Some("jpg") | Some("jpeg") => (ImageFormat::Jpeg, "image/jpeg"),
        Some("gif") => (ImageFormat::Gif, "image/gif"),
        Some("webp") => (ImageFormat::WebP, "image/webp"),
        Some("bmp") => (ImageFormat::Bmp, "image/bmp"),
        _ => (ImageFormat::Png, "image/png"),
    }
}

fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        _ => "png",
    }
}

/// Splice an `<img>` tag after the document's first `</h1>`, or before
/// `</body>` when the page has no level-1 heading.
fn splice_illustration(html: &str, src: &str, alt: &str) -> String {
    let tag = format!(r#"<img class="page-illustration" src="{src}" alt="{alt}">"#);
    let lower = html.to_ascii_lowercase();
    if let Some(idx) = lower.find("</h1>") {
        let after = idx + "</h1>".len();
        format!("{}\n{tag}{}", &html[..after], &html[after..])
    } else if let Some(idx) = lower.rfind("</body>") {
        format!("{}{tag}\n{}", &html[..idx], &html[idx..])
    } else {
        format!("{html}\n{tag}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_data_url() {
        let decoded = decode_inline_payload("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(decoded, b"hello");
    }

    #[test]
    fn test_decode_pads_bare_base64() {
        // "aGVsbG8" is "hello" without its padding character.
        let decoded = decode_inline_payload("aGVsbG8").unwrap();
        assert_eq!(decoded, b"hello");
    }

    #[test]
    fn test_decode_ignores_embedded_whitespace() {
        let decoded = decode_inline_payload("aGVs\nbG8=").unwrap();
        assert_eq!(decoded, b"hello");
    }

    #[test]
    fn test_decode_passes_binary_through() {
        let raw = "not base64!! definitely binary \u{1F600}";
        let decoded = decode_inline_payload(raw).unwrap();
        assert_eq!(decoded, raw.as_bytes());
    }

    #[test]
    fn test_decode_rejects_data_url_without_base64() {
        assert!(matches!(
            decode_inline_payload("data:text/plain,hello"),
            Err(Error::ImageDecode(_))
        ));
    }

    #[test]
    fn test_fallback_produces_valid_png() {
        let (bytes, mime) = fallback_image("a castle", Some("png")).unwrap();
        assert_eq!(mime, "image/png");
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.width(), FALLBACK_WIDTH);
        assert_eq!(img.height(), FALLBACK_HEIGHT);
    }

    #[test]
    fn test_fallback_respects_requested_format() {
        let (bytes, mime) = fallback_image("a castle", Some("jpeg")).unwrap();
        assert_eq!(mime, "image/jpeg");
        assert_eq!(
            image::guess_format(&bytes).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_fallback_defaults_to_png_for_unknown_extension() {
        let (bytes, mime) = fallback_image("a castle", Some("tiff")).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Png);

        let (_, mime) = fallback_image("a castle", None).unwrap();
        assert_eq!(mime, "image/png");
    }

    #[test]
    fn test_fallback_is_deterministic_per_prompt() {
        let (a, _) = fallback_image("castle", Some("png")).unwrap();
        let (b, _) = fallback_image("castle", Some("png")).unwrap();
        let (c, _) = fallback_image("dragon", Some("png")).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_splice_after_first_heading() {
        let html = "<html><body><h1>Title</h1><p>x</p></body></html>";
        let out = splice_illustration(html, "/static/images/ab.png", "Title");
        let img_at = out.find("page-illustration").unwrap();
        let h1_at = out.find("</h1>").unwrap();
        let p_at = out.find("<p>").unwrap();
        assert!(h1_at < img_at && img_at < p_at);
    }

    #[test]
    fn test_splice_without_heading_lands_before_body_close() {
        let html = "<html><body><p>x</p></body></html>";
        let out = splice_illustration(html, "/s.png", "S");
        let img_at = out.find("<img").unwrap();
        let body_close = out.rfind("</body>").unwrap();
        assert!(img_at < body_close);
    }

    #[tokio::test]
    async fn test_generate_without_backend_uses_fallback() {
        let synth = ImageSynthesizer::disabled();
        let (bytes, mime) = synth.generate("castle", Some("png")).await.unwrap();
        assert_eq!(mime, "image/png");
        assert!(image::load_from_memory(&bytes).is_ok());
    }

    #[test]
    fn test_content_hash_is_stable_hex() {
        let h = content_hash("castle");
        assert_eq!(h.len(), 16);
        assert_eq!(h, content_hash("castle"));
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
