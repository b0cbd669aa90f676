//! End-to-end pipeline scenarios against a scripted provider and a
//! temporary cache directory.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use infiniweb::generate::ContentPipeline;
use infiniweb::imagegen::ImageSynthesizer;
use infiniweb::providers::GenerationProvider;
use infiniweb::{CacheStore, RequestPath, Result};

struct ScriptedProvider {
    reply: String,
    calls: Arc<AtomicUsize>,
    last_prompt: Arc<Mutex<Option<String>>>,
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        Ok(self.reply.clone())
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

struct Harness {
    _dir: TempDir,
    pipeline: ContentPipeline,
    cache: CacheStore,
    calls: Arc<AtomicUsize>,
    last_prompt: Arc<Mutex<Option<String>>>,
}

fn harness(reply: &str) -> Harness {
    let dir = TempDir::new().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let last_prompt = Arc::new(Mutex::new(None));
    let provider = ScriptedProvider {
        reply: reply.to_string(),
        calls: Arc::clone(&calls),
        last_prompt: Arc::clone(&last_prompt),
    };
    let cache = CacheStore::new(dir.path()).unwrap();
    let pipeline = ContentPipeline::new(
        Box::new(provider),
        ImageSynthesizer::disabled(),
        cache.clone(),
    );
    Harness {
        _dir: dir,
        pipeline,
        cache,
        calls,
        last_prompt,
    }
}

#[tokio::test]
async fn first_request_generates_wraps_caches_and_indexes() {
    let h = harness("text/html\n<p>Hi</p>");

    let response = h
        .pipeline
        .respond("/stronghold-crusader", None, true)
        .await
        .unwrap();

    // The provider saw a prompt naming the requested path.
    let prompt = h.last_prompt.lock().unwrap().clone().unwrap();
    assert!(prompt.contains("stronghold-crusader"));

    // The bare fragment came back as a full document with the shared style
    // block and a back-navigation link.
    assert_eq!(response.content_type, "text/html");
    let html = response.body.as_text().unwrap();
    assert!(html.contains("<style"));
    assert!(html.contains("back-to-search"));
    assert!(html.contains("<p>Hi</p>"));

    // Persisted at the mirrored location.
    let cached = h.cache.root().join("stronghold-crusader.html");
    assert!(cached.is_file());
    assert_eq!(std::fs::read_to_string(&cached).unwrap(), html);

    // And the regenerated index links to it by display title.
    let index = std::fs::read_to_string(h.cache.root().join("index.html")).unwrap();
    assert!(index.contains(r#"<a href="/stronghold-crusader">Stronghold Crusader</a>"#));
}

#[tokio::test]
async fn second_request_is_served_from_cache() {
    let h = harness("text/html\n<p>Hi</p>");

    let first = h
        .pipeline
        .respond("/stronghold-crusader", None, true)
        .await
        .unwrap();
    let second = h
        .pipeline
        .respond("/stronghold-crusader", None, true)
        .await
        .unwrap();

    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    assert_eq!(second.content_type, "text/html");
    assert_eq!(first.body.as_bytes(), second.body.as_bytes());
}

#[tokio::test]
async fn image_path_always_yields_valid_image_bytes() {
    // No image backend configured at all: every remote attempt is
    // unavailable, so the local fallback must carry the request.
    let h = harness("unused");

    let response = h.pipeline.respond("/castle.png", None, true).await.unwrap();

    assert_eq!(response.content_type, "image/png");
    let decoded = image::load_from_memory(response.body.as_bytes()).unwrap();
    assert!(decoded.width() > 0);

    // The text provider was never consulted.
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);

    // Cached under the path's own name, extension intact.
    assert!(h.cache.root().join("castle.png").is_file());

    // A second request hits the cache.
    let again = h.pipeline.respond("/castle.png", None, true).await.unwrap();
    assert_eq!(again.content_type, "image/png");
    assert_eq!(again.body.as_bytes(), response.body.as_bytes());
}

#[tokio::test]
async fn invalidation_forces_regeneration() {
    let h = harness("text/html\n<p>Hi</p>");

    h.pipeline.respond("/topic", None, true).await.unwrap();
    assert!(h.cache.exists(&RequestPath::normalize("topic")));

    h.cache.invalidate(&RequestPath::normalize("topic"));
    assert!(h.cache.load(&RequestPath::normalize("topic")).is_none());

    h.pipeline.respond("/topic", None, true).await.unwrap();
    assert_eq!(h.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn nested_paths_mirror_the_url_hierarchy() {
    let h = harness("text/html\n<h1>Units</h1>");

    h.pipeline
        .respond("/stronghold-crusader/units", None, true)
        .await
        .unwrap();

    assert!(h
        .cache
        .root()
        .join("stronghold-crusader/units.html")
        .is_file());

    let index = std::fs::read_to_string(h.cache.root().join("index.html")).unwrap();
    assert!(index.contains(r#"<a href="/stronghold-crusader/units">Stronghold Crusader - Units</a>"#));
}
