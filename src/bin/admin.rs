//! Maintenance CLI for the generated-site cache and provider setup.
//!
//! Usage:
//!   infiniweb-admin clear-cache          Remove every cached entry
//!   infiniweb-admin stats                Print cache statistics
//!   infiniweb-admin status               Print the active provider config
//!   infiniweb-admin list-models          List models at the provider
//!   infiniweb-admin cleanup-image-html   Remove stale HTML cached for image URLs

use std::fs;
use std::path::{Path, PathBuf};

use infiniweb::config::AppConfig;
use infiniweb::path::IMAGE_EXTENSIONS;
use infiniweb::providers::create_provider;
use infiniweb::CacheStore;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let code = match args[1].as_str() {
        "clear-cache" => cmd_clear_cache(),
        "stats" => cmd_stats(),
        "status" => cmd_status(),
        "list-models" => cmd_list_models().await,
        "cleanup-image-html" => cmd_cleanup_image_html(),
        "help" | "--help" | "-h" => {
            print_usage();
            0
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            1
        }
    };
    std::process::exit(code);
}

fn print_usage() {
    println!(
        r#"infiniweb-admin — cache and provider maintenance

USAGE:
    infiniweb-admin <COMMAND>

COMMANDS:
    clear-cache           Remove every cached entry under the cache root
    stats                 Print cache statistics
    status                Print the active provider configuration
    list-models           List model identifiers at the configured provider
    cleanup-image-html    Remove HTML entries mistakenly cached for image URLs
    help                  Show this help message

ENVIRONMENT:
    WEB_DIR               Cache root directory (default: web)
    AI_PROVIDER           openrouter, openai, or gemini"#
    );
}

fn cache_root() -> PathBuf {
    PathBuf::from(std::env::var("WEB_DIR").unwrap_or_else(|_| "web".to_string()))
}

fn open_store() -> Option<CacheStore> {
    match CacheStore::new(cache_root()) {
        Ok(store) => Some(store),
        Err(e) => {
            eprintln!("Failed to open cache: {e}");
            None
        }
    }
}

fn cmd_clear_cache() -> i32 {
    let Some(store) = open_store() else { return 1 };
    let before = store.stats();
    match store.clear_all() {
        Ok(()) => {
            println!(
                "Cleared {} files ({} bytes) from {}",
                before.file_count,
                before.total_bytes,
                store.root().display()
            );
            0
        }
        Err(e) => {
            eprintln!("Error clearing cache: {e}");
            1
        }
    }
}

fn cmd_stats() -> i32 {
    let Some(store) = open_store() else { return 1 };
    let stats = store.stats();
    println!("Cache location: {}", store.root().display());
    println!("Total files:    {}", stats.file_count);
    println!(
        "Total size:     {} bytes ({:.2} MiB)",
        stats.total_bytes,
        stats.total_bytes as f64 / (1024.0 * 1024.0)
    );
    0
}

fn cmd_status() -> i32 {
    match AppConfig::from_env() {
        Ok(config) => {
            println!("Provider:   {}", config.provider.kind.as_str());
            println!("Model:      {}", config.provider.model);
            println!("Base URL:   {}", config.provider.base_url);
            println!(
                "Images:     {}",
                match &config.image_backend {
                    Some(img) => format!("enabled ({})", img.model),
                    None => "local fallback only".to_string(),
                }
            );
            println!("Cache root: {}", config.cache_root.display());
            0
        }
        Err(e) => {
            eprintln!("Configuration error: {e}");
            1
        }
    }
}

async fn cmd_list_models() -> i32 {
    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return 1;
        }
    };
    let provider = match create_provider(&config.provider) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Provider error: {e}");
            return 1;
        }
    };
    match provider.list_models().await {
        Ok(models) if models.is_empty() => {
            println!("No models reported by {}", provider.name());
            0
        }
        Ok(models) => {
            println!("Available models at {}:", provider.name());
            for model in models {
                println!("- {model}");
            }
            0
        }
        Err(e) => {
            eprintln!("Error fetching models: {e}");
            1
        }
    }
}

/// Early versions cached an HTML page for image-typed URLs before image
/// synthesis existed. Those entries shadow real image generation, so this
/// removes any `<name>.<image-ext>.html` files left in the cache.
fn cmd_cleanup_image_html() -> i32 {
    let root = cache_root();
    if !root.is_dir() {
        eprintln!("Cache root not found at {}", root.display());
        return 1;
    }
    let mut removed = 0usize;
    walk_stale_image_html(&root, &mut removed);
    println!("Removed {removed} stale image HTML files");
    0
}

fn walk_stale_image_html(dir: &Path, removed: &mut usize) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_stale_image_html(&path, removed);
        } else if is_image_path_html(&path) {
            match fs::remove_file(&path) {
                Ok(()) => {
                    println!("Removed: {}", path.display());
                    *removed += 1;
                }
                Err(e) => eprintln!("Error removing {}: {e}", path.display()),
            }
        }
    }
}

fn is_image_path_html(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let lower = name.to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!("{ext}.html")))
}
