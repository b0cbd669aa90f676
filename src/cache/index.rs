//! Listing index regeneration.
//!
//! The index page at `<root>/index.html` is a pure function of the cache
//! contents at regeneration time: every cached HTML entry is scanned,
//! turned into a display path and title, sorted, and rendered as a link
//! list. No incremental state survives between regenerations.

use std::fs;
use std::path::Path;

use crate::path::RequestPath;
use crate::templates;
use crate::Result;

use super::CacheStore;

impl CacheStore {
    /// Rebuild `<root>/index.html` from the current cache contents.
    pub fn regenerate_index(&self) -> Result<()> {
        let mut relatives = Vec::new();
        collect_html(self.root(), self.root(), &mut relatives);

        let mut entries: Vec<(String, String)> = relatives
            .into_iter()
            .filter_map(|rel| display_path(&rel))
            .map(|display| {
                let title = RequestPath::normalize(&display).display_title();
                (format!("/{display}"), title)
            })
            .collect();
        entries.sort();
        entries.dedup_by(|a, b| a.0 == b.0);

        let html = templates::index_page(&entries);
        super::write_file(&self.root().join("index.html"), html.as_bytes())
    }
}

/// Map a cached `.html` file's relative path to its display path, or `None`
/// for entries the listing excludes (the index itself and derived assets).
fn display_path(rel: &str) -> Option<String> {
    if rel == "index.html" || rel.starts_with("static/") {
        return None;
    }
    let stripped = rel.strip_suffix(".html")?;
    let display = stripped.strip_suffix("/index").unwrap_or(stripped);
    Some(display.to_string())
}

fn collect_html(root: &Path, dir: &Path, out: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_html(root, &path, out);
        } else if path.extension().and_then(|e| e.to_str()) == Some("html") {
            if let Ok(rel) = path.strip_prefix(root) {
                out.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }
}
