//! Path-addressed disk cache.
//!
//! The cache root mirrors the URL hierarchy: each path segment is a
//! directory component and the leaf file carries an extension chosen by
//! content type. The tree doubles as the site's persisted structure, so a
//! cached site can be browsed straight off disk.
//!
//! Failure policy: save failures are logged and degrade to "generated but
//! not persisted"; load failures degrade to a cache miss. Neither is ever
//! surfaced to the requester.

mod index;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::path::RequestPath;
use crate::{Error, Result};

/// Aggregate cache statistics from a full recursive walk.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CacheStats {
    pub file_count: u64,
    pub total_bytes: u64,
}

/// Disk store rooted at a single directory, exclusively owning every entry
/// beneath it.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| Error::CacheWrite {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extension appended for a content type, `None` for opaque types whose
    /// paths already carry their own suffix (images in particular).
    pub fn extension_for(content_type: &str) -> Option<&'static str> {
        if content_type == "text/html" {
            Some("html")
        } else if content_type == "application/json" {
            Some("json")
        } else if content_type.starts_with("text/") {
            Some("txt")
        } else {
            None
        }
    }

    fn entry_path(&self, path: &RequestPath, content_type: &str) -> PathBuf {
        match Self::extension_for(content_type) {
            Some(ext) => self.root.join(format!("{}.{ext}", path.as_str())),
            None => self.root.join(path.as_str()),
        }
    }

    /// Persist a generated response. Returns whether the entry was written;
    /// failures are logged, never raised, so the caller can still serve the
    /// content it generated. Every successful write refreshes the listing
    /// index.
    pub fn save(&self, path: &RequestPath, content_type: &str, body: &[u8]) -> bool {
        let file = self.entry_path(path, content_type);
        match write_file(&file, body) {
            Ok(()) => {
                debug!(path = %path, file = %file.display(), "content cached");
                // The index itself is written by regenerate_index; avoid
                // clobbering it from its own trigger.
                if path.as_str() != "index" {
                    if let Err(e) = self.regenerate_index() {
                        warn!(error = %e, "index regeneration failed");
                    }
                }
                true
            }
            Err(e) => {
                warn!(error = %e, path = %path, "failed to cache content");
                false
            }
        }
    }

    /// Probe candidate files for a path, first match wins. The extension of
    /// the found file determines the reported content type.
    pub fn load(&self, path: &RequestPath) -> Option<(String, Vec<u8>)> {
        for file in self.candidates(path) {
            if !file.is_file() {
                continue;
            }
            match fs::read(&file) {
                Ok(bytes) => {
                    debug!(path = %path, file = %file.display(), "cache hit");
                    return Some((content_type_for(&file).to_string(), bytes));
                }
                Err(source) => {
                    // Degrades to a miss; the pipeline will regenerate.
                    let e = Error::CacheRead {
                        path: file.clone(),
                        source,
                    };
                    warn!(error = %e, "cache read failed");
                }
            }
        }
        None
    }

    pub fn exists(&self, path: &RequestPath) -> bool {
        self.candidates(path).iter().any(|f| f.is_file())
    }

    /// Remove every extension variant for a path, plus the directory index,
    /// and the directory itself when left empty. Returns whether anything
    /// was removed.
    pub fn invalidate(&self, path: &RequestPath) -> bool {
        let mut removed = 0usize;
        for file in self.candidates(path) {
            if file.is_file() {
                match fs::remove_file(&file) {
                    Ok(()) => {
                        debug!(file = %file.display(), "cache entry removed");
                        removed += 1;
                    }
                    Err(e) => warn!(file = %file.display(), error = %e, "failed to remove entry"),
                }
            }
        }
        // Only succeeds when empty, which is exactly the intent.
        let dir = self.root.join(path.as_str());
        if dir.is_dir() && fs::remove_dir(&dir).is_ok() {
            debug!(dir = %dir.display(), "empty cache directory removed");
        }
        removed > 0
    }

    /// Remove every entry under the cache root, keeping the root itself.
    pub fn clear_all(&self) -> Result<()> {
        let entries = fs::read_dir(&self.root).map_err(|source| Error::CacheRead {
            path: self.root.clone(),
            source,
        })?;
        for entry in entries.flatten() {
            let target = entry.path();
            let result = if target.is_dir() {
                fs::remove_dir_all(&target)
            } else {
                fs::remove_file(&target)
            };
            if let Err(source) = result {
                return Err(Error::CacheWrite {
                    path: target,
                    source,
                });
            }
        }
        Ok(())
    }

    /// Full recursive walk of the cache tree.
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();
        walk_stats(&self.root, &mut stats);
        stats
    }

    /// Write a derived asset (e.g. a generated illustration) under the
    /// cache root without triggering index regeneration.
    pub fn write_asset(&self, relative: &str, bytes: &[u8]) -> Result<()> {
        let rel = RequestPath::normalize(relative);
        write_file(&self.root.join(rel.as_str()), bytes)
    }

    fn candidates(&self, path: &RequestPath) -> Vec<PathBuf> {
        let base = path.as_str();
        vec![
            self.root.join(format!("{base}.html")),
            self.root.join(format!("{base}.json")),
            self.root.join(format!("{base}.txt")),
            self.root.join(base),
            self.root.join(base).join("index.html"),
        ]
    }
}

fn write_file(file: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).map_err(|source| Error::CacheWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(file, bytes).map_err(|source| Error::CacheWrite {
        path: file.to_path_buf(),
        source,
    })
}

fn content_type_for(file: &Path) -> &'static str {
    let ext = file
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html") => "text/html",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "text/html",
    }
}

fn walk_stats(dir: &Path, stats: &mut CacheStats) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_stats(&path, stats);
        } else if let Ok(meta) = entry.metadata() {
            stats.file_count += 1;
            stats.total_bytes += meta.len();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, CacheStore) {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path()).unwrap();
        (dir, store)
    }

    fn p(raw: &str) -> RequestPath {
        RequestPath::normalize(raw)
    }

    #[test]
    fn test_save_load_round_trip() {
        let (_dir, store) = store();
        assert!(store.save(&p("/stronghold-crusader"), "text/html", b"<p>X</p>"));
        let (ct, body) = store.load(&p("/stronghold-crusader")).unwrap();
        assert_eq!(ct, "text/html");
        assert_eq!(body, b"<p>X</p>");
    }

    #[test]
    fn test_extension_mapping() {
        let (_dir, store) = store();
        store.save(&p("a"), "text/html", b"h");
        store.save(&p("b"), "application/json", b"{}");
        store.save(&p("c"), "text/plain", b"t");
        store.save(&p("d.png"), "image/png", b"\x89PNG");
        assert!(store.root().join("a.html").is_file());
        assert!(store.root().join("b.json").is_file());
        assert!(store.root().join("c.txt").is_file());
        assert!(store.root().join("d.png").is_file());
    }

    #[test]
    fn test_load_reports_content_type_from_extension() {
        let (_dir, store) = store();
        store.save(&p("data"), "application/json", b"{}");
        let (ct, _) = store.load(&p("data")).unwrap();
        assert_eq!(ct, "application/json");

        store.save(&p("pic.png"), "image/png", b"\x89PNG");
        let (ct, _) = store.load(&p("pic.png")).unwrap();
        assert_eq!(ct, "image/png");
    }

    #[test]
    fn test_nested_paths_create_directories() {
        let (_dir, store) = store();
        store.save(&p("games/stronghold/units"), "text/html", b"u");
        assert!(store.root().join("games/stronghold/units.html").is_file());
        assert!(store.load(&p("games/stronghold/units")).is_some());
    }

    #[test]
    fn test_load_falls_back_to_directory_index() {
        let (_dir, store) = store();
        store.save(&p("games/stronghold/index"), "text/html", b"idx");
        let (ct, body) = store.load(&p("games/stronghold")).unwrap();
        assert_eq!(ct, "text/html");
        assert_eq!(body, b"idx");
    }

    #[test]
    fn test_miss_returns_none() {
        let (_dir, store) = store();
        assert!(store.load(&p("nothing-here")).is_none());
        assert!(!store.exists(&p("nothing-here")));
    }

    #[test]
    fn test_invalidate_then_miss() {
        let (_dir, store) = store();
        store.save(&p("topic"), "text/html", b"x");
        assert!(store.exists(&p("topic")));
        assert!(store.invalidate(&p("topic")));
        assert!(store.load(&p("topic")).is_none());
        // Second invalidation has nothing to remove.
        assert!(!store.invalidate(&p("topic")));
    }

    #[test]
    fn test_invalidate_removes_empty_directory() {
        let (_dir, store) = store();
        store.save(&p("area/index"), "text/html", b"x");
        store.invalidate(&p("area/index"));
        store.invalidate(&p("area"));
        assert!(!store.root().join("area").exists());
    }

    #[test]
    fn test_clear_all_empties_root() {
        let (_dir, store) = store();
        store.save(&p("a"), "text/html", b"1");
        store.save(&p("b/c"), "text/html", b"2");
        store.clear_all().unwrap();
        assert_eq!(store.stats().file_count, 0);
        assert!(store.root().is_dir());
    }

    #[test]
    fn test_stats_counts_files_and_bytes() {
        let (_dir, store) = store();
        store.save(&p("one"), "text/plain", b"abcd");
        store.save(&p("two/three"), "text/plain", b"ef");
        let stats = store.stats();
        // Each save also rewrites index.html.
        assert!(stats.file_count >= 3);
        assert!(stats.total_bytes >= 6);
    }

    #[test]
    fn test_write_asset_does_not_touch_index() {
        let (_dir, store) = store();
        store.write_asset("static/images/abc.png", b"\x89PNG").unwrap();
        assert!(store.root().join("static/images/abc.png").is_file());
        assert!(!store.root().join("index.html").exists());
    }
}
