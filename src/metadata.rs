// Front matter lookup for listed files
// The host's metadata cache sits behind `MetadataSource`

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use parking_lot::RwLock;

use crate::models::{FileEntry, Frontmatter};
use crate::storage::parse_frontmatter;

pub trait MetadataSource {
    /// Front matter for `file`; missing or unreadable metadata is the default
    fn frontmatter(&self, file: &FileEntry) -> Frontmatter;
}

/// Front matter held in memory, keyed by vault path
#[derive(Debug, Default, Clone)]
pub struct MemoryMetadata {
    entries: HashMap<String, Frontmatter>,
}

impl MemoryMetadata {
    pub fn insert(&mut self, path: &str, frontmatter: Frontmatter) {
        self.entries.insert(path.to_string(), frontmatter);
    }

    pub fn remove(&mut self, path: &str) {
        self.entries.remove(path);
    }
}

impl MetadataSource for MemoryMetadata {
    fn frontmatter(&self, file: &FileEntry) -> Frontmatter {
        self.entries.get(&file.path).cloned().unwrap_or_default()
    }
}

/// Reads front matter from Markdown files under a vault root. Entries are
/// reused until the file's mtime changes.
pub struct FrontmatterCache {
    root: PathBuf,
    entries: RwLock<HashMap<String, (i64, Frontmatter)>>,
}

impl FrontmatterCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Drop the entry for `path` and, when it was a folder, everything below it
    pub fn invalidate(&self, path: &str) {
        let prefix = format!("{}/", path);
        self.entries
            .write()
            .retain(|key, _| key != path && !key.starts_with(&prefix));
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn read(&self, file: &FileEntry) -> Frontmatter {
        let full = self.root.join(&file.path);
        match fs::read_to_string(&full) {
            Ok(content) => parse_frontmatter::<serde_yaml::Value>(&content)
                .map(|(value, _)| Frontmatter::from_yaml(&value))
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!("[FrontmatterCache::read] {}: {}", file.path, e);
                Frontmatter::default()
            }
        }
    }
}

impl MetadataSource for FrontmatterCache {
    fn frontmatter(&self, file: &FileEntry) -> Frontmatter {
        if !file.has_extension("md") {
            return Frontmatter::default();
        }
        if let Some((mtime, cached)) = self.entries.read().get(&file.path) {
            if *mtime == file.stat.mtime {
                return cached.clone();
            }
        }

        let frontmatter = self.read(file);
        self.entries
            .write()
            .insert(file.path.clone(), (file.stat.mtime, frontmatter.clone()));
        frontmatter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileStat;

    #[test]
    fn test_memory_metadata_defaults() {
        let mut meta = MemoryMetadata::default();
        let file = FileEntry::new("a.md", FileStat::default());
        assert_eq!(meta.frontmatter(&file), Frontmatter::default());
        meta.insert("a.md", Frontmatter { pinned: true, ..Default::default() });
        assert!(meta.frontmatter(&file).pinned);
        meta.remove("a.md");
        assert!(!meta.frontmatter(&file).pinned);
    }

    #[test]
    fn test_cache_reads_and_refreshes_on_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.md");
        fs::write(&path, "---\ndesc: First\ntags: [a]\n---\nbody").unwrap();

        let cache = FrontmatterCache::new(dir.path());
        let file = FileEntry::new("note.md", FileStat::new(1, 1));
        let fm = cache.frontmatter(&file);
        assert_eq!(fm.description.as_deref(), Some("First"));
        assert_eq!(fm.tags, vec!["a"]);

        fs::write(&path, "---\ndesc: Second\n---\n").unwrap();
        assert_eq!(cache.frontmatter(&file).description.as_deref(), Some("First"));

        let touched = FileEntry::new("note.md", FileStat::new(1, 2));
        assert_eq!(cache.frontmatter(&touched).description.as_deref(), Some("Second"));
    }

    #[test]
    fn test_invalidate_evicts_file_and_folder_contents() {
        let dir = tempfile::tempdir().unwrap();
        for path in ["a.md", "Work/b.md", "Work/Deep/c.md", "Workshop.md"] {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, "---\npinned: true\n---\n").unwrap();
        }

        let cache = FrontmatterCache::new(dir.path());
        for path in ["a.md", "Work/b.md", "Work/Deep/c.md", "Workshop.md"] {
            assert!(cache.frontmatter(&FileEntry::new(path, FileStat::default())).pinned);
        }
        assert_eq!(cache.len(), 4);

        cache.invalidate("a.md");
        assert_eq!(cache.len(), 3);
        cache.invalidate("Work");
        assert_eq!(cache.len(), 1);
        cache.invalidate("Workshop.md");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_ignores_non_markdown_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FrontmatterCache::new(dir.path());
        let pdf = FileEntry::new("doc.pdf", FileStat::default());
        assert_eq!(cache.frontmatter(&pdf), Frontmatter::default());
        let missing = FileEntry::new("gone.md", FileStat::default());
        assert_eq!(cache.frontmatter(&missing), Frontmatter::default());
    }
}
