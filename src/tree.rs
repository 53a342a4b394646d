// In-memory snapshot of the vault: an arena of nodes plus a path index
// Built from a real directory with walkdir, or by hand for embedded hosts

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use walkdir::WalkDir;

use crate::error::{ExplorerError, Result};
use crate::models::{
    normalize_path, split_path, DirectoryEntry, FileEntry, FileStat, NodeId, VaultNode,
    ROOT_PATH,
};

const ROOT_ID: NodeId = 0;

#[derive(Debug, Clone)]
pub struct VaultTree {
    nodes: Vec<VaultNode>,
    index: HashMap<String, NodeId>,
}

impl Default for VaultTree {
    fn default() -> Self {
        Self::new()
    }
}

impl VaultTree {
    pub fn new() -> Self {
        let mut index = HashMap::new();
        index.insert(ROOT_PATH.to_string(), ROOT_ID);
        Self {
            nodes: vec![VaultNode::Directory(DirectoryEntry::root())],
            index,
        }
    }

    // ============================================
    // LOOKUP
    // ============================================

    pub fn root(&self) -> &DirectoryEntry {
        match &self.nodes[ROOT_ID] {
            VaultNode::Directory(dir) => dir,
            VaultNode::File(_) => unreachable!("arena slot 0 is always the root directory"),
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&VaultNode> {
        self.nodes.get(id)
    }

    pub fn lookup(&self, path: &str) -> Option<&VaultNode> {
        self.index.get(&normalize_path(path)).and_then(|id| self.nodes.get(*id))
    }

    pub fn file(&self, path: &str) -> Option<&FileEntry> {
        self.lookup(path).and_then(VaultNode::as_file)
    }

    pub fn directory(&self, path: &str) -> Option<&DirectoryEntry> {
        self.lookup(path).and_then(VaultNode::as_directory)
    }

    /// Direct children of a directory in insertion order
    pub fn children<'a>(&'a self, dir: &'a DirectoryEntry) -> impl Iterator<Item = &'a VaultNode> + 'a {
        dir.children.iter().filter_map(move |id| self.nodes.get(*id))
    }

    /// `dir/<dir.name>.md` when present; the root never has one
    pub fn folder_note(&self, dir: &DirectoryEntry) -> Option<&FileEntry> {
        dir.folder_note_path().and_then(|path| self.file(&path))
    }

    /// Directory containing `path`; `None` for the root and unknown paths
    pub fn parent_directory(&self, path: &str) -> Option<&DirectoryEntry> {
        let parent = match self.lookup(path)? {
            VaultNode::File(file) => file.parent.as_str(),
            VaultNode::Directory(dir) => dir.parent.as_deref()?,
        };
        self.directory(parent)
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    // ============================================
    // MUTATION
    // ============================================

    /// Create a directory and any missing ancestors. Idempotent.
    pub fn add_folder(&mut self, path: &str) -> Result<NodeId> {
        let path = normalize_path(path);
        if let Some(&id) = self.index.get(&path) {
            return match &self.nodes[id] {
                VaultNode::Directory(_) => Ok(id),
                VaultNode::File(_) => Err(ExplorerError::AlreadyExists(path)),
            };
        }

        let (parent, _) = split_path(&path);
        let parent_id = self.add_folder(parent)?;
        Ok(self.insert(parent_id, VaultNode::Directory(DirectoryEntry::new(&path))))
    }

    /// Insert a file, creating parent directories. An existing file at the
    /// same path has its stat refreshed.
    pub fn add_file(&mut self, path: &str, stat: FileStat) -> Result<NodeId> {
        let entry = FileEntry::new(path, stat);
        if entry.path == ROOT_PATH {
            return Err(ExplorerError::InvalidName(path.to_string()));
        }
        if let Some(&id) = self.index.get(&entry.path) {
            return match &mut self.nodes[id] {
                VaultNode::File(existing) => {
                    existing.stat = stat;
                    Ok(id)
                }
                VaultNode::Directory(_) => Err(ExplorerError::AlreadyExists(entry.path)),
            };
        }

        let parent_id = self.add_folder(&entry.parent)?;
        Ok(self.insert(parent_id, VaultNode::File(entry)))
    }

    fn insert(&mut self, parent_id: NodeId, node: VaultNode) -> NodeId {
        let id = self.nodes.len();
        self.index.insert(node.path().to_string(), id);
        self.nodes.push(node);
        if let Some(VaultNode::Directory(parent)) = self.nodes.get_mut(parent_id) {
            parent.children.push(id);
        }
        id
    }

    // ============================================
    // FILESYSTEM SCAN
    // ============================================

    /// Build a snapshot from a directory on disk. Hidden entries are
    /// skipped and siblings are ordered by name.
    pub fn scan(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(ExplorerError::NotFound(root.display().to_string()));
        }
        tracing::debug!("[VaultTree::scan] Scanning {:?}", root);

        let mut tree = Self::new();
        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("[VaultTree::scan] Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let Some(rel) = relative_path(root, entry.path()) else {
                continue;
            };

            if entry.file_type().is_dir() {
                tree.add_folder(&rel)?;
            } else if entry.file_type().is_file() {
                let stat = match entry.metadata() {
                    Ok(meta) => stat_from_metadata(&meta),
                    Err(e) => {
                        tracing::warn!("[VaultTree::scan] No metadata for {}: {}", rel, e);
                        FileStat::default()
                    }
                };
                tree.add_file(&rel, stat)?;
            }
        }

        tracing::debug!("[VaultTree::scan] Indexed {} nodes", tree.len());
        Ok(tree)
    }

    /// `scan` on the blocking pool
    pub async fn load(root: PathBuf) -> Result<Self> {
        tokio::task::spawn_blocking(move || Self::scan(&root)).await?
    }
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

/// Vault-relative, '/'-separated form of `path`
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

fn millis(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

pub(crate) fn stat_from_metadata(meta: &std::fs::Metadata) -> FileStat {
    let mtime = meta.modified().map(millis).unwrap_or(0);
    let ctime = meta.created().map(millis).unwrap_or(mtime);
    FileStat { ctime, mtime, size: meta.len() }
}
