// Host tree nodes: files and directories as a tagged union
// Paths are vault-relative with '/' separators; the root is "/"

use serde::{Deserialize, Serialize};

/// Index of a node inside a `VaultTree` arena
pub type NodeId = usize;

pub const ROOT_PATH: &str = "/";

/// Timestamps in milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    pub ctime: i64,
    pub mtime: i64,
    pub size: u64,
}

impl FileStat {
    pub fn new(ctime: i64, mtime: i64) -> Self {
        Self { ctime, mtime, size: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub path: String,
    pub name: String,
    pub basename: String,
    pub extension: String,
    pub parent: String,
    pub stat: FileStat,
}

impl FileEntry {
    pub fn new(path: &str, stat: FileStat) -> Self {
        let path = normalize_path(path);
        let (parent, name) = split_path(&path);
        let (parent, name) = (parent.to_string(), name.to_string());
        let (basename, extension) = match name.rfind('.') {
            Some(dot) if dot > 0 => (name[..dot].to_string(), name[dot + 1..].to_string()),
            _ => (name.clone(), String::new()),
        };
        Self { path, name, basename, extension, parent, stat }
    }

    /// Case-insensitive extension check
    pub fn has_extension(&self, ext: &str) -> bool {
        self.extension.eq_ignore_ascii_case(ext)
    }

    pub fn extension_in(&self, list: &[&str]) -> bool {
        list.iter().any(|ext| self.has_extension(ext))
    }

    /// Name of the containing directory (empty for files at the root)
    pub fn parent_name(&self) -> &str {
        split_path(&self.parent).1
    }

    /// `Foo/Foo.md` is the note for folder `Foo`
    pub fn is_folder_note(&self) -> bool {
        !self.basename.is_empty() && self.basename == self.parent_name()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub path: String,
    pub name: String,
    pub parent: Option<String>,
    #[serde(skip)]
    pub children: Vec<NodeId>,
}

impl DirectoryEntry {
    pub fn root() -> Self {
        Self {
            path: ROOT_PATH.to_string(),
            name: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn new(path: &str) -> Self {
        let path = normalize_path(path);
        let (parent, name) = split_path(&path);
        let (parent, name) = (parent.to_string(), name.to_string());
        Self { path, name, parent: Some(parent), children: Vec::new() }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Path of the note that conventionally represents this directory
    pub fn folder_note_path(&self) -> Option<String> {
        if self.is_root() {
            return None;
        }
        Some(join_path(&self.path, &format!("{}.md", self.name)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultNode {
    File(FileEntry),
    Directory(DirectoryEntry),
}

impl VaultNode {
    pub fn path(&self) -> &str {
        match self {
            Self::File(f) => &f.path,
            Self::Directory(d) => &d.path,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::File(f) => &f.name,
            Self::Directory(d) => &d.name,
        }
    }

    pub fn as_file(&self) -> Option<&FileEntry> {
        match self {
            Self::File(f) => Some(f),
            Self::Directory(_) => None,
        }
    }

    pub fn as_directory(&self) -> Option<&DirectoryEntry> {
        match self {
            Self::File(_) => None,
            Self::Directory(d) => Some(d),
        }
    }
}

// ============================================
// PATH HELPERS
// ============================================

/// Strip leading/trailing separators; empty means root
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        ROOT_PATH.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Join a child name onto a directory path
pub fn join_path(parent: &str, name: &str) -> String {
    if parent == ROOT_PATH || parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Split into (parent path, last segment); the root's parent is itself
pub fn split_path(path: &str) -> (&str, &str) {
    if path == ROOT_PATH {
        return (ROOT_PATH, "");
    }
    match path.rfind('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => (ROOT_PATH, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_entry_parts() {
        let file = FileEntry::new("Projects/Alpha/plan.v2.md", FileStat::default());
        assert_eq!(file.name, "plan.v2.md");
        assert_eq!(file.basename, "plan.v2");
        assert_eq!(file.extension, "md");
        assert_eq!(file.parent, "Projects/Alpha");
        assert_eq!(file.parent_name(), "Alpha");
    }

    #[test]
    fn test_root_level_file() {
        let file = FileEntry::new("/README", FileStat::default());
        assert_eq!(file.path, "README");
        assert_eq!(file.parent, ROOT_PATH);
        assert_eq!(file.extension, "");
        assert!(!file.is_folder_note());
    }

    #[test]
    fn test_folder_note_detection() {
        assert!(FileEntry::new("Project/Project.md", FileStat::default()).is_folder_note());
        assert!(!FileEntry::new("Project/Notes.md", FileStat::default()).is_folder_note());
        assert!(FileEntry::new("a/Project/Project.pdf", FileStat::default()).is_folder_note());
    }

    #[test]
    fn test_dotfile_has_no_extension() {
        let file = FileEntry::new("Inbox/.hidden", FileStat::default());
        assert_eq!(file.basename, ".hidden");
        assert_eq!(file.extension, "");
    }

    #[test]
    fn test_directory_folder_note_path() {
        assert_eq!(DirectoryEntry::root().folder_note_path(), None);
        assert_eq!(
            DirectoryEntry::new("Work/Clients").folder_note_path().as_deref(),
            Some("Work/Clients/Clients.md")
        );
        assert_eq!(
            DirectoryEntry::new("Work").folder_note_path().as_deref(),
            Some("Work/Work.md")
        );
    }

    #[test]
    fn test_join_and_split() {
        assert_eq!(join_path(ROOT_PATH, "a.md"), "a.md");
        assert_eq!(join_path("x/y", "a.md"), "x/y/a.md");
        assert_eq!(split_path("x/y/a.md"), ("x/y", "a.md"));
        assert_eq!(split_path("a.md"), (ROOT_PATH, "a.md"));
        assert_eq!(normalize_path("//"), ROOT_PATH);
    }
}
