// Vault mutations triggered from an explorer block
// Paths are vault-relative; the vault root on disk is owned by FsVault

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tokio::fs;

use crate::block::{rewrite_block, LineRange};
use crate::constants::{FOLDER_NOTE_TEMPLATE, HOME_NOTE};
use crate::error::{ExplorerError, Result};
use crate::models::{join_path, DirectoryEntry, FileEntry, ROOT_PATH};
use crate::tree::stat_from_metadata;

/// Local-filesystem vault
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ============================================
    // PATH HELPERS
    // ============================================

    /// Map a vault path onto disk, refusing anything that escapes the root
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let rel = Path::new(path.trim_start_matches('/'));
        if rel.components().any(|c| !matches!(c, Component::Normal(_) | Component::CurDir)) {
            return Err(ExplorerError::InvalidName(path.to_string()));
        }
        Ok(self.root.join(rel))
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(fs::try_exists(self.resolve(path)?).await?)
    }

    /// Stat a file into a `FileEntry`
    pub async fn entry(&self, path: &str) -> Result<FileEntry> {
        let full = self.resolve(path)?;
        let meta = fs::metadata(&full).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ExplorerError::NotFound(path.to_string()),
            _ => ExplorerError::Io(e),
        })?;
        if !meta.is_file() {
            return Err(ExplorerError::NotFound(path.to_string()));
        }
        Ok(FileEntry::new(path, stat_from_metadata(&meta)))
    }

    // ============================================
    // CREATION
    // ============================================

    /// Create `base/name`; an existing directory is fine
    pub async fn create_directory(&self, base: &str, name: &str) -> Result<String> {
        let path = join_path(base, validate_name(name)?);
        let full = self.resolve(&path)?;
        if fs::try_exists(&full).await? && !fs::metadata(&full).await?.is_dir() {
            return Err(ExplorerError::AlreadyExists(path));
        }
        fs::create_dir_all(&full).await?;
        tracing::info!("[FsVault::create_directory] {}", path);
        Ok(path)
    }

    /// Open the note at `path`, creating it with `initial_content` if needed.
    /// An existing note is never overwritten.
    pub async fn create_or_open_note(&self, path: &str, initial_content: &str) -> Result<FileEntry> {
        if !self.exists(path).await? {
            let full = self.resolve(path)?;
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&full, initial_content).await?;
            tracing::info!("[FsVault::create_or_open_note] Created {}", path);
        }
        self.entry(path).await
    }

    /// New folder `base/name` with its folder note
    pub async fn create_folder_with_note(&self, base: &str, name: &str) -> Result<FileEntry> {
        let folder = self.create_directory(base, name).await?;
        let note = join_path(&folder, &format!("{}.md", name.trim()));
        self.create_or_open_note(&note, FOLDER_NOTE_TEMPLATE).await
    }

    /// Empty note `base/name.md`, or the existing one
    pub async fn create_note(&self, base: &str, name: &str) -> Result<FileEntry> {
        let path = join_path(base, &format!("{}.md", validate_name(name)?));
        self.create_or_open_note(&path, "").await
    }

    /// Note that represents `dir`. The root maps to the home note; otherwise
    /// a sibling `<parent>/<name>.md` wins over `<dir>/<name>.md`, which is
    /// created from the template when neither exists.
    pub async fn open_or_create_folder_note(&self, dir: &DirectoryEntry) -> Result<FileEntry> {
        let Some(inner) = dir.folder_note_path() else {
            return self.create_or_open_note(HOME_NOTE, "").await;
        };

        let parent = dir.parent.as_deref().unwrap_or(ROOT_PATH);
        let sibling = join_path(parent, &format!("{}.md", dir.name));
        if self.exists(&sibling).await? {
            return self.entry(&sibling).await;
        }

        self.create_or_open_note(&inner, FOLDER_NOTE_TEMPLATE).await
    }

    // ============================================
    // BLOCK REWRITE
    // ============================================

    /// Replace the explorer block in `document`. Returns whether the file
    /// was written; identical text is left alone.
    pub async fn rewrite_embedded_block(
        &self,
        document: &str,
        range: Option<LineRange>,
        new_block: &str,
    ) -> Result<bool> {
        let full = self.resolve(document)?;
        let content = fs::read_to_string(&full).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ExplorerError::NotFound(document.to_string()),
            _ => ExplorerError::Io(e),
        })?;

        match rewrite_block(&content, range, new_block) {
            Some(updated) => {
                fs::write(&full, updated).await?;
                tracing::info!("[FsVault::rewrite_embedded_block] Updated block in {}", document);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ExplorerError::InvalidName(name.to_string()));
    }
    Ok(name)
}
