// Folder index: immediate children, depth-bounded BFS and the unbounded
// batched walk used by search

use std::collections::VecDeque;

use tokio_util::sync::CancellationToken;

use crate::constants::{DEFAULT_CHUNK_SIZE, EXCLUDED_EXTENSIONS};
use crate::listing::apply_visibility_rules;
use crate::models::{BlockSettings, DirectoryEntry, FileEntry, FolderDescriptor, VaultNode};
use crate::tree::VaultTree;

/// Files that may appear in a listing at all: folder notes are shown
/// through their folder, and the denylisted formats never show
pub fn is_listable(file: &FileEntry) -> bool {
    !file.is_folder_note() && !file.extension_in(EXCLUDED_EXTENSIONS)
}

// ============================================
// WALK OPTIONS
// ============================================

type BatchCallback<'cb> = Box<dyn FnMut(&[&FileEntry]) + Send + 'cb>;

/// Options for `FolderIndex::get_all_content`
pub struct ContentOptions<'cb> {
    chunk_size: usize,
    include_folder_notes: bool,
    cancel: Option<CancellationToken>,
    on_batch: Option<BatchCallback<'cb>>,
}

impl Default for ContentOptions<'_> {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            include_folder_notes: false,
            cancel: None,
            on_batch: None,
        }
    }
}

impl<'cb> ContentOptions<'cb> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Children visited between batches; 0 disables batching and yielding
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Also collect the folder notes of the first-level subfolders
    pub fn include_folder_notes(mut self, include: bool) -> Self {
        self.include_folder_notes = include;
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn on_batch(mut self, callback: impl FnMut(&[&FileEntry]) + Send + 'cb) -> Self {
        self.on_batch = Some(Box::new(callback));
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    fn deliver(&mut self, batch: &[&FileEntry]) {
        if let Some(callback) = self.on_batch.as_mut() {
            callback(batch);
        }
    }
}

// ============================================
// BFS WALK
// ============================================

/// Breadth-first walk below a directory. Each item is one visited child:
/// the file it contributed, if any.
struct Walk<'a> {
    tree: &'a VaultTree,
    queue: VecDeque<(&'a DirectoryEntry, u32)>,
    current: Option<(&'a DirectoryEntry, u32, usize)>,
    max_depth: Option<u32>,
    include_folder_notes: bool,
}

impl<'a> Walk<'a> {
    fn new(
        tree: &'a VaultTree,
        start: &'a DirectoryEntry,
        max_depth: Option<u32>,
        include_folder_notes: bool,
    ) -> Self {
        Self {
            tree,
            queue: VecDeque::from([(start, 0)]),
            current: None,
            max_depth,
            include_folder_notes,
        }
    }

    fn visit(&mut self, node: &'a VaultNode, depth: u32) -> Option<&'a FileEntry> {
        match node {
            VaultNode::File(file) => is_listable(file).then_some(file),
            VaultNode::Directory(dir) => {
                if self.max_depth.is_none_or(|max| depth < max) {
                    self.queue.push_back((dir, depth + 1));
                }
                // First-level folder notes are opt-in, deeper ones always count
                if depth > 0 || self.include_folder_notes {
                    self.tree.folder_note(dir)
                } else {
                    None
                }
            }
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = Option<&'a FileEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        loop {
            let (dir, depth, pos) = match self.current {
                Some(current) => current,
                None => {
                    let (dir, depth) = self.queue.pop_front()?;
                    (dir, depth, 0)
                }
            };
            let Some(&child) = dir.children.get(pos) else {
                self.current = None;
                continue;
            };
            self.current = Some((dir, depth, pos + 1));
            return Some(tree.node(child).and_then(|node| self.visit(node, depth)));
        }
    }
}

// ============================================
// FOLDER INDEX
// ============================================

/// Per-render snapshot of one folder's contents
#[derive(Debug, Clone)]
pub struct FolderIndex<'a> {
    tree: &'a VaultTree,
    folder: &'a DirectoryEntry,
    folder_note: Option<&'a FileEntry>,
    files: Vec<&'a FileEntry>,
    folders: Vec<FolderDescriptor<'a>>,
    folder_notes: Vec<&'a FileEntry>,
    nested_files: Vec<&'a FileEntry>,
}

impl<'a> FolderIndex<'a> {
    pub fn new(tree: &'a VaultTree, folder: &'a DirectoryEntry) -> Self {
        Self {
            tree,
            folder,
            folder_note: tree.folder_note(folder),
            files: Vec::new(),
            folders: Vec::new(),
            folder_notes: Vec::new(),
            nested_files: Vec::new(),
        }
    }

    pub fn folder(&self) -> &'a DirectoryEntry {
        self.folder
    }

    pub fn folder_note(&self) -> Option<&'a FileEntry> {
        self.folder_note
    }

    pub fn files(&self) -> &[&'a FileEntry] {
        &self.files
    }

    pub fn folders(&self) -> &[FolderDescriptor<'a>] {
        &self.folders
    }

    pub fn folder_notes(&self) -> &[&'a FileEntry] {
        &self.folder_notes
    }

    pub fn nested_files(&self) -> &[&'a FileEntry] {
        &self.nested_files
    }

    /// Index the direct children only
    pub fn load_immediate(&mut self) {
        self.files.clear();
        self.folders.clear();
        self.folder_notes.clear();

        let tree = self.tree;
        for child in tree.children(self.folder) {
            match child {
                VaultNode::File(file) => {
                    if is_listable(file) {
                        self.files.push(file);
                    }
                }
                VaultNode::Directory(directory) => {
                    let folder_note = tree.folder_note(directory);
                    self.folders.push(FolderDescriptor { directory, folder_note });
                    if let Some(note) = folder_note {
                        self.folder_notes.push(note);
                    }
                }
            }
        }

        self.nested_files = self.files.clone();
        tracing::debug!(
            "[FolderIndex::load_immediate] {}: {} files, {} folders",
            self.folder.path,
            self.files.len(),
            self.folders.len()
        );
    }

    /// Index direct children, then up to `depth` extra levels into
    /// `nested_files` (BFS, shallower files first)
    pub fn load_to_depth(&mut self, depth: u32) {
        self.load_immediate();
        if depth > 0 {
            self.nested_files = Walk::new(self.tree, self.folder, Some(depth), false)
                .flatten()
                .collect();
            tracing::debug!(
                "[FolderIndex::load_to_depth] depth {} -> {} nested files",
                depth,
                self.nested_files.len()
            );
        }
    }

    pub fn reset_depth(&mut self, depth: u32) {
        self.nested_files.clear();
        self.load_to_depth(depth);
    }

    /// Unbounded walk of everything below the folder.
    ///
    /// Every `chunk_size` visited children the pending batch goes to the
    /// callback and the task yields. After cancellation no batch is
    /// delivered and the result holds only already-delivered files.
    pub async fn get_all_content(&self, mut options: ContentOptions<'_>) -> Vec<&'a FileEntry> {
        let chunk_size = options.chunk_size;
        let mut walk = Walk::new(self.tree, self.folder, None, options.include_folder_notes);
        let mut results: Vec<&'a FileEntry> = Vec::new();
        let mut delivered = 0;
        let mut processed = 0;

        loop {
            if options.is_cancelled() {
                tracing::debug!(
                    "[FolderIndex::get_all_content] Cancelled after {} files",
                    delivered
                );
                results.truncate(delivered);
                return results;
            }
            let Some(step) = walk.next() else {
                break;
            };
            if let Some(file) = step {
                results.push(file);
            }

            if chunk_size > 0 {
                processed += 1;
                if processed >= chunk_size {
                    processed = 0;
                    if results.len() > delivered {
                        options.deliver(&results[delivered..]);
                        delivered = results.len();
                    }
                    tokio::task::yield_now().await;
                }
            }
        }

        if results.len() > delivered {
            options.deliver(&results[delivered..]);
        }
        results
    }

    /// Files for the normal (non-search) listing
    pub fn files_to_display(&self, settings: &BlockSettings) -> Vec<&'a FileEntry> {
        let source = if settings.depth > 0 {
            &self.nested_files
        } else {
            &self.files
        };
        apply_visibility_rules(source, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileStat;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// root/
    ///   a.md, data.json, b.pdf
    ///   Alpha/ (Alpha.md, a1.md, Deep/ (Deep.md, d1.md, Deeper/ (x.md)))
    ///   Beta/ (b1.md)
    fn sample() -> VaultTree {
        let mut tree = VaultTree::new();
        for path in [
            "a.md",
            "data.json",
            "b.pdf",
            "Alpha/Alpha.md",
            "Alpha/a1.md",
            "Alpha/Deep/Deep.md",
            "Alpha/Deep/d1.md",
            "Alpha/Deep/Deeper/x.md",
            "Beta/b1.md",
        ] {
            tree.add_file(path, FileStat::new(1, 1)).unwrap();
        }
        tree
    }

    fn paths(files: &[&FileEntry]) -> Vec<String> {
        files.iter().map(|f| f.path.clone()).collect()
    }

    #[test]
    fn test_load_immediate() {
        let tree = sample();
        let mut index = FolderIndex::new(&tree, tree.root());
        index.load_immediate();
        assert_eq!(paths(index.files()), vec!["a.md", "b.pdf"]);
        assert_eq!(index.folders().len(), 2);
        assert_eq!(index.folders()[0].folder_note.unwrap().path, "Alpha/Alpha.md");
        assert!(index.folders()[1].folder_note.is_none());
        assert_eq!(paths(index.folder_notes()), vec!["Alpha/Alpha.md"]);
        assert_eq!(paths(index.nested_files()), paths(index.files()));
        assert!(index.folder_note().is_none());
    }

    #[test]
    fn test_load_to_depth_is_breadth_first() {
        let tree = sample();
        let mut index = FolderIndex::new(&tree, tree.root());
        index.load_to_depth(1);
        // Deep.md is collected as the note of a second-level folder
        assert_eq!(
            paths(index.nested_files()),
            vec!["a.md", "b.pdf", "Alpha/a1.md", "Alpha/Deep/Deep.md", "Beta/b1.md"]
        );

        index.reset_depth(3);
        let nested = paths(index.nested_files());
        let pos = |p: &str| nested.iter().position(|x| x == p).unwrap();
        assert!(pos("Alpha/a1.md") < pos("Alpha/Deep/d1.md"));
        assert!(pos("Beta/b1.md") < pos("Alpha/Deep/d1.md"));
        assert!(pos("Alpha/Deep/d1.md") < pos("Alpha/Deep/Deeper/x.md"));
        assert!(!nested.contains(&"Alpha/Alpha.md".to_string()));
        assert!(!nested.contains(&"data.json".to_string()));
    }

    #[test]
    fn test_reset_depth_to_zero_restores_immediate() {
        let tree = sample();
        let mut index = FolderIndex::new(&tree, tree.root());
        index.load_to_depth(2);
        index.reset_depth(0);
        assert_eq!(paths(index.nested_files()), vec!["a.md", "b.pdf"]);
    }

    #[test]
    fn test_empty_folder() {
        let mut tree = VaultTree::new();
        tree.add_folder("Empty").unwrap();
        let dir = tree.directory("Empty").unwrap();
        let mut index = FolderIndex::new(&tree, dir);
        index.load_to_depth(3);
        assert!(index.files().is_empty());
        assert!(index.folders().is_empty());
        assert!(index.nested_files().is_empty());
        assert!(index.folder_note().is_none());
    }

    #[test]
    fn test_files_to_display_depth_zero_uses_files() {
        let tree = sample();
        let mut index = FolderIndex::new(&tree, tree.root());
        index.load_to_depth(2);
        let settings = BlockSettings { depth: 0, ..Default::default() };
        assert_eq!(paths(&index.files_to_display(&settings)), vec!["a.md", "b.pdf"]);

        let settings = BlockSettings { depth: 2, only_notes: true, ..Default::default() };
        assert!(index.files_to_display(&settings).len() > 2);
    }

    #[tokio::test]
    async fn test_get_all_content_batches_in_order() {
        let tree = sample();
        let index = FolderIndex::new(&tree, tree.root());
        let batches: Arc<Mutex<Vec<Vec<String>>>> = Arc::default();
        let sink = batches.clone();

        let all = index
            .get_all_content(ContentOptions::new().chunk_size(2).on_batch(move |batch| {
                sink.lock().push(paths(batch));
            }))
            .await;

        let flattened: Vec<String> = batches.lock().iter().flatten().cloned().collect();
        assert_eq!(flattened, paths(&all));
        assert!(batches.lock().len() > 1);
        assert!(batches.lock().iter().all(|b| !b.is_empty()));
        assert!(all.iter().any(|f| f.path == "Alpha/Deep/Deeper/x.md"));
        assert!(!all.iter().any(|f| f.path == "Alpha/Alpha.md"));
    }

    #[tokio::test]
    async fn test_get_all_content_can_include_first_level_notes() {
        let tree = sample();
        let index = FolderIndex::new(&tree, tree.root());
        let all = index
            .get_all_content(ContentOptions::new().include_folder_notes(true))
            .await;
        assert!(all.iter().any(|f| f.path == "Alpha/Alpha.md"));
        assert_eq!(all.iter().filter(|f| f.path == "Alpha/Deep/Deep.md").count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_stops_batches() {
        let tree = sample();
        let index = FolderIndex::new(&tree, tree.root());
        let token = CancellationToken::new();
        let trigger = token.clone();
        let batches: Arc<Mutex<Vec<Vec<String>>>> = Arc::default();
        let sink = batches.clone();

        let all = index
            .get_all_content(
                ContentOptions::new()
                    .chunk_size(2)
                    .cancel_token(token)
                    .on_batch(move |batch| {
                        sink.lock().push(paths(batch));
                        trigger.cancel();
                    }),
            )
            .await;

        let batches = batches.lock();
        assert_eq!(batches.len(), 1);
        assert_eq!(paths(&all), batches[0]);
    }

    #[tokio::test]
    async fn test_cancel_before_start_returns_nothing() {
        let tree = sample();
        let index = FolderIndex::new(&tree, tree.root());
        let token = CancellationToken::new();
        token.cancel();
        let all = index
            .get_all_content(ContentOptions::new().cancel_token(token))
            .await;
        assert!(all.is_empty());
    }
}
