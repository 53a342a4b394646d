// Explorer facade: settings resolution, render models over a tree
// snapshot, and the vault actions a block can trigger

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::actions::FsVault;
use crate::block::{format_block, parse_block_settings, LineRange};
use crate::constants::NO_CONTEXT_MESSAGE;
use crate::error::{report, Notifier, Result};
use crate::events::{EventBus, RefreshQueue, Subscription, VaultEvent};
use crate::helpers::{card_footer_text, now_millis};
use crate::index::{ContentOptions, FolderIndex};
use crate::listing::{normal_source_files, resolve_card_footer};
use crate::metadata::FrontmatterCache;
use crate::models::{
    BlockSettings, BlockSettingsOverride, CardExt, DirectoryEntry, FileEntry, FileInfo,
    FolderDescriptor, Listing, ViewMode,
};
use crate::schema::{coerce_block_settings, resolve_block_settings};
use crate::session::ExplorerSession;
use crate::storage::SettingsState;
use crate::tree::VaultTree;

// ============================================
// SETTINGS RESOLUTION
// ============================================

pub fn resolve_settings(defaults: &BlockSettings, overrides: &BlockSettingsOverride) -> BlockSettings {
    resolve_block_settings(defaults, overrides)
}

/// Effective settings for a block given its raw text
pub fn resolve_settings_from_source(source: &str, defaults: &BlockSettings) -> BlockSettings {
    resolve_settings(defaults, &parse_block_settings(source))
}

// ============================================
// RENDER MODEL
// ============================================

/// Everything a block needs to render its folder, built per render
pub struct RenderModel<'a> {
    index: FolderIndex<'a>,
    depth_files: Vec<&'a FileEntry>,
    all_files: OnceCell<Vec<&'a FileEntry>>,
}

impl<'a> RenderModel<'a> {
    pub fn folder(&self) -> &'a DirectoryEntry {
        self.index.folder()
    }

    pub fn folder_note(&self) -> Option<&'a FileEntry> {
        self.index.folder_note()
    }

    pub fn folder_infos(&self) -> &[FolderDescriptor<'a>] {
        self.index.folders()
    }

    pub fn folder_notes(&self) -> &[&'a FileEntry] {
        self.index.folder_notes()
    }

    /// Visible files down to the configured depth
    pub fn depth_files(&self) -> &[&'a FileEntry] {
        &self.depth_files
    }

    pub fn normal_source_files(&self, settings: &BlockSettings) -> Vec<&'a FileEntry> {
        normal_source_files(&self.depth_files, self.index.folder_notes(), settings)
    }

    /// Everything below the folder, loaded on first use and then cached
    pub async fn all_files(&self) -> &[&'a FileEntry] {
        self.all_files_with(ContentOptions::new()).await
    }

    /// Like `all_files`, with control over batching and cancellation of the
    /// first load. A cancelled load is cached as what it delivered.
    pub async fn all_files_with(&self, options: ContentOptions<'_>) -> &[&'a FileEntry] {
        self.all_files
            .get_or_init(|| self.index.get_all_content(options))
            .await
    }

    pub fn is_all_files_loaded(&self) -> bool {
        self.all_files.initialized()
    }
}

/// Locate the block's document and index its folder to `settings.depth`.
/// `None` when the document or its folder is gone.
pub fn build_render_model<'a>(
    tree: &'a VaultTree,
    source_path: &str,
    settings: &BlockSettings,
) -> Option<RenderModel<'a>> {
    let document = tree.file(source_path)?;
    let folder = tree.directory(&document.parent)?;

    let mut index = FolderIndex::new(tree, folder);
    index.load_to_depth(settings.depth);
    let depth_files = index.files_to_display(settings);

    tracing::debug!(
        "[build_render_model] {} -> folder '{}' ({} files)",
        source_path,
        folder.path,
        depth_files.len()
    );
    Some(RenderModel {
        index,
        depth_files,
        all_files: OnceCell::new(),
    })
}

// ============================================
// VIEW PAYLOAD
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderCard {
    pub path: String,
    pub name: String,
    pub folder_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCard {
    pub path: String,
    pub name: String,
    pub basename: String,
    pub extension: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub is_favorite: bool,
    pub is_folder_note: bool,
    pub footer: Option<String>,
}

impl FileCard {
    fn new(info: &FileInfo<'_>, footer_mode: CardExt, now_ms: i64) -> Self {
        Self {
            path: info.file.path.clone(),
            name: info.file.name.clone(),
            basename: info.file.basename.clone(),
            extension: info.file.extension.clone(),
            description: info.description.clone(),
            tags: info.tags.clone(),
            is_pinned: info.is_pinned,
            is_favorite: info.is_favorite,
            is_folder_note: info.is_folder_note,
            footer: card_footer_text(info, footer_mode, now_ms),
        }
    }
}

/// Owned snapshot of one rendered block, ready to hand to a front end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerView {
    pub placeholder: Option<String>,
    pub folder: Option<String>,
    pub folder_note: Option<String>,
    pub folders: Vec<FolderCard>,
    pub files: Vec<FileCard>,
    pub view: ViewMode,
    pub card_footer: CardExt,
    pub current_page: usize,
    pub total_pages: usize,
    pub use_paging: bool,
    pub settings: BlockSettings,
    pub session: ExplorerSession,
}

impl ExplorerView {
    /// Shown when the block has no document or folder to list
    pub fn placeholder(settings: BlockSettings, session: ExplorerSession) -> Self {
        Self {
            placeholder: Some(NO_CONTEXT_MESSAGE.to_string()),
            folder: None,
            folder_note: None,
            folders: Vec::new(),
            files: Vec::new(),
            view: settings.view,
            card_footer: resolve_card_footer(&settings),
            current_page: 0,
            total_pages: 1,
            use_paging: false,
            settings,
            session,
        }
    }

    pub fn from_listing(
        model: &RenderModel<'_>,
        listing: &Listing<'_>,
        settings: BlockSettings,
        session: ExplorerSession,
    ) -> Self {
        let footer_mode = resolve_card_footer(&settings);
        let now = now_millis();
        let folders = if settings.show_folders {
            model
                .folder_infos()
                .iter()
                .map(|info| FolderCard {
                    path: info.directory.path.clone(),
                    name: info.directory.name.clone(),
                    folder_note: info.folder_note.map(|note| note.path.clone()),
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            placeholder: None,
            folder: Some(model.folder().path.clone()),
            folder_note: model.folder_note().map(|note| note.path.clone()),
            folders,
            files: listing
                .page_file_infos
                .iter()
                .map(|info| FileCard::new(info, footer_mode, now))
                .collect(),
            view: settings.view,
            card_footer: footer_mode,
            current_page: session.current_page(),
            total_pages: listing.total_pages,
            use_paging: listing.use_paging,
            settings,
            session,
        }
    }
}

// ============================================
// EXPLORER
// ============================================

/// A vault on disk plus the state shared by every explorer block in it
pub struct Explorer {
    vault: FsVault,
    settings: SettingsState,
    metadata: Arc<FrontmatterCache>,
    notifier: Arc<dyn Notifier + Send + Sync>,
    tree: RwLock<Arc<VaultTree>>,
    // Unbounded folder contents (file paths) for the current snapshot
    all_content: Mutex<HashMap<String, Arc<Vec<String>>>>,
    bus: EventBus,
    refresh: Arc<RefreshQueue>,
    _refresh_subscription: Subscription,
}

impl Explorer {
    pub async fn open(
        root: impl Into<PathBuf>,
        settings: SettingsState,
        notifier: Arc<dyn Notifier + Send + Sync>,
    ) -> Result<Self> {
        let root = root.into();
        let tree = VaultTree::load(root.clone()).await?;
        tracing::info!("[Explorer::open] {:?} ({} nodes)", root, tree.len());

        let bus = EventBus::new();
        let refresh = Arc::new(RefreshQueue::new());
        let metadata = Arc::new(FrontmatterCache::new(root.clone()));

        let queue = Arc::clone(&refresh);
        let cache = Arc::clone(&metadata);
        let subscription = bus.subscribe(move |event| {
            match event {
                VaultEvent::Deleted { path } | VaultEvent::Renamed { from: path, .. } => {
                    cache.invalidate(path)
                }
                VaultEvent::Created { .. } => {}
            }
            queue.request();
        });

        Ok(Self {
            metadata,
            vault: FsVault::new(root),
            settings,
            notifier,
            tree: RwLock::new(Arc::new(tree)),
            all_content: Mutex::new(HashMap::new()),
            bus,
            refresh,
            _refresh_subscription: subscription,
        })
    }

    pub fn vault(&self) -> &FsVault {
        &self.vault
    }

    pub fn settings(&self) -> &SettingsState {
        &self.settings
    }

    pub fn metadata(&self) -> &FrontmatterCache {
        &self.metadata
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn refresh_queue(&self) -> &Arc<RefreshQueue> {
        &self.refresh
    }

    /// Current tree snapshot; later reloads do not affect it
    pub fn snapshot(&self) -> Arc<VaultTree> {
        Arc::clone(&self.tree.read())
    }

    /// Rescan the vault and swap in the new snapshot. The pending refresh
    /// is claimed before scanning, so events that arrive mid-scan stay
    /// pending for the next reload.
    pub async fn reload(&self) -> Result<()> {
        self.refresh.take();
        let tree = VaultTree::load(self.vault.root().to_path_buf()).await?;
        {
            let mut current = self.tree.write();
            *current = Arc::new(tree);
            self.all_content.lock().clear();
        }
        tracing::debug!("[Explorer::reload] Snapshot replaced");
        Ok(())
    }

    /// Whether search content for `folder` is cached for the current snapshot
    pub fn is_content_cached(&self, folder: &str) -> bool {
        self.all_content.lock().contains_key(folder)
    }

    /// Everything below the model's folder. Loaded once per snapshot and
    /// shared by every block over that folder, search open or closed.
    async fn all_content<'t>(&self, tree: &'t Arc<VaultTree>, model: &RenderModel<'t>) -> Vec<&'t FileEntry> {
        let folder = &model.folder().path;
        let cached = self.all_content.lock().get(folder).cloned();
        if let Some(paths) = cached {
            tracing::debug!("[Explorer::all_content] Cache hit for '{}'", folder);
            return paths.iter().filter_map(|path| tree.file(path)).collect();
        }

        let options = ContentOptions::new().on_batch(|batch| {
            tracing::debug!("[Explorer::all_content] Batch of {} files", batch.len());
        });
        let files = model.all_files_with(options).await.to_vec();

        // A reload may have replaced the snapshot while walking
        let current = self.snapshot();
        if Arc::ptr_eq(&current, tree) {
            let paths: Vec<String> = files.iter().map(|file| file.path.clone()).collect();
            self.all_content.lock().insert(folder.clone(), Arc::new(paths));
        }
        files
    }

    /// Reload only when a vault event arrived since the last reload
    pub async fn reload_if_pending(&self) -> Result<bool> {
        if !self.refresh.is_pending() {
            return Ok(false);
        }
        self.reload().await?;
        Ok(true)
    }

    /// Effective settings for a block's raw text
    pub fn block_settings(&self, source: &str) -> BlockSettings {
        resolve_settings_from_source(source, &self.settings.defaults())
    }

    /// Build the view for one block and advance its session (page clamping)
    pub async fn view(&self, source_path: &str, source: &str, mut session: ExplorerSession) -> ExplorerView {
        let settings = self.block_settings(source);
        let tree = self.snapshot();
        let Some(model) = build_render_model(&tree, source_path, &settings) else {
            tracing::debug!("[Explorer::view] No context for {}", source_path);
            return ExplorerView::placeholder(settings, session);
        };

        let normal = model.normal_source_files(&settings);
        let all = if session.search_mode() {
            Some(self.all_content(&tree, &model).await)
        } else {
            None
        };
        let listing = session.listing(&normal, all.as_deref(), &settings, self.metadata.as_ref());
        ExplorerView::from_listing(&model, &listing, settings, session)
    }

    // ============================================
    // ACTIONS
    // ============================================

    /// Write `settings` back into the block as differences from the plugin
    /// defaults. Values are coerced against the schema first (numbers clamp),
    /// so the block only ever holds values that parse back. Returns whether
    /// the document changed.
    pub async fn update_block_settings(
        &self,
        source_path: &str,
        range: Option<LineRange>,
        settings: &BlockSettings,
    ) -> bool {
        let defaults = self.settings.defaults();
        let result: Result<bool> = async {
            let raw = serde_json::to_value(settings)?;
            let settings = coerce_block_settings(Some(&raw), &defaults);
            let block = format_block(&settings, &defaults);
            self.vault.rewrite_embedded_block(source_path, range, &block).await
        }
        .await;
        report(result, "Failed to update explorer block", self.notifier.as_ref()).unwrap_or(false)
    }

    pub async fn create_folder(&self, base: &str, name: &str) -> Option<FileEntry> {
        let result = self.vault.create_folder_with_note(base, name).await;
        let note = report(result, "Failed to create folder", self.notifier.as_ref())?;
        self.bus.emit(&VaultEvent::Created { path: note.parent.clone() });
        Some(note)
    }

    pub async fn create_note(&self, base: &str, name: &str) -> Option<FileEntry> {
        let result = self.vault.create_note(base, name).await;
        let note = report(result, "Failed to create note", self.notifier.as_ref())?;
        self.bus.emit(&VaultEvent::Created { path: note.path.clone() });
        Some(note)
    }

    /// Resolve (or create) the note that stands for `folder_path`
    pub async fn open_folder_note(&self, folder_path: &str) -> Option<FileEntry> {
        let directory = self.snapshot().directory(folder_path).cloned();
        let directory = match directory {
            Some(dir) => dir,
            None => {
                let err = crate::error::ExplorerError::NotFound(folder_path.to_string());
                return report(Err(err), "Failed to create folder note", self.notifier.as_ref());
            }
        };
        let result = self.vault.open_or_create_folder_note(&directory).await;
        let note = report(result, "Failed to create folder note", self.notifier.as_ref())?;
        if self.snapshot().file(&note.path).is_none() {
            self.bus.emit(&VaultEvent::Created { path: note.path.clone() });
        }
        Some(note)
    }
}
