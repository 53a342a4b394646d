// Folder explorer engine: indexes a vault folder, resolves per-block
// settings and produces filtered, sorted and paged listings for explorer
// blocks embedded in notes. The `tauri` feature exposes it as a plugin.

pub mod actions;
pub mod block;
pub mod constants;
pub mod error;
pub mod events;
pub mod explorer;
pub mod helpers;
pub mod index;
pub mod listing;
pub mod metadata;
pub mod models;
pub mod schema;
pub mod session;
pub mod storage;
pub mod tree;

#[cfg(feature = "tauri")]
pub mod commands;

pub use actions::FsVault;
pub use block::{format_block, parse_block_settings, serialize_block_settings, LineRange};
pub use error::{ExplorerError, LogNotifier, Notice, Notifier, Result};
pub use events::{watch_vault, EventBus, RefreshQueue, Subscription, VaultEvent, VaultWatcher};
pub use explorer::{
    build_render_model, resolve_settings, resolve_settings_from_source, Explorer, ExplorerView,
    RenderModel,
};
pub use index::{ContentOptions, FolderIndex};
pub use listing::compute_listing;
pub use metadata::{FrontmatterCache, MemoryMetadata, MetadataSource};
pub use models::{
    BlockSettings, BlockSettingsOverride, CardExt, DirectoryEntry, FileEntry, FileInfo, FileStat,
    FolderDescriptor, Frontmatter, Listing, PluginSettings, SortBy, ViewMode,
};
pub use session::{DebouncedQueries, ExplorerSession, QueryDebouncer};
pub use storage::{SettingsState, SettingsStore};
pub use tree::VaultTree;

#[cfg(feature = "tauri")]
pub use commands::init;

/// Install a fmt subscriber at `level`. Safe to call more than once; later
/// calls are ignored.
pub fn init_logging(level: tracing::Level) {
    if tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .is_err()
    {
        tracing::debug!("[init_logging] Subscriber already installed");
    }
}
