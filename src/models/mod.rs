// Models for the folder explorer
// Serialized fields use camelCase to match the host's settings files

pub mod listing;
pub mod node;
pub mod settings;

pub use listing::{FileInfo, FolderDescriptor, Frontmatter, Listing};
pub use node::{
    join_path, normalize_path, split_path, DirectoryEntry, FileEntry, FileStat, NodeId, VaultNode,
    ROOT_PATH,
};
pub use settings::{
    BlockSettings, BlockSettingsOverride, CardExt, PluginSettings, SettingOption, SortBy, ViewMode,
};
