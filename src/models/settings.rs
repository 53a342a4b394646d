// Settings models for explorer blocks
// Plugin-level defaults and per-block overrides share one field set

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    Newest,
    #[default]
    Oldest,
    Edited,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Cards,
    #[default]
    List,
    Tree,
}

/// What a card shows in its footer; `Default` is resolved per render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardExt {
    Folder,
    Ctime,
    Mtime,
    Desc,
    None,
    #[default]
    Default,
}

/// Enum-valued settings expose their wire names to the schema
pub trait SettingOption: Copy + Sized + 'static {
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;

    fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == raw)
    }
}

impl SettingOption for SortBy {
    const ALL: &'static [Self] = &[Self::Newest, Self::Oldest, Self::Edited, Self::Name];

    fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Edited => "edited",
            Self::Name => "name",
        }
    }
}

impl SettingOption for ViewMode {
    const ALL: &'static [Self] = &[Self::Cards, Self::List, Self::Tree];

    fn as_str(self) -> &'static str {
        match self {
            Self::Cards => "cards",
            Self::List => "list",
            Self::Tree => "tree",
        }
    }
}

impl SettingOption for CardExt {
    const ALL: &'static [Self] = &[
        Self::Folder,
        Self::Ctime,
        Self::Mtime,
        Self::Desc,
        Self::None,
        Self::Default,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Ctime => "ctime",
            Self::Mtime => "mtime",
            Self::Desc => "desc",
            Self::None => "none",
            Self::Default => "default",
        }
    }
}

/// Fully resolved settings for one explorer block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSettings {
    pub view: ViewMode,
    pub sort_by: SortBy,
    pub depth: u32,
    pub use_pagination: bool,
    pub show_tags: bool,
    pub page_size: u32,
    pub show_unsupported_files: bool,
    pub card_ext: CardExt,
    pub show_folders: bool,
    pub show_notes: bool,
    pub only_notes: bool,
    pub allow_search: bool,
    pub show_parent_button: bool,
    pub show_breadcrumbs: bool,
}

impl Default for BlockSettings {
    fn default() -> Self {
        crate::schema::default_block_settings()
    }
}

/// Partial settings parsed from a block (all fields optional)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BlockSettingsOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<ViewMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_pagination: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_tags: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_unsupported_files: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_ext: Option<CardExt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_folders: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_notes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_notes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_search: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_parent_button: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_breadcrumbs: Option<bool>,
}

impl BlockSettingsOverride {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Persisted plugin-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PluginSettings {
    pub default_block_settings: BlockSettings,
}
