// Declarative settings schema, coercion of untrusted input and
// two-tier resolution (plugin defaults -> block overrides)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{
    BlockSettings, BlockSettingsOverride, CardExt, PluginSettings, SettingOption, SortBy, ViewMode,
};

// ============================================
// SCHEMA TYPES
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingKey {
    View,
    SortBy,
    Depth,
    UsePagination,
    ShowTags,
    PageSize,
    ShowUnsupportedFiles,
    CardExt,
    ShowFolders,
    ShowNotes,
    OnlyNotes,
    AllowSearch,
    ShowParentButton,
    ShowBreadcrumbs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Boolean { default: bool },
    Number { min: u32, max: u32, default: u32 },
    Enum { options: &'static [&'static str], default: &'static str },
}

impl FieldKind {
    pub fn default_value(&self) -> SettingValue {
        match *self {
            Self::Boolean { default } => SettingValue::Bool(default),
            Self::Number { default, .. } => SettingValue::Number(default),
            Self::Enum { default, .. } => SettingValue::Text(default),
        }
    }
}

/// Where a setting is editable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    Plugin,
    Block,
}

/// Settings UI sections, declared in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Core,
    Behavior,
    Display,
    Navigation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingValue {
    Bool(bool),
    Number(u32),
    Text(&'static str),
}

impl std::fmt::Display for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingField {
    pub key: SettingKey,
    pub block_key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
    pub option_labels: &'static [(&'static str, &'static str)],
    pub surfaces: &'static [Surface],
    pub surface_labels: &'static [(Surface, &'static str)],
    pub section: Section,
    pub order: u32,
}

// ============================================
// SCHEMA
// ============================================

pub static BLOCK_SETTINGS_SCHEMA: &[SettingField] = &[
    SettingField {
        key: SettingKey::View,
        block_key: "view",
        label: "View",
        description: "How to display files",
        kind: FieldKind::Enum { options: &["cards", "list", "tree"], default: "list" },
        option_labels: &[("cards", "Cards"), ("list", "List"), ("tree", "Tree")],
        surfaces: &[Surface::Plugin, Surface::Block],
        surface_labels: &[(Surface::Plugin, "Default view")],
        section: Section::Core,
        order: 10,
    },
    SettingField {
        key: SettingKey::SortBy,
        block_key: "sortBy",
        label: "Sort by",
        description: "How to sort files",
        kind: FieldKind::Enum {
            options: &["newest", "oldest", "edited", "name"],
            default: "oldest",
        },
        option_labels: &[
            ("newest", "Newest"),
            ("oldest", "Oldest"),
            ("edited", "Last edited"),
            ("name", "Name"),
        ],
        surfaces: &[Surface::Plugin, Surface::Block],
        surface_labels: &[(Surface::Plugin, "Default sort")],
        section: Section::Core,
        order: 20,
    },
    SettingField {
        key: SettingKey::ShowTags,
        block_key: "showTags",
        label: "Display Tags",
        description: "Show Tags in list and card view",
        kind: FieldKind::Boolean { default: true },
        option_labels: &[],
        surfaces: &[Surface::Plugin, Surface::Block],
        surface_labels: &[],
        section: Section::Core,
        order: 25,
    },
    SettingField {
        key: SettingKey::Depth,
        block_key: "depth",
        label: "Subfolder depth",
        description: "0 = current folder only, 1+ includes nested folders",
        kind: FieldKind::Number { min: 0, max: 10, default: 0 },
        option_labels: &[],
        surfaces: &[Surface::Plugin, Surface::Block],
        surface_labels: &[(Surface::Plugin, "Default depth")],
        section: Section::Core,
        order: 30,
    },
    SettingField {
        key: SettingKey::UsePagination,
        block_key: "usePagination",
        label: "Enable pagination",
        description: "Turn off to show all files in one list",
        kind: FieldKind::Boolean { default: true },
        option_labels: &[],
        surfaces: &[Surface::Plugin, Surface::Block],
        surface_labels: &[],
        section: Section::Core,
        order: 40,
    },
    SettingField {
        key: SettingKey::PageSize,
        block_key: "pageSize",
        label: "Page size",
        description: "Number of items per page",
        kind: FieldKind::Number { min: 6, max: 100, default: 15 },
        option_labels: &[],
        surfaces: &[Surface::Plugin, Surface::Block],
        surface_labels: &[(Surface::Plugin, "Default page size")],
        section: Section::Core,
        order: 50,
    },
    SettingField {
        key: SettingKey::ShowUnsupportedFiles,
        block_key: "showUnsupportedFiles",
        label: "Show unsupported files",
        description: "Show code files and uncommon formats",
        kind: FieldKind::Boolean { default: false },
        option_labels: &[],
        surfaces: &[Surface::Plugin],
        surface_labels: &[],
        section: Section::Behavior,
        order: 20,
    },
    SettingField {
        key: SettingKey::AllowSearch,
        block_key: "allowSearch",
        label: "Allow search",
        description: "Show the search button",
        kind: FieldKind::Boolean { default: true },
        option_labels: &[],
        surfaces: &[Surface::Plugin, Surface::Block],
        surface_labels: &[],
        section: Section::Behavior,
        order: 30,
    },
    SettingField {
        key: SettingKey::CardExt,
        block_key: "cardExt",
        label: "Card footer",
        description: "What to show on card footer",
        kind: FieldKind::Enum {
            options: &["folder", "ctime", "mtime", "desc", "none", "default"],
            default: "default",
        },
        option_labels: &[
            ("folder", "Folder"),
            ("ctime", "Created"),
            ("mtime", "Modified"),
            ("desc", "Description"),
            ("none", "None"),
            ("default", "Default"),
        ],
        surfaces: &[Surface::Plugin, Surface::Block],
        surface_labels: &[(Surface::Plugin, "Default card footer"), (Surface::Block, "Card info")],
        section: Section::Display,
        order: 10,
    },
    SettingField {
        key: SettingKey::ShowFolders,
        block_key: "showFolders",
        label: "Show folders",
        description: "Show folder buttons",
        kind: FieldKind::Boolean { default: true },
        option_labels: &[],
        surfaces: &[Surface::Plugin, Surface::Block],
        surface_labels: &[],
        section: Section::Display,
        order: 20,
    },
    SettingField {
        key: SettingKey::ShowNotes,
        block_key: "showNotes",
        label: "Show notes",
        description: "Show note files in the listing",
        kind: FieldKind::Boolean { default: true },
        option_labels: &[],
        surfaces: &[Surface::Plugin, Surface::Block],
        surface_labels: &[],
        section: Section::Display,
        order: 30,
    },
    SettingField {
        key: SettingKey::OnlyNotes,
        block_key: "onlyNotes",
        label: "Only notes",
        description: "Show only notes and PDFs",
        kind: FieldKind::Boolean { default: false },
        option_labels: &[],
        surfaces: &[Surface::Plugin, Surface::Block],
        surface_labels: &[],
        section: Section::Display,
        order: 40,
    },
    SettingField {
        key: SettingKey::ShowParentButton,
        block_key: "showParentButton",
        label: "Show parent folder button",
        description: "Show a button to navigate to the parent folder",
        kind: FieldKind::Boolean { default: true },
        option_labels: &[],
        surfaces: &[Surface::Plugin],
        surface_labels: &[],
        section: Section::Navigation,
        order: 10,
    },
    // Kept for parser compatibility, hidden from current UIs
    SettingField {
        key: SettingKey::ShowBreadcrumbs,
        block_key: "showBreadcrumbs",
        label: "Show breadcrumbs",
        description: "Show path navigation",
        kind: FieldKind::Boolean { default: true },
        option_labels: &[],
        surfaces: &[],
        surface_labels: &[],
        section: Section::Display,
        order: 99,
    },
];

// ============================================
// LOOKUPS
// ============================================

pub fn field(key: SettingKey) -> &'static SettingField {
    BLOCK_SETTINGS_SCHEMA
        .iter()
        .find(|f| f.key == key)
        .unwrap_or_else(|| unreachable!("every SettingKey has a schema entry"))
}

pub fn field_by_block_key(block_key: &str) -> Option<&'static SettingField> {
    BLOCK_SETTINGS_SCHEMA.iter().find(|f| f.block_key == block_key)
}

/// Fields editable on a surface, in display order: grouped by section,
/// then by `order` within a section
pub fn fields_for_surface(surface: Surface) -> Vec<&'static SettingField> {
    let mut fields: Vec<_> = BLOCK_SETTINGS_SCHEMA
        .iter()
        .filter(|f| f.surfaces.contains(&surface))
        .collect();
    fields.sort_by_key(|f| (f.section, f.order));
    fields
}

impl SettingField {
    pub fn label_for(&self, surface: Surface) -> &'static str {
        self.surface_labels
            .iter()
            .find(|(s, _)| *s == surface)
            .map(|(_, label)| *label)
            .unwrap_or(self.label)
    }

    pub fn option_label<'v>(&self, value: &'v str) -> &'v str {
        self.option_labels
            .iter()
            .find(|(option, _)| *option == value)
            .map(|(_, label)| *label)
            .unwrap_or(value)
    }

    /// Validate an already-typed value: numbers clamp, enums must be listed
    pub fn validate(&self, value: SettingValue) -> Option<SettingValue> {
        match (self.kind, value) {
            (FieldKind::Boolean { .. }, SettingValue::Bool(b)) => Some(SettingValue::Bool(b)),
            (FieldKind::Number { min, max, .. }, SettingValue::Number(n)) => {
                Some(SettingValue::Number(n.clamp(min, max)))
            }
            (FieldKind::Enum { options, .. }, SettingValue::Text(s)) => {
                options.iter().find(|o| **o == s).map(|o| SettingValue::Text(o))
            }
            _ => None,
        }
    }

    /// Coerce an untrusted JSON value; numbers are clamped into range
    pub fn coerce_json(&self, raw: &Value) -> Option<SettingValue> {
        match self.kind {
            FieldKind::Boolean { .. } => raw.as_bool().map(SettingValue::Bool),
            FieldKind::Number { min, max, .. } => {
                let numeric = match raw {
                    Value::Number(n) => n
                        .as_i64()
                        .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
                    Value::String(s) => parse_leading_int(s),
                    _ => None,
                }?;
                let clamped = numeric.clamp(i64::from(min), i64::from(max));
                Some(SettingValue::Number(clamped as u32))
            }
            FieldKind::Enum { options, .. } => {
                let s = raw.as_str()?;
                options.iter().find(|o| **o == s).map(|o| SettingValue::Text(o))
            }
        }
    }

    /// Parse free text from a block; out-of-range numbers are rejected
    pub fn parse_text(&self, raw: &str) -> Option<SettingValue> {
        match self.kind {
            FieldKind::Boolean { .. } => match raw {
                "true" => Some(SettingValue::Bool(true)),
                "false" => Some(SettingValue::Bool(false)),
                _ => None,
            },
            FieldKind::Number { min, max, .. } => {
                let n = parse_leading_int(raw)?;
                if n < i64::from(min) || n > i64::from(max) {
                    return None;
                }
                Some(SettingValue::Number(n as u32))
            }
            FieldKind::Enum { options, .. } => {
                options.iter().find(|o| **o == raw).map(|o| SettingValue::Text(o))
            }
        }
    }
}

/// Integer prefix of a string: optional sign then digits, surrounding
/// whitespace ignored ("12px" -> 12, "px" -> None). Digit runs too large
/// for an i64 saturate.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Only ASCII digits remain, so a parse failure means overflow
    let value: i64 = digits[..end].parse().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

// ============================================
// FIELD ACCESS
// ============================================

impl BlockSettings {
    pub fn get(&self, key: SettingKey) -> SettingValue {
        use SettingValue::*;
        match key {
            SettingKey::View => Text(self.view.as_str()),
            SettingKey::SortBy => Text(self.sort_by.as_str()),
            SettingKey::Depth => Number(self.depth),
            SettingKey::UsePagination => Bool(self.use_pagination),
            SettingKey::ShowTags => Bool(self.show_tags),
            SettingKey::PageSize => Number(self.page_size),
            SettingKey::ShowUnsupportedFiles => Bool(self.show_unsupported_files),
            SettingKey::CardExt => Text(self.card_ext.as_str()),
            SettingKey::ShowFolders => Bool(self.show_folders),
            SettingKey::ShowNotes => Bool(self.show_notes),
            SettingKey::OnlyNotes => Bool(self.only_notes),
            SettingKey::AllowSearch => Bool(self.allow_search),
            SettingKey::ShowParentButton => Bool(self.show_parent_button),
            SettingKey::ShowBreadcrumbs => Bool(self.show_breadcrumbs),
        }
    }

    /// Store a value of the matching kind; mismatches are ignored
    pub fn set(&mut self, key: SettingKey, value: SettingValue) {
        use SettingValue::*;
        match (key, value) {
            (SettingKey::View, Text(s)) => set_option(&mut self.view, s),
            (SettingKey::SortBy, Text(s)) => set_option(&mut self.sort_by, s),
            (SettingKey::Depth, Number(n)) => self.depth = n,
            (SettingKey::UsePagination, Bool(b)) => self.use_pagination = b,
            (SettingKey::ShowTags, Bool(b)) => self.show_tags = b,
            (SettingKey::PageSize, Number(n)) => self.page_size = n,
            (SettingKey::ShowUnsupportedFiles, Bool(b)) => self.show_unsupported_files = b,
            (SettingKey::CardExt, Text(s)) => set_option(&mut self.card_ext, s),
            (SettingKey::ShowFolders, Bool(b)) => self.show_folders = b,
            (SettingKey::ShowNotes, Bool(b)) => self.show_notes = b,
            (SettingKey::OnlyNotes, Bool(b)) => self.only_notes = b,
            (SettingKey::AllowSearch, Bool(b)) => self.allow_search = b,
            (SettingKey::ShowParentButton, Bool(b)) => self.show_parent_button = b,
            (SettingKey::ShowBreadcrumbs, Bool(b)) => self.show_breadcrumbs = b,
            _ => tracing::debug!("[BlockSettings::set] kind mismatch for {:?}", key),
        }
    }
}

fn set_option<T: SettingOption>(slot: &mut T, raw: &str) {
    if let Some(value) = T::parse(raw) {
        *slot = value;
    }
}

impl BlockSettingsOverride {
    pub fn get(&self, key: SettingKey) -> Option<SettingValue> {
        use SettingValue::*;
        match key {
            SettingKey::View => self.view.map(|v| Text(v.as_str())),
            SettingKey::SortBy => self.sort_by.map(|v| Text(v.as_str())),
            SettingKey::Depth => self.depth.map(Number),
            SettingKey::UsePagination => self.use_pagination.map(Bool),
            SettingKey::ShowTags => self.show_tags.map(Bool),
            SettingKey::PageSize => self.page_size.map(Number),
            SettingKey::ShowUnsupportedFiles => self.show_unsupported_files.map(Bool),
            SettingKey::CardExt => self.card_ext.map(|v| Text(v.as_str())),
            SettingKey::ShowFolders => self.show_folders.map(Bool),
            SettingKey::ShowNotes => self.show_notes.map(Bool),
            SettingKey::OnlyNotes => self.only_notes.map(Bool),
            SettingKey::AllowSearch => self.allow_search.map(Bool),
            SettingKey::ShowParentButton => self.show_parent_button.map(Bool),
            SettingKey::ShowBreadcrumbs => self.show_breadcrumbs.map(Bool),
        }
    }

    pub fn set(&mut self, key: SettingKey, value: SettingValue) {
        use SettingValue::*;
        match (key, value) {
            (SettingKey::View, Text(s)) => self.view = ViewMode::parse(s),
            (SettingKey::SortBy, Text(s)) => self.sort_by = SortBy::parse(s),
            (SettingKey::Depth, Number(n)) => self.depth = Some(n),
            (SettingKey::UsePagination, Bool(b)) => self.use_pagination = Some(b),
            (SettingKey::ShowTags, Bool(b)) => self.show_tags = Some(b),
            (SettingKey::PageSize, Number(n)) => self.page_size = Some(n),
            (SettingKey::ShowUnsupportedFiles, Bool(b)) => self.show_unsupported_files = Some(b),
            (SettingKey::CardExt, Text(s)) => self.card_ext = CardExt::parse(s),
            (SettingKey::ShowFolders, Bool(b)) => self.show_folders = Some(b),
            (SettingKey::ShowNotes, Bool(b)) => self.show_notes = Some(b),
            (SettingKey::OnlyNotes, Bool(b)) => self.only_notes = Some(b),
            (SettingKey::AllowSearch, Bool(b)) => self.allow_search = Some(b),
            (SettingKey::ShowParentButton, Bool(b)) => self.show_parent_button = Some(b),
            (SettingKey::ShowBreadcrumbs, Bool(b)) => self.show_breadcrumbs = Some(b),
            _ => tracing::debug!("[BlockSettingsOverride::set] kind mismatch for {:?}", key),
        }
    }
}

// ============================================
// RESOLUTION
// ============================================

/// Settings built purely from the schema defaults
pub fn default_block_settings() -> BlockSettings {
    let mut settings = BlockSettings {
        view: ViewMode::Cards,
        sort_by: SortBy::Newest,
        depth: 0,
        use_pagination: false,
        show_tags: false,
        page_size: 0,
        show_unsupported_files: false,
        card_ext: CardExt::Folder,
        show_folders: false,
        show_notes: false,
        only_notes: false,
        allow_search: false,
        show_parent_button: false,
        show_breadcrumbs: false,
    };
    for field in BLOCK_SETTINGS_SCHEMA {
        settings.set(field.key, field.kind.default_value());
    }
    settings
}

/// Total coercion of untrusted input: every field either takes a valid
/// value from `input` (keyed by block key) or the fallback's value
pub fn coerce_block_settings(input: Option<&Value>, fallback: &BlockSettings) -> BlockSettings {
    let mut settings = fallback.clone();
    let Some(Value::Object(map)) = input else {
        return settings;
    };

    for field in BLOCK_SETTINGS_SCHEMA {
        if let Some(value) = map.get(field.block_key).and_then(|raw| field.coerce_json(raw)) {
            settings.set(field.key, value);
        }
    }
    settings
}

/// Merge block overrides onto the plugin defaults. An override that fails
/// validation degrades to the default, never to a hardcoded constant.
pub fn resolve_block_settings(
    defaults: &BlockSettings,
    overrides: &BlockSettingsOverride,
) -> BlockSettings {
    let mut settings = defaults.clone();
    for field in BLOCK_SETTINGS_SCHEMA {
        if let Some(value) = overrides.get(field.key).and_then(|v| field.validate(v)) {
            settings.set(field.key, value);
        }
    }
    settings
}

/// Accept the current nested layout or the older flat one
pub fn normalize_plugin_settings(raw: Option<&Value>) -> PluginSettings {
    let defaults = PluginSettings::default();
    let Some(Value::Object(map)) = raw else {
        return defaults;
    };

    if let Some(nested @ Value::Object(_)) = map.get("defaultBlockSettings") {
        return PluginSettings {
            default_block_settings: coerce_block_settings(
                Some(nested),
                &defaults.default_block_settings,
            ),
        };
    }

    let has_legacy_value = BLOCK_SETTINGS_SCHEMA
        .iter()
        .any(|f| map.contains_key(f.block_key));
    if !has_legacy_value {
        return defaults;
    }

    tracing::info!("[normalize_plugin_settings] Migrating flat settings layout");
    PluginSettings {
        default_block_settings: coerce_block_settings(raw, &defaults.default_block_settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_defaults() {
        let d = default_block_settings();
        assert_eq!(d.view, ViewMode::List);
        assert_eq!(d.sort_by, SortBy::Oldest);
        assert_eq!(d.depth, 0);
        assert_eq!(d.page_size, 15);
        assert!(d.use_pagination);
        assert!(!d.show_unsupported_files);
        assert_eq!(d.card_ext, CardExt::Default);
        assert!(d.show_breadcrumbs);
        assert_eq!(BlockSettings::default(), d);
    }

    #[test]
    fn test_enum_options_match_models() {
        fn options_of(key: SettingKey) -> &'static [&'static str] {
            match field(key).kind {
                FieldKind::Enum { options, .. } => options,
                _ => panic!("{:?} is not an enum", key),
            }
        }
        let view: Vec<_> = ViewMode::ALL.iter().map(|v| v.as_str()).collect();
        let sort: Vec<_> = SortBy::ALL.iter().map(|v| v.as_str()).collect();
        let card: Vec<_> = CardExt::ALL.iter().map(|v| v.as_str()).collect();
        assert_eq!(options_of(SettingKey::View), view.as_slice());
        assert_eq!(options_of(SettingKey::SortBy), sort.as_slice());
        assert_eq!(options_of(SettingKey::CardExt), card.as_slice());
    }

    #[test]
    fn test_coerce_garbage_keeps_every_field() {
        let fallback = default_block_settings();
        let garbage = json!({
            "view": 42,
            "sortBy": "sideways",
            "depth": "deep",
            "pageSize": null,
            "onlyNotes": "yes",
            "cardExt": ["folder"],
            "unknown": true,
        });
        assert_eq!(coerce_block_settings(Some(&garbage), &fallback), fallback);
        assert_eq!(coerce_block_settings(None, &fallback), fallback);
        assert_eq!(coerce_block_settings(Some(&json!("flat")), &fallback), fallback);
    }

    #[test]
    fn test_coerce_clamps_numbers() {
        let fallback = default_block_settings();
        let raw = json!({ "depth": 99, "pageSize": 2, "view": "cards", "onlyNotes": true });
        let s = coerce_block_settings(Some(&raw), &fallback);
        assert_eq!(s.depth, 10);
        assert_eq!(s.page_size, 6);
        assert_eq!(s.view, ViewMode::Cards);
        assert!(s.only_notes);

        let raw = json!({ "depth": "3", "pageSize": 20.7, "sortBy": "name" });
        let s = coerce_block_settings(Some(&raw), &fallback);
        assert_eq!(s.depth, 3);
        assert_eq!(s.page_size, 20);
        assert_eq!(s.sort_by, SortBy::Name);

        let raw = json!({ "depth": -4 });
        assert_eq!(coerce_block_settings(Some(&raw), &fallback).depth, 0);
    }

    #[test]
    fn test_resolve_without_overrides_is_identity() {
        let mut defaults = default_block_settings();
        defaults.depth = 2;
        defaults.view = ViewMode::Cards;
        let resolved = resolve_block_settings(&defaults, &BlockSettingsOverride::default());
        assert_eq!(resolved, defaults);
    }

    #[test]
    fn test_resolve_falls_back_to_global_default() {
        let mut defaults = default_block_settings();
        defaults.page_size = 30;
        let overrides = BlockSettingsOverride {
            page_size: Some(500),
            sort_by: Some(SortBy::Edited),
            ..Default::default()
        };
        let resolved = resolve_block_settings(&defaults, &overrides);
        assert_eq!(resolved.page_size, 100);
        assert_eq!(resolved.sort_by, SortBy::Edited);
        assert_eq!(resolved.view, defaults.view);
    }

    #[test]
    fn test_bad_enum_keeps_default() {
        let mut defaults = default_block_settings();
        defaults.sort_by = SortBy::Name;
        let raw = json!({ "sortBy": "garbage" });
        let s = coerce_block_settings(Some(&raw), &defaults);
        assert_eq!(s.sort_by, SortBy::Name);
    }

    #[test]
    fn test_parse_text_rejects_out_of_range() {
        let depth = field(SettingKey::Depth);
        assert_eq!(depth.parse_text("3"), Some(SettingValue::Number(3)));
        assert_eq!(depth.parse_text("11"), None);
        assert_eq!(depth.parse_text("-1"), None);
        assert_eq!(depth.parse_text("abc"), None);
        let flag = field(SettingKey::OnlyNotes);
        assert_eq!(flag.parse_text("TRUE"), None);
        assert_eq!(flag.parse_text("false"), Some(SettingValue::Bool(false)));
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int(" 12px"), Some(12));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("+7"), Some(7));
        assert_eq!(parse_leading_int("px"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("99999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_leading_int("-99999999999999999999"), Some(-i64::MAX));
    }

    #[test]
    fn test_huge_numbers_clamp_in_json_but_not_in_text() {
        let page_size = field(SettingKey::PageSize);
        assert_eq!(
            page_size.coerce_json(&json!("99999999999999999999")),
            Some(SettingValue::Number(100))
        );
        assert_eq!(
            page_size.coerce_json(&json!("-99999999999999999999")),
            Some(SettingValue::Number(6))
        );
        assert_eq!(page_size.parse_text("99999999999999999999"), None);
    }

    #[test]
    fn test_surface_fields_are_ordered() {
        let plugin: Vec<_> = fields_for_surface(Surface::Plugin)
            .iter()
            .map(|f| f.block_key)
            .collect();
        assert_eq!(plugin.first(), Some(&"view"));
        assert!(plugin.contains(&"showUnsupportedFiles"));
        assert!(!plugin.contains(&"showBreadcrumbs"));

        let block: Vec<_> = fields_for_surface(Surface::Block)
            .iter()
            .map(|f| f.block_key)
            .collect();
        assert!(!block.contains(&"showParentButton"));
        assert_eq!(&block[..3], &["view", "sortBy", "showTags"]);
    }

    #[test]
    fn test_surface_fields_keep_sections_together() {
        for surface in [Surface::Plugin, Surface::Block] {
            let fields = fields_for_surface(surface);
            let sections: Vec<_> = fields.iter().map(|f| f.section).collect();
            let mut sorted = sections.clone();
            sorted.sort();
            assert_eq!(sections, sorted, "{:?}", surface);
        }

        let block: Vec<_> = fields_for_surface(Surface::Block)
            .iter()
            .map(|f| f.block_key)
            .collect();
        let card = block.iter().position(|k| *k == "cardExt").unwrap();
        let page_size = block.iter().position(|k| *k == "pageSize").unwrap();
        assert!(page_size < card);
    }

    #[test]
    fn test_labels() {
        let card = field(SettingKey::CardExt);
        assert_eq!(card.label_for(Surface::Block), "Card info");
        assert_eq!(card.label_for(Surface::Plugin), "Default card footer");
        assert_eq!(field(SettingKey::ShowTags).label_for(Surface::Block), "Display Tags");
        assert_eq!(field(SettingKey::SortBy).option_label("edited"), "Last edited");
        assert_eq!(field(SettingKey::SortBy).option_label("other"), "other");
    }

    #[test]
    fn test_normalize_nested_settings() {
        let raw = json!({ "defaultBlockSettings": { "depth": 2, "view": "tree" } });
        let settings = normalize_plugin_settings(Some(&raw));
        assert_eq!(settings.default_block_settings.depth, 2);
        assert_eq!(settings.default_block_settings.view, ViewMode::Tree);
    }

    #[test]
    fn test_normalize_legacy_flat_settings() {
        let raw = json!({ "sortBy": "newest", "pageSize": 40, "somethingElse": 1 });
        let settings = normalize_plugin_settings(Some(&raw));
        assert_eq!(settings.default_block_settings.sort_by, SortBy::Newest);
        assert_eq!(settings.default_block_settings.page_size, 40);

        let unrelated = json!({ "theme": "dark" });
        assert_eq!(normalize_plugin_settings(Some(&unrelated)), PluginSettings::default());
        assert_eq!(normalize_plugin_settings(None), PluginSettings::default());
    }
}
