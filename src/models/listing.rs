// Listing-time views over the host tree: front matter, file info,
// folder descriptors and the computed page

use serde::Serialize;
use serde_yaml::Value;

use super::node::{DirectoryEntry, FileEntry};

/// Subset of a note's front matter the explorer cares about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frontmatter {
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub pinned: bool,
    pub favorite: bool,
}

impl Frontmatter {
    /// Lenient extraction; unknown or mistyped keys are ignored
    pub fn from_yaml(value: &Value) -> Self {
        let Some(map) = value.as_mapping() else {
            return Self::default();
        };
        let get = |key: &str| map.get(key);

        let description = ["description", "desc"]
            .iter()
            .filter_map(|k| get(*k))
            .filter_map(scalar_text)
            .find(|s| !s.is_empty());

        let tags = match get("tags") {
            Some(Value::Sequence(items)) => {
                items.iter().filter_map(scalar_text).map(clean_tag).collect()
            }
            Some(other) => scalar_text(other)
                .map(|s| {
                    s.split([',', ' '])
                        .filter(|t| !t.trim().is_empty())
                        .map(|t| clean_tag(t.to_string()))
                        .collect()
                })
                .unwrap_or_default(),
            None => Vec::new(),
        };

        let flag = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| get(*k))
                .any(|v| v.as_bool() == Some(true))
        };

        Self {
            description,
            tags,
            pinned: flag(&["pinned", "pin"]),
            favorite: flag(&["favorite", "fav"]),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn clean_tag(tag: String) -> String {
    tag.trim().trim_start_matches('#').to_string()
}

/// A file plus the metadata shown next to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo<'a> {
    pub file: &'a FileEntry,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub is_favorite: bool,
    pub is_folder_note: bool,
}

impl<'a> FileInfo<'a> {
    pub fn new(file: &'a FileEntry, frontmatter: Frontmatter) -> Self {
        Self {
            file,
            description: frontmatter.description,
            tags: frontmatter.tags,
            is_pinned: frontmatter.pinned,
            is_favorite: frontmatter.favorite,
            is_folder_note: file.is_folder_note(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDescriptor<'a> {
    pub directory: &'a DirectoryEntry,
    pub folder_note: Option<&'a FileEntry>,
}

/// One computed page of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing<'a> {
    pub page_files: Vec<&'a FileEntry>,
    pub page_file_infos: Vec<FileInfo<'a>>,
    pub total_pages: usize,
    pub use_paging: bool,
}
