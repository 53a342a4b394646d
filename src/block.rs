// Block settings text format
// One `key: value` per line inside an ```explorer fence; enums are quoted

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::BLOCK_LANGUAGE;
use crate::models::{BlockSettings, BlockSettingsOverride};
use crate::schema::{field_by_block_key, SettingValue, BLOCK_SETTINGS_SCHEMA};

/// Inclusive line span of a block inside its document, as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

fn setting_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^(\w+):\s*["']?([^"'\n]+)["']?$"#).expect("static regex"))
}

fn fenced_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?s)```{}\n.*?```", BLOCK_LANGUAGE)).expect("static regex")
    })
}

// ============================================
// PARSE / SERIALIZE
// ============================================

/// Parse block text into overrides. Unknown keys, invalid values and
/// malformed lines are skipped; parsing never fails.
pub fn parse_block_settings(source: &str) -> BlockSettingsOverride {
    let mut overrides = BlockSettingsOverride::default();

    for line in source.trim().lines() {
        let Some(caps) = setting_line_re().captures(line.trim_end_matches('\r')) else {
            continue;
        };
        let Some(field) = field_by_block_key(&caps[1]) else {
            tracing::debug!("[parse_block_settings] Ignoring unknown key '{}'", &caps[1]);
            continue;
        };
        match field.parse_text(caps[2].trim()) {
            Some(value) => overrides.set(field.key, value),
            None => tracing::debug!(
                "[parse_block_settings] Dropping invalid value for '{}'",
                field.block_key
            ),
        }
    }

    overrides
}

/// Emit only the fields that differ from `defaults`, in schema order
pub fn serialize_block_settings(settings: &BlockSettings, defaults: &BlockSettings) -> String {
    BLOCK_SETTINGS_SCHEMA
        .iter()
        .filter(|field| settings.get(field.key) != defaults.get(field.key))
        .map(|field| match settings.get(field.key) {
            SettingValue::Text(s) => format!("{}: \"{}\"", field.block_key, s),
            other => format!("{}: {}", field.block_key, other),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full fenced block for the given settings
pub fn format_block(settings: &BlockSettings, defaults: &BlockSettings) -> String {
    let body = serialize_block_settings(settings, defaults);
    if body.is_empty() {
        format!("```{}\n```", BLOCK_LANGUAGE)
    } else {
        format!("```{}\n{}\n```", BLOCK_LANGUAGE, body)
    }
}

// ============================================
// DOCUMENT REWRITE
// ============================================

/// Replace an explorer block inside `content`.
///
/// With a line range the lines `start..=end` are replaced; without one the
/// first explorer fence is. Returns `None` when nothing would change, so the
/// caller can skip the write.
pub fn rewrite_block(content: &str, range: Option<LineRange>, new_block: &str) -> Option<String> {
    let updated = match range {
        Some(LineRange { start, end }) => {
            let lines: Vec<&str> = content.split('\n').collect();
            let start = start.min(lines.len());
            let end = end.saturating_add(1).clamp(start, lines.len());
            let mut out: Vec<&str> = Vec::with_capacity(lines.len());
            out.extend_from_slice(&lines[..start]);
            out.push(new_block);
            out.extend_from_slice(&lines[end..]);
            out.join("\n")
        }
        None => fenced_block_re().replace(content, regex::NoExpand(new_block)).into_owned(),
    };

    (updated != content).then_some(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CardExt, SortBy, ViewMode};
    use crate::schema::{default_block_settings, resolve_block_settings};

    #[test]
    fn test_parse_quoted_and_bare_values() {
        let o = parse_block_settings("view: \"cards\"\nsortBy: 'name'\ndepth: 2\nonlyNotes: true");
        assert_eq!(o.view, Some(ViewMode::Cards));
        assert_eq!(o.sort_by, Some(SortBy::Name));
        assert_eq!(o.depth, Some(2));
        assert_eq!(o.only_notes, Some(true));
        assert_eq!(o.page_size, None);
    }

    #[test]
    fn test_parse_skips_bad_lines() {
        let source = "bogus: 1\n  view: cards\nnot a setting\ndepth: 42\npageSize: 3\nshowTags: yes\nsortBy: \"sideways\"\n\ncardExt: desc";
        let o = parse_block_settings(source);
        assert_eq!(o.view, None);
        assert_eq!(o.depth, None);
        assert_eq!(o.page_size, None);
        assert_eq!(o.show_tags, None);
        assert_eq!(o.sort_by, None);
        assert_eq!(o.card_ext, Some(CardExt::Desc));
    }

    #[test]
    fn test_parse_empty_source() {
        assert!(parse_block_settings("").is_empty());
        assert!(parse_block_settings("\n\n").is_empty());
    }

    #[test]
    fn test_parse_tolerates_crlf() {
        let o = parse_block_settings("depth: 3\r\nview: tree\r\n");
        assert_eq!(o.depth, Some(3));
        assert_eq!(o.view, Some(ViewMode::Tree));
    }

    #[test]
    fn test_serialize_only_differences() {
        let defaults = default_block_settings();
        assert_eq!(serialize_block_settings(&defaults, &defaults), "");

        let mut s = defaults.clone();
        s.view = ViewMode::Cards;
        s.depth = 3;
        s.use_pagination = false;
        assert_eq!(
            serialize_block_settings(&s, &defaults),
            "view: \"cards\"\ndepth: 3\nusePagination: false"
        );
    }

    #[test]
    fn test_round_trip_through_text() {
        let defaults = default_block_settings();
        let variants = [
            BlockSettings { view: ViewMode::Tree, depth: 10, ..defaults.clone() },
            BlockSettings {
                sort_by: SortBy::Edited,
                page_size: 6,
                card_ext: CardExt::None,
                show_folders: false,
                ..defaults.clone()
            },
            BlockSettings {
                only_notes: true,
                show_unsupported_files: true,
                show_breadcrumbs: false,
                page_size: 100,
                ..defaults.clone()
            },
            defaults.clone(),
        ];
        for s in variants {
            let text = serialize_block_settings(&s, &defaults);
            assert_eq!(resolve_block_settings(&defaults, &parse_block_settings(&text)), s);
        }
    }

    #[test]
    fn test_format_block() {
        let defaults = default_block_settings();
        assert_eq!(format_block(&defaults, &defaults), "```explorer\n```");
        let s = BlockSettings { depth: 1, ..defaults.clone() };
        assert_eq!(format_block(&s, &defaults), "```explorer\ndepth: 1\n```");
    }

    #[test]
    fn test_rewrite_by_line_range() {
        let doc = "# Title\n```explorer\ndepth: 1\n```\ntail";
        let out = rewrite_block(doc, Some(LineRange { start: 1, end: 3 }), "```explorer\n```");
        assert_eq!(out.as_deref(), Some("# Title\n```explorer\n```\ntail"));
    }

    #[test]
    fn test_rewrite_first_fence_without_range() {
        let doc = "a\n```explorer\nview: list\n```\nb\n```explorer\n```";
        let out = rewrite_block(doc, None, "```explorer\ndepth: 2\n```").unwrap();
        assert_eq!(out, "a\n```explorer\ndepth: 2\n```\nb\n```explorer\n```");
    }

    #[test]
    fn test_rewrite_is_noop_when_unchanged() {
        let doc = "x\n```explorer\n```\n";
        assert_eq!(rewrite_block(doc, None, "```explorer\n```"), None);
        assert_eq!(rewrite_block("no block here", None, "```explorer\n```"), None);
    }
}
