// Small text helpers for card and list rendering

use chrono::{TimeDelta, Utc};

use crate::models::{split_path, CardExt, FileInfo};

const DESCRIPTION_PREVIEW_CHARS: usize = 60;

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Human age of a timestamp ("Today", "3 days ago", "2 months ago")
pub fn relative_age(timestamp_ms: i64, now_ms: i64) -> String {
    let days = TimeDelta::milliseconds(now_ms.saturating_sub(timestamp_ms))
        .num_days()
        .max(0);

    match days {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => format!("{} days ago", days),
        7..=29 => format!("{} weeks ago", days / 7),
        30..=364 => format!("{} months ago", days / 30),
        _ => format!("{} years ago", days / 365),
    }
}

/// Footer text for a card in the given (already resolved) mode
pub fn card_footer_text(info: &FileInfo<'_>, mode: CardExt, now_ms: i64) -> Option<String> {
    match mode {
        CardExt::Ctime => Some(relative_age(info.file.stat.ctime, now_ms)),
        CardExt::Mtime => Some(relative_age(info.file.stat.mtime, now_ms)),
        CardExt::Folder => {
            // A folder note belongs to its folder, so show the folder above it
            let folder = if info.is_folder_note {
                split_path(&info.file.parent).0
            } else {
                info.file.parent.as_str()
            };
            let name = split_path(folder).1;
            (!name.is_empty()).then(|| name.to_string())
        }
        CardExt::Desc => info.description.as_deref().map(|desc| {
            let mut preview: String = desc.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
            if desc.chars().count() > DESCRIPTION_PREVIEW_CHARS {
                preview.push_str("...");
            }
            preview
        }),
        CardExt::None | CardExt::Default => None,
    }
}
