// File listing engine
// visibility -> sort (pinned, then favorites first) -> query -> page

use std::cmp::Ordering;

use crate::constants::{NOTE_EXTENSIONS, SUPPORTED_EXTENSIONS};
use crate::metadata::MetadataSource;
use crate::models::{BlockSettings, CardExt, FileEntry, FileInfo, Listing, SortBy, ViewMode};

// ============================================
// VISIBILITY
// ============================================

/// `only_notes` wins over `show_unsupported_files`; otherwise unsupported
/// formats are hidden unless asked for
pub fn apply_visibility_rules<'a>(files: &[&'a FileEntry], settings: &BlockSettings) -> Vec<&'a FileEntry> {
    files
        .iter()
        .copied()
        .filter(|file| {
            if settings.only_notes {
                file.extension_in(NOTE_EXTENSIONS)
            } else if !settings.show_unsupported_files {
                file.extension_in(SUPPORTED_EXTENSIONS)
            } else {
                true
            }
        })
        .collect()
}

/// Files shown by the normal view. With folder buttons hidden the folder
/// notes are listed ahead of the files instead.
pub fn normal_source_files<'a>(
    depth_files: &[&'a FileEntry],
    folder_notes: &[&'a FileEntry],
    settings: &BlockSettings,
) -> Vec<&'a FileEntry> {
    if settings.show_folders {
        depth_files.to_vec()
    } else {
        folder_notes.iter().chain(depth_files).copied().collect()
    }
}

// ============================================
// SORTING
// ============================================

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn compare_by(sort_by: SortBy, a: &FileEntry, b: &FileEntry) -> Ordering {
    match sort_by {
        SortBy::Newest => b.stat.ctime.cmp(&a.stat.ctime),
        SortBy::Oldest => a.stat.ctime.cmp(&b.stat.ctime),
        SortBy::Edited => b.stat.mtime.cmp(&a.stat.mtime),
        SortBy::Name => compare_names(&a.name, &b.name),
    }
}

/// Stable sort by the chosen criterion
pub fn sort_files(files: &mut [&FileEntry], sort_by: SortBy) {
    files.sort_by(|a, b| compare_by(sort_by, a, b));
}

/// Stable sort of infos: pinned first, then favorites, then `sort_by`
pub fn sort_file_infos(infos: &mut [FileInfo<'_>], sort_by: SortBy) {
    infos.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then_with(|| b.is_favorite.cmp(&a.is_favorite))
            .then_with(|| compare_by(sort_by, a.file, b.file))
    });
}

// ============================================
// QUERY
// ============================================

/// `#tag` matches tags, `@name` matches folder notes by basename, anything
/// else matches name or path. Case-insensitive; empty keeps everything.
pub fn matches_query(info: &FileInfo<'_>, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let query = query.to_lowercase();

    if let Some(tag) = query.strip_prefix('#') {
        return info.tags.iter().any(|t| t.to_lowercase().contains(tag));
    }
    if let Some(term) = query.strip_prefix('@') {
        return info.is_folder_note && info.file.basename.to_lowercase().contains(term);
    }
    info.file.name.to_lowercase().contains(&query) || info.file.path.to_lowercase().contains(&query)
}

pub fn filter_by_query<'a>(infos: Vec<FileInfo<'a>>, query: &str) -> Vec<FileInfo<'a>> {
    if query.is_empty() {
        return infos;
    }
    infos.into_iter().filter(|info| matches_query(info, query)).collect()
}

// ============================================
// LISTING
// ============================================

/// Compute one page of a listing.
///
/// `page` is not clamped here; callers keep it in range using
/// `total_pages`. An empty result is one empty page.
pub fn compute_listing<'a, M: MetadataSource + ?Sized>(
    files: &[&'a FileEntry],
    settings: &BlockSettings,
    query: &str,
    page: usize,
    sort_by: SortBy,
    metadata: &M,
) -> Listing<'a> {
    let mut infos: Vec<FileInfo<'a>> = apply_visibility_rules(files, settings)
        .into_iter()
        .map(|file| FileInfo::new(file, metadata.frontmatter(file)))
        .collect();
    sort_file_infos(&mut infos, sort_by);
    let infos = filter_by_query(infos, query);

    let paging_enabled = settings.use_pagination && settings.view != ViewMode::Tree;
    if !paging_enabled {
        return Listing {
            page_files: infos.iter().map(|info| info.file).collect(),
            page_file_infos: infos,
            total_pages: 1,
            use_paging: false,
        };
    }

    let page_size = settings.page_size.max(1) as usize;
    let total = infos.len();
    let total_pages = total.div_ceil(page_size).max(1);
    let page_file_infos: Vec<FileInfo<'a>> = infos
        .into_iter()
        .skip(page.saturating_mul(page_size))
        .take(page_size)
        .collect();

    tracing::debug!(
        "[compute_listing] {} files, page {}/{}",
        total,
        page + 1,
        total_pages
    );

    Listing {
        page_files: page_file_infos.iter().map(|info| info.file).collect(),
        page_file_infos,
        total_pages,
        use_paging: total > page_size,
    }
}

/// Footer mode for cards: an explicit choice wins; `default` shows the
/// folder for nested listings and the creation date otherwise
pub fn resolve_card_footer(settings: &BlockSettings) -> CardExt {
    match settings.card_ext {
        CardExt::Default if settings.depth > 0 => CardExt::Folder,
        CardExt::Default => CardExt::Ctime,
        explicit => explicit,
    }
}
