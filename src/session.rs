// Per-block view state: the normal page, the search mode with its own
// page, and debouncing of typed queries

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::constants::SEARCH_DEBOUNCE_MS;
use crate::listing::compute_listing;
use crate::metadata::MetadataSource;
use crate::models::{BlockSettings, FileEntry, Listing, SortBy};

// ============================================
// SESSION
// ============================================

/// View state for one explorer block. Normal and search paging are
/// tracked separately so leaving search returns to the same page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExplorerSession {
    normal_page: usize,
    search_mode: bool,
    search_input: String,
    search_query: String,
    search_page: usize,
}

impl ExplorerSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_mode(&self) -> bool {
        self.search_mode
    }

    /// Text as typed, before debouncing
    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    /// Query the search listing filters by
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Open or close search. Closing clears the query and the search page.
    pub fn toggle_search(&mut self) -> bool {
        if self.search_mode {
            self.search_input.clear();
            self.search_query.clear();
            self.search_page = 0;
        }
        self.search_mode = !self.search_mode;
        self.search_mode
    }

    /// New input always restarts from the first result page
    pub fn set_search_input(&mut self, input: impl Into<String>) {
        self.search_input = input.into();
        self.search_page = 0;
    }

    /// Apply a debounced query
    pub fn commit_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn current_page(&self) -> usize {
        if self.search_mode {
            self.search_page
        } else {
            self.normal_page
        }
    }

    pub fn set_current_page(&mut self, page: usize) {
        if self.search_mode {
            self.search_page = page;
        } else {
            self.normal_page = page;
        }
    }

    /// Pull the active page back into range; returns whether it moved
    pub fn clamp_page(&mut self, total_pages: usize) -> bool {
        let page = self.current_page();
        if page > 0 && page >= total_pages {
            self.set_current_page(total_pages.saturating_sub(1));
            return true;
        }
        false
    }

    /// Listing for the active mode. Search ranks by most recent edit and
    /// reads `all_files` (empty until loaded); the normal view uses the
    /// block's own sort.
    pub fn listing<'a, M: MetadataSource + ?Sized>(
        &mut self,
        normal_files: &[&'a FileEntry],
        all_files: Option<&[&'a FileEntry]>,
        settings: &BlockSettings,
        metadata: &M,
    ) -> Listing<'a> {
        let compute = |session: &Self| {
            if session.search_mode {
                compute_listing(
                    all_files.unwrap_or_default(),
                    settings,
                    &session.search_query,
                    session.search_page,
                    SortBy::Edited,
                    metadata,
                )
            } else {
                compute_listing(
                    normal_files,
                    settings,
                    "",
                    session.normal_page,
                    settings.sort_by,
                    metadata,
                )
            }
        };

        let listing = compute(&*self);
        if self.clamp_page(listing.total_pages) {
            tracing::debug!(
                "[ExplorerSession::listing] Page clamped to {}",
                self.current_page()
            );
            return compute(&*self);
        }
        listing
    }
}

// ============================================
// QUERY DEBOUNCE
// ============================================

/// Input side of a debounced query stream
#[derive(Debug)]
pub struct QueryDebouncer {
    tx: watch::Sender<String>,
}

/// Output side: yields a query once input has been quiet for the delay
#[derive(Debug)]
pub struct DebouncedQueries {
    rx: watch::Receiver<String>,
    delay: Duration,
}

impl QueryDebouncer {
    pub fn new(delay: Duration) -> (Self, DebouncedQueries) {
        let (tx, rx) = watch::channel(String::new());
        (Self { tx }, DebouncedQueries { rx, delay })
    }

    pub fn with_default_delay() -> (Self, DebouncedQueries) {
        Self::new(Duration::from_millis(SEARCH_DEBOUNCE_MS))
    }

    pub fn push(&self, query: impl Into<String>) {
        self.tx.send_replace(query.into());
    }
}

impl DebouncedQueries {
    /// Wait for the next settled query. `None` once the debouncer is gone
    /// and every input has been delivered.
    pub async fn next(&mut self) -> Option<String> {
        self.rx.changed().await.ok()?;
        loop {
            match tokio::time::timeout(self.delay, self.rx.changed()).await {
                // More input: restart the quiet period
                Ok(Ok(())) => continue,
                Ok(Err(_)) | Err(_) => break,
            }
        }
        Some(self.rx.borrow_and_update().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MemoryMetadata;
    use crate::models::FileStat;

    fn files(n: i64) -> Vec<FileEntry> {
        (0..n)
            .map(|i| FileEntry::new(&format!("f{:02}.md", i), FileStat::new(i, 100 - i)))
            .collect()
    }

    fn settings() -> BlockSettings {
        BlockSettings { page_size: 6, ..Default::default() }
    }

    #[test]
    fn test_pages_are_tracked_per_mode() {
        let mut session = ExplorerSession::new();
        session.set_current_page(2);
        session.toggle_search();
        assert_eq!(session.current_page(), 0);
        session.set_current_page(1);
        session.toggle_search();
        assert_eq!(session.current_page(), 2);
        session.toggle_search();
        assert_eq!(session.current_page(), 0);
    }

    #[test]
    fn test_closing_search_resets_query() {
        let mut session = ExplorerSession::new();
        session.toggle_search();
        session.set_search_input("abc");
        session.commit_query("abc");
        session.set_current_page(3);
        assert!(!session.toggle_search());
        assert_eq!(session.search_query(), "");
        assert_eq!(session.search_input(), "");
        session.toggle_search();
        assert_eq!(session.current_page(), 0);
    }

    #[test]
    fn test_new_input_resets_search_page() {
        let mut session = ExplorerSession::new();
        session.toggle_search();
        session.set_current_page(4);
        session.set_search_input("x");
        assert_eq!(session.current_page(), 0);
    }

    #[test]
    fn test_listing_clamps_out_of_range_page() {
        let owned = files(8);
        let refs: Vec<&FileEntry> = owned.iter().collect();
        let meta = MemoryMetadata::default();
        let mut session = ExplorerSession::new();
        session.set_current_page(5);

        let listing = session.listing(&refs, None, &settings(), &meta);
        assert_eq!(session.current_page(), 1);
        assert_eq!(listing.page_files.len(), 2);
    }

    #[test]
    fn test_search_listing_sorts_by_edit() {
        let owned = files(3);
        let refs: Vec<&FileEntry> = owned.iter().collect();
        let meta = MemoryMetadata::default();
        let mut session = ExplorerSession::new();

        session.toggle_search();
        let empty = session.listing(&refs, None, &settings(), &meta);
        assert!(empty.page_files.is_empty());

        let listing = session.listing(&[], Some(refs.as_slice()), &settings(), &meta);
        let names: Vec<_> = listing.page_files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["f00.md", "f01.md", "f02.md"]);

        session.commit_query("f02");
        let filtered = session.listing(&[], Some(refs.as_slice()), &settings(), &meta);
        assert_eq!(filtered.page_files.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_delivers_last_burst_value() {
        let (debouncer, mut queries) = QueryDebouncer::with_default_delay();
        debouncer.push("a");
        debouncer.push("ab");
        debouncer.push("abc");
        assert_eq!(queries.next().await.as_deref(), Some("abc"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_separates_quiet_periods() {
        let (debouncer, mut queries) = QueryDebouncer::new(Duration::from_millis(80));
        let typist = tokio::spawn(async move {
            debouncer.push("x");
            tokio::time::sleep(Duration::from_millis(50)).await;
            debouncer.push("xy");
            tokio::time::sleep(Duration::from_millis(200)).await;
            debouncer.push("z");
        });

        assert_eq!(queries.next().await.as_deref(), Some("xy"));
        assert_eq!(queries.next().await.as_deref(), Some("z"));
        typist.await.unwrap();
        assert_eq!(queries.next().await, None);
    }
}
