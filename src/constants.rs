// Shared constants for the explorer block and file visibility rules

/// Fenced block language that hosts an explorer
pub const BLOCK_LANGUAGE: &str = "explorer";

/// Body written into newly created folder notes
pub const FOLDER_NOTE_TEMPLATE: &str = "\n```explorer\n```\n";

/// Note opened when the vault root is asked for its folder note
pub const HOME_NOTE: &str = "Home.md";

/// Placeholder shown when a block has no document or parent folder
pub const NO_CONTEXT_MESSAGE: &str = "No active file or folder";

/// Never listed, whatever the settings say
pub const EXCLUDED_EXTENSIONS: &[&str] = &["json", "png", "jpeg", "jpg", "svg", "gif", "webp"];

// Content files that most users want to see (vs code files)
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "md", "pdf", "canvas", "docx", "doc", "pptx", "ppt", "xlsx", "xls", "csv", "txt", "rtf",
    "html", "epub",
];

/// Kept by the "only notes" rule
pub const NOTE_EXTENSIONS: &[&str] = &["md", "pdf"];

/// Children visited between batches during an unbounded walk
pub const DEFAULT_CHUNK_SIZE: usize = 200;

/// Delay before a typed search query is committed
pub const SEARCH_DEBOUNCE_MS: u64 = 80;
