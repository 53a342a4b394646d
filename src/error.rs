// Error types for the boundary operations (filesystem, config, watcher)
// Core index/listing/settings functions are total and never return these

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ExplorerError>;

/// Transient message shown to the user in place of a failed action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Host-provided sink for user notifications
pub trait Notifier {
    fn notify(&self, notice: Notice);
}

/// Notifier that only logs; used when the host has no notification surface
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        tracing::warn!("[notice] {}", notice.message);
    }
}

/// Convert a failed collaborator call into a notification.
///
/// Returns the success value, or `None` after notifying. The render pipeline
/// keeps going either way.
pub fn report<T, N: Notifier + ?Sized>(
    result: Result<T>,
    context: &str,
    notifier: &N,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("[{}] {}", context, e);
            notifier.notify(Notice::new(format!("{}: {}", context, e)));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<Notice>>);

    impl Notifier for Collect {
        fn notify(&self, notice: Notice) {
            self.0.lock().push(notice);
        }
    }

    #[test]
    fn test_report_passes_success_through() {
        let sink = Collect::default();
        assert_eq!(report(Ok(3), "Failed to create note", &sink), Some(3));
        assert!(sink.0.lock().is_empty());
    }

    #[test]
    fn test_report_turns_error_into_notice() {
        let sink = Collect::default();
        let result: Result<()> = Err(ExplorerError::AlreadyExists("Projects".into()));
        assert_eq!(report(result, "Failed to create folder", &sink), None);

        let notices = sink.0.lock();
        assert_eq!(notices.len(), 1);
        assert_eq!(
            notices[0].message,
            "Failed to create folder: Already exists: Projects"
        );
    }
}
