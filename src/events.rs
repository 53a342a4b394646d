// Vault change notifications: a small listener registry, refresh
// coalescing and a filesystem watcher feeding both

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Notify;

use crate::error::Result;
use crate::tree::relative_path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VaultEvent {
    Created { path: String },
    Deleted { path: String },
    Renamed { from: String, to: String },
}

// ============================================
// EVENT BUS
// ============================================

type Listener = Arc<dyn Fn(&VaultEvent) + Send + Sync>;

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(u64, Listener)>>,
}

/// Cloneable handle to a set of vault-event listeners
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered until the returned
    /// subscription is dropped.
    pub fn subscribe(&self, listener: impl Fn(&VaultEvent) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.write().push((id, Arc::new(listener)));
        Subscription { id, bus: Arc::downgrade(&self.inner) }
    }

    pub fn emit(&self, event: &VaultEvent) {
        // Snapshot so listeners may subscribe or unsubscribe re-entrantly
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .read()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        tracing::debug!("[EventBus::emit] {:?} -> {} listeners", event, listeners.len());
        for listener in listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }
}

/// Scoped registration on an `EventBus`
#[must_use = "dropping a Subscription unregisters the listener"]
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.listeners.write().retain(|(id, _)| *id != self.id);
        }
    }
}

// ============================================
// REFRESH QUEUE
// ============================================

/// Collapses bursts of refresh requests into a single pending refresh
#[derive(Debug, Default)]
pub struct RefreshQueue {
    pending: AtomicBool,
    notify: Notify,
}

impl RefreshQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a refresh; returns false when one was already pending
    pub fn request(&self) -> bool {
        let queued = !self.pending.swap(true, Ordering::AcqRel);
        if queued {
            self.notify.notify_one();
        }
        queued
    }

    /// Claim the pending refresh, if any
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Wait for the next refresh and claim it
    pub async fn next(&self) {
        loop {
            if self.take() {
                return;
            }
            self.notify.notified().await;
        }
    }
}

// ============================================
// FILESYSTEM WATCHER
// ============================================

/// Keeps the underlying watcher alive; dropping it stops delivery
pub struct VaultWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl VaultWatcher {
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Watch `root` recursively and publish create/delete/rename events on `bus`
pub fn watch_vault(root: &Path, bus: EventBus) -> Result<VaultWatcher> {
    let root = root.canonicalize()?;
    let event_root = root.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| match res {
            Ok(event) => {
                for vault_event in map_event(&event_root, &event) {
                    bus.emit(&vault_event);
                }
            }
            Err(e) => tracing::warn!("[watch_vault] Watcher error: {}", e),
        },
        Config::default(),
    )?;
    watcher.watch(&root, RecursiveMode::Recursive)?;
    tracing::info!("[watch_vault] Watching {:?}", root);

    Ok(VaultWatcher { _watcher: watcher, root })
}

/// Translate a raw watcher event into vault events. Content edits and
/// hidden paths are ignored.
pub fn map_event(root: &Path, event: &notify::Event) -> Vec<VaultEvent> {
    let rel = |path: &PathBuf| relative_path(root, path).filter(|p| !is_hidden_path(p));
    let each = |make: fn(String) -> VaultEvent| -> Vec<VaultEvent> {
        event.paths.iter().filter_map(rel).map(make).collect()
    };

    match event.kind {
        EventKind::Create(_) => each(|path| VaultEvent::Created { path }),
        EventKind::Remove(_) => each(|path| VaultEvent::Deleted { path }),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            match (event.paths.first().and_then(rel), event.paths.get(1).and_then(rel)) {
                (Some(from), Some(to)) => vec![VaultEvent::Renamed { from, to }],
                (Some(path), None) => vec![VaultEvent::Deleted { path }],
                (None, Some(path)) => vec![VaultEvent::Created { path }],
                (None, None) => Vec::new(),
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            each(|path| VaultEvent::Deleted { path })
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            each(|path| VaultEvent::Created { path })
        }
        // Platforms that cannot pair rename halves report each side alone
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .filter_map(|p| rel(p).map(|path| (p.exists(), path)))
            .map(|(exists, path)| {
                if exists {
                    VaultEvent::Created { path }
                } else {
                    VaultEvent::Deleted { path }
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn is_hidden_path(path: &str) -> bool {
    path.split('/').any(|segment| segment.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind};
    use parking_lot::Mutex;

    fn event(kind: EventKind, paths: &[&str]) -> notify::Event {
        let mut event = notify::Event::new(kind);
        for p in paths {
            event = event.add_path(PathBuf::from(p));
        }
        event
    }

    #[test]
    fn test_subscription_drop_unregisters() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let sub = bus.subscribe(move |e| sink.lock().push(e.clone()));

        let created = VaultEvent::Created { path: "a.md".into() };
        bus.emit(&created);
        assert_eq!(bus.listener_count(), 1);

        drop(sub);
        bus.emit(&VaultEvent::Deleted { path: "a.md".into() });
        assert_eq!(bus.listener_count(), 0);
        assert_eq!(*seen.lock(), vec![created]);
    }

    #[test]
    fn test_subscription_outlives_bus() {
        let bus = EventBus::new();
        let sub = bus.subscribe(|_| {});
        drop(bus);
        drop(sub);
    }

    #[test]
    fn test_refresh_queue_coalesces() {
        let queue = RefreshQueue::new();
        assert!(queue.request());
        assert!(!queue.request());
        assert!(queue.is_pending());
        assert!(queue.take());
        assert!(!queue.take());
        assert!(queue.request());
    }

    #[tokio::test]
    async fn test_refresh_queue_wakes_waiter() {
        let queue = Arc::new(RefreshQueue::new());
        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.next().await })
        };
        tokio::task::yield_now().await;
        queue.request();
        queue.request();
        waiter.await.unwrap();
        assert!(!queue.is_pending());
    }

    #[test]
    fn test_map_event_kinds() {
        let root = Path::new("/vault");
        assert_eq!(
            map_event(root, &event(EventKind::Create(CreateKind::File), &["/vault/a.md"])),
            vec![VaultEvent::Created { path: "a.md".into() }]
        );
        assert_eq!(
            map_event(root, &event(EventKind::Remove(RemoveKind::Folder), &["/vault/Dir"])),
            vec![VaultEvent::Deleted { path: "Dir".into() }]
        );
        assert_eq!(
            map_event(
                root,
                &event(
                    EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
                    &["/vault/old.md", "/vault/sub/new.md"]
                )
            ),
            vec![VaultEvent::Renamed { from: "old.md".into(), to: "sub/new.md".into() }]
        );
    }

    #[test]
    fn test_map_event_ignores_edits_and_hidden() {
        let root = Path::new("/vault");
        let edit = event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), &["/vault/a.md"]);
        assert!(map_event(root, &edit).is_empty());
        let hidden = event(EventKind::Create(CreateKind::File), &["/vault/.obsidian/ws.json"]);
        assert!(map_event(root, &hidden).is_empty());
        let outside = event(EventKind::Create(CreateKind::File), &["/elsewhere/a.md"]);
        assert!(map_event(root, &outside).is_empty());
    }
}
