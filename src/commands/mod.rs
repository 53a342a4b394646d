// Tauri plugin binding - exposes the explorer to a webview front end
// Submodules must be public for Tauri's generate_handler! macro

pub mod listing;
pub mod settings;
pub mod vault;

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tauri::plugin::{Builder, TauriPlugin};
use tauri::{AppHandle, Emitter, Manager, Runtime};
use tauri_plugin_notification::NotificationExt;
use tokio_util::sync::CancellationToken;

use crate::error::{Notice, Notifier};
use crate::events::VaultWatcher;
use crate::explorer::Explorer;
use crate::storage::{SettingsState, SettingsStore};

pub const PLUGIN_NAME: &str = "folder-explorer";
/// Emitted to the front end whenever open blocks should re-render
pub const REFRESH_EVENT: &str = "explorer://refresh";

// ============================================
// STATE
// ============================================

/// An open vault with its watcher and refresh loop
struct OpenVault {
    explorer: Arc<Explorer>,
    // Platform watchers are not all Sync
    _watcher: Mutex<Option<VaultWatcher>>,
    refresh_loop: CancellationToken,
}

pub struct ExplorerState {
    settings: SettingsState,
    vault: RwLock<Option<Arc<OpenVault>>>,
    // Serializes open/close so two opens cannot race
    switching: Mutex<()>,
}

impl ExplorerState {
    pub fn new(settings: SettingsState) -> Self {
        Self {
            settings,
            vault: RwLock::new(None),
            switching: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &SettingsState {
        &self.settings
    }

    pub(crate) fn explorer(&self) -> Result<Arc<Explorer>, String> {
        self.vault
            .read()
            .as_ref()
            .map(|open| Arc::clone(&open.explorer))
            .ok_or_else(|| "No vault is open".to_string())
    }

    fn replace(&self, next: Option<OpenVault>) {
        let _guard = self.switching.lock();
        let previous = std::mem::replace(&mut *self.vault.write(), next.map(Arc::new));
        if let Some(previous) = previous {
            previous.refresh_loop.cancel();
            tracing::info!("[ExplorerState::replace] Closed {:?}", previous.explorer.vault().root());
        }
    }
}

// ============================================
// NOTIFICATIONS
// ============================================

/// Routes notices to the system notification center
pub struct AppNotifier<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> Notifier for AppNotifier<R> {
    fn notify(&self, notice: Notice) {
        tracing::warn!("[AppNotifier] {}", notice.message);
        if let Err(e) = self
            .app
            .notification()
            .builder()
            .title("Folder Explorer")
            .body(&notice.message)
            .show()
        {
            tracing::error!("[AppNotifier] Failed to show notification: {}", e);
        }
    }
}

/// Tell open blocks to re-render
pub(crate) fn emit_refresh<R: Runtime>(app: &AppHandle<R>) {
    if let Err(e) = app.emit(REFRESH_EVENT, ()) {
        tracing::error!("[emit_refresh] {}", e);
    }
}

/// Reload the tree whenever the vault changes, then notify the front end.
/// Runs until `token` is cancelled.
fn spawn_refresh_loop<R: Runtime>(app: AppHandle<R>, explorer: Arc<Explorer>, token: CancellationToken) {
    tauri::async_runtime::spawn(async move {
        let queue = Arc::clone(explorer.refresh_queue());
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = queue.next() => {
                    if let Err(e) = explorer.reload().await {
                        tracing::error!("[refresh_loop] Reload failed: {}", e);
                        continue;
                    }
                    emit_refresh(&app);
                }
            }
        }
        tracing::debug!("[refresh_loop] Stopped");
    });
}

// ============================================
// PLUGIN
// ============================================

pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new(PLUGIN_NAME)
        .invoke_handler(tauri::generate_handler![
            // Vault
            vault::open_vault,
            vault::close_vault,
            vault::create_folder,
            vault::create_note,
            vault::open_folder_note,
            // Listing
            listing::get_listing,
            listing::update_block_settings,
            // Settings
            settings::get_plugin_settings,
            settings::get_settings_schema,
            settings::update_default_settings,
        ])
        .setup(|app, _api| {
            let store = match SettingsStore::open_default() {
                Ok(store) => store,
                Err(e) => {
                    tracing::warn!("[init] No config directory ({}), keeping settings in the temp dir", e);
                    SettingsStore::open(std::env::temp_dir().join(PLUGIN_NAME).join("config.md"))
                }
            };
            tracing::info!("[init] Settings at {:?}", store.path());
            app.manage(ExplorerState::new(Arc::new(store)));
            Ok(())
        })
        .build()
}
