// Vault commands - open/close and the creation actions offered by a block

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tauri::{AppHandle, Runtime, State};
use tokio_util::sync::CancellationToken;

use super::{emit_refresh, spawn_refresh_loop, AppNotifier, ExplorerState, OpenVault};
use crate::events::watch_vault;
use crate::explorer::Explorer;
use crate::models::FileEntry;

#[tauri::command]
pub async fn open_vault<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, ExplorerState>,
    root: String,
) -> Result<(), String> {
    tracing::info!("[open_vault] {}", root);
    let root = PathBuf::from(root);
    let notifier = Arc::new(AppNotifier { app: app.clone() });
    let explorer = Explorer::open(root.clone(), state.settings().clone(), notifier)
        .await
        .map_err(|e| e.to_string())?;
    let explorer = Arc::new(explorer);

    // Without a watcher the vault still works; it just won't follow external edits
    let watcher = match watch_vault(&root, explorer.events().clone()) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::warn!("[open_vault] Not watching {:?}: {}", root, e);
            None
        }
    };

    let token = CancellationToken::new();
    spawn_refresh_loop(app.clone(), Arc::clone(&explorer), token.clone());
    state.replace(Some(OpenVault {
        explorer,
        _watcher: Mutex::new(watcher),
        refresh_loop: token,
    }));
    emit_refresh(&app);
    Ok(())
}

#[tauri::command]
pub fn close_vault(state: State<'_, ExplorerState>) {
    tracing::info!("[close_vault] Called");
    state.replace(None);
}

#[tauri::command]
pub async fn create_folder(
    state: State<'_, ExplorerState>,
    base: String,
    name: String,
) -> Result<Option<FileEntry>, String> {
    tracing::info!("[create_folder] '{}' in '{}'", name, base);
    let explorer = state.explorer()?;
    Ok(explorer.create_folder(&base, &name).await)
}

#[tauri::command]
pub async fn create_note(
    state: State<'_, ExplorerState>,
    base: String,
    name: String,
) -> Result<Option<FileEntry>, String> {
    tracing::info!("[create_note] '{}' in '{}'", name, base);
    let explorer = state.explorer()?;
    Ok(explorer.create_note(&base, &name).await)
}

/// Resolve the note a folder button opens, creating it when missing
#[tauri::command]
pub async fn open_folder_note(
    state: State<'_, ExplorerState>,
    folder: String,
) -> Result<Option<FileEntry>, String> {
    tracing::info!("[open_folder_note] {}", folder);
    let explorer = state.explorer()?;
    Ok(explorer.open_folder_note(&folder).await)
}
