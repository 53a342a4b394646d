// Settings commands - plugin-wide defaults and the schema the settings UI renders

use tauri::{AppHandle, Runtime, State};

use super::{emit_refresh, ExplorerState};
use crate::models::PluginSettings;
use crate::schema::{fields_for_surface, SettingField, Surface};

#[tauri::command]
pub fn get_plugin_settings(state: State<'_, ExplorerState>) -> PluginSettings {
    tracing::debug!("[get_plugin_settings] Called");
    state.settings().get()
}

/// Fields editable on `surface`, in display order
#[tauri::command]
pub fn get_settings_schema(surface: Surface) -> Vec<&'static SettingField> {
    fields_for_surface(surface)
}

/// Merge a partial update into the default block settings. Values are
/// coerced against the schema, so bad input falls back instead of failing.
#[tauri::command]
pub fn update_default_settings<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, ExplorerState>,
    settings: serde_json::Value,
) -> Result<PluginSettings, String> {
    tracing::info!("[update_default_settings] Called");
    let updated = state
        .settings()
        .update_defaults(&settings)
        .map_err(|e| e.to_string())?;
    emit_refresh(&app);
    Ok(updated)
}
