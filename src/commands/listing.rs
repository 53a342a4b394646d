// Listing commands - render one block and write its settings back

use tauri::State;

use super::ExplorerState;
use crate::block::LineRange;
use crate::explorer::ExplorerView;
use crate::models::BlockSettings;
use crate::session::ExplorerSession;

/// Build the view for the block at `source_path`. The front end keeps the
/// session and sends it back each time; the returned view carries it with
/// the page clamped into range.
#[tauri::command]
pub async fn get_listing(
    state: State<'_, ExplorerState>,
    source_path: String,
    source: String,
    session: Option<ExplorerSession>,
) -> Result<ExplorerView, String> {
    tracing::debug!("[get_listing] {}", source_path);
    let explorer = state.explorer()?;
    let view = explorer
        .view(&source_path, &source, session.unwrap_or_default())
        .await;
    tracing::debug!(
        "[get_listing] {} files, page {}/{}",
        view.files.len(),
        view.current_page + 1,
        view.total_pages
    );
    Ok(view)
}

#[tauri::command]
pub async fn update_block_settings(
    state: State<'_, ExplorerState>,
    source_path: String,
    range: Option<LineRange>,
    settings: BlockSettings,
) -> Result<bool, String> {
    tracing::info!("[update_block_settings] {} {:?}", source_path, range);
    let explorer = state.explorer()?;
    Ok(explorer.update_block_settings(&source_path, range, &settings).await)
}
