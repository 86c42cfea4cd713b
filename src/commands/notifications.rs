use tauri::{AppHandle, Emitter, State};
use tracing::warn;

use crate::models::notification::NotificationSnapshot;

use super::{AppState, CommandError, CommandResult};

pub const SNAPSHOT_EVENT: &str = "notifications://snapshot";

/// Forward every published snapshot to the webview. Spawned once at startup.
pub fn spawn_snapshot_forwarder(app: AppHandle, state: &AppState) {
    let mut receiver = state.notifications().subscribe();
    tauri::async_runtime::spawn(async move {
        while receiver.changed().await.is_ok() {
            let snapshot = receiver.borrow_and_update().clone();
            if let Err(err) = app.emit(SNAPSHOT_EVENT, snapshot) {
                warn!(target: "app::notifications", error = %err, "failed to emit snapshot");
            }
        }
    });
}

#[tauri::command]
pub async fn notifications_start(state: State<'_, AppState>) -> CommandResult<NotificationSnapshot> {
    let poller = state.notifications();
    poller.start()?;
    Ok(poller.latest())
}

#[tauri::command]
pub fn notifications_stop(state: State<'_, AppState>) -> bool {
    state.notifications().stop()
}

#[tauri::command]
pub async fn notifications_refresh(
    state: State<'_, AppState>,
) -> CommandResult<NotificationSnapshot> {
    state
        .notifications()
        .poll_once()
        .await
        .map_err(CommandError::from)
}

#[tauri::command]
pub async fn notifications_mark_read(
    state: State<'_, AppState>,
    id: i64,
) -> CommandResult<NotificationSnapshot> {
    state
        .notifications()
        .mark_read(id)
        .await
        .map_err(CommandError::from)
}
