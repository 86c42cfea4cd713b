use serde::Deserialize;
use tauri::State;

use crate::models::settings::AppSettings;
use crate::services::settings_service::SettingsUpdateInput;

use super::{run_blocking, AppState, CommandResult};

#[tauri::command]
pub async fn settings_get(state: State<'_, AppState>) -> CommandResult<AppSettings> {
    let app_state = state.inner().clone();
    run_blocking(move || app_state.settings().get()).await
}

#[tauri::command]
pub async fn settings_update(
    state: State<'_, AppState>,
    payload: SettingsUpdatePayload,
) -> CommandResult<AppSettings> {
    let app_state = state.inner().clone();
    let input = payload.into_input();
    run_blocking(move || app_state.update_settings(input)).await
}

#[tauri::command]
pub async fn settings_clear_api_token(state: State<'_, AppState>) -> CommandResult<AppSettings> {
    let app_state = state.inner().clone();
    run_blocking(move || app_state.clear_api_token()).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdatePayload {
    #[serde(default)]
    api_base_url: Option<String>,
    #[serde(default)]
    api_token: Option<String>,
    #[serde(default)]
    remove_api_token: Option<bool>,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
    #[serde(default)]
    notification_poll_secs: Option<u64>,
    #[serde(default)]
    default_page_size: Option<usize>,
}

impl SettingsUpdatePayload {
    fn into_input(self) -> SettingsUpdateInput {
        let api_token = if self.remove_api_token == Some(true) {
            Some(None)
        } else {
            self.api_token.map(Some)
        };

        SettingsUpdateInput {
            api_base_url: self.api_base_url,
            api_token,
            request_timeout_secs: self.request_timeout_secs,
            notification_poll_secs: self.notification_poll_secs,
            default_page_size: self.default_page_size,
        }
    }
}
