use tauri::State;

use crate::models::common::Page;
use crate::models::compensation::{
    AllowanceDeduction, CompensationInput, EmployeeCompensation, ImportPreview, ImportSummary,
};
use crate::services::listing::{filter_and_paginate, ListQuery};

use super::{AppState, CommandError, CommandResult};

#[tauri::command]
pub async fn compensations_list(
    state: State<'_, AppState>,
    query: Option<ListQuery>,
) -> CommandResult<Page<EmployeeCompensation>> {
    let records = state.compensation().list().await?;
    let page_size = state.default_page_size().await?;
    Ok(filter_and_paginate(records, query.unwrap_or_default(), page_size))
}

#[tauri::command]
pub async fn compensations_save(
    state: State<'_, AppState>,
    id: Option<i64>,
    payload: CompensationInput,
) -> CommandResult<Vec<EmployeeCompensation>> {
    let service = state.compensation();
    match id {
        Some(id) => service.update(id, payload).await,
        None => service.create(payload).await,
    }
    .map_err(CommandError::from)
}

#[tauri::command]
pub async fn compensations_delete(
    state: State<'_, AppState>,
    id: i64,
) -> CommandResult<Vec<EmployeeCompensation>> {
    state.compensation().delete(id).await.map_err(CommandError::from)
}

#[tauri::command]
pub async fn allowance_deductions_list(
    state: State<'_, AppState>,
) -> CommandResult<Vec<AllowanceDeduction>> {
    state
        .compensation()
        .list_allowance_deductions()
        .await
        .map_err(CommandError::from)
}

#[tauri::command]
pub fn allowance_deductions_preview(state: State<'_, AppState>, csv: String) -> ImportPreview {
    state.compensation().preview_import(&csv)
}

#[tauri::command]
pub async fn allowance_deductions_import(
    state: State<'_, AppState>,
    csv: String,
) -> CommandResult<ImportSummary> {
    state.compensation().import(csv).await.map_err(CommandError::from)
}
