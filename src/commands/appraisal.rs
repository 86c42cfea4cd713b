use serde::Deserialize;
use tauri::State;

use crate::models::appraisal::{
    AppraisalCalculationRequest, AppraisalResult, AppraisalSaveSummary, GradeResult,
    SavedAppraisal,
};
use crate::models::common::{Page, PageQuery};
use crate::services::appraisal_service::AppraisalSelection;
use crate::services::grading::grade;

use super::{AppState, CommandError, CommandResult};

#[tauri::command]
pub async fn appraisal_calculate(
    state: State<'_, AppState>,
    request: AppraisalCalculationRequest,
) -> CommandResult<Vec<AppraisalResult>> {
    state
        .appraisals()
        .calculate(request)
        .await
        .map_err(CommandError::from)
}

#[tauri::command]
pub async fn appraisal_save(
    state: State<'_, AppState>,
    request: AppraisalCalculationRequest,
    result: AppraisalResult,
) -> CommandResult<AppraisalSaveSummary> {
    state
        .appraisals()
        .save_one(&request, result)
        .await
        .map_err(CommandError::from)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSavePayload {
    request: AppraisalCalculationRequest,
    results: Vec<AppraisalResult>,
    #[serde(default)]
    selected_employee_ids: Vec<i64>,
}

#[tauri::command]
pub async fn appraisal_save_selected(
    state: State<'_, AppState>,
    payload: BulkSavePayload,
) -> CommandResult<AppraisalSaveSummary> {
    let selection: AppraisalSelection = payload.selected_employee_ids.into_iter().collect();
    state
        .appraisals()
        .save_selected(&payload.request, &payload.results, &selection)
        .await
        .map_err(CommandError::from)
}

#[tauri::command]
pub async fn appraisal_list_saved(
    state: State<'_, AppState>,
    query: Option<PageQuery>,
) -> CommandResult<Page<SavedAppraisal>> {
    state
        .appraisals()
        .list_saved(query.unwrap_or_default())
        .await
        .map_err(CommandError::from)
}

#[tauri::command]
pub fn appraisal_grade(percentage: f64) -> GradeResult {
    grade(percentage)
}
