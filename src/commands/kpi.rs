use serde::{Deserialize, Serialize};
use tauri::State;

use crate::models::common::Page;
use crate::models::kpi::{
    CreatorRole, CreatorRoleInput, CriterionId, KpiAssignment, KpiTask, KpiTaskInput,
    WeightCriterion, WeightTemplate,
};
use crate::services::kpi_service::AssignmentDraft;
use crate::services::listing::{filter_and_paginate, ListQuery};
use crate::services::weight_validator::WeightSheet;

use super::{AppState, CommandError, CommandResult};

#[tauri::command]
pub async fn kpi_tasks_list(
    state: State<'_, AppState>,
    query: Option<ListQuery>,
) -> CommandResult<Page<KpiTask>> {
    let tasks = state.kpi().list_tasks().await?;
    let page_size = state.default_page_size().await?;
    Ok(filter_and_paginate(tasks, query.unwrap_or_default(), page_size))
}

#[tauri::command]
pub async fn kpi_tasks_create(
    state: State<'_, AppState>,
    payload: KpiTaskInput,
) -> CommandResult<Vec<KpiTask>> {
    state.kpi().create_task(payload).await.map_err(CommandError::from)
}

#[tauri::command]
pub async fn kpi_tasks_update(
    state: State<'_, AppState>,
    id: i64,
    payload: KpiTaskInput,
) -> CommandResult<Vec<KpiTask>> {
    state.kpi().update_task(id, payload).await.map_err(CommandError::from)
}

#[tauri::command]
pub async fn kpi_tasks_delete(state: State<'_, AppState>, id: i64) -> CommandResult<Vec<KpiTask>> {
    state.kpi().delete_task(id).await.map_err(CommandError::from)
}

#[tauri::command]
pub async fn creator_roles_list(state: State<'_, AppState>) -> CommandResult<Vec<CreatorRole>> {
    state.kpi().list_creator_roles().await.map_err(CommandError::from)
}

#[tauri::command]
pub async fn creator_roles_save(
    state: State<'_, AppState>,
    id: Option<i64>,
    payload: CreatorRoleInput,
) -> CommandResult<Vec<CreatorRole>> {
    let service = state.kpi();
    match id {
        Some(id) => service.update_creator_role(id, payload).await,
        None => service.create_creator_role(payload).await,
    }
    .map_err(CommandError::from)
}

#[tauri::command]
pub async fn creator_roles_delete(
    state: State<'_, AppState>,
    id: i64,
) -> CommandResult<Vec<CreatorRole>> {
    state.kpi().delete_creator_role(id).await.map_err(CommandError::from)
}

#[tauri::command]
pub async fn weight_templates_list(
    state: State<'_, AppState>,
) -> CommandResult<Vec<WeightTemplate>> {
    state.kpi().list_weight_templates().await.map_err(CommandError::from)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightTemplatePayload {
    #[serde(default)]
    id: Option<i64>,
    name: String,
    criteria: Vec<WeightCriterion>,
}

#[tauri::command]
pub async fn weight_templates_save(
    state: State<'_, AppState>,
    payload: WeightTemplatePayload,
) -> CommandResult<Vec<WeightTemplate>> {
    let sheet = WeightSheet::new(payload.criteria);
    state
        .kpi()
        .save_weight_template(payload.id, &payload.name, &sheet)
        .await
        .map_err(CommandError::from)
}

#[tauri::command]
pub async fn weight_templates_delete(
    state: State<'_, AppState>,
    id: i64,
) -> CommandResult<Vec<WeightTemplate>> {
    state.kpi().delete_weight_template(id).await.map_err(CommandError::from)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightEditPayload {
    criteria: Vec<WeightCriterion>,
    criterion_id: CriterionId,
    value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightEditResult {
    criteria: Vec<WeightCriterion>,
    total: f64,
    remaining: f64,
}

/// Validates a single weight edit; on rejection the caller keeps its old rows.
#[tauri::command]
pub fn kpi_weight_edit(payload: WeightEditPayload) -> CommandResult<WeightEditResult> {
    let mut sheet = WeightSheet::new(payload.criteria);
    let total = sheet.set_percentage_input(&payload.criterion_id, &payload.value)?;
    Ok(WeightEditResult {
        remaining: sheet.remaining(),
        criteria: sheet.criteria().to_vec(),
        total,
    })
}

#[tauri::command]
pub fn kpi_weight_from_template(template: WeightTemplate) -> Vec<WeightCriterion> {
    WeightSheet::from_template(&template).criteria().to_vec()
}

#[tauri::command]
pub async fn kpi_assignments_list(
    state: State<'_, AppState>,
    query: Option<ListQuery>,
) -> CommandResult<Page<KpiAssignment>> {
    let assignments = state.kpi().list_assignments().await?;
    let page_size = state.default_page_size().await?;
    Ok(filter_and_paginate(assignments, query.unwrap_or_default(), page_size))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentPayload {
    kpi_task_id: i64,
    assignee_ids: Vec<i64>,
    month: String,
    criteria: Vec<WeightCriterion>,
}

impl AssignmentPayload {
    fn into_parts(self) -> (AssignmentDraft, WeightSheet) {
        (
            AssignmentDraft {
                kpi_task_id: self.kpi_task_id,
                assignee_ids: self.assignee_ids,
                month: self.month,
            },
            WeightSheet::new(self.criteria),
        )
    }
}

#[tauri::command]
pub async fn kpi_assignments_submit(
    state: State<'_, AppState>,
    id: Option<i64>,
    payload: AssignmentPayload,
) -> CommandResult<Vec<KpiAssignment>> {
    let (draft, sheet) = payload.into_parts();
    let service = state.kpi();
    match id {
        Some(id) => service.update_assignment(id, draft, &sheet).await,
        None => service.submit_assignment(draft, &sheet).await,
    }
    .map_err(CommandError::from)
}

#[tauri::command]
pub async fn kpi_assignments_delete(
    state: State<'_, AppState>,
    id: i64,
) -> CommandResult<Vec<KpiAssignment>> {
    state.kpi().delete_assignment(id).await.map_err(CommandError::from)
}
