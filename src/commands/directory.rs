use tauri::State;

use crate::models::directory::{Company, Department, Employee, EmployeeFilter};

use super::{AppState, CommandError, CommandResult};

#[tauri::command]
pub async fn employees_list(
    state: State<'_, AppState>,
    filter: Option<EmployeeFilter>,
) -> CommandResult<Vec<Employee>> {
    state
        .directory()
        .employees(filter.unwrap_or_default())
        .await
        .map_err(CommandError::from)
}

#[tauri::command]
pub async fn companies_list(state: State<'_, AppState>) -> CommandResult<Vec<Company>> {
    state.directory().companies().await.map_err(CommandError::from)
}

#[tauri::command]
pub async fn departments_list(
    state: State<'_, AppState>,
    company_id: i64,
) -> CommandResult<Vec<Department>> {
    state
        .directory()
        .departments(company_id)
        .await
        .map_err(CommandError::from)
}
