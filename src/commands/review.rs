use tauri::State;

use crate::models::common::Page;
use crate::models::review::{PerformanceReview, ReviewUpdateInput};
use crate::services::listing::{filter_and_paginate, ListQuery};

use super::{AppState, CommandError, CommandResult};

#[tauri::command]
pub async fn reviews_list(
    state: State<'_, AppState>,
    query: Option<ListQuery>,
) -> CommandResult<Page<PerformanceReview>> {
    let reviews = state.reviews().list().await?;
    let page_size = state.default_page_size().await?;
    Ok(filter_and_paginate(reviews, query.unwrap_or_default(), page_size))
}

#[tauri::command]
pub async fn reviews_get(state: State<'_, AppState>, id: i64) -> CommandResult<PerformanceReview> {
    state.reviews().get(id).await.map_err(CommandError::from)
}

#[tauri::command]
pub async fn reviews_update(
    state: State<'_, AppState>,
    id: i64,
    payload: ReviewUpdateInput,
) -> CommandResult<PerformanceReview> {
    state
        .reviews()
        .update(id, payload)
        .await
        .map_err(CommandError::from)
}
