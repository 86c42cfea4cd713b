use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::kpi::{
    CapacityCheckRequest, CreatorRole, CreatorRoleInput, KpiAssignment, KpiAssignmentInput,
    KpiTask, KpiTaskInput, WeightTemplate, WeightTemplateInput,
};
use crate::services::hr_api::KpiApi;
use crate::services::submission_guard::SubmissionGuard;
use crate::services::weight_validator::{exceeds_limit, WeightSheet, MAX_TOTAL_PERCENTAGE};

static MONTH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").expect("valid month pattern"));

/// What the form collects for one assignment, next to its weight sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentDraft {
    pub kpi_task_id: i64,
    pub assignee_ids: Vec<i64>,
    pub month: String,
}

/// KPI tasks, creator roles, weight templates and task assignments.
///
/// Mutations return the refetched list so callers always render server state.
pub struct KpiService {
    api: Arc<dyn KpiApi>,
    guard: SubmissionGuard,
}

impl KpiService {
    pub fn new(api: Arc<dyn KpiApi>, guard: SubmissionGuard) -> Self {
        Self { api, guard }
    }

    pub async fn list_tasks(&self) -> AppResult<Vec<KpiTask>> {
        self.api.list_kpi_tasks().await
    }

    pub async fn create_task(&self, input: KpiTaskInput) -> AppResult<Vec<KpiTask>> {
        let input = normalize_task_input(input)?;
        self.guard
            .run("kpi.task.create", self.api.create_kpi_task(&input))
            .await?;
        info!(target: "app::kpi", "kpi task created");
        self.list_tasks().await
    }

    pub async fn update_task(&self, id: i64, input: KpiTaskInput) -> AppResult<Vec<KpiTask>> {
        let input = normalize_task_input(input)?;
        self.guard
            .run(format!("kpi.task.update.{id}"), self.api.update_kpi_task(id, &input))
            .await?;
        info!(target: "app::kpi", id, "kpi task updated");
        self.list_tasks().await
    }

    pub async fn delete_task(&self, id: i64) -> AppResult<Vec<KpiTask>> {
        self.guard
            .run(format!("kpi.task.delete.{id}"), self.api.delete_kpi_task(id))
            .await?;
        info!(target: "app::kpi", id, "kpi task deleted");
        self.list_tasks().await
    }

    pub async fn list_creator_roles(&self) -> AppResult<Vec<CreatorRole>> {
        self.api.list_creator_roles().await
    }

    pub async fn create_creator_role(&self, input: CreatorRoleInput) -> AppResult<Vec<CreatorRole>> {
        let input = normalize_role_input(input)?;
        self.guard
            .run("kpi.role.create", self.api.create_creator_role(&input))
            .await?;
        self.list_creator_roles().await
    }

    pub async fn update_creator_role(
        &self,
        id: i64,
        input: CreatorRoleInput,
    ) -> AppResult<Vec<CreatorRole>> {
        let input = normalize_role_input(input)?;
        self.guard
            .run(
                format!("kpi.role.update.{id}"),
                self.api.update_creator_role(id, &input),
            )
            .await?;
        self.list_creator_roles().await
    }

    pub async fn delete_creator_role(&self, id: i64) -> AppResult<Vec<CreatorRole>> {
        self.guard
            .run(format!("kpi.role.delete.{id}"), self.api.delete_creator_role(id))
            .await?;
        self.list_creator_roles().await
    }

    pub async fn list_weight_templates(&self) -> AppResult<Vec<WeightTemplate>> {
        self.api.list_weight_templates().await
    }

    /// Templates follow the same weight rules as assignments.
    pub async fn save_weight_template(
        &self,
        id: Option<i64>,
        name: &str,
        sheet: &WeightSheet,
    ) -> AppResult<Vec<WeightTemplate>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Template name is required"));
        }
        let input = WeightTemplateInput {
            name: name.to_string(),
            criteria: sheet.to_inputs()?,
        };

        match id {
            Some(id) => {
                self.guard
                    .run(
                        format!("kpi.template.update.{id}"),
                        self.api.update_weight_template(id, &input),
                    )
                    .await?;
            }
            None => {
                self.guard
                    .run("kpi.template.create", self.api.create_weight_template(&input))
                    .await?;
            }
        }
        self.list_weight_templates().await
    }

    pub async fn delete_weight_template(&self, id: i64) -> AppResult<Vec<WeightTemplate>> {
        self.guard
            .run(
                format!("kpi.template.delete.{id}"),
                self.api.delete_weight_template(id),
            )
            .await?;
        self.list_weight_templates().await
    }

    pub async fn list_assignments(&self) -> AppResult<Vec<KpiAssignment>> {
        self.api.list_assignments().await
    }

    /// Weight check, then capacity check, then create.
    pub async fn submit_assignment(
        &self,
        draft: AssignmentDraft,
        sheet: &WeightSheet,
    ) -> AppResult<Vec<KpiAssignment>> {
        let _slot = self.guard.try_begin("kpi.assignment.create")?;
        let input = self.prepare_assignment(draft, sheet, None).await?;
        self.api.create_assignment(&input).await?;
        info!(
            target: "app::kpi",
            kpi_task_id = input.kpi_task_id,
            assignees = input.assignee_ids.len(),
            month = %input.month,
            "kpi assignment created"
        );
        self.list_assignments().await
    }

    pub async fn update_assignment(
        &self,
        id: i64,
        draft: AssignmentDraft,
        sheet: &WeightSheet,
    ) -> AppResult<Vec<KpiAssignment>> {
        let _slot = self.guard.try_begin(format!("kpi.assignment.update.{id}"))?;
        let input = self.prepare_assignment(draft, sheet, Some(id)).await?;
        self.api.update_assignment(id, &input).await?;
        info!(target: "app::kpi", id, "kpi assignment updated");
        self.list_assignments().await
    }

    pub async fn delete_assignment(&self, id: i64) -> AppResult<Vec<KpiAssignment>> {
        self.guard
            .run(
                format!("kpi.assignment.delete.{id}"),
                self.api.delete_assignment(id),
            )
            .await?;
        info!(target: "app::kpi", id, "kpi assignment deleted");
        self.list_assignments().await
    }

    async fn prepare_assignment(
        &self,
        draft: AssignmentDraft,
        sheet: &WeightSheet,
        exclude_assignment_id: Option<i64>,
    ) -> AppResult<KpiAssignmentInput> {
        let month = validate_month(&draft.month)?;
        let assignee_ids = dedup_assignees(draft.assignee_ids)?;
        let criteria = sheet.to_inputs()?;
        let total_percentage: f64 = criteria.iter().map(|criterion| criterion.percentage).sum();
        if exceeds_limit(total_percentage) {
            return Err(AppError::validation(format!(
                "Total weight cannot exceed {MAX_TOTAL_PERCENTAGE}%"
            )));
        }

        let check = self
            .api
            .check_capacity(&CapacityCheckRequest {
                assignee_ids: assignee_ids.clone(),
                month: month.clone(),
                total_percentage,
                exclude_assignment_id,
            })
            .await?;
        debug!(
            target: "app::kpi",
            ok = check.ok,
            over = check.over_capacity.len(),
            "capacity checked"
        );
        if !check.ok {
            return Err(AppError::capacity_exceeded(check.over_capacity));
        }

        Ok(KpiAssignmentInput {
            kpi_task_id: draft.kpi_task_id,
            assignee_ids,
            month,
            criteria,
        })
    }
}

pub fn validate_month(raw: &str) -> AppResult<String> {
    let month = raw.trim();
    if MONTH_PATTERN.is_match(month) {
        Ok(month.to_string())
    } else {
        Err(AppError::validation_with_details(
            "Month must use the YYYY-MM format",
            json!({ "fields": { "month": [format!("Invalid month: {month}")] } }),
        ))
    }
}

fn dedup_assignees(ids: Vec<i64>) -> AppResult<Vec<i64>> {
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    if unique.is_empty() {
        return Err(AppError::validation("Select at least one assignee"));
    }
    Ok(unique)
}

fn normalize_task_input(mut input: KpiTaskInput) -> AppResult<KpiTaskInput> {
    input.title = input.title.trim().to_string();
    if input.title.is_empty() {
        return Err(AppError::validation("KPI task title is required"));
    }
    if let (Some(start), Some(end)) = (input.start_date, input.end_date) {
        if start > end {
            return Err(AppError::validation(
                "The start date must not be after the end date",
            ));
        }
    }
    input.description = input
        .description
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    Ok(input)
}

fn normalize_role_input(mut input: CreatorRoleInput) -> AppResult<CreatorRoleInput> {
    input.name = input.name.trim().to_string();
    if input.name.is_empty() {
        return Err(AppError::validation("Role name is required"));
    }
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn month_must_be_year_and_month() {
        assert_eq!(validate_month(" 2025-03 ").unwrap(), "2025-03");
        assert!(validate_month("2025-13").is_err());
        assert!(validate_month("2025-3").is_err());
        assert!(validate_month("March").is_err());
    }

    #[test]
    fn assignees_are_deduplicated_in_order() {
        assert_eq!(dedup_assignees(vec![3, 1, 3, 2]).unwrap(), vec![3, 1, 2]);
        assert!(dedup_assignees(Vec::new()).is_err());
    }

    #[test]
    fn task_input_is_trimmed_and_checked() {
        let input = normalize_task_input(KpiTaskInput {
            title: "  Close tickets ".to_string(),
            description: Some("   ".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(input.title, "Close tickets");
        assert_eq!(input.description, None);

        let reversed = normalize_task_input(KpiTaskInput {
            title: "Audit".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 5, 2),
            end_date: NaiveDate::from_ymd_opt(2025, 5, 1),
            ..Default::default()
        });
        assert!(reversed.is_err());
    }
}
