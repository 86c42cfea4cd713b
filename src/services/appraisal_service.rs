use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::appraisal::{
    AppraisalCalculationRequest, AppraisalGrade, AppraisalResult, AppraisalResultDto,
    AppraisalSaveRequest, AppraisalSaveSummary, SavedAppraisal, TaskRatingPair,
};
use crate::models::common::{Page, PageQuery};
use crate::services::grading::grade;
use crate::services::hr_api::AppraisalApi;
use crate::services::submission_guard::SubmissionGuard;

/// Highest rating a single task can receive from one rater.
pub const MAX_TASK_RATING: u32 = 5;

const MAX_PER_PAGE: usize = 100;

/// Scores derived from an ordered list of per-task rating pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppraisalScore {
    pub employee_self_rating: u32,
    pub supervisor_rating: u32,
    pub average_rating: f64,
    pub dividend: u32,
    pub percentage: i64,
    pub grade: AppraisalGrade,
}

impl AppraisalScore {
    pub fn from_tasks(tasks: &[TaskRatingPair]) -> Self {
        let employee_self_rating = tasks
            .iter()
            .map(|task| u32::from(task.self_rating.unwrap_or(0)))
            .sum();
        let supervisor_rating = tasks
            .iter()
            .map(|task| u32::from(task.supervisor_rating.unwrap_or(0)))
            .sum();
        let dividend = tasks.len() as u32 * MAX_TASK_RATING;
        let average_rating = average_rating(employee_self_rating, supervisor_rating);
        let percentage = percentage_of(average_rating, dividend);

        Self {
            employee_self_rating,
            supervisor_rating,
            average_rating,
            dividend,
            percentage,
            grade: grade(percentage as f64).grade,
        }
    }
}

pub fn average_rating(self_rating: u32, supervisor_rating: u32) -> f64 {
    (f64::from(self_rating) + f64::from(supervisor_rating)) / 2.0
}

/// `round(average / dividend * 100)`; a zero dividend (no tasks) scores 0.
pub fn percentage_of(average_rating: f64, dividend: u32) -> i64 {
    if dividend == 0 {
        return 0;
    }
    (average_rating / f64::from(dividend) * 100.0).round() as i64
}

/// Turn a calculation row into a full result. Values the backend sent win;
/// missing ones are derived locally.
pub fn normalize_result(dto: AppraisalResultDto) -> AppraisalResult {
    let derived = AppraisalScore::from_tasks(&dto.tasks);

    let employee_self_rating = dto
        .employee_self_rating
        .unwrap_or(derived.employee_self_rating);
    let supervisor_rating = dto.supervisor_rating.unwrap_or(derived.supervisor_rating);
    let dividend = dto.dividend.unwrap_or(derived.dividend);
    let average = dto
        .average_rating
        .unwrap_or_else(|| average_rating(employee_self_rating, supervisor_rating));
    let percentage = dto
        .percentage
        .unwrap_or_else(|| percentage_of(average, dividend));
    let tier = dto.grade.unwrap_or_else(|| grade(percentage as f64).grade);
    let performance_label = dto
        .performance_label
        .filter(|label| !label.trim().is_empty())
        .unwrap_or_else(|| tier.label().to_string());

    if !dto.tasks.is_empty() && (percentage != derived.percentage || tier != derived.grade) {
        warn!(
            target: "app::appraisal",
            employee_id = dto.employee_id,
            server_percentage = percentage,
            local_percentage = derived.percentage,
            server_grade = %tier,
            local_grade = %derived.grade,
            "server appraisal differs from local derivation"
        );
    }

    AppraisalResult {
        employee_id: dto.employee_id,
        employee_name: dto.employee_name,
        attendance_no: dto.attendance_no,
        employee_self_rating,
        supervisor_rating,
        average_rating: average,
        dividend,
        percentage,
        grade: tier,
        performance_label,
        tasks: dto.tasks,
    }
}

/// Which calculated rows are ticked for a bulk save.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppraisalSelection {
    selected: BTreeSet<i64>,
}

impl AppraisalSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the employee is selected after the toggle.
    pub fn toggle(&mut self, employee_id: i64) -> bool {
        if self.selected.remove(&employee_id) {
            false
        } else {
            self.selected.insert(employee_id);
            true
        }
    }

    pub fn select_all(&mut self, results: &[AppraisalResult]) {
        self.selected = results.iter().map(|result| result.employee_id).collect();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, employee_id: i64) -> bool {
        self.selected.contains(&employee_id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn all_selected(&self, results: &[AppraisalResult]) -> bool {
        !results.is_empty()
            && results
                .iter()
                .all(|result| self.selected.contains(&result.employee_id))
    }

    /// Selected rows in calculation order; ids no longer present are ignored.
    pub fn pick(&self, results: &[AppraisalResult]) -> Vec<AppraisalResult> {
        results
            .iter()
            .filter(|result| self.selected.contains(&result.employee_id))
            .cloned()
            .collect()
    }
}

impl FromIterator<i64> for AppraisalSelection {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self {
            selected: iter.into_iter().collect(),
        }
    }
}

pub struct AppraisalService {
    api: Arc<dyn AppraisalApi>,
    guard: SubmissionGuard,
}

impl AppraisalService {
    pub fn new(api: Arc<dyn AppraisalApi>, guard: SubmissionGuard) -> Self {
        Self { api, guard }
    }

    pub async fn calculate(
        &self,
        request: AppraisalCalculationRequest,
    ) -> AppResult<Vec<AppraisalResult>> {
        if request.start_date > request.end_date {
            return Err(AppError::validation(
                "The start date must not be after the end date",
            ));
        }

        let rows = self
            .guard
            .run("appraisal.calculate", self.api.calculate_appraisals(&request))
            .await?;
        let results: Vec<AppraisalResult> = rows.into_iter().map(normalize_result).collect();
        debug!(
            target: "app::appraisal",
            start = %request.start_date,
            end = %request.end_date,
            count = results.len(),
            "appraisals calculated"
        );
        Ok(results)
    }

    pub async fn save_one(
        &self,
        request: &AppraisalCalculationRequest,
        result: AppraisalResult,
    ) -> AppResult<AppraisalSaveSummary> {
        let employee_id = result.employee_id;
        let payload = AppraisalSaveRequest {
            start_date: request.start_date,
            end_date: request.end_date,
            results: vec![result],
        };
        let summary = self
            .guard
            .run(
                format!("appraisal.save.{employee_id}"),
                self.api.save_appraisal(&payload),
            )
            .await?;
        info!(target: "app::appraisal", employee_id, "appraisal saved");
        Ok(summary)
    }

    pub async fn save_selected(
        &self,
        request: &AppraisalCalculationRequest,
        results: &[AppraisalResult],
        selection: &AppraisalSelection,
    ) -> AppResult<AppraisalSaveSummary> {
        let picked = selection.pick(results);
        if picked.is_empty() {
            return Err(AppError::validation(
                "Select at least one appraisal to save",
            ));
        }

        let count = picked.len();
        let payload = AppraisalSaveRequest {
            start_date: request.start_date,
            end_date: request.end_date,
            results: picked,
        };
        let summary = self
            .guard
            .run("appraisal.save.bulk", self.api.save_appraisals_bulk(&payload))
            .await?;
        info!(target: "app::appraisal", count, saved = summary.saved, "appraisals bulk saved");
        Ok(summary)
    }

    pub async fn list_saved(&self, query: PageQuery) -> AppResult<Page<SavedAppraisal>> {
        let query = PageQuery {
            page: query.page.max(1),
            per_page: query.per_page.clamp(1, MAX_PER_PAGE),
            search: query
                .search
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
        };
        self.api.list_saved_appraisals(&query).await
    }
}
