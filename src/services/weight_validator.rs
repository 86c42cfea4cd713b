use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::kpi::{CriterionId, WeightCriterion, WeightCriterionInput, WeightTemplate};

pub const MAX_TOTAL_PERCENTAGE: f64 = 100.0;

// Absorbs float noise from decimal splits such as 33.3 + 33.3 + 33.4.
const TOTAL_EPSILON: f64 = 1e-9;

/// Ordered weight criteria of one KPI task assignment while it is being edited.
///
/// Every single-field edit is checked against the running total and rejected
/// without touching the sheet when it would push the total above 100%.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeightSheet {
    criteria: Vec<WeightCriterion>,
}

impl WeightSheet {
    pub fn new(criteria: Vec<WeightCriterion>) -> Self {
        Self { criteria }
    }

    /// Start a sheet from a template. Rows get fresh temporary ids because the
    /// assignment does not own the template's criteria.
    pub fn from_template(template: &WeightTemplate) -> Self {
        let criteria = template
            .criteria
            .iter()
            .map(|criterion| WeightCriterion {
                id: CriterionId::temporary(),
                ..criterion.clone()
            })
            .collect();
        Self { criteria }
    }

    pub fn criteria(&self) -> &[WeightCriterion] {
        &self.criteria
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.criteria.iter().map(WeightCriterion::weight).sum()
    }

    pub fn remaining(&self) -> f64 {
        (MAX_TOTAL_PERCENTAGE - self.total()).max(0.0)
    }

    /// Total the sheet would have if `id` held `candidate`.
    pub fn simulated_total(&self, id: &CriterionId, candidate: Option<f64>) -> AppResult<f64> {
        let index = self.position(id)?;
        let others: f64 = self
            .criteria
            .iter()
            .enumerate()
            .filter(|(position, _)| *position != index)
            .map(|(_, criterion)| criterion.weight())
            .sum();
        let candidate = candidate.filter(|value| value.is_finite()).unwrap_or(0.0);
        Ok(others + candidate)
    }

    /// Commit `candidate` for one row, or reject it and leave the sheet as is.
    /// Returns the new total on success.
    pub fn set_percentage(&mut self, id: &CriterionId, candidate: Option<f64>) -> AppResult<f64> {
        if let Some(value) = candidate {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::validation(
                    "Weight percentage must be a number between 0 and 100",
                ));
            }
        }

        let attempted = self.simulated_total(id, candidate)?;
        if exceeds_limit(attempted) {
            return Err(AppError::validation_with_details(
                format!(
                    "Total weight cannot exceed {MAX_TOTAL_PERCENTAGE}% (would be {attempted}%)"
                ),
                json!({
                    "attemptedTotal": attempted,
                    "limit": MAX_TOTAL_PERCENTAGE,
                    "remaining": self.remaining_excluding(id)?,
                }),
            ));
        }

        let index = self.position(id)?;
        self.criteria[index].percentage = candidate;
        debug!(target: "app::kpi::weights", total = attempted, "weight updated");
        Ok(attempted)
    }

    /// Same as [`set_percentage`](Self::set_percentage) for a raw form value.
    pub fn set_percentage_input(&mut self, id: &CriterionId, raw: &str) -> AppResult<f64> {
        self.set_percentage(id, parse_percentage_input(raw))
    }

    pub fn set_title(&mut self, id: &CriterionId, title: impl Into<String>) -> AppResult<()> {
        let index = self.position(id)?;
        self.criteria[index].title = title.into();
        Ok(())
    }

    pub fn set_description(&mut self, id: &CriterionId, description: Option<String>) -> AppResult<()> {
        let index = self.position(id)?;
        self.criteria[index].description = description.filter(|value| !value.trim().is_empty());
        Ok(())
    }

    pub fn add_blank(&mut self) -> CriterionId {
        let criterion = WeightCriterion::blank();
        let id = criterion.id.clone();
        self.criteria.push(criterion);
        id
    }

    pub fn remove(&mut self, id: &CriterionId) -> AppResult<WeightCriterion> {
        let index = self.position(id)?;
        Ok(self.criteria.remove(index))
    }

    /// Checks run once more right before the assignment is submitted.
    pub fn validate_for_submission(&self) -> AppResult<()> {
        if self.criteria.is_empty() {
            return Err(AppError::validation("Add at least one weight criterion"));
        }

        for (index, criterion) in self.criteria.iter().enumerate() {
            if criterion.title.trim().is_empty() {
                return Err(AppError::validation_with_details(
                    format!("Criterion #{} needs a title", index + 1),
                    json!({ "row": index + 1 }),
                ));
            }
            let value = criterion.weight();
            if !(0.0..=MAX_TOTAL_PERCENTAGE).contains(&value) {
                return Err(AppError::validation_with_details(
                    format!("Criterion \"{}\" must weigh between 0 and 100%", criterion.title.trim()),
                    json!({ "row": index + 1, "percentage": value }),
                ));
            }
        }

        let total = self.total();
        if exceeds_limit(total) {
            return Err(AppError::validation_with_details(
                format!("Total weight cannot exceed {MAX_TOTAL_PERCENTAGE}% (currently {total}%)"),
                json!({ "total": total, "limit": MAX_TOTAL_PERCENTAGE }),
            ));
        }

        Ok(())
    }

    /// Submission payload; temporary ids are dropped so the server assigns them.
    pub fn to_inputs(&self) -> AppResult<Vec<WeightCriterionInput>> {
        self.validate_for_submission()?;
        Ok(self
            .criteria
            .iter()
            .map(|criterion| WeightCriterionInput {
                id: criterion.id.server_id(),
                title: criterion.title.trim().to_string(),
                description: criterion.description.clone(),
                percentage: criterion.weight(),
            })
            .collect())
    }

    fn remaining_excluding(&self, id: &CriterionId) -> AppResult<f64> {
        let others = self.simulated_total(id, None)?;
        Ok((MAX_TOTAL_PERCENTAGE - others).max(0.0))
    }

    fn position(&self, id: &CriterionId) -> AppResult<usize> {
        self.criteria
            .iter()
            .position(|criterion| &criterion.id == id)
            .ok_or_else(|| AppError::validation("Unknown weight criterion"))
    }
}

pub fn exceeds_limit(total: f64) -> bool {
    total > MAX_TOTAL_PERCENTAGE + TOTAL_EPSILON
}

/// Form inputs arrive as text; anything that is not a finite number is "no value".
pub fn parse_percentage_input(raw: &str) -> Option<f64> {
    raw.trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criterion(id: i64, title: &str, percentage: Option<f64>) -> WeightCriterion {
        WeightCriterion {
            id: CriterionId::Server(id),
            title: title.to_string(),
            description: None,
            percentage,
        }
    }

    fn sheet_at_ninety() -> WeightSheet {
        WeightSheet::new(vec![
            criterion(1, "Quality", Some(40.0)),
            criterion(2, "Delivery", Some(30.0)),
            criterion(3, "Teamwork", Some(20.0)),
            criterion(4, "Initiative", None),
        ])
    }

    #[test]
    fn edit_past_one_hundred_is_rejected_and_state_retained() {
        let mut sheet = sheet_at_ninety();
        let before = sheet.clone();

        let result = sheet.set_percentage(&CriterionId::Server(4), Some(11.0));

        assert!(matches!(result, Err(AppError::Validation { .. })));
        assert_eq!(sheet, before);
        assert_eq!(sheet.total(), 90.0);
    }

    #[test]
    fn edit_reaching_exactly_one_hundred_is_accepted() {
        let mut sheet = sheet_at_ninety();

        let total = sheet.set_percentage(&CriterionId::Server(4), Some(10.0)).unwrap();

        assert_eq!(total, 100.0);
        assert_eq!(sheet.criteria()[3].percentage, Some(10.0));
        assert_eq!(sheet.remaining(), 0.0);
    }

    #[test]
    fn replacing_a_value_excludes_its_old_weight() {
        let mut sheet = sheet_at_ninety();
        let total = sheet.set_percentage(&CriterionId::Server(1), Some(50.0)).unwrap();
        assert_eq!(total, 100.0);
    }

    #[test]
    fn rejection_reports_attempted_total() {
        let mut sheet = sheet_at_ninety();
        let error = sheet
            .set_percentage(&CriterionId::Server(4), Some(11.0))
            .unwrap_err();
        let details = error.details().cloned().expect("details");
        assert_eq!(details["attemptedTotal"], 101.0);
        assert_eq!(details["remaining"], 10.0);
    }

    #[test]
    fn non_numeric_input_counts_as_zero() {
        let mut sheet = sheet_at_ninety();
        let total = sheet
            .set_percentage_input(&CriterionId::Server(1), "abc")
            .unwrap();
        assert_eq!(total, 50.0);
        assert_eq!(sheet.criteria()[0].percentage, None);
    }

    #[test]
    fn decimal_splits_are_not_rejected_by_float_noise() {
        let mut sheet = WeightSheet::new(vec![
            criterion(1, "A", Some(33.3)),
            criterion(2, "B", Some(33.3)),
            criterion(3, "C", None),
        ]);
        assert!(sheet.set_percentage(&CriterionId::Server(3), Some(33.4)).is_ok());
        assert!(sheet.validate_for_submission().is_ok());
    }

    #[test]
    fn negative_values_are_rejected() {
        let mut sheet = sheet_at_ninety();
        assert!(sheet.set_percentage(&CriterionId::Server(4), Some(-1.0)).is_err());
    }

    #[test]
    fn blank_rows_get_temporary_ids_and_are_dropped_from_payload_ids() {
        let mut sheet = sheet_at_ninety();
        let id = sheet.add_blank();
        assert!(id.is_temporary());
        sheet.set_title(&id, "Attendance").unwrap();
        sheet.remove(&CriterionId::Server(4)).unwrap();

        let inputs = sheet.to_inputs().unwrap();
        assert_eq!(inputs.len(), 4);
        assert_eq!(inputs[0].id, Some(1));
        assert_eq!(inputs[3].id, None);
        assert_eq!(inputs[3].percentage, 0.0);
    }

    #[test]
    fn submission_requires_titles() {
        let mut sheet = sheet_at_ninety();
        sheet.add_blank();
        assert!(sheet.validate_for_submission().is_err());
    }

    #[test]
    fn template_rows_are_copied_with_fresh_ids() {
        let template = WeightTemplate {
            id: 9,
            name: "Sales".to_string(),
            criteria: vec![criterion(10, "Revenue", Some(60.0))],
        };
        let sheet = WeightSheet::from_template(&template);
        assert_eq!(sheet.len(), 1);
        assert!(sheet.criteria()[0].id.is_temporary());
        assert_eq!(sheet.total(), 60.0);
    }

    #[test]
    fn parses_percent_suffix() {
        assert_eq!(parse_percentage_input(" 25 % "), Some(25.0));
        assert_eq!(parse_percentage_input(""), None);
        assert_eq!(parse_percentage_input("NaN"), None);
    }
}
