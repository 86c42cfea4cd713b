use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::common::{loose_count, loose_decimal, loose_whole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppraisalGrade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C")]
    C,
}

impl AppraisalGrade {
    pub fn as_str(self) -> &'static str {
        match self {
            AppraisalGrade::APlus => "A+",
            AppraisalGrade::A => "A",
            AppraisalGrade::B => "B",
            AppraisalGrade::BMinus => "B-",
            AppraisalGrade::C => "C",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AppraisalGrade::APlus => "Excellent",
            AppraisalGrade::A => "Above Average",
            AppraisalGrade::B => "Average",
            AppraisalGrade::BMinus => "Below Average",
            AppraisalGrade::C => "Poor Performance",
        }
    }
}

impl fmt::Display for AppraisalGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeResult {
    pub grade: AppraisalGrade,
    pub label: &'static str,
}

/// One KPI task's pair of 1-5 ratings. A missing rating counts as zero points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRatingPair {
    #[serde(default)]
    pub task_id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub self_rating: Option<u8>,
    #[serde(default)]
    pub supervisor_rating: Option<u8>,
}

/// Appraisal row as returned by the calculation endpoint. Derived fields are
/// optional because the backend does not always send them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppraisalResultDto {
    pub employee_id: i64,
    pub employee_name: String,
    #[serde(default)]
    pub attendance_no: Option<String>,
    #[serde(default)]
    pub tasks: Vec<TaskRatingPair>,
    #[serde(default, deserialize_with = "loose_count")]
    pub employee_self_rating: Option<u32>,
    #[serde(default, deserialize_with = "loose_count")]
    pub supervisor_rating: Option<u32>,
    #[serde(default, deserialize_with = "loose_decimal")]
    pub average_rating: Option<f64>,
    #[serde(default, deserialize_with = "loose_count")]
    pub dividend: Option<u32>,
    #[serde(default, deserialize_with = "loose_whole")]
    pub percentage: Option<i64>,
    #[serde(default)]
    pub grade: Option<AppraisalGrade>,
    #[serde(default)]
    pub performance_label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppraisalResult {
    pub employee_id: i64,
    pub employee_name: String,
    pub attendance_no: Option<String>,
    pub employee_self_rating: u32,
    pub supervisor_rating: u32,
    pub average_rating: f64,
    pub dividend: u32,
    pub percentage: i64,
    pub grade: AppraisalGrade,
    pub performance_label: String,
    pub tasks: Vec<TaskRatingPair>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppraisalCalculationRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppraisalSaveRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub results: Vec<AppraisalResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedAppraisal {
    pub id: i64,
    pub employee_id: i64,
    pub employee_name: String,
    #[serde(default)]
    pub attendance_no: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub percentage: i64,
    pub grade: AppraisalGrade,
    pub performance_label: String,
    #[serde(default)]
    pub saved_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppraisalSaveSummary {
    pub saved: usize,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn derived_fields_accept_floats_and_numeric_strings() {
        let row: AppraisalResultDto = serde_json::from_value(json!({
            "employeeId": 7,
            "employeeName": "Rina Das",
            "employeeSelfRating": 9.0,
            "supervisorRating": "8",
            "averageRating": "8.5",
            "dividend": 10,
            "percentage": 84.6,
        }))
        .unwrap();

        assert_eq!(row.employee_self_rating, Some(9));
        assert_eq!(row.supervisor_rating, Some(8));
        assert_eq!(row.average_rating, Some(8.5));
        assert_eq!(row.dividend, Some(10));
        assert_eq!(row.percentage, Some(85));
    }

    #[test]
    fn missing_null_and_blank_fields_read_as_none() {
        let row: AppraisalResultDto = serde_json::from_value(json!({
            "employeeId": 7,
            "employeeName": "Rina Das",
            "percentage": null,
            "dividend": "",
        }))
        .unwrap();

        assert_eq!(row.percentage, None);
        assert_eq!(row.dividend, None);
        assert_eq!(row.employee_self_rating, None);
    }

    #[test]
    fn non_numeric_and_negative_counts_are_rejected() {
        let text = serde_json::from_value::<AppraisalResultDto>(json!({
            "employeeId": 7,
            "employeeName": "Rina Das",
            "percentage": "eighty",
        }));
        assert!(text.is_err());

        let negative = serde_json::from_value::<AppraisalResultDto>(json!({
            "employeeId": 7,
            "employeeName": "Rina Das",
            "dividend": -10,
        }));
        assert!(negative.is_err());
    }
}
