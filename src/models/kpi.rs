use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TEMPORARY_ID_PREFIX: &str = "tmp-";

/// Criterion identity: assigned by the server once persisted, temporary before.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CriterionId {
    Server(i64),
    Temporary(String),
}

impl CriterionId {
    pub fn temporary() -> Self {
        CriterionId::Temporary(format!("{TEMPORARY_ID_PREFIX}{}", Uuid::new_v4()))
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, CriterionId::Temporary(_))
    }

    pub fn server_id(&self) -> Option<i64> {
        match self {
            CriterionId::Server(id) => Some(*id),
            CriterionId::Temporary(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeightCriterion {
    pub id: CriterionId,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub percentage: Option<f64>,
}

impl WeightCriterion {
    pub fn blank() -> Self {
        Self {
            id: CriterionId::temporary(),
            title: String::new(),
            description: None,
            percentage: None,
        }
    }

    /// Contribution to the sheet total; rows without a usable number count as zero.
    pub fn weight(&self) -> f64 {
        match self.percentage {
            Some(value) if value.is_finite() => value,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeightCriterionInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KpiTask {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub creator_role_id: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KpiTaskInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub creator_role_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatorRole {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatorRoleInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeightTemplate {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub criteria: Vec<WeightCriterion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeightTemplateInput {
    pub name: String,
    pub criteria: Vec<WeightCriterionInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KpiAssignment {
    pub id: i64,
    pub kpi_task_id: i64,
    #[serde(default)]
    pub kpi_task_title: Option<String>,
    #[serde(default)]
    pub assignee_ids: Vec<i64>,
    /// Assignment month, `YYYY-MM`.
    pub month: String,
    #[serde(default)]
    pub criteria: Vec<WeightCriterion>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KpiAssignmentInput {
    pub kpi_task_id: i64,
    pub assignee_ids: Vec<i64>,
    pub month: String,
    pub criteria: Vec<WeightCriterionInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CapacityCheckRequest {
    pub assignee_ids: Vec<i64>,
    pub month: String,
    pub total_percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_assignment_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CapacityCheckResult {
    pub ok: bool,
    #[serde(default)]
    pub over_capacity: Vec<OverCapacityAssignee>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverCapacityAssignee {
    pub employee_id: i64,
    #[serde(default)]
    pub employee_name: Option<String>,
    pub current_total: f64,
    pub new_total: f64,
}

impl OverCapacityAssignee {
    pub fn display_name(&self) -> String {
        match self.employee_name.as_deref() {
            Some(name) if !name.trim().is_empty() => format!(
                "{} ({}% -> {}%)",
                name.trim(),
                self.current_total,
                self.new_total
            ),
            _ => format!(
                "#{} ({}% -> {}%)",
                self.employee_id, self.current_total, self.new_total
            ),
        }
    }
}
