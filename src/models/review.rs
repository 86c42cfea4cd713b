use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReview {
    pub id: i64,
    pub employee_id: i64,
    pub employee_name: String,
    #[serde(default)]
    pub reviewer_name: Option<String>,
    #[serde(default)]
    pub period_start: Option<NaiveDate>,
    #[serde(default)]
    pub period_end: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tasks: Vec<ReviewTaskRating>,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewTaskRating {
    pub task_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub self_rating: Option<u8>,
    #[serde(default)]
    pub supervisor_rating: Option<u8>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUpdateInput {
    #[serde(default)]
    pub ratings: Vec<ReviewRatingUpdate>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRatingUpdate {
    pub task_id: i64,
    #[serde(default)]
    pub self_rating: Option<u8>,
    #[serde(default)]
    pub supervisor_rating: Option<u8>,
    #[serde(default)]
    pub comment: Option<String>,
}
