use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::review::{PerformanceReview, ReviewUpdateInput};
use crate::services::hr_api::ReviewApi;
use crate::services::submission_guard::SubmissionGuard;

const MIN_RATING: u8 = 1;
const MAX_RATING: u8 = 5;

pub struct ReviewService {
    api: Arc<dyn ReviewApi>,
    guard: SubmissionGuard,
}

impl ReviewService {
    pub fn new(api: Arc<dyn ReviewApi>, guard: SubmissionGuard) -> Self {
        Self { api, guard }
    }

    pub async fn list(&self) -> AppResult<Vec<PerformanceReview>> {
        self.api.list_reviews().await
    }

    pub async fn get(&self, id: i64) -> AppResult<PerformanceReview> {
        self.api.get_review(id).await
    }

    /// Saves ratings and comments, then returns the review as the server now has it.
    pub async fn update(&self, id: i64, input: ReviewUpdateInput) -> AppResult<PerformanceReview> {
        let input = validate_update(input)?;
        self.guard
            .run(format!("review.update.{id}"), self.api.update_review(id, &input))
            .await?;
        info!(target: "app::review", id, ratings = input.ratings.len(), "review updated");
        self.get(id).await
    }
}

fn validate_update(mut input: ReviewUpdateInput) -> AppResult<ReviewUpdateInput> {
    let mut invalid = serde_json::Map::new();
    for rating in &input.ratings {
        for (field, value) in [
            ("selfRating", rating.self_rating),
            ("supervisorRating", rating.supervisor_rating),
        ] {
            if let Some(value) = value {
                if !(MIN_RATING..=MAX_RATING).contains(&value) {
                    invalid.insert(
                        format!("tasks.{}.{field}", rating.task_id),
                        json!([format!("Rating must be between {MIN_RATING} and {MAX_RATING}")]),
                    );
                }
            }
        }
    }
    if !invalid.is_empty() {
        return Err(AppError::validation_with_details(
            "Ratings must be between 1 and 5",
            json!({ "fields": invalid }),
        ));
    }

    input.comments = input
        .comments
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    for rating in &mut input.ratings {
        rating.comment = rating
            .comment
            .take()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
    }
    Ok(input)
}
