// Error mapping and rejected-input edge cases

use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use perfdesk_app_lib::commands::CommandError;
use perfdesk_app_lib::error::{ApiErrorCode, AppError};
use perfdesk_app_lib::models::directory::EmployeeFilter;
use perfdesk_app_lib::models::review::{ReviewRatingUpdate, ReviewUpdateInput};
use perfdesk_app_lib::services::compensation_service::CompensationService;
use perfdesk_app_lib::services::directory_service::DirectoryService;
use perfdesk_app_lib::services::hr_api::{BackendConfig, HttpBackend};
use perfdesk_app_lib::services::review_service::ReviewService;
use perfdesk_app_lib::services::submission_guard::SubmissionGuard;
use serde_json::json;

fn backend_for(server: &MockServer) -> Arc<HttpBackend> {
    Arc::new(
        HttpBackend::new(BackendConfig {
            base_url: server.base_url(),
            api_token: None,
            http_timeout: Duration::from_secs(5),
        })
        .expect("backend should build"),
    )
}

#[test]
fn validation_error_keeps_details() {
    let error = CommandError::from(AppError::validation_with_details(
        "Month must use the YYYY-MM format",
        json!({"fields": {"month": ["Invalid month: 2024-13"]}}),
    ));
    assert_eq!(error.code, "VALIDATION_ERROR");
    assert_eq!(error.message, "Month must use the YYYY-MM format");
    assert_eq!(
        error.details.unwrap()["fields"]["month"][0],
        json!("Invalid month: 2024-13")
    );
}

#[test]
fn api_error_merges_status_into_details() {
    let error = CommandError::from(AppError::api_with_details(
        ApiErrorCode::ServerError,
        Some(502),
        "Something went wrong, please try again",
        Some(json!({"requestId": "abc"})),
    ));
    assert_eq!(error.code, "SERVER_ERROR");
    let details = error.details.unwrap();
    assert_eq!(details["status"], json!(502));
    assert_eq!(details["requestId"], json!("abc"));

    let bare = CommandError::from(AppError::api(ApiErrorCode::HttpTimeout, "slow"));
    assert_eq!(bare.code, "HTTP_TIMEOUT");
    assert!(bare.details.is_none());
}

#[test]
fn simple_variants_map_to_stable_codes() {
    let cases = [
        (AppError::not_found(), "NOT_FOUND"),
        (AppError::conflict("duplicate"), "CONFLICT"),
        (AppError::unauthorized("expired"), "UNAUTHORIZED"),
        (AppError::busy("appraisal.save.bulk"), "BUSY"),
        (AppError::database("disk full"), "UNKNOWN"),
        (AppError::other("boom"), "UNKNOWN"),
    ];
    for (error, code) in cases {
        assert_eq!(CommandError::from(error).code, code);
    }

    let busy = CommandError::from(AppError::busy("kpi.assignment.create"));
    assert_eq!(busy.details.unwrap()["operation"], json!("kpi.assignment.create"));
}

#[test]
fn command_error_serializes_camel_case_without_empty_details() {
    let value = serde_json::to_value(CommandError::from(AppError::not_found())).unwrap();
    assert_eq!(value["code"], json!("NOT_FOUND"));
    assert!(value.get("details").is_none());
}

#[tokio::test]
async fn out_of_range_review_ratings_never_reach_the_server() {
    let server = MockServer::start_async().await;
    let update = server
        .mock_async(|when, then| {
            when.method(PUT).path("/performance-reviews/8");
            then.status(200);
        })
        .await;

    let service = ReviewService::new(backend_for(&server), SubmissionGuard::new());
    let err = service
        .update(
            8,
            ReviewUpdateInput {
                ratings: vec![ReviewRatingUpdate {
                    task_id: 3,
                    self_rating: Some(6),
                    supervisor_rating: Some(4),
                    comment: None,
                }],
                ..ReviewUpdateInput::default()
            },
        )
        .await
        .unwrap_err();

    let details = err.details().cloned().expect("field details");
    assert!(details["fields"]["tasks.3.selfRating"].is_array());
    update.assert_hits_async(0).await;
}

#[tokio::test]
async fn invalid_import_lists_bad_lines() {
    let server = MockServer::start_async().await;
    let upload = server
        .mock_async(|when, then| {
            when.method(POST).path("/allowance-deductions/import");
            then.status(200);
        })
        .await;

    let service = CompensationService::new(backend_for(&server), SubmissionGuard::new());
    let csv = "employee_id,allowance_deduction_id,amount\n1,2,100\n3,4,lots\n";
    let err = service.import(csv.to_string()).await.unwrap_err();

    let command_error = CommandError::from(err);
    assert_eq!(command_error.code, "VALIDATION_ERROR");
    let rows = command_error.details.unwrap()["rows"].clone();
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
    assert_eq!(rows[0]["line"], json!(3));

    let empty = service.import("\n\n".to_string()).await.unwrap_err();
    assert_eq!(empty.to_string(), "The import file has no data rows");
    upload.assert_hits_async(0).await;
}

#[tokio::test]
async fn department_filter_requires_a_company() {
    let server = MockServer::start_async().await;
    let employees = server
        .mock_async(|when, then| {
            when.method(GET).path("/employees");
            then.status(200).json_body(json!([]));
        })
        .await;

    let service = DirectoryService::new(backend_for(&server));
    let err = service
        .employees(EmployeeFilter {
            company_id: None,
            department_id: Some(4),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation { .. }));
    employees.assert_hits_async(0).await;
}

#[tokio::test]
async fn forbidden_response_surfaces_server_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/companies");
            then.status(403)
                .json_body(json!({"message": "HR administrators only"}));
        })
        .await;

    let service = DirectoryService::new(backend_for(&server));
    let err = service.companies().await.unwrap_err();
    let command_error = CommandError::from(err);

    assert_eq!(command_error.code, "FORBIDDEN");
    assert_eq!(command_error.message, "HR administrators only");
    assert_eq!(command_error.details.unwrap()["status"], json!(403));
}
