use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use httpmock::prelude::*;
use perfdesk_app_lib::error::AppError;
use perfdesk_app_lib::models::appraisal::{AppraisalCalculationRequest, AppraisalGrade};
use perfdesk_app_lib::models::common::PageQuery;
use perfdesk_app_lib::services::appraisal_service::{AppraisalSelection, AppraisalService};
use perfdesk_app_lib::services::hr_api::{BackendConfig, HttpBackend};
use perfdesk_app_lib::services::submission_guard::SubmissionGuard;
use serde_json::json;

fn service_for(server: &MockServer) -> AppraisalService {
    let backend = HttpBackend::new(BackendConfig {
        base_url: server.base_url(),
        api_token: Some("hr-token".into()),
        http_timeout: Duration::from_secs(5),
    })
    .expect("backend should build");
    AppraisalService::new(Arc::new(backend), SubmissionGuard::new())
}

fn first_quarter() -> AppraisalCalculationRequest {
    AppraisalCalculationRequest {
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        employee_id: None,
        company_id: Some(1),
        department_id: None,
    }
}

async fn mock_calculation(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/performance-appraisals/calculate")
                .json_body_partial(r#"{"startDate": "2024-01-01", "endDate": "2024-03-31", "companyId": 1}"#);
            then.status(200).json_body(json!({
                "data": [
                    {
                        "employeeId": 1,
                        "employeeName": "Dana Lee",
                        "tasks": [
                            {"taskId": 10, "title": "Ledger", "selfRating": 5, "supervisorRating": 4},
                            {"taskId": 11, "title": "Audit", "selfRating": 4, "supervisorRating": 4}
                        ]
                    },
                    {
                        "employeeId": 2,
                        "employeeName": "Sam Ortiz",
                        "percentage": 55.0,
                        "grade": "B",
                        "tasks": []
                    }
                ]
            }));
        })
        .await
}

#[tokio::test]
async fn calculate_then_save_selected_rows() {
    let server = MockServer::start_async().await;
    let calculate = mock_calculation(&server).await;
    let bulk = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/performance-appraisals/bulk")
                .body_contains(r#""startDate":"2024-01-01""#)
                .body_contains(r#""employeeId":2"#);
            then.status(200).json_body(json!({"saved": 1, "message": "Saved"}));
        })
        .await;

    let service = service_for(&server);
    let request = first_quarter();
    let results = service.calculate(request.clone()).await.unwrap();
    calculate.assert_async().await;

    assert_eq!(results.len(), 2);
    let dana = &results[0];
    assert_eq!(dana.employee_self_rating, 9);
    assert_eq!(dana.supervisor_rating, 8);
    assert_eq!(dana.dividend, 10);
    assert_eq!(dana.percentage, 85);
    assert_eq!(dana.grade, AppraisalGrade::APlus);
    assert_eq!(dana.performance_label, "Excellent");

    let sam = &results[1];
    assert_eq!(sam.percentage, 55);
    assert_eq!(sam.grade, AppraisalGrade::B);
    assert_eq!(sam.performance_label, "Average");

    let mut selection = AppraisalSelection::new();
    selection.toggle(2);
    let summary = service
        .save_selected(&request, &results, &selection)
        .await
        .unwrap();

    bulk.assert_async().await;
    assert_eq!(summary.saved, 1);
    assert_eq!(summary.message.as_deref(), Some("Saved"));
}

#[tokio::test]
async fn empty_selection_never_reaches_the_server() {
    let server = MockServer::start_async().await;
    let bulk = server
        .mock_async(|when, then| {
            when.method(POST).path("/performance-appraisals/bulk");
            then.status(200);
        })
        .await;

    let service = service_for(&server);
    let err = service
        .save_selected(&first_quarter(), &[], &AppraisalSelection::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation { .. }));
    bulk.assert_hits_async(0).await;
}

#[tokio::test]
async fn reversed_dates_are_rejected_locally() {
    let server = MockServer::start_async().await;
    let calculate = mock_calculation(&server).await;

    let service = service_for(&server);
    let mut request = first_quarter();
    std::mem::swap(&mut request.start_date, &mut request.end_date);

    let err = service.calculate(request).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
    calculate.assert_hits_async(0).await;
}

#[tokio::test]
async fn single_save_uses_submitted_count_when_body_is_empty() {
    let server = MockServer::start_async().await;
    let calculate = mock_calculation(&server).await;
    let save = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/performance-appraisals")
                .body_contains(r#""employeeId":1"#);
            then.status(201);
        })
        .await;

    let service = service_for(&server);
    let request = first_quarter();
    let results = service.calculate(request.clone()).await.unwrap();
    calculate.assert_async().await;

    let summary = service
        .save_one(&request, results[0].clone())
        .await
        .unwrap();
    save.assert_async().await;
    assert_eq!(summary.saved, 1);
    assert!(summary.message.is_none());
}

#[tokio::test]
async fn saved_list_query_is_clamped() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/performance-appraisals")
                .query_param("page", "1")
                .query_param("per_page", "100");
            then.status(200).json_body(json!({"data": [], "meta": {"total": 0}}));
        })
        .await;

    let service = service_for(&server);
    let page = service
        .list_saved(PageQuery {
            page: 0,
            per_page: 5000,
            search: Some("   ".into()),
        })
        .await
        .unwrap();

    list.assert_async().await;
    assert!(page.items.is_empty());
    assert_eq!(page.last_page, 1);
}
