use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use perfdesk_app_lib::commands::CommandError;
use perfdesk_app_lib::error::{AppError, AppResult};
use perfdesk_app_lib::models::kpi::{
    CapacityCheckRequest, CapacityCheckResult, CreatorRole, CreatorRoleInput, CriterionId,
    KpiAssignment, KpiAssignmentInput, KpiTask, KpiTaskInput, OverCapacityAssignee,
    WeightCriterion, WeightTemplate, WeightTemplateInput,
};
use perfdesk_app_lib::services::hr_api::KpiApi;
use perfdesk_app_lib::services::kpi_service::{AssignmentDraft, KpiService};
use perfdesk_app_lib::services::submission_guard::SubmissionGuard;
use perfdesk_app_lib::services::weight_validator::WeightSheet;

#[derive(Default)]
struct FakeKpiBackend {
    calls: Mutex<Vec<String>>,
    assignments: Mutex<Vec<KpiAssignment>>,
    capacity_requests: Mutex<Vec<CapacityCheckRequest>>,
    over_capacity: Mutex<Vec<OverCapacityAssignee>>,
    capacity_delay: Option<Duration>,
}

impl FakeKpiBackend {
    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl KpiApi for FakeKpiBackend {
    async fn list_kpi_tasks(&self) -> AppResult<Vec<KpiTask>> {
        Ok(Vec::new())
    }

    async fn create_kpi_task(&self, _input: &KpiTaskInput) -> AppResult<KpiTask> {
        Err(AppError::other("not used"))
    }

    async fn update_kpi_task(&self, _id: i64, _input: &KpiTaskInput) -> AppResult<KpiTask> {
        Err(AppError::other("not used"))
    }

    async fn delete_kpi_task(&self, _id: i64) -> AppResult<()> {
        Ok(())
    }

    async fn list_creator_roles(&self) -> AppResult<Vec<CreatorRole>> {
        Ok(Vec::new())
    }

    async fn create_creator_role(&self, _input: &CreatorRoleInput) -> AppResult<CreatorRole> {
        Err(AppError::other("not used"))
    }

    async fn update_creator_role(
        &self,
        _id: i64,
        _input: &CreatorRoleInput,
    ) -> AppResult<CreatorRole> {
        Err(AppError::other("not used"))
    }

    async fn delete_creator_role(&self, _id: i64) -> AppResult<()> {
        Ok(())
    }

    async fn list_weight_templates(&self) -> AppResult<Vec<WeightTemplate>> {
        Ok(Vec::new())
    }

    async fn create_weight_template(
        &self,
        _input: &WeightTemplateInput,
    ) -> AppResult<WeightTemplate> {
        Err(AppError::other("not used"))
    }

    async fn update_weight_template(
        &self,
        _id: i64,
        _input: &WeightTemplateInput,
    ) -> AppResult<WeightTemplate> {
        Err(AppError::other("not used"))
    }

    async fn delete_weight_template(&self, _id: i64) -> AppResult<()> {
        Ok(())
    }

    async fn list_assignments(&self) -> AppResult<Vec<KpiAssignment>> {
        self.record("list_assignments");
        Ok(self.assignments.lock().unwrap().clone())
    }

    async fn create_assignment(&self, input: &KpiAssignmentInput) -> AppResult<KpiAssignment> {
        self.record("create_assignment");
        let mut assignments = self.assignments.lock().unwrap();
        let created = KpiAssignment {
            id: assignments.len() as i64 + 1,
            kpi_task_id: input.kpi_task_id,
            kpi_task_title: None,
            assignee_ids: input.assignee_ids.clone(),
            month: input.month.clone(),
            criteria: Vec::new(),
            status: Some("assigned".into()),
        };
        assignments.push(created.clone());
        Ok(created)
    }

    async fn update_assignment(
        &self,
        id: i64,
        input: &KpiAssignmentInput,
    ) -> AppResult<KpiAssignment> {
        self.record("update_assignment");
        let mut assignments = self.assignments.lock().unwrap();
        let existing = assignments
            .iter_mut()
            .find(|assignment| assignment.id == id)
            .ok_or(AppError::NotFound)?;
        existing.month = input.month.clone();
        existing.assignee_ids = input.assignee_ids.clone();
        Ok(existing.clone())
    }

    async fn delete_assignment(&self, _id: i64) -> AppResult<()> {
        self.record("delete_assignment");
        Ok(())
    }

    async fn check_capacity(
        &self,
        request: &CapacityCheckRequest,
    ) -> AppResult<CapacityCheckResult> {
        self.record("check_capacity");
        self.capacity_requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.capacity_delay {
            tokio::time::sleep(delay).await;
        }
        let over_capacity = self.over_capacity.lock().unwrap().clone();
        Ok(CapacityCheckResult {
            ok: over_capacity.is_empty(),
            over_capacity,
        })
    }
}

fn criterion(title: &str, percentage: f64) -> WeightCriterion {
    WeightCriterion {
        id: CriterionId::temporary(),
        title: title.to_string(),
        description: None,
        percentage: Some(percentage),
    }
}

fn draft(assignees: Vec<i64>) -> AssignmentDraft {
    AssignmentDraft {
        kpi_task_id: 42,
        assignee_ids: assignees,
        month: "2024-05".into(),
    }
}

fn service_with(backend: Arc<FakeKpiBackend>) -> KpiService {
    KpiService::new(backend, SubmissionGuard::new())
}

#[tokio::test]
async fn submit_checks_capacity_then_creates_and_refetches() {
    let backend = Arc::new(FakeKpiBackend::default());
    let service = service_with(Arc::clone(&backend));
    let sheet = WeightSheet::new(vec![criterion("Quality", 60.0), criterion("Speed", 40.0)]);

    let assignments = service
        .submit_assignment(draft(vec![3, 5, 3]), &sheet)
        .await
        .expect("assignment should be created");

    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].assignee_ids, vec![3, 5]);
    assert_eq!(
        backend.calls(),
        vec!["check_capacity", "create_assignment", "list_assignments"]
    );

    let requests = backend.capacity_requests.lock().unwrap().clone();
    assert_eq!(requests[0].total_percentage, 100.0);
    assert_eq!(requests[0].month, "2024-05");
    assert_eq!(requests[0].exclude_assignment_id, None);
}

#[tokio::test]
async fn weights_over_limit_stop_before_any_request() {
    let backend = Arc::new(FakeKpiBackend::default());
    let service = service_with(Arc::clone(&backend));
    let sheet = WeightSheet::new(vec![criterion("Quality", 70.0), criterion("Speed", 40.0)]);

    let err = service
        .submit_assignment(draft(vec![1]), &sheet)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation { .. }));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn capacity_failure_blocks_creation() {
    let backend = Arc::new(FakeKpiBackend::default());
    backend
        .over_capacity
        .lock()
        .unwrap()
        .push(OverCapacityAssignee {
            employee_id: 5,
            employee_name: Some("Mina Park".into()),
            current_total: 80.0,
            new_total: 130.0,
        });
    let service = service_with(Arc::clone(&backend));
    let sheet = WeightSheet::new(vec![criterion("Quality", 50.0)]);

    let err = service
        .submit_assignment(draft(vec![5]), &sheet)
        .await
        .unwrap_err();

    match &err {
        AppError::CapacityExceeded { message, assignees } => {
            assert!(message.contains("Mina Park"));
            assert_eq!(assignees.len(), 1);
        }
        other => panic!("expected capacity error, got {other:?}"),
    }
    assert_eq!(backend.calls(), vec!["check_capacity"]);

    let command_error = CommandError::from(err);
    assert_eq!(command_error.code, "CAPACITY_EXCEEDED");
    assert_eq!(
        command_error.details.unwrap()["assignees"][0]["employeeId"],
        serde_json::json!(5)
    );
}

#[tokio::test]
async fn invalid_month_and_empty_assignees_are_rejected() {
    let backend = Arc::new(FakeKpiBackend::default());
    let service = service_with(Arc::clone(&backend));
    let sheet = WeightSheet::new(vec![criterion("Quality", 50.0)]);

    let bad_month = AssignmentDraft {
        month: "2024-13".into(),
        ..draft(vec![1])
    };
    assert!(service.submit_assignment(bad_month, &sheet).await.is_err());
    assert!(service.submit_assignment(draft(Vec::new()), &sheet).await.is_err());
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn update_excludes_the_assignment_being_edited() {
    let backend = Arc::new(FakeKpiBackend::default());
    let service = service_with(Arc::clone(&backend));
    let sheet = WeightSheet::new(vec![criterion("Quality", 100.0)]);
    service
        .submit_assignment(draft(vec![1]), &sheet)
        .await
        .unwrap();

    let updated = service
        .update_assignment(
            1,
            AssignmentDraft {
                month: "2024-06".into(),
                ..draft(vec![1, 2])
            },
            &sheet,
        )
        .await
        .unwrap();

    assert_eq!(updated[0].month, "2024-06");
    let requests = backend.capacity_requests.lock().unwrap().clone();
    assert_eq!(requests.last().unwrap().exclude_assignment_id, Some(1));
}

#[tokio::test]
async fn duplicate_submission_while_in_flight_is_busy() {
    let backend = Arc::new(FakeKpiBackend {
        capacity_delay: Some(Duration::from_millis(100)),
        ..FakeKpiBackend::default()
    });
    let service = service_with(Arc::clone(&backend));
    let sheet = WeightSheet::new(vec![criterion("Quality", 30.0)]);

    let (first, second) = futures::join!(
        service.submit_assignment(draft(vec![1]), &sheet),
        service.submit_assignment(draft(vec![1]), &sheet),
    );

    assert!(first.is_ok());
    match second {
        Err(AppError::Busy { operation }) => assert_eq!(operation, "kpi.assignment.create"),
        other => panic!("expected busy error, got {other:?}"),
    }
    assert_eq!(
        backend
            .calls()
            .iter()
            .filter(|call| call.as_str() == "create_assignment")
            .count(),
        1
    );

    // the slot is released once the first submission finishes
    assert!(service
        .submit_assignment(draft(vec![2]), &sheet)
        .await
        .is_ok());
}
