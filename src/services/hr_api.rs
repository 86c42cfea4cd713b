use std::sync::{Arc, RwLock};
use std::time::{Duration as StdDuration, Instant};

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ApiErrorCode, AppError, AppResult};
use crate::models::appraisal::{
    AppraisalCalculationRequest, AppraisalResultDto, AppraisalSaveRequest,
    AppraisalSaveSummary, SavedAppraisal,
};
use crate::models::common::{Page, PageQuery};
use crate::models::compensation::{
    AllowanceDeduction, CompensationInput, EmployeeCompensation, ImportSummary,
};
use crate::models::directory::{Company, Department, Employee, EmployeeFilter};
use crate::models::kpi::{
    CapacityCheckRequest, CapacityCheckResult, CreatorRole, CreatorRoleInput, KpiAssignment,
    KpiAssignmentInput, KpiTask, KpiTaskInput, WeightTemplate, WeightTemplateInput,
};
use crate::models::notification::Notification;
use crate::models::review::{PerformanceReview, ReviewUpdateInput};
use crate::utils::redact::redact_sensitive_data;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[async_trait]
pub trait KpiApi: Send + Sync {
    async fn list_kpi_tasks(&self) -> AppResult<Vec<KpiTask>>;
    async fn create_kpi_task(&self, input: &KpiTaskInput) -> AppResult<KpiTask>;
    async fn update_kpi_task(&self, id: i64, input: &KpiTaskInput) -> AppResult<KpiTask>;
    async fn delete_kpi_task(&self, id: i64) -> AppResult<()>;

    async fn list_creator_roles(&self) -> AppResult<Vec<CreatorRole>>;
    async fn create_creator_role(&self, input: &CreatorRoleInput) -> AppResult<CreatorRole>;
    async fn update_creator_role(&self, id: i64, input: &CreatorRoleInput) -> AppResult<CreatorRole>;
    async fn delete_creator_role(&self, id: i64) -> AppResult<()>;

    async fn list_weight_templates(&self) -> AppResult<Vec<WeightTemplate>>;
    async fn create_weight_template(&self, input: &WeightTemplateInput) -> AppResult<WeightTemplate>;
    async fn update_weight_template(
        &self,
        id: i64,
        input: &WeightTemplateInput,
    ) -> AppResult<WeightTemplate>;
    async fn delete_weight_template(&self, id: i64) -> AppResult<()>;

    async fn list_assignments(&self) -> AppResult<Vec<KpiAssignment>>;
    async fn create_assignment(&self, input: &KpiAssignmentInput) -> AppResult<KpiAssignment>;
    async fn update_assignment(
        &self,
        id: i64,
        input: &KpiAssignmentInput,
    ) -> AppResult<KpiAssignment>;
    async fn delete_assignment(&self, id: i64) -> AppResult<()>;
    async fn check_capacity(&self, request: &CapacityCheckRequest) -> AppResult<CapacityCheckResult>;
}

#[async_trait]
pub trait AppraisalApi: Send + Sync {
    async fn calculate_appraisals(
        &self,
        request: &AppraisalCalculationRequest,
    ) -> AppResult<Vec<AppraisalResultDto>>;
    async fn save_appraisal(&self, request: &AppraisalSaveRequest) -> AppResult<AppraisalSaveSummary>;
    async fn save_appraisals_bulk(
        &self,
        request: &AppraisalSaveRequest,
    ) -> AppResult<AppraisalSaveSummary>;
    async fn list_saved_appraisals(&self, query: &PageQuery) -> AppResult<Page<SavedAppraisal>>;
}

#[async_trait]
pub trait ReviewApi: Send + Sync {
    async fn list_reviews(&self) -> AppResult<Vec<PerformanceReview>>;
    async fn get_review(&self, id: i64) -> AppResult<PerformanceReview>;
    async fn update_review(&self, id: i64, input: &ReviewUpdateInput) -> AppResult<PerformanceReview>;
}

#[async_trait]
pub trait DirectoryApi: Send + Sync {
    async fn list_employees(&self, filter: &EmployeeFilter) -> AppResult<Vec<Employee>>;
    async fn list_companies(&self) -> AppResult<Vec<Company>>;
    async fn list_departments(&self, company_id: i64) -> AppResult<Vec<Department>>;
}

#[async_trait]
pub trait CompensationApi: Send + Sync {
    async fn list_compensations(&self) -> AppResult<Vec<EmployeeCompensation>>;
    async fn create_compensation(&self, input: &CompensationInput) -> AppResult<EmployeeCompensation>;
    async fn update_compensation(
        &self,
        id: i64,
        input: &CompensationInput,
    ) -> AppResult<EmployeeCompensation>;
    async fn delete_compensation(&self, id: i64) -> AppResult<()>;
    async fn list_allowance_deductions(&self) -> AppResult<Vec<AllowanceDeduction>>;
    async fn import_allowance_deductions(&self, csv: String) -> AppResult<ImportSummary>;
}

#[async_trait]
pub trait NotificationApi: Send + Sync {
    async fn list_notifications(&self) -> AppResult<Vec<Notification>>;
    async fn mark_notification_read(&self, id: i64) -> AppResult<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub http_timeout: StdDuration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            http_timeout: StdDuration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl BackendConfig {
    /// Environment overrides applied on top of stored settings.
    pub fn apply_env(mut self) -> Self {
        if let Ok(value) = std::env::var("PERFDESK_API_BASE_URL") {
            if !value.trim().is_empty() {
                self.base_url = value.trim().to_string();
            }
        }
        if let Ok(value) = std::env::var("PERFDESK_API_TOKEN") {
            if !value.trim().is_empty() {
                self.api_token = Some(value.trim().to_string());
            }
        }
        if let Some(secs) = std::env::var("PERFDESK_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
        {
            self.http_timeout = StdDuration::from_secs(secs);
        }
        self
    }
}

struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpClient {
    fn try_new(config: &BackendConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Some(StdDuration::from_secs(90)))
            .build()
            .map_err(|err| AppError::other(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Responses come either bare or wrapped in a `data` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(value) => value,
        }
    }
}

#[derive(Deserialize)]
struct PaginatedBody<T> {
    data: Vec<T>,
    #[serde(default)]
    meta: Option<PaginationMeta>,
}

#[derive(Deserialize)]
struct PaginationMeta {
    #[serde(default)]
    current_page: Option<usize>,
    #[serde(default)]
    per_page: Option<usize>,
    #[serde(default)]
    total: Option<usize>,
    #[serde(default)]
    last_page: Option<usize>,
}

/// REST client for the HR backend. The underlying `reqwest` client is rebuilt
/// whenever the configuration changes.
#[derive(Clone)]
pub struct HttpBackend {
    inner: Arc<RwLock<Arc<HttpClient>>>,
    config: Arc<RwLock<BackendConfig>>,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> AppResult<Self> {
        let client = HttpClient::try_new(&config)?;
        Ok(Self {
            inner: Arc::new(RwLock::new(Arc::new(client))),
            config: Arc::new(RwLock::new(config)),
        })
    }

    pub fn config(&self) -> AppResult<BackendConfig> {
        self.config
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| AppError::other("backend config lock poisoned"))
    }

    pub fn reconfigure(&self, config: BackendConfig) -> AppResult<bool> {
        if self.config()? == config {
            return Ok(false);
        }

        let client = HttpClient::try_new(&config)?;
        {
            let mut guard = self
                .inner
                .write()
                .map_err(|_| AppError::other("backend client lock poisoned"))?;
            *guard = Arc::new(client);
        }
        {
            let mut guard = self
                .config
                .write()
                .map_err(|_| AppError::other("backend config lock poisoned"))?;
            *guard = config;
        }
        debug!(target: "app::api", "backend client reconfigured");
        Ok(true)
    }

    fn client(&self) -> AppResult<Arc<HttpClient>> {
        self.inner
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|_| AppError::other("backend client lock poisoned"))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, String)]>,
        body: Option<JsonValue>,
    ) -> AppResult<JsonValue> {
        let client = self.client()?;
        let url = client.url(path);
        let request_id = Uuid::new_v4().to_string();

        if let Some(payload) = body.as_ref() {
            let sanitized = redact_sensitive_data(payload)
                .unwrap_or_else(|_| JsonValue::String("<redacted>".to_string()));
            debug!(
                target: "app::api",
                request_id = %request_id,
                method = %method,
                path,
                payload = %sanitized,
                "sending request"
            );
        } else {
            debug!(target: "app::api", request_id = %request_id, method = %method, path, "sending request");
        }

        let mut request = client.client.request(method.clone(), &url);
        if let Some(token) = client.api_token.as_deref() {
            request = request.bearer_auth(token);
        }
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(payload) = body {
            request = request.json(&payload);
        }

        let start = Instant::now();
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| error_from_reqwest(err, &request_id))?;

        read_response(response, &request_id, start).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let body = self.send(Method::GET, path, None, None).await?;
        decode(body)
    }

    async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let body = self.send(Method::GET, path, Some(query), None).await?;
        decode(body)
    }

    async fn write<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        payload: &B,
    ) -> AppResult<T> {
        let payload = serde_json::to_value(payload)?;
        let body = self.send(method, path, None, Some(payload)).await?;
        decode(body)
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.send(Method::DELETE, path, None, None).await?;
        Ok(())
    }
}

async fn read_response(
    response: reqwest::Response,
    request_id: &str,
    start: Instant,
) -> AppResult<JsonValue> {
    let status = response.status();
    let latency_ms = start.elapsed().as_millis();
    let text = response
        .text()
        .await
        .map_err(|err| error_from_reqwest(err, request_id))?;

    let body = if text.trim().is_empty() {
        JsonValue::Null
    } else {
        match serde_json::from_str::<JsonValue>(&text) {
            Ok(value) => value,
            Err(_) if !status.is_success() => JsonValue::Null,
            Err(err) => {
                return Err(AppError::api_with_details(
                    ApiErrorCode::InvalidResponse,
                    Some(status.as_u16()),
                    "The server returned an unreadable response",
                    Some(json!({ "reason": err.to_string(), "requestId": request_id })),
                ));
            }
        }
    };

    if status.is_success() {
        debug!(
            target: "app::api",
            request_id = %request_id,
            status = status.as_u16(),
            latency_ms,
            "request completed"
        );
        return Ok(body);
    }

    warn!(
        target: "app::api",
        request_id = %request_id,
        status = status.as_u16(),
        latency_ms,
        "backend returned non-success status"
    );
    Err(map_http_error(status, &body))
}

fn decode<T: DeserializeOwned>(body: JsonValue) -> AppResult<T> {
    serde_json::from_value::<Envelope<T>>(body)
        .map(Envelope::into_inner)
        .map_err(|err| {
            AppError::api_with_details(
                ApiErrorCode::InvalidResponse,
                None,
                format!("Unexpected response shape: {err}"),
                None,
            )
        })
}

fn decode_page<T: DeserializeOwned>(body: JsonValue, query: &PageQuery) -> AppResult<Page<T>> {
    if body.is_array() {
        let items: Vec<T> = decode(body)?;
        let total = items.len();
        return Ok(Page::new(items, total, query.page, query.per_page));
    }

    let parsed: PaginatedBody<T> = serde_json::from_value(body).map_err(|err| {
        AppError::api_with_details(
            ApiErrorCode::InvalidResponse,
            None,
            format!("Unexpected paginated response shape: {err}"),
            None,
        )
    })?;

    let meta = parsed.meta;
    let total = meta
        .as_ref()
        .and_then(|meta| meta.total)
        .unwrap_or(parsed.data.len());
    let page = meta
        .as_ref()
        .and_then(|meta| meta.current_page)
        .unwrap_or(query.page);
    let page_size = meta
        .as_ref()
        .and_then(|meta| meta.per_page)
        .unwrap_or(query.per_page);
    let mut result = Page::new(parsed.data, total, page, page_size);
    if let Some(last_page) = meta.and_then(|meta| meta.last_page) {
        result.last_page = last_page.max(1);
    }
    Ok(result)
}

/// Server-supplied `message`, when the body carries a usable one.
fn server_message(body: &JsonValue) -> Option<String> {
    body.get("message")
        .or_else(|| body.get("error"))
        .and_then(|value| value.as_str())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Field-level messages from a 422 body (`errors: { field: [messages] }`).
fn field_errors(body: &JsonValue) -> Option<JsonValue> {
    let errors = body.get("errors")?.as_object()?;
    let mut fields = serde_json::Map::new();
    for (field, messages) in errors {
        let list = match messages {
            JsonValue::Array(values) => values
                .iter()
                .filter_map(|value| value.as_str().map(str::to_string))
                .collect::<Vec<_>>(),
            JsonValue::String(value) => vec![value.clone()],
            _ => Vec::new(),
        };
        if !list.is_empty() {
            fields.insert(field.clone(), json!(list));
        }
    }
    if fields.is_empty() {
        None
    } else {
        Some(json!({ "fields": fields }))
    }
}

pub fn map_http_error(status: StatusCode, body: &JsonValue) -> AppError {
    let message = server_message(body);
    match status {
        StatusCode::UNAUTHORIZED => AppError::unauthorized(
            message.unwrap_or_else(|| "Your session has expired, please sign in again".to_string()),
        ),
        StatusCode::FORBIDDEN => AppError::api_with_details(
            ApiErrorCode::Forbidden,
            Some(status.as_u16()),
            message.unwrap_or_else(|| "You do not have permission to perform this action".to_string()),
            None,
        ),
        StatusCode::NOT_FOUND => AppError::not_found(),
        StatusCode::CONFLICT => AppError::conflict(
            message.unwrap_or_else(|| "A record with the same details already exists".to_string()),
        ),
        StatusCode::UNPROCESSABLE_ENTITY => {
            let details = field_errors(body);
            let message = message.unwrap_or_else(|| "The submitted data is invalid".to_string());
            match details {
                Some(details) => AppError::validation_with_details(message, details),
                None => AppError::validation(message),
            }
        }
        StatusCode::BAD_REQUEST => AppError::api_with_details(
            ApiErrorCode::InvalidRequest,
            Some(status.as_u16()),
            message.unwrap_or_else(|| "The request was rejected by the server".to_string()),
            None,
        ),
        status if status.is_server_error() => AppError::api_with_details(
            ApiErrorCode::ServerError,
            Some(status.as_u16()),
            message.unwrap_or_else(|| "Something went wrong, please try again".to_string()),
            None,
        ),
        status => AppError::api_with_details(
            ApiErrorCode::Unknown,
            Some(status.as_u16()),
            message.unwrap_or_else(|| format!("Request failed with status {}", status.as_u16())),
            None,
        ),
    }
}

fn error_from_reqwest(err: reqwest::Error, request_id: &str) -> AppError {
    let details = Some(json!({ "requestId": request_id }));
    if err.is_timeout() {
        AppError::api_with_details(
            ApiErrorCode::HttpTimeout,
            None,
            "The server took too long to respond",
            details,
        )
    } else if err.is_connect() {
        AppError::api_with_details(
            ApiErrorCode::BackendUnavailable,
            None,
            "Unable to reach the server",
            details,
        )
    } else if let Some(status) = err.status() {
        map_http_error(status, &JsonValue::Null)
    } else {
        AppError::api_with_details(
            ApiErrorCode::Unknown,
            None,
            format!("Request failed: {err}"),
            details,
        )
    }
}

#[async_trait]
impl KpiApi for HttpBackend {
    async fn list_kpi_tasks(&self) -> AppResult<Vec<KpiTask>> {
        self.get("kpi-tasks").await
    }

    async fn create_kpi_task(&self, input: &KpiTaskInput) -> AppResult<KpiTask> {
        self.write(Method::POST, "kpi-tasks", input).await
    }

    async fn update_kpi_task(&self, id: i64, input: &KpiTaskInput) -> AppResult<KpiTask> {
        self.write(Method::PUT, &format!("kpi-tasks/{id}"), input).await
    }

    async fn delete_kpi_task(&self, id: i64) -> AppResult<()> {
        self.delete(&format!("kpi-tasks/{id}")).await
    }

    async fn list_creator_roles(&self) -> AppResult<Vec<CreatorRole>> {
        self.get("creator-roles").await
    }

    async fn create_creator_role(&self, input: &CreatorRoleInput) -> AppResult<CreatorRole> {
        self.write(Method::POST, "creator-roles", input).await
    }

    async fn update_creator_role(&self, id: i64, input: &CreatorRoleInput) -> AppResult<CreatorRole> {
        self.write(Method::PUT, &format!("creator-roles/{id}"), input)
            .await
    }

    async fn delete_creator_role(&self, id: i64) -> AppResult<()> {
        self.delete(&format!("creator-roles/{id}")).await
    }

    async fn list_weight_templates(&self) -> AppResult<Vec<WeightTemplate>> {
        self.get("weight-templates").await
    }

    async fn create_weight_template(&self, input: &WeightTemplateInput) -> AppResult<WeightTemplate> {
        self.write(Method::POST, "weight-templates", input).await
    }

    async fn update_weight_template(
        &self,
        id: i64,
        input: &WeightTemplateInput,
    ) -> AppResult<WeightTemplate> {
        self.write(Method::PUT, &format!("weight-templates/{id}"), input)
            .await
    }

    async fn delete_weight_template(&self, id: i64) -> AppResult<()> {
        self.delete(&format!("weight-templates/{id}")).await
    }

    async fn list_assignments(&self) -> AppResult<Vec<KpiAssignment>> {
        self.get("kpi-assignments").await
    }

    async fn create_assignment(&self, input: &KpiAssignmentInput) -> AppResult<KpiAssignment> {
        self.write(Method::POST, "kpi-assignments", input).await
    }

    async fn update_assignment(
        &self,
        id: i64,
        input: &KpiAssignmentInput,
    ) -> AppResult<KpiAssignment> {
        self.write(Method::PUT, &format!("kpi-assignments/{id}"), input)
            .await
    }

    async fn delete_assignment(&self, id: i64) -> AppResult<()> {
        self.delete(&format!("kpi-assignments/{id}")).await
    }

    async fn check_capacity(&self, request: &CapacityCheckRequest) -> AppResult<CapacityCheckResult> {
        self.write(Method::POST, "kpi-assignments/capacity-check", request)
            .await
    }
}

#[async_trait]
impl AppraisalApi for HttpBackend {
    async fn calculate_appraisals(
        &self,
        request: &AppraisalCalculationRequest,
    ) -> AppResult<Vec<AppraisalResultDto>> {
        self.write(Method::POST, "performance-appraisals/calculate", request)
            .await
    }

    async fn save_appraisal(&self, request: &AppraisalSaveRequest) -> AppResult<AppraisalSaveSummary> {
        let body = self
            .send(
                Method::POST,
                "performance-appraisals",
                None,
                Some(serde_json::to_value(request)?),
            )
            .await?;
        Ok(save_summary(body, request.results.len()))
    }

    async fn save_appraisals_bulk(
        &self,
        request: &AppraisalSaveRequest,
    ) -> AppResult<AppraisalSaveSummary> {
        let body = self
            .send(
                Method::POST,
                "performance-appraisals/bulk",
                None,
                Some(serde_json::to_value(request)?),
            )
            .await?;
        Ok(save_summary(body, request.results.len()))
    }

    async fn list_saved_appraisals(&self, query: &PageQuery) -> AppResult<Page<SavedAppraisal>> {
        let mut params = vec![
            ("page", query.page.to_string()),
            ("per_page", query.per_page.to_string()),
        ];
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        let body = self
            .send(Method::GET, "performance-appraisals", Some(&params), None)
            .await?;
        decode_page(body, query)
    }
}

/// Save endpoints answer with anything from an empty body to a full summary.
fn save_summary(body: JsonValue, submitted: usize) -> AppraisalSaveSummary {
    let message = server_message(&body);
    let saved = body
        .get("saved")
        .or_else(|| body.pointer("/data/saved"))
        .and_then(|value| value.as_u64())
        .map(|value| value as usize)
        .unwrap_or(submitted);
    AppraisalSaveSummary { saved, message }
}

#[async_trait]
impl ReviewApi for HttpBackend {
    async fn list_reviews(&self) -> AppResult<Vec<PerformanceReview>> {
        self.get("performance-reviews").await
    }

    async fn get_review(&self, id: i64) -> AppResult<PerformanceReview> {
        self.get(&format!("performance-reviews/{id}")).await
    }

    async fn update_review(&self, id: i64, input: &ReviewUpdateInput) -> AppResult<PerformanceReview> {
        self.write(Method::PUT, &format!("performance-reviews/{id}"), input)
            .await
    }
}

#[async_trait]
impl DirectoryApi for HttpBackend {
    async fn list_employees(&self, filter: &EmployeeFilter) -> AppResult<Vec<Employee>> {
        let mut params = Vec::new();
        if let Some(company_id) = filter.company_id {
            params.push(("company_id", company_id.to_string()));
        }
        if let Some(department_id) = filter.department_id {
            params.push(("department_id", department_id.to_string()));
        }
        self.get_with_query("employees", &params).await
    }

    async fn list_companies(&self) -> AppResult<Vec<Company>> {
        self.get("companies").await
    }

    async fn list_departments(&self, company_id: i64) -> AppResult<Vec<Department>> {
        self.get(&format!("companies/{company_id}/departments")).await
    }
}

#[async_trait]
impl CompensationApi for HttpBackend {
    async fn list_compensations(&self) -> AppResult<Vec<EmployeeCompensation>> {
        self.get("compensations").await
    }

    async fn create_compensation(&self, input: &CompensationInput) -> AppResult<EmployeeCompensation> {
        self.write(Method::POST, "compensations", input).await
    }

    async fn update_compensation(
        &self,
        id: i64,
        input: &CompensationInput,
    ) -> AppResult<EmployeeCompensation> {
        self.write(Method::PUT, &format!("compensations/{id}"), input)
            .await
    }

    async fn delete_compensation(&self, id: i64) -> AppResult<()> {
        self.delete(&format!("compensations/{id}")).await
    }

    async fn list_allowance_deductions(&self) -> AppResult<Vec<AllowanceDeduction>> {
        self.get("allowance-deductions").await
    }

    async fn import_allowance_deductions(&self, csv: String) -> AppResult<ImportSummary> {
        let client = self.client()?;
        let request_id = Uuid::new_v4().to_string();
        debug!(
            target: "app::api",
            request_id = %request_id,
            bytes = csv.len(),
            "uploading allowance/deduction import"
        );

        let mut request = client
            .client
            .post(client.url("allowance-deductions/import"))
            .header(reqwest::header::CONTENT_TYPE, "text/csv")
            .header(reqwest::header::ACCEPT, "application/json")
            .body(csv);
        if let Some(token) = client.api_token.as_deref() {
            request = request.bearer_auth(token);
        }

        let start = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|err| error_from_reqwest(err, &request_id))?;
        let body = read_response(response, &request_id, start).await?;
        if body.is_null() {
            return Ok(ImportSummary::default());
        }
        decode(body)
    }
}

#[async_trait]
impl NotificationApi for HttpBackend {
    async fn list_notifications(&self) -> AppResult<Vec<Notification>> {
        self.get("notifications").await
    }

    async fn mark_notification_read(&self, id: i64) -> AppResult<()> {
        self.send(Method::POST, &format!("notifications/{id}/read"), None, None)
            .await?;
        Ok(())
    }
}
