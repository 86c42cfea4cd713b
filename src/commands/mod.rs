#[cfg(feature = "desktop")]
pub mod appraisal;
#[cfg(feature = "desktop")]
pub mod compensation;
#[cfg(feature = "desktop")]
pub mod directory;
#[cfg(feature = "desktop")]
pub mod kpi;
#[cfg(feature = "desktop")]
pub mod notifications;
#[cfg(feature = "desktop")]
pub mod review;
#[cfg(feature = "desktop")]
pub mod settings;

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use tracing::{error, info, warn};

use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::settings::AppSettings;
use crate::services::appraisal_service::AppraisalService;
use crate::services::compensation_service::CompensationService;
use crate::services::directory_service::DirectoryService;
use crate::services::hr_api::HttpBackend;
use crate::services::kpi_service::KpiService;
use crate::services::notification_poller::{clamp_poll_interval, NotificationPoller};
use crate::services::review_service::ReviewService;
use crate::services::settings_service::{SettingsService, SettingsUpdateInput};
use crate::services::submission_guard::SubmissionGuard;

#[derive(Clone)]
pub struct AppState {
    db_pool: DbPool,
    backend: HttpBackend,
    settings_service: Arc<SettingsService>,
    kpi_service: Arc<KpiService>,
    appraisal_service: Arc<AppraisalService>,
    review_service: Arc<ReviewService>,
    compensation_service: Arc<CompensationService>,
    directory_service: Arc<DirectoryService>,
    notification_poller: Arc<NotificationPoller>,
}

impl AppState {
    pub fn new(db_pool: DbPool) -> AppResult<Self> {
        let settings_service = SettingsService::new(db_pool.clone())?;
        Self::with_settings(db_pool, settings_service)
    }

    pub fn with_settings(db_pool: DbPool, settings_service: SettingsService) -> AppResult<Self> {
        let backend = HttpBackend::new(settings_service.backend_config()?)?;
        let poll_interval = settings_service.poll_interval()?;
        let guard = SubmissionGuard::new();
        let api = Arc::new(backend.clone());

        let state = Self {
            db_pool,
            kpi_service: Arc::new(KpiService::new(api.clone(), guard.clone())),
            appraisal_service: Arc::new(AppraisalService::new(api.clone(), guard.clone())),
            review_service: Arc::new(ReviewService::new(api.clone(), guard.clone())),
            compensation_service: Arc::new(CompensationService::new(api.clone(), guard)),
            directory_service: Arc::new(DirectoryService::new(api.clone())),
            notification_poller: Arc::new(NotificationPoller::new(api, poll_interval)),
            settings_service: Arc::new(settings_service),
            backend,
        };
        info!(target: "app::state", "application state ready");
        Ok(state)
    }

    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings_service)
    }

    pub fn kpi(&self) -> Arc<KpiService> {
        Arc::clone(&self.kpi_service)
    }

    pub fn appraisals(&self) -> Arc<AppraisalService> {
        Arc::clone(&self.appraisal_service)
    }

    pub fn reviews(&self) -> Arc<ReviewService> {
        Arc::clone(&self.review_service)
    }

    pub fn compensation(&self) -> Arc<CompensationService> {
        Arc::clone(&self.compensation_service)
    }

    pub fn directory(&self) -> Arc<DirectoryService> {
        Arc::clone(&self.directory_service)
    }

    pub fn notifications(&self) -> Arc<NotificationPoller> {
        Arc::clone(&self.notification_poller)
    }

    pub fn backend(&self) -> &HttpBackend {
        &self.backend
    }

    pub fn db(&self) -> DbPool {
        self.db_pool.clone()
    }

    /// Page size for in-memory lists, read on the blocking pool.
    pub async fn default_page_size(&self) -> AppResult<usize> {
        let settings = self.settings();
        tokio::task::spawn_blocking(move || settings.get())
            .await
            .map_err(|err| AppError::other(format!("settings read failed: {err}")))?
            .map(|settings| settings.default_page_size)
    }

    /// Persist settings and push the new values into the live client and poller.
    pub fn update_settings(&self, input: SettingsUpdateInput) -> AppResult<AppSettings> {
        let settings = self.settings_service.update(input)?;
        self.apply_settings(&settings)?;
        Ok(settings)
    }

    pub fn clear_api_token(&self) -> AppResult<AppSettings> {
        self.settings_service.clear_token()?;
        let settings = self.settings_service.get()?;
        self.apply_settings(&settings)?;
        Ok(settings)
    }

    fn apply_settings(&self, settings: &AppSettings) -> AppResult<()> {
        if self
            .backend
            .reconfigure(self.settings_service.backend_config()?)?
        {
            info!(target: "app::state", "backend client rebuilt from settings");
        }
        self.notification_poller
            .set_interval(clamp_poll_interval(settings.notification_poll_secs))
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl CommandError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<JsonValue>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details,
        }
    }
}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Validation {
                message, details, ..
            } => CommandError::new("VALIDATION_ERROR", message, details),
            AppError::NotFound => {
                CommandError::new("NOT_FOUND", "The requested record does not exist", None)
            }
            AppError::Conflict { message } => CommandError::new("CONFLICT", message, None),
            AppError::Unauthorized { message } => CommandError::new("UNAUTHORIZED", message, None),
            AppError::Api {
                code,
                status,
                message,
                details,
            } => {
                let mut merged = JsonMap::new();
                if let Some(existing) = details {
                    match existing {
                        JsonValue::Object(map) => merged.extend(map),
                        value => {
                            merged.insert("info".to_string(), value);
                        }
                    }
                }
                if let Some(status) = status {
                    merged.insert("status".to_string(), json!(status));
                }
                let detail_value = if merged.is_empty() {
                    None
                } else {
                    Some(JsonValue::Object(merged))
                };
                CommandError::new(code.as_str(), message, detail_value)
            }
            AppError::CapacityExceeded { message, assignees } => CommandError::new(
                "CAPACITY_EXCEEDED",
                message,
                Some(json!({ "assignees": assignees })),
            ),
            AppError::Busy { operation } => {
                warn!(target: "app::command", %operation, "busy operation in command");
                CommandError::new(
                    "BUSY",
                    "A previous request is still being processed",
                    Some(json!({ "operation": operation })),
                )
            }
            AppError::Database { message } => {
                error!(target: "app::command", %message, "database error in command");
                CommandError::new("UNKNOWN", message, None)
            }
            AppError::Serialization(error) => {
                error!(target: "app::command", error = %error, "serialization error in command");
                CommandError::new("UNKNOWN", "Failed to process data", None)
            }
            AppError::Io(error) => {
                error!(target: "app::command", error = %error, "io error in command");
                CommandError::new("UNKNOWN", "File system access failed", None)
            }
            AppError::Other(message) => {
                error!(target: "app::command", %message, "unexpected error in command");
                CommandError::new("UNKNOWN", message, None)
            }
        }
    }
}

#[cfg(feature = "desktop")]
pub(crate) async fn run_blocking<T: Send + 'static>(
    task: impl FnOnce() -> AppResult<T> + Send + 'static,
) -> CommandResult<T> {
    tauri::async_runtime::spawn_blocking(task)
        .await
        .map_err(|err| CommandError::new("UNKNOWN", format!("background task failed: {err}"), None))?
        .map_err(CommandError::from)
}
