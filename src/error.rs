use std::fmt;

use rusqlite;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{error, warn};

use crate::models::kpi::OverCapacityAssignee;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    Forbidden,
    HttpTimeout,
    InvalidResponse,
    InvalidRequest,
    BackendUnavailable,
    ServerError,
    Unknown,
}

impl ApiErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiErrorCode::Forbidden => "FORBIDDEN",
            ApiErrorCode::HttpTimeout => "HTTP_TIMEOUT",
            ApiErrorCode::InvalidResponse => "INVALID_RESPONSE",
            ApiErrorCode::InvalidRequest => "INVALID_REQUEST",
            ApiErrorCode::BackendUnavailable => "BACKEND_UNAVAILABLE",
            ApiErrorCode::ServerError => "SERVER_ERROR",
            ApiErrorCode::Unknown => "UNKNOWN_API_ERROR",
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {message}")]
    Database { message: String },

    #[error("record not found")]
    NotFound,

    #[error("{message}")]
    Conflict { message: String },

    #[error("{message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        details: Option<JsonValue>,
    },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    Api {
        code: ApiErrorCode,
        status: Option<u16>,
        message: String,
        details: Option<JsonValue>,
    },

    #[error("{message}")]
    CapacityExceeded {
        message: String,
        assignees: Vec<OverCapacityAssignee>,
    },

    #[error("{operation} is already in progress")]
    Busy { operation: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, "validation error");
        AppError::Validation {
            message,
            source: None,
            details: None,
        }
    }

    pub fn validation_with_details(message: impl Into<String>, details: JsonValue) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, details = %details, "validation error with details");
        AppError::Validation {
            message,
            source: None,
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::api::error", %message, "request unauthorized");
        AppError::Unauthorized { message }
    }

    pub fn api(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self::api_with_details(code, None, message, None)
    }

    pub fn api_with_details(
        code: ApiErrorCode,
        status: Option<u16>,
        message: impl Into<String>,
        details: Option<JsonValue>,
    ) -> Self {
        let message = message.into();
        match (status, &details) {
            (Some(status), Some(payload)) => {
                warn!(target: "app::api::error", code = %code, status, details = %payload, %message);
            }
            (Some(status), None) => {
                warn!(target: "app::api::error", code = %code, status, %message);
            }
            (None, Some(payload)) => {
                warn!(target: "app::api::error", code = %code, details = %payload, %message);
            }
            (None, None) => {
                warn!(target: "app::api::error", code = %code, %message);
            }
        }

        AppError::Api {
            code,
            status,
            message,
            details,
        }
    }

    pub fn api_code(&self) -> Option<ApiErrorCode> {
        match self {
            AppError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            AppError::Api { status, .. } => *status,
            AppError::Unauthorized { .. } => Some(401),
            _ => None,
        }
    }

    pub fn details(&self) -> Option<&JsonValue> {
        match self {
            AppError::Api { details, .. } | AppError::Validation { details, .. } => {
                details.as_ref()
            }
            _ => None,
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::conflict", %message, "conflict error");
        AppError::Conflict { message }
    }

    pub fn capacity_exceeded(assignees: Vec<OverCapacityAssignee>) -> Self {
        let names = assignees
            .iter()
            .map(|assignee| assignee.display_name())
            .collect::<Vec<_>>()
            .join(", ");
        let message = format!("Monthly KPI capacity exceeded for: {names}");
        warn!(target: "app::kpi", count = assignees.len(), %message, "capacity check failed");
        AppError::CapacityExceeded { message, assignees }
    }

    pub fn busy(operation: impl Into<String>) -> Self {
        let operation = operation.into();
        warn!(target: "app::guard", %operation, "duplicate submission rejected");
        AppError::Busy { operation }
    }

    pub fn not_found() -> Self {
        warn!(target: "app::api", "resource not found");
        AppError::NotFound
    }

    pub fn database(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::db", %message, "database error");
        AppError::Database { message }
    }

    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::other", %message, "other error");
        AppError::Other(message)
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        use rusqlite::Error::{QueryReturnedNoRows, SqliteFailure};
        use rusqlite::ErrorCode;

        match &error {
            QueryReturnedNoRows => AppError::not_found(),
            SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
                AppError::conflict("unique or check constraint violated")
            }
            _ => {
                error!(target: "app::db", error = ?error, "sqlite error");
                AppError::database(error.to_string())
            }
        }
    }
}
