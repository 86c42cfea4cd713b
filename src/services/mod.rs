pub mod appraisal_service;
pub mod compensation_service;
pub mod directory_service;
pub mod grading;
pub mod hr_api;
pub mod kpi_service;
pub mod listing;
pub mod notification_poller;
pub mod review_service;
pub mod settings_service;
pub mod submission_guard;
pub mod weight_validator;
