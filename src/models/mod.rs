pub mod appraisal;
pub mod common;
pub mod compensation;
pub mod directory;
pub mod kpi;
pub mod notification;
pub mod review;
pub mod settings;
