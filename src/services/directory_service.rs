use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::directory::{Company, Department, Employee, EmployeeFilter};
use crate::services::hr_api::DirectoryApi;

/// Read-only lookups that feed the pickers on every page.
pub struct DirectoryService {
    api: Arc<dyn DirectoryApi>,
}

impl DirectoryService {
    pub fn new(api: Arc<dyn DirectoryApi>) -> Self {
        Self { api }
    }

    pub async fn employees(&self, filter: EmployeeFilter) -> AppResult<Vec<Employee>> {
        if filter.department_id.is_some() && filter.company_id.is_none() {
            return Err(AppError::validation(
                "Pick a company before filtering by department",
            ));
        }
        self.api.list_employees(&filter).await
    }

    pub async fn companies(&self) -> AppResult<Vec<Company>> {
        self.api.list_companies().await
    }

    pub async fn departments(&self, company_id: i64) -> AppResult<Vec<Department>> {
        self.api.list_departments(company_id).await
    }
}
