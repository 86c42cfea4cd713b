use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{AppError, AppResult};

/// Registry of operations with a request outstanding. A second submission of
/// the same operation is refused until the first one settles.
#[derive(Clone, Default)]
pub struct SubmissionGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Held for the lifetime of one submission; dropping it frees the operation.
#[must_use]
pub struct InFlight {
    operation: String,
    registry: Arc<Mutex<HashSet<String>>>,
}

impl SubmissionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_begin(&self, operation: impl Into<String>) -> AppResult<InFlight> {
        let operation = operation.into();
        let mut guard = self
            .in_flight
            .lock()
            .map_err(|_| AppError::other("submission registry lock poisoned"))?;
        if !guard.insert(operation.clone()) {
            return Err(AppError::busy(operation));
        }
        debug!(target: "app::guard", %operation, "submission started");
        Ok(InFlight {
            operation,
            registry: Arc::clone(&self.in_flight),
        })
    }

    pub fn is_in_flight(&self, operation: &str) -> bool {
        self.in_flight
            .lock()
            .map(|guard| guard.contains(operation))
            .unwrap_or(false)
    }

    /// Run `task` while holding the operation's slot.
    pub async fn run<F, T>(&self, operation: impl Into<String>, task: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        let _slot = self.try_begin(operation)?;
        task.await
    }
}

impl InFlight {
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.registry.lock() {
            guard.remove(&self.operation);
        }
        debug!(target: "app::guard", operation = %self.operation, "submission settled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_submission_is_rejected_until_first_settles() {
        let guard = SubmissionGuard::new();
        let first = guard.try_begin("appraisal.save").unwrap();

        let second = guard.try_begin("appraisal.save");
        assert!(matches!(second, Err(AppError::Busy { .. })));
        assert!(guard.is_in_flight("appraisal.save"));

        drop(first);
        assert!(!guard.is_in_flight("appraisal.save"));
        assert!(guard.try_begin("appraisal.save").is_ok());
    }

    #[test]
    fn different_operations_do_not_block_each_other() {
        let guard = SubmissionGuard::new();
        let _save = guard.try_begin("appraisal.save").unwrap();
        assert!(guard.try_begin("kpi.assignment.create").is_ok());
    }

    #[tokio::test]
    async fn slot_is_released_when_task_fails() {
        let guard = SubmissionGuard::new();
        let result: AppResult<()> = guard
            .run("review.update", async { Err(AppError::validation("bad rating")) })
            .await;
        assert!(result.is_err());
        assert!(!guard.is_in_flight("review.update"));
    }
}
