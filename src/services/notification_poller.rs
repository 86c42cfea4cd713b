use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::notification::NotificationSnapshot;
use crate::services::hr_api::NotificationApi;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
pub const MIN_POLL_INTERVAL_SECS: u64 = 5;

pub fn clamp_poll_interval(secs: u64) -> Duration {
    Duration::from_secs(secs.max(MIN_POLL_INTERVAL_SECS))
}

/// Background refresh of the notification list.
///
/// One task at most runs per poller. Each tick publishes a fresh snapshot on a
/// watch channel; a failed fetch is logged and the previous snapshot kept.
/// [`stop`](Self::stop) aborts the task, including a request still in flight.
/// After a stop, manual refreshes still return data but publish nothing until
/// the next [`start`](Self::start).
pub struct NotificationPoller {
    api: Arc<dyn NotificationApi>,
    interval: Mutex<Duration>,
    snapshot: Arc<watch::Sender<NotificationSnapshot>>,
    task: Mutex<Option<JoinHandle<()>>>,
    stopped: Arc<AtomicBool>,
}

impl NotificationPoller {
    pub fn new(api: Arc<dyn NotificationApi>, interval: Duration) -> Self {
        let (sender, _receiver) = watch::channel(NotificationSnapshot::default());
        Self {
            api,
            interval: Mutex::new(interval.max(Duration::from_secs(MIN_POLL_INTERVAL_SECS))),
            snapshot: Arc::new(sender),
            task: Mutex::new(None),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
            .lock()
            .map(|guard| *guard)
            .unwrap_or(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS))
    }

    /// Start polling on the current tokio runtime. Returns `false` when a
    /// polling task is already running.
    pub fn start(&self) -> AppResult<bool> {
        let handle = Handle::try_current()
            .map_err(|err| AppError::other(format!("notification poller needs a runtime: {err}")))?;

        let mut task = self
            .task
            .lock()
            .map_err(|_| AppError::other("notification poller lock poisoned"))?;
        if task.as_ref().is_some_and(|running| !running.is_finished()) {
            return Ok(false);
        }

        let api = Arc::clone(&self.api);
        let snapshot = Arc::clone(&self.snapshot);
        let stopped = Arc::clone(&self.stopped);
        let period = self.interval();
        self.stopped.store(false, Ordering::SeqCst);
        *task = Some(handle.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match fetch(api.as_ref()).await {
                    Ok(_) if stopped.load(Ordering::SeqCst) => break,
                    Ok(next) => {
                        snapshot.send_replace(next);
                    }
                    Err(error) => {
                        warn!(target: "app::notifications", error = %error, "notification poll failed");
                    }
                }
            }
        }));

        info!(
            target: "app::notifications",
            interval_secs = period.as_secs(),
            "notification polling started"
        );
        Ok(true)
    }

    /// Returns `true` when a running task was stopped.
    pub fn stop(&self) -> bool {
        let Ok(mut task) = self.task.lock() else {
            return false;
        };
        self.stopped.store(true, Ordering::SeqCst);
        match task.take() {
            Some(running) => {
                let was_running = !running.is_finished();
                running.abort();
                if was_running {
                    info!(target: "app::notifications", "notification polling stopped");
                }
                was_running
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .map(|task| task.as_ref().is_some_and(|running| !running.is_finished()))
            .unwrap_or(false)
    }

    /// Change the period; a running task is restarted with the new value.
    pub fn set_interval(&self, interval: Duration) -> AppResult<()> {
        let interval = interval.max(Duration::from_secs(MIN_POLL_INTERVAL_SECS));
        {
            let mut current = self
                .interval
                .lock()
                .map_err(|_| AppError::other("notification poller lock poisoned"))?;
            if *current == interval {
                return Ok(());
            }
            *current = interval;
        }
        if self.stop() {
            self.start()?;
        }
        Ok(())
    }

    pub async fn poll_once(&self) -> AppResult<NotificationSnapshot> {
        let next = fetch(self.api.as_ref()).await?;
        self.publish(&next);
        Ok(next)
    }

    // stop flips the flag under the same lock.
    fn publish(&self, next: &NotificationSnapshot) {
        let Ok(_task) = self.task.lock() else {
            return;
        };
        if self.stopped.load(Ordering::SeqCst) {
            debug!(target: "app::notifications", "poller stopped, refresh not published");
            return;
        }
        self.snapshot.send_replace(next.clone());
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn latest(&self) -> NotificationSnapshot {
        self.snapshot.borrow().clone()
    }

    pub async fn mark_read(&self, id: i64) -> AppResult<NotificationSnapshot> {
        self.api.mark_notification_read(id).await?;
        debug!(target: "app::notifications", id, "notification marked read");
        self.poll_once().await
    }
}

impl Drop for NotificationPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn fetch(api: &dyn NotificationApi) -> AppResult<NotificationSnapshot> {
    let items = api.list_notifications().await?;
    let next = NotificationSnapshot::from_items(items, Utc::now().to_rfc3339());
    debug!(
        target: "app::notifications",
        total = next.items.len(),
        unread = next.unread,
        "notifications refreshed"
    );
    Ok(next)
}
