use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::engine::TaskEngine;
use crate::notify::Notify;

/// Periodic overdue-task scan.
///
/// One tick collects the overdue, not-yet-notified tasks, fires one
/// notification per task, then applies the `notified` flags in a single
/// pass. Each task is notified exactly once; the flag is terminal. The
/// loop never exits on its own; abort the returned handle at teardown
/// so no tick outlives the engine.
pub struct ReminderPoller {
    engine: Arc<Mutex<TaskEngine>>,
    notifier: Arc<dyn Notify + Send + Sync>,
    interval: Duration,
}

impl ReminderPoller {
    pub fn new(
        engine: Arc<Mutex<TaskEngine>>,
        notifier: Arc<dyn Notify + Send + Sync>,
        interval: Duration,
    ) -> Self {
        Self {
            engine,
            notifier,
            interval,
        }
    }

    /// Spawn the polling loop. Returns the `JoinHandle`; abort to stop.
    ///
    /// The first tick fires immediately, so reminders that came due while
    /// the process was down are delivered right after startup. Ticks
    /// missed while the process is suspended are skipped, not replayed;
    /// the `notified` flag already dedups delivery.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                self.tick_once();
            }
        })
    }

    /// A single scan. A failed notification is logged and the scan
    /// continues; one bad task must not stop the rest, and nothing in
    /// the tick may panic the loop.
    pub fn tick_once(&self) {
        let now = chrono::Utc::now();
        let due = self.engine().due_reminders(now);
        if due.is_empty() {
            return;
        }

        let mut fired = Vec::with_capacity(due.len());
        for (id, text) in due {
            if let Err(e) = self.notifier.notify(&format!("Reminder: {text}")) {
                log::warn!("Notification for task {id} failed: {e}");
            }
            fired.push(id);
        }

        log::info!("Notified {} overdue task(s)", fired.len());
        self.engine().mark_notified(&fired);
    }

    fn engine(&self) -> MutexGuard<'_, TaskEngine> {
        // A poisoned lock means a panicked caller, not corrupt task data;
        // the scan must keep running either way.
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
