use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single reminder item.
///
/// Ids are derived from the creation timestamp in milliseconds; the
/// engine bumps past the last issued id when several tasks land in the
/// same millisecond, so ids stay unique and monotonically increasing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub text: String,
    pub time: DateTime<Utc>,
    pub done: bool,
    pub notified: bool,
}

impl Task {
    pub fn new(id: i64, text: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self {
            id,
            text: text.into(),
            time,
            done: false,
            notified: false,
        }
    }

    /// True when the reminder instant has passed and no notification has
    /// fired yet. `notified` is terminal, so a task is due at most once.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.notified && self.time <= now
    }

    /// Signed whole minutes until the reminder instant, negative once
    /// overdue.
    pub fn minutes_until(&self, now: DateTime<Utc>) -> i64 {
        (self.time - now).num_minutes()
    }
}
