use chrono::{DateTime, Utc};

use super::task::Task;
use crate::store::Store;

/// The in-memory task list plus the active user session.
///
/// Owns the persistent store; every successful mutation is written
/// through immediately, so the persisted list always matches memory as
/// of the last mutation. A failed write is logged and the in-memory
/// state stands; the next successful write re-converges the file.
pub struct TaskEngine {
    tasks: Vec<Task>,
    user: Option<String>,
    store: Store,
    last_id: i64,
}

impl TaskEngine {
    /// Read both persisted keys once and build the engine.
    pub fn load(store: Store) -> Self {
        let tasks = store.load_tasks();
        let user = store.load_user();
        let last_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
        Self {
            tasks,
            user,
            store,
            last_id,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Append a new task due at `time`. Blank text is rejected as a
    /// no-op. Returns the assigned id.
    pub fn add_task(&mut self, text: &str, time: DateTime<Utc>) -> Option<i64> {
        if text.trim().is_empty() {
            return None;
        }
        let id = self.next_id();
        self.tasks.push(Task::new(id, text, time));
        self.persist_tasks();
        Some(id)
    }

    /// Remove the task with the given id. Unknown ids are a no-op.
    pub fn delete_task(&mut self, id: i64) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return false;
        }
        self.persist_tasks();
        true
    }

    /// Flip the completion flag. Unknown ids are a no-op.
    pub fn toggle_done(&mut self, id: i64) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        task.done = !task.done;
        self.persist_tasks();
        true
    }

    /// Replace a task's text. Unknown ids are a no-op, and the edit path
    /// enforces the same non-blank rule as creation.
    pub fn rename_task(&mut self, id: i64, new_text: &str) -> bool {
        if new_text.trim().is_empty() {
            return false;
        }
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        task.text = new_text.to_string();
        self.persist_tasks();
        true
    }

    /// Set and persist the active user. Blank names are a no-op.
    pub fn login(&mut self, name: &str) -> bool {
        if name.trim().is_empty() {
            return false;
        }
        self.user = Some(name.to_string());
        if let Err(e) = self.store.save_user(name) {
            log::error!("Failed to persist user: {e}");
        }
        true
    }

    /// Clear the active user in memory and on disk.
    pub fn logout(&mut self) {
        self.user = None;
        if let Err(e) = self.store.clear_user() {
            log::error!("Failed to clear persisted user: {e}");
        }
    }

    /// Ids and texts of tasks whose reminder time has passed without a
    /// notification having fired, in list order. Read-only; the poller
    /// applies the flags afterwards via [`Self::mark_notified`].
    pub fn due_reminders(&self, now: DateTime<Utc>) -> Vec<(i64, String)> {
        self.tasks
            .iter()
            .filter(|t| t.is_due(now))
            .map(|t| (t.id, t.text.clone()))
            .collect()
    }

    /// Mark the listed tasks as notified and persist once. The flag is
    /// terminal and never transitions back.
    pub fn mark_notified(&mut self, ids: &[i64]) {
        if ids.is_empty() {
            return;
        }
        let mut changed = false;
        for task in &mut self.tasks {
            if !task.notified && ids.contains(&task.id) {
                task.notified = true;
                changed = true;
            }
        }
        if changed {
            self.persist_tasks();
        }
    }

    /// Next unique id: creation time in milliseconds, bumped past the
    /// last issued id when several creations land in the same millisecond.
    fn next_id(&mut self) -> i64 {
        let stamp = Utc::now().timestamp_millis();
        self.last_id = stamp.max(self.last_id + 1);
        self.last_id
    }

    fn persist_tasks(&self) {
        if let Err(e) = self.store.save_tasks(&self.tasks) {
            log::error!("Failed to persist tasks: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn engine_in(dir: &std::path::Path) -> TaskEngine {
        TaskEngine::load(Store::open(dir).unwrap())
    }

    #[test]
    fn blank_text_is_rejected_at_creation() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        assert_eq!(engine.add_task("", Utc::now()), None);
        assert_eq!(engine.add_task("   ", Utc::now()), None);
        assert!(engine.tasks().is_empty());
    }

    #[test]
    fn ids_strictly_increase_across_rapid_creation() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        let ids: Vec<i64> = (0..5)
            .map(|i| engine.add_task(&format!("task {i}"), Utc::now()).unwrap())
            .collect();
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1], "ids not increasing: {ids:?}");
        }
    }

    #[test]
    fn write_through_matches_memory_after_replay() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        let due = Utc::now() + Duration::minutes(5);

        let a = engine.add_task("buy milk", due).unwrap();
        let b = engine.add_task("water plants", due).unwrap();
        engine.toggle_done(a);
        engine.rename_task(b, "water the plants");
        engine.delete_task(a);

        let reloaded = Store::open(dir.path()).unwrap().load_tasks();
        assert_eq!(reloaded.as_slice(), engine.tasks());
    }

    #[test]
    fn deleting_an_unknown_id_leaves_the_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        engine.add_task("buy milk", Utc::now()).unwrap();

        let before = std::fs::read(dir.path().join("tasks.json")).unwrap();
        assert!(!engine.delete_task(424242));
        let after = std::fs::read(dir.path().join("tasks.json")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn toggle_flips_and_unknown_ids_are_noops() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        let id = engine.add_task("buy milk", Utc::now()).unwrap();

        assert!(engine.toggle_done(id));
        assert!(engine.tasks()[0].done);
        assert!(engine.toggle_done(id));
        assert!(!engine.tasks()[0].done);
        assert!(!engine.toggle_done(424242));
    }

    #[test]
    fn rename_replaces_text_but_rejects_blank() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        let id = engine.add_task("buy milk", Utc::now()).unwrap();

        assert!(engine.rename_task(id, "buy oat milk"));
        assert_eq!(engine.tasks()[0].text, "buy oat milk");
        assert!(!engine.rename_task(id, "  "));
        assert_eq!(engine.tasks()[0].text, "buy oat milk");
        assert!(!engine.rename_task(424242, "ghost"));
    }

    #[test]
    fn login_logout_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());

        assert!(!engine.login(""));
        assert_eq!(engine.user(), None);

        assert!(engine.login("alice"));
        assert_eq!(engine.user(), Some("alice"));
        assert_eq!(
            Store::open(dir.path()).unwrap().load_user().as_deref(),
            Some("alice")
        );

        engine.logout();
        assert_eq!(engine.user(), None);
        assert_eq!(Store::open(dir.path()).unwrap().load_user(), None);
    }

    #[test]
    fn reload_resumes_past_the_highest_persisted_id() {
        let dir = tempfile::tempdir().unwrap();
        let max_id = {
            let mut engine = engine_in(dir.path());
            engine.add_task("buy milk", Utc::now()).unwrap();
            engine.add_task("water plants", Utc::now()).unwrap()
        };

        let mut reloaded = engine_in(dir.path());
        assert_eq!(reloaded.tasks().len(), 2);
        let next = reloaded.add_task("call mum", Utc::now()).unwrap();
        assert!(next > max_id);
    }

    #[test]
    fn mark_notified_is_terminal_and_persists_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        let past = Utc::now() - Duration::minutes(1);
        let id = engine.add_task("buy milk", past).unwrap();

        assert_eq!(engine.due_reminders(Utc::now()), vec![(id, "buy milk".to_string())]);
        engine.mark_notified(&[id]);
        assert!(engine.tasks()[0].notified);
        assert!(engine.due_reminders(Utc::now()).is_empty());

        let reloaded = Store::open(dir.path()).unwrap().load_tasks();
        assert!(reloaded[0].notified);
    }
}
