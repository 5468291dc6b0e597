//! File-backed persistence for the task list and the user session.
//!
//! Two independent keys, one file each under the data directory:
//! `tasks.json` (JSON array of tasks) and `user` (plain username).
//! Reads degrade to defaults on absence or corruption; writes are full
//! synchronous overwrites. There is no transactional guarantee across
//! the two keys; they are independent entities.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::task::Task;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("task list encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persistent store rooted at a data directory.
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Open a store at `dir`, creating the directory if needed.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.dir.join("tasks.json")
    }

    pub fn user_path(&self) -> PathBuf {
        self.dir.join("user")
    }

    /// Read the persisted task list. Absent or unparseable data yields an
    /// empty list, never an error.
    pub fn load_tasks(&self) -> Vec<Task> {
        let path = self.tasks_path();
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str(&raw) {
            Ok(tasks) => tasks,
            Err(e) => {
                log::warn!("Unreadable task list at {}: {e}; starting empty", path.display());
                Vec::new()
            }
        }
    }

    /// Read the persisted username. Absent or empty means logged out.
    pub fn load_user(&self) -> Option<String> {
        let name = std::fs::read_to_string(self.user_path()).ok()?;
        if name.is_empty() { None } else { Some(name) }
    }

    /// Overwrite the persisted task list.
    pub fn save_tasks(&self, tasks: &[Task]) -> Result<(), StoreError> {
        let json = serde_json::to_string(tasks)?;
        std::fs::write(self.tasks_path(), json)?;
        Ok(())
    }

    /// Overwrite the persisted username.
    pub fn save_user(&self, name: &str) -> Result<(), StoreError> {
        std::fs::write(self.user_path(), name)?;
        Ok(())
    }

    /// Remove the persisted username key. Removing an absent key is fine.
    pub fn clear_user(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(self.user_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
