use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("chime")
}

fn default_poll_interval() -> u64 {
    60
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ChimeConfig {
    /// Directory holding the persisted task list and user session.
    #[serde(default = "default_data_dir")]
    pub data_directory: PathBuf,
    /// Seconds between reminder scans.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub debug_logging: bool,
}

impl Default for ChimeConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_dir(),
            poll_interval_secs: default_poll_interval(),
            debug_logging: false,
        }
    }
}

impl ChimeConfig {
    /// Load the user config, falling back to defaults when the file is
    /// absent or malformed. A broken config must not stop the process.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Malformed config at {}: {e}; using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("chime").join("config.json"))
    }

    /// Poll interval as a duration. A zero interval is clamped to one
    /// second so the ticker cannot spin.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    /// Ensure the data directory exists.
    pub fn ensure_files(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_directory)
    }
}
