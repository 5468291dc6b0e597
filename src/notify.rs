//! Desktop notification seam.
//!
//! The poller talks to a [`Notify`] implementation rather than the host
//! capability directly, so a missing or broken capability degrades to
//! the journal instead of killing the reminder loop.

use std::process::Command;

use once_cell::sync::OnceCell;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to invoke notify-send: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("notify-send exited with {0}")]
    Failed(std::process::ExitStatus),
}

/// Fire-and-forget local notification capability.
pub trait Notify {
    fn notify(&self, summary: &str) -> Result<(), NotifyError>;
}

/// Whether `notify-send` answered the startup probe, checked once per
/// process.
static NOTIFY_SEND_AVAILABLE: OnceCell<bool> = OnceCell::new();

/// Sends desktop notifications through `notify-send`.
///
/// The capability is probed once at startup; when the command is missing
/// the notifier runs degraded and delivers reminders to the journal
/// instead.
pub struct DesktopNotifier {
    available: bool,
}

impl DesktopNotifier {
    pub fn probe() -> Self {
        let available = *NOTIFY_SEND_AVAILABLE.get_or_init(|| {
            match Command::new("notify-send").arg("--version").output() {
                Ok(out) if out.status.success() => true,
                Ok(_) | Err(_) => {
                    log::warn!("notify-send unavailable; reminders will only be logged");
                    false
                }
            }
        });
        Self { available }
    }
}

impl Notify for DesktopNotifier {
    fn notify(&self, summary: &str) -> Result<(), NotifyError> {
        if !self.available {
            log::info!("{summary}");
            return Ok(());
        }
        let status = Command::new("notify-send").arg(summary).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(NotifyError::Failed(status))
        }
    }
}
