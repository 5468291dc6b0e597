use std::sync::{Arc, Mutex, PoisonError};

use chime::config::ChimeConfig;
use chime::core::engine::TaskEngine;
use chime::core::poller::ReminderPoller;
use chime::notify::DesktopNotifier;
use chime::store::Store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ChimeConfig::load();

    // Set up logging to the systemd user journal (`journalctl --user -t chime -f`).
    // Wrapper filters: chime crate at info/debug (per config), everything else at warn.
    {
        struct FilteredJournal {
            inner: systemd_journal_logger::JournalLog,
        }

        impl log::Log for FilteredJournal {
            fn enabled(&self, metadata: &log::Metadata) -> bool {
                if metadata.target().starts_with("chime") {
                    let max = if chime::debug_logging() {
                        log::LevelFilter::Debug
                    } else {
                        log::LevelFilter::Info
                    };
                    metadata.level() <= max
                } else {
                    metadata.level() <= log::LevelFilter::Warn
                }
            }
            fn log(&self, record: &log::Record) {
                if self.enabled(record.metadata()) {
                    self.inner.log(record);
                }
            }
            fn flush(&self) {
                self.inner.flush();
            }
        }

        let journal = systemd_journal_logger::JournalLog::new()?
            .with_syslog_identifier("chime".to_string());

        chime::set_debug_logging(config.debug_logging);

        log::set_boxed_logger(Box::new(FilteredJournal { inner: journal }))?;
        // Global max must be Debug so chime debug logs can pass through when toggled
        log::set_max_level(log::LevelFilter::Debug);
    }

    config.ensure_files()?;

    let store = Store::open(&config.data_directory)?;
    let engine = Arc::new(Mutex::new(TaskEngine::load(store)));

    {
        let engine = engine.lock().unwrap_or_else(PoisonError::into_inner);
        match engine.user() {
            Some(user) => log::info!("Loaded {} task(s) for {user}", engine.tasks().len()),
            None => log::info!("Loaded {} task(s), no active user", engine.tasks().len()),
        }
    }

    // Probe the notification capability once, before the first tick.
    let notifier = Arc::new(DesktopNotifier::probe());
    let poller = ReminderPoller::new(engine, notifier, config.poll_interval());
    let handle = poller.spawn();

    tokio::signal::ctrl_c().await?;

    log::info!("Shutting down");
    handle.abort();
    let _ = handle.await;

    Ok(())
}
