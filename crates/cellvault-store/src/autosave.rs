//! Debounced auto-save.
//!
//! A background task watches the store's events. Each content edit pushes a
//! single deadline out to `now + interval`; when the document goes quiet long
//! enough for the deadline to pass, the task saves once. A burst of edits
//! therefore produces one save at the tail of the burst.
//!
//! The timer only arms while both the global switch ([`AutoSaveConfig`],
//! toggled at runtime with [`AutoSaveHandle::set_enabled`]) and the
//! document's own `settings.autoSave` flag are on. Save failures are logged
//! and dropped; the next edit arms the timer again.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use cellvault_types::MAX_AUTO_SAVE_INTERVAL;

use crate::persistence::{PersistResult, PersistenceGateway, SaveReceipt};
use crate::store::StoreEvent;

/// Default quiet period before an auto-save.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Global auto-save settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AutoSaveConfig {
    pub enabled: bool,
    /// Used when the document carries no settings of its own.
    pub interval: Duration,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl AutoSaveConfig {
    /// Build from whole seconds, clamped to `1..=MAX_AUTO_SAVE_INTERVAL`.
    pub fn from_secs(enabled: bool, secs: u64) -> Self {
        Self {
            enabled,
            interval: Duration::from_secs(secs.clamp(1, MAX_AUTO_SAVE_INTERVAL)),
        }
    }
}

enum Command {
    SetEnabled(bool),
    Flush(oneshot::Sender<Option<PersistResult<SaveReceipt>>>),
}

/// Handle to a running auto-saver. Dropping it stops the task.
pub struct AutoSaveHandle {
    commands: mpsc::UnboundedSender<Command>,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl AutoSaveHandle {
    /// Turn the global switch on or off. Turning it off cancels a pending
    /// save.
    pub fn set_enabled(&self, enabled: bool) {
        let _ = self.commands.send(Command::SetEnabled(enabled));
    }

    /// Save pending edits now instead of waiting for the deadline.
    ///
    /// Returns `None` when nothing was pending.
    pub async fn flush(&self) -> Option<PersistResult<SaveReceipt>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands.send(Command::Flush(reply_tx)).ok()?;
        reply_rx.await.ok().flatten()
    }

    /// Cancel any pending save and wait for the task to finish.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "auto-save task ended abnormally");
        }
    }
}

/// Spawns the auto-save task.
pub struct AutoSaver;

impl AutoSaver {
    /// Start auto-saving the gateway's store. Must be called inside a tokio
    /// runtime.
    pub fn spawn(gateway: Arc<PersistenceGateway>, config: AutoSaveConfig) -> AutoSaveHandle {
        let (commands, mut command_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        // Subscribe before spawning so no edit slips past.
        let mut events = gateway.store().subscribe();

        let task = tokio::spawn(async move {
            let mut enabled = config.enabled;
            let mut deadline: Option<Instant> = None;

            loop {
                let sleep_until = deadline.unwrap_or_else(Instant::now);
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        tracing::debug!(pending = deadline.is_some(), "auto-saver stopping");
                        break;
                    }
                    Some(command) = command_rx.recv() => match command {
                        Command::SetEnabled(on) => {
                            enabled = on;
                            if !on {
                                deadline = None;
                            }
                            tracing::debug!(enabled, "auto-save switch changed");
                        }
                        Command::Flush(reply) => {
                            let result = match deadline.take() {
                                Some(_) => Some(gateway.save().await),
                                None => None,
                            };
                            let _ = reply.send(result);
                        }
                    },
                    event = events.recv() => match event {
                        Ok(StoreEvent::Changed { kind, .. }) if kind.is_content_edit() => {
                            deadline = arm(&gateway, &config, enabled);
                        }
                        Ok(StoreEvent::Replaced { .. }) => {
                            if deadline.take().is_some() {
                                tracing::debug!("document replaced, pending auto-save dropped");
                            }
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(missed)) => {
                            tracing::debug!(missed, "auto-saver lagged behind store events");
                            deadline = arm(&gateway, &config, enabled);
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = tokio::time::sleep_until(sleep_until), if deadline.is_some() => {
                        deadline = None;
                        match gateway.save().await {
                            Ok(receipt) => tracing::debug!(cid = %receipt.content_id, "auto-saved"),
                            Err(e) => tracing::warn!(error = %e, "auto-save failed"),
                        }
                    }
                }
            }
        });

        AutoSaveHandle {
            commands,
            shutdown_tx,
            task,
        }
    }
}

/// Deadline for a fresh edit, or `None` if auto-save is off.
fn arm(gateway: &PersistenceGateway, config: &AutoSaveConfig, enabled: bool) -> Option<Instant> {
    if !enabled {
        return None;
    }
    let (doc_enabled, doc_interval) = gateway.store().read(|doc| {
        (
            doc.auto_save_enabled(),
            doc.settings.as_ref().map(|s| s.effective_interval_secs()),
        )
    });
    if !doc_enabled {
        return None;
    }
    let longest = Duration::from_secs(MAX_AUTO_SAVE_INTERVAL);
    let interval = doc_interval
        .map(Duration::from_secs)
        .unwrap_or(config.interval)
        .min(longest);
    let now = Instant::now();
    Some(now.checked_add(interval).unwrap_or(now))
}
