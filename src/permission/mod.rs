//! Location permission monitoring.
//!
//! OS permission revocation is not observable as an event, so the monitor
//! owns two triggers internally: a periodic poll (every 30 s by default)
//! and a re-check on every foreground-resume transition signalled by the
//! host. Consumers see a single `subscribe`/guard pair and never manage
//! raw timers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::traits::{LocationClient, PermissionGrant};

/// Point-in-time view of both permission axes. Re-derived on demand,
/// never cached or persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionSnapshot {
    pub foreground: PermissionGrant,
    pub background: PermissionGrant,
}

impl PermissionSnapshot {
    /// Tracking requires both axes granted.
    pub fn has_all(&self) -> bool {
        self.foreground.granted && self.background.granted
    }

    /// Whether any missing grant can only be restored from system settings.
    pub fn needs_settings_visit(&self) -> bool {
        (!self.foreground.granted && !self.foreground.can_ask_again)
            || (!self.background.granted && !self.background.can_ask_again)
    }
}

/// Outcome of a denied permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionError {
    ForegroundDenied { needs_settings: bool },
    BackgroundDenied { needs_settings: bool },
}

impl PermissionError {
    /// Whether the user must visit system settings to recover.
    pub fn needs_settings(&self) -> bool {
        match self {
            PermissionError::ForegroundDenied { needs_settings }
            | PermissionError::BackgroundDenied { needs_settings } => *needs_settings,
        }
    }
}

impl std::fmt::Display for PermissionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionError::ForegroundDenied { .. } => {
                write!(f, "Foreground location permission denied")
            }
            PermissionError::BackgroundDenied { .. } => {
                write!(f, "Background location permission denied")
            }
        }
    }
}

impl std::error::Error for PermissionError {}

/// Subscription guard. Dropping it (or calling [`PermissionWatch::unsubscribe`])
/// releases the polling timer and the resume listener.
pub struct PermissionWatch {
    task: JoinHandle<()>,
}

impl PermissionWatch {
    pub fn unsubscribe(self) {}
}

impl Drop for PermissionWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct PermissionMonitor {
    location: Arc<dyn LocationClient>,
    poll_interval: Duration,
    resume_tx: watch::Sender<u64>,
}

impl PermissionMonitor {
    pub fn new(location: Arc<dyn LocationClient>, poll_interval: Duration) -> Arc<Self> {
        let (resume_tx, _) = watch::channel(0);
        Arc::new(Self {
            location,
            poll_interval,
            resume_tx,
        })
    }

    /// Query both permission axes fresh from the OS.
    pub async fn snapshot(&self) -> PermissionSnapshot {
        PermissionSnapshot {
            foreground: self.location.foreground_permission().await,
            background: self.location.background_permission().await,
        }
    }

    /// Check grants and, when `prompt_if_needed`, request the missing ones:
    /// foreground first, then background, short-circuiting on a refusal.
    pub async fn request_snapshot(
        &self,
        prompt_if_needed: bool,
    ) -> Result<PermissionSnapshot, PermissionError> {
        let current = self.snapshot().await;
        if current.has_all() {
            return Ok(current);
        }

        if !prompt_if_needed {
            return Err(if !current.foreground.granted {
                PermissionError::ForegroundDenied {
                    needs_settings: !current.foreground.can_ask_again,
                }
            } else {
                PermissionError::BackgroundDenied {
                    needs_settings: !current.background.can_ask_again,
                }
            });
        }

        if !current.foreground.granted {
            debug!("requesting foreground location permission");
            let result = self.location.request_foreground_permission().await;
            if !result.granted {
                return Err(PermissionError::ForegroundDenied {
                    needs_settings: !result.can_ask_again,
                });
            }
        }

        let background = self.location.background_permission().await;
        if !background.granted {
            debug!("requesting background location permission");
            let result = self.location.request_background_permission().await;
            if !result.granted {
                return Err(PermissionError::BackgroundDenied {
                    needs_settings: !result.can_ask_again,
                });
            }
        }

        Ok(self.snapshot().await)
    }

    /// Signal a foreground-resume transition; every active subscription
    /// re-checks immediately.
    pub fn notify_resumed(&self) {
        self.resume_tx.send_modify(|n| *n += 1);
    }

    /// Watch for permission loss. `on_lost` fires when a check finds the
    /// grants gone while the previous check saw them intact; it does not
    /// repeat while the grants stay lost. The subscription starts from the
    /// granted assumption (it is taken out right after tracking starts).
    pub fn subscribe<F>(&self, on_lost: F) -> PermissionWatch
    where
        F: Fn(PermissionSnapshot) + Send + Sync + 'static,
    {
        let location = Arc::clone(&self.location);
        let mut resume_rx = self.resume_tx.subscribe();
        let poll_interval = self.poll_interval;

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            interval.tick().await; // immediate first tick; checks start one period in
            let mut believed_granted = true;

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    changed = resume_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        debug!("foreground resume; re-checking location permissions");
                    }
                }

                let snapshot = PermissionSnapshot {
                    foreground: location.foreground_permission().await,
                    background: location.background_permission().await,
                };

                if snapshot.has_all() {
                    believed_granted = true;
                } else if believed_granted {
                    believed_granted = false;
                    warn!("location permissions were revoked");
                    on_lost(snapshot);
                } else {
                    trace!("location permissions still missing");
                }
            }
        });

        PermissionWatch { task }
    }
}
