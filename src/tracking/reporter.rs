//! The periodic location reporting loop.
//!
//! States: `Stopped -> Starting -> Running -> Stopped`. Exactly one
//! periodic timer exists while Running; `start` is idempotent and `stop`
//! always succeeds. A cycle failure (no fix, both transports down) is
//! logged and the loop keeps running; only an explicit `stop` or a
//! permission-loss signal ends it.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::resolver::{self, ResolvedIdentifiers};
use super::state::TrackingStatus;
use crate::error::TrackingError;
use crate::permission::{PermissionMonitor, PermissionWatch};
use crate::session::SessionService;
use crate::traits::{Accuracy, LocationClient, Position};
use crate::transport::{ReportMetadata, TransportSelector};

struct ReporterInner {
    active: bool,
    last_known: Option<Position>,
    task: Option<JoinHandle<()>>,
    permission_watch: Option<PermissionWatch>,
}

pub struct LocationReporter {
    location: Arc<dyn LocationClient>,
    monitor: Arc<PermissionMonitor>,
    session: Arc<SessionService>,
    selector: Arc<TransportSelector>,
    report_interval: Duration,
    position_timeout: Duration,
    inner: Mutex<ReporterInner>,
    weak_self: Weak<Self>,
}

impl LocationReporter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        location: Arc<dyn LocationClient>,
        monitor: Arc<PermissionMonitor>,
        session: Arc<SessionService>,
        selector: Arc<TransportSelector>,
        report_interval: Duration,
        position_timeout: Duration,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            location,
            monitor,
            session,
            selector,
            report_interval,
            position_timeout,
            inner: Mutex::new(ReporterInner {
                active: false,
                last_known: None,
                task: None,
                permission_watch: None,
            }),
            weak_self: weak_self.clone(),
        })
    }

    /// Start periodic reporting.
    ///
    /// Pre-flight: full permission grants, then identifier resolution from
    /// the current session. Both failures leave the reporter Stopped with
    /// no timer. On success one cycle runs immediately, then the periodic
    /// timer takes over. Calling `start` while Running is a no-op success.
    pub async fn start(&self) -> Result<(), TrackingError> {
        if self.inner.lock().unwrap().active {
            debug!("location tracking already active");
            return Ok(());
        }

        let snapshot = self.monitor.snapshot().await;
        if !snapshot.has_all() {
            return Err(TrackingError::PermissionRequired { snapshot });
        }

        let ids = self.resolve_current_identifiers().await?;

        {
            let mut inner = self.inner.lock().unwrap();
            if inner.active {
                return Ok(());
            }
            inner.active = true;
        }

        info!(
            driver_id = %ids.driver_id,
            vendor_id = %ids.vendor_id,
            tenant_id = %ids.tenant_id,
            "starting location tracking"
        );

        // First report goes out now, not one interval from now.
        if let Err(err) = self.run_cycle(&ids, false).await {
            warn!(code = err.error_code(), "initial reporting cycle failed: {}", err);
        }

        let task = {
            let weak = self.weak_self.clone();
            let ids = ids.clone();
            let period = self.report_interval;
            tokio::spawn(async move {
                let start = tokio::time::Instant::now() + period;
                let mut interval = tokio::time::interval_at(start, period);
                interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                loop {
                    interval.tick().await;
                    let Some(reporter) = weak.upgrade() else {
                        break;
                    };
                    // Cycles run detached: cancelling the timer must not
                    // abort a publish already in flight.
                    let ids = ids.clone();
                    tokio::spawn(async move {
                        if let Err(err) = reporter.run_cycle(&ids, false).await {
                            warn!(code = err.error_code(), "reporting cycle failed: {}", err);
                        }
                    });
                }
            })
        };

        let permission_watch = {
            let weak = self.weak_self.clone();
            self.monitor.subscribe(move |_snapshot| {
                if let Some(reporter) = weak.upgrade() {
                    warn!("location permission lost; stopping tracking");
                    reporter.stop();
                }
            })
        };

        let mut inner = self.inner.lock().unwrap();
        if !inner.active {
            // stop() raced the startup sequence; the loop must not come back.
            task.abort();
            drop(permission_watch);
            return Ok(());
        }
        inner.task = Some(task);
        inner.permission_watch = Some(permission_watch);
        Ok(())
    }

    /// Stop periodic reporting. Effective immediately for future ticks; a
    /// cycle already past position acquisition may still publish. Always
    /// succeeds, including when already Stopped.
    pub fn stop(&self) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(task) = inner.task.take() {
            task.abort();
        }
        inner.permission_watch.take();
        if inner.active {
            info!("location tracking stopped");
        }
        inner.active = false;
    }

    /// Pure read of the current tracking state.
    pub fn status(&self) -> TrackingStatus {
        let inner = self.inner.lock().unwrap();
        TrackingStatus {
            is_tracking: inner.active,
            last_known_location: inner.last_known.clone(),
        }
    }

    /// One on-demand reporting cycle outside the periodic schedule.
    /// Identifiers are re-resolved fresh, covering profile changes between
    /// scheduled ticks.
    pub async fn report_once(&self) -> Result<(), TrackingError> {
        let ids = self.resolve_current_identifiers().await?;
        debug!("manual location report");
        self.run_cycle(&ids, true).await
    }

    async fn resolve_current_identifiers(&self) -> Result<ResolvedIdentifiers, TrackingError> {
        let session = self.session.load_session().await.ok_or_else(|| {
            TrackingError::IdentityUnresolved {
                missing: vec!["driver_id", "vendor_id", "tenant_id"],
            }
        })?;
        let profile = session.profile.ok_or_else(|| TrackingError::IdentityUnresolved {
            missing: vec!["driver_id", "vendor_id", "tenant_id"],
        })?;
        resolver::resolve_identifiers(&profile)
    }

    /// Acquire a position, record it, publish it. Position acquisition
    /// strictly precedes the publish attempt.
    async fn run_cycle(
        &self,
        ids: &ResolvedIdentifiers,
        manual: bool,
    ) -> Result<(), TrackingError> {
        let position = self
            .location
            .current_position(Accuracy::High, self.position_timeout)
            .await?;

        self.inner.lock().unwrap().last_known = Some(position.clone());

        let metadata = ReportMetadata::now(manual);
        self.selector.publish(ids, &position, &metadata).await?;
        debug!(
            latitude = position.latitude,
            longitude = position.longitude,
            "position published"
        );
        Ok(())
    }
}

impl Drop for LocationReporter {
    fn drop(&mut self) {
        if let Some(task) = self.inner.lock().unwrap().task.take() {
            task.abort();
        }
    }
}
