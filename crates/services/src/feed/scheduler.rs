use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use clinicflow_config::RefreshSettings;
use clinicflow_models::Role;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Polling period for a role. Staff poll fastest because they act on
/// incoming appointment requests.
pub fn refresh_interval(role: Role, settings: &RefreshSettings) -> Duration {
    let secs = match role {
        Role::Patient => settings.patient_secs,
        Role::Staff => settings.staff_secs,
        Role::Admin => settings.admin_secs,
    };
    Duration::from_secs(secs.max(1))
}

struct ActiveTimer {
    role: Role,
    handle: JoinHandle<()>,
    /// Set under the lock by `stop`; the timer checks it under the same lock
    /// before invoking the callback.
    stopped: Arc<Mutex<bool>>,
}

/// Owns at most one recurring refresh timer.
pub struct RefreshScheduler {
    settings: RefreshSettings,
    active: Option<ActiveTimer>,
}

impl RefreshScheduler {
    pub fn new(settings: RefreshSettings) -> Self {
        Self {
            settings,
            active: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Starts the timer. The first tick fires one full interval from now.
    /// Returns `false` and leaves the existing timer alone if one is running.
    ///
    /// Each tick calls `on_tick` and spawns the returned future, so a slow
    /// refresh does not delay the next tick and `stop` never cuts one short.
    pub fn start<F, Fut>(&mut self, role: Role, on_tick: F) -> bool
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if let Some(active) = &self.active {
            debug!(role = %role, running_for = %active.role, "Refresh timer already running");
            return false;
        }

        let period = refresh_interval(role, &self.settings);
        let stopped = Arc::new(Mutex::new(false));
        let stop_flag = Arc::clone(&stopped);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let tick = {
                    let stopped = stop_flag.lock();
                    if *stopped {
                        break;
                    }
                    on_tick()
                };
                tokio::spawn(tick);
            }
        });

        info!(role = %role, period_secs = period.as_secs(), "Refresh timer started");
        self.active = Some(ActiveTimer {
            role,
            handle,
            stopped,
        });
        true
    }

    /// Stops the timer. Once this returns no further tick callback runs.
    /// Returns `false` if nothing was running.
    pub fn stop(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        *active.stopped.lock() = true;
        active.handle.abort();
        info!(role = %active.role, "Refresh timer stopped");
        true
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
