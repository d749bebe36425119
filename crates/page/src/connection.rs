use std::time::{Duration, Instant};

use lingopane_core::{PageRequest, Result, Settings, SettingsStore, TabId};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// How often the idle check runs.
pub const ACTIVITY_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// An explicit liveness probe fires only after this much inactivity.
pub const IDLE_PROBE_AFTER: Duration = Duration::from_secs(300);

/// Lightweight keep-alive, sent regardless of activity.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(120);

pub const RECONNECT_MAX_ATTEMPTS: u32 = 5;
pub const RECONNECT_BASE_DELAY: Duration = Duration::from_millis(500);
pub const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(8);

/// Delay between waking the dispatcher and sending the real request, to
/// give it time to come up.
pub const WAKE_DELAY: Duration = Duration::from_millis(400);

/// Exponential backoff for settings-reload retries during reconnection.
pub fn backoff_delay(attempt: u32) -> Duration {
    let delay = RECONNECT_BASE_DELAY.saturating_mul(1u32 << attempt.min(16));
    delay.min(RECONNECT_MAX_DELAY)
}

/// What the page agent knows about its link to the dispatcher.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionState {
    is_active: bool,
    last_activity: Instant,
}

impl ConnectionState {
    pub fn new(now: Instant) -> Self {
        Self {
            is_active: true,
            last_activity: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    /// Every user interaction and every successful round trip counts.
    pub fn record_activity(&mut self, now: Instant) {
        self.is_active = true;
        self.last_activity = now;
    }

    pub fn mark_inactive(&mut self) {
        self.is_active = false;
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    /// True when the periodic check should send an explicit probe.
    pub fn needs_probe(&self, now: Instant) -> bool {
        self.idle_for(now) > IDLE_PROBE_AFTER
    }
}

/// Reload settings from the store with bounded exponential backoff, then
/// send a no-op wake message so the dispatcher has a reason to spin up.
/// Returns the freshly loaded settings on success.
pub async fn reconnect(
    store: &dyn SettingsStore,
    request_tx: &mpsc::Sender<(TabId, PageRequest)>,
    tab: TabId,
) -> Result<Settings> {
    let mut last_err = None;
    for attempt in 0..RECONNECT_MAX_ATTEMPTS {
        match store.load().await {
            Ok(settings) => {
                if let Err(e) = request_tx.send((tab, PageRequest::wakeup_now())).await {
                    debug!(error = %e, "Wake message not delivered");
                }
                debug!(attempt, "Reconnected");
                return Ok(settings);
            }
            Err(e) => {
                warn!(attempt, error = %e, "Settings reload failed");
                last_err = Some(e);
                tokio::time::sleep(backoff_delay(attempt)).await;
            }
        }
    }
    Err(last_err
        .unwrap_or_else(|| lingopane_core::Error::Other("reconnect failed".to_string())))
}
