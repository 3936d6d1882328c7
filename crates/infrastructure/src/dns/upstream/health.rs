use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug)]
struct HealthState {
    status: EndpointStatus,
    consecutive_failures: u32,
    cooldown_until: Option<Instant>,
}

/// Consecutive-failure health tracking with a cooldown window.
///
/// After `failure_threshold` failures in a row the endpoint sits out
/// for `cooldown`; once the window elapses it becomes eligible for one
/// trial query, which either readmits it or restarts the cooldown.
#[derive(Debug)]
pub struct EndpointHealth {
    failure_threshold: u32,
    cooldown: Duration,
    state: RwLock<HealthState>,
}

impl EndpointHealth {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cooldown,
            state: RwLock::new(HealthState {
                status: EndpointStatus::Healthy,
                consecutive_failures: 0,
                cooldown_until: None,
            }),
        }
    }

    pub fn record_success(&self, url: &str) {
        let mut state = match self.state.write() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if state.status == EndpointStatus::Unhealthy {
            info!(endpoint = %url, "Upstream endpoint recovered");
        }
        state.status = EndpointStatus::Healthy;
        state.consecutive_failures = 0;
        state.cooldown_until = None;
    }

    pub fn record_failure(&self, url: &str, error: &str) {
        let mut state = match self.state.write() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        if state.consecutive_failures >= self.failure_threshold {
            if state.status != EndpointStatus::Unhealthy {
                warn!(
                    endpoint = %url,
                    failures = state.consecutive_failures,
                    error = %error,
                    "Upstream endpoint marked unhealthy"
                );
            }
            state.status = EndpointStatus::Unhealthy;
            state.cooldown_until = Some(Instant::now() + self.cooldown);
        }
    }

    pub fn status(&self) -> EndpointStatus {
        match self.state.read() {
            Ok(state) => state.status,
            Err(poisoned) => poisoned.into_inner().status,
        }
    }

    /// Healthy, or unhealthy but past the cooldown window (trial query).
    pub fn is_available(&self) -> bool {
        let state = match self.state.read() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        match state.status {
            EndpointStatus::Healthy => true,
            EndpointStatus::Unhealthy => state
                .cooldown_until
                .map(|until| Instant::now() >= until)
                .unwrap_or(true),
        }
    }

    /// Unhealthy and past the cooldown window: due for a re-probe.
    pub fn cooldown_elapsed(&self) -> bool {
        let state = match self.state.read() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.status == EndpointStatus::Unhealthy
            && state
                .cooldown_until
                .map(|until| Instant::now() >= until)
                .unwrap_or(true)
    }
}
