//! Convergence polling
//!
//! Zone provisioning on the remote service is asynchronous: a mutating call
//! returns `PENDING` immediately and the real status shows up later. The
//! [`StatePoller`] turns that into a deterministic outcome for the caller by
//! fetching the zone at a fixed interval until it reaches the expected state,
//! hits an error-class status, or the attempt budget runs out.
//!
//! ## Outcome Rules
//!
//! ```text
//! fetch ─┬─ status == target ───────────▶ Converged (return zone)
//!        ├─ NotFound while waiting absent ▶ Absent
//!        ├─ status is ERROR ─────────────▶ Failed     (not retried)
//!        ├─ any other fetch error ───────▶ Err(e)     (not retried)
//!        └─ otherwise ── sleep(interval) ─▶ fetch again, up to max_attempts
//!                                            then TimedOut(last_status)
//! ```
//!
//! The interval is fixed rather than exponential: convergence time on the
//! service is small and bounded, and a fixed interval keeps the worst-case
//! wait at `max_attempts * interval`.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::PollConfig;
use crate::error::{Error, Result};
use crate::traits::{ShowParams, ZoneClient};
use crate::zone::{Zone, ZoneStatus};

/// What the poller is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedState {
    /// The zone reports this status
    Status(ZoneStatus),
    /// Fetching the zone yields NotFound
    Absent,
}

impl fmt::Display for ExpectedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedState::Status(status) => write!(f, "{}", status),
            ExpectedState::Absent => f.write_str("absent"),
        }
    }
}

/// Terminal result of a poll
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The zone reached the target status; carries the final snapshot
    Converged(Zone),
    /// The zone can no longer be fetched
    Absent,
    /// The attempt budget ran out
    TimedOut {
        last_status: Option<ZoneStatus>,
        attempts: u32,
    },
    /// The zone reached an error-class status
    Failed { status: ZoneStatus },
}

/// Waits for zones to converge
#[derive(Debug, Clone)]
pub struct StatePoller {
    max_attempts: u32,
    interval: Duration,
    show_params: ShowParams,
}

impl StatePoller {
    /// Create a poller from configuration
    pub fn new(config: &PollConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            interval: config.interval(),
            show_params: ShowParams::default(),
        }
    }

    /// Override the attempt budget (at least one fetch is always made)
    pub fn with_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Override the delay between fetches
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Fetch with these parameters (e.g. `all_projects` for an admin watcher)
    pub fn with_show_params(mut self, params: ShowParams) -> Self {
        self.show_params = params;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll until `expected` is observed or the outcome is otherwise terminal
    ///
    /// # Returns
    ///
    /// - `Ok(PollOutcome)`: A terminal observation (including timeout)
    /// - `Err(Error)`: A fetch failed for any reason other than the NotFound
    ///   that `ExpectedState::Absent` waits for
    pub async fn poll(
        &self,
        client: &dyn ZoneClient,
        resource_id: &str,
        expected: ExpectedState,
    ) -> Result<PollOutcome> {
        let mut last_status = None;

        for attempt in 1..=self.max_attempts {
            match client.show_zone(resource_id, &self.show_params).await {
                Ok(response) => {
                    let zone = response.into_body();
                    debug!(
                        "Poll {}/{} for {}: status={} action={} (want {})",
                        attempt, self.max_attempts, resource_id, zone.status, zone.action, expected
                    );
                    last_status = Some(zone.status);

                    if expected == ExpectedState::Status(zone.status) {
                        return Ok(PollOutcome::Converged(zone));
                    }
                    if zone.status.is_error() {
                        return Ok(PollOutcome::Failed {
                            status: zone.status,
                        });
                    }
                }
                Err(e) if e.is_not_found() && expected == ExpectedState::Absent => {
                    debug!("Poll {}/{} for {}: gone", attempt, self.max_attempts, resource_id);
                    return Ok(PollOutcome::Absent);
                }
                Err(e) => return Err(e),
            }

            // No point sleeping once the budget is spent
            if attempt < self.max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }

        Ok(PollOutcome::TimedOut {
            last_status,
            attempts: self.max_attempts,
        })
    }

    /// Wait until the zone reports `target`
    ///
    /// Returns the converged snapshot. A zone already at `target` returns
    /// after a single fetch without sleeping.
    ///
    /// # Errors
    ///
    /// - [`Error::UnexpectedState`] if the zone reports an error-class status
    /// - [`Error::Timeout`] if `target` was not seen within the budget
    /// - Any fetch error, unchanged
    pub async fn wait_for_status(
        &self,
        client: &dyn ZoneClient,
        resource_id: &str,
        target: ZoneStatus,
    ) -> Result<Zone> {
        info!(
            "Waiting for zone {} to reach {} (as {})",
            resource_id,
            target,
            client.identity()
        );

        let expected = ExpectedState::Status(target);
        match self.poll(client, resource_id, expected).await? {
            PollOutcome::Converged(zone) => Ok(zone),
            outcome => Err(self.settle_failure(resource_id, expected, outcome)),
        }
    }

    /// Wait until fetching the zone yields NotFound
    ///
    /// # Errors
    ///
    /// - [`Error::UnexpectedState`] if the zone reports an error-class status
    /// - [`Error::Timeout`] if the zone was still fetchable after the budget
    /// - Any fetch error other than NotFound, unchanged
    pub async fn wait_for_absence(&self, client: &dyn ZoneClient, resource_id: &str) -> Result<()> {
        info!(
            "Waiting for zone {} to disappear (as {})",
            resource_id,
            client.identity()
        );

        match self.poll(client, resource_id, ExpectedState::Absent).await? {
            PollOutcome::Absent => Ok(()),
            outcome => Err(self.settle_failure(resource_id, ExpectedState::Absent, outcome)),
        }
    }

    fn settle_failure(&self, resource_id: &str, expected: ExpectedState, outcome: PollOutcome) -> Error {
        match outcome {
            PollOutcome::TimedOut {
                last_status,
                attempts,
            } => {
                warn!(
                    "Zone {} did not become {} after {} attempt(s), last status {:?}",
                    resource_id, expected, attempts, last_status
                );
                Error::Timeout {
                    resource_id: resource_id.to_string(),
                    expected: expected.to_string(),
                    last_status,
                    attempts,
                }
            }
            PollOutcome::Failed { status } => {
                warn!("Zone {} went to {} while waiting for {}", resource_id, status, expected);
                Error::UnexpectedState {
                    resource_id: resource_id.to_string(),
                    status,
                }
            }
            // Only reachable when the outcome kind doesn't match the expectation
            PollOutcome::Converged(zone) => Error::Other(format!(
                "Zone {} converged to {} while waiting for {}",
                resource_id, zone.status, expected
            )),
            PollOutcome::Absent => {
                Error::not_found(format!("Zone {} disappeared while waiting for {}", resource_id, expected))
            }
        }
    }
}

impl Default for StatePoller {
    fn default() -> Self {
        Self::new(&PollConfig::default())
    }
}
