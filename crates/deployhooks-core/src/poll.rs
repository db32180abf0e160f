//! Poll-until-terminal-state loop shared by every handler.
//!
//! An external operation (build, job, stack deletion) is identified by a
//! handle. The poller sleeps a fixed interval, queries the status, and repeats
//! while the status is in the caller's in-progress set.

use crate::error::Result;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Default wait between two status queries
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Wait before checking whether an earlier build is still running
pub const DEFAULT_PRECHECK_DELAY: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// Give up once another sleep would exceed this per-loop budget
    pub max_wait: Option<Duration>,
    /// Give up once another sleep would pass this point in time
    pub deadline: Option<Instant>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_wait: None,
            deadline: None,
        }
    }
}

impl PollSettings {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_wait: None,
            deadline: None,
        }
    }

    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Stop every loop of this invocation before `deadline`, keeping the earlier
    /// of an existing deadline and the new one.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Latest instant a loop started at `start` may still be sleeping.
    ///
    /// A budget too large to represent as an `Instant` imposes no limit.
    fn limit(&self, start: Instant) -> Option<Instant> {
        let by_budget = self
            .max_wait
            .and_then(|max_wait| start.checked_add(max_wait));
        match (by_budget, self.deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

/// How a poll loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<S> {
    /// First status outside the in-progress set
    Terminal(S),
    /// The queried resource no longer exists
    Absent,
    /// The wait budget ran out while the operation was still in progress
    TimedOut { last: Option<S>, waited: Duration },
}

#[derive(Debug, Clone, Copy)]
pub struct Poller {
    settings: PollSettings,
}

impl Poller {
    pub fn new(settings: PollSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    /// Sleep for `delay` unless that would overrun the deadline.
    ///
    /// Returns `false` when the deadline leaves no room for the delay.
    pub async fn pause(&self, delay: Duration) -> bool {
        if let Some(deadline) = self.settings.deadline {
            if overruns(Instant::now(), delay, deadline) {
                return false;
            }
        }
        tokio::time::sleep(delay).await;
        true
    }

    /// Poll `query` until it reports a status outside `in_progress`.
    ///
    /// `handle` only labels log lines; `query` closes over whatever it needs.
    /// A `NotFound` error ends the loop with [`PollOutcome::Absent`]; any other
    /// error is returned as-is.
    pub async fn poll<S, F, Fut>(
        &self,
        handle: &str,
        in_progress: &[S],
        mut query: F,
    ) -> Result<PollOutcome<S>>
    where
        S: PartialEq + Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<S>>,
    {
        let start = Instant::now();
        let mut last = None;
        let mut attempt: u32 = 0;

        loop {
            if let Some(limit) = self.settings.limit(start) {
                if overruns(Instant::now(), self.settings.interval, limit) {
                    let waited = start.elapsed();
                    warn!(
                        handle,
                        attempts = attempt,
                        waited_secs = waited.as_secs(),
                        "Gave up waiting for terminal status"
                    );
                    return Ok(PollOutcome::TimedOut { last, waited });
                }
            }

            info!(
                handle,
                "Waiting {}s before checking status",
                self.settings.interval.as_secs()
            );
            tokio::time::sleep(self.settings.interval).await;
            attempt += 1;

            match query().await {
                Ok(status) if in_progress.contains(&status) => {
                    info!(handle, attempt, %status, "Still in progress");
                    last = Some(status);
                }
                Ok(status) => {
                    info!(handle, attempt, %status, "Reached terminal status");
                    return Ok(PollOutcome::Terminal(status));
                }
                Err(err) if err.is_not_found() => {
                    info!(handle, attempt, error = %err, "Resource no longer exists");
                    return Ok(PollOutcome::Absent);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Whether sleeping `delay` from `now` would pass `limit`.
fn overruns(now: Instant, delay: Duration, limit: Instant) -> bool {
    now.checked_add(delay).map_or(true, |wake| wake > limit)
}
