//! Periodic execution of collectors.
//!
//! Every collector gets its own [`PeriodicTask`] running on its own tokio
//! task. A task runs a cycle, logs any error, sleeps its interval and
//! repeats, forever. Tasks never wait on each other, so a collector stuck
//! in a long retry only delays itself.

use std::time::Duration;

use crate::collectors::{CollectError, Collector};
use crate::fetch::RetryPolicy;

/// Interval-driven runner for one [`Collector`].
#[derive(Clone, Debug)]
pub struct PeriodicTask {
    name: &'static str,
    interval: Duration,
    cycle_retry: Option<RetryPolicy>,
}

impl PeriodicTask {
    /// Creates a task running every `interval`, raised to `floor` (with a
    /// warning) when configured lower.
    pub fn new(name: &'static str, interval: Duration, floor: Duration) -> Self {
        let interval = if interval < floor {
            tracing::warn!(
                task = name,
                configured_secs = interval.as_secs(),
                minimum_secs = floor.as_secs(),
                "scrape interval below minimum, using {}s",
                floor.as_secs()
            );
            floor
        } else {
            interval
        };

        Self {
            name,
            interval,
            cycle_retry: None,
        }
    }

    /// Re-runs a failed cycle under `policy` before the cycle counts as
    /// done and the interval sleep starts.
    pub fn with_cycle_retry(mut self, policy: RetryPolicy) -> Self {
        self.cycle_retry = Some(policy);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Effective interval after clamping.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs one cycle, including cycle retries.
    pub async fn run_cycle<C: Collector + ?Sized>(
        &self,
        collector: &C,
    ) -> Result<(), CollectError> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let err = match collector.collect().await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };

            match self.cycle_retry {
                Some(policy) if policy.allows_retry(attempts) => {
                    tracing::warn!(
                        task = self.name,
                        collector = collector.name(),
                        attempt = attempts,
                        retry_in_secs = policy.delay.as_secs_f64(),
                        "cycle failed: {err}"
                    );
                    tokio::time::sleep(policy.delay).await;
                }
                _ => return Err(err),
            }
        }
    }

    /// Runs `collector` forever. The first cycle starts immediately.
    pub async fn run<C: Collector + ?Sized>(self, collector: &C) {
        tracing::info!(
            task = self.name,
            collector = collector.name(),
            interval_secs = self.interval.as_secs(),
            "collector started"
        );

        loop {
            if let Err(e) = self.run_cycle(collector).await {
                tracing::warn!(
                    task = self.name,
                    collector = collector.name(),
                    "collection cycle failed: {e}"
                );
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Spawns [`PeriodicTask::run`] onto the current runtime.
    pub fn spawn<C>(self, collector: C) -> tokio::task::JoinHandle<()>
    where
        C: Collector + 'static,
    {
        tokio::spawn(async move { self.run(&collector).await })
    }
}
