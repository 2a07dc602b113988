//! Condition poller
//!
//! Repeatedly evaluates a [`Condition`] on a fixed cadence until it holds,
//! a fatal error occurs, or the time budget runs out.

use std::cmp::min;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, instrument, warn};

use super::condition::{Condition, Evaluation};
use super::outcome::{Outcome, WaitContext};
use crate::config::Config;
use crate::locator::Surface;
use crate::{Error, Result};

/// Default delay between evaluations
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One wait: what to check, for how long, how often
#[derive(Debug, Clone)]
pub struct PollSpec {
    pub condition: Condition,
    pub timeout: Duration,
    pub interval: Duration,
    /// Bound on a single evaluation, independent from `timeout`
    pub call_timeout: Option<Duration>,
}

impl PollSpec {
    pub fn new(condition: Condition, timeout: Duration) -> Self {
        Self {
            condition,
            timeout,
            interval: DEFAULT_POLL_INTERVAL,
            call_timeout: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_call_timeout(mut self, bound: Duration) -> Self {
        self.call_timeout = Some(bound);
        self
    }

    /// Number of intervals that fit in the budget, rounded up and at least one
    pub fn intervals(&self) -> Result<u32> {
        if self.interval.is_zero() {
            return Err(Error::configuration("poll interval must be greater than zero"));
        }
        let timeout = self.timeout.as_nanos();
        let interval = self.interval.as_nanos();
        let intervals = timeout.div_ceil(interval).max(1);
        Ok(u32::try_from(intervals).unwrap_or(u32::MAX))
    }
}

/// Runs [`PollSpec`]s. Each poll owns its loop and timer, so one poller can
/// serve any number of concurrent waits.
#[derive(Debug, Clone)]
pub struct Poller {
    interval: Duration,
    call_timeout: Option<Duration>,
    web_timeout: Duration,
    mobile_timeout: Duration,
}

impl Default for Poller {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.poll_interval(),
            call_timeout: Some(config.call_timeout()),
            web_timeout: config.default_timeout(Surface::Web),
            mobile_timeout: config.default_timeout(Surface::Mobile),
        }
    }

    pub fn with_call_timeout(mut self, bound: Option<Duration>) -> Self {
        self.call_timeout = bound;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Budget used when the caller gives none
    pub fn default_timeout(&self, surface: Surface) -> Duration {
        match surface {
            Surface::Web => self.web_timeout,
            Surface::Mobile => self.mobile_timeout,
        }
    }

    /// Build a spec with this poller's cadence and call bound
    pub fn spec(&self, condition: Condition, timeout: Duration) -> PollSpec {
        let spec = PollSpec::new(condition, timeout).with_interval(self.interval);
        match self.call_timeout {
            Some(bound) => spec.with_call_timeout(bound),
            None => spec,
        }
    }

    /// Wait for `condition` with this poller's settings
    pub async fn wait(&self, condition: Condition, timeout: Duration) -> Outcome {
        self.poll(&self.spec(condition, timeout)).await
    }

    /// Poll until the condition holds, a fatal error occurs, or the budget
    /// runs out.
    ///
    /// The first evaluation runs immediately. After a failed evaluation the
    /// poller sleeps for the interval, shortened to whatever budget remains,
    /// so the last evaluation lands on the deadline. Each evaluation is cut
    /// off at the call bound (the spec's, else this poller's) and at
    /// whatever remains of `timeout + interval`, so total elapsed time never
    /// exceeds `timeout + interval` even when a check hangs.
    #[instrument(skip_all, fields(condition = %spec.condition.name()))]
    pub async fn poll(&self, spec: &PollSpec) -> Outcome {
        let started = Instant::now();
        let mut context = WaitContext::new(spec.condition.describe(), target_of(&spec.condition));

        let intervals = match spec.intervals() {
            Ok(n) => n,
            Err(error) => {
                warn!("Refusing to poll {}: {}", context.condition, error);
                return Outcome::Aborted { context, error };
            }
        };

        let call_bound = spec.call_timeout.or(self.call_timeout);
        let hard_limit = spec.timeout.saturating_add(spec.interval);
        let mut last_observed: Option<String> = None;
        let mut tick: u32 = 0;

        loop {
            let remaining = hard_limit.saturating_sub(started.elapsed());
            let bound = call_bound.map_or(remaining, |call| min(call, remaining));
            let evaluation = evaluate_bounded(&spec.condition, bound).await;
            tick += 1;
            context.record(tick, started.elapsed());

            match evaluation {
                Evaluation::Met => {
                    info!(
                        "Satisfied {} after {}ms ({} polls)",
                        context.condition,
                        context.elapsed.as_millis(),
                        tick
                    );
                    return Outcome::Success { context };
                }
                Evaluation::Fatal(error) => {
                    warn!("Aborting wait for {}: {}", context.condition, error);
                    return Outcome::Aborted { context, error };
                }
                Evaluation::NotMet { detail } => {
                    debug!("Poll {}/{} not met: {:?}", tick, intervals + 1, detail);
                    if detail.is_some() {
                        last_observed = detail;
                    }
                }
                Evaluation::Recoverable(error) => {
                    debug!("Poll {}/{} recoverable error: {}", tick, intervals + 1, error);
                    last_observed = Some(error.to_string());
                }
            }

            let elapsed = started.elapsed();
            if elapsed >= spec.timeout || tick > intervals {
                warn!(
                    "Timed out after {}ms ({} polls) waiting for {}",
                    elapsed.as_millis(),
                    tick,
                    context.condition
                );
                return Outcome::Timeout {
                    context,
                    last_observed,
                };
            }

            sleep(min(spec.interval, spec.timeout - elapsed)).await;
        }
    }
}

async fn evaluate_bounded(condition: &Condition, bound: Duration) -> Evaluation {
    match timeout(bound, condition.evaluate()).await {
        Ok(evaluation) => evaluation,
        Err(_) => Evaluation::Recoverable(Error::timeout(format!(
            "evaluation of {} exceeded {}ms",
            condition.name(),
            bound.as_millis()
        ))),
    }
}

fn target_of(condition: &Condition) -> Option<String> {
    condition.element().map(|element| element.label())
}
