//! Wait outcomes

use std::fmt;
use std::time::Duration;

use crate::{Error, Result};

/// What was waited for and how long it took
#[derive(Debug, Clone, PartialEq)]
pub struct WaitContext {
    /// Condition in words, e.g. "text of 'status' to equal 'Done'"
    pub condition: String,
    /// Label of the target element, if the condition has one
    pub target: Option<String>,
    /// Monotonic time spent waiting
    pub elapsed: Duration,
    /// Number of evaluations performed
    pub ticks: u32,
    /// Guarded action, if the wait preceded one
    pub action: Option<String>,
}

impl WaitContext {
    pub fn new<S: Into<String>>(condition: S, target: Option<String>) -> Self {
        Self {
            condition: condition.into(),
            target,
            elapsed: Duration::ZERO,
            ticks: 0,
            action: None,
        }
    }

    pub(crate) fn record(&mut self, ticks: u32, elapsed: Duration) {
        self.ticks = ticks;
        self.elapsed = elapsed;
    }

    pub fn with_action<S: Into<String>>(mut self, action: S) -> Self {
        self.action = Some(action.into());
        self
    }
}

/// Structured result of a wait or a guarded action.
///
/// A wait never surfaces a raw driver error on its own; the error always
/// travels with the context it happened in.
#[derive(Debug)]
pub enum Outcome {
    /// Condition held within the budget
    Success { context: WaitContext },
    /// Budget exhausted with the condition never holding
    Timeout {
        context: WaitContext,
        last_observed: Option<String>,
    },
    /// Non-recoverable error during polling
    Aborted { context: WaitContext, error: Error },
    /// Wait succeeded but the guarded action failed
    Fatal { context: WaitContext, error: Error },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn context(&self) -> &WaitContext {
        match self {
            Outcome::Success { context }
            | Outcome::Timeout { context, .. }
            | Outcome::Aborted { context, .. }
            | Outcome::Fatal { context, .. } => context,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Outcome::Aborted { error, .. } | Outcome::Fatal { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Success { .. } => "success",
            Outcome::Timeout { .. } => "timeout",
            Outcome::Aborted { .. } => "aborted",
            Outcome::Fatal { .. } => "fatal",
        }
    }

    /// Diagnostic message for anything but success
    pub fn failure_message(&self) -> Option<String> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Timeout {
                context,
                last_observed,
            } => {
                let mut message = format!(
                    "timed out after {}ms ({} polls) waiting for {}",
                    context.elapsed.as_millis(),
                    context.ticks,
                    context.condition
                );
                if let Some(observed) = last_observed {
                    message.push_str(": ");
                    message.push_str(observed);
                }
                Some(message)
            }
            Outcome::Aborted { context, error } => Some(format!(
                "aborted after {}ms ({} polls) waiting for {}: {}",
                context.elapsed.as_millis(),
                context.ticks,
                context.condition,
                error
            )),
            Outcome::Fatal { context, error } => Some(format!(
                "{} on {} failed after {}ms wait for {}: {}",
                context.action.as_deref().unwrap_or("action"),
                context.target.as_deref().unwrap_or("surface"),
                context.elapsed.as_millis(),
                context.condition,
                error
            )),
        }
    }

    /// Convert into a `Result` for `?`-style callers.
    ///
    /// Timeouts become [`Error::Timeout`] carrying the full message; aborted
    /// and fatal outcomes hand back their typed error.
    pub fn into_result(self) -> Result<WaitContext> {
        match self {
            Outcome::Success { context } => Ok(context),
            timeout @ Outcome::Timeout { .. } => Err(Error::timeout(
                timeout.failure_message().unwrap_or_default(),
            )),
            Outcome::Aborted { error, .. } | Outcome::Fatal { error, .. } => Err(error),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failure_message() {
            Some(message) => f.write_str(&message),
            None => {
                let context = self.context();
                write!(
                    f,
                    "{} after {}ms ({} polls)",
                    context.condition,
                    context.elapsed.as_millis(),
                    context.ticks
                )
            }
        }
    }
}
