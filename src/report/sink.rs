//! Failure sinks
//!
//! The boundary to the host test framework: a sink receives one
//! human-readable message per failed outcome.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Mutex;
use tracing::error;

/// Receives test-failure signals
pub trait FailureSink: Send + Sync + fmt::Debug {
    fn fail(&self, message: &str);
}

/// Fails the running test the way `assert!` does
#[derive(Debug, Default, Clone, Copy)]
pub struct PanicSink;

impl FailureSink for PanicSink {
    fn fail(&self, message: &str) {
        panic!("{}", message);
    }
}

/// Logs failures and lets the test continue
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl FailureSink for TracingSink {
    fn fail(&self, message: &str) {
        error!("{}", message);
    }
}

/// One collected failure
#[derive(Debug, Clone, PartialEq)]
pub struct FailureRecord {
    pub message: String,
    pub recorded_at: DateTime<Utc>,
}

/// Collects soft failures for inspection at the end of a test
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<FailureRecord>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<FailureRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.message).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

impl FailureSink for RecordingSink {
    fn fail(&self, message: &str) {
        let record = FailureRecord {
            message: message.to_string(),
            recorded_at: Utc::now(),
        };
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}
