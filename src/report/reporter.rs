//! Outcome reporter

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error};

use super::sink::{FailureSink, PanicSink};
use crate::wait::Outcome;

/// Per-test metadata rendered in front of every failure message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestMetadata {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl TestMetadata {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_field<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// `[name #tag key=value]`
    pub fn prefix(&self) -> String {
        let mut parts = vec![self.name.clone()];
        parts.extend(self.tags.iter().map(|t| format!("#{}", t)));
        parts.extend(self.fields.iter().map(|(k, v)| format!("{}={}", k, v)));
        format!("[{}]", parts.join(" "))
    }
}

/// Turns outcomes into pass/fail signals on a single sink
#[derive(Debug, Clone)]
pub struct OutcomeReporter {
    sink: Arc<dyn FailureSink>,
    metadata: Option<TestMetadata>,
}

impl Default for OutcomeReporter {
    fn default() -> Self {
        Self::new(Arc::new(PanicSink))
    }
}

impl OutcomeReporter {
    pub fn new(sink: Arc<dyn FailureSink>) -> Self {
        Self {
            sink,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: TestMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn metadata(&self) -> Option<&TestMetadata> {
        self.metadata.as_ref()
    }

    /// Message the sink would receive for this outcome
    pub fn message_for(&self, outcome: &Outcome) -> Option<String> {
        let message = outcome.failure_message()?;
        Some(match &self.metadata {
            Some(metadata) => format!("{} {}", metadata.prefix(), message),
            None => message,
        })
    }

    /// Report an outcome. Success is a no-op; anything else reaches the
    /// sink exactly once. Returns whether the outcome passed.
    pub fn report(&self, outcome: &Outcome) -> bool {
        match self.message_for(outcome) {
            None => {
                debug!("Passed: {}", outcome);
                true
            }
            Some(message) => {
                error!("Reporting {} outcome: {}", outcome.kind(), message);
                self.sink.fail(&message);
                false
            }
        }
    }
}
