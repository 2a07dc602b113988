//! Per-test context
//!
//! Bundles the driver session, configuration, executor and reporter a test
//! works with. Everything is passed explicitly so tests running in parallel
//! never share state.

use std::sync::Arc;
use std::time::Duration;

use crate::action::ActionExecutor;
use crate::config::Config;
use crate::driver::DriverSession;
use crate::element::ElementHandle;
use crate::locator::Locator;
use crate::report::OutcomeReporter;
use crate::wait::{Condition, Outcome};
use crate::Result;

/// Test context
#[derive(Debug, Clone)]
pub struct TestContext {
    session: Arc<dyn DriverSession>,
    config: Arc<Config>,
    executor: ActionExecutor,
    reporter: OutcomeReporter,
}

impl TestContext {
    /// Context failing the test through a panic, with config-driven timing
    pub fn new(session: Arc<dyn DriverSession>, config: Config) -> Self {
        let executor = ActionExecutor::from_config(&config);
        Self {
            session,
            config: Arc::new(config),
            executor,
            reporter: OutcomeReporter::default(),
        }
    }

    pub fn with_reporter(mut self, reporter: OutcomeReporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_executor(mut self, executor: ActionExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn session(&self) -> &Arc<dyn DriverSession> {
        &self.session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn executor(&self) -> &ActionExecutor {
        &self.executor
    }

    pub fn reporter(&self) -> &OutcomeReporter {
        &self.reporter
    }

    /// Locator-backed handle on this session
    pub fn element<S: Into<String>>(&self, locator: Locator, description: S) -> Arc<ElementHandle> {
        Arc::new(ElementHandle::from_locator(
            self.session.clone(),
            locator,
            description,
        ))
    }

    /// Parse a `strategy=value` locator for this session's surface
    pub fn locate<S: Into<String>>(&self, locator: &str, description: S) -> Result<Arc<ElementHandle>> {
        let locator = Locator::parse(locator, self.session.surface())?;
        Ok(self.element(locator, description))
    }

    /// Snapshot all current matches
    pub async fn elements(&self, locator: &Locator, description: &str) -> Result<Vec<ElementHandle>> {
        ElementHandle::find_all(self.session.clone(), locator, description).await
    }

    /// Report an outcome; returns whether it passed
    pub fn check(&self, outcome: &Outcome) -> bool {
        self.reporter.report(outcome)
    }

    pub async fn wait(&self, condition: Condition) -> bool {
        let outcome = self.executor.wait(condition).await;
        self.check(&outcome)
    }

    pub async fn wait_for(&self, condition: Condition, timeout: Duration) -> bool {
        let outcome = self.executor.poller().wait(condition, timeout).await;
        self.check(&outcome)
    }

    pub async fn click(&self, handle: &Arc<ElementHandle>) -> bool {
        let outcome = self.executor.click(handle).await;
        self.check(&outcome)
    }

    pub async fn tap(&self, handle: &Arc<ElementHandle>) -> bool {
        let outcome = self.executor.tap(handle).await;
        self.check(&outcome)
    }

    /// Append `text` to the field's current value
    pub async fn type_text(&self, handle: &Arc<ElementHandle>, text: &str) -> bool {
        let outcome = self.executor.type_text(handle, text).await;
        self.check(&outcome)
    }

    /// Replace the field's value with `text`
    pub async fn clear_and_type(&self, handle: &Arc<ElementHandle>, text: &str) -> bool {
        let outcome = self.executor.clear_and_type(handle, text).await;
        self.check(&outcome)
    }
}
