//! Common test utilities
//!
//! Shared fixtures for the integration tests: a scriptable web or mobile
//! surface and handles bound to it.

#![allow(dead_code)]

use chaser_harness::driver::{DriverSession, MockNode, MockSession};
use chaser_harness::{ElementHandle, Locator};
use std::sync::Arc;
use std::time::Duration;

/// Mock surface plus the trait object the library sees
pub struct Fixture {
    pub mock: MockSession,
    pub session: Arc<dyn DriverSession>,
}

impl Fixture {
    pub fn web() -> Self {
        Self::wrap(MockSession::web())
    }

    pub fn mobile() -> Self {
        Self::wrap(MockSession::mobile())
    }

    fn wrap(mock: MockSession) -> Self {
        let session: Arc<dyn DriverSession> = Arc::new(mock.clone());
        Self { mock, session }
    }

    /// Render a node under a CSS selector; returns the node ID
    pub fn render(&self, css: &str, node: MockNode) -> String {
        self.mock.add_node(&css_locator(css), node)
    }

    /// Locator-backed handle
    pub fn handle(&self, css: &str, description: &str) -> Arc<ElementHandle> {
        Arc::new(ElementHandle::from_locator(
            self.session.clone(),
            css_locator(css),
            description,
        ))
    }

    /// Render a node after `delay` of (virtual) time
    pub fn render_after(&self, delay: Duration, css: &str, node: MockNode) {
        let mock = self.mock.clone();
        let locator = css_locator(css);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            mock.add_node(&locator, node);
        });
    }

    /// Mutate a node after `delay` of (virtual) time
    pub fn update_after<F>(&self, delay: Duration, node_id: &str, f: F)
    where
        F: FnOnce(&mut MockNode) + Send + 'static,
    {
        let mock = self.mock.clone();
        let node_id = node_id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            mock.update(&node_id, f);
        });
    }
}

pub fn css_locator(css: &str) -> Locator {
    Locator::css(css).expect("Invalid CSS locator in fixture")
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}
