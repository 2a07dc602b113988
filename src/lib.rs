//! Chaser-Harness: synchronization layer for UI test automation
//!
//! Bounded polling waits, element conditions and action preconditions on top
//! of a web (WebDriver / Chrome DevTools Protocol) or mobile (Appium) driver
//! session. Every wait yields an explicit [`Outcome`] that the test reports
//! through its [`OutcomeReporter`].

pub mod error;
pub mod config;
pub mod locator;

pub mod driver;
pub mod cdp;
pub mod webdriver;

pub mod element;
pub mod wait;
pub mod action;
pub mod report;
pub mod context;

// Re-exports
pub use action::{Action, ActionExecutor};
pub use config::Config;
pub use context::TestContext;
pub use element::ElementHandle;
pub use error::{Error, Result};
pub use locator::{Locator, Strategy, Surface};
pub use report::{OutcomeReporter, TestMetadata};
pub use wait::{Condition, Evaluation, Outcome, PollSpec, Poller, WaitContext};

/// Chaser-Harness library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
