//! Guarded interaction
//!
//! Every action waits for a readiness condition through the poller before
//! touching the surface, and is performed at most once.

pub mod actions;
pub mod executor;

#[cfg(test)]
mod tests;

pub use actions::Action;
pub use executor::ActionExecutor;
