//! Element handles
//!
//! Lazy binding of locators to live UI nodes, with caching and transparent
//! staleness recovery.

pub mod handle;

#[cfg(test)]
mod tests;

pub use handle::ElementHandle;
