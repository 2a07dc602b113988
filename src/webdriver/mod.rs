//! WebDriver surface driver
//!
//! Web (Selenium) and mobile (Appium) sessions over the W3C wire protocol.
//! Session creation and capability negotiation stay with the host; this
//! module attaches to a session that already exists.

pub mod strategy;
pub mod transport;
pub mod session;


pub use session::{WebDriverElement, WebDriverSession, ELEMENT_KEY};
pub use strategy::{to_wire, WireLocator};
pub use transport::{map_wire_error, HttpTransport, Verb, WireTransport};
