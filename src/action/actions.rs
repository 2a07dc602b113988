//! Action kinds

use std::fmt;
use std::sync::Arc;

use crate::driver::{LiveElement, SwipeDirection};
use crate::element::ElementHandle;
use crate::wait::Condition;
use crate::Result;

/// UI action performed after a readiness wait
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Click,
    Tap,
    /// Append keystrokes to the current value
    Type(String),
    Clear,
    ClearAndType(String),
    Hover,
    ScrollIntoView,
    Swipe(SwipeDirection),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Click => "click",
            Action::Tap => "tap",
            Action::Type(_) => "type",
            Action::Clear => "clear",
            Action::ClearAndType(_) => "clear and type",
            Action::Hover => "hover",
            Action::ScrollIntoView => "scroll into view",
            Action::Swipe(_) => "swipe",
        }
    }

    /// Readiness condition used when the caller supplies none
    pub fn default_precondition(&self, handle: Arc<ElementHandle>) -> Condition {
        match self {
            Action::Click | Action::Tap | Action::Type(_) | Action::Clear | Action::ClearAndType(_) => {
                Condition::clickable(handle)
            }
            Action::Hover | Action::Swipe(_) => Condition::displayed(handle),
            // Off-screen nodes may report zero size until scrolled to
            Action::ScrollIntoView => Condition::exists(handle),
        }
    }

    /// Run the action once against a resolved element
    pub async fn apply(&self, element: &dyn LiveElement) -> Result<()> {
        match self {
            Action::Click => element.click().await,
            Action::Tap => element.tap().await,
            Action::Type(text) => element.send_keys(text).await,
            Action::Clear => element.clear().await,
            Action::ClearAndType(text) => {
                element.clear().await?;
                element.send_keys(text).await
            }
            Action::Hover => element.hover().await,
            Action::ScrollIntoView => element.scroll_into_view().await,
            Action::Swipe(direction) => element.swipe(*direction).await,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Type(text) | Action::ClearAndType(text) => {
                write!(f, "{} '{}'", self.name(), text)
            }
            Action::Swipe(direction) => write!(f, "swipe {}", direction),
            other => f.write_str(other.name()),
        }
    }
}
