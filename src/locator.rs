//! Locator model
//!
//! Immutable descriptions of how to find UI nodes on a web DOM or a mobile
//! view tree. A locator carries no behavior; surface drivers translate it
//! into their own query language.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// The UI system under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// Browser DOM
    #[default]
    Web,
    /// Native app view tree
    Mobile,
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Web => "web",
            Surface::Mobile => "mobile",
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Surface {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" | "browser" => Ok(Surface::Web),
            "mobile" | "app" => Ok(Surface::Mobile),
            other => Err(Error::configuration(format!("Unknown surface: {}", other))),
        }
    }
}

/// Lookup strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Id,
    Name,
    ClassName,
    TagName,
    Css,
    XPath,
    LinkText,
    PartialLinkText,
    /// Any node whose visible text contains the value
    TextContains,
    AccessibilityId,
    AndroidUiAutomator,
    IosPredicate,
    IosClassChain,
}

impl Strategy {
    /// All strategies, in declaration order
    pub const ALL: [Strategy; 13] = [
        Strategy::Id,
        Strategy::Name,
        Strategy::ClassName,
        Strategy::TagName,
        Strategy::Css,
        Strategy::XPath,
        Strategy::LinkText,
        Strategy::PartialLinkText,
        Strategy::TextContains,
        Strategy::AccessibilityId,
        Strategy::AndroidUiAutomator,
        Strategy::IosPredicate,
        Strategy::IosClassChain,
    ];

    /// Short name used in `strategy=value` strings
    pub const fn as_str(&self) -> &'static str {
        match self {
            Strategy::Id => "id",
            Strategy::Name => "name",
            Strategy::ClassName => "class",
            Strategy::TagName => "tag",
            Strategy::Css => "css",
            Strategy::XPath => "xpath",
            Strategy::LinkText => "link",
            Strategy::PartialLinkText => "partial_link",
            Strategy::TextContains => "text",
            Strategy::AccessibilityId => "accessibility_id",
            Strategy::AndroidUiAutomator => "uiautomator",
            Strategy::IosPredicate => "ios_predicate",
            Strategy::IosClassChain => "ios_class_chain",
        }
    }

    /// Whether the strategy can be evaluated on the given surface
    pub const fn supports(&self, surface: Surface) -> bool {
        match surface {
            Surface::Web => matches!(
                self,
                Strategy::Id
                    | Strategy::Name
                    | Strategy::ClassName
                    | Strategy::TagName
                    | Strategy::Css
                    | Strategy::XPath
                    | Strategy::LinkText
                    | Strategy::PartialLinkText
                    | Strategy::TextContains
            ),
            Surface::Mobile => matches!(
                self,
                Strategy::Id
                    | Strategy::Name
                    | Strategy::ClassName
                    | Strategy::XPath
                    | Strategy::AccessibilityId
                    | Strategy::TextContains
                    | Strategy::AndroidUiAutomator
                    | Strategy::IosPredicate
                    | Strategy::IosClassChain
            ),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        let strategy = match normalized.as_str() {
            "id" => Strategy::Id,
            "name" => Strategy::Name,
            "class" | "class_name" => Strategy::ClassName,
            "tag" | "tag_name" => Strategy::TagName,
            "css" => Strategy::Css,
            "xpath" => Strategy::XPath,
            "link" | "link_text" => Strategy::LinkText,
            "partial_link" | "partial_link_text" => Strategy::PartialLinkText,
            "text" | "text_contains" => Strategy::TextContains,
            "accessibility_id" | "a11y" => Strategy::AccessibilityId,
            "uiautomator" | "android_uiautomator" => Strategy::AndroidUiAutomator,
            "ios_predicate" => Strategy::IosPredicate,
            "ios_class_chain" => Strategy::IosClassChain,
            other => {
                return Err(Error::invalid_locator(format!(
                    "Unknown locator strategy: {}",
                    other
                )))
            }
        };
        Ok(strategy)
    }
}

/// How to find zero or more nodes on a surface.
///
/// Fields are private: once built through [`Locator::new`] the
/// `(strategy, value)` pair is known to be non-empty and valid for the
/// surface, and it never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawLocator")]
pub struct Locator {
    strategy: Strategy,
    value: String,
    surface: Surface,
}

#[derive(Deserialize)]
struct RawLocator {
    strategy: Strategy,
    value: String,
    #[serde(default)]
    surface: Surface,
}

impl TryFrom<RawLocator> for Locator {
    type Error = Error;

    fn try_from(raw: RawLocator) -> Result<Self> {
        Locator::new(raw.strategy, raw.value, raw.surface)
    }
}

impl Locator {
    /// Build a locator, rejecting empty values and strategies the surface
    /// cannot evaluate
    pub fn new<S: Into<String>>(strategy: Strategy, value: S, surface: Surface) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(Error::invalid_locator(format!(
                "Empty value for {} locator",
                strategy
            )));
        }
        if !strategy.supports(surface) {
            return Err(Error::invalid_locator(format!(
                "Strategy '{}' is not available on the {} surface",
                strategy, surface
            )));
        }
        Ok(Self {
            strategy,
            value,
            surface,
        })
    }

    /// Web locator
    pub fn web<S: Into<String>>(strategy: Strategy, value: S) -> Result<Self> {
        Self::new(strategy, value, Surface::Web)
    }

    /// Mobile locator
    pub fn mobile<S: Into<String>>(strategy: Strategy, value: S) -> Result<Self> {
        Self::new(strategy, value, Surface::Mobile)
    }

    pub fn css<S: Into<String>>(selector: S) -> Result<Self> {
        Self::web(Strategy::Css, selector)
    }

    pub fn xpath<S: Into<String>>(expression: S) -> Result<Self> {
        Self::web(Strategy::XPath, expression)
    }

    pub fn id<S: Into<String>>(id: S) -> Result<Self> {
        Self::web(Strategy::Id, id)
    }

    pub fn accessibility_id<S: Into<String>>(id: S) -> Result<Self> {
        Self::mobile(Strategy::AccessibilityId, id)
    }

    /// Parse `strategy=value` for the given surface
    pub fn parse(input: &str, surface: Surface) -> Result<Self> {
        let (strategy, value) = input.split_once('=').ok_or_else(|| {
            Error::invalid_locator(format!("Expected 'strategy=value', got '{}'", input))
        })?;
        Self::new(strategy.parse::<Strategy>()?, value, surface)
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy, self.value)
    }
}

/// Web locators parse by default
impl FromStr for Locator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, Surface::Web)
    }
}
