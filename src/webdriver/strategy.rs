//! Locator translation to W3C / Appium `using` strategies

use crate::locator::{Locator, Strategy, Surface};
use crate::{Error, Result};

/// Wire form of a locator: `(using, value)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireLocator {
    pub using: &'static str,
    pub value: String,
}

impl WireLocator {
    fn new(using: &'static str, value: String) -> Self {
        Self { using, value }
    }
}

/// Quote a string as an XPath 1.0 literal
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

fn css_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Translate a locator for a session on `surface`
pub fn to_wire(locator: &Locator, surface: Surface) -> Result<WireLocator> {
    if locator.surface() != surface {
        return Err(Error::invalid_locator(format!(
            "{} locator used on a {} session",
            locator.surface(),
            surface
        )));
    }

    let value = locator.value().to_string();
    let wire = match (surface, locator.strategy()) {
        // W3C dropped id/name/class; express them as CSS
        (Surface::Web, Strategy::Id) => WireLocator::new("css selector", format!("[id={}]", css_string(&value))),
        (Surface::Web, Strategy::Name) => {
            WireLocator::new("css selector", format!("[name={}]", css_string(&value)))
        }
        (Surface::Web, Strategy::ClassName) => {
            if value.split_whitespace().count() != 1 {
                return Err(Error::invalid_locator(format!(
                    "compound class name '{}' is not allowed",
                    value
                )));
            }
            WireLocator::new("css selector", format!("[class~={}]", css_string(&value)))
        }
        (Surface::Web, Strategy::TagName) => WireLocator::new("tag name", value),
        (Surface::Web, Strategy::Css) => WireLocator::new("css selector", value),
        (_, Strategy::XPath) => WireLocator::new("xpath", value),
        (Surface::Web, Strategy::LinkText) => WireLocator::new("link text", value),
        (Surface::Web, Strategy::PartialLinkText) => WireLocator::new("partial link text", value),
        (Surface::Web, Strategy::TextContains) => WireLocator::new(
            "xpath",
            format!("//*[contains(text(), {})]", xpath_literal(&value)),
        ),

        (Surface::Mobile, Strategy::Id) => WireLocator::new("id", value),
        (Surface::Mobile, Strategy::Name) => WireLocator::new("name", value),
        (Surface::Mobile, Strategy::ClassName) => WireLocator::new("class name", value),
        (Surface::Mobile, Strategy::AccessibilityId) => WireLocator::new("accessibility id", value),
        (Surface::Mobile, Strategy::AndroidUiAutomator) => {
            WireLocator::new("-android uiautomator", value)
        }
        (Surface::Mobile, Strategy::IosPredicate) => WireLocator::new("-ios predicate string", value),
        (Surface::Mobile, Strategy::IosClassChain) => WireLocator::new("-ios class chain", value),
        (Surface::Mobile, Strategy::TextContains) => {
            let literal = xpath_literal(&value);
            WireLocator::new(
                "xpath",
                format!(
                    "//*[contains(@text, {0}) or contains(@label, {0}) or contains(@name, {0})]",
                    literal
                ),
            )
        }

        (surface, strategy) => {
            return Err(Error::invalid_locator(format!(
                "{} is not supported on {}",
                strategy.as_str(),
                surface
            )))
        }
    };
    Ok(wire)
}
