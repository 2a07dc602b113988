//! Condition evaluator
//!
//! Named readiness predicates over an element handle or the whole surface.
//! Predicates only read; the cached reference of a handle is touched solely
//! through the handle's own resolution logic.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::driver::{DriverSession, LiveElement};
use crate::element::ElementHandle;
use crate::Error;

/// Result of one evaluation of a condition
#[derive(Debug)]
pub enum Evaluation {
    /// Condition holds
    Met,
    /// Condition does not hold yet; `detail` describes what was observed
    NotMet { detail: Option<String> },
    /// Transient failure (not rendered yet, stale reference); retry
    Recoverable(Error),
    /// Defect such as a malformed locator or a broken script; stop polling
    Fatal(Error),
}

impl Evaluation {
    pub fn not_met() -> Self {
        Evaluation::NotMet { detail: None }
    }

    pub fn not_met_with<S: Into<String>>(detail: S) -> Self {
        Evaluation::NotMet {
            detail: Some(detail.into()),
        }
    }

    /// Classify an error by [`Error::is_recoverable`]
    pub fn from_error(error: Error) -> Self {
        if error.is_recoverable() {
            Evaluation::Recoverable(error)
        } else {
            Evaluation::Fatal(error)
        }
    }

    pub fn is_met(&self) -> bool {
        matches!(self, Evaluation::Met)
    }
}

type CheckFn = dyn Fn() -> BoxFuture<'static, Evaluation> + Send + Sync;

/// Readiness condition
#[derive(Clone)]
pub enum Condition {
    /// Element can be found
    Exists(Arc<ElementHandle>),
    /// Element is found, flagged visible and has a non-zero box
    IsDisplayed(Arc<ElementHandle>),
    /// Element is absent, or present with no visible box
    NotDisplayed(Arc<ElementHandle>),
    IsEnabled(Arc<ElementHandle>),
    /// Displayed and enabled
    IsClickable(Arc<ElementHandle>),
    AttributeEquals {
        element: Arc<ElementHandle>,
        name: String,
        expected: String,
    },
    TextEquals {
        element: Arc<ElementHandle>,
        expected: String,
    },
    TextNotEquals {
        element: Arc<ElementHandle>,
        expected: String,
    },
    TextContains {
        element: Arc<ElementHandle>,
        expected: String,
    },
    /// Case-insensitive substring match on the current location
    UrlContains {
        session: Arc<dyn DriverSession>,
        substring: String,
    },
    ScriptReturnsTrue {
        session: Arc<dyn DriverSession>,
        script: String,
    },
    /// Host-defined predicate
    Custom { name: String, check: Arc<CheckFn> },
}

impl Condition {
    pub fn exists(element: Arc<ElementHandle>) -> Self {
        Condition::Exists(element)
    }

    pub fn displayed(element: Arc<ElementHandle>) -> Self {
        Condition::IsDisplayed(element)
    }

    pub fn not_displayed(element: Arc<ElementHandle>) -> Self {
        Condition::NotDisplayed(element)
    }

    pub fn enabled(element: Arc<ElementHandle>) -> Self {
        Condition::IsEnabled(element)
    }

    pub fn clickable(element: Arc<ElementHandle>) -> Self {
        Condition::IsClickable(element)
    }

    pub fn attribute_equals<N: Into<String>, V: Into<String>>(
        element: Arc<ElementHandle>,
        name: N,
        expected: V,
    ) -> Self {
        Condition::AttributeEquals {
            element,
            name: name.into(),
            expected: expected.into(),
        }
    }

    pub fn text_equals<S: Into<String>>(element: Arc<ElementHandle>, expected: S) -> Self {
        Condition::TextEquals {
            element,
            expected: expected.into(),
        }
    }

    pub fn text_not_equals<S: Into<String>>(element: Arc<ElementHandle>, expected: S) -> Self {
        Condition::TextNotEquals {
            element,
            expected: expected.into(),
        }
    }

    pub fn text_contains<S: Into<String>>(element: Arc<ElementHandle>, expected: S) -> Self {
        Condition::TextContains {
            element,
            expected: expected.into(),
        }
    }

    pub fn url_contains<S: Into<String>>(session: Arc<dyn DriverSession>, substring: S) -> Self {
        Condition::UrlContains {
            session,
            substring: substring.into(),
        }
    }

    pub fn script_returns_true<S: Into<String>>(session: Arc<dyn DriverSession>, script: S) -> Self {
        Condition::ScriptReturnsTrue {
            session,
            script: script.into(),
        }
    }

    /// Wrap an async closure as a named condition
    pub fn custom<N, F, Fut>(name: N, check: F) -> Self
    where
        N: Into<String>,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Evaluation> + Send + 'static,
    {
        Condition::Custom {
            name: name.into(),
            check: Arc::new(move || check().boxed()),
        }
    }

    /// Short predicate name
    pub fn name(&self) -> &str {
        match self {
            Condition::Exists(_) => "Exists",
            Condition::IsDisplayed(_) => "IsDisplayed",
            Condition::NotDisplayed(_) => "NotDisplayed",
            Condition::IsEnabled(_) => "IsEnabled",
            Condition::IsClickable(_) => "IsClickable",
            Condition::AttributeEquals { .. } => "AttributeEquals",
            Condition::TextEquals { .. } => "TextEquals",
            Condition::TextNotEquals { .. } => "TextNotEquals",
            Condition::TextContains { .. } => "TextContains",
            Condition::UrlContains { .. } => "UrlContains",
            Condition::ScriptReturnsTrue { .. } => "ScriptReturnsTrue",
            Condition::Custom { name, .. } => name,
        }
    }

    /// Element the condition is about, if any
    pub fn element(&self) -> Option<&Arc<ElementHandle>> {
        match self {
            Condition::Exists(element)
            | Condition::IsDisplayed(element)
            | Condition::NotDisplayed(element)
            | Condition::IsEnabled(element)
            | Condition::IsClickable(element)
            | Condition::AttributeEquals { element, .. }
            | Condition::TextEquals { element, .. }
            | Condition::TextNotEquals { element, .. }
            | Condition::TextContains { element, .. } => Some(element),
            _ => None,
        }
    }

    /// Session the condition reads from, if it names one
    pub fn session(&self) -> Option<&Arc<dyn DriverSession>> {
        match self {
            Condition::UrlContains { session, .. } | Condition::ScriptReturnsTrue { session, .. } => {
                Some(session)
            }
            other => other.element().map(|element| element.session()),
        }
    }

    /// What is being waited for, in words
    pub fn describe(&self) -> String {
        let label = || self.element().map(|e| e.label()).unwrap_or_default();
        match self {
            Condition::Exists(_) => format!("{} to exist", label()),
            Condition::IsDisplayed(_) => format!("{} to be displayed", label()),
            Condition::NotDisplayed(_) => format!("{} to not be displayed", label()),
            Condition::IsEnabled(_) => format!("{} to be enabled", label()),
            Condition::IsClickable(_) => format!("{} to be clickable", label()),
            Condition::AttributeEquals { name, expected, .. } => {
                format!("attribute '{}' of {} to equal '{}'", name, label(), expected)
            }
            Condition::TextEquals { expected, .. } => {
                format!("text of {} to equal '{}'", label(), expected)
            }
            Condition::TextNotEquals { expected, .. } => {
                format!("text of {} to differ from '{}'", label(), expected)
            }
            Condition::TextContains { expected, .. } => {
                format!("text of {} to contain '{}'", label(), expected)
            }
            Condition::UrlContains { substring, .. } => {
                format!("location to contain '{}'", substring)
            }
            Condition::ScriptReturnsTrue { script, .. } => {
                format!("script `{}` to return true", abbreviate(script, 60))
            }
            Condition::Custom { name, .. } => name.clone(),
        }
    }

    /// Evaluate once
    pub async fn evaluate(&self) -> Evaluation {
        match self {
            Condition::Exists(element) => match element.resolve().await {
                Ok(_) => Evaluation::Met,
                Err(Error::NotFound(_)) => Evaluation::not_met_with("element not found"),
                Err(e) => Evaluation::from_error(e),
            },

            Condition::IsDisplayed(element) => match element.with_live(visible).await {
                Ok(true) => Evaluation::Met,
                Ok(false) => Evaluation::not_met_with("element present but not displayed"),
                Err(Error::NotFound(_)) => Evaluation::not_met_with("element not found"),
                Err(e) => Evaluation::from_error(e),
            },

            Condition::NotDisplayed(element) => match element.with_live(visible).await {
                Ok(false) => Evaluation::Met,
                Ok(true) => Evaluation::not_met_with("element still displayed"),
                // A node that is gone, or whose snapshot went away, is not displayed
                Err(Error::NotFound(_)) | Err(Error::Stale(_)) | Err(Error::Unresolvable(_)) => {
                    Evaluation::Met
                }
                Err(e) => Evaluation::from_error(e),
            },

            Condition::IsEnabled(element) => {
                match element.with_live(|el| async move { el.is_enabled().await }).await {
                    Ok(true) => Evaluation::Met,
                    Ok(false) => Evaluation::not_met_with("element disabled"),
                    Err(Error::NotFound(_)) => Evaluation::not_met_with("element not found"),
                    Err(e) => Evaluation::from_error(e),
                }
            }

            Condition::IsClickable(element) => match element.with_live(clickable_state).await {
                Ok((true, true)) => Evaluation::Met,
                Ok((false, _)) => Evaluation::not_met_with("element present but not displayed"),
                Ok((true, false)) => Evaluation::not_met_with("element displayed but disabled"),
                Err(Error::NotFound(_)) => Evaluation::not_met_with("element not found"),
                Err(e) => Evaluation::from_error(e),
            },

            Condition::AttributeEquals {
                element,
                name,
                expected,
            } => {
                let read = element
                    .with_live(|el| {
                        let name = name.clone();
                        async move { el.attribute(&name).await }
                    })
                    .await;
                match read {
                    Ok(Some(actual)) if &actual == expected => Evaluation::Met,
                    Ok(actual) => Evaluation::not_met_with(format!(
                        "expected '{}', last observed {}",
                        expected,
                        quoted_or_absent(actual.as_deref())
                    )),
                    Err(e) => Evaluation::from_error(e),
                }
            }

            Condition::TextEquals { element, expected } => match read_text(element).await {
                Ok(actual) if &actual == expected => Evaluation::Met,
                Ok(actual) => Evaluation::not_met_with(format!(
                    "expected '{}', last observed '{}'",
                    expected, actual
                )),
                Err(e) => Evaluation::from_error(e),
            },

            Condition::TextNotEquals { element, expected } => match read_text(element).await {
                Ok(actual) if &actual != expected => Evaluation::Met,
                Ok(_) => Evaluation::not_met_with(format!("text still '{}'", expected)),
                Err(e) => Evaluation::from_error(e),
            },

            Condition::TextContains { element, expected } => match read_text(element).await {
                Ok(actual) if actual.contains(expected.as_str()) => Evaluation::Met,
                Ok(actual) => Evaluation::not_met_with(format!(
                    "expected text containing '{}', last observed '{}'",
                    expected, actual
                )),
                Err(e) => Evaluation::from_error(e),
            },

            Condition::UrlContains { session, substring } => {
                match session.current_location().await {
                    Ok(location) => {
                        if location.to_lowercase().contains(&substring.to_lowercase()) {
                            Evaluation::Met
                        } else {
                            Evaluation::not_met_with(format!("location was '{}'", location))
                        }
                    }
                    Err(e) => Evaluation::from_error(e),
                }
            }

            Condition::ScriptReturnsTrue { session, script } => {
                match session.execute_script(script, Vec::new()).await {
                    Ok(result) => match result.as_bool() {
                        Ok(true) => Evaluation::Met,
                        Ok(false) => {
                            Evaluation::not_met_with(format!("script returned {:?}", result))
                        }
                        Err(e) => Evaluation::Fatal(e),
                    },
                    Err(e) => Evaluation::from_error(e),
                }
            }

            Condition::Custom { check, .. } => check().await,
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("name", &self.name())
            .field("description", &self.describe())
            .finish()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

async fn visible(el: Arc<dyn LiveElement>) -> Result<bool, Error> {
    if !el.is_displayed().await? {
        return Ok(false);
    }
    Ok(el.rect().await?.has_area())
}

async fn clickable_state(el: Arc<dyn LiveElement>) -> Result<(bool, bool), Error> {
    let shown = visible(el.clone()).await?;
    if !shown {
        return Ok((false, false));
    }
    Ok((true, el.is_enabled().await?))
}

async fn read_text(element: &ElementHandle) -> Result<String, Error> {
    element
        .with_live(|el| async move { el.text().await })
        .await
}

fn quoted_or_absent(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("'{}'", v),
        None => "no such attribute".to_string(),
    }
}

fn abbreviate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}...", head)
    }
}
