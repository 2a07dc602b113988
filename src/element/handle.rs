//! Element handle implementation
//!
//! Binds a locator and/or a live reference to one UI element and resolves
//! it on demand.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::driver::{DriverSession, LiveElement};
use crate::locator::Locator;
use crate::{Error, Result};

/// Element handle
///
/// Holds a locator for deferred lookup, a cached live reference, or both.
/// The cached reference is owned by the driver session and is never assumed
/// to stay valid; it is mutated only by [`resolve`](Self::resolve) and the
/// invalidation paths of this type.
#[derive(Debug)]
pub struct ElementHandle {
    id: String,
    session: Arc<dyn DriverSession>,
    locator: Option<Locator>,
    cached: Mutex<Option<Arc<dyn LiveElement>>>,
    description: String,
}

impl ElementHandle {
    /// Create a handle from an optional locator and an optional reference.
    ///
    /// Fails with `Unresolvable` when both are missing.
    pub fn new<S: Into<String>>(
        session: Arc<dyn DriverSession>,
        locator: Option<Locator>,
        reference: Option<Arc<dyn LiveElement>>,
        description: S,
    ) -> Result<Self> {
        let description = description.into();
        if locator.is_none() && reference.is_none() {
            return Err(Error::unresolvable(format!(
                "'{}' was built without a locator or a reference",
                description
            )));
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            session,
            locator,
            cached: Mutex::new(reference),
            description,
        })
    }

    /// Always re-resolving handle backed by a locator
    pub fn from_locator<S: Into<String>>(
        session: Arc<dyn DriverSession>,
        locator: Locator,
        description: S,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session,
            locator: Some(locator),
            cached: Mutex::new(None),
            description: description.into(),
        }
    }

    /// One-shot snapshot of an already found node. Cannot recover from
    /// staleness.
    pub fn from_reference<S: Into<String>>(
        session: Arc<dyn DriverSession>,
        reference: Arc<dyn LiveElement>,
        description: S,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session,
            locator: None,
            cached: Mutex::new(Some(reference)),
            description: description.into(),
        }
    }

    /// Snapshot every node currently matching `locator`
    #[instrument(skip(session, description))]
    pub async fn find_all<S: AsRef<str>>(
        session: Arc<dyn DriverSession>,
        locator: &Locator,
        description: S,
    ) -> Result<Vec<ElementHandle>> {
        let references = session.find_elements(locator).await?;
        debug!("Found {} elements for {}", references.len(), locator);

        Ok(references
            .into_iter()
            .enumerate()
            .map(|(i, reference)| {
                Self::from_reference(
                    session.clone(),
                    reference,
                    format!("{}[{}]", description.as_ref(), i),
                )
            })
            .collect())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn locator(&self) -> Option<&Locator> {
        self.locator.as_ref()
    }

    pub fn session(&self) -> &Arc<dyn DriverSession> {
        &self.session
    }

    /// Human-readable label used in diagnostics
    pub fn label(&self) -> String {
        match &self.locator {
            Some(locator) => format!("'{}' ({})", self.description, locator),
            None => format!("'{}'", self.description),
        }
    }

    /// Whether a live reference is currently cached
    pub async fn is_cached(&self) -> bool {
        self.cached.lock().await.is_some()
    }

    /// Drop the cached reference
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    /// Drop the cached reference only if it is still the one that went stale
    async fn invalidate_reference(&self, stale: &Arc<dyn LiveElement>) {
        let mut cached = self.cached.lock().await;
        if cached.as_ref().is_some_and(|live| live.id() == stale.id()) {
            *cached = None;
        }
    }

    /// Resolve the handle to a live reference.
    ///
    /// A cached reference is returned as long as it is still attached. A
    /// stale one is dropped and, when a locator exists, replaced by a fresh
    /// query. Without a locator staleness is `Unresolvable`.
    #[instrument(skip(self), fields(element = %self.description))]
    pub async fn resolve(&self) -> Result<Arc<dyn LiveElement>> {
        let mut cached = self.cached.lock().await;

        if let Some(live) = cached.as_ref() {
            match live.check_attached().await {
                Ok(()) => return Ok(live.clone()),
                Err(e) if e.is_stale() => {
                    debug!("Cached reference {} is stale, dropping it", live.id());
                    *cached = None;
                }
                Err(e) => return Err(e),
            }
        }

        let locator = self.locator.as_ref().ok_or_else(|| {
            Error::unresolvable(format!(
                "'{}' has no locator and its reference is no longer attached",
                self.description
            ))
        })?;

        debug!("Querying {} for '{}'", locator, self.description);
        let live = self.session.find_element(locator).await?;
        *cached = Some(live.clone());
        Ok(live)
    }

    /// Run a read against the resolved element.
    ///
    /// If the reference goes stale between resolution and the read, the
    /// cache is dropped and the read is retried once on a fresh reference.
    /// Reads must be side-effect free since they may run twice.
    pub async fn with_live<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn(Arc<dyn LiveElement>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let live = self.resolve().await?;
        match op(live.clone()).await {
            Err(e) if e.is_stale() => {
                debug!("'{}' went stale mid-read: {}", self.description, e);
                self.invalidate_reference(&live).await;
                if self.locator.is_none() {
                    return Err(Error::unresolvable(format!(
                        "'{}' has no locator and its reference went stale",
                        self.description
                    )));
                }
                let fresh = self.resolve().await?;
                op(fresh).await
            }
            other => other,
        }
    }
}
