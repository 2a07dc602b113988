//! Mock surface implementation for testing
//!
//! An in-memory surface whose nodes are keyed by locator. Tests mutate it
//! while a poller is running to simulate rendering, re-rendering and node
//! removal.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::traits::{DriverSession, ElementRect, EvaluationResult, LiveElement, SwipeDirection};
use crate::locator::{Locator, Surface};
use crate::Error;

/// State of one mock node
#[derive(Debug, Clone)]
pub struct MockNode {
    pub text: String,
    pub attributes: HashMap<String, String>,
    pub displayed: bool,
    pub enabled: bool,
    pub rect: ElementRect,
    /// When set, every action on the node fails with this message
    pub action_failure: Option<String>,
}

impl Default for MockNode {
    fn default() -> Self {
        Self {
            text: String::new(),
            attributes: HashMap::new(),
            displayed: true,
            enabled: true,
            rect: ElementRect {
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 40.0,
            },
            action_failure: None,
        }
    }
}

impl MockNode {
    /// Visible, enabled node with a 100x40 box
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_attribute<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_rect(mut self, rect: ElementRect) -> Self {
        self.rect = rect;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn failing_actions<S: Into<String>>(mut self, message: S) -> Self {
        self.action_failure = Some(message.into());
        self
    }
}

#[derive(Debug)]
struct NodeEntry {
    id: String,
    locator: Locator,
    node: MockNode,
    attached: bool,
    rendered_in: u64,
}

#[derive(Debug)]
struct SurfaceState {
    nodes: Vec<NodeEntry>,
    generation: u64,
    location: String,
    scripts: HashMap<String, std::result::Result<EvaluationResult, String>>,
    actions: Vec<String>,
}

/// Mock driver session
#[derive(Debug, Clone)]
pub struct MockSession {
    surface: Surface,
    state: Arc<Mutex<SurfaceState>>,
    find_calls: Arc<AtomicUsize>,
}

impl MockSession {
    /// Create a new mock session for a surface
    pub fn new(surface: Surface) -> Self {
        Self {
            surface,
            state: Arc::new(Mutex::new(SurfaceState {
                nodes: Vec::new(),
                generation: 0,
                location: "about:blank".to_string(),
                scripts: HashMap::new(),
                actions: Vec::new(),
            })),
            find_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn web() -> Self {
        Self::new(Surface::Web)
    }

    pub fn mobile() -> Self {
        Self::new(Surface::Mobile)
    }

    fn state(&self) -> MutexGuard<'_, SurfaceState> {
        lock(&self.state)
    }

    /// Render a node findable through `locator`; returns its node ID
    pub fn add_node(&self, locator: &Locator, node: MockNode) -> String {
        let mut state = self.state();
        let id = format!("node-{}", Uuid::new_v4());
        let generation = state.generation;
        state.nodes.push(NodeEntry {
            id: id.clone(),
            locator: locator.clone(),
            node,
            attached: true,
            rendered_in: generation,
        });
        id
    }

    /// Mutate a node in place; references to it stay valid
    pub fn update<F>(&self, node_id: &str, f: F)
    where
        F: FnOnce(&mut MockNode),
    {
        let mut state = self.state();
        if let Some(entry) = state.nodes.iter_mut().find(|e| e.id == node_id) {
            f(&mut entry.node);
        }
    }

    /// Remove a node from the surface; references to it go stale
    pub fn remove(&self, node_id: &str) {
        let mut state = self.state();
        if let Some(entry) = state.nodes.iter_mut().find(|e| e.id == node_id) {
            entry.attached = false;
        }
    }

    /// Re-render every node; all outstanding references go stale
    pub fn reload(&self) {
        let mut state = self.state();
        state.generation += 1;
        let generation = state.generation;
        for entry in state.nodes.iter_mut().filter(|e| e.attached) {
            entry.rendered_in = generation;
        }
    }

    pub fn set_location<S: Into<String>>(&self, location: S) {
        self.state().location = location.into();
    }

    /// Fix the result returned for an exact script
    pub fn set_script_result<S: Into<String>>(&self, script: S, result: EvaluationResult) {
        self.state().scripts.insert(script.into(), Ok(result));
    }

    /// Make an exact script throw
    pub fn set_script_error<S: Into<String>, M: Into<String>>(&self, script: S, message: M) {
        self.state().scripts.insert(script.into(), Err(message.into()));
    }

    /// Number of find queries issued so far
    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    /// Actions performed so far, as `action:node-id` entries
    pub fn actions(&self) -> Vec<String> {
        self.state().actions.clone()
    }

    /// Current attribute value of a node
    pub fn attribute_of(&self, node_id: &str, name: &str) -> Option<String> {
        self.state()
            .nodes
            .iter()
            .find(|e| e.id == node_id)
            .and_then(|e| e.node.attributes.get(name).cloned())
    }

    fn element_for(&self, entry: &NodeEntry) -> Arc<dyn LiveElement> {
        Arc::new(MockElement {
            id: format!("{}@{}", entry.id, entry.rendered_in),
            node_id: entry.id.clone(),
            rendered_in: entry.rendered_in,
            state: self.state.clone(),
        })
    }

    fn check_surface(&self, locator: &Locator) -> Result<(), Error> {
        if locator.surface() != self.surface {
            return Err(Error::invalid_locator(format!(
                "{} locator used on a {} session",
                locator.surface(),
                self.surface
            )));
        }
        Ok(())
    }
}

fn lock(state: &Mutex<SurfaceState>) -> MutexGuard<'_, SurfaceState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl DriverSession for MockSession {
    fn surface(&self) -> Surface {
        self.surface
    }

    async fn find_element(&self, locator: &Locator) -> Result<Arc<dyn LiveElement>, Error> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.check_surface(locator)?;

        let state = self.state();
        state
            .nodes
            .iter()
            .find(|e| e.attached && &e.locator == locator)
            .map(|e| self.element_for(e))
            .ok_or_else(|| Error::not_found(locator.to_string()))
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<Arc<dyn LiveElement>>, Error> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.check_surface(locator)?;

        let state = self.state();
        Ok(state
            .nodes
            .iter()
            .filter(|e| e.attached && &e.locator == locator)
            .map(|e| self.element_for(e))
            .collect())
    }

    async fn execute_script(
        &self,
        script: &str,
        _args: Vec<serde_json::Value>,
    ) -> Result<EvaluationResult, Error> {
        match self.state().scripts.get(script) {
            Some(Ok(result)) => Ok(result.clone()),
            Some(Err(message)) => Err(Error::script_execution_failed(message.clone())),
            None => Ok(EvaluationResult::Null),
        }
    }

    async fn current_location(&self) -> Result<String, Error> {
        match self.surface {
            Surface::Web => Ok(self.state().location.clone()),
            Surface::Mobile => Err(Error::unsupported("current location on a mobile surface")),
        }
    }
}

/// Mock element reference
#[derive(Debug)]
pub struct MockElement {
    id: String,
    node_id: String,
    rendered_in: u64,
    state: Arc<Mutex<SurfaceState>>,
}

impl MockElement {
    fn read<T, F>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&MockNode) -> T,
    {
        let state = lock(&self.state);
        state
            .nodes
            .iter()
            .find(|e| e.id == self.node_id && e.attached && e.rendered_in == self.rendered_in)
            .map(|e| f(&e.node))
            .ok_or_else(|| Error::stale(self.id.clone()))
    }

    fn act<F>(&self, action: &str, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut MockNode),
    {
        let mut state = lock(&self.state);
        let entry = state
            .nodes
            .iter_mut()
            .find(|e| e.id == self.node_id && e.attached && e.rendered_in == self.rendered_in)
            .ok_or_else(|| Error::stale(self.id.clone()))?;

        let failure = entry.node.action_failure.clone();
        if failure.is_none() {
            f(&mut entry.node);
        }
        state.actions.push(format!("{}:{}", action, self.node_id));

        match failure {
            Some(message) => Err(Error::driver(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LiveElement for MockElement {
    fn id(&self) -> &str {
        &self.id
    }

    async fn check_attached(&self) -> Result<(), Error> {
        self.read(|_| ())
    }

    async fn is_displayed(&self) -> Result<bool, Error> {
        self.read(|n| n.displayed)
    }

    async fn is_enabled(&self) -> Result<bool, Error> {
        self.read(|n| n.enabled)
    }

    async fn text(&self) -> Result<String, Error> {
        self.read(|n| n.text.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, Error> {
        self.read(|n| n.attributes.get(name).cloned())
    }

    async fn rect(&self) -> Result<ElementRect, Error> {
        self.read(|n| n.rect)
    }

    async fn click(&self) -> Result<(), Error> {
        self.act("click", |_| ())
    }

    async fn tap(&self) -> Result<(), Error> {
        self.act("tap", |_| ())
    }

    async fn send_keys(&self, text: &str) -> Result<(), Error> {
        self.act("type", |n| {
            n.attributes
                .entry("value".to_string())
                .or_default()
                .push_str(text);
        })
    }

    async fn clear(&self) -> Result<(), Error> {
        self.act("clear", |n| {
            n.attributes.insert("value".to_string(), String::new());
        })
    }

    async fn hover(&self) -> Result<(), Error> {
        self.act("hover", |_| ())
    }

    async fn scroll_into_view(&self) -> Result<(), Error> {
        self.act("scroll", |_| ())
    }

    async fn swipe(&self, direction: SwipeDirection) -> Result<(), Error> {
        self.act(&format!("swipe-{}", direction), |_| ())
    }

    async fn drag_to(&self, target: &dyn LiveElement) -> Result<(), Error> {
        target.check_attached().await?;
        self.act(&format!("drag[{}]", target.id()), |_| ())
    }
}
