//! Guarded action executor
//!
//! Waits for a readiness condition, then performs an action exactly once.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, instrument};

use super::actions::Action;
use crate::config::Config;
use crate::driver::SwipeDirection;
use crate::element::ElementHandle;
use crate::locator::Surface;
use crate::wait::{Condition, Outcome, Poller, WaitContext};
use crate::Error;

/// Action executor
#[derive(Debug, Clone, Default)]
pub struct ActionExecutor {
    poller: Poller,
    /// Overrides the per-surface default budget
    timeout: Option<Duration>,
}

impl ActionExecutor {
    pub fn new(poller: Poller) -> Self {
        Self {
            poller,
            timeout: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Poller::from_config(config))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    /// Wait budget for a surface
    pub fn budget(&self, surface: Surface) -> Duration {
        self.timeout
            .unwrap_or_else(|| self.poller.default_timeout(surface))
    }

    fn budget_for(&self, condition: &Condition) -> Duration {
        let surface = condition
            .session()
            .map(|session| session.surface())
            .unwrap_or_default();
        self.budget(surface)
    }

    /// Wait for a condition with the default budget
    pub async fn wait(&self, condition: Condition) -> Outcome {
        let budget = self.budget_for(&condition);
        self.poller.wait(condition, budget).await
    }

    /// Wait for `precondition`, then run `action` against the handle once.
    ///
    /// A failed wait is returned as is and the action is skipped. An error
    /// from the action itself yields `Fatal` and is never retried.
    #[instrument(skip_all, fields(element = %handle.description(), action = %action))]
    pub async fn perform(
        &self,
        handle: &Arc<ElementHandle>,
        precondition: Condition,
        action: Action,
    ) -> Outcome {
        let budget = self.budget_for(&precondition);
        self.perform_within(handle, precondition, action, budget).await
    }

    async fn perform_within(
        &self,
        handle: &Arc<ElementHandle>,
        precondition: Condition,
        action: Action,
        budget: Duration,
    ) -> Outcome {
        let outcome = self.poller.wait(precondition, budget).await;
        let context = match outcome {
            Outcome::Success { context } => context.with_action(action.to_string()),
            other => return other,
        };

        let live = match handle.resolve().await {
            Ok(live) => live,
            Err(error) => {
                error!("Could not resolve {} after wait: {}", handle.label(), error);
                return Outcome::Fatal { context, error };
            }
        };

        match action.apply(live.as_ref()).await {
            Ok(()) => {
                info!("Performed {} on {}", action, handle.label());
                Outcome::Success { context }
            }
            Err(e) => {
                error!("{} on {} failed: {}", action, handle.label(), e);
                Outcome::Fatal {
                    context,
                    error: Error::action_fault(format!("{} on {}: {}", action, handle.label(), e)),
                }
            }
        }
    }

    /// Perform with the action's default readiness condition
    pub async fn act(&self, handle: &Arc<ElementHandle>, action: Action) -> Outcome {
        let precondition = action.default_precondition(handle.clone());
        self.perform(handle, precondition, action).await
    }

    async fn act_within(&self, handle: &Arc<ElementHandle>, action: Action, budget: Duration) -> Outcome {
        let precondition = action.default_precondition(handle.clone());
        self.perform_within(handle, precondition, action, budget).await
    }

    pub async fn click(&self, handle: &Arc<ElementHandle>) -> Outcome {
        self.act(handle, Action::Click).await
    }

    pub async fn tap(&self, handle: &Arc<ElementHandle>) -> Outcome {
        self.act(handle, Action::Tap).await
    }

    pub async fn type_text(&self, handle: &Arc<ElementHandle>, text: &str) -> Outcome {
        self.act(handle, Action::Type(text.to_string())).await
    }

    pub async fn clear(&self, handle: &Arc<ElementHandle>) -> Outcome {
        self.act(handle, Action::Clear).await
    }

    pub async fn clear_and_type(&self, handle: &Arc<ElementHandle>, text: &str) -> Outcome {
        self.act(handle, Action::ClearAndType(text.to_string())).await
    }

    pub async fn hover(&self, handle: &Arc<ElementHandle>) -> Outcome {
        self.act(handle, Action::Hover).await
    }

    pub async fn swipe(&self, handle: &Arc<ElementHandle>, direction: SwipeDirection) -> Outcome {
        self.act(handle, Action::Swipe(direction)).await
    }

    /// Wait for both ends to be displayed, then drag `source` onto `target`.
    /// Both waits share one budget.
    #[instrument(skip_all, fields(source = %source.description(), target = %target.description()))]
    pub async fn drag_and_drop(
        &self,
        source: &Arc<ElementHandle>,
        target: &Arc<ElementHandle>,
    ) -> Outcome {
        let started = Instant::now();
        let budget = self.budget(source.session().surface());
        let outcome = self.poller.wait(Condition::displayed(source.clone()), budget).await;
        if !outcome.is_success() {
            return outcome;
        }
        let outcome = self
            .poller
            .wait(Condition::displayed(target.clone()), remaining(budget, started))
            .await;
        let context = match outcome {
            Outcome::Success { context } => merge_drag_context(context, source),
            other => return other,
        };

        let (from, to) = match (source.resolve().await, target.resolve().await) {
            (Ok(from), Ok(to)) => (from, to),
            (Err(error), _) | (_, Err(error)) => {
                error!("Could not resolve drag endpoints: {}", error);
                return Outcome::Fatal { context, error };
            }
        };

        match from.drag_to(to.as_ref()).await {
            Ok(()) => {
                info!("Dragged {} onto {}", source.label(), target.label());
                Outcome::Success { context }
            }
            Err(e) => {
                error!("Drag from {} failed: {}", source.label(), e);
                Outcome::Fatal {
                    context,
                    error: Error::action_fault(format!(
                        "drag {} onto {}: {}",
                        source.label(),
                        target.label(),
                        e
                    )),
                }
            }
        }
    }

    /// Hover one element, then click another (menus, tooltips). The click
    /// waits only for what is left of the hover's budget.
    pub async fn hover_and_click(
        &self,
        hover: &Arc<ElementHandle>,
        click: &Arc<ElementHandle>,
    ) -> Outcome {
        let started = Instant::now();
        let budget = self.budget(hover.session().surface());
        let outcome = self.act_within(hover, Action::Hover, budget).await;
        if !outcome.is_success() {
            return outcome;
        }
        self.act_within(click, Action::Click, remaining(budget, started)).await
    }

    pub async fn scroll_into_view_and_click(&self, handle: &Arc<ElementHandle>) -> Outcome {
        let started = Instant::now();
        let budget = self.budget(handle.session().surface());
        let outcome = self.act_within(handle, Action::ScrollIntoView, budget).await;
        if !outcome.is_success() {
            return outcome;
        }
        self.act_within(handle, Action::Click, remaining(budget, started)).await
    }
}

fn remaining(budget: Duration, started: Instant) -> Duration {
    budget.saturating_sub(started.elapsed())
}

fn merge_drag_context(context: WaitContext, source: &ElementHandle) -> WaitContext {
    WaitContext {
        target: Some(source.label()),
        ..context
    }
    .with_action("drag and drop")
}
