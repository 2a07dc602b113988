//! Action executor unit tests

use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::driver::{DriverSession, MockNode, MockSession, SwipeDirection};
use crate::element::ElementHandle;
use crate::locator::{Locator, Strategy};
use crate::wait::{Condition, Outcome, Poller};
use crate::Error;

fn setup() -> (MockSession, Arc<dyn DriverSession>, ActionExecutor) {
    let mock = MockSession::web();
    let session: Arc<dyn DriverSession> = Arc::new(mock.clone());
    let executor = ActionExecutor::new(Poller::new(Duration::from_millis(250)))
        .with_timeout(Duration::from_secs(2));
    (mock, session, executor)
}

fn handle(session: &Arc<dyn DriverSession>, css: &str) -> Arc<ElementHandle> {
    Arc::new(ElementHandle::from_locator(
        session.clone(),
        Locator::css(css).unwrap(),
        css.trim_start_matches('#'),
    ))
}

#[tokio::test(start_paused = true)]
async fn test_click_after_wait() {
    let (mock, session, executor) = setup();
    let node = mock.add_node(&Locator::css("#buy").unwrap(), MockNode::new().disabled());
    let buy = handle(&session, "#buy");

    let enabler = mock.clone();
    let id = node.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(400)).await;
        enabler.update(&id, |n| n.enabled = true);
    });

    let outcome = executor.click(&buy).await;

    assert!(outcome.is_success(), "{}", outcome);
    assert_eq!(outcome.context().elapsed, Duration::from_millis(500));
    assert_eq!(outcome.context().action.as_deref(), Some("click"));
    assert_eq!(mock.actions(), vec![format!("click:{}", node)]);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_skips_action() {
    let (mock, session, executor) = setup();
    mock.add_node(&Locator::css("#buy").unwrap(), MockNode::new().hidden());
    let buy = handle(&session, "#buy");

    let outcome = executor.click(&buy).await;

    assert!(matches!(outcome, Outcome::Timeout { .. }));
    assert!(outcome.context().elapsed <= Duration::from_millis(2250));
    assert!(mock.actions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_action_failure_is_fatal_and_not_retried() {
    let (mock, session, executor) = setup();
    let node = mock.add_node(
        &Locator::css("#pay").unwrap(),
        MockNode::new().failing_actions("element click intercepted"),
    );
    let pay = handle(&session, "#pay");

    let outcome = executor.click(&pay).await;

    match &outcome {
        Outcome::Fatal { error, context } => {
            assert!(matches!(error, Error::ActionFault(_)));
            assert_eq!(context.ticks, 1);
        }
        other => panic!("Expected fatal, got {:?}", other),
    }
    assert_eq!(mock.actions(), vec![format!("click:{}", node)]);
    assert!(outcome
        .failure_message()
        .unwrap()
        .contains("element click intercepted"));
}

#[tokio::test(start_paused = true)]
async fn test_clear_and_type() {
    let (mock, session, executor) = setup();
    let node = mock.add_node(
        &Locator::css("#email").unwrap(),
        MockNode::new().with_attribute("value", "old@example.com"),
    );
    let email = handle(&session, "#email");

    assert!(executor.clear_and_type(&email, "new@example.com").await.is_success());
    assert_eq!(
        mock.attribute_of(&node, "value").as_deref(),
        Some("new@example.com")
    );

    assert!(executor.type_text(&email, ".org").await.is_success());
    assert_eq!(
        mock.attribute_of(&node, "value").as_deref(),
        Some("new@example.com.org")
    );
}

#[tokio::test(start_paused = true)]
async fn test_custom_precondition_abort_propagates() {
    let (mock, session, executor) = setup();
    mock.add_node(&Locator::css("#go").unwrap(), MockNode::new());
    mock.set_script_error("return window.ready", "ReferenceError");
    let go = handle(&session, "#go");

    let precondition = Condition::script_returns_true(session.clone(), "return window.ready");
    let outcome = executor.perform(&go, precondition, Action::Click).await;

    assert!(matches!(
        outcome,
        Outcome::Aborted {
            error: Error::ScriptExecutionFailed(_),
            ..
        }
    ));
    assert!(mock.actions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_drag_and_drop() {
    let (mock, session, executor) = setup();
    mock.add_node(&Locator::css("#card").unwrap(), MockNode::new());
    mock.add_node(&Locator::css("#done").unwrap(), MockNode::new());

    let outcome = executor
        .drag_and_drop(&handle(&session, "#card"), &handle(&session, "#done"))
        .await;

    assert!(outcome.is_success(), "{}", outcome);
    let actions = mock.actions();
    assert_eq!(actions.len(), 1);
    assert!(actions[0].starts_with("drag["));
}

#[tokio::test(start_paused = true)]
async fn test_hover_and_click() {
    let (mock, session, executor) = setup();
    let menu = mock.add_node(&Locator::css("#menu").unwrap(), MockNode::new());
    let item = mock.add_node(&Locator::css("#logout").unwrap(), MockNode::new());

    let outcome = executor
        .hover_and_click(&handle(&session, "#menu"), &handle(&session, "#logout"))
        .await;

    assert!(outcome.is_success());
    assert_eq!(
        mock.actions(),
        vec![format!("hover:{}", menu), format!("click:{}", item)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_drag_and_drop_waits_share_one_budget() {
    let (mock, session, executor) = setup();
    let renderer = mock.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1400)).await;
        renderer.add_node(&Locator::css("#card").unwrap(), MockNode::new());
    });

    let started = tokio::time::Instant::now();
    let outcome = executor
        .drag_and_drop(&handle(&session, "#card"), &handle(&session, "#missing"))
        .await;

    assert!(matches!(outcome, Outcome::Timeout { .. }), "{}", outcome);
    assert_eq!(outcome.context().elapsed, Duration::from_millis(500));
    assert_eq!(started.elapsed(), Duration::from_secs(2));
    assert!(mock.actions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_hover_and_click_share_one_budget() {
    let (mock, session, executor) = setup();
    let renderer = mock.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1650)).await;
        renderer.add_node(&Locator::css("#menu").unwrap(), MockNode::new());
    });

    let started = tokio::time::Instant::now();
    let outcome = executor
        .hover_and_click(&handle(&session, "#menu"), &handle(&session, "#logout"))
        .await;

    assert!(matches!(outcome, Outcome::Timeout { .. }), "{}", outcome);
    assert!(started.elapsed() <= Duration::from_millis(2250));
    assert_eq!(mock.actions().len(), 1);
    assert!(mock.actions()[0].starts_with("hover:"));
}

#[tokio::test(start_paused = true)]
async fn test_scroll_into_view_and_click_offscreen() {
    let (mock, session, executor) = setup();
    let footer = mock.add_node(
        &Locator::css("#footer-link").unwrap(),
        MockNode::new(),
    );

    let outcome = executor
        .scroll_into_view_and_click(&handle(&session, "#footer-link"))
        .await;

    assert!(outcome.is_success());
    assert_eq!(
        mock.actions(),
        vec![format!("scroll:{}", footer), format!("click:{}", footer)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_mobile_swipe_uses_mobile_budget() {
    let mock = MockSession::mobile();
    let session: Arc<dyn DriverSession> = Arc::new(mock.clone());
    let executor = ActionExecutor::default();
    assert_eq!(executor.budget(session.surface()), Duration::from_secs(30));

    let locator = Locator::mobile(Strategy::AccessibilityId, "carousel").unwrap();
    let node = mock.add_node(&locator, MockNode::new());
    let carousel = Arc::new(ElementHandle::from_locator(session, locator, "carousel"));

    let outcome = executor.swipe(&carousel, SwipeDirection::Left).await;

    assert!(outcome.is_success());
    assert_eq!(mock.actions(), vec![format!("swipe-left:{}", node)]);
}
