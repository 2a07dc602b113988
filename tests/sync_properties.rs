//! Synchronization properties of the wait/act pipeline
//!
//! Runs on a paused tokio clock, so every elapsed time below is exact.

mod common;

use chaser_harness::driver::{DriverSession, MockNode};
use chaser_harness::{
    ActionExecutor, Condition, ElementHandle, Error, Evaluation, Locator, Outcome, PollSpec, Poller,
    Surface,
};
use common::{css_locator, ms, Fixture};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn never_true() -> Condition {
    Condition::custom("never", || async { Evaluation::not_met_with("still false") })
}

#[tokio::test(start_paused = true)]
async fn test_wait_is_bounded_by_budget_plus_interval() {
    let cases = [(1000, 250), (1000, 300), (750, 250), (100, 1000), (60, 7)];

    for (budget, interval) in cases {
        let spec = PollSpec::new(never_true(), ms(budget)).with_interval(ms(interval));
        let outcome = Poller::default().poll(&spec).await;

        assert!(
            matches!(outcome, Outcome::Timeout { .. }),
            "budget {}ms / interval {}ms: {}",
            budget,
            interval,
            outcome
        );
        let elapsed = outcome.context().elapsed;
        assert!(elapsed >= ms(budget), "returned early: {:?}", elapsed);
        assert!(elapsed <= ms(budget + interval), "overran: {:?}", elapsed);
    }
}

#[tokio::test(start_paused = true)]
async fn test_success_does_not_wait_for_remaining_ticks() {
    for k in 1..=4u32 {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let condition = Condition::custom("true on tick k", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n >= k {
                    Evaluation::Met
                } else {
                    Evaluation::not_met()
                }
            }
        });

        let outcome = Poller::new(ms(200)).wait(condition, ms(5000)).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.context().ticks, k);
        assert_eq!(outcome.context().elapsed, ms(200 * u64::from(k - 1)));
        assert_eq!(calls.load(Ordering::SeqCst), k);
    }
}

#[tokio::test]
async fn test_resolution_is_cached() {
    let surface = Fixture::web();
    surface.render("#login", MockNode::new());
    let login = surface.handle("#login", "login button");

    let first = assert_ok!(login.resolve().await);
    let second = assert_ok!(login.resolve().await);

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(surface.mock.find_calls(), 1);
}

#[tokio::test]
async fn test_stale_reference_recovered_through_locator() {
    let surface = Fixture::web();
    surface.render("#status", MockNode::new().with_text("Ready"));
    let status = surface.handle("#status", "status");

    let before = assert_ok!(status.resolve().await);
    surface.mock.reload();
    assert!(before.text().await.unwrap_err().is_stale());

    let after = assert_ok!(status.resolve().await);
    assert_ne!(before.id(), after.id());
    assert_eq!(surface.mock.find_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unresolvable_handle_fails_without_polling() {
    let surface = Fixture::web();

    let err = assert_err!(ElementHandle::new(
        surface.session.clone(),
        None,
        None,
        "nothing"
    ));
    assert!(matches!(err, Error::Unresolvable(_)));

    // Reference-only snapshot whose node is gone
    let node = surface.render(".row", MockNode::new());
    let rows = ElementHandle::find_all(surface.session.clone(), &css_locator(".row"), "row")
        .await
        .unwrap();
    surface.mock.remove(&node);
    let first_row = Arc::new(rows.into_iter().next().unwrap());

    let outcome = ActionExecutor::default().click(&first_row).await;
    match &outcome {
        Outcome::Aborted { context, error } => {
            assert!(matches!(error, Error::Unresolvable(_)));
            assert_eq!(context.ticks, 1);
            assert_eq!(context.elapsed, ms(0));
        }
        other => panic!("Expected abort, got {:?}", other),
    }
    assert!(surface.mock.actions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_action_runs_exactly_once() {
    let surface = Fixture::web();
    let node = surface.render("#pay", MockNode::new().failing_actions("element click intercepted"));
    let pay = surface.handle("#pay", "pay button");

    let outcome = ActionExecutor::default().click(&pay).await;

    assert!(matches!(
        outcome,
        Outcome::Fatal {
            error: Error::ActionFault(_),
            ..
        }
    ));
    assert_eq!(surface.mock.actions(), vec![format!("click:{}", node)]);
}

#[tokio::test(start_paused = true)]
async fn test_element_displayed_on_third_tick() {
    let surface = Fixture::web();
    let node = surface.render("#banner", MockNode::new().hidden());
    surface.update_after(ms(400), &node, |n| n.displayed = true);
    let banner = surface.handle("#banner", "banner");

    let spec = PollSpec::new(Condition::displayed(banner), ms(1000)).with_interval(ms(250));
    let outcome = Poller::default().poll(&spec).await;

    assert!(outcome.is_success(), "{}", outcome);
    let elapsed = outcome.context().elapsed;
    assert!(elapsed >= ms(500) && elapsed <= ms(750), "{:?}", elapsed);
    assert!(elapsed < ms(1000));
}

#[tokio::test(start_paused = true)]
async fn test_text_timeout_reports_last_observed() {
    let surface = Fixture::web();
    surface.render("#status", MockNode::new().with_text("Pending"));
    let status = surface.handle("#status", "status");

    let spec = PollSpec::new(Condition::text_equals(status, "Done"), ms(500)).with_interval(ms(250));
    let outcome = Poller::default().poll(&spec).await;

    match &outcome {
        Outcome::Timeout {
            context,
            last_observed,
        } => {
            assert!(context.elapsed >= ms(500) && context.elapsed <= ms(750));
            assert_eq!(
                last_observed.as_deref(),
                Some("expected 'Done', last observed 'Pending'")
            );
        }
        other => panic!("Expected timeout, got {:?}", other),
    }
    let message = outcome.failure_message().unwrap();
    assert!(message.contains("'status' (css=#status)"));
    assert!(message.contains("500ms"));
}

#[tokio::test(start_paused = true)]
async fn test_detached_snapshot_is_unresolvable_immediately() {
    let surface = Fixture::web();
    let node = surface.render("#toast", MockNode::new());
    let reference = surface
        .session
        .find_element(&css_locator("#toast"))
        .await
        .unwrap();
    let toast = ElementHandle::from_reference(surface.session.clone(), reference, "toast");

    surface.mock.remove(&node);

    let started = tokio::time::Instant::now();
    let err = toast.resolve().await.unwrap_err();
    assert!(matches!(err, Error::Unresolvable(_)));
    assert_eq!(started.elapsed(), ms(0));
}

#[tokio::test(start_paused = true)]
async fn test_reload_between_resolutions_is_transparent() {
    let surface = Fixture::web();
    surface.render("#cart-count", MockNode::new().with_text("3"));
    let count = surface.handle("#cart-count", "cart count");
    assert!(count.resolve().await.is_ok());

    surface.mock.reload();

    let outcome = Poller::default()
        .wait(Condition::text_equals(count, "3"), ms(1000))
        .await;
    assert!(outcome.is_success(), "{}", outcome);
    assert_eq!(outcome.context().ticks, 1);
    assert_eq!(surface.mock.find_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_url_match_ignores_case() {
    let surface = Fixture::web();
    surface.mock.set_location("https://example.com/login");
    let mock = surface.mock.clone();
    tokio::spawn(async move {
        tokio::time::sleep(ms(300)).await;
        mock.set_location("https://example.com/SDET");
    });

    let outcome = Poller::new(ms(250))
        .wait(Condition::url_contains(surface.session.clone(), "/sdet"), ms(2000))
        .await;

    assert!(outcome.is_success(), "{}", outcome);
    assert_eq!(outcome.context().elapsed, ms(500));
}

#[tokio::test(start_paused = true)]
async fn test_mobile_tap_after_late_render() {
    let surface = Fixture::mobile();
    let locator = Locator::accessibility_id("Continue").unwrap();
    let mock = surface.mock.clone();
    let rendered = locator.clone();
    tokio::spawn(async move {
        tokio::time::sleep(ms(1200)).await;
        mock.add_node(&rendered, MockNode::new());
    });

    let executor = ActionExecutor::default();
    assert_eq!(executor.budget(Surface::Mobile), ms(30_000));

    let button = Arc::new(ElementHandle::from_locator(
        surface.session.clone(),
        locator,
        "continue",
    ));
    let outcome = executor.tap(&button).await;

    assert!(outcome.is_success(), "{}", outcome);
    assert_eq!(outcome.context().elapsed, ms(1250));
    assert_eq!(surface.mock.actions().len(), 1);
    assert!(surface.mock.actions()[0].starts_with("tap:"));
}
