//! Per-test context integration tests
//!
//! Config -> executor -> reporter wiring as a host test would use it.

mod common;

use chaser_harness::driver::MockNode;
use chaser_harness::report::RecordingSink;
use chaser_harness::{Condition, Config, OutcomeReporter, TestContext, TestMetadata};
use common::{ms, Fixture};
use std::sync::Arc;

fn fast_config() -> Config {
    Config::from_toml(
        r#"
        web_timeout_ms = 1000
        mobile_timeout_ms = 2000
        poll_interval_ms = 100
        "#,
    )
    .expect("Failed to parse config")
}

fn recording_context(surface: &Fixture, name: &str) -> (TestContext, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let reporter = OutcomeReporter::new(sink.clone()).with_metadata(TestMetadata::new(name));
    let context = TestContext::new(surface.session.clone(), fast_config()).with_reporter(reporter);
    (context, sink)
}

#[tokio::test(start_paused = true)]
async fn test_context_uses_configured_budget() {
    let surface = Fixture::web();
    let (context, sink) = recording_context(&surface, "login");
    let submit = context.locate("css=#submit", "submit button").unwrap();

    assert!(!context.click(&submit).await);

    let messages = sink.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("[login] timed out after 1000ms (11 polls)"));
    assert!(messages[0].contains("'submit button' (css=#submit)"));
    assert!(surface.mock.actions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_context_replaces_then_appends_text() {
    let surface = Fixture::web();
    let node = surface.render("#email", MockNode::new().with_attribute("value", "draft"));
    let (context, sink) = recording_context(&surface, "signup");
    let email = context.locate("css=#email", "email").unwrap();

    assert!(context.clear_and_type(&email, "user@example.com").await);
    assert_eq!(
        surface.mock.attribute_of(&node, "value").as_deref(),
        Some("user@example.com")
    );

    assert!(context.type_text(&email, ".org").await);
    assert_eq!(
        surface.mock.attribute_of(&node, "value").as_deref(),
        Some("user@example.com.org")
    );
    assert!(sink.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_contexts_do_not_share_state() {
    let first = Fixture::web();
    let second = Fixture::web();
    first.render("#done", MockNode::new());
    second.render_after(ms(250), "#done", MockNode::new());

    let (a, sink_a) = recording_context(&first, "a");
    let (b, sink_b) = recording_context(&second, "b");
    let done_a = a.locate("css=#done", "done").unwrap();
    let done_b = b.locate("css=#done", "done").unwrap();

    let (ok_a, ok_b) = tokio::join!(
        a.wait(Condition::displayed(done_a)),
        b.wait(Condition::displayed(done_b)),
    );

    assert!(ok_a && ok_b);
    assert!(sink_a.is_empty() && sink_b.is_empty());
    assert_eq!(first.mock.find_calls(), 1);
    assert_eq!(second.mock.find_calls(), 4);
}

#[tokio::test(start_paused = true)]
#[should_panic(expected = "timed out after 200ms")]
async fn test_default_reporter_fails_the_test() {
    let surface = Fixture::web();
    let context = TestContext::new(surface.session.clone(), fast_config());
    let spinner = context.locate("css=#spinner", "spinner").unwrap();

    context
        .wait_for(Condition::displayed(spinner), ms(200))
        .await;
}
