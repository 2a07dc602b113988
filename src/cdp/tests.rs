//! CDP surface tests

use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::js;
use super::mock::{evaluated, thrown, MockCdpConnection};
use super::session::CdpSession;
use super::traits::CdpConnection;
use super::types::{CdpCommand, CdpMessage, MouseEvent, MouseEventKind, TouchEvent, TouchEventKind};
use crate::driver::{DriverSession, EvaluationResult};
use crate::element::ElementHandle;
use crate::locator::{Locator, Strategy};
use crate::Error;

fn is_lookup(expression: &str) -> bool {
    expression.contains("reg.next++")
}

fn session(connection: MockCdpConnection) -> (Arc<MockCdpConnection>, CdpSession) {
    let connection = Arc::new(connection);
    let session = CdpSession::new(connection.clone());
    (connection, session)
}

#[test]
fn test_literal_escapes_quotes() {
    assert_eq!(js::literal(r#"say "hi""#), r#""say \"hi\"""#);
    assert_eq!(js::literal("it's"), r#""it's""#);
}

#[test]
fn test_find_script_per_strategy() {
    let css = js::find(&Locator::css("#login").unwrap(), false);
    assert!(css.contains(r##"document.querySelectorAll("#login")"##));
    assert!(css.contains("keys.length ? keys[0] : null"));

    let xpath = js::find(&Locator::xpath("//button").unwrap(), true);
    assert!(xpath.contains("XPathResult.ORDERED_NODE_SNAPSHOT_TYPE"));
    assert!(xpath.contains("return keys;"));

    let link = js::find(&Locator::web(Strategy::LinkText, "Sign in").unwrap(), false);
    assert!(link.contains(r#"a.textContent.trim() === "Sign in""#));
}

#[test]
fn test_registry_drops_detached_nodes() {
    let lookup = js::find(&Locator::css("#row").unwrap(), true);
    let sweep = lookup
        .find("if (!reg.nodes[k].isConnected) delete reg.nodes[k];")
        .expect("lookup sweeps detached entries");
    assert!(sweep < lookup.find("reg.next++").unwrap());

    let read = js::on_element("h7", js::TEXT);
    let unregister = read.find(r#"delete reg.nodes["h7"]"#).expect("stale key is unregistered");
    let throw = read.find(js::STALE_MARKER).unwrap();
    assert!(unregister < throw);
    assert!(throw < read.find("innerText").unwrap());
}

#[tokio::test]
async fn test_evaluate_maps_exception() {
    let connection = MockCdpConnection::evaluating(|_| Ok(thrown("ReferenceError: foo is not defined")));

    let err = connection.evaluate("foo").await.unwrap_err();
    match err {
        Error::ScriptExecutionFailed(message) => assert!(message.contains("ReferenceError")),
        other => panic!("Unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_find_element_and_read() {
    let (_connection, session) = session(MockCdpConnection::evaluating(|expression| {
        if is_lookup(expression) {
            Ok(evaluated(json!("h0")))
        } else if expression.contains("innerText") {
            Ok(evaluated(json!("Welcome back")))
        } else {
            Ok(evaluated(json!(true)))
        }
    }));

    let element = session
        .find_element(&Locator::css("#greeting").unwrap())
        .await
        .expect("Failed to find element");

    assert_eq!(element.id(), "h0");
    assert_eq!(element.text().await.unwrap(), "Welcome back");
    assert!(element.check_attached().await.is_ok());
}

#[tokio::test]
async fn test_find_element_not_found() {
    let (_connection, session) = session(MockCdpConnection::evaluating(|_| Ok(evaluated(Value::Null))));

    let err = session
        .find_element(&Locator::css("#missing").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_bad_selector_is_invalid_locator() {
    let (_connection, session) = session(MockCdpConnection::evaluating(|_| {
        Ok(thrown(
            "SyntaxError: Failed to execute 'querySelectorAll' on 'Document': '##x' is not a valid selector.",
        ))
    }));

    let err = session
        .find_element(&Locator::css("##x").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidLocator(_)));
}

#[tokio::test]
async fn test_mobile_locator_rejected() {
    let (connection, session) = session(MockCdpConnection::evaluating(|_| Ok(evaluated(Value::Null))));

    let err = session
        .find_element(&Locator::accessibility_id("login").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidLocator(_)));
    assert!(connection.commands().is_empty());
}

#[tokio::test]
async fn test_detached_node_is_stale_and_handle_recovers() {
    let lookups = Arc::new(AtomicUsize::new(0));
    let counter = lookups.clone();
    let (_connection, session) = session(MockCdpConnection::evaluating(move |expression| {
        if is_lookup(expression) {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            return Ok(evaluated(json!(format!("h{}", n))));
        }
        // The first registered node was re-rendered away
        if expression.contains(r#"nodes["h0"]"#) {
            return Ok(thrown("Error: stale element reference: h0"));
        }
        if expression.contains("innerText") {
            return Ok(evaluated(json!("Done")));
        }
        Ok(evaluated(json!(true)))
    }));

    let session: Arc<dyn DriverSession> = Arc::new(session);
    let locator = Locator::css("#status").unwrap();
    let first = session.find_element(&locator).await.unwrap();
    assert!(first.text().await.unwrap_err().is_stale());

    // Snapshot only: nothing to re-query with
    let snapshot = ElementHandle::from_reference(session.clone(), first.clone(), "status");
    assert!(matches!(
        snapshot.resolve().await.unwrap_err(),
        Error::Unresolvable(_)
    ));

    // Same stale reference, but backed by a locator
    let handle = ElementHandle::new(session.clone(), Some(locator), Some(first), "status").unwrap();
    let text = handle
        .with_live(|live| async move { live.text().await })
        .await
        .expect("Stale reference should be replaced");
    assert_eq!(text, "Done");
    assert_eq!(lookups.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_click_dispatches_mouse_at_center() {
    let (connection, session) = session(MockCdpConnection::new(|method, params| {
        if method != "Runtime.evaluate" {
            return Ok(json!({}));
        }
        let expression = params["expression"].as_str().unwrap_or_default();
        if is_lookup(expression) {
            Ok(evaluated(json!("h0")))
        } else if expression.contains("getBoundingClientRect") {
            Ok(evaluated(json!({ "x": 10.0, "y": 20.0, "width": 100.0, "height": 40.0 })))
        } else {
            Ok(evaluated(json!(true)))
        }
    }));

    let element = session
        .find_element(&Locator::css("#buy").unwrap())
        .await
        .unwrap();
    element.click().await.expect("Failed to click");

    let events = connection.commands_named("Input.dispatchMouseEvent");
    let kinds: Vec<_> = events.iter().map(|e| e["type"].as_str().unwrap().to_string()).collect();
    assert_eq!(kinds, vec!["mouseMoved", "mousePressed", "mouseReleased"]);
    assert_eq!(events[1]["x"], json!(60.0));
    assert_eq!(events[1]["y"], json!(40.0));
    assert_eq!(events[1]["clickCount"], json!(1));
}

#[tokio::test]
async fn test_execute_script_and_location() {
    let (connection, session) = session(MockCdpConnection::evaluating(|expression| {
        if expression == "window.location.href" {
            Ok(evaluated(json!("https://example.com/SDET")))
        } else {
            Ok(evaluated(json!(3)))
        }
    }));

    let result = session
        .execute_script("return arguments[0] + 1;", vec![json!(2)])
        .await
        .unwrap();
    assert_eq!(result, EvaluationResult::Number(3.0));

    let sent = connection.commands_named("Runtime.evaluate");
    assert_eq!(
        sent[0]["expression"],
        json!("(function() { return arguments[0] + 1; }).apply(null, [2])")
    );
    assert_eq!(sent[0]["returnByValue"], json!(true));

    assert_eq!(
        session.current_location().await.unwrap(),
        "https://example.com/SDET"
    );
}

#[tokio::test]
async fn test_closed_connection_is_transport_error() {
    let connection = MockCdpConnection::evaluating(|_| Ok(evaluated(json!(true))));
    connection.close();

    let err = connection.evaluate("1").await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[test]
fn test_frames_split_replies_from_events() {
    let reply: CdpMessage = serde_json::from_str(r#"{"id":7,"result":{"ok":true}}"#).unwrap();
    assert_eq!(reply.id, Some(7));
    assert_eq!(reply.result["ok"], json!(true));

    let event: CdpMessage =
        serde_json::from_str(r#"{"method":"Page.frameNavigated","params":{}}"#).unwrap();
    assert_eq!(event.id, None);
    assert_eq!(event.method.as_deref(), Some("Page.frameNavigated"));

    let params = json!({ "expression": "1" });
    let command = serde_json::to_value(CdpCommand {
        id: 3,
        method: "Runtime.evaluate",
        params: Some(&params),
    })
    .unwrap();
    assert_eq!(command, json!({ "id": 3, "method": "Runtime.evaluate", "params": { "expression": "1" } }));
}

#[test]
fn test_input_events_serialize_in_protocol_shape() {
    let moved = serde_json::to_value(MouseEvent::left(MouseEventKind::MouseMoved, (1.0, 2.0))).unwrap();
    assert_eq!(moved, json!({ "type": "mouseMoved", "x": 1.0, "y": 2.0 }));

    let lifted = serde_json::to_value(TouchEvent::at(TouchEventKind::TouchEnd, (5.0, 5.0))).unwrap();
    assert_eq!(lifted, json!({ "type": "touchEnd", "touchPoints": [] }));
}
