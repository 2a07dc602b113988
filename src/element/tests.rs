//! Element handle unit tests

use std::sync::Arc;

use super::ElementHandle;
use crate::driver::{DriverSession, MockNode, MockSession};
use crate::locator::Locator;
use crate::Error;

fn session() -> (MockSession, Arc<dyn DriverSession>) {
    let mock = MockSession::web();
    let shared: Arc<dyn DriverSession> = Arc::new(mock.clone());
    (mock, shared)
}

#[tokio::test]
async fn test_resolve_caches_reference() {
    let (mock, session) = session();
    let locator = Locator::css("#login").unwrap();
    mock.add_node(&locator, MockNode::new());

    let handle = ElementHandle::from_locator(session, locator, "login button");
    assert!(!handle.is_cached().await);

    let first = handle.resolve().await.expect("Failed to resolve");
    let second = handle.resolve().await.expect("Failed to resolve");

    assert_eq!(first.id(), second.id());
    assert_eq!(mock.find_calls(), 1);
    assert!(handle.is_cached().await);
}

#[tokio::test]
async fn test_resolve_not_found() {
    let (_mock, session) = session();
    let handle = ElementHandle::from_locator(session, Locator::css("#nope").unwrap(), "ghost");

    let err = handle.resolve().await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(!handle.is_cached().await);
}

#[tokio::test]
async fn test_resolve_recovers_from_reload() {
    let (mock, session) = session();
    let locator = Locator::css("#status").unwrap();
    mock.add_node(&locator, MockNode::new().with_text("Ready"));

    let handle = ElementHandle::from_locator(session, locator, "status");
    let before = handle.resolve().await.unwrap();

    mock.reload();

    let after = handle.resolve().await.expect("Re-resolution should be transparent");
    assert_ne!(before.id(), after.id());
    assert_eq!(after.text().await.unwrap(), "Ready");
    assert_eq!(mock.find_calls(), 2);
}

#[tokio::test]
async fn test_reference_only_handle_is_unresolvable_once_detached() {
    let (mock, session) = session();
    let locator = Locator::css(".row").unwrap();
    let node = mock.add_node(&locator, MockNode::new());

    let reference = session.find_element(&locator).await.unwrap();
    let handle = ElementHandle::from_reference(session, reference, "first row");

    // Still attached
    assert!(handle.resolve().await.is_ok());

    mock.remove(&node);

    let err = handle.resolve().await.unwrap_err();
    assert!(matches!(err, Error::Unresolvable(_)));
    assert!(!handle.is_cached().await);
}

#[tokio::test]
async fn test_new_requires_locator_or_reference() {
    let (_mock, session) = session();
    let err = ElementHandle::new(session, None, None, "nothing").unwrap_err();
    assert!(matches!(err, Error::Unresolvable(_)));
}

#[tokio::test]
async fn test_with_live_retries_after_stale_read() {
    let (mock, session) = session();
    let locator = Locator::css("#status").unwrap();
    mock.add_node(&locator, MockNode::new().with_text("Done"));

    let handle = ElementHandle::from_locator(session, locator, "status");
    handle.resolve().await.unwrap();

    // Reload after the cache is primed: the first read sees a stale node
    let reloader = mock.clone();
    let text = handle
        .with_live(|live| {
            let reloader = reloader.clone();
            async move {
                if reloader.find_calls() == 1 {
                    reloader.reload();
                }
                live.text().await
            }
        })
        .await
        .expect("Stale read should be retried");

    assert_eq!(text, "Done");
    assert_eq!(mock.find_calls(), 2);
}

#[tokio::test]
async fn test_find_all_returns_snapshots() {
    let (mock, session) = session();
    let locator = Locator::css("li.item").unwrap();
    mock.add_node(&locator, MockNode::new().with_text("one"));
    mock.add_node(&locator, MockNode::new().with_text("two"));

    let handles = ElementHandle::find_all(session, &locator, "item")
        .await
        .expect("Failed to find elements");

    assert_eq!(handles.len(), 2);
    assert_eq!(handles[1].description(), "item[1]");
    assert!(handles[0].locator().is_none());
    assert_eq!(handles[1].resolve().await.unwrap().text().await.unwrap(), "two");
}

#[tokio::test]
async fn test_concurrent_resolution_is_idempotent() {
    let (mock, session) = session();
    let locator = Locator::css("#shared").unwrap();
    mock.add_node(&locator, MockNode::new());

    let handle = Arc::new(ElementHandle::from_locator(session, locator, "shared"));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let handle = handle.clone();
            tokio::spawn(async move { handle.resolve().await.map(|live| live.id().to_string()) })
        })
        .collect();

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().unwrap());
    }

    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(mock.find_calls(), 1);
}
