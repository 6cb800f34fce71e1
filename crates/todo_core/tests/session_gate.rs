mod common;

use common::{wait_until, FakeAuth, RecordingNavigator};
use std::sync::atomic::Ordering;
use todo_core::screens::{GateView, SessionGate};
use todo_core::{Route, SessionChange, SessionContext};

#[tokio::test]
async fn no_session_redirects_to_login_before_rendering() {
    let auth = FakeAuth::new();
    let nav = RecordingNavigator::new();
    let ctx = SessionContext::new(auth.clone());
    let mut gate = SessionGate::new(ctx.clone(), nav.clone());

    assert_eq!(gate.mount().await, GateView::RedirectedToLogin);
    assert_eq!(nav.history(), vec![Route::Login]);
    assert!(!ctx.is_signed_in().await);
    gate.unmount().await;
}

#[tokio::test]
async fn present_session_renders_todos_without_navigation() {
    let auth = FakeAuth::new();
    let session = auth.signed_in_as("ada@example.com");
    let nav = RecordingNavigator::new();
    let ctx = SessionContext::new(auth.clone());
    let mut gate = SessionGate::new(ctx.clone(), nav.clone());

    assert_eq!(gate.mount().await, GateView::Todos(session.clone()));
    assert!(nav.history().is_empty());
    assert_eq!(ctx.current().await, Some(session));
    gate.unmount().await;
}

#[tokio::test]
async fn failed_session_query_fails_closed() {
    let auth = FakeAuth::new();
    auth.signed_in_as("ada@example.com");
    auth.fail_session_query.store(true, Ordering::SeqCst);
    let nav = RecordingNavigator::new();
    let mut gate = SessionGate::new(SessionContext::new(auth.clone()), nav.clone());

    assert_eq!(gate.mount().await, GateView::RedirectedToLogin);
    assert_eq!(nav.history(), vec![Route::Login]);
}

#[tokio::test]
async fn signed_out_event_redirects_to_login() {
    let auth = FakeAuth::new();
    auth.signed_in_as("ada@example.com");
    let nav = RecordingNavigator::new();
    let ctx = SessionContext::new(auth.clone());
    let mut gate = SessionGate::new(ctx.clone(), nav.clone());
    gate.mount().await;

    auth.emit(SessionChange::signed_out());

    wait_until(|| nav.history() == vec![Route::Login]).await;
    assert!(!ctx.is_signed_in().await);
    gate.unmount().await;
}

#[tokio::test]
async fn session_event_updates_held_reference_without_navigation() {
    let auth = FakeAuth::new();
    auth.signed_in_as("ada@example.com");
    let nav = RecordingNavigator::new();
    let ctx = SessionContext::new(auth.clone());
    let mut gate = SessionGate::new(ctx.clone(), nav.clone());
    gate.mount().await;

    let refreshed = common::session_for("ada@example.com");
    auth.emit(SessionChange::token_refreshed(refreshed.clone()));

    for _ in 0..200 {
        if ctx.current().await.as_ref() == Some(&refreshed) {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert_eq!(ctx.current().await, Some(refreshed));
    assert!(nav.history().is_empty());
    gate.unmount().await;
}

#[tokio::test]
async fn unmounted_gate_ignores_later_events() {
    let auth = FakeAuth::new();
    auth.signed_in_as("ada@example.com");
    let nav = RecordingNavigator::new();
    let mut gate = SessionGate::new(SessionContext::new(auth.clone()), nav.clone());
    gate.mount().await;
    assert!(gate.is_listening());

    gate.unmount().await;
    assert!(!gate.is_listening());
    assert_eq!(auth.broadcaster.subscriber_count(), 0);

    auth.emit(SessionChange::signed_out());
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(nav.history().is_empty());
}

#[tokio::test]
async fn dropping_the_gate_releases_its_listener() {
    let auth = FakeAuth::new();
    auth.signed_in_as("ada@example.com");
    let nav = RecordingNavigator::new();
    let mut gate = SessionGate::new(SessionContext::new(auth.clone()), nav.clone());
    gate.mount().await;
    drop(gate);

    wait_until(|| auth.broadcaster.subscriber_count() == 0).await;
}
