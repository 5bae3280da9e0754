use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use folio_core::{
    AuthChangeEvent, AuthError, IdentityProvider, Scope, SessionBridge, SessionContext,
    SessionState, use_session,
};
use folio_test_support::{FakeIdentityProvider, sample_session, sample_user};
use tokio_stream::StreamExt;

const WAIT: Duration = Duration::from_secs(2);

async fn wait_for_state(
    context: &SessionContext,
    predicate: impl Fn(&SessionState) -> bool,
) -> Result<SessionState> {
    let mut changes = context.changes();
    tokio::time::timeout(WAIT, async {
        while let Some(state) = changes.next().await {
            if predicate(&state) {
                return Some(state);
            }
        }
        None
    })
    .await
    .context("timed out waiting for session state")?
    .context("session bridge stopped publishing")
}

async fn wait_for_get_user(provider: &FakeIdentityProvider) {
    while provider.get_user_calls() == 0 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn initial_fetch_populates_identity_and_clears_loading() -> Result<()> {
    let user = sample_user("admin@example.com");
    let provider =
        Arc::new(FakeIdentityProvider::new().with_session(sample_session(user.clone())));
    let bridge = SessionBridge::mount(provider.clone());
    let context = bridge.context();
    assert!(context.is_loading());
    assert_eq!(context.identity(), None);

    let state = tokio::time::timeout(WAIT, context.wait_until_loaded()).await?;
    assert!(!state.loading);
    assert_eq!(state.identity, Some(user));
    assert_eq!(provider.get_user_calls(), 1);
    bridge.teardown().await;
    Ok(())
}

#[tokio::test]
async fn failed_fetch_still_finishes_loading_exactly_once() -> Result<()> {
    let provider = Arc::new(FakeIdentityProvider::new());
    provider.fail_get_user(AuthError::new("upstream unavailable", Some(503), None));
    let bridge = SessionBridge::mount(provider.clone());
    let context = bridge.context();

    let state = tokio::time::timeout(WAIT, context.wait_until_loaded()).await?;
    assert_eq!(state, SessionState { identity: None, loading: false });

    let user = sample_user("admin@example.com");
    provider.emit(AuthChangeEvent::SignedIn, Some(sample_session(user.clone())));
    let state = wait_for_state(&context, |state| state.identity.is_some()).await?;
    assert!(!state.loading);
    assert_eq!(state.identity, Some(user));
    assert_eq!(provider.get_user_calls(), 1);
    bridge.teardown().await;
    Ok(())
}

#[tokio::test]
async fn notifications_replace_identity_after_load() -> Result<()> {
    let provider = Arc::new(FakeIdentityProvider::new());
    let bridge = SessionBridge::mount(provider.clone());
    let context = bridge.context();
    tokio::time::timeout(WAIT, context.wait_until_loaded()).await?;

    let user = sample_user("editor@example.com");
    provider.emit(AuthChangeEvent::TokenRefreshed, Some(sample_session(user.clone())));
    wait_for_state(&context, |state| state.identity.as_ref() == Some(&user)).await?;

    provider.emit(AuthChangeEvent::SignedOut, None);
    wait_for_state(&context, |state| state.identity.is_none()).await?;
    bridge.teardown().await;
    Ok(())
}

#[tokio::test]
async fn stale_fetch_landing_last_wins_over_notification() -> Result<()> {
    let provider = Arc::new(FakeIdentityProvider::new());
    provider.hold_get_user();
    let bridge = SessionBridge::mount(provider.clone());
    let context = bridge.context();
    wait_for_get_user(&provider).await;

    let user = sample_user("admin@example.com");
    provider.emit(AuthChangeEvent::SignedIn, Some(sample_session(user.clone())));
    let state = wait_for_state(&context, |state| state.identity.is_some()).await?;
    assert!(state.loading, "notifications never clear loading");

    provider.release_get_user();
    let state = tokio::time::timeout(WAIT, context.wait_until_loaded()).await?;
    assert_eq!(state.identity, None);
    bridge.teardown().await;
    Ok(())
}

#[tokio::test]
async fn notification_landing_after_fetch_wins() -> Result<()> {
    let provider = Arc::new(FakeIdentityProvider::new());
    let bridge = SessionBridge::mount(provider.clone());
    let context = bridge.context();
    tokio::time::timeout(WAIT, context.wait_until_loaded()).await?;

    let user = sample_user("admin@example.com");
    provider.emit(AuthChangeEvent::SignedIn, Some(sample_session(user.clone())));
    let state = wait_for_state(&context, |state| state.identity.is_some()).await?;
    assert_eq!(state.identity, Some(user));
    bridge.teardown().await;
    Ok(())
}

#[tokio::test]
async fn rejected_sign_in_leaves_identity_untouched() -> Result<()> {
    let user = sample_user("admin@example.com");
    let provider =
        Arc::new(FakeIdentityProvider::new().with_account(user.clone(), "correct horse"));
    let bridge = SessionBridge::mount(provider.clone());
    let context = bridge.context();
    tokio::time::timeout(WAIT, context.wait_until_loaded()).await?;

    let response = context.sign_in("admin@example.com", "wrong").await;
    let error = response.error.context("expected rejection")?;
    assert_eq!(error.code.as_deref(), Some("invalid_credentials"));
    assert!(response.data.session.is_none());
    assert_eq!(context.identity(), None);

    let response = context.sign_in("admin@example.com", "correct horse").await;
    assert!(response.is_ok());
    let state = wait_for_state(&context, |state| state.identity.is_some()).await?;
    assert_eq!(state.identity, Some(user));
    assert_eq!(provider.sign_in_calls(), 2);
    bridge.teardown().await;
    Ok(())
}

#[tokio::test]
async fn sign_out_clears_identity_through_notification() -> Result<()> {
    let user = sample_user("admin@example.com");
    let provider = Arc::new(FakeIdentityProvider::new().with_session(sample_session(user)));
    let bridge = SessionBridge::mount(provider.clone());
    let context = bridge.context();
    let state = tokio::time::timeout(WAIT, context.wait_until_loaded()).await?;
    assert!(state.identity.is_some());

    provider.fail_sign_out(AuthError::new("network down", None, None));
    let failed = context.sign_out().await;
    assert!(failed.error.is_some());
    assert!(context.identity().is_some());

    let response = context.sign_out().await;
    assert!(response.error.is_none());
    wait_for_state(&context, |state| state.identity.is_none()).await?;
    assert_eq!(provider.sign_out_calls(), 2);
    bridge.teardown().await;
    Ok(())
}

#[tokio::test]
async fn teardown_unsubscribes_and_freezes_state() -> Result<()> {
    let provider = Arc::new(FakeIdentityProvider::new());
    let bridge = SessionBridge::mount(provider.clone());
    let context = bridge.context();
    tokio::time::timeout(WAIT, context.wait_until_loaded()).await?;
    assert_eq!(provider.subscriber_count(), 1);

    bridge.teardown().await;
    assert_eq!(provider.subscriber_count(), 0);

    let late = sample_session(sample_user("late@example.com"));
    provider.emit(AuthChangeEvent::SignedIn, Some(late));
    tokio::task::yield_now().await;
    assert_eq!(context.snapshot(), SessionState { identity: None, loading: false });
    Ok(())
}

#[tokio::test]
async fn teardown_abandons_an_in_flight_fetch() -> Result<()> {
    let provider = Arc::new(FakeIdentityProvider::new());
    provider.hold_get_user();
    let bridge = SessionBridge::mount(provider.clone());
    let context = bridge.context();
    wait_for_get_user(&provider).await;

    bridge.teardown().await;
    provider.release_get_user();
    tokio::task::yield_now().await;
    assert!(context.is_loading());
    assert_eq!(context.identity(), None);
    assert!(context.wait_until_loaded().await.loading);
    Ok(())
}

#[tokio::test]
async fn consumers_resolve_the_context_through_scope() -> Result<()> {
    let provider: Arc<dyn IdentityProvider> = Arc::new(FakeIdentityProvider::new());
    let bridge = SessionBridge::mount(provider);
    let root = Scope::root();
    let app = bridge.provide(&root).provide("page");

    let context = use_session(&app)?;
    tokio::time::timeout(WAIT, context.wait_until_loaded()).await?;
    assert!(use_session(&root).is_err());
    bridge.teardown().await;
    Ok(())
}
