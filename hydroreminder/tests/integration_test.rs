//! Integration tests for HydroReminder
//!
//! These tests verify end-to-end behaviour including:
//! - Sign-in routing and token caching
//! - Reminder scheduling, listing and cancellation
//! - Delivery into the home screen history

use chrono::{DateTime, Duration, Local, TimeZone};
use hydroreminder::app::{self, AppState};
use hydroreminder::config::AppConfig;
use hydroreminder::models::Trigger;
use hydroreminder::screens::{HomeScreen, Layout, Route, SignInScreen};
use hydroreminder::services::auth::SESSION_TOKEN_KEY;
use hydroreminder::services::{MemoryBackend, MemoryStore, ScriptedIdentityProvider, TokenCache};
use std::sync::Arc;

fn start() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2026, 3, 2, 7, 30, 0)
        .earliest()
        .unwrap()
}

/// Helper to build the app around an in-memory backend and credential store
fn create_test_app() -> (AppState, MemoryBackend, Arc<ScriptedIdentityProvider>) {
    let backend = MemoryBackend::starting_at(start());
    let cache = TokenCache::new(Arc::new(MemoryStore::new()));
    let identity = Arc::new(ScriptedIdentityProvider::new(cache.clone()));
    let state = app::setup(
        AppConfig::default(),
        Arc::new(backend.clone()),
        identity.clone(),
        cache,
    );
    (state, backend, identity)
}

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_sign_in_routes_to_home_and_caches_session() {
    let (state, _backend, identity) = create_test_app();
    let mut layout = Layout::new(identity.as_ref());
    assert_eq!(layout.current(), Route::Loading);

    identity.load();
    assert_eq!(layout.current(), Route::Public);

    identity.will_create_session("sess_integration");
    SignInScreen::new(&state).sign_in_with_google().await.unwrap();

    let route = tokio::time::timeout(std::time::Duration::from_secs(2), layout.next_route())
        .await
        .expect("route change not observed");
    assert_eq!(route, Some(Route::Authenticated));
    assert_eq!(
        state.token_cache.get_token(SESSION_TOKEN_KEY).as_deref(),
        Some("sess_integration")
    );
}

#[tokio::test]
async fn test_cached_session_skips_sign_in() {
    let (state, _backend, identity) = create_test_app();
    state.token_cache.save_token(SESSION_TOKEN_KEY, "sess_cached");

    identity.load();

    assert_eq!(Layout::new(identity.as_ref()).current(), Route::Authenticated);
}

#[tokio::test]
async fn test_immediate_reminder_reaches_history() {
    let (state, backend, _identity) = create_test_app();
    let mut home = HomeScreen::new(&state);
    home.mount().await;

    home.test_notification().await;
    backend.advance_to(start() + Duration::seconds(1));
    settle().await;
    assert!(home.history().is_empty());

    backend.advance_to(start() + Duration::seconds(2));
    settle().await;
    assert_eq!(home.history().len(), 1);
}

#[tokio::test]
async fn test_daily_reminders_deliver_newest_first() {
    let (state, backend, _identity) = create_test_app();
    let mut home = HomeScreen::new(&state);
    home.mount().await;

    home.schedule_every_two_hours().await;
    home.schedule_at_selected_time().await;
    assert_eq!(home.scheduled_count(), 9);

    let daily: Vec<Trigger> = state
        .scheduler
        .list_pending()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.trigger)
        .collect();
    assert!(daily.contains(&Trigger::Daily { hour: 9, minute: 0 }));

    // 07:30 -> 11:00 covers the 08:00, 09:00 and 10:00 reminders
    assert_eq!(backend.advance_to(start() + Duration::minutes(210)), 3);
    settle().await;

    let history = home.history();
    assert_eq!(history.len(), 3);
    assert!(history
        .windows(2)
        .all(|pair| pair[0].timestamp >= pair[1].timestamp));

    // Daily reminders stay scheduled after firing
    home.refresh_scheduled_count().await;
    assert_eq!(home.scheduled_count(), 9);
}

#[tokio::test]
async fn test_cancel_all_keeps_history() {
    let (state, backend, _identity) = create_test_app();
    let mut home = HomeScreen::new(&state);
    home.mount().await;

    home.schedule_hourly().await;
    backend.advance_to(start() + Duration::hours(1));
    settle().await;
    assert_eq!(home.history().len(), 1);

    home.cancel_all().await;
    assert_eq!(home.scheduled_count(), 0);
    assert!(state.scheduler.list_pending().await.unwrap().is_empty());
    assert_eq!(home.history().len(), 1);

    backend.advance_to(start() + Duration::hours(5));
    settle().await;
    assert_eq!(home.history().len(), 1);
}

#[tokio::test]
async fn test_backend_outage_is_reported_not_fatal() {
    let (state, backend, _identity) = create_test_app();
    let mut home = HomeScreen::new(&state);
    home.mount().await;

    backend.set_unavailable(true);
    let alert = home.schedule_hourly().await;
    assert!(alert.is_error());

    backend.set_unavailable(false);
    let alert = home.schedule_hourly().await;
    assert!(!alert.is_error());
    assert_eq!(home.scheduled_count(), 1);
}
