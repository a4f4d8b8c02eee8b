// HydroReminder - hydration reminder core
// Entry point: runs a headless session against the local job scheduler

use anyhow::Context;
use hydroreminder::app;
use hydroreminder::config::AppConfig;
use hydroreminder::screens::{HomeScreen, Layout, Route, SignInScreen};
use hydroreminder::services::history::format_timestamp;
use hydroreminder::services::{CronBackend, KeyringStore, ScriptedIdentityProvider, TokenCache};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hydroreminder=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting HydroReminder");

    let config = AppConfig::from_env();
    let backend = Arc::new(
        CronBackend::new()
            .await
            .context("failed to start notification scheduler")?,
    );
    let token_cache = TokenCache::new(Arc::new(KeyringStore::new()));
    let identity = Arc::new(
        ScriptedIdentityProvider::new(token_cache.clone())
            .with_publishable_key(config.publishable_key.clone()),
    );

    let state = app::setup(config, backend.clone(), identity.clone(), token_cache);
    let mut layout = Layout::new(identity.as_ref());

    identity.load();
    if layout.current() == Route::Public {
        identity.will_create_session(format!("sess_{}", uuid::Uuid::new_v4().simple()));
        SignInScreen::new(&state)
            .sign_in_with_google()
            .await
            .context("sign-in failed")?;
    }
    if layout.current() != Route::Authenticated {
        layout.next_route().await;
    }
    tracing::info!("Signed in, opening home screen");

    let mut home = HomeScreen::new(&state);
    home.mount().await;

    let alert = home.test_notification().await;
    tracing::info!("{}: {}", alert.title, alert.message);
    let alert = home.schedule_every_two_hours().await;
    tracing::info!("{}: {}", alert.title, alert.message);
    tracing::info!("{} reminders scheduled", home.scheduled_count());

    tokio::time::sleep(Duration::from_secs(3)).await;
    for item in home.history() {
        tracing::info!(
            "[{}] {} - {}",
            format_timestamp(&item.timestamp),
            item.title,
            item.body
        );
    }

    let alert = home.cancel_all().await;
    tracing::info!("{}: {}", alert.title, alert.message);

    home.sign_out().await?;
    backend.shutdown().await?;

    tracing::info!("HydroReminder stopped");
    Ok(())
}
