use chrono::Utc;
use ideabox::actions::Actions;
use ideabox::backend::Backend;
use ideabox::config::AppConfig;
use ideabox::controller::{AuthPhase, SessionController};
use ideabox::gateway::Gateway;
use ideabox::routes::Route;
use ideabox::{store, time_utils};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Smoke client: restores or establishes a session against the
/// configured backend, runs the full bootstrap, logs a summary of what
/// the store holds and signs back out.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let gateway = Gateway::connect(&config)?;
    let store = store::shared();
    let backend: Arc<dyn Backend> = gateway.clone();
    let controller = SessionController::new(backend.clone(), store.clone());
    controller.start();

    controller.initialize(Route::Home).await;

    if controller.phase().await != AuthPhase::Authenticated {
        let email = std::env::var("IDEABOX_EMAIL").ok();
        let password = std::env::var("IDEABOX_PASSWORD").ok();
        let (Some(email), Some(password)) = (email, password) else {
            tracing::info!("no session to restore and no credentials configured, exiting");
            return Ok(());
        };
        gateway.auth().sign_in_with_password(&email, &password).await?;
        // The auth listener picks up the sign-in and runs profile
        // lookup plus bootstrap; wait for it to settle.
        wait_for(&controller, AuthPhase::Authenticated).await?;
    }

    let top_idea = {
        let store = store.read().await;
        let name = store
            .user()
            .map(|user| user.full_name.clone())
            .unwrap_or_else(|| "?".into());
        tracing::info!(
            "signed in as {name}: {} ideas cached, {} unread notifications",
            store.ideas().len(),
            store.unread_count()
        );
        if let Some(cycle) = store.current_cycle() {
            tracing::info!(
                "cycle {}: review on {}, {} days remaining",
                cycle.cycle_number,
                time_utils::format_short_date(cycle.review_date),
                time_utils::days_until_review(cycle, Utc::now().date_naive())
            );
        }
        store
            .ideas()
            .iter()
            .max_by(|a, b| {
                a.combined_score()
                    .partial_cmp(&b.combined_score())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|idea| idea.id)
    };

    if let Some(idea_id) = top_idea {
        let actions = Actions::new(backend, store.clone(), controller.route_handle());
        let detail = actions.load_idea(idea_id).await?;
        tracing::info!(
            "top idea: \"{}\" (combined score {:.1}, {} comments, {} votes)",
            detail.idea.title,
            detail.idea.combined_score(),
            detail.comments.len(),
            detail.votes.len()
        );
    }

    gateway.auth().sign_out().await;
    controller.stop();
    Ok(())
}

async fn wait_for(controller: &SessionController, phase: AuthPhase) -> anyhow::Result<()> {
    for _ in 0..100 {
        if controller.phase().await == phase {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    anyhow::bail!("timed out waiting for the session to settle")
}
