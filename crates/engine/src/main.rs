use anyhow::Context;
use chrono::Utc;

use relay_common::config::AppConfig;
use relay_common::db;
use relay_engine::pipeline::Pipeline;
use relay_engine::store::PgVideoStore;
use relay_feed::YouTubeActivities;
use relay_notifier::WebhookNotifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "upload_relay=info,relay_engine=info,relay_feed=info,relay_notifier=info,relay_common=info"
                    .into()
            }),
        )
        .json()
        .init();

    tracing::info!("===== Upload relay start =====");

    if let Err(e) = run().await {
        tracing::error!(error = ?e, "Upload relay run failed");
        return Err(e);
    }

    tracing::info!("===== Upload relay end =====");
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Failed to parse configuration file")?;

    let pool = db::create_pool(&config.postgres)
        .await
        .context("Failed to connect database")?;

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .context("Failed to apply database migrations")?;
    tracing::info!("Database migrations applied");

    let source = YouTubeActivities::from_config(config.secrets.developer_key.clone(), &config.feed);
    let store = PgVideoStore::new(pool);

    let pipeline = Pipeline::new(
        source,
        store,
        WebhookNotifier::new(),
        config.profile.clone(),
        config.notifications.clone(),
    )
    .with_lookback_days(config.feed.lookback_days);

    let summary = pipeline.run(Utc::now()).await?;
    tracing::info!(
        channels = summary.channels,
        skipped = summary.skipped,
        recorded = summary.recorded,
        delivered = summary.delivered,
        "Relay pass finished"
    );

    pipeline.store().close().await;
    Ok(())
}
