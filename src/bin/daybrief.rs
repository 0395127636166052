//! daybrief service binary.
//!
//! Loads configuration (failing fast with every missing key listed), opens
//! the profile store, then runs the webhook/trigger gateway and the digest
//! scheduler until Ctrl-C. All diagnostic output goes to stderr.

use anyhow::Context;
use daybrief::channels::WhatsAppDispatcher;
use daybrief::channels::gateway::{GatewayState, run_gateway};
use daybrief::{AppConfig, DigestScheduler, RequestRouter, SqliteProfileStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    let _log_guard = daybrief::logging::init(&config.logging).context("failed to initialise logging")?;

    tracing::info!("daybrief starting");

    let default_zone = config.default_zone()?;
    let store_path = config.store.resolved_path();
    let store = SqliteProfileStore::open(&store_path)
        .with_context(|| format!("failed to open profile store at {}", store_path.display()))?;
    tracing::info!(path = %store_path.display(), "profile store ready");

    let agenda = daybrief_agenda::google_aggregator(&config.agenda)
        .context("failed to build schedule aggregator")?;
    let dispatcher = WhatsAppDispatcher::new(
        config.secrets.whatsapp_access_token.clone(),
        config.secrets.whatsapp_phone_number_id.clone(),
    )
    .context("failed to build WhatsApp dispatcher")?;

    let router = RequestRouter::new(
        Arc::new(store),
        Arc::new(agenda),
        Arc::new(dispatcher),
        default_zone,
    );

    let scheduler = if config.schedule.enabled {
        let scheduler = DigestScheduler::new(router.clone(), config.schedule.clone(), default_zone);
        Some(tokio::spawn(scheduler.run()))
    } else {
        tracing::info!("digest scheduler disabled");
        None
    };

    let state = GatewayState::new(
        router,
        &config.secrets.trigger_token,
        &config.secrets.whatsapp_verify_token,
    );
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for shutdown signal");
        }
        tracing::info!("shutdown requested");
    };

    let result = run_gateway(&config.gateway, state, shutdown).await;

    if let Some(handle) = scheduler {
        handle.abort();
    }
    result.map_err(|e| {
        tracing::error!(error = %e, "gateway exited with error");
        e
    })?;

    tracing::info!("daybrief stopped");
    Ok(())
}
