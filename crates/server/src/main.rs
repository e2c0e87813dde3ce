mod bootstrap;
mod chat;
mod health;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use ratedesk_agent::AgentRuntime;
use ratedesk_core::config::{AppConfig, LoadOptions};
use tokio::sync::watch;
use tokio::task::JoinHandle;

fn init_logging(config: &AppConfig) {
    use ratedesk_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging needs the loaded config, so load it before anything else.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let sweeper = spawn_session_sweeper(
        Arc::clone(&app.runtime),
        Duration::from_secs(app.config.dialogue.session_idle_ttl_secs),
    );

    let router: Router = health::router(app.db_pool.clone(), Arc::clone(&app.runtime))
        .merge(chat::router(Arc::clone(&app.runtime)));
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            })
            .await
    });

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "ratedesk-server listening"
    );

    tokio::select! {
        result = &mut server => {
            sweeper.abort();
            result??;
            return Ok(());
        }
        signal = wait_for_shutdown() => signal?,
    }

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        grace_secs = app.config.server.graceful_shutdown_secs,
        "draining in-flight chat turns"
    );
    let _ = shutdown_tx.send(true);
    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => result??,
        Err(_) => {
            tracing::warn!(
                event_name = "system.server.shutdown_timeout",
                correlation_id = "shutdown",
                "graceful shutdown window elapsed; aborting remaining connections"
            );
            server.abort();
        }
    }

    sweeper.abort();
    app.db_pool.close().await;
    tracing::info!(event_name = "system.server.stopped", correlation_id = "shutdown", "stopped");
    Ok(())
}

/// Drops sessions nobody has touched for `idle_ttl`. Runs until aborted.
fn spawn_session_sweeper(runtime: Arc<AgentRuntime>, idle_ttl: Duration) -> JoinHandle<()> {
    let period = (idle_ttl / 4).clamp(Duration::from_secs(1), Duration::from_secs(60));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let removed = runtime.sessions().purge_idle(idle_ttl).await;
            if removed > 0 {
                tracing::debug!(
                    event_name = "dialogue.sessions.expired",
                    removed,
                    idle_ttl_secs = idle_ttl.as_secs(),
                    "idle sessions expired"
                );
            }
        }
    })
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
