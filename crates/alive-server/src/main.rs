mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use chrono::FixedOffset;
use tokio_util::sync::CancellationToken;
use tracing::info;

use alive_api::AppStateInner;
use alive_core::channels::{Channel, ChannelKind, EmailChannel, LogChannel, WebhookSmsChannel};
use alive_core::fanout::FanoutEngine;
use alive_core::scanner::InactivityScanner;
use alive_core::scheduler::Scheduler;
use alive_core::templates::Renderer;
use alive_db::{Database, SharedStore};

use crate::config::{Config, EmailMode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alive=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let store: SharedStore = Arc::new(
        Database::open(&config.db_path)
            .with_context(|| format!("open database {}", config.db_path.display()))?,
    );

    // Delivery channels
    let email: Arc<dyn Channel> = match &config.email {
        EmailMode::Log => {
            info!("Email transport: log only");
            Arc::new(LogChannel::new(ChannelKind::Email))
        }
        EmailMode::Deliver(settings) => Arc::new(EmailChannel::new(settings)?),
    };
    let sms: Arc<dyn Channel> = match &config.sms_webhook_url {
        Some(url) => {
            info!("SMS gateway: {}", url);
            Arc::new(WebhookSmsChannel::new(url.clone()))
        }
        None => Arc::new(LogChannel::new(ChannelKind::Sms)),
    };

    let display_offset = FixedOffset::east_opt(config.display_offset_minutes * 60)
        .context("display offset out of range")?;
    let fanout = Arc::new(
        FanoutEngine::new(
            store.clone(),
            email,
            sms,
            Renderer::new(display_offset, config.inactive_hours),
        )
        .with_dispatch_timeout(config.dispatch_timeout),
    );

    // Background inactivity sweep
    let scanner = InactivityScanner::new(store.clone(), config.inactive_after)
        .with_renotify_after(config.renotify_after);
    let scheduler = Arc::new(Scheduler::new(scanner, fanout.clone(), config.sweep_interval));
    let shutdown = CancellationToken::new();
    let sweeps = tokio::spawn(scheduler.run(shutdown.clone()));

    let state = AppStateInner::new(store, config.jwt_secret.clone(), fanout);
    let app = alive_api::router(state, config.static_dir.clone());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Alive server listening on {}", addr);
    info!(
        "Inactivity threshold: {} hours, sweep every {:?}",
        config.inactive_hours, config.sweep_interval
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    sweeps.await.context("scheduler task panicked")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
