mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use shower_api::AppStateInner;
use shower_core::{Clock, SystemClock};
use shower_db::Database;
use shower_live::{
    AppendLog, Dispatcher, GuestbookStore, LogSink, RsvpSink, SubmissionGate, VoteStore,
    WebhookSink, spawn_reveal_timer,
};
use shower_types::{GuestbookEntry, Vote};

use crate::config::Config;

const DEFAULT_LOG_FILTER: &str =
    "shower=debug,shower_live=debug,shower_api=debug,shower_core=debug,shower_db=debug,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = if config.in_memory() {
        warn!("Using an in-memory database; votes are lost on restart");
        Arc::new(Database::open_in_memory()?)
    } else {
        Arc::new(Database::open(&config.db_path)?)
    };
    let votes_log: Arc<dyn AppendLog<Vote>> = db.clone();
    let guestbook_log: Arc<dyn AppendLog<GuestbookEntry>> = db;

    // Shared state
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let votes = VoteStore::open(votes_log, clock.clone()).await?;
    let guestbook = GuestbookStore::open(guestbook_log, clock.clone()).await?;
    let (reveal, _timer) = spawn_reveal_timer(config.reveal, clock, config.tick);

    let rsvp: Arc<dyn RsvpSink> = match &config.rsvp_webhook {
        Some(url) => {
            info!("RSVPs are delivered to {}", url);
            Arc::new(WebhookSink::new(url.clone())?)
        }
        None => {
            warn!("SHOWER_RSVP_WEBHOOK not set; RSVPs only go to the log");
            Arc::new(LogSink)
        }
    };

    let state = Arc::new(AppStateInner {
        dispatcher: Dispatcher::new(votes.clone(), guestbook, reveal.clone()),
        gate: SubmissionGate::new(votes, reveal),
        rsvp,
    });

    let app = shower_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        "Reveal at {} (late guesses {})",
        config.reveal.target, config.reveal.late_submissions
    );
    info!("Shower server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

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
                warn!("Failed to install SIGTERM handler: {}", e);
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
