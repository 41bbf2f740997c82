// ABOUTME: Process bootstrap for the rollcall daemon
// ABOUTME: Wires config, database, gateway, intake, watcher, and graceful shutdown

mod discord;
mod intake;

use discord::DiscordGateway;
use dotenv::dotenv;
use intake::IntakeState;
use rollcall_core::{apply_migrations, event_channel, Config, Database, MIGRATIONS};
use rollcall_watcher::{Notifier, Reconciler, Watcher};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => tracing::info!("received SIGTERM, initiating graceful shutdown"),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json_logs = std::env::var("ROLLCALL_LOG_JSON")
        .map(|value| value == "true")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let database = Database::new(&config.state_path).await?;
    apply_migrations(&database.pool, MIGRATIONS).await?;
    tracing::info!(path = %config.state_path.display(), "state database ready");

    let gateway = Arc::new(DiscordGateway::new(&config));
    let notifier = Notifier::new(gateway.clone());
    let reconciler = Arc::new(Reconciler::new(database.pool.clone(), gateway, notifier).await?);

    let (events_tx, events_rx) = event_channel::create_channel();
    let watcher = Watcher::new(reconciler, config.sync_interval);
    let cancel_token = watcher.cancel_token();

    let app = intake::routes(IntakeState {
        events: events_tx,
        token: config.token.clone(),
    });
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "intake listening");

    let intake_shutdown = cancel_token.clone();
    let intake_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                intake_shutdown.cancelled().await;
            })
            .await
    });

    let mut watcher_handle = tokio::spawn(watcher.run(events_rx));

    tracing::info!(group_id = %config.group_id, "rollcall running");

    let watcher_exit = tokio::select! {
        _ = wait_for_shutdown_signal() => {
            cancel_token.cancel();
            watcher_handle.await?
        }
        result = &mut watcher_handle => {
            cancel_token.cancel();
            result?
        }
    };

    // Bounded drain window for the intake before giving up on it.
    match tokio::time::timeout(Duration::from_secs(10), intake_handle).await {
        Ok(Ok(Err(e))) => tracing::warn!("intake server error: {e}"),
        Ok(Err(e)) => tracing::warn!("intake server task error: {e}"),
        Err(_) => tracing::warn!("intake server shutdown timed out"),
        Ok(Ok(Ok(()))) => {}
    }

    database.pool.close().await;

    if let Err(e) = watcher_exit {
        tracing::error!("watcher terminated: {e}");
        return Err(e.into());
    }

    tracing::info!("shutdown complete");
    Ok(())
}
