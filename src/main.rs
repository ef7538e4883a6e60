//! Pigeon - one-way Discord to WhatsApp message bridge.
//!
//! Relays text posted in a single Discord channel into a single WhatsApp
//! conversation via a local sidecar gateway. The WhatsApp session is
//! persisted so a completed pairing survives restarts.

mod bridge;
mod common;
mod config;
mod discord;
mod whatsapp;

use anyhow::Result;
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use bridge::{BridgeConfig, BridgeController};
use config::Config;
use whatsapp::{ConnectionManager, GatewayTransport, SessionStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Pigeon v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration; nothing starts with an incomplete environment.
    let config = Config::from_env().map_err(|e| {
        error!("Configuration error:\n{}", e);
        e
    })?;

    info!("  Source channel: {}", config.source_channel);
    info!("  Target conversation: {}", config.target_jid);
    info!("  Gateway: {}", config.gateway_url);
    info!("  Session dir: {}", config.session_dir);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ============================================================
    // WhatsApp connection manager (started before Discord, matching
    // the pairing-first startup order; early Discord messages are
    // dropped by the controller until the session opens)
    // ============================================================
    let store = SessionStore::new(&config.session_dir);
    let transport = GatewayTransport::new(&config.gateway_url);
    let manager = ConnectionManager::new(
        transport,
        store,
        config.reconnect_delay,
        Box::new(|code| {
            // Operator-facing side channel: the gateway's pairing code,
            // rendered straight to the terminal for manual approval.
            println!("\n==== WhatsApp pairing code ====\n{}\n===============================\n", code);
        }),
    );

    let mut fatal_rx = manager.subscribe_fatal();
    let manager_task = manager
        .start(shutdown_rx)
        .expect("connection manager started twice");

    // Announce ready transitions; the controller itself just drops
    // messages while the session is down.
    let mut ready_rx = manager.subscribe_ready();
    tokio::spawn(async move {
        while ready_rx.changed().await.is_ok() {
            if *ready_rx.borrow() {
                info!("WhatsApp session open - relay active");
            } else {
                warn!("WhatsApp session down - messages will be dropped");
            }
        }
    });

    // ============================================================
    // Bridge controller
    // ============================================================
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let controller = BridgeController::new(
        BridgeConfig {
            source_channel: config.source_channel,
            target_conversation: config.target_jid.clone(),
        },
        manager.clone(),
    );
    let controller_task = tokio::spawn(controller.run(events_rx));

    // ============================================================
    // Discord client
    // ============================================================
    info!("Starting Discord client...");
    let mut client = discord::build_client(&config.discord_token, events_tx)
        .await
        .map_err(|e| {
            error!("Failed to build Discord client: {}", e);
            e
        })?;

    let discord_task = tokio::spawn(async move {
        if let Err(e) = client.start().await {
            error!("Discord client error: {}", e);
        }
    });

    // ============================================================
    // Run until shutdown or fatal session loss
    // ============================================================
    tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutting down...");
            let _ = shutdown_tx.send(true);
            let timeout = tokio::time::Duration::from_secs(5);
            match tokio::time::timeout(timeout, manager_task).await {
                Ok(Ok(())) => info!("WhatsApp connection closed"),
                Ok(Err(e)) => warn!("Connection manager task panicked: {}", e),
                Err(_) => warn!("WhatsApp shutdown timed out"),
            }
            info!("Exiting...");
            Ok(())
        }
        _ = fatal_rx.changed() => {
            // The manager has already stopped its loop with no reconnect
            // pending; the session must be re-paired by the operator.
            error!("WhatsApp session is permanently invalid - exiting");
            std::process::exit(1);
        }
        _ = discord_task => {
            error!("Discord client stopped unexpectedly");
            std::process::exit(1);
        }
        _ = controller_task => {
            error!("Bridge controller stopped unexpectedly");
            std::process::exit(1);
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
