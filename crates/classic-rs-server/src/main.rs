mod auth;
mod config;
mod console;
mod dispatcher;
mod error;
mod heartbeat;
mod listener;
mod outbox;
mod permissions;
mod player_ids;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use classic_rs_proto::packets::Message;
use classic_rs_proto::Packet;
use classic_rs_world::storage::WorldStorage;
use config::ServerConfig;
use permissions::PermissionManager;
use state::{ServerSettings, ServerState, SHUTDOWN_REASON};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let config = match ServerConfig::load("server.toml") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load server.toml: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "{} starting on {}:{}",
        state::SOFTWARE_NAME,
        config.server.address,
        config.server.port
    );
    info!("Name: {}", config.server.name);
    info!("MOTD: {}", config.server.motd);
    info!("Max players: {}", config.server.max_players);
    info!("Verify names: {}", config.server.verify_names);

    let storage = WorldStorage::new(&config.world.save_file);
    let world = match config
        .world
        .on_corrupt_policy()
        .and_then(|policy| storage.load_or_generate(policy).map_err(|e| e.to_string()))
    {
        Ok(w) => w,
        Err(e) => {
            error!("Failed to load world {}: {e}", storage.path().display());
            std::process::exit(1);
        }
    };

    let permissions = PermissionManager::load(".").with_config_ops(&config.server.ops);
    info!(
        "Loaded {} operator(s) plus {} from server.toml, {} ban(s)",
        permissions.ops.len(),
        config.server.ops.len(),
        permissions.banned_players.len()
    );

    let state = Arc::new(ServerState::new(
        ServerSettings::from_config(&config),
        world,
        permissions,
        auth::generate_salt(),
    ));

    let addr: SocketAddr = match format!("{}:{}", config.server.address, config.server.port).parse()
    {
        Ok(a) => a,
        Err(e) => {
            error!("Invalid bind address: {e}");
            std::process::exit(1);
        }
    };
    let tcp = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    info!("Listening on {addr}");

    let listener_task = tokio::spawn(listener::run(tcp, state.clone()));

    let heartbeat_task = if config.heartbeat.enabled {
        Some(heartbeat::start(
            state.clone(),
            config.heartbeat.url.clone(),
            Duration::from_secs(config.heartbeat.interval),
        ))
    } else {
        None
    };

    // Handle Ctrl+C
    let state_ctrlc = state.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        state_ctrlc.shutdown(SHUTDOWN_REASON);
    });

    let (console_tx, mut console_rx) = tokio::sync::mpsc::channel::<String>(32);
    console::spawn_stdin_reader(console_tx);

    let keep_alive = Duration::from_secs(config.network.keep_alive_interval);
    let mut keep_alive_tick = tokio::time::interval(keep_alive.max(Duration::from_secs(1)));

    let auto_save = Duration::from_secs(config.world.auto_save_interval);
    let mut auto_save_tick = tokio::time::interval_at(
        tokio::time::Instant::now() + auto_save,
        auto_save.max(Duration::from_secs(1)),
    );

    loop {
        tokio::select! {
            _ = state.shutdown_signal() => break,
            Some(line) = console_rx.recv() => {
                let result = console::execute(&state, &storage, &line).await;
                for msg in &result.messages {
                    if result.success {
                        info!("{msg}");
                    } else {
                        warn!("{msg}");
                    }
                }
                if result.should_stop {
                    break;
                }
            }
            _ = keep_alive_tick.tick(), if !keep_alive.is_zero() => {
                state.dispatcher.broadcast(Packet::Ping);
            }
            _ = auto_save_tick.tick(), if !auto_save.is_zero() => {
                match state.save_world(&storage).await {
                    Ok(()) => {
                        info!("Auto-saved world");
                        state
                            .dispatcher
                            .broadcast(Packet::Message(Message::system("World saved")));
                    }
                    Err(e) => warn!("Auto-save failed: {e}"),
                }
            }
        }
    }

    state.shutdown(SHUTDOWN_REASON);
    if let Err(e) = listener_task.await {
        warn!("Listener task failed: {e}");
    }
    if let Some(task) = heartbeat_task {
        let _ = task.await;
    }

    match state.save_world(&storage).await {
        Ok(()) => info!("World saved to {}", storage.path().display()),
        Err(e) => error!("Failed to save world: {e}"),
    }
    info!("Server shut down.");
}
