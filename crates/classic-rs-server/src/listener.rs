//! Connection Manager: accepts sockets and runs one session task per client.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::session::Session;
use crate::state::ServerState;

/// How long shutdown waits for sessions to say goodbye.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Accept connections until the server shuts down, then wait for the
/// remaining sessions to finish.
pub async fn run(listener: TcpListener, state: Arc<ServerState>) {
    let mut sessions = JoinSet::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    if state.is_shutting_down() {
                        debug!("Refusing {addr}: shutting down");
                        break;
                    }
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!("Failed to set TCP_NODELAY for {addr}: {e}");
                    }
                    sessions.spawn(Session::new(state.clone(), addr, stream).run());
                }
                Err(e) => warn!("Accept error: {e}"),
            },
            Some(finished) = sessions.join_next(), if !sessions.is_empty() => {
                if let Err(e) = finished {
                    warn!("Session task failed: {e}");
                }
            }
            _ = state.shutdown_signal() => break,
        }
    }

    if !sessions.is_empty() {
        info!("Waiting for {} session(s) to close", sessions.len());
    }
    let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
        while sessions.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        warn!("Aborting {} unresponsive session(s)", sessions.len());
        sessions.abort_all();
    }
}
