//! Heartbeat: periodically announces the server to a listing service.
//!
//! The service answers with the server's play URL. Failures are logged and
//! retried on the next tick; they never touch the game itself.

use std::sync::Arc;
use std::time::Duration;

use classic_rs_proto::packets::PROTOCOL_VERSION;
use reqwest::{Client, Url};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::state::{HeartbeatInfo, ServerState};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the heartbeat request URL.
pub fn heartbeat_url(base: &str, info: &HeartbeatInfo) -> Result<Url, String> {
    let public = if info.public { "True" } else { "False" };
    Url::parse_with_params(
        base,
        &[
            ("port", info.port.to_string()),
            ("max", info.max.to_string()),
            ("name", info.name.clone()),
            ("public", public.to_string()),
            ("version", PROTOCOL_VERSION.to_string()),
            ("salt", info.salt.clone()),
            ("users", info.users.to_string()),
            ("software", info.software.to_string()),
        ],
    )
    .map_err(|e| format!("invalid heartbeat URL {base:?}: {e}"))
}

/// Send one heartbeat and return the body (the server URL).
pub async fn send(client: &Client, base: &str, info: &HeartbeatInfo) -> Result<String, String> {
    let url = heartbeat_url(base, info)?;
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| format!("HTTP request failed: {e}"))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| format!("Failed to read response: {e}"))?;
    if !status.is_success() {
        return Err(format!("listing service error: {status} - {}", body.trim()));
    }
    Ok(body.trim().to_string())
}

/// Spawn the heartbeat loop. It stops when the server shuts down.
pub fn start(state: Arc<ServerState>, url: String, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let client = match Client::builder().timeout(REQUEST_TIMEOUT).build() {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to build heartbeat client: {e}");
                return;
            }
        };
        info!("Heartbeat enabled, reporting to {url} every {}s", interval.as_secs());

        let mut ticker = tokio::time::interval(interval);
        let mut server_url: Option<String> = None;
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = state.shutdown_signal() => break,
            }
            match send(&client, &url, &state.heartbeat_info()).await {
                Ok(body) if server_url.as_deref() != Some(body.as_str()) => {
                    info!("Server URL: {body}");
                    server_url = Some(body);
                }
                Ok(_) => debug!("Heartbeat sent"),
                Err(e) => warn!("Heartbeat failed: {e}"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn info() -> HeartbeatInfo {
        HeartbeatInfo {
            name: "My Classic Server".into(),
            motd: "hi".into(),
            port: 25565,
            users: 3,
            max: 20,
            public: true,
            salt: "abcdefghijklmnop".into(),
            software: "classic-rs 0.1.0",
        }
    }

    #[test]
    fn url_carries_server_metadata() {
        let url = heartbeat_url("https://example.com/server/heartbeat", &info()).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(url.path(), "/server/heartbeat");
        assert_eq!(get("port"), Some("25565"));
        assert_eq!(get("max"), Some("20"));
        assert_eq!(get("name"), Some("My Classic Server"));
        assert_eq!(get("public"), Some("True"));
        assert_eq!(get("version"), Some("7"));
        assert_eq!(get("salt"), Some("abcdefghijklmnop"));
        assert_eq!(get("users"), Some("3"));
        assert_eq!(get("software"), Some("classic-rs 0.1.0"));
    }

    #[test]
    fn bad_base_url_is_an_error() {
        assert!(heartbeat_url("not a url", &info()).is_err());
    }

    /// Answer one HTTP request with `status` and `body`.
    async fn one_shot_server(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
        });
        format!("http://{addr}/server/heartbeat")
    }

    #[tokio::test]
    async fn send_returns_server_url() {
        let base = one_shot_server("200 OK", "http://example.com/play/abc123\n").await;
        let body = send(&Client::new(), &base, &info()).await.unwrap();
        assert_eq!(body, "http://example.com/play/abc123");
    }

    #[tokio::test]
    async fn send_reports_http_errors() {
        let base = one_shot_server("500 Internal Server Error", "oops").await;
        let err = send(&Client::new(), &base, &info()).await.unwrap_err();
        assert!(err.contains("500"), "{err}");
    }
}
