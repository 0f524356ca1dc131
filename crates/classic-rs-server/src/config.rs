use serde::Deserialize;
use std::path::Path;

use classic_rs_world::storage::OnCorrupt;

use crate::player_ids::MAX_PLAYER_IDS;

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub server: ServerSection,
    #[serde(default)]
    pub world: WorldSection,
    #[serde(default)]
    pub heartbeat: HeartbeatSection,
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub name: String,
    #[serde(default)]
    pub motd: String,
    #[serde(default = "default_max_players")]
    pub max_players: u32,
    /// Advertise the server on the public list.
    #[serde(default)]
    pub public: bool,
    /// Check verification keys against the heartbeat salt.
    #[serde(default)]
    pub verify_names: bool,
    /// Operators in addition to those in ops.json.
    #[serde(default)]
    pub ops: Vec<String>,
}

fn default_address() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    25565
}

fn default_max_players() -> u32 {
    20
}

#[derive(Debug, Deserialize)]
pub struct WorldSection {
    #[serde(default = "default_save_file")]
    pub save_file: String,
    /// Auto-save interval in seconds. 0 = disabled. Default: 300 (5 minutes).
    #[serde(default = "default_auto_save_interval")]
    pub auto_save_interval: u64,
    /// "fail" or "regenerate".
    #[serde(default = "default_on_corrupt")]
    pub on_corrupt: String,
}

fn default_save_file() -> String {
    "world.dat".into()
}

fn default_auto_save_interval() -> u64 {
    300
}

fn default_on_corrupt() -> String {
    "fail".into()
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            save_file: default_save_file(),
            auto_save_interval: default_auto_save_interval(),
            on_corrupt: default_on_corrupt(),
        }
    }
}

impl WorldSection {
    pub fn on_corrupt_policy(&self) -> Result<OnCorrupt, String> {
        self.on_corrupt.parse()
    }
}

#[derive(Debug, Deserialize)]
pub struct HeartbeatSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_heartbeat_url")]
    pub url: String,
    /// Seconds between heartbeats.
    #[serde(default = "default_heartbeat_interval")]
    pub interval: u64,
}

fn default_heartbeat_url() -> String {
    "https://www.classicube.net/server/heartbeat".into()
}

fn default_heartbeat_interval() -> u64 {
    45
}

impl Default for HeartbeatSection {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_heartbeat_url(),
            interval: default_heartbeat_interval(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NetworkSection {
    /// Packets a session may have queued before it is considered stalled.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
    /// Seconds a single socket write may take.
    #[serde(default = "default_write_timeout")]
    pub write_timeout: u64,
    /// Seconds between keep-alive pings. 0 = disabled.
    #[serde(default = "default_keep_alive_interval")]
    pub keep_alive_interval: u64,
}

fn default_outbound_queue() -> usize {
    1024
}

fn default_write_timeout() -> u64 {
    10
}

fn default_keep_alive_interval() -> u64 {
    2
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            outbound_queue: default_outbound_queue(),
            write_timeout: default_write_timeout(),
            keep_alive_interval: default_keep_alive_interval(),
        }
    }
}

/// Smallest queue that still fits every spawn sent to a joining player.
pub const MIN_OUTBOUND_QUEUE: usize = 2 * MAX_PLAYER_IDS;

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ServerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_PLAYER_IDS as u32).contains(&self.server.max_players) {
            return Err(format!(
                "server.max_players must be between 1 and {MAX_PLAYER_IDS}, got {}",
                self.server.max_players
            ));
        }
        if self.network.outbound_queue < MIN_OUTBOUND_QUEUE {
            return Err(format!(
                "network.outbound_queue must be at least {MIN_OUTBOUND_QUEUE}, got {}",
                self.network.outbound_queue
            ));
        }
        if self.network.write_timeout == 0 {
            return Err("network.write_timeout must be greater than 0".into());
        }
        if self.heartbeat.enabled && self.heartbeat.interval == 0 {
            return Err("heartbeat.interval must be greater than 0".into());
        }
        self.world.on_corrupt_policy()?;
        Ok(())
    }
}
