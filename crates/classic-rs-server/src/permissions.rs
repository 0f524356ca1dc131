//! Permission management: operators and bans.
//!
//! Persists data as JSON files in the server directory. Names are stored
//! lowercase so lookups ignore case.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A ban entry with a reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanEntry {
    pub reason: String,
}

/// Manages operators and the ban list with JSON persistence.
#[derive(Debug, Default)]
pub struct PermissionManager {
    dir: PathBuf,
    /// Lowercase names of operators, persisted to `ops.json`.
    pub ops: HashSet<String>,
    /// Operators from `server.toml`. Never written back.
    config_ops: HashSet<String>,
    /// Banned players: lowercase name → ban entry.
    pub banned_players: HashMap<String, BanEntry>,
}

const OPS_FILE: &str = "ops.json";
const BANNED_PLAYERS_FILE: &str = "banned-players.json";

impl PermissionManager {
    /// Load permission data from `dir`. Missing files mean empty lists.
    pub fn load(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            ops: load_set(&dir.join(OPS_FILE)),
            banned_players: load_map(&dir.join(BANNED_PLAYERS_FILE)),
            config_ops: HashSet::new(),
            dir,
        }
    }

    /// Add operators that come from the config file.
    pub fn with_config_ops<'a>(mut self, names: impl IntoIterator<Item = &'a String>) -> Self {
        self.config_ops = names
            .into_iter()
            .map(|name| name.to_ascii_lowercase())
            .collect();
        self
    }

    pub fn is_op(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.ops.contains(&name) || self.config_ops.contains(&name)
    }

    pub fn is_config_op(&self, name: &str) -> bool {
        self.config_ops.contains(&name.to_ascii_lowercase())
    }

    pub fn ban_reason(&self, name: &str) -> Option<&str> {
        self.banned_players
            .get(&name.to_ascii_lowercase())
            .map(|entry| entry.reason.as_str())
    }

    /// Grant operator status. Returns `false` if already an operator.
    pub fn op(&mut self, name: &str) -> bool {
        if self.is_config_op(name) {
            return false;
        }
        let added = self.ops.insert(name.to_ascii_lowercase());
        if added {
            self.save_ops();
        }
        added
    }

    /// Revoke operator status. Returns `false` if not an operator.
    pub fn deop(&mut self, name: &str) -> bool {
        let removed = self.ops.remove(&name.to_ascii_lowercase());
        if removed {
            self.save_ops();
        }
        removed
    }

    pub fn ban(&mut self, name: &str, reason: impl Into<String>) {
        self.banned_players.insert(
            name.to_ascii_lowercase(),
            BanEntry {
                reason: reason.into(),
            },
        );
        self.save_banned_players();
    }

    /// Lift a ban. Returns `false` if the name was not banned.
    pub fn unban(&mut self, name: &str) -> bool {
        let removed = self
            .banned_players
            .remove(&name.to_ascii_lowercase())
            .is_some();
        if removed {
            self.save_banned_players();
        }
        removed
    }

    /// Save the ops list to disk.
    pub fn save_ops(&self) {
        save_set(&self.dir.join(OPS_FILE), &self.ops);
    }

    /// Save the banned players list to disk.
    pub fn save_banned_players(&self) {
        save_map(&self.dir.join(BANNED_PLAYERS_FILE), &self.banned_players);
    }
}

/// Load a HashSet<String> from a JSON array file.
fn load_set(path: &Path) -> HashSet<String> {
    if !path.exists() {
        return HashSet::new();
    }
    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<Vec<String>>(&contents) {
            Ok(vec) => {
                info!("Loaded {} entries from {}", vec.len(), path.display());
                vec.into_iter().map(|n| n.to_ascii_lowercase()).collect()
            }
            Err(e) => {
                warn!("Failed to parse {}: {e}", path.display());
                HashSet::new()
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {e}", path.display());
            HashSet::new()
        }
    }
}

/// Load a HashMap<String, BanEntry> from a JSON object file.
fn load_map(path: &Path) -> HashMap<String, BanEntry> {
    if !path.exists() {
        return HashMap::new();
    }
    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<HashMap<String, BanEntry>>(&contents) {
            Ok(map) => {
                info!("Loaded {} entries from {}", map.len(), path.display());
                map.into_iter()
                    .map(|(name, entry)| (name.to_ascii_lowercase(), entry))
                    .collect()
            }
            Err(e) => {
                warn!("Failed to parse {}: {e}", path.display());
                HashMap::new()
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {e}", path.display());
            HashMap::new()
        }
    }
}

/// Save a HashSet<String> as a sorted JSON array.
fn save_set(path: &Path, set: &HashSet<String>) {
    let mut sorted: Vec<&String> = set.iter().collect();
    sorted.sort();
    match serde_json::to_string_pretty(&sorted) {
        Ok(json) => {
            if let Err(e) = fs::write(path, json) {
                warn!("Failed to write {}: {e}", path.display());
            }
        }
        Err(e) => warn!("Failed to serialize {}: {e}", path.display()),
    }
}

/// Save a HashMap<String, BanEntry> as a JSON object.
fn save_map(path: &Path, map: &HashMap<String, BanEntry>) {
    match serde_json::to_string_pretty(map) {
        Ok(json) => {
            if let Err(e) = fs::write(path, json) {
                warn!("Failed to write {}: {e}", path.display());
            }
        }
        Err(e) => warn!("Failed to serialize {}: {e}", path.display()),
    }
}
