//! File-based world persistence.
//!
//! The world is kept in a single snapshot file. Saves go to a sibling
//! temporary file which is renamed over the target, so a crash mid-save
//! leaves the previous snapshot intact.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{info, warn};

use crate::error::WorldError;
use crate::flat_generator::generate_flat;
use crate::world::World;

/// What to do when the snapshot on disk cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnCorrupt {
    /// Refuse to start.
    #[default]
    Fail,
    /// Move the bad file aside and generate a new world.
    Regenerate,
}

impl FromStr for OnCorrupt {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fail" => Ok(Self::Fail),
            "regenerate" => Ok(Self::Regenerate),
            other => Err(format!(
                "unknown on_corrupt policy '{other}' (expected 'fail' or 'regenerate')"
            )),
        }
    }
}

impl fmt::Display for OnCorrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fail => "fail",
            Self::Regenerate => "regenerate",
        })
    }
}

/// Snapshot file on disk.
#[derive(Debug, Clone)]
pub struct WorldStorage {
    path: PathBuf,
}

impl WorldStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Write an encoded snapshot atomically.
    pub fn save_snapshot(&self, snapshot: &[u8]) -> Result<(), WorldError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp = self.temp_path();
        fs::write(&temp, snapshot)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }

    /// Snapshot and save a world.
    pub fn save(&self, world: &World) -> Result<(), WorldError> {
        self.save_snapshot(&world.snapshot()?)
    }

    /// Load the world, or `None` if no snapshot exists yet.
    pub fn load(&self) -> Result<Option<World>, WorldError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        World::load(&data).map(Some)
    }

    /// Load the world, generating a flat one when none exists.
    ///
    /// A corrupt snapshot is handled according to `policy`.
    pub fn load_or_generate(&self, policy: OnCorrupt) -> Result<World, WorldError> {
        match self.load() {
            Ok(Some(world)) => {
                info!("Loaded world from {}", self.path.display());
                Ok(world)
            }
            Ok(None) => {
                info!(
                    "No world at {}, generating a flat world",
                    self.path.display()
                );
                let world = generate_flat();
                self.save(&world)?;
                Ok(world)
            }
            Err(WorldError::CorruptSnapshot(reason)) if policy == OnCorrupt::Regenerate => {
                let mut backup = self.path.clone().into_os_string();
                backup.push(".corrupt");
                warn!(
                    "World at {} is corrupt ({reason}), moving it to {} and regenerating",
                    self.path.display(),
                    Path::new(&backup).display()
                );
                fs::rename(&self.path, &backup)?;
                let world = generate_flat();
                self.save(&world)?;
                Ok(world)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "classic_rs_world_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn save_then_load() {
        let dir = temp_dir();
        let storage = WorldStorage::new(dir.join("world.dat"));
        let mut world = World::new();
        world.set(10, 5, 10, 1).unwrap();
        storage.save(&world).unwrap();
        assert!(!storage.temp_path().exists());

        let loaded = storage.load().unwrap().unwrap();
        assert_eq!(loaded.get(10, 5, 10).unwrap(), 1);
        assert_eq!(loaded, world);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_file_generates_flat_world() {
        let dir = temp_dir();
        let storage = WorldStorage::new(dir.join("nested").join("world.dat"));
        assert!(storage.load().unwrap().is_none());

        let world = storage.load_or_generate(OnCorrupt::Fail).unwrap();
        assert_eq!(world, generate_flat());
        assert!(storage.path().exists());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn corrupt_file_fails_by_default() {
        let dir = temp_dir();
        let storage = WorldStorage::new(dir.join("world.dat"));
        fs::write(storage.path(), b"garbage").unwrap();
        assert!(matches!(
            storage.load_or_generate(OnCorrupt::Fail),
            Err(WorldError::CorruptSnapshot(_))
        ));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn corrupt_file_regenerates_when_asked() {
        let dir = temp_dir();
        let storage = WorldStorage::new(dir.join("world.dat"));
        fs::write(storage.path(), b"garbage").unwrap();
        let world = storage.load_or_generate(OnCorrupt::Regenerate).unwrap();
        assert_eq!(world, generate_flat());
        assert!(dir.join("world.dat.corrupt").exists());
        assert_eq!(storage.load().unwrap().unwrap(), world);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn policy_parsing() {
        assert_eq!("fail".parse::<OnCorrupt>(), Ok(OnCorrupt::Fail));
        assert_eq!("regenerate".parse::<OnCorrupt>(), Ok(OnCorrupt::Regenerate));
        assert!("panic".parse::<OnCorrupt>().is_err());
        assert_eq!(OnCorrupt::Regenerate.to_string(), "regenerate");
    }
}
