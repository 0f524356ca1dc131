//! The voxel grid.

use bytes::Bytes;

use crate::error::WorldError;
use crate::serializer;

/// World size along X.
pub const WIDTH: usize = 256;
/// World size along Y (vertical).
pub const HEIGHT: usize = 64;
/// World size along Z.
pub const DEPTH: usize = 256;
/// Total number of blocks.
pub const VOLUME: usize = WIDTH * HEIGHT * DEPTH;

/// A dense block grid in Y-major order: `x + z*WIDTH + y*WIDTH*DEPTH`.
#[derive(Clone, PartialEq, Eq)]
pub struct World {
    blocks: Box<[u8]>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("width", &WIDTH)
            .field("height", &HEIGHT)
            .field("depth", &DEPTH)
            .finish()
    }
}

impl World {
    /// An empty world filled with air.
    pub fn new() -> Self {
        Self {
            blocks: vec![0u8; VOLUME].into_boxed_slice(),
        }
    }

    /// Wrap a raw grid. The length must be exactly [`VOLUME`].
    pub fn from_blocks(blocks: Vec<u8>) -> Result<Self, WorldError> {
        if blocks.len() != VOLUME {
            return Err(WorldError::CorruptSnapshot(format!(
                "expected {VOLUME} blocks, got {}",
                blocks.len()
            )));
        }
        Ok(Self {
            blocks: blocks.into_boxed_slice(),
        })
    }

    /// Whether the coordinate lies inside the world.
    pub fn contains(x: i32, y: i32, z: i32) -> bool {
        (0..WIDTH as i32).contains(&x)
            && (0..HEIGHT as i32).contains(&y)
            && (0..DEPTH as i32).contains(&z)
    }

    /// Linear index of a coordinate.
    pub fn index(x: i32, y: i32, z: i32) -> Result<usize, WorldError> {
        if !Self::contains(x, y, z) {
            return Err(WorldError::OutOfBounds { x, y, z });
        }
        Ok(x as usize + z as usize * WIDTH + y as usize * WIDTH * DEPTH)
    }

    /// Block type at a coordinate.
    pub fn get(&self, x: i32, y: i32, z: i32) -> Result<u8, WorldError> {
        Ok(self.blocks[Self::index(x, y, z)?])
    }

    /// Replace the block at a coordinate, returning the previous type.
    pub fn set(&mut self, x: i32, y: i32, z: i32, block: u8) -> Result<u8, WorldError> {
        let index = Self::index(x, y, z)?;
        Ok(std::mem::replace(&mut self.blocks[index], block))
    }

    /// The raw grid in linear order.
    pub fn blocks(&self) -> &[u8] {
        &self.blocks
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut [u8] {
        &mut self.blocks
    }

    /// Block coordinate players spawn at: the centre column, half way up.
    pub fn spawn_point() -> (i32, i32, i32) {
        ((WIDTH / 2) as i32, (HEIGHT / 2) as i32, (DEPTH / 2) as i32)
    }

    /// Compressed snapshot used for persistence and initial transfer.
    pub fn snapshot(&self) -> Result<Bytes, WorldError> {
        serializer::encode_snapshot(&self.blocks)
    }

    /// Rebuild a world from [`World::snapshot`] output.
    pub fn load(data: &[u8]) -> Result<Self, WorldError> {
        Self::from_blocks(serializer::decode_snapshot(data)?)
    }
}
