//! Flat world generator.
//!
//! - Y = 0: Bedrock
//! - Y = 1..SURFACE_Y: Dirt
//! - Y = SURFACE_Y: Grass
//! - above: Air

use crate::block;
use crate::world::{World, DEPTH, HEIGHT, WIDTH};

/// Height of the grass layer. Players spawn standing just above it.
pub const SURFACE_Y: usize = HEIGHT / 2 - 1;

/// Generate a fresh flat world.
pub fn generate_flat() -> World {
    let layer = WIDTH * DEPTH;
    let mut world = World::new();
    let blocks = world.blocks_mut();
    for y in 0..=SURFACE_Y {
        let fill = match y {
            0 => block::BEDROCK,
            y if y == SURFACE_Y => block::GRASS,
            _ => block::DIRT,
        };
        blocks[y * layer..(y + 1) * layer].fill(fill);
    }
    world
}
