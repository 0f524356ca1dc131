//! Classic block ids.

pub const AIR: u8 = 0;
pub const STONE: u8 = 1;
pub const GRASS: u8 = 2;
pub const DIRT: u8 = 3;
pub const COBBLESTONE: u8 = 4;
pub const PLANKS: u8 = 5;
pub const SAPLING: u8 = 6;
pub const BEDROCK: u8 = 7;
pub const WATER: u8 = 8;
pub const STILL_WATER: u8 = 9;
pub const LAVA: u8 = 10;
pub const STILL_LAVA: u8 = 11;

/// Highest block id a classic client knows.
pub const MAX_BLOCK_ID: u8 = 49;

const NAMES: [&str; MAX_BLOCK_ID as usize + 1] = [
    "air",
    "stone",
    "grass",
    "dirt",
    "cobblestone",
    "planks",
    "sapling",
    "bedrock",
    "water",
    "still_water",
    "lava",
    "still_lava",
    "sand",
    "gravel",
    "gold_ore",
    "iron_ore",
    "coal_ore",
    "log",
    "leaves",
    "sponge",
    "glass",
    "red_cloth",
    "orange_cloth",
    "yellow_cloth",
    "lime_cloth",
    "green_cloth",
    "aqua_green_cloth",
    "cyan_cloth",
    "blue_cloth",
    "purple_cloth",
    "indigo_cloth",
    "violet_cloth",
    "magenta_cloth",
    "pink_cloth",
    "black_cloth",
    "gray_cloth",
    "white_cloth",
    "dandelion",
    "rose",
    "brown_mushroom",
    "red_mushroom",
    "gold_block",
    "iron_block",
    "double_slab",
    "slab",
    "bricks",
    "tnt",
    "bookshelf",
    "mossy_cobblestone",
    "obsidian",
];

/// Whether a classic client can display this block.
pub fn is_valid(id: u8) -> bool {
    id <= MAX_BLOCK_ID
}

/// Human-readable name of a block id.
pub fn name(id: u8) -> Option<&'static str> {
    NAMES.get(id as usize).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_line_up_with_ids() {
        assert_eq!(name(AIR), Some("air"));
        assert_eq!(name(BEDROCK), Some("bedrock"));
        assert_eq!(name(STILL_LAVA), Some("still_lava"));
        assert_eq!(name(MAX_BLOCK_ID), Some("obsidian"));
        assert_eq!(name(MAX_BLOCK_ID + 1), None);
    }

    #[test]
    fn validity() {
        assert!(is_valid(0));
        assert!(is_valid(49));
        assert!(!is_valid(50));
        assert!(!is_valid(255));
    }
}
