//! Player id allocation.

use crate::error::CapacityError;

/// Player ids are a signed byte on the wire; -1 is reserved.
pub const MAX_PLAYER_IDS: usize = 128;

/// Tracks which ids in `0..capacity` are held by connected players.
#[derive(Debug)]
pub struct PlayerIdTable {
    used: [bool; MAX_PLAYER_IDS],
    capacity: usize,
}

impl PlayerIdTable {
    /// `capacity` is clamped to `1..=MAX_PLAYER_IDS`.
    pub fn new(capacity: usize) -> Self {
        Self {
            used: [false; MAX_PLAYER_IDS],
            capacity: capacity.clamp(1, MAX_PLAYER_IDS),
        }
    }

    /// Take the smallest free id.
    pub fn allocate(&mut self) -> Result<i8, CapacityError> {
        let slot = self.used[..self.capacity]
            .iter()
            .position(|used| !used)
            .ok_or(CapacityError::ServerFull {
                max: self.capacity,
            })?;
        self.used[slot] = true;
        Ok(slot as i8)
    }

    /// Free an id. Returns `false` if it was not held.
    pub fn release(&mut self, id: i8) -> bool {
        match usize::try_from(id).ok().and_then(|i| self.used.get_mut(i)) {
            Some(used) if *used => {
                *used = false;
                true
            }
            _ => false,
        }
    }

    #[cfg(test)]
    pub fn in_use(&self) -> usize {
        self.used.iter().filter(|used| **used).count()
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
