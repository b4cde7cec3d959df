//! World, chunk and region coordinates.
//!
//! Conversions use arithmetic shifts so negative coordinates floor toward
//! negative infinity: chunk `-1` lives in region `-1`, not region `0`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Chunks along one edge of a region.
pub const CHUNKS_PER_REGION: i32 = 32;

/// Chunk slots in a region file.
pub const REGION_SLOTS: usize = (CHUNKS_PER_REGION * CHUNKS_PER_REGION) as usize;

/// Absolute block position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The chunk column containing this block.
    pub fn chunk(&self) -> ChunkPos {
        ChunkPos::new(self.x >> 4, self.z >> 4)
    }

    /// Coordinates relative to the owning chunk: `x`/`z` in `[0,16)`, `y` unchanged.
    pub fn local(&self) -> (usize, i32, usize) {
        ((self.x & 15) as usize, self.y, (self.z & 15) as usize)
    }
}

/// World-relative chunk coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn region(&self) -> RegionPos {
        RegionPos::new(self.x >> 5, self.z >> 5)
    }

    /// Index of this chunk inside its region's location table (`x` fastest).
    pub fn region_slot(&self) -> usize {
        ((self.x & 31) + (self.z & 31) * CHUNKS_PER_REGION) as usize
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}

/// Region coordinate, encoded in region file names as `r.<x>.<z>.mca`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionPos {
    pub x: i32,
    pub z: i32,
}

impl RegionPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// World chunk coordinate of a location-table slot.
    pub fn chunk_at(&self, slot: usize) -> Result<ChunkPos, TypeError> {
        if slot >= REGION_SLOTS {
            return Err(TypeError::SlotOutOfRange(slot));
        }
        let slot = slot as i32;
        Ok(ChunkPos::new(
            self.x * CHUNKS_PER_REGION + slot % CHUNKS_PER_REGION,
            self.z * CHUNKS_PER_REGION + slot / CHUNKS_PER_REGION,
        ))
    }
}

impl fmt::Display for RegionPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r.{}.{}", self.x, self.z)
    }
}
