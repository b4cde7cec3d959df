use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use mcw_nbt::{Flavor, NbtCompound};
use mcw_types::{RegionPos, REGION_SLOTS};

use crate::chunk::Chunk;
use crate::error::StoreResult;
use crate::level::{LEVEL_FILE, REGION_EXTENSION};
use crate::region::{COMPRESSION_ZLIB, HEADER_SIZE, SECTOR_SIZE};

/// Assembles a region file from decoded chunks.
///
/// Chunks are placed by their own position's slot; adding a second chunk for
/// the same slot replaces the first. Payloads are laid out in slot order
/// right after the header.
#[derive(Debug, Default)]
pub struct RegionWriter {
    slots: Vec<Option<Vec<u8>>>,
}

impl RegionWriter {
    pub fn new() -> Self {
        Self {
            slots: vec![None; REGION_SLOTS],
        }
    }

    pub fn add_chunk(&mut self, chunk: &Chunk) -> StoreResult<()> {
        let raw = mcw_nbt::encode("", &chunk.to_tag())?;
        self.add_raw(chunk.pos().region_slot(), &raw);
        Ok(())
    }

    /// Store an already-encoded chunk tag in `slot`.
    pub fn add_raw(&mut self, slot: usize, raw: &[u8]) {
        if self.slots.len() < REGION_SLOTS {
            self.slots.resize(REGION_SLOTS, None);
        }
        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = Some(raw.to_vec());
        }
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_bytes(&self) -> StoreResult<Vec<u8>> {
        let mut out = vec![0u8; HEADER_SIZE as usize];
        for (slot, raw) in self.slots.iter().enumerate() {
            let Some(raw) = raw else { continue };

            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(raw)?;
            let compressed = encoder.finish()?;

            let sector = out.len() as u64 / SECTOR_SIZE;
            let length = compressed.len() as u32 + 1;
            out.extend_from_slice(&length.to_be_bytes());
            out.push(COMPRESSION_ZLIB);
            out.extend_from_slice(&compressed);
            let padded = out.len().next_multiple_of(SECTOR_SIZE as usize);
            out.resize(padded, 0);

            let count = (padded as u64 / SECTOR_SIZE - sector).min(255) as u32;
            let location = ((sector as u32) << 8) | count;
            out[slot * 4..slot * 4 + 4].copy_from_slice(&location.to_be_bytes());
        }
        Ok(out)
    }

    /// Write `r.<x>.<z>.mca` into `dir` and return its path.
    pub fn write(&self, dir: &Path, pos: RegionPos) -> StoreResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("r.{}.{}.{REGION_EXTENSION}", pos.x, pos.z));
        std::fs::write(&path, self.to_bytes()?)?;
        Ok(path)
    }
}

/// Write a gzip-compressed `level.dat` into `dir`.
pub fn write_level_dat(dir: &Path, root: &NbtCompound) -> StoreResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(LEVEL_FILE);
    std::fs::write(&path, mcw_nbt::write("", root, Flavor::GzCompressed)?)?;
    Ok(path)
}
