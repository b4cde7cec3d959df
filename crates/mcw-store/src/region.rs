use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;
use mcw_types::{BlockPos, ChunkPos, RegionPos, REGION_SLOTS};
use tracing::debug;

use crate::cache::LruCache;
use crate::chunk::Chunk;
use crate::error::{StoreError, StoreResult};

/// Region files are addressed in 4 KiB sectors.
pub const SECTOR_SIZE: u64 = 4096;

/// Location table plus timestamp table.
pub const HEADER_SIZE: u64 = 2 * SECTOR_SIZE;

/// Chunks kept decoded by [`RegionFile::block_id`] and friends.
pub const DEFAULT_CACHE_CAPACITY: usize = 3;

/// The only chunk compression scheme supported.
pub const COMPRESSION_ZLIB: u8 = 2;

/// Random-access reader over one `r.<x>.<z>.mca` region file.
///
/// The sector location table is read once at open. Chunk payloads are read,
/// inflated and decoded on demand. Block queries go through a small LRU
/// cache of decoded chunks; the cache is owned by this instance and needs
/// `&mut self`, so a `RegionFile` cannot be shared between threads without
/// external locking.
pub struct RegionFile {
    path: PathBuf,
    pos: RegionPos,
    file: File,
    file_len: u64,
    locations: Box<[u32]>,
    cache: LruCache<usize, Chunk>,
    decodes: u64,
}

impl std::fmt::Debug for RegionFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionFile")
            .field("path", &self.path)
            .field("pos", &self.pos)
            .field("chunks", &self.count_chunks())
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl RegionFile {
    /// Open a region file with the default cache capacity.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::open_with_cache(path, DEFAULT_CACHE_CAPACITY)
    }

    pub fn open_with_cache(path: &Path, cache_capacity: usize) -> StoreResult<Self> {
        if !path.is_file() {
            return Err(StoreError::NotAFile(path.to_path_buf()));
        }
        let file_len = std::fs::metadata(path)?.len();
        if file_len < HEADER_SIZE {
            return Err(StoreError::FileTooShort {
                path: path.to_path_buf(),
                len: file_len,
            });
        }
        let pos = parse_region_name(path)?;

        let mut file = File::open(path)?;
        let mut header = vec![0u8; SECTOR_SIZE as usize];
        file.read_exact(&mut header)?;
        let locations = header
            .chunks_exact(4)
            .map(|word| u32::from_be_bytes([word[0], word[1], word[2], word[3]]))
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            pos,
            file,
            file_len,
            locations,
            cache: LruCache::new(cache_capacity),
            decodes: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pos(&self) -> RegionPos {
        self.pos
    }

    /// Number of populated chunk slots, from the location table alone.
    pub fn count_chunks(&self) -> usize {
        self.locations.iter().filter(|loc| **loc != 0).count()
    }

    pub fn has_chunk(&self, slot: usize) -> bool {
        self.locations.get(slot).is_some_and(|loc| *loc != 0)
    }

    /// Read and decode one slot. Empty slots yield `None`.
    pub fn read_chunk(&mut self, slot: usize) -> StoreResult<Option<Chunk>> {
        let Some(&location) = self.locations.get(slot) else {
            return Ok(None);
        };
        if location == 0 {
            return Ok(None);
        }

        let sector = u64::from(location >> 8);
        let offset = sector * SECTOR_SIZE;
        if sector < 2 || offset + 5 > self.file_len {
            return Err(StoreError::CorruptChunk {
                slot,
                reason: format!("sector offset {sector} outside file"),
            });
        }

        self.file.seek(SeekFrom::Start(offset))?;
        let mut prefix = [0u8; 5];
        self.file.read_exact(&mut prefix)?;
        let length = u64::from(u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]));
        let scheme = prefix[4];
        if length < 1 || offset + 4 + length > self.file_len {
            return Err(StoreError::CorruptChunk {
                slot,
                reason: format!("payload length {length} exceeds file"),
            });
        }
        if scheme != COMPRESSION_ZLIB {
            return Err(StoreError::UnsupportedCompression { slot, scheme });
        }

        let mut compressed = vec![0u8; (length - 1) as usize];
        self.file.read_exact(&mut compressed)?;
        let mut raw = Vec::new();
        ZlibDecoder::new(compressed.as_slice())
            .read_to_end(&mut raw)
            .map_err(|e| StoreError::Decompression(e.to_string()))?;

        let tag = mcw_nbt::decode(&raw)?;
        let pos = self
            .pos
            .chunk_at(slot)
            .map_err(|e| StoreError::CorruptChunk {
                slot,
                reason: e.to_string(),
            })?;
        self.decodes += 1;
        Ok(Some(Chunk::from_tag(&tag.root, pos)?))
    }

    /// Decode every slot, in slot order (`x` fastest). The result always has
    /// 1024 entries.
    pub fn read_all_chunks(&mut self) -> StoreResult<Vec<Option<Chunk>>> {
        let mut chunks = Vec::with_capacity(REGION_SLOTS);
        for slot in 0..REGION_SLOTS {
            chunks.push(self.read_chunk(slot)?);
        }
        debug!(region = %self.pos, chunks = self.count_chunks(), "decoded region");
        Ok(chunks)
    }

    /// Block id at world coordinates. Coordinates outside this region, empty
    /// chunks and absent sections all read as `0`.
    pub fn block_id(&mut self, x: i32, y: i32, z: i32) -> StoreResult<u16> {
        let pos = BlockPos::new(x, y, z);
        let (lx, ly, lz) = pos.local();
        Ok(self.cached_chunk(pos.chunk())?.map_or(0, |c| c.block_id(lx, ly, lz)))
    }

    /// Block metadata at world coordinates, `0` where [`block_id`](Self::block_id) is.
    pub fn block_meta(&mut self, x: i32, y: i32, z: i32) -> StoreResult<u8> {
        let pos = BlockPos::new(x, y, z);
        let (lx, ly, lz) = pos.local();
        Ok(self.cached_chunk(pos.chunk())?.map_or(0, |c| c.block_meta(lx, ly, lz)))
    }

    /// Chunks decoded from disk since open (cache hits excluded).
    pub fn decode_count(&self) -> u64 {
        self.decodes
    }

    /// Cached slots from least to most recently used.
    pub fn cached_slots(&self) -> Vec<usize> {
        self.cache.keys().copied().collect()
    }

    fn cached_chunk(&mut self, chunk: ChunkPos) -> StoreResult<Option<&Chunk>> {
        if chunk.region() != self.pos {
            return Ok(None);
        }
        let slot = chunk.region_slot();
        if !self.cache.touch(&slot) {
            let Some(decoded) = self.read_chunk(slot)? else {
                return Ok(None);
            };
            if let Some((evicted, _)) = self.cache.insert(slot, decoded) {
                debug!(region = %self.pos, slot = evicted, "evicted chunk from cache");
            }
        }
        Ok(self.cache.peek(&slot))
    }
}

/// Parse `r.<x>.<z>.<ext>`.
fn parse_region_name(path: &Path) -> StoreResult<RegionPos> {
    let invalid = || StoreError::InvalidRegionName(path.to_path_buf());
    let name = path.file_name().and_then(|n| n.to_str()).ok_or_else(invalid)?;
    let parts: Vec<&str> = name.split('.').collect();
    match parts.as_slice() {
        ["r", x, z, _ext] => {
            let x = x.parse().map_err(|_| invalid())?;
            let z = z.parse().map_err(|_| invalid())?;
            Ok(RegionPos::new(x, z))
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::RegionWriter;

    fn chunk_with_block(pos: ChunkPos, id: u16, meta: u8) -> Chunk {
        let mut chunk = Chunk::empty(pos);
        chunk.set_block(0, 70, 0, id, meta);
        chunk
    }

    /// Region (-2, -9) with chunks in slots 0..count, block id = slot + 1.
    fn write_region(dir: &Path, count: usize) -> PathBuf {
        let region = RegionPos::new(-2, -9);
        let mut writer = RegionWriter::new();
        for slot in 0..count {
            let pos = region.chunk_at(slot).unwrap();
            writer
                .add_chunk(&chunk_with_block(pos, slot as u16 + 1, (slot % 16) as u8))
                .unwrap();
        }
        writer.write(dir, region).unwrap()
    }

    #[test]
    fn parse_names() {
        assert_eq!(
            parse_region_name(Path::new("/x/r.-2.-9.mca")).unwrap(),
            RegionPos::new(-2, -9)
        );
        assert!(parse_region_name(Path::new("r.a.0.mca")).is_err());
        assert!(parse_region_name(Path::new("r.0.mca")).is_err());
        assert!(parse_region_name(Path::new("x.0.0.mca")).is_err());
    }

    #[test]
    fn open_missing_file() {
        let err = RegionFile::open(Path::new("/nonexistent/r.0.0.mca")).unwrap_err();
        assert!(matches!(err, StoreError::NotAFile(_)));
    }

    #[test]
    fn open_short_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.0.0.mca");
        std::fs::write(&path, vec![0u8; 100]).unwrap();
        let err = RegionFile::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::FileTooShort { len: 100, .. }));
    }

    #[test]
    fn open_badly_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("region.mca");
        std::fs::write(&path, vec![0u8; 8192]).unwrap();
        let err = RegionFile::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRegionName(_)));
    }

    #[test]
    fn count_and_read_all() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_region(dir.path(), 5);
        let mut region = RegionFile::open(&path).unwrap();
        assert_eq!(region.pos(), RegionPos::new(-2, -9));
        assert_eq!(region.count_chunks(), 5);
        assert_eq!(region.decode_count(), 0);

        let chunks = region.read_all_chunks().unwrap();
        assert_eq!(chunks.len(), REGION_SLOTS);
        assert_eq!(chunks.iter().filter(|c| c.is_some()).count(), 5);
        let third = chunks[2].as_ref().unwrap();
        assert_eq!(third.pos(), ChunkPos::new(-62, -288));
        assert_eq!(third.block_id(0, 70, 0), 3);
        assert!(chunks[5].is_none());
    }

    #[test]
    fn world_coordinate_queries() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_region(dir.path(), 2);
        let mut region = RegionFile::open(&path).unwrap();
        // slot 1 -> chunk (-63, -288) -> block x = -1008, z = -4608
        assert_eq!(region.block_id(-1008, 70, -4608).unwrap(), 2);
        assert_eq!(region.block_meta(-1008, 70, -4608).unwrap(), 1);
        assert_eq!(region.block_id(-1008, 71, -4608).unwrap(), 0);
        // empty slot
        assert_eq!(region.block_id(-1008, 70, -4592).unwrap(), 0);
    }

    #[test]
    fn out_of_region_coordinates_read_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_region(dir.path(), 1);
        let mut region = RegionFile::open(&path).unwrap();
        assert_eq!(region.block_id(0, 70, 0).unwrap(), 0);
        assert_eq!(region.block_meta(100_000, 70, -100_000).unwrap(), 0);
        assert_eq!(region.decode_count(), 0);
    }

    #[test]
    fn lru_evicts_least_recently_used_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_region(dir.path(), 4);
        let mut region = RegionFile::open(&path).unwrap();
        let block_x = |slot: i32| -1024 + slot * 16;
        let z = -4608;

        for slot in 0..3 {
            region.block_id(block_x(slot), 70, z).unwrap();
        }
        assert_eq!(region.cached_slots(), vec![0, 1, 2]);
        assert_eq!(region.decode_count(), 3);

        // Cache hit refreshes recency without decoding.
        assert_eq!(region.block_id(block_x(0), 70, z).unwrap(), 1);
        assert_eq!(region.decode_count(), 3);
        assert_eq!(region.cached_slots(), vec![1, 2, 0]);

        // Fourth chunk evicts slot 1, the least recently touched.
        assert_eq!(region.block_id(block_x(3), 70, z).unwrap(), 4);
        assert_eq!(region.decode_count(), 4);
        assert_eq!(region.cached_slots(), vec![2, 0, 3]);

        region.block_id(block_x(1), 70, z).unwrap();
        assert_eq!(region.decode_count(), 5);
    }

    #[test]
    fn unsupported_compression_is_explicit() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_region(dir.path(), 1);
        let mut bytes = std::fs::read(&path).unwrap();
        // First chunk payload starts at sector 2; scheme byte follows the length.
        bytes[2 * SECTOR_SIZE as usize + 4] = 1;
        std::fs::write(&path, bytes).unwrap();

        let mut region = RegionFile::open(&path).unwrap();
        let err = region.read_chunk(0).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedCompression { slot: 0, scheme: 1 }));
    }

    #[test]
    fn corrupt_location_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_region(dir.path(), 1);
        let mut bytes = std::fs::read(&path).unwrap();
        // Point slot 0 at sector 1000, far past the end.
        bytes[0..4].copy_from_slice(&((1000u32 << 8) | 1).to_be_bytes());
        std::fs::write(&path, bytes).unwrap();

        let mut region = RegionFile::open(&path).unwrap();
        assert!(matches!(
            region.read_chunk(0).unwrap_err(),
            StoreError::CorruptChunk { slot: 0, .. }
        ));
    }
}
