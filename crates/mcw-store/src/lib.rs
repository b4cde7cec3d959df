//! World save storage for the McW converter.
//!
//! Reads the pre-1.13 ("legacy") save layout: a gzip-compressed `level.dat`
//! descriptor plus `region/r.<x>.<z>.mca` container files holding
//! zlib-compressed chunks.
//!
//! # Architecture
//!
//! - **LevelSave**: validated save directory, metadata, registries, region lookup
//! - **RegionFile**: sector table, on-demand chunk decoding, bounded LRU chunk cache
//! - **Chunk**: per-section block id / metadata arrays plus block entities
//! - **RegionWriter** / [`write_level_dat`]: produce saves (fixtures, tooling)
//!
//! The newer palette-based block storage is not supported; chunks in that
//! format fail with [`StoreError::UnsupportedFormat`].

pub mod cache;
pub mod chunk;
pub mod error;
pub mod level;
pub mod region;
pub mod registry;
pub mod writer;

pub use cache::LruCache;
pub use chunk::{BlockEntity, BlockEntityName, Chunk, MULTIPART_CONTAINER_ID};
pub use error::{StoreError, StoreResult};
pub use level::{LevelSave, SaveMetadata, LEVEL_FILE, MOD_MARKER, REGION_DIR, REGION_EXTENSION};
pub use region::{RegionFile, DEFAULT_CACHE_CAPACITY, HEADER_SIZE, SECTOR_SIZE};
pub use registry::{registry_tag, RegistryEntry, RegistryKind};
pub use writer::{write_level_dat, RegionWriter};
