//! Foundation types for the McW converter.
//!
//! Every other `mcw-*` crate depends on `mcw-types`.
//!
//! # Key Types
//!
//! - [`ResourceLocation`] - Namespaced `domain:path` name with a similarity
//!   predicate tolerant to naming-convention drift
//! - [`ChunkPos`] / [`RegionPos`] - World-relative chunk and region coordinates
//! - [`BlockPos`] - Absolute block coordinates

pub mod coords;
pub mod error;
pub mod resource;

pub use coords::{BlockPos, ChunkPos, RegionPos, CHUNKS_PER_REGION, REGION_SLOTS};
pub use error::TypeError;
pub use resource::ResourceLocation;
