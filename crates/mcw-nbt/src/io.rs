//! Byte-buffer front end over `quartz_nbt::io`.
//!
//! Chunk payloads arrive already inflated and are read with
//! [`Flavor::Uncompressed`]; `level.dat` is gzip-wrapped and read with
//! [`Flavor::GzCompressed`].

use std::io::Cursor;

use quartz_nbt::io::{read_nbt, write_nbt, Flavor};
use quartz_nbt::NbtCompound;
use tracing::trace;

use crate::error::{NbtError, NbtResult};

/// A root compound together with its (usually empty) name.
#[derive(Clone, Debug, PartialEq)]
pub struct NamedTag {
    pub name: String,
    pub root: NbtCompound,
}

/// Read one named root compound from `data`.
pub fn read(data: &[u8], flavor: Flavor) -> NbtResult<NamedTag> {
    let (root, name) = read_nbt(&mut Cursor::new(data), flavor).map_err(NbtError::Read)?;
    trace!(bytes = data.len(), entries = root.len(), "read tag tree");
    Ok(NamedTag { name, root })
}

/// Read an uncompressed tag stream.
pub fn decode(data: &[u8]) -> NbtResult<NamedTag> {
    read(data, Flavor::Uncompressed)
}

/// Serialize `root` under `name`.
pub fn write(name: &str, root: &NbtCompound, flavor: Flavor) -> NbtResult<Vec<u8>> {
    let mut out = Vec::new();
    write_nbt(&mut out, Some(name), root, flavor).map_err(NbtError::Write)?;
    Ok(out)
}

/// Serialize `root` without compression.
pub fn encode(name: &str, root: &NbtCompound) -> NbtResult<Vec<u8>> {
    write(name, root, Flavor::Uncompressed)
}
