use std::path::PathBuf;

use mcw_types::ChunkPos;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{label} doesn't exist: {path}")]
    SaveNotFound { label: String, path: PathBuf },

    #[error("no level.dat file found in {0}")]
    MissingLevelDat(PathBuf),

    #[error("your {label} is not modded. Only modded worlds are supported")]
    NotModded { label: String },

    #[error("required tag missing or mistyped: {0}")]
    MissingTag(String),

    #[error("region file doesn't exist: {0}")]
    NotAFile(PathBuf),

    #[error("region file is too short ({len} bytes): {path}")]
    FileTooShort { path: PathBuf, len: u64 },

    #[error("file isn't a region (expected r.<x>.<z>.<ext>): {0}")]
    InvalidRegionName(PathBuf),

    #[error("chunk {0} uses the palette block storage format, which is not supported")]
    UnsupportedFormat(ChunkPos),

    #[error("chunk {chunk} has invalid section index {index}")]
    InvalidSection { chunk: ChunkPos, index: i8 },

    #[error("tag {tag} has length {actual}, expected {expected}")]
    InvalidArrayLength {
        tag: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("chunk slot {slot} uses unsupported compression scheme {scheme}")]
    UnsupportedCompression { slot: usize, scheme: u8 },

    #[error("corrupt chunk in slot {slot}: {reason}")]
    CorruptChunk { slot: usize, reason: String },

    #[error("decompression failed: {0}")]
    Decompression(String),

    #[error("tag decode error: {0}")]
    Nbt(#[from] mcw_nbt::NbtError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` for problems the user has to fix (wrong directory,
    /// unsupported save), as opposed to corrupt data.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::SaveNotFound { .. }
                | Self::MissingLevelDat(_)
                | Self::NotModded { .. }
                | Self::NotAFile(_)
                | Self::FileTooShort { .. }
                | Self::InvalidRegionName(_)
                | Self::UnsupportedFormat(_)
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
