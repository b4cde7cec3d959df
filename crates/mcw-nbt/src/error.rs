use quartz_nbt::io::NbtIoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NbtError {
    #[error("malformed tag data: {0}")]
    Read(#[source] NbtIoError),

    #[error("cannot encode tag tree: {0}")]
    Write(#[source] NbtIoError),
}

pub type NbtResult<T> = Result<T, NbtError>;
