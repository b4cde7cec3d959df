//! Typed lookups along space-separated key paths, e.g.
//! `"FML Registries minecraft:blocks ids"`.

use quartz_nbt::{NbtCompound, NbtTag};

/// The compound inside `tag`, if it is one.
pub fn as_compound(tag: &NbtTag) -> Option<&NbtCompound> {
    match tag {
        NbtTag::Compound(compound) => Some(compound),
        _ => None,
    }
}

/// Path navigation over a compound.
///
/// Every intermediate step must be a compound; a missing key or a
/// non-compound intermediate resolves to `None`. Typed access reuses the
/// `TryFrom<&NbtTag>` conversions of `quartz_nbt`, so `None` also covers a
/// value of another type. Callers decide whether that is fatal.
pub trait TagPath {
    fn lookup(&self, path: &str) -> Option<&NbtTag>;

    fn get_value<'a, T>(&'a self, path: &str) -> Option<T>
    where
        T: TryFrom<&'a NbtTag>,
    {
        self.lookup(path).and_then(|tag| T::try_from(tag).ok())
    }

    /// Byte array at `path`, as stored (signed).
    fn byte_array(&self, path: &str) -> Option<&[i8]> {
        match self.lookup(path)? {
            NbtTag::ByteArray(bytes) => Some(bytes.as_slice()),
            _ => None,
        }
    }

    fn has(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    /// Builder-style insert.
    fn with(self, key: &str, value: impl Into<NbtTag>) -> Self
    where
        Self: Sized;
}

impl TagPath for NbtCompound {
    fn lookup(&self, path: &str) -> Option<&NbtTag> {
        let mut keys = path.split(' ');
        let mut tag = self.inner().get(keys.next()?)?;
        for key in keys {
            tag = as_compound(tag)?.inner().get(key)?;
        }
        Some(tag)
    }

    fn with(mut self, key: &str, value: impl Into<NbtTag>) -> Self {
        self.insert(key, value.into());
        self
    }
}
