use mcw_nbt::{as_compound, NbtCompound, NbtList, NbtTag, TagPath};
use mcw_types::ResourceLocation;
use serde::Serialize;
use tracing::warn;

use crate::error::{StoreError, StoreResult};

/// The two numeric id registries stored in a modded `level.dat`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    Blocks,
    Items,
}

impl RegistryKind {
    /// Space-separated tag path of the id list inside `level.dat`.
    pub fn tag_path(self) -> &'static str {
        match self {
            Self::Blocks => "FML Registries minecraft:blocks ids",
            Self::Items => "FML Registries minecraft:items ids",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::Items => "items",
        }
    }
}

impl std::fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One `name -> numeric id` mapping.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RegistryEntry {
    pub name: ResourceLocation,
    pub id: i32,
}

impl RegistryEntry {
    pub fn new(name: ResourceLocation, id: i32) -> Self {
        Self { name, id }
    }

    /// Reads a `{K: string, V: int}` record. A missing id defaults to 0; a
    /// name that is missing, empty or contains whitespace cannot be written
    /// back into an action line and yields `None`.
    pub(crate) fn from_tag(entry: &NbtCompound) -> Option<Self> {
        let name = entry.get_value::<&str>("K")?;
        if name.is_empty() || name.contains(char::is_whitespace) {
            return None;
        }
        let id = entry.get_value::<i32>("V").unwrap_or_default();
        Some(Self {
            name: ResourceLocation::from_name(name),
            id,
        })
    }

    pub(crate) fn to_tag(&self) -> NbtCompound {
        NbtCompound::new()
            .with("K", NbtTag::String(self.name.to_string()))
            .with("V", NbtTag::Int(self.id))
    }
}

/// Read one registry, in file order. The list itself is mandatory;
/// non-compound elements and unusable names are skipped.
pub(crate) fn read_registry(
    root: &NbtCompound,
    kind: RegistryKind,
) -> StoreResult<Vec<RegistryEntry>> {
    let list = root
        .get_value::<&NbtList>(kind.tag_path())
        .ok_or_else(|| StoreError::MissingTag(kind.tag_path().to_string()))?;
    let mut entries = Vec::with_capacity(list.len());
    for (index, record) in list.iter().filter_map(as_compound).enumerate() {
        match RegistryEntry::from_tag(record) {
            Some(entry) => entries.push(entry),
            None => {
                warn!(registry = %kind, index, "skipping registry entry without a usable name");
            }
        }
    }
    Ok(entries)
}

/// Build the `{K, V}` list for a registry, as stored in `level.dat`.
pub fn registry_tag(entries: &[RegistryEntry]) -> NbtTag {
    let records: Vec<NbtTag> = entries.iter().map(|e| NbtTag::Compound(e.to_tag())).collect();
    NbtTag::List(NbtList::from(records))
}
