use std::path::{Path, PathBuf};

use mcw_nbt::{Flavor, NbtCompound, TagPath};
use mcw_types::RegionPos;
use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};
use crate::region::{RegionFile, DEFAULT_CACHE_CAPACITY};
use crate::registry::{read_registry, RegistryEntry, RegistryKind};

pub const LEVEL_FILE: &str = "level.dat";
/// Top-level `level.dat` compound written by the mod loader.
pub const MOD_MARKER: &str = "FML";
pub const REGION_DIR: &str = "region";
pub const REGION_EXTENSION: &str = "mca";

const VERSION_ID_PATH: &str = "Data Version Id";
const VERSION_NAME_PATH: &str = "Data Version Name";
const SEED_PATH: &str = "Data RandomSeed";

/// Identity of a save as recorded in `level.dat`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SaveMetadata {
    pub version_id: i32,
    pub version_name: String,
    pub seed: i64,
}

/// An opened, validated world save directory.
#[derive(Debug)]
pub struct LevelSave {
    root: PathBuf,
    level: NbtCompound,
    metadata: SaveMetadata,
    cache_capacity: usize,
}

impl LevelSave {
    /// Open the save at `dir`. `label` names it in error messages
    /// ("old world", "new world").
    pub fn open(dir: &Path, label: &str) -> StoreResult<Self> {
        if !dir.is_dir() {
            return Err(StoreError::SaveNotFound {
                label: label.to_string(),
                path: dir.to_path_buf(),
            });
        }
        let level_path = dir.join(LEVEL_FILE);
        if !level_path.is_file() {
            return Err(StoreError::MissingLevelDat(dir.to_path_buf()));
        }

        let level = read_level_dat(&level_path)?;
        if !level.contains_key(MOD_MARKER) {
            return Err(StoreError::NotModded {
                label: label.to_string(),
            });
        }
        let metadata = read_metadata(&level)?;
        debug!(
            save = %dir.display(),
            version = metadata.version_id,
            name = %metadata.version_name,
            "opened save"
        );

        Ok(Self {
            root: dir.to_path_buf(),
            level,
            metadata,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        })
    }

    /// Chunk cache capacity for region files opened through this save.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn level(&self) -> &NbtCompound {
        &self.level
    }

    pub fn metadata(&self) -> &SaveMetadata {
        &self.metadata
    }

    pub fn version_id(&self) -> i32 {
        self.metadata.version_id
    }

    pub fn version_name(&self) -> &str {
        &self.metadata.version_name
    }

    pub fn seed(&self) -> i64 {
        self.metadata.seed
    }

    pub fn region_dir(&self) -> PathBuf {
        self.root.join(REGION_DIR)
    }

    /// Region file paths directly under `region/`, sorted. A save without a
    /// region directory has none.
    pub fn region_paths(&self) -> StoreResult<Vec<PathBuf>> {
        let dir = self.region_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| StoreError::Io(e.into()))?;
            let path = entry.path();
            if entry.file_type().is_file()
                && path.extension().is_some_and(|ext| ext == REGION_EXTENSION)
            {
                paths.push(path.to_path_buf());
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Open every region file. Files that are not valid regions are skipped
    /// with a warning.
    pub fn regions(&self) -> StoreResult<Vec<RegionFile>> {
        let mut regions = Vec::new();
        for path in self.region_paths()? {
            match RegionFile::open_with_cache(&path, self.cache_capacity) {
                Ok(region) => regions.push(region),
                Err(e) if e.is_validation() => {
                    warn!(path = %path.display(), error = %e, "skipping region file");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(regions)
    }

    /// Open the region file at `pos`. A missing or unreadable file yields
    /// `None`: the region simply has nothing to compare.
    pub fn region(&self, pos: RegionPos) -> Option<RegionFile> {
        let path = self
            .region_dir()
            .join(format!("r.{}.{}.{REGION_EXTENSION}", pos.x, pos.z));
        if !path.is_file() {
            return None;
        }
        match RegionFile::open_with_cache(&path, self.cache_capacity) {
            Ok(region) => Some(region),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable region file");
                None
            }
        }
    }

    pub fn registry(&self, kind: RegistryKind) -> StoreResult<Vec<RegistryEntry>> {
        read_registry(&self.level, kind)
    }
}

/// Read `level.dat`: gzip-wrapped when it carries the gzip magic, plain
/// otherwise.
fn read_level_dat(path: &Path) -> StoreResult<NbtCompound> {
    let bytes = std::fs::read(path)?;
    let flavor = if bytes.starts_with(&[0x1f, 0x8b]) {
        Flavor::GzCompressed
    } else {
        Flavor::Uncompressed
    };
    Ok(mcw_nbt::read(&bytes, flavor)?.root)
}

fn read_metadata(level: &NbtCompound) -> StoreResult<SaveMetadata> {
    let missing = |path: &str| StoreError::MissingTag(path.to_string());
    Ok(SaveMetadata {
        version_id: level
            .get_value::<i32>(VERSION_ID_PATH)
            .ok_or_else(|| missing(VERSION_ID_PATH))?,
        version_name: level
            .get_value::<&str>(VERSION_NAME_PATH)
            .ok_or_else(|| missing(VERSION_NAME_PATH))?
            .to_string(),
        seed: level
            .get_value::<i64>(SEED_PATH)
            .ok_or_else(|| missing(SEED_PATH))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Chunk;
    use crate::registry::registry_tag;
    use crate::writer::{write_level_dat, RegionWriter};
    use mcw_nbt::NbtTag;
    use mcw_types::{ChunkPos, ResourceLocation};

    fn level_root(modded: bool) -> NbtCompound {
        let version = NbtCompound::new()
            .with("Id", NbtTag::Int(1343))
            .with("Name", NbtTag::String("1.12.2".into()));
        let data = NbtCompound::new()
            .with("Version", NbtTag::Compound(version))
            .with("RandomSeed", NbtTag::Long(-42));
        let mut root = NbtCompound::new().with("Data", NbtTag::Compound(data));
        if modded {
            let blocks = registry_tag(&[RegistryEntry::new(
                ResourceLocation::from_name("minecraft:stone"),
                1,
            )]);
            let ids = NbtCompound::new().with("ids", blocks);
            let registries = NbtCompound::new().with("minecraft:blocks", NbtTag::Compound(ids));
            let fml = NbtCompound::new().with("Registries", NbtTag::Compound(registries));
            root.insert(MOD_MARKER, NbtTag::Compound(fml));
        }
        root
    }

    #[test]
    fn open_reads_metadata_and_registry() {
        let dir = tempfile::tempdir().unwrap();
        write_level_dat(dir.path(), &level_root(true)).unwrap();

        let save = LevelSave::open(dir.path(), "old world").unwrap();
        assert_eq!(
            save.metadata(),
            &SaveMetadata {
                version_id: 1343,
                version_name: "1.12.2".into(),
                seed: -42,
            }
        );
        let blocks = save.registry(RegistryKind::Blocks).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].id, 1);
        assert!(save.registry(RegistryKind::Items).is_err());
    }

    #[test]
    fn accepts_uncompressed_level_dat() {
        let dir = tempfile::tempdir().unwrap();
        let raw = mcw_nbt::encode("", &level_root(true)).unwrap();
        std::fs::write(dir.path().join(LEVEL_FILE), raw).unwrap();
        assert_eq!(LevelSave::open(dir.path(), "old world").unwrap().seed(), -42);
    }

    #[test]
    fn missing_directory() {
        let err = LevelSave::open(Path::new("/no/such/save"), "new world").unwrap_err();
        assert_eq!(err.to_string(), "new world doesn't exist: /no/such/save");
    }

    #[test]
    fn missing_level_dat() {
        let dir = tempfile::tempdir().unwrap();
        let err = LevelSave::open(dir.path(), "old world").unwrap_err();
        assert!(matches!(err, StoreError::MissingLevelDat(_)));
    }

    #[test]
    fn unmodded_save_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_level_dat(dir.path(), &level_root(false)).unwrap();
        let err = LevelSave::open(dir.path(), "old world").unwrap_err();
        assert_eq!(
            err.to_string(),
            "your old world is not modded. Only modded worlds are supported"
        );
    }

    #[test]
    fn lists_and_opens_regions() {
        let dir = tempfile::tempdir().unwrap();
        write_level_dat(dir.path(), &level_root(true)).unwrap();
        let region_dir = dir.path().join(REGION_DIR);

        let mut writer = RegionWriter::new();
        writer.add_chunk(&Chunk::empty(ChunkPos::new(0, 0))).unwrap();
        writer.write(&region_dir, RegionPos::new(0, 0)).unwrap();
        writer.write(&region_dir, RegionPos::new(-1, 0)).unwrap();
        std::fs::write(region_dir.join("notes.txt"), "x").unwrap();
        std::fs::write(region_dir.join("broken.mca"), vec![0u8; 8192]).unwrap();

        let save = LevelSave::open(dir.path(), "old world").unwrap();
        let names: Vec<String> = save
            .region_paths()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["broken.mca", "r.-1.0.mca", "r.0.0.mca"]);

        let regions = save.regions().unwrap();
        assert_eq!(regions.len(), 2);
        assert!(save.region(RegionPos::new(0, 0)).is_some());
        assert!(save.region(RegionPos::new(5, 5)).is_none());
    }

    #[test]
    fn truncated_region_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        write_level_dat(dir.path(), &level_root(true)).unwrap();
        let region_dir = dir.path().join(REGION_DIR);
        std::fs::create_dir_all(&region_dir).unwrap();
        std::fs::write(region_dir.join("r.2.3.mca"), vec![0u8; 10]).unwrap();

        let save = LevelSave::open(dir.path(), "new world").unwrap();
        assert!(save.region(RegionPos::new(2, 3)).is_none());
    }

    #[test]
    fn save_without_region_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_level_dat(dir.path(), &level_root(true)).unwrap();
        let save = LevelSave::open(dir.path(), "old world").unwrap();
        assert!(save.regions().unwrap().is_empty());
    }
}
