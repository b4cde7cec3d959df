//! Legacy (pre-palette) chunk layout.
//!
//! A chunk is a 16×256×16 column split into 16 vertical sections. Each
//! present section stores 4096 block ids (low byte in `Blocks`, optional high
//! nibble in `Add`) and 4096 metadata nibbles in `Data`. Within a section the
//! block index is `y * 256 + z * 16 + x`.

use mcw_nbt::{as_compound, NbtCompound, NbtList, NbtTag, TagPath};
use mcw_types::{BlockPos, ChunkPos, ResourceLocation};

use crate::error::{StoreError, StoreResult};

pub const SECTION_COUNT: usize = 16;
pub const SECTION_VOLUME: usize = 4096;
pub const CHUNK_HEIGHT: i32 = 256;

/// Block entity id of a multipart container record.
pub const MULTIPART_CONTAINER_ID: &str = "mcmultipart:multipart";

const SECTIONS_PATH: &str = "Level Sections";
const BLOCK_ENTITIES_PATH: &str = "Level TileEntities";
const LEGACY_BLOCKS_KEY: &str = "Blocks";

#[derive(Clone, Debug, PartialEq, Eq)]
struct Section {
    ids: Box<[u16]>,
    meta: Box<[u8]>,
}

impl Section {
    fn empty() -> Self {
        Self {
            ids: vec![0; SECTION_VOLUME].into_boxed_slice(),
            meta: vec![0; SECTION_VOLUME].into_boxed_slice(),
        }
    }

    fn from_tag(tag: &NbtCompound) -> StoreResult<Self> {
        let blocks = tag
            .byte_array(LEGACY_BLOCKS_KEY)
            .ok_or_else(|| StoreError::MissingTag("Blocks".into()))?;
        check_len("Blocks", blocks, SECTION_VOLUME)?;
        let data = tag
            .byte_array("Data")
            .ok_or_else(|| StoreError::MissingTag("Data".into()))?;
        check_len("Data", data, SECTION_VOLUME / 2)?;
        let add = tag.byte_array("Add");
        if let Some(add) = add {
            check_len("Add", add, SECTION_VOLUME / 2)?;
        }

        let mut section = Self::empty();
        for i in 0..SECTION_VOLUME {
            let high = add.map_or(0, |add| u16::from(nibble(add, i)));
            section.ids[i] = (high << 8) | u16::from(blocks[i] as u8);
            section.meta[i] = nibble(data, i);
        }
        Ok(section)
    }

    fn to_tag(&self, y: i8) -> NbtCompound {
        let blocks: Vec<u8> = self.ids.iter().map(|id| (*id & 0xff) as u8).collect();
        let mut data = vec![0u8; SECTION_VOLUME / 2];
        let mut add = vec![0u8; SECTION_VOLUME / 2];
        for i in 0..SECTION_VOLUME {
            set_nibble(&mut data, i, self.meta[i]);
            set_nibble(&mut add, i, ((self.ids[i] >> 8) & 0x0f) as u8);
        }
        let mut tag = NbtCompound::new()
            .with("Y", NbtTag::Byte(y))
            .with("Blocks", byte_array(blocks))
            .with("Data", byte_array(data));
        if add.iter().any(|b| *b != 0) {
            tag.insert("Add", byte_array(add));
        }
        tag
    }
}

/// Stored byte arrays are signed; block bytes are read unsigned.
fn byte_array(bytes: Vec<u8>) -> NbtTag {
    NbtTag::ByteArray(bytes.into_iter().map(|b| b as i8).collect())
}

fn check_len(tag: &'static str, array: &[i8], expected: usize) -> StoreResult<()> {
    if array.len() != expected {
        return Err(StoreError::InvalidArrayLength {
            tag,
            expected,
            actual: array.len(),
        });
    }
    Ok(())
}

/// Even indices live in the low nibble, odd ones in the high nibble.
fn nibble(array: &[i8], index: usize) -> u8 {
    let byte = array[index / 2] as u8;
    if index % 2 == 0 {
        byte & 0x0f
    } else {
        (byte >> 4) & 0x0f
    }
}

fn set_nibble(array: &mut [u8], index: usize, value: u8) {
    let byte = &mut array[index / 2];
    if index % 2 == 0 {
        *byte = (*byte & 0xf0) | (value & 0x0f);
    } else {
        *byte = (*byte & 0x0f) | ((value & 0x0f) << 4);
    }
}

/// One logical block entity name. Multipart containers expand into several.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockEntityName {
    pub name: ResourceLocation,
    pub multipart: bool,
}

/// A stored block entity record with its resolved logical names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockEntity {
    pub pos: BlockPos,
    pub names: Vec<BlockEntityName>,
}

impl BlockEntity {
    pub fn single(pos: BlockPos, name: ResourceLocation) -> Self {
        Self {
            pos,
            names: vec![BlockEntityName {
                name,
                multipart: false,
            }],
        }
    }

    pub fn multipart(pos: BlockPos, parts: impl IntoIterator<Item = ResourceLocation>) -> Self {
        Self {
            pos,
            names: parts
                .into_iter()
                .map(|name| BlockEntityName {
                    name,
                    multipart: true,
                })
                .collect(),
        }
    }

    /// Records without coordinates or without any id are skipped.
    fn from_tag(tag: &NbtCompound) -> Option<Self> {
        let pos = BlockPos::new(
            tag.get_value::<i32>("x")?,
            tag.get_value::<i32>("y")?,
            tag.get_value::<i32>("z")?,
        );
        if let Some(parts) = tag.get_value::<&NbtList>("parts") {
            let names = parts
                .iter()
                .filter_map(as_compound)
                .filter_map(|part| part.get_value::<&str>("id"))
                .map(ResourceLocation::from_name);
            return Some(Self::multipart(pos, names));
        }
        let id = tag.get_value::<&str>("id")?;
        Some(Self::single(pos, ResourceLocation::from_name(id)))
    }

    fn to_tag(&self) -> NbtCompound {
        let base = NbtCompound::new()
            .with("x", NbtTag::Int(self.pos.x))
            .with("y", NbtTag::Int(self.pos.y))
            .with("z", NbtTag::Int(self.pos.z));
        match self.names.as_slice() {
            [single] if !single.multipart => {
                base.with("id", NbtTag::String(single.name.to_string()))
            }
            parts => {
                let parts: Vec<NbtTag> = parts
                    .iter()
                    .map(|p| {
                        let id = NbtTag::String(p.name.to_string());
                        NbtTag::Compound(NbtCompound::new().with("id", id))
                    })
                    .collect();
                base.with("id", NbtTag::String(MULTIPART_CONTAINER_ID.to_string()))
                    .with("parts", NbtTag::List(NbtList::from(parts)))
            }
        }
    }
}

/// A decoded chunk column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pos: ChunkPos,
    sections: [Option<Box<Section>>; SECTION_COUNT],
    block_entities: Vec<BlockEntity>,
}

impl Chunk {
    /// A chunk with no sections and no block entities.
    pub fn empty(pos: ChunkPos) -> Self {
        Self {
            pos,
            sections: Default::default(),
            block_entities: Vec::new(),
        }
    }

    /// Decode a chunk's root tag. Only the legacy section layout is accepted.
    pub fn from_tag(root: &NbtCompound, pos: ChunkPos) -> StoreResult<Self> {
        let sections = root
            .get_value::<&NbtList>(SECTIONS_PATH)
            .ok_or_else(|| StoreError::MissingTag(SECTIONS_PATH.into()))?;

        let mut chunk = Self::empty(pos);
        for section_tag in sections.iter() {
            let section_tag = as_compound(section_tag)
                .ok_or_else(|| StoreError::MissingTag(SECTIONS_PATH.into()))?;
            if !section_tag.contains_key(LEGACY_BLOCKS_KEY) {
                return Err(StoreError::UnsupportedFormat(pos));
            }
            let index = section_tag
                .get_value::<i8>("Y")
                .ok_or_else(|| StoreError::MissingTag("Y".into()))?;
            let slot = usize::try_from(index)
                .ok()
                .filter(|i| *i < SECTION_COUNT)
                .ok_or(StoreError::InvalidSection { chunk: pos, index })?;
            chunk.sections[slot] = Some(Box::new(Section::from_tag(section_tag)?));
        }

        if let Some(records) = root.get_value::<&NbtList>(BLOCK_ENTITIES_PATH) {
            chunk.block_entities = records
                .iter()
                .filter_map(as_compound)
                .filter_map(BlockEntity::from_tag)
                .collect();
        }
        Ok(chunk)
    }

    /// Encode back to a legacy-layout root tag.
    pub fn to_tag(&self) -> NbtCompound {
        let sections: Vec<NbtTag> = self
            .sections
            .iter()
            .enumerate()
            .filter_map(|(y, s)| s.as_ref().map(|s| NbtTag::Compound(s.to_tag(y as i8))))
            .collect();
        let block_entities: Vec<NbtTag> = self
            .block_entities
            .iter()
            .map(|be| NbtTag::Compound(be.to_tag()))
            .collect();
        let level = NbtCompound::new()
            .with("xPos", NbtTag::Int(self.pos.x))
            .with("zPos", NbtTag::Int(self.pos.z))
            .with("Sections", NbtTag::List(NbtList::from(sections)))
            .with("TileEntities", NbtTag::List(NbtList::from(block_entities)));
        NbtCompound::new().with("Level", NbtTag::Compound(level))
    }

    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    pub fn has_section(&self, section: usize) -> bool {
        self.sections.get(section).is_some_and(Option::is_some)
    }

    pub fn section_count(&self) -> usize {
        self.sections.iter().filter(|s| s.is_some()).count()
    }

    /// Block id at chunk-relative coordinates. Absent sections and
    /// out-of-range coordinates read as `0` (air).
    pub fn block_id(&self, x: usize, y: i32, z: usize) -> u16 {
        self.locate(x, y, z)
            .map_or(0, |(section, idx)| section.ids[idx])
    }

    /// Block metadata at chunk-relative coordinates, `0` when absent.
    pub fn block_meta(&self, x: usize, y: i32, z: usize) -> u8 {
        self.locate(x, y, z)
            .map_or(0, |(section, idx)| section.meta[idx])
    }

    /// Set a block, allocating its section if needed. Ids are masked to
    /// 12 bits and metadata to 4.
    pub fn set_block(&mut self, x: usize, y: i32, z: usize, id: u16, meta: u8) {
        if x >= 16 || z >= 16 || !(0..CHUNK_HEIGHT).contains(&y) {
            return;
        }
        let section =
            self.sections[(y / 16) as usize].get_or_insert_with(|| Box::new(Section::empty()));
        let idx = local_index(x, y, z);
        section.ids[idx] = id & 0x0fff;
        section.meta[idx] = meta & 0x0f;
    }

    pub fn block_entities(&self) -> &[BlockEntity] {
        &self.block_entities
    }

    pub fn push_block_entity(&mut self, block_entity: BlockEntity) {
        self.block_entities.push(block_entity);
    }

    fn locate(&self, x: usize, y: i32, z: usize) -> Option<(&Section, usize)> {
        if x >= 16 || z >= 16 || !(0..CHUNK_HEIGHT).contains(&y) {
            return None;
        }
        let section = self.sections[(y / 16) as usize].as_deref()?;
        Some((section, local_index(x, y, z)))
    }
}

fn local_index(x: usize, y: i32, z: usize) -> usize {
    (y % 16) as usize * 256 + z * 16 + x
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section_tag(y: i8, blocks: Vec<u8>, data: Vec<u8>, add: Option<Vec<u8>>) -> NbtTag {
        let mut tag = NbtCompound::new()
            .with("Y", NbtTag::Byte(y))
            .with("Blocks", byte_array(blocks))
            .with("Data", byte_array(data));
        if let Some(add) = add {
            tag.insert("Add", byte_array(add));
        }
        NbtTag::Compound(tag)
    }

    fn list(tags: Vec<NbtTag>) -> NbtTag {
        NbtTag::List(NbtList::from(tags))
    }

    fn chunk_root(sections: Vec<NbtTag>) -> NbtCompound {
        let level = NbtCompound::new().with("Sections", list(sections));
        NbtCompound::new().with("Level", NbtTag::Compound(level))
    }

    #[test]
    fn decodes_ids_meta_and_add_nibbles() {
        let mut blocks = vec![0u8; SECTION_VOLUME];
        let mut data = vec![0u8; SECTION_VOLUME / 2];
        let mut add = vec![0u8; SECTION_VOLUME / 2];
        // index 0 -> (0,0,0), index 1 -> (1,0,0)
        blocks[0] = 0x97;
        blocks[1] = 0xff;
        data[0] = 0x3a; // idx0 meta 0xa, idx1 meta 0x3
        add[0] = 0x30; // idx0 add 0, idx1 add 3

        let root = chunk_root(vec![section_tag(4, blocks, data, Some(add))]);
        let chunk = Chunk::from_tag(&root, ChunkPos::new(0, 0)).unwrap();

        assert!(chunk.has_section(4));
        assert_eq!(chunk.block_id(0, 64, 0), 0x97);
        assert_eq!(chunk.block_meta(0, 64, 0), 0xa);
        assert_eq!(chunk.block_id(1, 64, 0), 0x3ff);
        assert_eq!(chunk.block_meta(1, 64, 0), 0x3);
    }

    #[test]
    fn absent_section_reads_zero() {
        let chunk = Chunk::from_tag(&chunk_root(vec![]), ChunkPos::new(1, 1)).unwrap();
        assert_eq!(chunk.section_count(), 0);
        for y in [0, 15, 16, 128, 255] {
            assert_eq!(chunk.block_id(3, y, 7), 0);
            assert_eq!(chunk.block_meta(3, y, 7), 0);
        }
    }

    #[test]
    fn out_of_range_coordinates_read_zero() {
        let mut chunk = Chunk::empty(ChunkPos::new(0, 0));
        chunk.set_block(0, 0, 0, 1, 1);
        assert_eq!(chunk.block_id(16, 0, 0), 0);
        assert_eq!(chunk.block_id(0, -1, 0), 0);
        assert_eq!(chunk.block_id(0, 256, 0), 0);
    }

    #[test]
    fn palette_format_is_rejected() {
        let section = NbtCompound::new()
            .with("Y", NbtTag::Byte(0))
            .with("BlockStates", NbtTag::LongArray(vec![0; 256]));
        let root = chunk_root(vec![NbtTag::Compound(section)]);
        let err = Chunk::from_tag(&root, ChunkPos::new(2, 3)).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedFormat(pos) if pos == ChunkPos::new(2, 3)));
    }

    #[test]
    fn missing_section_index_is_fatal() {
        let section = NbtCompound::new()
            .with("Blocks", NbtTag::ByteArray(vec![0; SECTION_VOLUME]))
            .with("Data", NbtTag::ByteArray(vec![0; SECTION_VOLUME / 2]));
        let root = chunk_root(vec![NbtTag::Compound(section)]);
        let err = Chunk::from_tag(&root, ChunkPos::new(0, 0)).unwrap_err();
        assert!(matches!(err, StoreError::MissingTag(ref t) if t == "Y"));
    }

    #[test]
    fn section_index_out_of_range() {
        let tag = section_tag(-1, vec![0; SECTION_VOLUME], vec![0; SECTION_VOLUME / 2], None);
        let err = Chunk::from_tag(&chunk_root(vec![tag]), ChunkPos::new(0, 0)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidSection { index: -1, .. }));
    }

    #[test]
    fn short_blocks_array_rejected() {
        let tag = section_tag(0, vec![0; 100], vec![0; SECTION_VOLUME / 2], None);
        let err = Chunk::from_tag(&chunk_root(vec![tag]), ChunkPos::new(0, 0)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidArrayLength { tag: "Blocks", actual: 100, .. }
        ));
    }

    #[test]
    fn missing_sections_list_is_fatal() {
        let err = Chunk::from_tag(&NbtCompound::new(), ChunkPos::new(0, 0)).unwrap_err();
        assert!(matches!(err, StoreError::MissingTag(_)));
    }

    #[test]
    fn tag_roundtrip_preserves_blocks_and_entities() {
        let pos = ChunkPos::new(-3, 7);
        let mut chunk = Chunk::empty(pos);
        chunk.set_block(0, 70, 0, 5, 2);
        chunk.set_block(15, 255, 15, 0xabc, 0xf);
        chunk.push_block_entity(BlockEntity::single(
            BlockPos::new(-48, 70, 112),
            ResourceLocation::from_name("modA:chest"),
        ));
        chunk.push_block_entity(BlockEntity::multipart(
            BlockPos::new(-47, 70, 112),
            [
                ResourceLocation::from_name("modB:wire"),
                ResourceLocation::from_name("modB:lamp"),
            ],
        ));

        let decoded = Chunk::from_tag(&chunk.to_tag(), pos).unwrap();
        assert_eq!(decoded, chunk);
        assert_eq!(decoded.section_count(), 2);
        assert_eq!(decoded.block_id(15, 255, 15), 0xabc);
        assert_eq!(decoded.block_entities()[1].names.len(), 2);
        assert!(decoded.block_entities()[1].names.iter().all(|n| n.multipart));
    }

    #[test]
    fn block_entity_without_coordinates_is_skipped() {
        let id = |name: &str| NbtTag::String(name.to_string());
        let unplaced = NbtCompound::new().with("id", id("modA:thing"));
        let placed = NbtCompound::new()
            .with("id", id("modA:other"))
            .with("x", NbtTag::Int(1))
            .with("y", NbtTag::Int(2))
            .with("z", NbtTag::Int(3));
        let level = NbtCompound::new().with("Sections", list(vec![])).with(
            "TileEntities",
            list(vec![NbtTag::Compound(unplaced), NbtTag::Compound(placed)]),
        );
        let root = NbtCompound::new().with("Level", NbtTag::Compound(level));
        let chunk = Chunk::from_tag(&root, ChunkPos::new(0, 0)).unwrap();
        assert_eq!(chunk.block_entities().len(), 1);
        assert_eq!(chunk.block_entities()[0].pos, BlockPos::new(1, 2, 3));
    }
}
