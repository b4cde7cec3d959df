//! Comparison of one pair of chunks, run inside a diff worker.

use std::collections::HashSet;

use mcw_action::{ActionError, BlockEntityRename, BlockSwap};
use mcw_store::{BlockEntity, BlockEntityName, Chunk};
use mcw_types::ResourceLocation;
use tracing::warn;

use crate::error::DiffResult;

const SECTION_COUNT: usize = 16;
const SECTION_HEIGHT: i32 = 16;

/// The same chunk column read from both saves.
#[derive(Debug)]
pub struct ChunkPair {
    pub old: Chunk,
    pub new: Chunk,
}

/// Everything one worker found. Sets deduplicate within the worker; the
/// engine merges sets across workers.
#[derive(Debug, Default)]
pub struct WorkerFindings {
    pub swaps: HashSet<BlockSwap>,
    pub entity_renames: HashSet<BlockEntityRename>,
    pub missing_entities: HashSet<BlockEntityRename>,
    /// Old block entity names that found an exact or similar counterpart.
    pub resolved_entities: HashSet<ResourceLocation>,
    pub chunks: u64,
}

impl WorkerFindings {
    pub fn merge(&mut self, other: WorkerFindings) {
        self.swaps.extend(other.swaps);
        self.entity_renames.extend(other.entity_renames);
        self.missing_entities.extend(other.missing_entities);
        self.resolved_entities.extend(other.resolved_entities);
        self.chunks += other.chunks;
    }
}

/// Stateful comparer owned by a single worker.
#[derive(Debug)]
pub struct ChunkComparer {
    strict: bool,
    reserved_domain: String,
    /// Old names (with their multipart flag) already settled in this session.
    resolved: HashSet<BlockEntityName>,
    findings: WorkerFindings,
}

impl ChunkComparer {
    pub fn new(strict: bool, reserved_domain: impl Into<String>) -> Self {
        Self {
            strict,
            reserved_domain: reserved_domain.into(),
            resolved: HashSet::new(),
            findings: WorkerFindings::default(),
        }
    }

    pub fn compare(&mut self, pair: &ChunkPair) -> DiffResult<()> {
        self.compare_blocks(&pair.old, &pair.new)?;
        self.compare_block_entities(&pair.old, &pair.new)?;
        self.findings.chunks += 1;
        Ok(())
    }

    pub fn finish(self) -> WorkerFindings {
        self.findings
    }

    /// Default mode flags blocks that vanished (`old != 0`, `new == 0`).
    /// Strict mode flags any id change between two non-air blocks.
    fn compare_blocks(&mut self, old: &Chunk, new: &Chunk) -> DiffResult<()> {
        for section in 0..SECTION_COUNT {
            if !old.has_section(section) || !new.has_section(section) {
                continue;
            }
            let base = section as i32 * SECTION_HEIGHT;
            for y in base..base + SECTION_HEIGHT {
                for z in 0..16 {
                    for x in 0..16 {
                        let old_id = old.block_id(x, y, z);
                        let new_id = new.block_id(x, y, z);
                        let swap = if self.strict {
                            if old_id == new_id || old_id == 0 || new_id == 0 {
                                continue;
                            }
                            BlockSwap::new(
                                old_id,
                                old.block_meta(x, y, z),
                                new_id,
                                new.block_meta(x, y, z),
                            )?
                        } else {
                            if old_id == 0 || new_id != 0 {
                                continue;
                            }
                            BlockSwap::vanished(old_id, old.block_meta(x, y, z))?
                        };
                        self.findings.swaps.insert(swap);
                    }
                }
            }
        }
        Ok(())
    }

    fn compare_block_entities(&mut self, old: &Chunk, new: &Chunk) -> DiffResult<()> {
        if old.block_entities().is_empty() || new.block_entities().is_empty() {
            return Ok(());
        }
        for record in old.block_entities() {
            let counterparts: Vec<&BlockEntity> = new
                .block_entities()
                .iter()
                .filter(|candidate| candidate.pos == record.pos)
                .collect();
            for name in &record.names {
                if name.name.is_in_domain(&self.reserved_domain) || self.resolved.contains(name) {
                    continue;
                }
                self.resolve_entity(name, &counterparts)?;
            }
        }
        Ok(())
    }

    fn resolve_entity(
        &mut self,
        old: &BlockEntityName,
        counterparts: &[&BlockEntity],
    ) -> DiffResult<()> {
        let candidates: Vec<&BlockEntityName> = counterparts
            .iter()
            .flat_map(|record| record.names.iter())
            .filter(|candidate| !candidate.name.is_in_domain(&self.reserved_domain))
            .collect();

        if candidates.iter().any(|candidate| candidate.name == old.name) {
            self.mark_resolved(old);
            return Ok(());
        }

        if !self.strict {
            let old_text = old.name.to_string();
            for candidate in candidates {
                if !candidate.name.similar_to(&old_text) {
                    continue;
                }
                match BlockEntityRename::new(
                    old.name.clone(),
                    old.multipart,
                    candidate.name.clone(),
                    candidate.multipart,
                ) {
                    Ok(rename) => {
                        self.findings.entity_renames.insert(rename);
                        self.mark_resolved(old);
                        return Ok(());
                    }
                    Err(ActionError::MultipartTransition) => {
                        warn!(
                            old = %old.name,
                            new = %candidate.name,
                            "skipping candidate: plain block entity cannot become multipart"
                        );
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        let missing = BlockEntityRename::new(
            old.name.clone(),
            old.multipart,
            old.name.clone(),
            old.multipart,
        )?;
        self.findings.missing_entities.insert(missing);
        Ok(())
    }

    fn mark_resolved(&mut self, old: &BlockEntityName) {
        self.resolved.insert(old.clone());
        self.findings.resolved_entities.insert(old.name.clone());
    }
}
