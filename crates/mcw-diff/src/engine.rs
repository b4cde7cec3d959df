//! Save-pair comparison: validation, registry diff, concurrent chunk diff and
//! aggregation into sorted action lists.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use mcw_action::{sort_actions, Action, BlockNames, BLOCK_ID_LIMIT};
use mcw_store::{LevelSave, RegionFile, RegistryEntry, RegistryKind, SaveMetadata};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::chunk_diff::{ChunkComparer, ChunkPair, WorkerFindings};
use crate::config::DiffConfig;
use crate::error::{DiffError, DiffResult};
use crate::progress::{output_lock, CooldownLock, NoProgress, OutputLock, Progress, ProgressSink};
use crate::registry::{diff_registry, RegistryDiff};

/// Aggregated, sorted result of comparing two saves.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub old: Option<SaveMetadata>,
    pub new: Option<SaveMetadata>,
    pub block_renames: Vec<Action>,
    pub missing_blocks: Vec<Action>,
    pub item_renames: Vec<Action>,
    pub missing_items: Vec<Action>,
    pub block_swaps: Vec<Action>,
    pub block_entity_renames: Vec<Action>,
    pub missing_block_entities: Vec<Action>,
    pub stats: ComparisonStats,
}

/// Coverage of the chunk comparison.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonStats {
    pub regions: usize,
    pub regions_skipped: usize,
    pub chunks_total: u64,
    pub chunk_pairs: u64,
    pub workers: usize,
    /// Workers that stopped on an error; their findings are lost.
    pub failed_workers: usize,
}

impl Comparison {
    pub fn action_count(&self) -> usize {
        [
            &self.block_renames,
            &self.missing_blocks,
            &self.item_renames,
            &self.missing_items,
            &self.block_swaps,
            &self.block_entity_renames,
            &self.missing_block_entities,
        ]
        .iter()
        .map(|list| list.len())
        .sum()
    }
}

/// Result of the chunk stage, before registry data is folded in.
#[derive(Debug, Default)]
pub struct ChunkDiff {
    pub findings: WorkerFindings,
    pub stats: ComparisonStats,
}

/// Compares an older save against a newer one.
pub struct Comparator {
    old: LevelSave,
    new: LevelSave,
    config: DiffConfig,
    sink: Arc<dyn ProgressSink>,
    output: OutputLock,
}

impl Comparator {
    /// Validate a pair of opened saves: the old one must have the strictly
    /// lower version and both must share a seed.
    pub fn new(old: LevelSave, new: LevelSave, config: DiffConfig) -> DiffResult<Self> {
        if old.version_id() > new.version_id() {
            return Err(DiffError::VersionOrder {
                old: old.version_name().to_string(),
                new: new.version_name().to_string(),
            });
        }
        if old.version_id() == new.version_id() {
            return Err(DiffError::SameVersion(old.version_name().to_string()));
        }
        if old.seed() != new.seed() {
            return Err(DiffError::SeedMismatch {
                old: old.seed(),
                new: new.seed(),
            });
        }
        Ok(Self {
            old,
            new,
            config,
            sink: Arc::new(NoProgress),
            output: output_lock(),
        })
    }

    /// Open both save directories and validate them as a pair.
    pub fn open(old_dir: &Path, new_dir: &Path, config: DiffConfig) -> DiffResult<Self> {
        let capacity = config.region_cache_capacity;
        let old = LevelSave::open(old_dir, "old world")?.with_cache_capacity(capacity);
        let new = LevelSave::open(new_dir, "new world")?.with_cache_capacity(capacity);
        Self::new(old, new, config)
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Share an output lock with whatever else prints.
    pub fn with_output_lock(mut self, output: OutputLock) -> Self {
        self.output = output;
        self
    }

    pub fn old(&self) -> &LevelSave {
        &self.old
    }

    pub fn new_save(&self) -> &LevelSave {
        &self.new
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    fn progress(&self, stage: impl Into<String>, total: u64) -> Progress {
        let lock = CooldownLock::new(self.output.clone(), self.config.progress_cooldown());
        Progress::new(stage, total, lock, self.sink.clone())
    }

    /// Run every stage and aggregate.
    pub fn compare(&self) -> DiffResult<Comparison> {
        let old_blocks = self.old.registry(RegistryKind::Blocks)?;
        let new_blocks = self.new.registry(RegistryKind::Blocks)?;
        let blocks = self.compare_registry(RegistryKind::Blocks, &old_blocks, &new_blocks);

        let old_items = self.old.registry(RegistryKind::Items)?;
        let new_items = self.new.registry(RegistryKind::Items)?;
        let items = self.compare_registry(RegistryKind::Items, &old_items, &new_items);

        let chunks = self.compare_chunks()?;
        let comparison = aggregate(
            &self.config.reserved_domain,
            AggregateInput {
                old_blocks: &old_blocks,
                new_blocks: &new_blocks,
                blocks,
                items,
                chunks,
            },
        );
        info!(
            actions = comparison.action_count(),
            failed_workers = comparison.stats.failed_workers,
            "comparison finished"
        );
        Ok(Comparison {
            old: Some(self.old.metadata().clone()),
            new: Some(self.new.metadata().clone()),
            ..comparison
        })
    }

    pub fn compare_registry(
        &self,
        kind: RegistryKind,
        old: &[RegistryEntry],
        new: &[RegistryEntry],
    ) -> RegistryDiff {
        let progress = self.progress(format!("comparing registry {kind}"), old.len() as u64);
        let diff = diff_registry(kind, old, new, &self.config.reserved_domain, Some(&progress));
        progress.finish();
        diff
    }

    /// Compare every chunk present in both saves.
    ///
    /// The calling thread decodes region pairs and feeds chunk pairs through a
    /// bounded channel to a fixed pool of workers. A worker that fails is
    /// logged and contributes nothing; the rest of the run continues.
    pub fn compare_chunks(&self) -> DiffResult<ChunkDiff> {
        let regions = self.old.regions()?;
        let total: u64 = regions.iter().map(|r| r.count_chunks() as u64).sum();
        let workers = self.config.worker_count();
        let progress = self.progress("comparing chunks", total);
        debug!(regions = regions.len(), total, workers, "starting chunk comparison");

        let strict = self.config.strict;
        let reserved = self.config.reserved_domain.as_str();
        let mut stats = ComparisonStats {
            chunks_total: total,
            workers,
            ..ComparisonStats::default()
        };
        let (produced, outcomes) = run_pool(
            workers,
            self.config.queue_capacity(),
            &progress,
            |_| ChunkComparer::new(strict, reserved),
            |tx| self.produce(regions, tx, &progress, &mut stats),
        );
        produced?;
        progress.finish();

        let findings = merge_outcomes(outcomes, &mut stats);
        Ok(ChunkDiff { findings, stats })
    }

    /// Producer side: decode each old region and its counterpart, enqueue
    /// every slot present in both.
    fn produce(
        &self,
        regions: Vec<RegionFile>,
        tx: &SyncSender<ChunkPair>,
        progress: &Progress,
        stats: &mut ComparisonStats,
    ) -> DiffResult<()> {
        for mut old_region in regions {
            let pos = old_region.pos();
            let Some(mut new_region) = self.new.region(pos) else {
                debug!(region = %pos, "no counterpart in new save, skipping");
                stats.regions_skipped += 1;
                progress.advance_by(old_region.count_chunks() as u64);
                continue;
            };
            stats.regions += 1;

            let old_chunks = old_region.read_all_chunks()?;
            let new_chunks = new_region.read_all_chunks()?;
            for (old, new) in old_chunks.into_iter().zip(new_chunks) {
                match (old, new) {
                    (Some(old), Some(new)) => {
                        if tx.send(ChunkPair { old, new }).is_err() {
                            warn!("all comparison workers stopped; abandoning remaining chunks");
                            return Ok(());
                        }
                    }
                    (Some(_), None) => progress.advance(),
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

/// Comparison state owned by one pool thread.
trait PairWorker {
    fn compare(&mut self, pair: &ChunkPair) -> DiffResult<()>;
    fn finish(self) -> WorkerFindings;
}

impl PairWorker for ChunkComparer {
    fn compare(&mut self, pair: &ChunkPair) -> DiffResult<()> {
        ChunkComparer::compare(self, pair)
    }

    fn finish(self) -> WorkerFindings {
        ChunkComparer::finish(self)
    }
}

/// Run `produce` on the calling thread while `workers` threads, each with its
/// own `make_worker(index)` state, drain what it sends.
///
/// Returns the producer's result and one outcome per started worker: `None`
/// for a worker that failed or panicked.
fn run_pool<W, M, P>(
    workers: usize,
    queue_capacity: usize,
    progress: &Progress,
    make_worker: M,
    produce: P,
) -> (DiffResult<()>, Vec<Option<WorkerFindings>>)
where
    W: PairWorker,
    M: Fn(usize) -> W + Sync,
    P: FnOnce(&SyncSender<ChunkPair>) -> DiffResult<()>,
{
    let (tx, rx) = mpsc::sync_channel(queue_capacity);
    let queue = PairQueue::new(rx, workers);
    thread::scope(|scope| {
        let tx = tx;
        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let queue = &queue;
            let make_worker = &make_worker;
            let spawned = thread::Builder::new()
                .name(format!("mcw-diff-{index}"))
                .spawn_scoped(scope, move || {
                    let _live = LiveWorker(queue);
                    run_worker(index, queue, progress, make_worker(index))
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Workers already running exit once `tx` drops.
                    queue.abandon(workers - index);
                    return (Err(DiffError::Spawn(e)), Vec::new());
                }
            }
        }

        let produced = produce(&tx);
        drop(tx);

        let outcomes: Vec<Option<WorkerFindings>> = handles
            .into_iter()
            .enumerate()
            .map(|(index, handle)| match handle.join() {
                Ok(outcome) => outcome,
                Err(_) => {
                    error!(worker = index, "comparison worker panicked");
                    None
                }
            })
            .collect();
        (produced, outcomes)
    })
}

/// Fold worker outcomes together, counting the failed ones.
fn merge_outcomes(
    outcomes: Vec<Option<WorkerFindings>>,
    stats: &mut ComparisonStats,
) -> WorkerFindings {
    let mut findings = WorkerFindings::default();
    for outcome in outcomes {
        match outcome {
            Some(found) => findings.merge(found),
            None => stats.failed_workers += 1,
        }
    }
    stats.chunk_pairs = findings.chunks;
    if stats.failed_workers > 0 {
        warn!(
            failed = stats.failed_workers,
            workers = stats.workers,
            "some comparison workers failed; results are incomplete"
        );
    }
    findings
}

/// Receiving end shared by the worker pool. The last worker to leave drops
/// the receiver so a blocked producer sees a closed channel.
struct PairQueue {
    rx: Mutex<Option<Receiver<ChunkPair>>>,
    live: AtomicUsize,
}

impl PairQueue {
    fn new(rx: Receiver<ChunkPair>, workers: usize) -> Self {
        Self {
            rx: Mutex::new(Some(rx)),
            live: AtomicUsize::new(workers),
        }
    }

    /// Next pair, or `None` once the producer is done.
    fn recv(&self) -> Option<ChunkPair> {
        let rx = self.rx.lock().unwrap_or_else(PoisonError::into_inner);
        rx.as_ref()?.recv().ok()
    }

    fn leave(&self) {
        if self.live.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.rx.lock().unwrap_or_else(PoisonError::into_inner).take();
        }
    }

    /// Account for workers that were never started.
    fn abandon(&self, count: usize) {
        for _ in 0..count {
            self.leave();
        }
    }
}

/// Leaves the queue when dropped, including on panic.
struct LiveWorker<'a>(&'a PairQueue);

impl Drop for LiveWorker<'_> {
    fn drop(&mut self) {
        self.0.leave();
    }
}

fn run_worker<W: PairWorker>(
    index: usize,
    queue: &PairQueue,
    progress: &Progress,
    mut worker: W,
) -> Option<WorkerFindings> {
    while let Some(pair) = queue.recv() {
        if let Err(e) = worker.compare(&pair) {
            error!(
                worker = index,
                chunk = %pair.old.pos(),
                error = %e,
                "comparison worker failed"
            );
            return None;
        }
        progress.advance();
    }
    Some(worker.finish())
}

/// Everything aggregation needs.
pub struct AggregateInput<'a> {
    pub old_blocks: &'a [RegistryEntry],
    pub new_blocks: &'a [RegistryEntry],
    pub blocks: RegistryDiff,
    pub items: RegistryDiff,
    pub chunks: ChunkDiff,
}

/// Numeric ids outside the 12-bit block range cannot appear in chunk data.
fn chunk_block_id(id: i32) -> Option<u16> {
    u16::try_from(id).ok().filter(|id| *id < BLOCK_ID_LIMIT)
}

/// Hint tables for swaps. Old ids resolve through the old registry. New ids
/// resolve through the new registry first, then through the applied block
/// renames, which carry their id over into the converted save.
fn block_names(old: &[RegistryEntry], new: &[RegistryEntry], renames: &[Action]) -> BlockNames {
    let mut names = BlockNames::new();
    for entry in old {
        if let Some(id) = chunk_block_id(entry.id) {
            names.push_old(id, entry.name.clone());
        }
    }
    for entry in new {
        if let Some(id) = chunk_block_id(entry.id) {
            names.push_new(id, entry.name.clone());
        }
    }
    for action in renames {
        if let Action::RenameBlock(rename) = action {
            if let Some(id) = chunk_block_id(rename.new_id) {
                names.push_new(id, rename.new_name.clone());
            }
        }
    }
    names
}

/// Merge, filter, annotate and sort.
///
/// - swaps whose old id names a `reserved_domain` block are dropped
/// - remaining swaps get the shared hint tables
/// - a missing block entity is dropped if its name was resolved anywhere
pub fn aggregate(reserved_domain: &str, input: AggregateInput<'_>) -> Comparison {
    let AggregateInput {
        old_blocks,
        new_blocks,
        mut blocks,
        mut items,
        chunks,
    } = input;
    let findings = chunks.findings;

    let hints = Arc::new(block_names(old_blocks, new_blocks, &blocks.renames));
    let mut block_swaps: Vec<Action> = findings
        .swaps
        .into_iter()
        .filter(|swap| {
            !hints
                .old_name(swap.old_id())
                .is_some_and(|name| name.is_in_domain(reserved_domain))
        })
        .map(|swap| Action::SwapBlock(swap.with_hints(hints.clone())))
        .collect();

    let mut block_entity_renames: Vec<Action> = findings
        .entity_renames
        .into_iter()
        .map(Action::RenameBlockEntity)
        .collect();

    let resolved: HashSet<_> = findings.resolved_entities;
    let mut missing_block_entities: Vec<Action> = findings
        .missing_entities
        .into_iter()
        .filter(|missing| !resolved.contains(missing.old_name()))
        .map(Action::RenameBlockEntity)
        .collect();

    for list in [
        &mut blocks.renames,
        &mut blocks.missing,
        &mut items.renames,
        &mut items.missing,
        &mut block_swaps,
        &mut block_entity_renames,
        &mut missing_block_entities,
    ] {
        sort_actions(list);
    }

    Comparison {
        old: None,
        new: None,
        block_renames: blocks.renames,
        missing_blocks: blocks.missing,
        item_renames: items.renames,
        missing_items: items.missing,
        block_swaps,
        block_entity_renames,
        missing_block_entities,
        stats: chunks.stats,
    }
}
