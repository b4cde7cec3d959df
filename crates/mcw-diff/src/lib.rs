//! Comparison engine for the McW converter.
//!
//! Given an older and a newer modded save, the engine proposes the actions
//! needed to convert the first into the second:
//!
//! 1. Registry comparison (sequential): block and item entries that changed
//!    only in casing or underscores become renames, entries with no
//!    counterpart are reported as missing.
//! 2. Chunk comparison (concurrent): every chunk present in both saves is
//!    compared block by block and block entity by block entity. The calling
//!    thread decodes regions and feeds a bounded queue; a fixed pool of
//!    workers drains it.
//! 3. Aggregation: worker findings are merged, filtered, annotated with
//!    block names and sorted.
//!
//! # Key Types
//!
//! - [`Comparator`] - Validated save pair; runs the comparison
//! - [`Comparison`] - Sorted action lists plus coverage statistics
//! - [`DiffConfig`] - Tuning knobs, loadable from TOML
//! - [`Progress`] / [`ProgressSink`] - Throttled progress reporting

pub mod chunk_diff;
pub mod config;
pub mod engine;
pub mod error;
pub mod progress;
pub mod registry;

pub use chunk_diff::{ChunkComparer, ChunkPair, WorkerFindings};
pub use config::DiffConfig;
pub use engine::{aggregate, AggregateInput, ChunkDiff, Comparator, Comparison, ComparisonStats};
pub use error::{DiffError, DiffResult};
pub use progress::{
    output_lock, CooldownGuard, CooldownLock, NoProgress, OutputLock, Progress, ProgressSink,
    TracingProgress,
};
pub use registry::{diff_registry, RegistryDiff};
