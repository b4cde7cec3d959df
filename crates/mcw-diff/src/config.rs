use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DiffError, DiffResult};

/// Tuning for a comparison run. Every field has a default, so a config file
/// only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Compare block ids pairwise instead of only looking for vanished blocks.
    pub strict: bool,
    /// Worker threads; `None` uses the available parallelism.
    pub workers: Option<usize>,
    /// Chunk pairs queued per worker before the producer blocks.
    pub queue_per_worker: usize,
    pub progress_cooldown_ms: u64,
    /// Registry domain owned by the base game; never diffed.
    pub reserved_domain: String,
    pub region_cache_capacity: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            strict: false,
            workers: None,
            queue_per_worker: 2,
            progress_cooldown_ms: 250,
            reserved_domain: "minecraft".to_string(),
            region_cache_capacity: mcw_store::DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl DiffConfig {
    pub fn from_toml_str(text: &str) -> DiffResult<Self> {
        toml::from_str(text).map_err(|e| DiffError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> DiffResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DiffError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn worker_count(&self) -> usize {
        self.workers
            .filter(|n| *n > 0)
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, NonZeroUsize::get))
    }

    /// Bounded queue capacity, never zero.
    pub fn queue_capacity(&self) -> usize {
        self.queue_per_worker.saturating_mul(self.worker_count()).max(1)
    }

    pub fn progress_cooldown(&self) -> Duration {
        Duration::from_millis(self.progress_cooldown_ms)
    }
}
