//! Throttled progress reporting.
//!
//! Everything that prints shares one [`OutputLock`]. Progress updates go
//! through a [`CooldownLock`] wrapping that same lock: an update is only
//! delivered if the output is free *and* the cooldown since the previous
//! update has elapsed. Denied updates are dropped, so workers never wait on
//! the terminal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::{Duration, Instant};

/// Shared handle serializing access to the process output.
pub type OutputLock = Arc<Mutex<()>>;

pub fn output_lock() -> OutputLock {
    Arc::new(Mutex::new(()))
}

const NEVER: u64 = u64::MAX;

/// Non-blocking lock over an [`OutputLock`] that also enforces a minimum
/// interval between the release of one guard and the next acquisition.
#[derive(Debug)]
pub struct CooldownLock {
    output: OutputLock,
    cooldown: Duration,
    epoch: Instant,
    /// Milliseconds since `epoch` at the last release, or `NEVER`.
    last_release: AtomicU64,
}

impl CooldownLock {
    pub fn new(output: OutputLock, cooldown: Duration) -> Self {
        Self {
            output,
            cooldown,
            epoch: Instant::now(),
            last_release: AtomicU64::new(NEVER),
        }
    }

    /// Acquire without waiting. Fails while the cooldown is running or the
    /// output is held elsewhere.
    pub fn try_lock(&self) -> Option<CooldownGuard<'_>> {
        let last = self.last_release.load(Ordering::Acquire);
        if last != NEVER {
            let ready_at = Duration::from_millis(last) + self.cooldown;
            if self.epoch.elapsed() < ready_at {
                return None;
            }
        }
        let guard = match self.output.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return None,
        };
        Some(CooldownGuard {
            _output: guard,
            lock: self,
        })
    }

    /// Wait for the output, ignoring the cooldown. For final reports only.
    pub fn lock_now(&self) -> MutexGuard<'_, ()> {
        self.output.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds the output until dropped; dropping starts the cooldown.
pub struct CooldownGuard<'a> {
    _output: MutexGuard<'a, ()>,
    lock: &'a CooldownLock,
}

impl Drop for CooldownGuard<'_> {
    fn drop(&mut self) {
        let now = self.lock.epoch.elapsed().as_millis();
        let now = u64::try_from(now).unwrap_or(NEVER - 1);
        self.lock.last_release.store(now, Ordering::Release);
    }
}

/// Receives progress updates. Called with the output lock held.
pub trait ProgressSink: Send + Sync {
    fn report(&self, done: u64, total: u64, stage: &str);

    /// A stage completed; `report` has just been called with the final count.
    fn finish(&self, _stage: &str) {}
}

/// Discards all updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _done: u64, _total: u64, _stage: &str) {}
}

/// Emits updates as `debug` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&self, done: u64, total: u64, stage: &str) {
        tracing::debug!(done, total, stage, "progress");
    }

    fn finish(&self, stage: &str) {
        tracing::info!(stage, "stage complete");
    }
}

/// Counter for one stage, shared by every thread working on it.
pub struct Progress {
    stage: String,
    total: u64,
    done: AtomicU64,
    lock: CooldownLock,
    sink: Arc<dyn ProgressSink>,
}

impl Progress {
    pub fn new(
        stage: impl Into<String>,
        total: u64,
        lock: CooldownLock,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            stage: stage.into(),
            total,
            done: AtomicU64::new(0),
            lock,
            sink,
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn done(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }

    pub fn advance(&self) {
        self.advance_by(1);
    }

    /// Count `n` units, then report if the cooldown lock allows it.
    pub fn advance_by(&self, n: u64) {
        let done = self.done.fetch_add(n, Ordering::Relaxed) + n;
        if let Some(_guard) = self.lock.try_lock() {
            self.sink.report(done, self.total, &self.stage);
        }
    }

    /// Report the final count unconditionally.
    pub fn finish(&self) {
        let _guard = self.lock.lock_now();
        self.sink.report(self.done(), self.total, &self.stage);
        self.sink.finish(&self.stage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        reports: Mutex<Vec<(u64, u64)>>,
        finished: Mutex<Vec<String>>,
    }

    impl ProgressSink for Recorder {
        fn report(&self, done: u64, total: u64, _stage: &str) {
            self.reports.lock().unwrap().push((done, total));
        }

        fn finish(&self, stage: &str) {
            self.finished.lock().unwrap().push(stage.to_string());
        }
    }

    #[test]
    fn cooldown_denies_second_acquisition() {
        let lock = CooldownLock::new(output_lock(), Duration::from_secs(60));
        let first = lock.try_lock();
        assert!(first.is_some());
        drop(first);
        assert!(lock.try_lock().is_none());
    }

    #[test]
    fn zero_cooldown_allows_reacquire() {
        let lock = CooldownLock::new(output_lock(), Duration::ZERO);
        drop(lock.try_lock().unwrap());
        assert!(lock.try_lock().is_some());
    }

    #[test]
    fn busy_output_denies_without_blocking() {
        let output = output_lock();
        let lock = CooldownLock::new(output.clone(), Duration::ZERO);
        let held = output.lock().unwrap();
        assert!(lock.try_lock().is_none());
        drop(held);
        assert!(lock.try_lock().is_some());
    }

    #[test]
    fn held_guard_blocks_other_cooldown_locks() {
        let output = output_lock();
        let a = CooldownLock::new(output.clone(), Duration::ZERO);
        let b = CooldownLock::new(output, Duration::ZERO);
        let _guard = a.try_lock().unwrap();
        assert!(b.try_lock().is_none());
    }

    #[test]
    fn throttled_reports_but_exact_count() {
        let recorder = Arc::new(Recorder::default());
        let lock = CooldownLock::new(output_lock(), Duration::from_secs(60));
        let progress = Progress::new("stage", 10, lock, recorder.clone());
        for _ in 0..10 {
            progress.advance();
        }
        assert_eq!(progress.done(), 10);
        // Only the first update fits in the cooldown window.
        assert_eq!(*recorder.reports.lock().unwrap(), vec![(1, 10)]);

        progress.finish();
        assert_eq!(recorder.reports.lock().unwrap().last(), Some(&(10, 10)));
        assert_eq!(*recorder.finished.lock().unwrap(), vec!["stage".to_string()]);
    }

    #[test]
    fn concurrent_advances_are_counted() {
        let lock = CooldownLock::new(output_lock(), Duration::ZERO);
        let progress = Progress::new("stage", 4000, lock, Arc::new(NoProgress));
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        progress.advance();
                    }
                });
            }
        });
        assert_eq!(progress.done(), 4000);
    }
}
