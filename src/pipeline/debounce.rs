//! Per-unit debounced re-analysis
//!
//! Every `schedule` for a key replaces whatever was pending for that key:
//! the old timer (or the job it already started) is aborted, never queued.
//! At most one job per key is alive at any time.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Default quiet period
pub const DEFAULT_QUIET: Duration = Duration::from_millis(2000);

type PendingMap = HashMap<String, (u64, JoinHandle<()>)>;

fn lock(pending: &Mutex<PendingMap>) -> MutexGuard<'_, PendingMap> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cancellable timers keyed by source unit path.
///
/// Must be used from inside a tokio runtime. Dropping the debouncer aborts
/// everything still pending.
pub struct Debouncer {
    quiet: Duration,
    pending: Arc<Mutex<PendingMap>>,
    generation: AtomicU64,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET)
    }
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Run `job` once `key` has been quiet for the configured period
    pub fn schedule<F, Fut>(&self, key: impl Into<String>, job: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let key = key.into();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let pending = Arc::clone(&self.pending);
        let quiet = self.quiet;
        let task_key = key.clone();

        // Held across the spawn so the task cannot finish before it is recorded
        let mut map = lock(&self.pending);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            job().await;
            let mut map = lock(&pending);
            if map.get(&task_key).is_some_and(|(g, _)| *g == generation) {
                map.remove(&task_key);
            }
        });

        if let Some((_, previous)) = map.insert(key, (generation, handle)) {
            previous.abort();
            debug!("Superseded pending analysis");
        }
    }

    /// Abort the pending job for `key`. Returns whether one existed.
    pub fn cancel(&self, key: &str) -> bool {
        match lock(&self.pending).remove(key) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for (_, (_, handle)) in lock(&self.pending).drain() {
            handle.abort();
        }
    }

    /// Number of keys with a live timer or running job
    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }

    pub fn is_pending(&self, key: &str) -> bool {
        lock(&self.pending).contains_key(key)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
