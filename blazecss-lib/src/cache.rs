use crate::error::Result;
use crate::index::ClassIndex;
use log::{debug, warn};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Cached [`ClassIndex`] with time- and event-based invalidation.
///
/// Readers always get a complete index: a rebuild produces a new `Arc` and
/// swaps it in. Rebuilds are serialized; callers that arrive while one is
/// running wait for it and then reuse its result instead of rebuilding again.
#[derive(Debug)]
pub struct ClassCache {
    ttl: Duration,
    state: RwLock<CacheState>,
    rebuild_lock: Mutex<()>,
}

#[derive(Debug)]
struct CacheState {
    index: Arc<ClassIndex>,
    built_at: Option<Instant>,
    /// Bumped by `invalidate`.
    generation: u64,
    /// `generation` observed when the current index started building.
    built_generation: Option<u64>,
}

impl ClassCache {
    pub fn new(ttl: Duration) -> Self {
        ClassCache {
            ttl,
            state: RwLock::new(CacheState {
                index: Arc::new(ClassIndex::default()),
                built_at: None,
                generation: 0,
                built_generation: None,
            }),
            rebuild_lock: Mutex::new(()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current index, possibly stale or empty.
    pub fn get(&self) -> Arc<ClassIndex> {
        Arc::clone(&self.read_state().index)
    }

    pub fn invalidate(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.generation += 1;
        debug!("Class index invalidated (generation {})", state.generation);
    }

    pub fn is_stale(&self) -> bool {
        let state = self.read_state();
        state.index.is_empty()
            || state.built_generation != Some(state.generation)
            || state
                .built_at
                .map_or(true, |built_at| built_at.elapsed() >= self.ttl)
    }

    /// Rebuild with `build` when stale; otherwise return the cached index.
    ///
    /// On failure the previous index stays in place and the error is returned.
    pub fn rebuild_if_stale<F>(&self, build: F) -> Result<Arc<ClassIndex>>
    where
        F: FnOnce() -> Result<ClassIndex>,
    {
        if !self.is_stale() {
            return Ok(self.get());
        }

        let _guard = self.rebuild_lock.lock().unwrap_or_else(PoisonError::into_inner);
        // another caller may have finished a rebuild while we waited
        if !self.is_stale() {
            return Ok(self.get());
        }

        let generation = self.read_state().generation;
        let started = Instant::now();
        let index = match build() {
            Ok(index) => Arc::new(index),
            Err(err) => {
                warn!("Class index rebuild failed, keeping previous index: {}", err);
                return Err(err);
            }
        };

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.index = Arc::clone(&index);
        state.built_at = Some(started);
        state.built_generation = Some(generation);
        debug!(
            "Class index rebuilt: {} classes in {:?}",
            index.len(),
            started.elapsed()
        );
        Ok(index)
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ClassCache {
    fn default() -> Self {
        ClassCache::new(DEFAULT_TTL)
    }
}
