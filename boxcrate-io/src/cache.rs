//! Shared, deduplicating point cloud cache
//!
//! Every consumer of a point cloud goes through one [`PointCache`]. The first
//! `load` of an id decodes it; concurrent loads of the same id wait for that
//! decode instead of starting their own. The cache holds at most
//! [`CacheConfig::max_size`] entries, pending decodes included, and evicts
//! the oldest-inserted entry first. Lookups do not refresh an entry's age.

use boxcrate_core::{Error, PointBuffer, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use crate::source::PointCloudSource;

/// Default number of cached point clouds
pub const MAX_SIZE: usize = 50;

/// Point cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_size: MAX_SIZE }
    }
}

impl CacheConfig {
    /// Set the maximum number of cached point clouds
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }
}

/// A decode failure that can be handed to every waiter
#[derive(Debug, Clone)]
enum Failure {
    NotFound(String),
    Decode(String),
}

impl From<Error> for Failure {
    fn from(error: Error) -> Self {
        match error {
            Error::NotFound(id) => Failure::NotFound(id),
            Error::Decode(msg) => Failure::Decode(msg),
            other => Failure::Decode(other.to_string()),
        }
    }
}

impl From<Failure> for Error {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::NotFound(id) => Error::NotFound(id),
            Failure::Decode(msg) => Error::Decode(msg),
        }
    }
}

/// One cached id; empty while its decode is running
#[derive(Default)]
struct Slot {
    value: OnceLock<std::result::Result<PointBuffer, Failure>>,
}

#[derive(Default)]
struct Index {
    slots: HashMap<String, Arc<Slot>>,
    order: VecDeque<String>,
}

impl Index {
    fn remove(&mut self, source_id: &str) -> Option<Arc<Slot>> {
        let slot = self.slots.remove(source_id)?;
        self.order.retain(|id| id != source_id);
        Some(slot)
    }
}

/// Bounded FIFO cache of decoded point clouds, shared as `Arc<PointCache>`
pub struct PointCache {
    source: Box<dyn PointCloudSource>,
    config: CacheConfig,
    index: Mutex<Index>,
}

impl PointCache {
    /// Create a cache over `source` with the default configuration
    pub fn new<S: PointCloudSource + 'static>(source: S) -> Self {
        Self::with_config(source, CacheConfig::default())
    }

    /// Create a cache over `source` with a custom configuration
    pub fn with_config<S: PointCloudSource + 'static>(source: S, config: CacheConfig) -> Self {
        Self {
            source: Box::new(source),
            config,
            index: Mutex::new(Index::default()),
        }
    }

    /// Get the cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn index(&self) -> MutexGuard<'_, Index> {
        // the index is consistent after every statement, so a poisoned lock is still usable
        self.index.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Load a point cloud, decoding it at most once across concurrent callers.
    ///
    /// Callers receive their own copy of the cached buffer. A failed decode is
    /// reported to every caller waiting on it and is not cached.
    pub fn load(&self, source_id: &str) -> Result<PointBuffer> {
        let slot = {
            let mut index = self.index();
            match index.slots.get(source_id) {
                Some(slot) => {
                    log::debug!("point cache hit for {}", source_id);
                    Arc::clone(slot)
                }
                None => {
                    log::debug!("point cache miss for {}", source_id);
                    let slot = Arc::new(Slot::default());
                    index.slots.insert(source_id.to_string(), Arc::clone(&slot));
                    index.order.push_back(source_id.to_string());
                    while index.order.len() > self.config.max_size {
                        if let Some(oldest) = index.order.pop_front() {
                            index.slots.remove(&oldest);
                            log::debug!("point cache evicted {}", oldest);
                        }
                    }
                    slot
                }
            }
        };

        let result = slot.value.get_or_init(|| {
            self.source.decode(source_id).map_err(|error| {
                log::warn!("failed to decode point cloud {}: {}", source_id, error);
                Failure::from(error)
            })
        });

        match result {
            Ok(buffer) => Ok(buffer.clone()),
            Err(failure) => {
                let mut index = self.index();
                // only drop the entry this attempt created, not a newer retry
                if index.slots.get(source_id).is_some_and(|current| Arc::ptr_eq(current, &slot)) {
                    index.remove(source_id);
                }
                Err(failure.clone().into())
            }
        }
    }

    /// Whether an id is cached or being decoded
    pub fn contains(&self, source_id: &str) -> bool {
        self.index().slots.contains_key(source_id)
    }

    /// Number of cached or pending entries
    pub fn len(&self) -> usize {
        self.index().slots.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop one entry. Buffers already handed out stay valid.
    pub fn evict(&self, source_id: &str) -> bool {
        let removed = self.index().remove(source_id).is_some();
        if removed {
            log::debug!("point cache evicted {}", source_id);
        }
        removed
    }

    /// Drop every entry
    pub fn clear(&self) {
        let mut index = self.index();
        index.slots.clear();
        index.order.clear();
    }
}

impl std::fmt::Debug for PointCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointCache")
            .field("config", &self.config)
            .field("len", &self.len())
            .finish()
    }
}
