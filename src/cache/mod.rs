//! The transactional metrics cache.
//!
//! This module provides the core cache:
//!
//! - **Cache**: two jointly-locked indexes over the stored metrics
//!   (by content hash, by family name)
//! - **GatherSnapshot**: consistent point-in-time read views
//! - **CacheStats**: atomic counters for cache operations

mod record;
mod snapshot;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::RwLock;

pub use record::{LabelPair, Metric, MetricValue};
pub use snapshot::{FamilyView, GatherSnapshot};

use record::Family;

use crate::options::CacheOptions;
use crate::types::{epoch_millis, Insert, Key, ValueKind};
use crate::{Error, Result};

/// Statistics for cache operations.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Number of update batches processed.
    pub updates: AtomicU64,
    /// Number of update batches that reset the cache.
    pub resets: AtomicU64,
    /// Number of inserts applied.
    pub inserts_applied: AtomicU64,
    /// Number of deletions that removed a metric.
    pub deletions_applied: AtomicU64,
    /// Number of gathers served.
    pub gathers: AtomicU64,
}

impl CacheStats {
    /// Create new stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.updates.store(0, Ordering::Relaxed);
        self.resets.store(0, Ordering::Relaxed);
        self.inserts_applied.store(0, Ordering::Relaxed);
        self.deletions_applied.store(0, Ordering::Relaxed);
        self.gathers.store(0, Ordering::Relaxed);
    }
}

impl Clone for CacheStats {
    fn clone(&self) -> Self {
        Self {
            updates: AtomicU64::new(self.updates.load(Ordering::Relaxed)),
            resets: AtomicU64::new(self.resets.load(Ordering::Relaxed)),
            inserts_applied: AtomicU64::new(self.inserts_applied.load(Ordering::Relaxed)),
            deletions_applied: AtomicU64::new(self.deletions_applied.load(Ordering::Relaxed)),
            gathers: AtomicU64::new(self.gathers.load(Ordering::Relaxed)),
        }
    }
}

/// The two indexes, guarded jointly by one lock.
///
/// Every hash in `by_hash` is referenced from exactly one family's member
/// list and vice versa; guarding both with a single lock is what keeps that
/// cross-index invariant from ever being observable mid-update.
#[derive(Debug, Default)]
pub(crate) struct CacheInner {
    pub(crate) by_hash: HashMap<u64, Metric>,
    pub(crate) by_name: HashMap<String, Family>,
}

/// Concurrency-safe, transactionally-read metrics cache.
///
/// Producers push batches of inserts and deletions through [`update`];
/// consumers take consistent snapshots through [`gather`]. Updates are
/// serialized; any number of snapshots may be read concurrently, and no
/// reader ever observes a partially-applied batch.
///
/// # Thread Safety
///
/// The cache is thread-safe and can be shared across threads using `Arc`.
/// A single reader-writer lock guards both indexes jointly.
///
/// [`update`]: Cache::update
/// [`gather`]: Cache::gather
pub struct Cache {
    inner: RwLock<CacheInner>,
    stats: Arc<CacheStats>,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache {
    /// Create an empty cache with default options.
    pub fn new() -> Self {
        Self::with_options(CacheOptions::default())
    }

    /// Create an empty cache with the given options.
    pub fn with_options(options: CacheOptions) -> Self {
        Self {
            inner: RwLock::new(CacheInner {
                by_hash: HashMap::with_capacity(options.initial_metrics_capacity),
                by_name: HashMap::with_capacity(options.initial_families_capacity),
            }),
            stats: Arc::new(CacheStats::new()),
        }
    }

    /// Apply a batch of inserts and deletions under the exclusive lock.
    ///
    /// Inserts are applied first, in order, then deletions, in order. The
    /// whole batch becomes visible to readers atomically. With `reset` set,
    /// the batch is applied to fresh indexes and the previous contents
    /// survive only where the batch re-inserts them; existing records are
    /// reused rather than reallocated where possible.
    ///
    /// `inserts` is consumed: label vectors and help text are moved into
    /// the stored records instead of being copied.
    ///
    /// Structural validation failures are collected per item and do not
    /// stop the batch; the aggregated error is returned at the end.
    /// Deleting a series that is not cached is not an error. The one
    /// exception is an insert with a kind the cache cannot store
    /// ([`ValueKind::Histogram`] or [`ValueKind::Summary`]): that aborts
    /// the update immediately, returning only that error, and the rest of
    /// the batch is not applied.
    pub fn update(&self, reset: bool, inserts: Vec<Insert>, deletions: &[Key]) -> Result<()> {
        let insert_count = inserts.len();
        let mut inner = self.inner.write();
        self.stats.updates.fetch_add(1, Ordering::Relaxed);

        let result = if reset {
            self.stats.resets.fetch_add(1, Ordering::Relaxed);
            // Swap in fresh indexes; the previous content becomes a reuse
            // pool for records the batch re-inserts.
            let mut reclaim = mem::take(&mut *inner);
            inner.by_hash.reserve(reclaim.by_hash.len());
            inner.by_name.reserve(reclaim.by_name.len());
            apply_batch(&mut *inner, Some(&mut reclaim), inserts, deletions, &self.stats)
        } else {
            apply_batch(&mut *inner, None, inserts, deletions, &self.stats)
        };

        debug!(
            "update: reset={} inserts={} deletions={} ok={}",
            reset,
            insert_count,
            deletions.len(),
            result.is_ok()
        );
        result
    }

    /// Take a consistent point-in-time view of the cache.
    ///
    /// Acquires the shared lock and hands it to the returned
    /// [`GatherSnapshot`]; concurrent gathers coexist, updates block until
    /// every outstanding snapshot is released. The caller must release the
    /// snapshot (explicitly or by dropping it) when done - a leaked
    /// snapshot starves all future writers indefinitely.
    ///
    /// The `Result` is reserved for symmetry with [`update`]; gathering
    /// does not fail in normal operation.
    ///
    /// [`update`]: Cache::update
    pub fn gather(&self) -> Result<GatherSnapshot<'_>> {
        let guard = self.inner.read();
        self.stats.gathers.fetch_add(1, Ordering::Relaxed);
        trace!("gather: {} families", guard.by_name.len());
        Ok(GatherSnapshot { guard })
    }

    /// Get the number of cached metrics.
    pub fn len(&self) -> usize {
        self.inner.read().by_hash.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the number of cached families.
    pub fn family_count(&self) -> usize {
        self.inner.read().by_name.len()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }
}

/// Apply one update batch to the working indexes.
///
/// `reclaim` carries the pre-reset content when resetting; records found
/// there are moved into the working indexes instead of being reallocated.
fn apply_batch(
    inner: &mut CacheInner,
    mut reclaim: Option<&mut CacheInner>,
    inserts: Vec<Insert>,
    deletions: &[Key],
    stats: &CacheStats,
) -> Result<()> {
    let reset = reclaim.is_some();
    let mut errs = Vec::new();

    for insert in inserts {
        if let Err(err) = insert.key.validate() {
            errs.push(err);
            continue;
        }

        let hash = insert.key.content_hash();
        let Insert {
            key,
            help,
            value_kind,
            value,
            timestamp,
        } = insert;
        let Key {
            fq_name,
            label_names,
            label_values,
        } = key;

        // Update the family. Within a batch, the last insert naming a
        // family wins its help and kind.
        if let Some(family) = inner.by_name.get_mut(&fq_name) {
            family.help = help;
            family.kind = value_kind;
        } else {
            let reclaimed = reclaim
                .as_mut()
                .and_then(|old| old.by_name.remove(&fq_name));
            let family = match reclaimed {
                Some(mut family) => {
                    family.members.clear();
                    family.help = help;
                    family.kind = value_kind;
                    family
                }
                None => Family::new(fq_name.clone(), help, value_kind),
            };
            inner.by_name.insert(fq_name.clone(), family);
        }

        let pre_existing = inner.by_hash.contains_key(&hash);

        // Route the value into the matching arm. Anything else fails the
        // whole batch, unlike the per-item validation above.
        let new_value = match value_kind {
            ValueKind::Counter => MetricValue::Counter(value),
            ValueKind::Gauge => MetricValue::Gauge(value),
            ValueKind::Untyped => MetricValue::Untyped(value),
            unsupported => return Err(Error::UnsupportedValueKind(unsupported)),
        };

        let timestamp_ms = timestamp.map(epoch_millis);

        match inner.by_hash.entry(hash) {
            Entry::Occupied(mut entry) => {
                let metric = entry.get_mut();
                metric.value = new_value;
                metric.timestamp_ms = timestamp_ms;
            }
            Entry::Vacant(entry) => {
                let reclaimed = reclaim.as_mut().and_then(|old| old.by_hash.remove(&hash));
                let metric = match reclaimed {
                    // Same hash means same labels; only the sample changes.
                    Some(mut metric) => {
                        metric.value = new_value;
                        metric.timestamp_ms = timestamp_ms;
                        metric
                    }
                    None => Metric::from_parts(label_names, label_values, new_value, timestamp_ms),
                };
                entry.insert(metric);
            }
        }

        // Link into the family's member list. A pre-existing metric is
        // already a member unless this batch is rebuilding from scratch.
        if reset || !pre_existing {
            if let Some(family) = inner.by_name.get_mut(&fq_name) {
                family.members.push(hash);
            }
        }

        stats.inserts_applied.fetch_add(1, Ordering::Relaxed);
    }

    for key in deletions {
        if let Err(err) = key.validate() {
            errs.push(err);
            continue;
        }

        let hash = key.content_hash();
        if inner.by_hash.remove(&hash).is_none() {
            // Deleting a series that is not cached is not an error.
            continue;
        }
        stats.deletions_applied.fetch_add(1, Ordering::Relaxed);

        let remove_family = match inner.by_name.get_mut(&key.fq_name) {
            None => {
                errs.push(Error::FamilyNotFound(key.fq_name.clone()));
                continue;
            }
            Some(family) => match family.members.iter().position(|&member| member == hash) {
                None => {
                    errs.push(Error::MemberNotFound {
                        family: key.fq_name.clone(),
                    });
                    continue;
                }
                Some(_) if family.members.len() == 1 => true,
                Some(position) => {
                    family.members.remove(position);
                    false
                }
            },
        };

        if remove_family {
            inner.by_name.remove(&key.fq_name);
        }
    }

    Error::maybe_aggregate(errs)
}
