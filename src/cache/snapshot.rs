//! Point-in-time read views over the cache.
//!
//! [`GatherSnapshot`] is the release handle for a shared-lock read: the
//! snapshot owns the read guard, and dropping it (or calling
//! [`GatherSnapshot::release`]) is what lets writers back in.

use std::cmp::Ordering;

use parking_lot::RwLockReadGuard;

use super::record::Metric;
use super::CacheInner;
use crate::types::ValueKind;

/// A consistent view of the cache taken under the shared lock.
///
/// The snapshot holds the cache's read lock for its whole lifetime. Any
/// concurrent update blocks until every outstanding snapshot has been
/// released, so holding one longer than needed - or leaking it - starves
/// all writers indefinitely. Views returned by [`families`] borrow the
/// live records; the borrow checker prevents them from outliving the
/// snapshot.
///
/// [`families`]: GatherSnapshot::families
pub struct GatherSnapshot<'a> {
    pub(crate) guard: RwLockReadGuard<'a, CacheInner>,
}

impl<'a> GatherSnapshot<'a> {
    /// Produce the normalized view of all families.
    ///
    /// Families are ordered lexicographically by name; within a family,
    /// metrics are ordered by label count, label values, then timestamp.
    /// Nothing is copied; the views reference the stored records.
    pub fn families(&self) -> Vec<FamilyView<'_>> {
        let inner = &*self.guard;

        let mut names: Vec<&String> = inner.by_name.keys().collect();
        names.sort_unstable();

        let mut views = Vec::with_capacity(names.len());
        for name in names {
            let family = &inner.by_name[name];
            let mut metrics: Vec<&Metric> = family
                .members
                .iter()
                .filter_map(|hash| inner.by_hash.get(hash))
                .collect();
            if metrics.is_empty() {
                continue;
            }
            metrics.sort_by(|a, b| compare_metrics(a, b));
            views.push(FamilyView {
                name: &family.name,
                help: &family.help,
                kind: family.kind,
                metrics,
            });
        }
        views
    }

    /// End the read critical section.
    ///
    /// Equivalent to dropping the snapshot; provided so call sites can
    /// make the end of use explicit.
    pub fn release(self) {}
}

/// One family in a normalized snapshot view.
pub struct FamilyView<'a> {
    name: &'a str,
    help: &'a str,
    kind: ValueKind,
    metrics: Vec<&'a Metric>,
}

impl<'a> FamilyView<'a> {
    /// Family name.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Family help text.
    pub fn help(&self) -> &str {
        self.help
    }

    /// Family value kind.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Member metrics in normalized order.
    pub fn metrics(&self) -> &[&'a Metric] {
        &self.metrics
    }
}

/// Order metrics by label count, then label values, then timestamp.
///
/// Stored label lists are sorted by label name, so comparing values
/// positionally is deterministic within one family.
fn compare_metrics(a: &Metric, b: &Metric) -> Ordering {
    match a.labels.len().cmp(&b.labels.len()) {
        Ordering::Equal => {}
        other => return other,
    }
    for (la, lb) in a.labels.iter().zip(&b.labels) {
        match la.value.cmp(&lb.value) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    a.timestamp_ms.cmp(&b.timestamp_ms)
}
