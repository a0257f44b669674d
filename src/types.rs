//! Core input types for metricache.
//!
//! A [`Key`] identifies one metric series: a fully-qualified name plus
//! parallel label name/value sequences. An [`Insert`] is one write request
//! built on top of a Key. Keys are deduplicated by an order-sensitive
//! 64-bit content hash.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use xxhash_rust::xxh3::Xxh3;

use crate::{Error, Result};

/// Separator written between hashed fields so that adjacent fields cannot
/// run together ("ab" + "c" must not collide with "a" + "bc").
const HASH_SEPARATOR: [u8; 1] = [0xff];

/// Kind of value a metric carries.
///
/// The full exposition kind set is representable, but the cache stores only
/// `Counter`, `Gauge`, and `Untyped`; updating with `Histogram` or `Summary`
/// fails the whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Monotonically increasing value.
    Counter,
    /// Value that can go up and down.
    Gauge,
    /// Value with no declared semantics.
    Untyped,
    /// Bucketed distribution. Not storable by this cache.
    Histogram,
    /// Quantile summary. Not storable by this cache.
    Summary,
}

impl ValueKind {
    /// Check whether the cache can store this kind.
    pub fn is_storable(&self) -> bool {
        matches!(self, ValueKind::Counter | ValueKind::Gauge | ValueKind::Untyped)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Counter => "counter",
            ValueKind::Gauge => "gauge",
            ValueKind::Untyped => "untyped",
            ValueKind::Histogram => "histogram",
            ValueKind::Summary => "summary",
        };
        f.write_str(name)
    }
}

/// Identity of one metric series.
///
/// Label names may be supplied in any order, but the order is part of the
/// identity: the content hash is computed over the fields as given, so the
/// same label set in a different order addresses a different series. Only
/// the stored representation of a metric's labels is sorted, for
/// deterministic output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    /// Fully-qualified metric name.
    pub fq_name: String,
    /// Label names, parallel to `label_values`.
    pub label_names: Vec<String>,
    /// Label values, parallel to `label_names`.
    pub label_values: Vec<String>,
}

impl Key {
    /// Create a key with no labels.
    pub fn new(fq_name: impl Into<String>) -> Self {
        Self {
            fq_name: fq_name.into(),
            label_names: Vec::new(),
            label_values: Vec::new(),
        }
    }

    /// Create a key with parallel label name/value sequences.
    pub fn with_labels(
        fq_name: impl Into<String>,
        label_names: Vec<String>,
        label_values: Vec<String>,
    ) -> Self {
        Self {
            fq_name: fq_name.into(),
            label_names,
            label_values,
        }
    }

    /// Validate the structural invariants of the key.
    pub fn validate(&self) -> Result<()> {
        if self.fq_name.is_empty() {
            return Err(Error::EmptyName);
        }
        if self.label_names.len() != self.label_values.len() {
            return Err(Error::LabelLengthMismatch {
                names: self.label_names.len(),
                values: self.label_values.len(),
            });
        }
        Ok(())
    }

    /// Compute the order-sensitive content hash of this key.
    ///
    /// Streams the name and each label pair, in supplied order, separated
    /// by [`HASH_SEPARATOR`]. Stable across calls for identical input.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.update(self.fq_name.as_bytes());
        hasher.update(&HASH_SEPARATOR);
        for (name, value) in self.label_names.iter().zip(&self.label_values) {
            hasher.update(name.as_bytes());
            hasher.update(&HASH_SEPARATOR);
            hasher.update(value.as_bytes());
            hasher.update(&HASH_SEPARATOR);
        }
        hasher.digest()
    }
}

/// One write request: a key plus the sample to store for it.
#[derive(Debug, Clone)]
pub struct Insert {
    /// Identity of the series to write.
    pub key: Key,
    /// Help text for the owning family.
    pub help: String,
    /// Kind of the value.
    pub value_kind: ValueKind,
    /// The sample value.
    pub value: f64,
    /// Optional explicit timestamp, exported at millisecond resolution.
    pub timestamp: Option<SystemTime>,
}

impl Insert {
    /// Create an insert without an explicit timestamp.
    pub fn new(key: Key, help: impl Into<String>, value_kind: ValueKind, value: f64) -> Self {
        Self {
            key,
            help: help.into(),
            value_kind,
            value,
            timestamp: None,
        }
    }

    /// Attach an explicit timestamp.
    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Convert a timestamp to milliseconds since the Unix epoch.
///
/// Pre-epoch timestamps yield negative milliseconds.
pub(crate) fn epoch_millis(timestamp: SystemTime) -> i64 {
    match timestamp.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as i64,
        Err(e) => -(e.duration().as_millis() as i64),
    }
}
