//! Stored metric and family records.

use crate::types::ValueKind;

/// One label name/value pair as stored on a metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPair {
    /// Label name.
    pub name: String,
    /// Label value.
    pub value: String,
}

/// The value of a stored metric.
///
/// Exactly one arm is active; routing an update into a different arm
/// replaces the previous one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    /// Monotonically increasing value.
    Counter(f64),
    /// Value that can go up and down.
    Gauge(f64),
    /// Value with no declared semantics.
    Untyped(f64),
}

impl MetricValue {
    /// Get the numeric value regardless of kind.
    pub fn get(&self) -> f64 {
        match self {
            MetricValue::Counter(v) | MetricValue::Gauge(v) | MetricValue::Untyped(v) => *v,
        }
    }

    /// Get the kind of the active arm.
    pub fn kind(&self) -> ValueKind {
        match self {
            MetricValue::Counter(_) => ValueKind::Counter,
            MetricValue::Gauge(_) => ValueKind::Gauge,
            MetricValue::Untyped(_) => ValueKind::Untyped,
        }
    }
}

/// One stored sample.
///
/// The label list is sorted by label name for deterministic output; the
/// identity hash of the series is computed from the supplied order, not
/// from this sorted representation.
#[derive(Debug, Clone)]
pub struct Metric {
    pub(crate) labels: Vec<LabelPair>,
    pub(crate) value: MetricValue,
    pub(crate) timestamp_ms: Option<i64>,
}

impl Metric {
    /// Build a new metric from an insert's parallel label vectors.
    pub(crate) fn from_parts(
        label_names: Vec<String>,
        label_values: Vec<String>,
        value: MetricValue,
        timestamp_ms: Option<i64>,
    ) -> Self {
        let mut labels: Vec<LabelPair> = label_names
            .into_iter()
            .zip(label_values)
            .map(|(name, value)| LabelPair { name, value })
            .collect();
        labels.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            labels,
            value,
            timestamp_ms,
        }
    }

    /// Label pairs, sorted by label name.
    pub fn labels(&self) -> &[LabelPair] {
        &self.labels
    }

    /// The stored value.
    pub fn value(&self) -> &MetricValue {
        &self.value
    }

    /// Explicit timestamp in milliseconds since the Unix epoch, if any.
    pub fn timestamp_ms(&self) -> Option<i64> {
        self.timestamp_ms
    }
}

/// A named group of metrics sharing help text and value kind.
///
/// `members` holds the content hashes of the member metrics, in insertion
/// order. A family with no members is removed from the cache, never kept
/// as an empty entry.
#[derive(Debug)]
pub(crate) struct Family {
    pub(crate) name: String,
    pub(crate) help: String,
    pub(crate) kind: ValueKind,
    pub(crate) members: Vec<u64>,
}

impl Family {
    pub(crate) fn new(name: String, help: String, kind: ValueKind) -> Self {
        Self {
            name,
            help,
            kind,
            members: Vec::new(),
        }
    }
}
