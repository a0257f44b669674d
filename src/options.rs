//! Configuration options for metricache.

/// Default initial capacity of the by-hash metric index.
pub const DEFAULT_METRICS_CAPACITY: usize = 1024;

/// Default initial capacity of the by-name family index.
pub const DEFAULT_FAMILIES_CAPACITY: usize = 64;

/// Cache configuration options.
///
/// The capacities only pre-size the two indexes; both grow on demand.
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Initial capacity of the metric index (keyed by content hash).
    pub initial_metrics_capacity: usize,
    /// Initial capacity of the family index (keyed by family name).
    pub initial_families_capacity: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            initial_metrics_capacity: DEFAULT_METRICS_CAPACITY,
            initial_families_capacity: DEFAULT_FAMILIES_CAPACITY,
        }
    }
}

impl CacheOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }
}
