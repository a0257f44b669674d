//! # metricache
//!
//! A concurrency-safe, transactionally-read metrics cache.
//!
//! The cache holds a mutable set of named, labeled metrics grouped into
//! families. Producers push incremental changes (inserts, deletions, or a
//! full reset) through [`Cache::update`]; consumers take consistent
//! point-in-time views through [`Cache::gather`] without blocking each
//! other.
//!
//! ## Features
//!
//! - **Serialized writes**: at most one update runs at a time
//! - **Transactional reads**: readers never observe a partial batch
//! - **Series deduplication**: repeated writes to the same key update the
//!   stored record in place, keyed by an order-sensitive content hash
//! - **Normalized views**: families and metrics in deterministic order,
//!   borrowed from the live records without deep copies
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use metricache::{Cache, Insert, Key, ValueKind};
//!
//! let cache = Cache::new();
//!
//! // Push a batch of samples.
//! cache.update(
//!     false,
//!     vec![Insert::new(
//!         Key::new("http_requests_total"),
//!         "Total HTTP requests.",
//!         ValueKind::Counter,
//!         1.0,
//!     )],
//!     &[],
//! )?;
//!
//! // Read a consistent snapshot; release it when done.
//! let snapshot = cache.gather()?;
//! for family in snapshot.families() {
//!     for metric in family.metrics() {
//!         println!("{} = {}", family.name(), metric.value().get());
//!     }
//! }
//! snapshot.release();
//! ```

// Public modules
pub mod error;
pub mod options;
pub mod types;

// Internal modules
mod cache;

// Re-export main types for convenience
pub use cache::{Cache, CacheStats, FamilyView, GatherSnapshot, LabelPair, Metric, MetricValue};
pub use error::{Error, Result};
pub use options::CacheOptions;
pub use types::{Insert, Key, ValueKind};
