//! # CacheModel
//!
//! CacheModel is a library for estimating the performance of a hardware cache against a trace of
//! reads and writes
//!
//! It provides a generic cache implementation which can be parameterised by a replacement policy,
//! classifies every access as a hit or a compulsory, conflict or capacity miss, and derives the
//! hit ratio, miss ratio and average memory access time. The cache is a model only: no data is
//! stored, and every instance is an independent, single threaded simulation
//!
//! ```
//! use cachemodel::cache::{CacheTrait, DirectMappedCache};
//! use cachemodel::geometry::Geometry;
//! use cachemodel::metrics::{MissKind, Outcome};
//!
//! let mut cache = DirectMappedCache::new(None, Geometry::default()).unwrap();
//! assert_eq!(cache.read(0x0).unwrap(), Outcome::Miss(MissKind::Compulsory));
//! assert_eq!(cache.read(0x0).unwrap(), Outcome::Hit);
//! assert_eq!(cache.hit_ratio().unwrap(), 0.5);
//! ```

/// Contains the cache engine, the direct mapped and set associative organisations, and the trait
/// they share
pub mod cache;

/// Contains definitions for the JSON configuration format
pub mod config;

/// Contains the errors raised by the engine, the trace readers and the simulator
pub mod error;

/// Contains the validated cache geometry and the address decoder
pub mod geometry;

/// Contains trace file access helpers
pub mod io;

/// Contains the access counters and the hit/miss taxonomy
pub mod metrics;

/// Contains the provided replacement policies, with a trait for implementing custom replacement
/// policies
pub mod replacement_policies;

/// Contains the simulator used to replay a trace through several cache configurations
pub mod simulator;

/// Contains the statistics snapshot and the human readable report
pub mod stats;

/// Contains the trace record format and the Valgrind lackey converter
pub mod trace;

#[cfg(test)]
mod test;

/// Contains deterministic synthetic trace generators for tests and benchmarks
pub mod util;
