use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheTrait, Topology};
use crate::error::Result;
use crate::metrics::{Misses, Totals};
use crate::replacement_policies::ReplacementPolicyKind;

/// A read-only snapshot of a cache's configuration and statistics. Serialises to the JSON report,
/// and displays as the human readable one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub name: String,
    pub topology: Topology,
    pub replacement_policy: ReplacementPolicyKind,
    pub n_way: u64,
    pub capacity_kib: f64,
    pub line_size: u64,
    pub hit_latency: u64,
    pub miss_latency: u64,
    pub amat: f64,
    pub hit_ratio: f64,
    pub miss_ratio: f64,
    pub hits: u64,
    pub misses: Misses,
    pub total: Totals,
}

impl CacheStats {
    /// Fails with `DivisionUndefined` when the cache has not seen any access yet
    pub fn from_cache<C: CacheTrait + ?Sized>(cache: &C) -> Result<Self> {
        cache.hit_ratio()?;
        Ok(Self::snapshot(cache))
    }

    /// Same as `from_cache`, but a cache without accesses reports zero ratios and AMAT
    pub fn snapshot<C: CacheTrait + ?Sized>(cache: &C) -> Self {
        let geometry = cache.geometry();
        let metrics = cache.metrics();
        Self {
            name: cache.name().to_string(),
            topology: cache.topology(),
            replacement_policy: cache.replacement_policy(),
            n_way: geometry.n_way(),
            capacity_kib: geometry.capacity_kib(),
            line_size: geometry.line_size(),
            hit_latency: geometry.hit_latency(),
            miss_latency: geometry.miss_latency(),
            amat: cache.amat().unwrap_or(0.0),
            hit_ratio: cache.hit_ratio().unwrap_or(0.0),
            miss_ratio: cache.miss_ratio().unwrap_or(0.0),
            hits: metrics.hits,
            misses: metrics.misses,
            total: metrics.total,
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "----------- {} -----------", self.name)?;
        writeln!(f, " -> Name:\t{}", self.name)?;
        writeln!(f, " -> Topology:\t{}", self.topology)?;
        writeln!(f, " -> Replacement Policy:\t{}", self.replacement_policy)?;
        writeln!(f, " -> N-Way:\t{}", self.n_way)?;
        writeln!(f, " -> Cache size:\t{} KiB", self.capacity_kib)?;
        writeln!(f, " -> Cache line:\t{} bytes", self.line_size)?;
        writeln!(f, " -> Hit lat.:\t{}", self.hit_latency)?;
        writeln!(f, " -> Miss lat.:\t{}", self.miss_latency)?;
        writeln!(f, " -> AMAT:\t{} clock cycles", self.amat)?;
        writeln!(f, " -> Hit Ratio:\t{} / {:.2}%", self.hit_ratio, self.hit_ratio * 100.0)?;
        writeln!(f, " -> Miss Ratio:\t{} / {:.2}%", self.miss_ratio, self.miss_ratio * 100.0)?;
        writeln!(f, " -> Miss info:\t{}", self.misses)?;
        write!(f, " -> Total:\t{}", self.total)
    }
}
