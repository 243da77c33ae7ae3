use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CacheError, Result};
use crate::geometry::Geometry;
use crate::metrics::{round3, AccessKind, Metrics, MissKind, Outcome};
use crate::replacement_policies::{
    FirstInFirstOut, LeastRecentlyUsed, NoPolicy, NotMostRecentlyUsed, RandomPolicy,
    ReplacementPolicy, ReplacementPolicyKind, Unimplemented,
};
use crate::stats::CacheStats;

static DIRECT_MAPPED_INSTANCES: AtomicUsize = AtomicUsize::new(0);
static SET_ASSOCIATIVE_INSTANCES: AtomicUsize = AtomicUsize::new(0);

/// How lines are placed in the cache
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    DirectMapped,
    SetAssociative,
}

impl Topology {
    fn default_name(&self) -> String {
        let counter = match self {
            Topology::DirectMapped => &DIRECT_MAPPED_INSTANCES,
            Topology::SetAssociative => &SET_ASSOCIATIVE_INSTANCES,
        };
        format!("{self}_cache_{}", counter.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topology::DirectMapped => write!(f, "direct_mapped"),
            Topology::SetAssociative => write!(f, "set_associative"),
        }
    }
}

/// The bookkeeping of a single cache line. No data is stored, only what is needed to classify
/// accesses
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Line {
    pub tag: u64,
    pub valid: bool,
    pub dirty: bool,
}

/// The capability interface shared by every cache organisation
///
/// Only the required methods touch the cache state, the provided ones are all derived from the
/// metrics and the geometry
pub trait CacheTrait {
    /// Simulates one access, returning how it was classified
    ///
    /// On success exactly one access is counted. On failure the access is rejected as a whole:
    /// neither the lines, the replacement policy, nor the metrics are touched
    ///
    /// # Arguments
    ///
    /// * `kind`: Whether the access is a read or a write
    /// * `address`: The byte address of the access
    ///
    /// returns: Result<Outcome, CacheError>
    fn access(&mut self, kind: AccessKind, address: u64) -> Result<Outcome>;

    fn read(&mut self, address: u64) -> Result<Outcome> {
        self.access(AccessKind::Read, address)
    }

    fn write(&mut self, address: u64) -> Result<Outcome> {
        self.access(AccessKind::Write, address)
    }

    /// Invalidates every line and resets the replacement policy and the metrics. The geometry is
    /// kept
    fn clear(&mut self);

    fn metrics(&self) -> &Metrics;

    fn geometry(&self) -> &Geometry;

    fn name(&self) -> &str;

    fn topology(&self) -> Topology;

    fn replacement_policy(&self) -> ReplacementPolicyKind;

    /// Gets the number of lines which were never filled. Useful for analysing cache performance
    /// or debugging
    fn get_uninitialised_line_count(&self) -> usize;

    fn hits(&self) -> u64 {
        self.metrics().hits
    }

    fn misses(&self) -> u64 {
        self.metrics().misses.sum()
    }

    fn hit_ratio(&self) -> Result<f64> {
        self.metrics().hit_ratio()
    }

    fn miss_ratio(&self) -> Result<f64> {
        self.metrics().miss_ratio()
    }

    /// Average memory access time: `hit_latency + miss_ratio * miss_latency`
    fn amat(&self) -> Result<f64> {
        let geometry = self.geometry();
        let miss_ratio = self.miss_ratio()?;
        Ok(round3(
            geometry.hit_latency() as f64 + miss_ratio * geometry.miss_latency() as f64,
        ))
    }

    /// Takes a snapshot of the statistics and logs the human readable report
    fn stats(&self) -> Result<CacheStats> {
        let stats = CacheStats::from_cache(self)?;
        info!("\n{stats}");
        Ok(stats)
    }
}

/// A generic cache implementation, parameterised by a replacement policy
///
/// There is one engine for every organisation: a direct mapped cache is a cache with a single
/// way per set and no policy. We rely on monomorphisation to make the policy calls free, which
/// keeps this close to specialised implementations for each policy
///
/// Lines are stored flat, the ways of a set are next to each other
#[derive(Debug, Clone)]
pub struct Cache<R: ReplacementPolicy> {
    name: String,
    topology: Topology,
    geometry: Geometry,
    ways: usize,
    lines: Vec<Line>,
    // Number of valid lines, the whole cache is full when this reaches lines.len()
    valid_lines: usize,
    replacement_policy: R,
    metrics: Metrics,
}

/// A cache with one way per set
pub type DirectMappedCache = Cache<NoPolicy>;

impl<R: ReplacementPolicy> Cache<R> {
    fn with_policy(
        name: Option<String>,
        topology: Topology,
        geometry: Geometry,
        policy: R,
    ) -> Self {
        let name = name.unwrap_or_else(|| topology.default_name());
        let num_lines = geometry.num_lines() as usize;
        info!(
            "Created new {topology} cache '{name}': {} KiB, {}-way, policy {}, tag memory {:.3} KiB",
            geometry.capacity_kib(),
            geometry.n_way(),
            policy.kind(),
            geometry.tag_storage_kib()
        );
        debug!(
            " - line size {} bytes, {num_lines} lines in {} sets, {} bit tags, tag/data ratio {:.2}%",
            geometry.line_size(),
            geometry.num_sets(),
            geometry.decoder().tag_bits(),
            100.0 * geometry.tag_storage_kib() / geometry.capacity_kib()
        );
        Self {
            name,
            topology,
            ways: geometry.n_way() as usize,
            geometry,
            lines: vec![Line::default(); num_lines],
            valid_lines: 0,
            replacement_policy: policy,
            metrics: Metrics::default(),
        }
    }

    /// The lines of a set, in way order. `None` past the last set
    pub fn set(&self, set: usize) -> Option<&[Line]> {
        let start = set.checked_mul(self.ways)?;
        self.lines.get(start..start.checked_add(self.ways)?)
    }

    pub fn line(&self, set: usize, way: usize) -> Option<&Line> {
        if way >= self.ways {
            return None;
        }
        self.lines.get(set * self.ways + way)
    }

    pub fn policy(&self) -> &R {
        &self.replacement_policy
    }

    pub fn valid_line_count(&self) -> usize {
        self.valid_lines
    }
}

impl Cache<NoPolicy> {
    /// Creates a direct mapped cache
    ///
    /// # Arguments
    ///
    /// * `name`: The instance name, a `direct_mapped_cache_<n>` name is generated when missing
    /// * `geometry`: The geometry, must have an associativity of 1
    ///
    /// returns: Result<Cache<NoPolicy>, CacheError>
    pub fn new(name: Option<String>, geometry: Geometry) -> Result<Self> {
        if geometry.n_way() != 1 {
            return Err(CacheError::InvalidGeometry(format!(
                "a direct mapped cache has a single way, got {}",
                geometry.n_way()
            )));
        }
        Ok(Self::with_policy(name, Topology::DirectMapped, geometry, NoPolicy))
    }
}

impl<R: ReplacementPolicy> CacheTrait for Cache<R> {
    fn access(&mut self, kind: AccessKind, address: u64) -> Result<Outcome> {
        let (set, tag) = self.geometry.decoder().decode(address)?;
        let base = set * self.ways;
        let lines = &self.lines[base..base + self.ways];
        let hit_way = lines.iter().position(|line| line.valid && line.tag == tag);
        let free_way = lines.iter().position(|line| !line.valid);

        let (way, outcome) = match (hit_way, free_way) {
            (Some(way), _) => (way, Outcome::Hit),
            (None, Some(way)) => (way, Outcome::Miss(MissKind::Compulsory)),
            (None, None) => {
                // Fails before anything is touched
                let way = self.replacement_policy.get_victim(set)?;
                debug_assert!(way < self.ways);
                let cause = if self.valid_lines == self.lines.len() {
                    MissKind::Capacity
                } else {
                    MissKind::Conflict
                };
                (way, Outcome::Miss(cause))
            }
        };

        let line = &mut self.lines[base + way];
        if !line.valid {
            self.valid_lines += 1;
        }
        line.tag = tag;
        line.valid = true;
        match kind {
            AccessKind::Write => line.dirty = true,
            // A freshly fetched block is clean, the evicted block's dirty bit is not carried over
            AccessKind::Read if !outcome.is_hit() => line.dirty = false,
            AccessKind::Read => {}
        }
        self.replacement_policy.update_on_access(set, way, outcome);
        self.metrics.record(kind, outcome);

        debug!(
            "[{} - {}] {:?} @ address {:#x} / set {} / way {}",
            kind, self.name, outcome, address, set, way
        );
        Ok(outcome)
    }

    fn clear(&mut self) {
        self.lines.fill(Line::default());
        self.valid_lines = 0;
        self.replacement_policy.clear();
        self.metrics = Metrics::default();
    }

    fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn topology(&self) -> Topology {
        self.topology
    }

    fn replacement_policy(&self) -> ReplacementPolicyKind {
        self.replacement_policy.kind()
    }

    fn get_uninitialised_line_count(&self) -> usize {
        self.lines.len() - self.valid_lines
    }
}

/// A set associative cache, for each of the provided replacement policies
///
/// Using trait objects reduces boilerplate, but every access would go through a vtable. Branching
/// on the concrete types lets the compiler inline the policy into the access path
#[derive(Debug, Clone)]
pub enum SetAssociativeCache {
    Random(Cache<RandomPolicy>),
    Fifo(Cache<FirstInFirstOut>),
    LeastRecentlyUsed(Cache<LeastRecentlyUsed>),
    NotMostRecentlyUsed(Cache<NotMostRecentlyUsed>),
    Unimplemented(Cache<Unimplemented>),
}

macro_rules! dispatch {
    ($cache:expr, $inner:ident => $body:expr) => {
        match $cache {
            SetAssociativeCache::Random($inner) => $body,
            SetAssociativeCache::Fifo($inner) => $body,
            SetAssociativeCache::LeastRecentlyUsed($inner) => $body,
            SetAssociativeCache::NotMostRecentlyUsed($inner) => $body,
            SetAssociativeCache::Unimplemented($inner) => $body,
        }
    };
}

impl SetAssociativeCache {
    /// Creates a set associative cache
    ///
    /// Policies without an algorithm (`Plru`, `None`) are accepted here, the cache fails with
    /// `UnimplementedPolicy` the first time a full set needs a victim
    ///
    /// # Arguments
    ///
    /// * `name`: The instance name, a `set_associative_cache_<n>` name is generated when missing
    /// * `geometry`: The geometry, its associativity is the number of ways per set
    /// * `policy`: The replacement policy
    ///
    /// returns: SetAssociativeCache
    pub fn new(name: Option<String>, geometry: Geometry, policy: ReplacementPolicyKind) -> Self {
        Self::with_seed(name, geometry, policy, RandomPolicy::DEFAULT_SEED)
    }

    /// Same as `new`, with the seed used by the random policy
    pub fn with_seed(
        name: Option<String>,
        geometry: Geometry,
        policy: ReplacementPolicyKind,
        seed: u64,
    ) -> Self {
        let sets = geometry.num_sets() as usize;
        let ways = geometry.n_way() as usize;
        let topology = Topology::SetAssociative;
        match policy {
            ReplacementPolicyKind::Random => SetAssociativeCache::Random(Cache::with_policy(
                name,
                topology,
                geometry,
                RandomPolicy::new(ways, seed),
            )),
            ReplacementPolicyKind::Fifo => SetAssociativeCache::Fifo(Cache::with_policy(
                name,
                topology,
                geometry,
                FirstInFirstOut::new(sets, ways),
            )),
            ReplacementPolicyKind::Lru => SetAssociativeCache::LeastRecentlyUsed(
                Cache::with_policy(name, topology, geometry, LeastRecentlyUsed::new(sets, ways)),
            ),
            ReplacementPolicyKind::Nmru => SetAssociativeCache::NotMostRecentlyUsed(
                Cache::with_policy(name, topology, geometry, NotMostRecentlyUsed::new(sets, ways)),
            ),
            ReplacementPolicyKind::Plru | ReplacementPolicyKind::None => {
                SetAssociativeCache::Unimplemented(Cache::with_policy(
                    name,
                    topology,
                    geometry,
                    Unimplemented(policy),
                ))
            }
        }
    }

    /// The lines of a set, in way order. `None` past the last set
    pub fn set(&self, set: usize) -> Option<&[Line]> {
        dispatch!(self, c => c.set(set))
    }

    pub fn line(&self, set: usize, way: usize) -> Option<&Line> {
        dispatch!(self, c => c.line(set, way))
    }

    /// The LRU ranks of a set, only available with the LRU policy
    pub fn lru_ranks(&self, set: usize) -> Option<&[usize]> {
        match self {
            SetAssociativeCache::LeastRecentlyUsed(c) => c.policy().ranks(set),
            _ => None,
        }
    }
}

impl CacheTrait for SetAssociativeCache {
    fn access(&mut self, kind: AccessKind, address: u64) -> Result<Outcome> {
        dispatch!(self, c => c.access(kind, address))
    }

    fn clear(&mut self) {
        dispatch!(self, c => c.clear())
    }

    fn metrics(&self) -> &Metrics {
        dispatch!(self, c => c.metrics())
    }

    fn geometry(&self) -> &Geometry {
        dispatch!(self, c => c.geometry())
    }

    fn name(&self) -> &str {
        dispatch!(self, c => c.name())
    }

    fn topology(&self) -> Topology {
        Topology::SetAssociative
    }

    fn replacement_policy(&self) -> ReplacementPolicyKind {
        dispatch!(self, c => c.replacement_policy())
    }

    fn get_uninitialised_line_count(&self) -> usize {
        dispatch!(self, c => c.get_uninitialised_line_count())
    }
}

/// Either cache organisation, as built from a configuration
#[derive(Debug, Clone)]
pub enum GenericCache {
    DirectMapped(DirectMappedCache),
    SetAssociative(SetAssociativeCache),
}

impl From<DirectMappedCache> for GenericCache {
    fn from(value: DirectMappedCache) -> Self {
        Self::DirectMapped(value)
    }
}

impl From<SetAssociativeCache> for GenericCache {
    fn from(value: SetAssociativeCache) -> Self {
        Self::SetAssociative(value)
    }
}

impl CacheTrait for GenericCache {
    fn access(&mut self, kind: AccessKind, address: u64) -> Result<Outcome> {
        match self {
            GenericCache::DirectMapped(c) => c.access(kind, address),
            GenericCache::SetAssociative(c) => c.access(kind, address),
        }
    }

    fn clear(&mut self) {
        match self {
            GenericCache::DirectMapped(c) => c.clear(),
            GenericCache::SetAssociative(c) => c.clear(),
        }
    }

    fn metrics(&self) -> &Metrics {
        match self {
            GenericCache::DirectMapped(c) => c.metrics(),
            GenericCache::SetAssociative(c) => c.metrics(),
        }
    }

    fn geometry(&self) -> &Geometry {
        match self {
            GenericCache::DirectMapped(c) => c.geometry(),
            GenericCache::SetAssociative(c) => c.geometry(),
        }
    }

    fn name(&self) -> &str {
        match self {
            GenericCache::DirectMapped(c) => c.name(),
            GenericCache::SetAssociative(c) => c.name(),
        }
    }

    fn topology(&self) -> Topology {
        match self {
            GenericCache::DirectMapped(c) => c.topology(),
            GenericCache::SetAssociative(c) => c.topology(),
        }
    }

    fn replacement_policy(&self) -> ReplacementPolicyKind {
        match self {
            GenericCache::DirectMapped(c) => c.replacement_policy(),
            GenericCache::SetAssociative(c) => c.replacement_policy(),
        }
    }

    fn get_uninitialised_line_count(&self) -> usize {
        match self {
            GenericCache::DirectMapped(c) => c.get_uninitialised_line_count(),
            GenericCache::SetAssociative(c) => c.get_uninitialised_line_count(),
        }
    }
}
