use std::io::Read;

use serde::Deserialize;

use crate::cache::{DirectMappedCache, GenericCache, SetAssociativeCache};
use crate::error::{Result, SimulationError};
use crate::geometry::{
    Geometry, DEFAULT_ADDRESS_WIDTH, DEFAULT_CAPACITY_KIB, DEFAULT_HIT_LATENCY, DEFAULT_LINE_SIZE,
    DEFAULT_MISS_LATENCY,
};
use crate::replacement_policies::{RandomPolicy, ReplacementPolicyKind};

/// A set of independent caches to run the same trace through
#[derive(Debug, Deserialize)]
pub struct SimulationConfig {
    pub caches: Vec<CacheConfig>,
    /// Skip records a cache rejects instead of aborting the simulation
    #[serde(default)]
    pub skip_invalid: bool,
}

impl SimulationConfig {
    pub fn from_reader<R: Read>(reader: R) -> std::result::Result<Self, SimulationError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

/// A configuration for a single cache
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_line_size")]
    pub line_size: u64,
    #[serde(default = "default_capacity_kib")]
    pub capacity_kib: u64,
    #[serde(default = "default_hit_latency")]
    pub hit_latency: u64,
    #[serde(default = "default_miss_latency")]
    pub miss_latency: u64,
    #[serde(default = "default_address_width")]
    pub address_width: u32,
    #[serde(default = "CacheKindConfig::default")]
    pub kind: CacheKindConfig,
    /// Ignored by direct mapped caches
    #[serde(default = "default_n_way")]
    pub n_way: u64,
    /// Ignored by direct mapped caches. Defaults to random.
    #[serde(default)]
    pub replacement_policy: ReplacementPolicyKind,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// The kind of cache - direct mapped or set associative
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub enum CacheKindConfig {
    #[serde(alias = "direct", alias = "direct_mapped")]
    DirectMapped,
    #[serde(alias = "set_associative", alias = "nway")]
    SetAssociative,
}

impl Default for CacheKindConfig {
    fn default() -> Self {
        CacheKindConfig::DirectMapped
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            name: None,
            line_size: DEFAULT_LINE_SIZE,
            capacity_kib: DEFAULT_CAPACITY_KIB,
            hit_latency: DEFAULT_HIT_LATENCY,
            miss_latency: DEFAULT_MISS_LATENCY,
            address_width: DEFAULT_ADDRESS_WIDTH,
            kind: CacheKindConfig::default(),
            n_way: default_n_way(),
            replacement_policy: ReplacementPolicyKind::default(),
            seed: default_seed(),
        }
    }
}

impl CacheConfig {
    /// Validates the geometry described by this configuration
    pub fn geometry(&self) -> Result<Geometry> {
        let n_way = match self.kind {
            CacheKindConfig::DirectMapped => 1,
            CacheKindConfig::SetAssociative => self.n_way,
        };
        Geometry::new(
            self.address_width,
            self.line_size,
            self.capacity_kib.saturating_mul(1024),
            n_way,
            self.hit_latency,
            self.miss_latency,
        )
    }

    /// Creates a new cache from this configuration
    pub fn build(&self) -> Result<GenericCache> {
        let geometry = self.geometry()?;
        Ok(match self.kind {
            CacheKindConfig::DirectMapped => {
                GenericCache::from(DirectMappedCache::new(self.name.clone(), geometry)?)
            }
            CacheKindConfig::SetAssociative => GenericCache::from(SetAssociativeCache::with_seed(
                self.name.clone(),
                geometry,
                self.replacement_policy,
                self.seed,
            )),
        })
    }
}

fn default_line_size() -> u64 {
    DEFAULT_LINE_SIZE
}

fn default_capacity_kib() -> u64 {
    DEFAULT_CAPACITY_KIB
}

fn default_hit_latency() -> u64 {
    DEFAULT_HIT_LATENCY
}

fn default_miss_latency() -> u64 {
    DEFAULT_MISS_LATENCY
}

fn default_address_width() -> u32 {
    DEFAULT_ADDRESS_WIDTH
}

fn default_n_way() -> u64 {
    2
}

fn default_seed() -> u64 {
    RandomPolicy::DEFAULT_SEED
}
