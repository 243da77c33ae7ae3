use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};
use crate::metrics::Outcome;

/// The replacement policies a cache can be configured with
///
/// `Plru` is accepted by the configuration but has no algorithm behind it, caches using it fail
/// the first time they need a victim
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplacementPolicyKind {
    #[serde(alias = "NONE")]
    None,
    #[serde(alias = "RANDOM")]
    Random,
    #[serde(alias = "FIFO")]
    Fifo,
    #[serde(alias = "LRU")]
    Lru,
    #[serde(alias = "NMRU")]
    Nmru,
    #[serde(alias = "PLRU")]
    Plru,
}

impl Default for ReplacementPolicyKind {
    fn default() -> Self {
        ReplacementPolicyKind::Random
    }
}

impl fmt::Display for ReplacementPolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReplacementPolicyKind::None => "NONE",
            ReplacementPolicyKind::Random => "RANDOM",
            ReplacementPolicyKind::Fifo => "FIFO",
            ReplacementPolicyKind::Lru => "LRU",
            ReplacementPolicyKind::Nmru => "NMRU",
            ReplacementPolicyKind::Plru => "PLRU",
        };
        write!(f, "{name}")
    }
}

/// A generic trait for implementing replacement policies. Used to parameterise a Cache.
///
/// All state is kept per set, sets never influence each other
pub trait ReplacementPolicy {
    /// Updates the policy after a way has been accessed
    ///
    /// Called on hits, and on misses once the way holds the new tag. Not applicable for some
    /// policies, a default which does nothing is provided
    ///
    /// # Arguments
    ///
    /// * `set`: The set of the access
    /// * `way`: The way within the set which was accessed
    /// * `outcome`: Whether the access hit or missed
    ///
    /// returns: ()
    fn update_on_access(&mut self, _set: usize, _way: usize, _outcome: Outcome) {}

    /// Chooses the way to evict from a full set
    ///
    /// Implementations must not change any state that `update_on_access` is responsible for, the
    /// cache will report the access on the chosen way afterwards
    ///
    /// # Arguments
    ///
    /// * `set`: The set which needs a line
    ///
    /// returns: Result<usize, CacheError>
    fn get_victim(&mut self, set: usize) -> Result<usize>;

    /// Resets the policy to its initial state
    fn clear(&mut self) {}

    fn kind(&self) -> ReplacementPolicyKind;
}

#[derive(Debug, Default, Clone)]
/// NoPolicy is used for direct mapped caches. There is a single way per set, so it is always the
/// victim
///
/// As the generic cache implementation is monomorphised, the compiler can completely optimise this
/// away, removing the need for a separate implementation
pub struct NoPolicy;

impl ReplacementPolicy for NoPolicy {
    fn get_victim(&mut self, _set: usize) -> Result<usize> {
        Ok(0)
    }

    fn kind(&self) -> ReplacementPolicyKind {
        ReplacementPolicyKind::None
    }
}

/// Evicts a uniformly chosen way. Keeps no tracking state, only the generator
///
/// An xorshift generator is enough here and keeps runs reproducible for a given seed
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    ways: usize,
    seed: u64,
    state: u64,
}

impl RandomPolicy {
    pub const DEFAULT_SEED: u64 = 0x2545_F491_4F6C_DD1D;

    pub fn new(ways: usize, seed: u64) -> Self {
        // Zero is a fixed point of xorshift
        let seed = if seed == 0 { Self::DEFAULT_SEED } else { seed };
        Self {
            ways,
            seed,
            state: seed,
        }
    }
}

/// Advances an xorshift64 generator, the state must not be zero
pub(crate) fn xorshift(state: &mut u64) -> u64 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    *state = x;
    x
}

impl ReplacementPolicy for RandomPolicy {
    fn get_victim(&mut self, _set: usize) -> Result<usize> {
        Ok((xorshift(&mut self.state) % self.ways as u64) as usize)
    }

    fn clear(&mut self) {
        self.state = self.seed;
    }

    fn kind(&self) -> ReplacementPolicyKind {
        ReplacementPolicyKind::Random
    }
}

/// First in, first out. Keeps one pointer per set to the oldest way
///
/// Only misses move the pointer, as only misses bring a new block into the set
#[derive(Debug, Clone)]
pub struct FirstInFirstOut {
    ways: usize,
    oldest: Vec<usize>,
}

impl FirstInFirstOut {
    pub fn new(num_sets: usize, ways: usize) -> Self {
        Self {
            ways,
            oldest: vec![0; num_sets],
        }
    }

    /// The way the next eviction in `set` will pick
    pub fn oldest(&self, set: usize) -> Option<usize> {
        self.oldest.get(set).copied()
    }
}

impl ReplacementPolicy for FirstInFirstOut {
    fn update_on_access(&mut self, set: usize, _way: usize, outcome: Outcome) {
        if !outcome.is_hit() {
            let oldest = &mut self.oldest[set];
            *oldest = (*oldest + 1) % self.ways;
        }
    }

    fn get_victim(&mut self, set: usize) -> Result<usize> {
        Ok(self.oldest[set])
    }

    fn clear(&mut self) {
        self.oldest.fill(0);
    }

    fn kind(&self) -> ReplacementPolicyKind {
        ReplacementPolicyKind::Fifo
    }
}

/// Least Recently Used replacement policy
///
/// Every set holds a rank per way, and the ranks of a set are always a permutation of
/// `0..ways`. The highest rank is the most recently used way, the lowest is the victim
#[derive(Debug, Clone)]
pub struct LeastRecentlyUsed {
    ways: usize,
    ranks: Vec<usize>,
}

impl LeastRecentlyUsed {
    pub fn new(num_sets: usize, ways: usize) -> Self {
        let mut policy = Self {
            ways,
            ranks: vec![0; num_sets * ways],
        };
        policy.clear();
        policy
    }

    /// The recency ranks of the ways of `set`, `None` past the last set
    pub fn ranks(&self, set: usize) -> Option<&[usize]> {
        let start = set.checked_mul(self.ways)?;
        self.ranks.get(start..start.checked_add(self.ways)?)
    }

    fn ranks_mut(&mut self, set: usize) -> &mut [usize] {
        &mut self.ranks[set * self.ways..(set + 1) * self.ways]
    }
}

impl ReplacementPolicy for LeastRecentlyUsed {
    fn update_on_access(&mut self, set: usize, way: usize, _outcome: Outcome) {
        let ways = self.ways;
        let most_recent = ways - 1;
        let ranks = self.ranks_mut(set);
        let accessed = ranks[way];
        if accessed == most_recent {
            return;
        }
        for rank in ranks.iter_mut().filter(|rank| **rank > accessed) {
            *rank -= 1;
        }
        ranks[way] = most_recent;
        debug_assert!({
            let mut sorted = ranks.to_vec();
            sorted.sort_unstable();
            sorted.into_iter().eq(0..ways)
        });
    }

    fn get_victim(&mut self, set: usize) -> Result<usize> {
        // Ranks are a permutation, so the minimum is unique
        Ok(self.ranks[set * self.ways..(set + 1) * self.ways]
            .iter()
            .position(|rank| *rank == 0)
            .unwrap_or(0))
    }

    fn clear(&mut self) {
        let ways = self.ways;
        for (i, rank) in self.ranks.iter_mut().enumerate() {
            *rank = i % ways;
        }
    }

    fn kind(&self) -> ReplacementPolicyKind {
        ReplacementPolicyKind::Lru
    }
}

/// Not Most Recently Used replacement policy
///
/// A cheap approximation of LRU: one pointer per set, moved to the way after the last accessed
/// one. The most recently used way is never the next victim
#[derive(Debug, Clone)]
pub struct NotMostRecentlyUsed {
    ways: usize,
    next: Vec<usize>,
}

impl NotMostRecentlyUsed {
    pub fn new(num_sets: usize, ways: usize) -> Self {
        Self {
            ways,
            next: vec![0; num_sets],
        }
    }

    /// The way the next eviction in `set` will pick
    pub fn next_victim(&self, set: usize) -> Option<usize> {
        self.next.get(set).copied()
    }
}

impl ReplacementPolicy for NotMostRecentlyUsed {
    fn update_on_access(&mut self, set: usize, way: usize, _outcome: Outcome) {
        self.next[set] = (way + 1) % self.ways;
    }

    fn get_victim(&mut self, set: usize) -> Result<usize> {
        Ok(self.next[set])
    }

    fn clear(&mut self) {
        self.next.fill(0);
    }

    fn kind(&self) -> ReplacementPolicyKind {
        ReplacementPolicyKind::Nmru
    }
}

/// Stands in for policies which can be selected but have no algorithm. Sets fill up as usual,
/// the first eviction fails
#[derive(Debug, Clone)]
pub struct Unimplemented(pub ReplacementPolicyKind);

impl ReplacementPolicy for Unimplemented {
    fn get_victim(&mut self, _set: usize) -> Result<usize> {
        Err(CacheError::UnimplementedPolicy(self.0))
    }

    fn kind(&self) -> ReplacementPolicyKind {
        self.0
    }
}
