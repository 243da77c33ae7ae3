use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// The kind of a single access
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessKind {
    Read,
    Write,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Read => write!(f, "read"),
            AccessKind::Write => write!(f, "write"),
        }
    }
}

/// Why a miss happened
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissKind {
    /// The set was full while other sets still had free lines
    Conflict,
    /// Every line of the whole cache was valid
    Capacity,
    /// The block landed in a line that was never filled
    Compulsory,
}

/// The classification of a single access
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Outcome {
    Hit,
    Miss(MissKind),
}

impl Outcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, Outcome::Hit)
    }
}

/// Miss counters, split by cause
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Misses {
    pub conflict: u64,
    pub capacity: u64,
    pub compulsory: u64,
}

impl Misses {
    pub fn sum(&self) -> u64 {
        self.conflict + self.capacity + self.compulsory
    }
}

impl fmt::Display for Misses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (conflict={}, capacity={}, compulsory={})",
            self.sum(),
            self.conflict,
            self.capacity,
            self.compulsory
        )
    }
}

/// Access counters, split by kind
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub read: u64,
    pub write: u64,
}

impl Totals {
    pub fn sum(&self) -> u64 {
        self.read + self.write
    }
}

impl fmt::Display for Totals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sum = self.sum();
        if sum == 0 {
            return write!(f, "0 (read=0, write=0)");
        }
        write!(
            f,
            "{sum} (read={} / {:.2}%, write={} / {:.2}%)",
            self.read,
            100.0 * self.read as f64 / sum as f64,
            self.write,
            100.0 * self.write as f64 / sum as f64
        )
    }
}

/// Counters of one cache
///
/// `hits + misses.sum() == total.sum()` always holds, as `record` is the only way to count an
/// access and it bumps exactly one side of the equation
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub hits: u64,
    pub misses: Misses,
    pub total: Totals,
}

impl Metrics {
    /// Counts one access
    ///
    /// # Arguments
    ///
    /// * `kind`: Whether the access was a read or a write
    /// * `outcome`: The classification of the access
    ///
    /// returns: ()
    pub fn record(&mut self, kind: AccessKind, outcome: Outcome) {
        match kind {
            AccessKind::Read => self.total.read += 1,
            AccessKind::Write => self.total.write += 1,
        }
        match outcome {
            Outcome::Hit => self.hits += 1,
            Outcome::Miss(MissKind::Conflict) => self.misses.conflict += 1,
            Outcome::Miss(MissKind::Capacity) => self.misses.capacity += 1,
            Outcome::Miss(MissKind::Compulsory) => self.misses.compulsory += 1,
        }
    }

    /// Hits over total accesses, rounded to 3 decimals
    pub fn hit_ratio(&self) -> Result<f64> {
        Ok(self.hit_thousandths()? as f64 / 1000.0)
    }

    /// Misses over total accesses, rounded to 3 decimals. Always `1 - hit_ratio`
    pub fn miss_ratio(&self) -> Result<f64> {
        Ok((1000 - self.hit_thousandths()?) as f64 / 1000.0)
    }

    // Both ratios come from the same rounded count so they sum to exactly 1
    fn hit_thousandths(&self) -> Result<u64> {
        match self.total.sum() {
            0 => Err(CacheError::DivisionUndefined),
            total => Ok((self.hits as f64 * 1000.0 / total as f64).round() as u64),
        }
    }
}

pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
