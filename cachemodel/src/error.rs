use thiserror::Error;

use crate::replacement_policies::ReplacementPolicyKind;

/// Convenience alias for results of cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors raised by the simulation engine. Every one of them is raised before the cache state is
/// touched, so a failed access leaves the cache exactly as it was
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("address {address:#x} is greater than max ({width} bits)")]
    AddressOutOfRange { address: u64, width: u32 },

    #[error("replacement policy {0} has no victim selection algorithm")]
    UnimplementedPolicy(ReplacementPolicyKind),

    #[error("invalid cache geometry: {0}")]
    InvalidGeometry(String),

    #[error("no accesses recorded, ratios are undefined")]
    DivisionUndefined,
}

/// Errors produced while reading or converting trace files
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("malformed trace record on line {line}: '{record}'")]
    Malformed { line: usize, record: String },

    #[error("trace I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced by the simulator when replaying a trace
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("cache '{cache}' rejected record {record}: {source}")]
    Access {
        cache: String,
        record: usize,
        #[source]
        source: CacheError,
    },

    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}
