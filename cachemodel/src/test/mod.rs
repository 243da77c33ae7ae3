use crate::geometry::Geometry;

mod address;
mod metrics;
mod policies;

/// 64 byte lines, 4 KiB, 32 bit addresses, latencies 1 and 10
pub(crate) fn geometry(n_way: u64) -> Geometry {
    Geometry::new(32, 64, 4096, n_way, 1, 10).unwrap()
}
