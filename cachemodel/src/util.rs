use crate::replacement_policies::{xorshift, RandomPolicy};
use crate::trace::TraceRecord;

fn seeded(seed: u64) -> u64 {
    if seed == 0 {
        RandomPolicy::DEFAULT_SEED
    } else {
        seed
    }
}

fn record(state: &mut u64, address: u64) -> TraceRecord {
    if xorshift(state) & 1 == 0 {
        TraceRecord::read(address)
    } else {
        TraceRecord::write(address)
    }
}

fn mask(address_width: u32) -> u64 {
    u64::MAX >> (u64::BITS - address_width.clamp(1, u64::BITS))
}

/// Walks memory with a fixed stride, mixing reads and writes. Addresses which no longer fit in
/// `address_width` bits are replaced by random ones that do
pub fn sequential_trace(
    accesses: usize,
    stride: u64,
    address_width: u32,
    seed: u64,
) -> Vec<TraceRecord> {
    let mut state = seeded(seed);
    let mask = mask(address_width);
    (0..accesses as u64)
        .map(|i| {
            let address = match i.checked_mul(stride) {
                Some(address) if address <= mask => address,
                _ => xorshift(&mut state) & mask,
            };
            record(&mut state, address)
        })
        .collect()
}

/// Uniformly random addresses within `address_width` bits
pub fn random_trace(accesses: usize, address_width: u32, seed: u64) -> Vec<TraceRecord> {
    let mut state = seeded(seed);
    let mask = mask(address_width);
    (0..accesses)
        .map(|_| {
            let address = xorshift(&mut state) & mask;
            record(&mut state, address)
        })
        .collect()
}

/// Repeatedly walks a working set of `working_set` bytes with a fixed stride, the usual loop
/// pattern that benefits from caching
pub fn looping_trace(
    accesses: usize,
    working_set: u64,
    stride: u64,
    seed: u64,
) -> Vec<TraceRecord> {
    let mut state = seeded(seed);
    let steps = (working_set / stride.max(1)).max(1);
    (0..accesses as u64)
        .map(|i| record(&mut state, (i % steps) * stride))
        .collect()
}
