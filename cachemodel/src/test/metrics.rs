use crate::error::CacheError;
use crate::metrics::{AccessKind, Metrics, Misses, MissKind, Outcome, Totals};

#[test]
fn record_counts_one_access_per_call() {
    let mut metrics = Metrics::default();
    metrics.record(AccessKind::Read, Outcome::Miss(MissKind::Compulsory));
    metrics.record(AccessKind::Write, Outcome::Hit);
    metrics.record(AccessKind::Write, Outcome::Miss(MissKind::Conflict));
    metrics.record(AccessKind::Read, Outcome::Miss(MissKind::Capacity));

    assert_eq!(metrics.hits, 1);
    assert_eq!(
        metrics.misses,
        Misses {
            conflict: 1,
            capacity: 1,
            compulsory: 1
        }
    );
    assert_eq!(metrics.total, Totals { read: 2, write: 2 });
    assert_eq!(metrics.hits + metrics.misses.sum(), metrics.total.sum());
}

#[test]
fn ratios_are_rounded_to_three_decimals() {
    let mut metrics = Metrics::default();
    metrics.record(AccessKind::Read, Outcome::Hit);
    metrics.record(AccessKind::Read, Outcome::Miss(MissKind::Compulsory));
    metrics.record(AccessKind::Read, Outcome::Miss(MissKind::Conflict));
    assert_eq!(metrics.hit_ratio(), Ok(0.333));
    assert_eq!(metrics.miss_ratio(), Ok(0.667));
}

#[test]
fn ratios_sum_to_one_at_rounding_boundaries() {
    let metrics = Metrics {
        hits: 1,
        misses: Misses {
            compulsory: 1999,
            ..Misses::default()
        },
        total: Totals {
            read: 2000,
            write: 0,
        },
    };
    let hit_ratio = metrics.hit_ratio().unwrap();
    let miss_ratio = metrics.miss_ratio().unwrap();
    assert_eq!(hit_ratio, 0.001);
    assert_eq!(miss_ratio, 0.999);
    assert_eq!(hit_ratio + miss_ratio, 1.0);
}

#[test]
fn ratios_are_undefined_without_accesses() {
    let metrics = Metrics::default();
    assert_eq!(metrics.hit_ratio(), Err(CacheError::DivisionUndefined));
    assert_eq!(metrics.miss_ratio(), Err(CacheError::DivisionUndefined));
}

#[test]
fn counters_display_their_breakdown() {
    let misses = Misses {
        conflict: 1,
        capacity: 2,
        compulsory: 3,
    };
    assert_eq!(misses.to_string(), "6 (conflict=1, capacity=2, compulsory=3)");
    let total = Totals { read: 3, write: 1 };
    assert_eq!(total.to_string(), "4 (read=3 / 75.00%, write=1 / 25.00%)");
    assert_eq!(Totals::default().to_string(), "0 (read=0, write=0)");
}
