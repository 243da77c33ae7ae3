use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use cachemodel::config::{CacheConfig, CacheKindConfig, SimulationConfig};
use cachemodel::replacement_policies::ReplacementPolicyKind;
use cachemodel::simulator::Simulator;
use cachemodel::util::{looping_trace, random_trace};

fn configs() -> Vec<(String, SimulationConfig)> {
    let mut configs = vec![(
        "direct".to_string(),
        SimulationConfig {
            caches: vec![CacheConfig::default()],
            skip_invalid: false,
        },
    )];
    for n_way in [2, 8] {
        for policy in [
            ReplacementPolicyKind::Random,
            ReplacementPolicyKind::Fifo,
            ReplacementPolicyKind::Lru,
            ReplacementPolicyKind::Nmru,
        ] {
            let cache = CacheConfig {
                kind: CacheKindConfig::SetAssociative,
                n_way,
                replacement_policy: policy,
                ..CacheConfig::default()
            };
            configs.push((
                format!("{n_way}way_{policy}"),
                SimulationConfig {
                    caches: vec![cache],
                    skip_invalid: false,
                },
            ));
        }
    }
    configs
}

/// Replays the same synthetic trace through every organisation
pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Organisations");
    let mut trace = looping_trace(200_000, 6 * 1024, 64, 1);
    trace.extend(random_trace(100_000, 20, 2));

    for (name, config) in configs() {
        group.bench_with_input(BenchmarkId::new("Trace", name), &config, |bench, config| {
            bench.iter(|| {
                Simulator::new(config).unwrap().simulate_records(&trace).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default().significance_level(0.1).sample_size(10);
    targets = criterion_benchmark
);
criterion_main!(benches);
