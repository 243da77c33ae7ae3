use std::io::BufRead;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::{CacheTrait, GenericCache};
use crate::config::SimulationConfig;
use crate::error::{CacheError, SimulationError};
use crate::stats::CacheStats;
use crate::trace::{TraceReader, TraceRecord};

/// The simulator replays a trace through several independent caches, to compare their
/// configurations. The caches don't form a hierarchy, every cache sees every record
///
/// It supports calling simulate multiple times, and will update the time taken to simulate and the
/// results accordingly
pub struct Simulator {
    caches: Vec<GenericCache>,
    skipped: Vec<u64>,
    records: u64,
    skip_invalid: bool,
    simulation_time: Duration,
}

/// The result of a simulation. Can be serialised to the JSON report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub records: u64,
    pub caches: Vec<CacheReport>,
}

/// The result for an individual cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheReport {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Records the cache rejected, only non-zero when skipping invalid records
    pub skipped: u64,
}

impl Simulator {
    /// Creates a new simulator for a given configuration
    ///
    /// # Arguments
    ///
    /// * `config`: A simulation configuration, usually resulting from parsing JSON
    ///
    /// returns: Result<Simulator, CacheError>
    pub fn new(config: &SimulationConfig) -> Result<Self, CacheError> {
        let caches = config
            .caches
            .iter()
            .map(|cache| cache.build())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_caches(caches, config.skip_invalid))
    }

    pub fn from_caches(caches: Vec<GenericCache>, skip_invalid: bool) -> Self {
        Self {
            skipped: vec![0; caches.len()],
            caches,
            records: 0,
            skip_invalid,
            simulation_time: Duration::new(0, 0),
        }
    }

    /// Simulates a trace in the `<read|write>,<hex address>` format, record by record
    ///
    /// The trace is streamed, so reads from the input are *guaranteed to be sequential*. When
    /// using something like mmap, the operating system can be advised of this
    ///
    /// # Arguments
    ///
    /// * `trace`: The trace input
    ///
    /// returns: Result<SimulationReport, SimulationError>
    pub fn simulate<R: BufRead>(&mut self, trace: R) -> Result<SimulationReport, SimulationError> {
        let start = Instant::now();
        for record in TraceReader::new(trace) {
            let record = record?;
            let index = self.records as usize;
            for (cache, skipped) in self.caches.iter_mut().zip(&mut self.skipped) {
                replay(cache, skipped, self.skip_invalid, index, record)?;
            }
            self.records += 1;
        }
        self.simulation_time += start.elapsed();
        Ok(self.report())
    }

    /// Simulates already decoded records, one cache after the other
    pub fn simulate_records(
        &mut self,
        records: &[TraceRecord],
    ) -> Result<SimulationReport, SimulationError> {
        let start = Instant::now();
        let first = self.records as usize;
        for (cache, skipped) in self.caches.iter_mut().zip(&mut self.skipped) {
            replay_all(cache, skipped, self.skip_invalid, first, records)?;
        }
        self.records += records.len() as u64;
        self.simulation_time += start.elapsed();
        Ok(self.report())
    }

    /// Simulates already decoded records with one thread per cache
    ///
    /// Every thread owns its cache for the duration of the run, nothing is shared but the
    /// records. The result is the same as `simulate_records`
    pub fn simulate_parallel(
        &mut self,
        records: &[TraceRecord],
    ) -> Result<SimulationReport, SimulationError> {
        let start = Instant::now();
        let first = self.records as usize;
        let skip_invalid = self.skip_invalid;
        thread::scope(|scope| {
            let handles: Vec<_> = self
                .caches
                .iter_mut()
                .zip(&mut self.skipped)
                .map(|(cache, skipped)| {
                    scope.spawn(move || replay_all(cache, skipped, skip_invalid, first, records))
                })
                .collect();
            handles.into_iter().try_for_each(|handle| match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
        })?;
        self.records += records.len() as u64;
        self.simulation_time += start.elapsed();
        Ok(self.report())
    }

    /// The statistics of every cache so far. Caches that have not counted an access yet, because
    /// the trace was empty or every record was skipped, report zero ratios
    pub fn report(&self) -> SimulationReport {
        let caches = self
            .caches
            .iter()
            .zip(&self.skipped)
            .map(|(cache, skipped)| {
                let stats = CacheStats::snapshot(cache);
                info!("\n{stats}");
                CacheReport {
                    stats,
                    skipped: *skipped,
                }
            })
            .collect();
        SimulationReport {
            records: self.records,
            caches,
        }
    }

    /// Resets every cache, keeping the configuration
    pub fn clear(&mut self) {
        self.caches.iter_mut().for_each(CacheTrait::clear);
        self.skipped.fill(0);
        self.records = 0;
        self.simulation_time = Duration::new(0, 0);
    }

    pub fn caches(&self) -> &[GenericCache] {
        &self.caches
    }

    /// Gets the wall-clock execution time for processing
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    /// Gets the number of uninitialised lines for each cache
    pub fn get_uninitialised_line_counts(&self) -> Vec<u64> {
        self.caches
            .iter()
            .map(|x| x.get_uninitialised_line_count() as u64)
            .collect()
    }
}

fn replay_all(
    cache: &mut GenericCache,
    skipped: &mut u64,
    skip_invalid: bool,
    first: usize,
    records: &[TraceRecord],
) -> Result<(), SimulationError> {
    records
        .iter()
        .enumerate()
        .try_for_each(|(i, record)| replay(cache, skipped, skip_invalid, first + i, *record))
}

fn replay(
    cache: &mut GenericCache,
    skipped: &mut u64,
    skip_invalid: bool,
    index: usize,
    record: TraceRecord,
) -> Result<(), SimulationError> {
    match cache.access(record.kind, record.address) {
        Ok(_) => Ok(()),
        Err(e) if skip_invalid => {
            warn!("Skipping record {index} ({record}) for cache '{}': {e}", cache.name());
            *skipped += 1;
            Ok(())
        }
        Err(source) => Err(SimulationError::Access {
            cache: cache.name().to_string(),
            record: index,
            source,
        }),
    }
}
