use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use cachemodel::cache::CacheTrait;
use cachemodel::config::SimulationConfig;
use cachemodel::io::get_reader;
use cachemodel::simulator::Simulator;
use cachemodel::trace::{convert_lackey, TraceReader};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Parser, Debug)]
#[command(about = String::from("Cache performance model: hit ratio, miss breakdown and AMAT for a memory trace"))]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replays a `<read|write>,<hex address>` trace through the configured caches
    Simulate {
        config: PathBuf,
        trace: PathBuf,

        /// Run each cache on its own thread. The trace is decoded up front
        #[arg(long)]
        parallel: bool,

        #[arg(short, long)]
        performance: bool,

        /// Log every access
        #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
        debug: bool,
    },
    /// Splits a Valgrind lackey log into instruction and data traces
    Convert {
        #[arg(default_value = "results.txt")]
        log: PathBuf,

        #[arg(short, long, default_value = "instruction_trace.txt")]
        instruction: PathBuf,

        #[arg(short, long, default_value = "memory_trace.txt")]
        memory: PathBuf,
    },
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let start = Instant::now();
    match Args::parse().command {
        Command::Simulate {
            config,
            trace,
            parallel,
            performance,
            debug,
        } => {
            init_logging(debug);
            simulate(&config, &trace, parallel)?;
            if performance {
                info!(
                    "Total execution time (includes parsing, configuration, and output): {}s",
                    start.elapsed().as_secs_f64()
                );
            }
        }
        Command::Convert {
            log,
            instruction,
            memory,
        } => {
            init_logging(false);
            convert(&log, &instruction, &memory)?;
        }
    }
    Ok(())
}

fn simulate(config_path: &Path, trace_path: &Path, parallel: bool) -> Result<()> {
    let config_file = File::open(config_path).with_context(|| {
        format!(
            "Couldn't open the config file at path {}",
            config_path.display()
        )
    })?;
    let config = SimulationConfig::from_reader(BufReader::new(config_file))
        .context("Couldn't parse the config file")?;
    info!("Parsed input configuration: {config:?}");
    let mut simulator = Simulator::new(&config).context("Invalid cache configuration")?;

    let trace_file = File::open(trace_path).with_context(|| {
        format!(
            "Couldn't open the trace file at path {}",
            trace_path.display()
        )
    })?;
    let trace_reader = get_reader(trace_file).context("Couldn't read the trace file")?;
    let report = if parallel {
        let records = TraceReader::new(trace_reader)
            .collect::<Result<Vec<_>, _>>()
            .context("Couldn't decode the trace file")?;
        simulator.simulate_parallel(&records)?
    } else {
        simulator.simulate(trace_reader)?
    };
    let output = serde_json::to_string_pretty(&report).context("Couldn't serialise the output")?;
    println!("{output}");

    info!("Simulation time: {}s", simulator.get_execution_time().as_secs_f64());
    let formatted = simulator
        .caches()
        .iter()
        .zip(simulator.get_uninitialised_line_counts())
        .map(|(cache, count)| format!("{}: {count}", cache.name()))
        .collect::<Vec<_>>()
        .join(", ");
    info!("Uninitialised cache lines by cache: ({formatted})");
    Ok(())
}

fn convert(log: &Path, instruction: &Path, memory: &Path) -> Result<()> {
    let log_file = File::open(log)
        .with_context(|| format!("Couldn't open the lackey log at path {}", log.display()))?;
    let instructions = File::create(instruction).with_context(|| {
        format!(
            "Couldn't create the instruction trace at path {}",
            instruction.display()
        )
    })?;
    let data = File::create(memory).with_context(|| {
        format!(
            "Couldn't create the memory trace at path {}",
            memory.display()
        )
    })?;
    let counts = convert_lackey(
        BufReader::new(log_file),
        BufWriter::new(instructions),
        BufWriter::new(data),
    )
    .context("Couldn't convert the lackey log")?;
    info!(
        "Wrote {} instruction fetches, {} loads and {} stores, skipped {} lines",
        counts.instructions, counts.loads, counts.stores, counts.skipped
    );
    Ok(())
}
