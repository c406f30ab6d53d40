use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use esovm::batch::{Batch, BatchConfig};
use esovm::dialect::{Dialect, RunOptions};
use esovm::duplex::Duplex;
use esovm::tape::STACK_SIZE;

#[derive(Parser)]
#[command(name = "esovm", about = "Run tape and register machine programs")]
struct Cli {
    /// Program file to run, with stdin/stdout as its byte stream.
    #[arg(required_unless_present = "benchmark", conflicts_with = "benchmark")]
    program: Option<PathBuf>,

    /// Which machine to run the program on.
    #[arg(long, value_enum, default_value_t = Dialect::Tape)]
    dialect: Dialect,

    /// Tape length in cells (tape dialect only).
    #[arg(long, default_value_t = STACK_SIZE)]
    tape_len: usize,

    /// Stop after this many steps. Runs to completion when omitted.
    #[arg(long)]
    step_limit: Option<usize>,

    /// Run a batch of random programs and print throughput stats.
    #[arg(long)]
    benchmark: bool,

    /// Random seed for benchmark programs.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Number of benchmark programs.
    #[arg(long, default_value_t = 1 << 12)]
    programs: usize,

    /// Bytes per benchmark program (tape dialect only).
    #[arg(long, default_value_t = 64)]
    program_size: usize,
}

fn main() {
    let cli = Cli::parse();

    if cli.benchmark {
        run_benchmark(&cli);
    } else if let Some(ref path) = cli.program {
        run_program(&cli, path);
    }
}

fn run_program(cli: &Cli, path: &Path) {
    let program = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Cannot read {}: {e}", path.display());
            std::process::exit(1);
        }
    };
    let options = RunOptions {
        tape_len: cli.tape_len,
        step_limit: cli.step_limit,
    };

    let mut io = Duplex::new(io::stdin().lock(), io::stdout().lock());
    let result = cli.dialect.run(&program, &mut io, &options);

    match result {
        Ok(outcome) if !outcome.halted => {
            eprintln!("stopped after {} steps (step limit)", outcome.steps);
        }
        Ok(_) => {}
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

fn run_benchmark(cli: &Cli) {
    let config = BatchConfig {
        programs: cli.programs,
        program_size: cli.program_size,
        step_limit: cli.step_limit.unwrap_or(BatchConfig::default().step_limit),
        tape_len: cli.tape_len,
    };
    let batch = Batch::new(cli.dialect, config, cli.seed);

    let start = std::time::Instant::now();
    let report = batch.run();
    let elapsed = start.elapsed();

    let programs_per_sec = report.total() as f64 / elapsed.as_secs_f64();
    let steps_per_sec = report.steps as f64 / elapsed.as_secs_f64();

    eprintln!("Benchmark results ({:?}):", cli.dialect);
    eprintln!("  Programs:          {}", report.total());
    eprintln!("  Halted:            {}", report.halted);
    eprintln!("  Step-limited:      {}", report.truncated);
    eprintln!("  Failed:            {}", report.failed);
    eprintln!("  Total steps:       {}", report.steps);
    eprintln!("  Output bytes:      {}", report.output_bytes);
    eprintln!("  Elapsed:           {elapsed:.2?}");
    eprintln!("  Programs/sec:      {programs_per_sec:.1}");
    eprintln!("  Steps/sec:         {steps_per_sec:.0}");
}
