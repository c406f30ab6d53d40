use std::io;
use std::ops::Add;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::prelude::*;

use crate::dialect::{Dialect, RunOptions};
use crate::duplex::Duplex;
use crate::register::MEMORY_SIZE;
use crate::tape::STACK_SIZE;

/// Configuration for a batch of random programs.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Number of programs in the batch.
    pub programs: usize,
    /// Bytes per tape program. Register images are always `MEMORY_SIZE`.
    pub program_size: usize,
    /// Max steps per program execution.
    pub step_limit: usize,
    /// Tape length for tape programs.
    pub tape_len: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            programs: 1 << 12, // 4096
            program_size: 64,
            step_limit: 1 << 13, // 8192
            tape_len: STACK_SIZE,
        }
    }
}

/// Totals over one batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    /// Programs that ran to completion.
    pub halted: usize,
    /// Programs stopped by the step limit.
    pub truncated: usize,
    /// Programs that ended with an error.
    pub failed: usize,
    /// Steps executed by halted and truncated programs.
    pub steps: u64,
    /// Bytes written by all programs.
    pub output_bytes: u64,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.halted + self.truncated + self.failed
    }
}

impl Add for BatchReport {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            halted: self.halted + other.halted,
            truncated: self.truncated + other.truncated,
            failed: self.failed + other.failed,
            steps: self.steps + other.steps,
            output_bytes: self.output_bytes + other.output_bytes,
        }
    }
}

/// A set of randomly generated programs for one dialect.
pub struct Batch {
    pub dialect: Dialect,
    pub programs: Vec<Vec<u8>>,
    pub config: BatchConfig,
}

impl Batch {
    /// Create a batch of uniformly random programs from `seed`.
    pub fn new(dialect: Dialect, config: BatchConfig, seed: u64) -> Self {
        let size = match dialect {
            Dialect::Tape => config.program_size,
            Dialect::Register => MEMORY_SIZE,
        };
        let mut rng = SmallRng::seed_from_u64(seed);
        let programs = (0..config.programs)
            .map(|_| {
                let mut prog = vec![0u8; size];
                rng.fill(&mut prog[..]);
                prog
            })
            .collect();
        Self {
            dialect,
            programs,
            config,
        }
    }

    /// Run every program on its own machine in parallel.
    ///
    /// Each program reads from an empty input and writes to a private
    /// buffer; nothing is shared between runs.
    pub fn run(&self) -> BatchReport {
        let options = RunOptions {
            tape_len: self.config.tape_len,
            step_limit: Some(self.config.step_limit),
        };

        self.programs
            .par_iter()
            .map(|program| {
                let mut io = Duplex::new(io::empty(), Vec::new());
                let result = self.dialect.run(program, &mut io, &options);
                let output_bytes = io.writer().len() as u64;
                match result {
                    Ok(outcome) => BatchReport {
                        halted: outcome.halted as usize,
                        truncated: !outcome.halted as usize,
                        steps: outcome.steps as u64,
                        output_bytes,
                        ..BatchReport::default()
                    },
                    Err(_) => BatchReport {
                        failed: 1,
                        output_bytes,
                        ..BatchReport::default()
                    },
                }
            })
            .reduce(BatchReport::default, |a, b| a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> BatchConfig {
        BatchConfig {
            programs: 64,
            program_size: 32,
            step_limit: 512,
            tape_len: 64,
        }
    }

    #[test]
    fn test_programs_have_dialect_size() {
        let tape = Batch::new(Dialect::Tape, small_config(), 1);
        assert_eq!(tape.programs.len(), 64);
        assert!(tape.programs.iter().all(|p| p.len() == 32));

        let register = Batch::new(Dialect::Register, small_config(), 1);
        assert!(register.programs.iter().all(|p| p.len() == MEMORY_SIZE));
    }

    #[test]
    fn test_same_seed_same_programs() {
        let a = Batch::new(Dialect::Tape, small_config(), 42);
        let b = Batch::new(Dialect::Tape, small_config(), 42);
        let c = Batch::new(Dialect::Tape, small_config(), 43);
        assert_eq!(a.programs, b.programs);
        assert_ne!(a.programs, c.programs);
    }

    #[test]
    fn test_report_is_deterministic() {
        for dialect in [Dialect::Tape, Dialect::Register] {
            let a = Batch::new(dialect, small_config(), 7).run();
            let b = Batch::new(dialect, small_config(), 7).run();
            assert_eq!(a, b);
            assert_eq!(a.total(), 64);
        }
    }

    #[test]
    fn test_register_images_never_fail() {
        let report = Batch::new(Dialect::Register, small_config(), 3).run();
        assert_eq!(report.failed, 0);
        assert_eq!(report.halted + report.truncated, 64);
    }

    #[test]
    fn test_noop_programs_all_halt() {
        let mut batch = Batch::new(Dialect::Tape, small_config(), 0);
        for prog in &mut batch.programs {
            prog.fill(b' ');
        }
        let report = batch.run();
        assert_eq!(report.halted, 64);
        assert_eq!(report.steps, 64 * 32);
        assert_eq!(report.output_bytes, 0);
    }

    #[test]
    fn test_report_add() {
        let a = BatchReport {
            halted: 1,
            truncated: 2,
            failed: 3,
            steps: 4,
            output_bytes: 5,
        };
        assert_eq!((a + a).total(), 12);
        assert_eq!(a + BatchReport::default(), a);
    }
}
