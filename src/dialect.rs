use std::io::{Read, Write};

use clap::ValueEnum;
use thiserror::Error;

use crate::executor::Executor;
use crate::register::{self, RegisterMachine};
use crate::tape::{self, STACK_SIZE, TapeConfig, TapeMachine};

/// Which machine a raw program is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dialect {
    /// Brainfuck-style tape machine; any byte sequence is a program.
    Tape,
    /// 256-byte self-modifying register machine.
    Register,
}

/// Options shared by every run of a raw program.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Tape length for the tape machine. Ignored by the register machine.
    pub tape_len: usize,
    /// Stop after this many steps. `None` runs until the program halts.
    pub step_limit: Option<usize>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            tape_len: STACK_SIZE,
            step_limit: None,
        }
    }
}

/// How a run that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Steps executed.
    pub steps: usize,
    /// False when the step limit cut the run short.
    pub halted: bool,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("tape machine: {0}")]
    Tape(#[from] tape::Error),
    #[error("register machine: {0}")]
    Register(#[from] register::Error),
}

impl Dialect {
    /// Load `program` into a fresh machine of this dialect and run it.
    ///
    /// The stream is flushed once the run ends without error. For the tape
    /// machine a failed flush is a write error, since buffered output from
    /// `.` only reaches its destination there. Register output stays
    /// unchecked.
    pub fn run<S: Read + Write>(
        self,
        program: &[u8],
        mut io: S,
        options: &RunOptions,
    ) -> Result<Outcome, RunError> {
        match self {
            Dialect::Tape => {
                let config = TapeConfig {
                    tape_len: options.tape_len,
                };
                let machine = TapeMachine::with_config(program, &mut io, &config);
                let outcome = drive(machine, options.step_limit)?;
                io.flush().map_err(tape::Error::Write)?;
                Ok(outcome)
            }
            Dialect::Register => {
                let machine = RegisterMachine::from_image(program, &mut io)?;
                let Ok(outcome) = drive(machine, options.step_limit);
                let _ = io.flush();
                Ok(outcome)
            }
        }
    }
}

fn drive<E: Executor>(mut machine: E, step_limit: Option<usize>) -> Result<Outcome, E::Error> {
    let steps = match step_limit {
        Some(limit) => machine.run_limited(limit)?,
        None => machine.run()?,
    };
    Ok(Outcome {
        steps,
        halted: machine.halted(),
    })
}
