use std::io::{self, Read, Write};

use thiserror::Error;

use crate::executor::Executor;

/// Default tape length in cells.
pub const STACK_SIZE: usize = 1 << 16;

const GREATER: u8 = b'>';
const LESS: u8 = b'<';
const PLUS: u8 = b'+';
const MINUS: u8 = b'-';
const COMMA: u8 = b',';
const DOT: u8 = b'.';
const LBRACKET: u8 = b'[';
const RBRACKET: u8 = b']';

#[derive(Debug, Error)]
pub enum Error {
    /// `]` executed with no open loop.
    #[error("loop close at position {position} has no matching open")]
    StackUnderflow { position: usize },
    /// `,` could not read a full byte (EOF counts).
    #[error("cannot read byte from io: {0}")]
    Read(io::Error),
    #[error("cannot write byte to io: {0}")]
    Write(io::Error),
    #[error("cursor {cursor} is outside the tape (length {len})")]
    CursorOutOfRange { cursor: usize, len: usize },
}

/// Configuration for a tape machine.
#[derive(Debug, Clone)]
pub struct TapeConfig {
    /// Number of cells on the tape.
    pub tape_len: usize,
}

impl Default for TapeConfig {
    fn default() -> Self {
        Self {
            tape_len: STACK_SIZE,
        }
    }
}

/// The tape instruction set: eight Brainfuck-style opcodes over a fixed
/// byte tape.
///
/// State:
/// - position: index of the next program byte, mutated by `]` to loop
/// - cursor: index of the current tape cell
/// - jump stack: positions of the `[` opcodes whose loops are still open
///
/// Cell arithmetic wraps modulo 256. The cursor does NOT wrap modulo the
/// tape length: moving left from 0 lands on `len` (one past the last cell),
/// and moving right past the end is allowed. Both are kept for compatibility
/// with existing programs; touching the cell at such a cursor fails with
/// `Error::CursorOutOfRange`.
///
/// Loops are do-while: `[` only records its position, and `]` decides
/// whether to jump back. A loop body therefore runs at least once.
pub struct TapeMachine<'p, S> {
    program: &'p [u8],
    position: usize,
    tape: Vec<u8>,
    cursor: usize,
    jumps: Vec<usize>,
    io: S,
}

impl<'p, S> TapeMachine<'p, S> {
    /// Create a machine with the default tape length.
    pub fn new(program: &'p [u8], io: S) -> Self {
        Self::with_config(program, io, &TapeConfig::default())
    }

    pub fn with_config(program: &'p [u8], io: S, config: &TapeConfig) -> Self {
        Self {
            program,
            position: 0,
            tape: vec![0u8; config.tape_len],
            cursor: 0,
            jumps: Vec::new(),
            io,
        }
    }

    pub fn tape(&self) -> &[u8] {
        &self.tape
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Index of the next program byte to execute.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Positions of currently open loops, innermost last.
    pub fn open_loops(&self) -> &[usize] {
        &self.jumps
    }

    pub fn into_io(self) -> S {
        self.io
    }

    fn cell(&self) -> Result<u8, Error> {
        self.tape.get(self.cursor).copied().ok_or(Error::CursorOutOfRange {
            cursor: self.cursor,
            len: self.tape.len(),
        })
    }

    fn cell_mut(&mut self) -> Result<&mut u8, Error> {
        let (cursor, len) = (self.cursor, self.tape.len());
        self.tape
            .get_mut(cursor)
            .ok_or(Error::CursorOutOfRange { cursor, len })
    }
}

impl<S: Read + Write> Executor for TapeMachine<'_, S> {
    type Error = Error;

    fn step(&mut self) -> Result<bool, Error> {
        let Some(&op) = self.program.get(self.position) else {
            return Ok(false);
        };

        match op {
            GREATER => self.cursor = self.cursor.saturating_add(1),
            LESS => self.cursor = self.cursor.checked_sub(1).unwrap_or(self.tape.len()),
            PLUS => {
                let cell = self.cell_mut()?;
                *cell = cell.wrapping_add(1);
            }
            MINUS => {
                let cell = self.cell_mut()?;
                *cell = cell.wrapping_sub(1);
            }
            COMMA => {
                let mut byte = [0u8; 1];
                self.io.read_exact(&mut byte).map_err(Error::Read)?;
                *self.cell_mut()? = byte[0];
            }
            DOT => {
                let byte = self.cell()?;
                self.io.write_all(&[byte]).map_err(Error::Write)?;
            }
            LBRACKET => self.jumps.push(self.position),
            RBRACKET => {
                let open = self.jumps.pop().ok_or(Error::StackUnderflow {
                    position: self.position,
                })?;
                if self.cell()? != 0 {
                    // The increment below steps past the `[`.
                    self.jumps.push(open);
                    self.position = open;
                }
            }
            _ => {} // no-op
        }

        self.position += 1;
        Ok(true)
    }

    fn halted(&self) -> bool {
        self.position >= self.program.len()
    }
}

/// Run `program` to completion on a fresh default-size tape.
///
/// Pass `&mut stream` to keep ownership of the stream; it is never closed.
pub fn eval<S: Read + Write>(program: &[u8], io: S) -> Result<(), Error> {
    TapeMachine::new(program, io).run().map(|_| ())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::duplex::Duplex;
    use proptest::prelude::*;

    const OPCODES: &[u8] = b"><+-,.[]x";

    proptest! {
        #[test]
        fn random_programs_never_panic(
            ops in prop::collection::vec(prop::sample::select(OPCODES), 0..128),
            input in prop::collection::vec(any::<u8>(), 0..16),
        ) {
            let config = TapeConfig { tape_len: 16 };
            let mut m = TapeMachine::with_config(&ops, Duplex::new(&input[..], Vec::new()), &config);
            let _ = m.run_limited(4096);
            prop_assert_eq!(m.tape().len(), 16);
            prop_assert!(m.cursor() <= 16 + ops.len());
        }

        #[test]
        fn plus_then_minus_restores_cell(n in 0usize..600) {
            let mut program = vec![PLUS; n];
            program.extend(std::iter::repeat_n(MINUS, n));
            let mut m = TapeMachine::with_config(&program, io::empty(), &TapeConfig { tape_len: 1 });
            m.run().unwrap();
            prop_assert_eq!(m.tape()[0], 0);
        }

        #[test]
        fn cell_value_is_count_mod_256(n in 0usize..1000) {
            let program = vec![PLUS; n];
            let mut m = TapeMachine::with_config(&program, io::empty(), &TapeConfig { tape_len: 1 });
            m.run().unwrap();
            prop_assert_eq!(m.tape()[0] as usize, n % 256);
        }
    }
}
