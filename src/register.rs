use std::convert::Infallible;
use std::io::{Read, Write};
use std::mem;

use thiserror::Error;

use crate::executor::Executor;

/// Size of the unified program/data memory.
pub const MEMORY_SIZE: usize = 256;

/// The instruction pointer value at which the machine stops fetching.
const HALT: u8 = 0xFF;

const LOAD: u8 = b'<';
const STORE: u8 = b'>';
const POINT: u8 = b'*';
const JUMP: u8 = b'!';
const SWITCH: u8 = b'\\';
const ADD: u8 = b'+';
const SUBTRACT: u8 = b'-';
const INPUT: u8 = b'(';
const OUTPUT: u8 = b')';
const SKIP: u8 = b'?';

/// Loading a raw image is the only way this machine can fail; once loaded,
/// execution never errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("memory image must be exactly 256 bytes, got {len}")]
    ImageSize { len: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    /// Data register.
    pub dr: u8,
    /// Address register.
    pub ar: u8,
    /// Instruction pointer.
    pub ir: u8,
    /// Switch register.
    pub sr: u8,
}

/// The register instruction set: a single-accumulator machine whose program
/// and data share one 256-byte memory.
///
/// Every instruction, jumps included, is followed by `IR += 1`. A jump (`!`)
/// swaps `AR` and `IR`, so execution resumes at `AR + 1` and the old
/// instruction pointer is left in `AR` as a return address. The machine halts
/// when `IR` reaches 255; that cell is data only.
///
/// Register and memory arithmetic wraps modulo 256. Instructions are fetched
/// from memory on every step, so stores into upcoming code take effect.
pub struct RegisterMachine<S> {
    memory: [u8; MEMORY_SIZE],
    registers: Registers,
    io: S,
}

impl<S> RegisterMachine<S> {
    pub fn new(memory: [u8; MEMORY_SIZE], io: S) -> Self {
        Self {
            memory,
            registers: Registers::default(),
            io,
        }
    }

    /// Create a machine from a raw image, which must be exactly
    /// `MEMORY_SIZE` bytes.
    pub fn from_image(image: &[u8], io: S) -> Result<Self, Error> {
        let memory = <[u8; MEMORY_SIZE]>::try_from(image)
            .map_err(|_| Error::ImageSize { len: image.len() })?;
        Ok(Self::new(memory, io))
    }

    pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
        &self.memory
    }

    pub fn registers(&self) -> Registers {
        self.registers
    }

    pub fn into_parts(self) -> ([u8; MEMORY_SIZE], S) {
        (self.memory, self.io)
    }
}

impl<S: Read + Write> Executor for RegisterMachine<S> {
    type Error = Infallible;

    fn step(&mut self) -> Result<bool, Infallible> {
        if self.halted() {
            return Ok(false);
        }

        let r = &mut self.registers;
        match self.memory[r.ir as usize] {
            LOAD => r.dr = self.memory[r.ar as usize],
            STORE => self.memory[r.ar as usize] = r.dr,
            POINT => mem::swap(&mut r.dr, &mut r.ar),
            JUMP => mem::swap(&mut r.ar, &mut r.ir),
            SWITCH => mem::swap(&mut r.dr, &mut r.sr),
            ADD => r.dr = self.memory[r.ar as usize].wrapping_add(r.dr),
            SUBTRACT => r.dr = self.memory[r.ar as usize].wrapping_sub(r.dr),
            INPUT => {
                // Read failures and EOF both load zero.
                let mut byte = [0u8; 1];
                r.dr = match self.io.read(&mut byte) {
                    Ok(1) => byte[0],
                    _ => 0,
                };
            }
            OUTPUT => {
                let _ = self.io.write_all(&[r.dr]);
            }
            SKIP => {
                if r.dr == 0 {
                    r.ir = r.ir.wrapping_add(1);
                }
            }
            _ => {} // no-op
        }

        r.ir = r.ir.wrapping_add(1);
        Ok(true)
    }

    fn halted(&self) -> bool {
        self.registers.ir == HALT
    }
}

/// Run `memory` until the instruction pointer reaches 255 and return the
/// final memory. Programs that jump back forever never return.
pub fn eval<S: Read + Write>(memory: [u8; MEMORY_SIZE], io: S) -> [u8; MEMORY_SIZE] {
    let mut machine = RegisterMachine::new(memory, io);
    let Ok(_) = machine.run();
    machine.into_parts().0
}

/// Like `eval`, but checks that `image` is exactly `MEMORY_SIZE` bytes
/// before executing anything.
pub fn eval_image<S: Read + Write>(
    image: &[u8],
    io: S,
) -> Result<[u8; MEMORY_SIZE], Error> {
    let mut machine = RegisterMachine::from_image(image, io)?;
    let Ok(_) = machine.run();
    Ok(machine.into_parts().0)
}
