/// A machine that executes a loaded program one instruction at a time.
///
/// Both instruction sets (tape and register) implement this trait. The
/// machines own all of their state; the trait only drives the
/// fetch-decode-execute loop.
pub trait Executor {
    type Error;

    /// Execute a single instruction.
    ///
    /// Returns `Ok(false)` without doing anything once the machine has
    /// halted, `Ok(true)` after executing one instruction (no-ops included).
    fn step(&mut self) -> Result<bool, Self::Error>;

    /// Returns true once the program has run to completion.
    fn halted(&self) -> bool;

    /// Execute until the machine halts or an instruction fails.
    ///
    /// Returns the number of steps executed. Programs that never halt make
    /// this loop forever; use `run_limited` when that matters.
    fn run(&mut self) -> Result<usize, Self::Error> {
        let mut steps = 0;
        while self.step()? {
            steps += 1;
        }
        Ok(steps)
    }

    /// Execute until the machine halts or `step_limit` steps have been
    /// consumed. Hitting the limit is not an error; check `halted`.
    fn run_limited(&mut self, step_limit: usize) -> Result<usize, Self::Error> {
        let mut steps = 0;
        while steps < step_limit && self.step()? {
            steps += 1;
        }
        Ok(steps)
    }
}
