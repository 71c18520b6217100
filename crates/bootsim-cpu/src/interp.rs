mod dispatch;
mod ops;

use crate::error::Result;
use crate::io::Platform;
use crate::state::CpuState;

use dispatch::DispatchTable;

/// Outcome of a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// The opcode byte has no handler. EIP has been forced to 0.
    UnknownOpcode { opcode: u8, eip: u32 },
    /// `INT n` for a vector or BIOS function that is not implemented. Execution continues.
    UnhandledInterrupt { vector: u8, function: Option<u8> },
}

/// Why [`Interpreter::run`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    /// EIP became 0.
    Halted,
    /// An unrecognized opcode forced EIP to 0.
    UnknownOpcode { opcode: u8, eip: u32 },
    /// EIP reached the end of memory before an opcode fetch.
    EndOfMemory { eip: u32 },
}

pub struct Interpreter {
    pub cpu: CpuState,
}

impl Interpreter {
    pub fn new(cpu: CpuState) -> Self {
        Self { cpu }
    }

    /// Fetches the opcode at EIP and executes it.
    pub fn step<P: Platform>(&mut self, platform: &mut P) -> Result<Step> {
        let opcode = self.cpu.code8(0)?;
        tracing::trace!("EIP = {:#x}, Code = {:02x}", self.cpu.eip, opcode);
        let handler = DispatchTable::<P>::TABLE[opcode as usize];
        handler(&mut self.cpu, platform)
    }

    /// One iteration of the run loop: checks the memory bound, executes an instruction and reports
    /// whether the program has halted.
    pub fn tick<P: Platform>(&mut self, platform: &mut P) -> Result<Option<RunExit>> {
        let eip = self.cpu.eip;
        if eip >= self.cpu.memory_size() {
            return Ok(Some(RunExit::EndOfMemory { eip }));
        }

        match self.step(platform)? {
            Step::UnknownOpcode { opcode, eip } => Ok(Some(RunExit::UnknownOpcode { opcode, eip })),
            Step::Continue | Step::UnhandledInterrupt { .. } => {
                if self.cpu.eip == 0 {
                    Ok(Some(RunExit::Halted))
                } else {
                    Ok(None)
                }
            }
        }
    }

    pub fn run<P: Platform>(&mut self, platform: &mut P) -> Result<RunExit> {
        loop {
            if let Some(exit) = self.tick(platform)? {
                tracing::debug!(?exit, "end of program");
                return Ok(exit);
            }
        }
    }
}
