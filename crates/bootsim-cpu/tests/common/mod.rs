// Shared helpers, pulled into each test file with `mod common;`.
#![allow(dead_code)]

use bootsim_cpu::{BufferedPlatform, CpuConfig, CpuState, Interpreter, Result, RunExit};

pub const BOOT: u32 = 0x7C00;

/// A default-configured machine with `program` loaded at the boot address.
pub fn machine(program: &[u8]) -> Interpreter {
    let config = CpuConfig::default();
    let mut cpu = CpuState::new(config).expect("default config is valid");
    cpu.load(config.load_addr, program).expect("program fits");
    Interpreter::new(cpu)
}

pub fn run(program: &[u8]) -> (Interpreter, BufferedPlatform, Result<RunExit>) {
    run_with_input(program, &[])
}

pub fn run_with_input(
    program: &[u8],
    input: &[u8],
) -> (Interpreter, BufferedPlatform, Result<RunExit>) {
    let mut interp = machine(program);
    let mut io = BufferedPlatform::with_input(input);
    let exit = interp.run(&mut io);
    (interp, io, exit)
}
