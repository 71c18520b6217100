#![forbid(unsafe_code)]

mod terminal;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use bootsim_cpu::{CpuConfig, CpuState, Interpreter, IoBus, RunExit, BOOT_SECTOR_ADDR};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use terminal::{AnsiTerminal, StdioSerial};

#[derive(Debug, Parser)]
#[command(about = "Runs a raw 32-bit x86 boot-sector binary and dumps the registers afterwards")]
pub struct Args {
    /// Raw binary to load.
    #[arg(short = 'f', long, default_value = "bin")]
    file: PathBuf,

    /// Suppress the per-instruction trace.
    #[arg(short, long)]
    quiet: bool,

    /// Size of guest memory in bytes.
    #[arg(long, default_value = "0x100000", value_parser = parse_u32)]
    memory: u32,

    /// Address the binary is loaded at.
    #[arg(long, default_value_t = BOOT_SECTOR_ADDR, value_parser = parse_u32)]
    load_addr: u32,

    /// Initial EIP.
    #[arg(long, default_value_t = BOOT_SECTOR_ADDR, value_parser = parse_u32)]
    entry: u32,

    /// Initial ESP.
    #[arg(long, default_value_t = BOOT_SECTOR_ADDR, value_parser = parse_u32)]
    stack: u32,

    /// Stop after executing at most N instructions.
    #[arg(long)]
    max_insts: Option<u64>,
}

/// Accepts decimal or `0x`-prefixed hex.
fn parse_u32(s: &str) -> std::result::Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number {s:?}: {e}"))
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "bootsim_cpu=trace,info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.quiet);
    tracing::info!("loading {}", args.file.display());

    let config = CpuConfig {
        memory_size: args.memory,
        load_addr: args.load_addr,
        entry: args.entry,
        stack_pointer: args.stack,
    };
    let image = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let mut cpu = CpuState::new(config)?;
    cpu.load(config.load_addr, &image)
        .with_context(|| format!("failed to load {}", args.file.display()))?;

    let mut interp = Interpreter::new(cpu);
    let mut platform = IoBus::new(
        AnsiTerminal::new(io::stdout()),
        StdioSerial::new(io::stdin().lock()),
    );

    let exit = match args.max_insts {
        None => Some(interp.run(&mut platform)?),
        Some(budget) => {
            let mut exit = None;
            for _ in 0..budget {
                exit = interp.tick(&mut platform)?;
                if exit.is_some() {
                    break;
                }
            }
            exit
        }
    };

    match exit {
        Some(RunExit::Halted) => tracing::info!("end of program"),
        Some(RunExit::UnknownOpcode { opcode, eip }) => {
            tracing::info!("end of program: unrecognized opcode {opcode:#04x} at {eip:#x}")
        }
        Some(RunExit::EndOfMemory { eip }) => {
            tracing::info!("end of program: EIP {eip:#x} ran past the end of memory")
        }
        None => tracing::warn!("instruction budget exhausted"),
    }

    platform.display.flush()?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", interp.cpu.snapshot())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_accept_hex_and_decimal() {
        assert_eq!(parse_u32("0x7c00"), Ok(0x7C00));
        assert_eq!(parse_u32("0X10"), Ok(16));
        assert_eq!(parse_u32("1024"), Ok(1024));
        assert!(parse_u32("0xZZ").is_err());
        assert!(parse_u32("-1").is_err());
    }

    #[test]
    fn defaults_match_boot_sector_layout() {
        let args = Args::parse_from(["bootsim"]);
        assert_eq!(args.file, PathBuf::from("bin"));
        assert_eq!(args.memory, 1024 * 1024);
        assert_eq!(args.load_addr, 0x7C00);
        assert_eq!(args.entry, 0x7C00);
        assert_eq!(args.stack, 0x7C00);
        assert!(!args.quiet);
        assert_eq!(args.max_insts, None);
    }

    #[test]
    fn short_flags() {
        let args = Args::parse_from(["bootsim", "-f", "prog.bin", "-q", "--entry", "0x100"]);
        assert_eq!(args.file, PathBuf::from("prog.bin"));
        assert!(args.quiet);
        assert_eq!(args.entry, 0x100);
    }
}
