#![forbid(unsafe_code)]

//! A small 32-bit x86 interpreter for boot-sector style programs.
//!
//! The machine is a flat memory image with eight general purpose registers, four modeled flags
//! (CF/ZF/SF/OF) and a BIOS teletype service. [`Interpreter::run`] executes from the configured
//! entry point until EIP becomes 0 or runs off the end of memory.
//!
//! ```
//! use bootsim_cpu::{BufferedPlatform, CpuConfig, CpuState, Gpr, Interpreter, RunExit};
//!
//! let config = CpuConfig::default();
//! let mut cpu = CpuState::new(config).unwrap();
//! // mov eax, 0x12345678; hlt (not implemented, halts the run)
//! cpu.load(config.load_addr, &[0xB8, 0x78, 0x56, 0x34, 0x12, 0xF4]).unwrap();
//!
//! let mut interp = Interpreter::new(cpu);
//! let exit = interp.run(&mut BufferedPlatform::default()).unwrap();
//! assert!(matches!(exit, RunExit::UnknownOpcode { opcode: 0xF4, .. }));
//! assert_eq!(interp.cpu.reg(Gpr::Eax), 0x1234_5678);
//! ```

pub mod bios;
pub mod error;
mod fetch;
pub mod flags;
pub mod interp;
pub mod io;
pub mod modrm;
pub mod state;

pub use bios::{Color, Glyph};
pub use error::{CpuError, Result};
pub use flags::{Condition, RFlags};
pub use interp::{Interpreter, RunExit, Step};
pub use io::{BufferedPlatform, BufferedSerial, DisplaySink, IoBus, Platform, SerialConsole, COM1_PORT};
pub use modrm::ModRm;
pub use state::{CpuConfig, CpuState, Gpr, Gpr8, RegisterSnapshot, BOOT_SECTOR_ADDR};
