use std::fmt;

use crate::error::{CpuError, Result};
use crate::flags::RFlags;

/// Conventional boot-sector load address.
pub const BOOT_SECTOR_ADDR: u32 = 0x7C00;

/// 8 general purpose registers in the standard x86 order.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gpr {
    Eax = 0,
    Ecx = 1,
    Edx = 2,
    Ebx = 3,
    Esp = 4,
    Ebp = 5,
    Esi = 6,
    Edi = 7,
}

impl Gpr {
    pub const ALL: [Gpr; 8] = [
        Gpr::Eax,
        Gpr::Ecx,
        Gpr::Edx,
        Gpr::Ebx,
        Gpr::Esp,
        Gpr::Ebp,
        Gpr::Esi,
        Gpr::Edi,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Gpr::Eax => "EAX",
            Gpr::Ecx => "ECX",
            Gpr::Edx => "EDX",
            Gpr::Ebx => "EBX",
            Gpr::Esp => "ESP",
            Gpr::Ebp => "EBP",
            Gpr::Esi => "ESI",
            Gpr::Edi => "EDI",
        }
    }
}

/// Byte registers, numbered the way ModRM encodes them.
///
/// Indices 0-3 are the low bytes of EAX..EBX, 4-7 are bits 8..16 of the same four registers.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gpr8 {
    Al = 0,
    Cl = 1,
    Dl = 2,
    Bl = 3,
    Ah = 4,
    Ch = 5,
    Dh = 6,
    Bh = 7,
}

/// Construction parameters for [`CpuState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuConfig {
    /// Size of the flat memory image in bytes. Also the fetch bound that ends a run.
    pub memory_size: u32,
    /// Where the program image is placed.
    pub load_addr: u32,
    /// Initial EIP.
    pub entry: u32,
    /// Initial ESP.
    pub stack_pointer: u32,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            memory_size: 1024 * 1024,
            load_addr: BOOT_SECTOR_ADDR,
            entry: BOOT_SECTOR_ADDR,
            stack_pointer: BOOT_SECTOR_ADDR,
        }
    }
}

impl CpuConfig {
    pub fn validate(&self) -> Result<()> {
        if self.memory_size == 0 {
            return Err(CpuError::InvalidConfig("memory size must be non-zero"));
        }
        if self.entry >= self.memory_size {
            return Err(CpuError::InvalidConfig("entry point lies outside memory"));
        }
        if self.load_addr >= self.memory_size {
            return Err(CpuError::InvalidConfig("load address lies outside memory"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuState {
    regs: [u32; 8],
    pub eflags: RFlags,
    pub eip: u32,
    memory: Vec<u8>,
    memory_size: u32,
}

impl CpuState {
    pub fn new(config: CpuConfig) -> Result<Self> {
        config.validate()?;
        let mut cpu = Self {
            regs: [0; 8],
            eflags: RFlags::empty(),
            eip: config.entry,
            memory: vec![0; config.memory_size as usize],
            memory_size: config.memory_size,
        };
        cpu.set_reg(Gpr::Esp, config.stack_pointer);
        Ok(cpu)
    }

    /// Copies a program image into memory at `offset`. Everything else is left untouched.
    pub fn load(&mut self, offset: u32, image: &[u8]) -> Result<()> {
        let start = offset as usize;
        let dst = start
            .checked_add(image.len())
            .and_then(|end| self.memory.get_mut(start..end))
            .ok_or(CpuError::ImageOutOfBounds {
                offset,
                len: image.len(),
                memory_size: self.memory_size,
            })?;
        dst.copy_from_slice(image);
        Ok(())
    }

    pub fn memory_size(&self) -> u32 {
        self.memory_size
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn reg(&self, reg: Gpr) -> u32 {
        self.regs[reg as usize]
    }

    pub fn set_reg(&mut self, reg: Gpr, value: u32) {
        self.regs[reg as usize] = value;
    }

    /// Register access by 3-bit encoding (opcode low bits or ModRM field).
    pub fn reg_by_index(&self, index: u8) -> u32 {
        self.regs[(index & 7) as usize]
    }

    pub fn set_reg_by_index(&mut self, index: u8, value: u32) {
        self.regs[(index & 7) as usize] = value;
    }

    pub fn reg8(&self, reg: Gpr8) -> u8 {
        self.reg8_by_index(reg as u8)
    }

    pub fn set_reg8(&mut self, reg: Gpr8, value: u8) {
        self.set_reg8_by_index(reg as u8, value);
    }

    pub fn reg8_by_index(&self, index: u8) -> u8 {
        let index = index & 7;
        if index < 4 {
            self.regs[index as usize] as u8
        } else {
            (self.regs[(index - 4) as usize] >> 8) as u8
        }
    }

    pub fn set_reg8_by_index(&mut self, index: u8, value: u8) {
        let index = index & 7;
        if index < 4 {
            let r = &mut self.regs[index as usize];
            *r = (*r & 0xFFFF_FF00) | value as u32;
        } else {
            let r = &mut self.regs[(index - 4) as usize];
            *r = (*r & 0xFFFF_00FF) | ((value as u32) << 8);
        }
    }

    pub fn flag(&self, flag: RFlags) -> bool {
        self.eflags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: RFlags, value: bool) {
        self.eflags.set(flag, value);
    }

    fn span(&self, addr: u32, len: usize) -> Result<std::ops::Range<usize>> {
        let start = addr as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.memory.len() => Ok(start..end),
            _ => Err(CpuError::MemoryOutOfBounds { addr, len }),
        }
    }

    pub fn read_u8(&self, addr: u32) -> Result<u8> {
        let span = self.span(addr, 1)?;
        Ok(self.memory[span.start])
    }

    pub fn write_u8(&mut self, addr: u32, value: u8) -> Result<()> {
        let span = self.span(addr, 1)?;
        self.memory[span.start] = value;
        Ok(())
    }

    pub fn read_u32(&self, addr: u32) -> Result<u32> {
        let span = self.span(addr, 4)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.memory[span]);
        Ok(u32::from_le_bytes(buf))
    }

    pub fn write_u32(&mut self, addr: u32, value: u32) -> Result<()> {
        let span = self.span(addr, 4)?;
        self.memory[span].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn push32(&mut self, value: u32) -> Result<()> {
        let esp = self.reg(Gpr::Esp).wrapping_sub(4);
        self.set_reg(Gpr::Esp, esp);
        self.write_u32(esp, value)
    }

    pub fn pop32(&mut self) -> Result<u32> {
        let esp = self.reg(Gpr::Esp);
        let value = self.read_u32(esp)?;
        self.set_reg(Gpr::Esp, esp.wrapping_add(4));
        Ok(value)
    }

    pub fn snapshot(&self) -> RegisterSnapshot {
        RegisterSnapshot {
            regs: self.regs,
            eip: self.eip,
        }
    }
}

/// Read-only copy of the register file, taken for diagnostics after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSnapshot {
    pub regs: [u32; 8],
    pub eip: u32,
}

impl RegisterSnapshot {
    pub fn reg(&self, reg: Gpr) -> u32 {
        self.regs[reg as usize]
    }
}

impl fmt::Display for RegisterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for reg in Gpr::ALL {
            writeln!(f, "{} = {:#010x}", reg.name(), self.reg(reg))?;
        }
        write!(f, "EIP = {:#010x}", self.eip)
    }
}
