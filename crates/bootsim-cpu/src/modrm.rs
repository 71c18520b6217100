//! ModRM addressing: decode, effective address, and r/m operand access.
//!
//! ```text
//!   7 6   5 4 3   2 1 0
//!  [mod] [ reg ] [ r/m ]
//! ```
//!
//! A SIB byte is consumed whenever `mod != 3 && r/m == 4` so the instruction stream stays
//! aligned, but addressing through it is not implemented.

use crate::error::{CpuError, Result};
use crate::state::CpuState;

pub const MOD_REGISTER: u8 = 3;
const RM_SIB: u8 = 4;
const RM_DISP32: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModRm {
    pub mode: u8,
    /// Register operand, or the sub-opcode for group instructions.
    pub reg: u8,
    pub rm: u8,
    pub sib: Option<u8>,
    pub disp8: i8,
    pub disp32: u32,
}

impl ModRm {
    /// Decodes the ModRM byte at EIP plus any SIB byte and displacement, advancing EIP past
    /// everything consumed.
    pub fn decode(cpu: &mut CpuState) -> Result<Self> {
        let code = cpu.code8(0)?;
        let mut modrm = ModRm {
            mode: code >> 6,
            reg: (code >> 3) & 7,
            rm: code & 7,
            ..ModRm::default()
        };
        cpu.eip = cpu.eip.wrapping_add(1);

        if modrm.mode != MOD_REGISTER && modrm.rm == RM_SIB {
            modrm.sib = Some(cpu.code8(0)?);
            cpu.eip = cpu.eip.wrapping_add(1);
        }

        if (modrm.mode == 0 && modrm.rm == RM_DISP32) || modrm.mode == 2 {
            modrm.disp32 = cpu.sign_code32(0)? as u32;
            cpu.eip = cpu.eip.wrapping_add(4);
        } else if modrm.mode == 1 {
            modrm.disp8 = cpu.sign_code8(0)? as i8;
            cpu.eip = cpu.eip.wrapping_add(1);
        }

        Ok(modrm)
    }

    pub fn is_register(&self) -> bool {
        self.mode == MOD_REGISTER
    }

    pub fn effective_address(&self, cpu: &CpuState) -> Result<u32> {
        match (self.mode, self.rm) {
            (MOD_REGISTER, _) => Err(CpuError::RegisterDirectAddress),
            (mode, RM_SIB) => Err(CpuError::SibUnsupported { mode }),
            (0, RM_DISP32) => Ok(self.disp32),
            (0, rm) => Ok(cpu.reg_by_index(rm)),
            (1, rm) => Ok(cpu.reg_by_index(rm).wrapping_add_signed(self.disp8 as i32)),
            (_, rm) => Ok(cpu.reg_by_index(rm).wrapping_add(self.disp32)),
        }
    }

    pub fn rm32(&self, cpu: &CpuState) -> Result<u32> {
        if self.is_register() {
            Ok(cpu.reg_by_index(self.rm))
        } else {
            cpu.read_u32(self.effective_address(cpu)?)
        }
    }

    pub fn set_rm32(&self, cpu: &mut CpuState, value: u32) -> Result<()> {
        if self.is_register() {
            cpu.set_reg_by_index(self.rm, value);
            Ok(())
        } else {
            let addr = self.effective_address(cpu)?;
            cpu.write_u32(addr, value)
        }
    }

    pub fn rm8(&self, cpu: &CpuState) -> Result<u8> {
        if self.is_register() {
            Ok(cpu.reg8_by_index(self.rm))
        } else {
            cpu.read_u8(self.effective_address(cpu)?)
        }
    }

    pub fn set_rm8(&self, cpu: &mut CpuState, value: u8) -> Result<()> {
        if self.is_register() {
            cpu.set_reg8_by_index(self.rm, value);
            Ok(())
        } else {
            let addr = self.effective_address(cpu)?;
            cpu.write_u8(addr, value)
        }
    }

    pub fn r32(&self, cpu: &CpuState) -> u32 {
        cpu.reg_by_index(self.reg)
    }

    pub fn set_r32(&self, cpu: &mut CpuState, value: u32) {
        cpu.set_reg_by_index(self.reg, value);
    }

    pub fn r8(&self, cpu: &CpuState) -> u8 {
        cpu.reg8_by_index(self.reg)
    }

    pub fn set_r8(&self, cpu: &mut CpuState, value: u8) {
        cpu.set_reg8_by_index(self.reg, value);
    }
}
