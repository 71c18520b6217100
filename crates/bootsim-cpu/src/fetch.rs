//! Instruction-stream reads relative to EIP. None of these move EIP; handlers advance it
//! themselves once they know how many bytes they consumed.

use crate::error::Result;
use crate::state::CpuState;

impl CpuState {
    pub fn code8(&self, index: u32) -> Result<u8> {
        self.read_u8(self.eip.wrapping_add(index))
    }

    pub fn code32(&self, index: u32) -> Result<u32> {
        self.read_u32(self.eip.wrapping_add(index))
    }

    pub fn sign_code8(&self, index: u32) -> Result<i32> {
        Ok(self.code8(index)? as i8 as i32)
    }

    pub fn sign_code32(&self, index: u32) -> Result<i32> {
        Ok(self.code32(index)? as i32)
    }
}
