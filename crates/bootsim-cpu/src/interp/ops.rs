//! Instruction handlers. Each is entered with EIP on the opcode byte and leaves EIP on the next
//! instruction (or the branch target).

use crate::bios;
use crate::error::{CpuError, Result};
use crate::flags::{sub_with_flags, update_sub_flags, Condition};
use crate::io::Platform;
use crate::modrm::ModRm;
use crate::state::{CpuState, Gpr, Gpr8};

use super::Step;

fn advance(cpu: &mut CpuState, len: u32) {
    cpu.eip = cpu.eip.wrapping_add(len);
}

/// Relative branch: the displacement counts from the end of the instruction.
fn jump_rel(cpu: &mut CpuState, len: u32, diff: i32) {
    cpu.eip = cpu.eip.wrapping_add(len).wrapping_add_signed(diff);
}

/// Register encoded in the low three bits of the opcode.
fn opcode_reg(cpu: &CpuState) -> Result<u8> {
    Ok(cpu.code8(0)? & 7)
}

/// Skips the opcode and decodes the ModRM that follows it.
fn decode_modrm(cpu: &mut CpuState) -> Result<ModRm> {
    advance(cpu, 1);
    ModRm::decode(cpu)
}

pub(super) fn unknown<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let eip = cpu.eip;
    let opcode = cpu.code8(0)?;
    tracing::warn!("not implemented: opcode {opcode:#04x} at {eip:#x}");
    cpu.eip = 0;
    Ok(Step::UnknownOpcode { opcode, eip })
}

// 01 /r
pub(super) fn add_rm32_r32<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let modrm = decode_modrm(cpu)?;
    let r32 = modrm.r32(cpu);
    let rm32 = modrm.rm32(cpu)?;
    modrm.set_rm32(cpu, rm32.wrapping_add(r32))?;
    Ok(Step::Continue)
}

// 3B /r
pub(super) fn cmp_r32_rm32<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let modrm = decode_modrm(cpu)?;
    let r32 = modrm.r32(cpu);
    let rm32 = modrm.rm32(cpu)?;
    update_sub_flags(&mut cpu.eflags, r32, rm32);
    Ok(Step::Continue)
}

// 3C ib
pub(super) fn cmp_al_imm8<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let imm = cpu.code8(1)?;
    let al = cpu.reg8(Gpr8::Al);
    update_sub_flags(&mut cpu.eflags, al as u32, imm as u32);
    advance(cpu, 2);
    Ok(Step::Continue)
}

// 3D id
pub(super) fn cmp_eax_imm32<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let imm = cpu.code32(1)?;
    let eax = cpu.reg(Gpr::Eax);
    update_sub_flags(&mut cpu.eflags, eax, imm);
    advance(cpu, 5);
    Ok(Step::Continue)
}

// 40+r. Flags are left alone.
pub(super) fn inc_r32<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let reg = opcode_reg(cpu)?;
    cpu.set_reg_by_index(reg, cpu.reg_by_index(reg).wrapping_add(1));
    advance(cpu, 1);
    Ok(Step::Continue)
}

// 50+r
pub(super) fn push_r32<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let reg = opcode_reg(cpu)?;
    cpu.push32(cpu.reg_by_index(reg))?;
    advance(cpu, 1);
    Ok(Step::Continue)
}

// 58+r
pub(super) fn pop_r32<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let reg = opcode_reg(cpu)?;
    let value = cpu.pop32()?;
    cpu.set_reg_by_index(reg, value);
    advance(cpu, 1);
    Ok(Step::Continue)
}

// 68 id
pub(super) fn push_imm32<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let imm = cpu.code32(1)?;
    cpu.push32(imm)?;
    advance(cpu, 5);
    Ok(Step::Continue)
}

// 6A ib, zero-extended to 32 bits.
pub(super) fn push_imm8<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let imm = cpu.code8(1)?;
    cpu.push32(imm as u32)?;
    advance(cpu, 2);
    Ok(Step::Continue)
}

// 70..7E cb
pub(super) fn jcc_rel8<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let opcode = cpu.code8(0)?;
    let taken = Condition::from_jcc_opcode(opcode).is_some_and(|cc| cc.eval(cpu.eflags));
    let diff = if taken { cpu.sign_code8(1)? } else { 0 };
    jump_rel(cpu, 2, diff);
    Ok(Step::Continue)
}

// 83 /0 /5 /7 ib
pub(super) fn group_83<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let modrm = decode_modrm(cpu)?;
    let sub = modrm.reg;
    if !matches!(sub, 0 | 5 | 7) {
        return Err(CpuError::UnimplementedGroup { opcode: 0x83, sub });
    }

    let rm32 = modrm.rm32(cpu)?;
    let imm = cpu.sign_code8(0)? as u32;
    advance(cpu, 1);

    match sub {
        0 => modrm.set_rm32(cpu, rm32.wrapping_add(imm))?,
        5 => {
            let result = sub_with_flags(&mut cpu.eflags, rm32, imm);
            modrm.set_rm32(cpu, result)?;
        }
        _ => update_sub_flags(&mut cpu.eflags, rm32, imm),
    }
    Ok(Step::Continue)
}

// 88 /r
pub(super) fn mov_rm8_r8<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let modrm = decode_modrm(cpu)?;
    let r8 = modrm.r8(cpu);
    modrm.set_rm8(cpu, r8)?;
    Ok(Step::Continue)
}

// 89 /r
pub(super) fn mov_rm32_r32<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let modrm = decode_modrm(cpu)?;
    let r32 = modrm.r32(cpu);
    modrm.set_rm32(cpu, r32)?;
    Ok(Step::Continue)
}

// 8A /r
pub(super) fn mov_r8_rm8<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let modrm = decode_modrm(cpu)?;
    let rm8 = modrm.rm8(cpu)?;
    modrm.set_r8(cpu, rm8);
    Ok(Step::Continue)
}

// 8B /r
pub(super) fn mov_r32_rm32<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let modrm = decode_modrm(cpu)?;
    let rm32 = modrm.rm32(cpu)?;
    modrm.set_r32(cpu, rm32);
    Ok(Step::Continue)
}

// B8+r id
pub(super) fn mov_r32_imm32<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let reg = opcode_reg(cpu)?;
    let imm = cpu.code32(1)?;
    cpu.set_reg_by_index(reg, imm);
    advance(cpu, 5);
    Ok(Step::Continue)
}

// C3
pub(super) fn ret<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    cpu.eip = cpu.pop32()?;
    Ok(Step::Continue)
}

// C7 /0 id
pub(super) fn mov_rm32_imm32<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let modrm = decode_modrm(cpu)?;
    let imm = cpu.code32(0)?;
    advance(cpu, 4);
    modrm.set_rm32(cpu, imm)?;
    Ok(Step::Continue)
}

// C9
pub(super) fn leave<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    cpu.set_reg(Gpr::Esp, cpu.reg(Gpr::Ebp));
    let ebp = cpu.pop32()?;
    cpu.set_reg(Gpr::Ebp, ebp);
    advance(cpu, 1);
    Ok(Step::Continue)
}

// CD ib
pub(super) fn int_imm8<P: Platform>(cpu: &mut CpuState, platform: &mut P) -> Result<Step> {
    let vector = cpu.code8(1)?;
    advance(cpu, 2);
    Ok(bios::software_interrupt(cpu, platform, vector))
}

// E8 cd
pub(super) fn call_rel32<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let diff = cpu.sign_code32(1)?;
    cpu.push32(cpu.eip.wrapping_add(5))?;
    jump_rel(cpu, 5, diff);
    Ok(Step::Continue)
}

// E9 cd
pub(super) fn jmp_rel32<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let diff = cpu.sign_code32(1)?;
    jump_rel(cpu, 5, diff);
    Ok(Step::Continue)
}

// EB cb
pub(super) fn jmp_rel8<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let diff = cpu.sign_code8(1)?;
    jump_rel(cpu, 2, diff);
    Ok(Step::Continue)
}

fn dx_port(cpu: &CpuState) -> u16 {
    cpu.reg(Gpr::Edx) as u16
}

// EC
pub(super) fn in_al_dx<P: Platform>(cpu: &mut CpuState, platform: &mut P) -> Result<Step> {
    let value = platform.io_in8(dx_port(cpu));
    cpu.set_reg8(Gpr8::Al, value);
    advance(cpu, 1);
    Ok(Step::Continue)
}

// EE
pub(super) fn out_dx_al<P: Platform>(cpu: &mut CpuState, platform: &mut P) -> Result<Step> {
    platform.io_out8(dx_port(cpu), cpu.reg8(Gpr8::Al));
    advance(cpu, 1);
    Ok(Step::Continue)
}

// FF /0
pub(super) fn group_ff<P: Platform>(cpu: &mut CpuState, _: &mut P) -> Result<Step> {
    let modrm = decode_modrm(cpu)?;
    match modrm.reg {
        0 => {
            let value = modrm.rm32(cpu)?;
            modrm.set_rm32(cpu, value.wrapping_add(1))?;
            Ok(Step::Continue)
        }
        sub => Err(CpuError::UnimplementedGroup { opcode: 0xFF, sub }),
    }
}
