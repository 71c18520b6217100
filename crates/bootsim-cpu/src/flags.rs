//! EFLAGS subset and the subtraction flag rules shared by every compare/subtract instruction.

use bitflags::bitflags;

bitflags! {
    /// The modeled EFLAGS bits, at their architectural positions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RFlags: u32 {
        const CF = 1 << 0;
        const ZF = 1 << 6;
        const SF = 1 << 7;
        const OF = 1 << 11;
    }
}

const SIGN_BIT: u32 = 1 << 31;

/// Computes `lhs - rhs` and updates CF/ZF/SF/OF from it. Returns the truncated result.
///
/// The subtraction is carried out in 64 bits so the borrow shows up in bit 32.
pub fn sub_with_flags(rflags: &mut RFlags, lhs: u32, rhs: u32) -> u32 {
    let wide = (lhs as u64).wrapping_sub(rhs as u64);
    let result = wide as u32;

    rflags.set(RFlags::CF, (wide >> 32) & 1 != 0);
    rflags.set(RFlags::ZF, result == 0);
    rflags.set(RFlags::SF, result & SIGN_BIT != 0);
    rflags.set(
        RFlags::OF,
        ((lhs ^ rhs) & SIGN_BIT != 0) && ((lhs ^ result) & SIGN_BIT != 0),
    );

    result
}

/// Flag update for compares: the result is discarded.
pub fn update_sub_flags(rflags: &mut RFlags, lhs: u32, rhs: u32) {
    let _ = sub_with_flags(rflags, lhs, rhs);
}

/// Predicates tested by the short conditional jumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Overflow,
    NotOverflow,
    Carry,
    NotCarry,
    Zero,
    NotZero,
    Sign,
    NotSign,
    /// Signed less: SF != OF.
    Less,
    /// Signed less-or-equal: ZF, or SF != OF.
    LessOrEqual,
}

impl Condition {
    /// Maps a `Jcc rel8` opcode byte to its predicate, for the forms this CPU implements.
    pub const fn from_jcc_opcode(opcode: u8) -> Option<Self> {
        Some(match opcode {
            0x70 => Condition::Overflow,
            0x71 => Condition::NotOverflow,
            0x72 => Condition::Carry,
            0x73 => Condition::NotCarry,
            0x74 => Condition::Zero,
            0x75 => Condition::NotZero,
            0x78 => Condition::Sign,
            0x79 => Condition::NotSign,
            0x7C => Condition::Less,
            0x7E => Condition::LessOrEqual,
            _ => return None,
        })
    }

    pub fn eval(self, rflags: RFlags) -> bool {
        let cf = rflags.contains(RFlags::CF);
        let zf = rflags.contains(RFlags::ZF);
        let sf = rflags.contains(RFlags::SF);
        let of = rflags.contains(RFlags::OF);
        match self {
            Condition::Overflow => of,
            Condition::NotOverflow => !of,
            Condition::Carry => cf,
            Condition::NotCarry => !cf,
            Condition::Zero => zf,
            Condition::NotZero => !zf,
            Condition::Sign => sf,
            Condition::NotSign => !sf,
            Condition::Less => sf != of,
            Condition::LessOrEqual => zf || sf != of,
        }
    }
}
