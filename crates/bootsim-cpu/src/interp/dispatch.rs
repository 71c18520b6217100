use std::marker::PhantomData;

use crate::error::Result;
use crate::io::Platform;
use crate::state::CpuState;

use super::ops;
use super::Step;

pub(crate) type Handler<P> = fn(&mut CpuState, &mut P) -> Result<Step>;

pub(crate) struct DispatchTable<P: Platform>(PhantomData<P>);

impl<P: Platform> DispatchTable<P> {
    pub(crate) const TABLE: [Handler<P>; 256] = build_table::<P>();
}

const fn build_table<P: Platform>() -> [Handler<P>; 256] {
    let mut table = [ops::unknown::<P> as Handler<P>; 256];

    table[0x01] = ops::add_rm32_r32::<P>;
    table[0x3B] = ops::cmp_r32_rm32::<P>;
    table[0x3C] = ops::cmp_al_imm8::<P>;
    table[0x3D] = ops::cmp_eax_imm32::<P>;

    let mut r = 0;
    while r < 8 {
        table[0x40 + r] = ops::inc_r32::<P>;
        table[0x50 + r] = ops::push_r32::<P>;
        table[0x58 + r] = ops::pop_r32::<P>;
        table[0xB8 + r] = ops::mov_r32_imm32::<P>;
        r += 1;
    }

    table[0x68] = ops::push_imm32::<P>;
    table[0x6A] = ops::push_imm8::<P>;

    table[0x70] = ops::jcc_rel8::<P>;
    table[0x71] = ops::jcc_rel8::<P>;
    table[0x72] = ops::jcc_rel8::<P>;
    table[0x73] = ops::jcc_rel8::<P>;
    table[0x74] = ops::jcc_rel8::<P>;
    table[0x75] = ops::jcc_rel8::<P>;
    table[0x78] = ops::jcc_rel8::<P>;
    table[0x79] = ops::jcc_rel8::<P>;
    table[0x7C] = ops::jcc_rel8::<P>;
    table[0x7E] = ops::jcc_rel8::<P>;

    table[0x83] = ops::group_83::<P>;
    table[0x88] = ops::mov_rm8_r8::<P>;
    table[0x89] = ops::mov_rm32_r32::<P>;
    table[0x8A] = ops::mov_r8_rm8::<P>;
    table[0x8B] = ops::mov_r32_rm32::<P>;

    table[0xC3] = ops::ret::<P>;
    table[0xC7] = ops::mov_rm32_imm32::<P>;
    table[0xC9] = ops::leave::<P>;
    table[0xCD] = ops::int_imm8::<P>;

    table[0xE8] = ops::call_rel32::<P>;
    table[0xE9] = ops::jmp_rel32::<P>;
    table[0xEB] = ops::jmp_rel8::<P>;
    table[0xEC] = ops::in_al_dx::<P>;
    table[0xEE] = ops::out_dx_al::<P>;
    table[0xFF] = ops::group_ff::<P>;

    table
}
