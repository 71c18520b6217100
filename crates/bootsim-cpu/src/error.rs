use thiserror::Error;

pub type Result<T> = std::result::Result<T, CpuError>;

/// Conditions that stop the emulator outright.
///
/// These cover instruction forms whose semantics this CPU does not define (SIB addressing,
/// unimplemented group sub-opcodes) and accesses outside the flat memory image. They are distinct
/// from the soft halt produced by an unrecognized opcode, which ends the run normally through
/// [`crate::RunExit::UnknownOpcode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("not implemented: SIB addressing (ModRM mod = {mode}, rm = 4)")]
    SibUnsupported { mode: u8 },

    #[error("not implemented: effective address for register-direct ModRM (mod = 3)")]
    RegisterDirectAddress,

    #[error("not implemented: opcode {opcode:#04x} /{sub}")]
    UnimplementedGroup { opcode: u8, sub: u8 },

    #[error("memory access out of bounds: addr={addr:#010x} len={len}")]
    MemoryOutOfBounds { addr: u32, len: usize },

    #[error("program image does not fit: offset={offset:#x} len={len} memory_size={memory_size:#x}")]
    ImageOutOfBounds {
        offset: u32,
        len: usize,
        memory_size: u32,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
