//! Minimal BIOS services reachable through `INT n`.

use crate::interp::Step;
use crate::io::Platform;
use crate::state::{CpuState, Gpr8};

pub const VECTOR_VIDEO: u8 = 0x10;
pub const VIDEO_TELETYPE: u8 = 0x0E;

/// Foreground colors, numbered in ANSI SGR order.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
}

/// BIOS attribute color index (low 3 bits) to color.
const BIOS_PALETTE: [Color; 8] = [
    Color::Black,
    Color::Blue,
    Color::Green,
    Color::Cyan,
    Color::Red,
    Color::Magenta,
    Color::Yellow,
    Color::White,
];

impl Color {
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// SGR foreground code (30..=37).
    pub const fn ansi_code(self) -> u8 {
        30 + self.id()
    }
}

/// One character of teletype output with its resolved attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub ch: u8,
    pub color: Color,
    pub bright: bool,
}

impl Glyph {
    /// Resolves a BIOS color nibble: bits 0-2 select the color, bit 3 is intensity.
    pub fn from_attribute(ch: u8, attribute: u8) -> Self {
        let nibble = attribute & 0x0F;
        Self {
            ch,
            color: BIOS_PALETTE[(nibble & 0x07) as usize],
            bright: nibble & 0x08 != 0,
        }
    }
}

/// Services `INT vector`. Anything other than the teletype function is logged and skipped.
pub fn software_interrupt<P: Platform>(cpu: &mut CpuState, platform: &mut P, vector: u8) -> Step {
    match vector {
        VECTOR_VIDEO => video_service(cpu, platform),
        _ => {
            tracing::warn!("unknown interrupt: {vector:#04x}");
            Step::UnhandledInterrupt {
                vector,
                function: None,
            }
        }
    }
}

fn video_service<P: Platform>(cpu: &mut CpuState, platform: &mut P) -> Step {
    match cpu.reg8(Gpr8::Ah) {
        VIDEO_TELETYPE => {
            // AL = character, BL = color attribute.
            let glyph = Glyph::from_attribute(cpu.reg8(Gpr8::Al), cpu.reg8(Gpr8::Bl));
            platform.teletype(glyph);
            Step::Continue
        }
        function => {
            tracing::warn!("BIOS video function not implemented: {function:#04x}");
            Step::UnhandledInterrupt {
                vector: VECTOR_VIDEO,
                function: Some(function),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::BufferedPlatform;
    use crate::state::{CpuConfig, Gpr};

    #[test]
    fn palette_follows_bios_order() {
        assert_eq!(Glyph::from_attribute(b'x', 0x01).color, Color::Blue);
        assert_eq!(Glyph::from_attribute(b'x', 0x04).color, Color::Red);
        assert_eq!(Glyph::from_attribute(b'x', 0x06).color, Color::Yellow);
        assert_eq!(Glyph::from_attribute(b'x', 0x0F).color, Color::White);
        assert!(Glyph::from_attribute(b'x', 0x0F).bright);
        assert!(!Glyph::from_attribute(b'x', 0x07).bright);
        // Background bits are ignored.
        assert_eq!(
            Glyph::from_attribute(b'x', 0xF2),
            Glyph::from_attribute(b'x', 0x02)
        );
        assert_eq!(Color::Red.ansi_code(), 31);
        assert_eq!(Color::White.ansi_code(), 37);
    }

    #[test]
    fn teletype_bright_red_a() {
        let mut cpu = CpuState::new(CpuConfig::default()).unwrap();
        let mut io = BufferedPlatform::default();
        cpu.set_reg(Gpr::Eax, 0x0E41);
        cpu.set_reg(Gpr::Ebx, 0x0C);
        assert_eq!(software_interrupt(&mut cpu, &mut io, 0x10), Step::Continue);
        assert_eq!(
            io.glyphs(),
            &[Glyph {
                ch: b'A',
                color: Color::Red,
                bright: true,
            }]
        );
    }

    #[test]
    fn unknown_function_and_vector_continue() {
        let mut cpu = CpuState::new(CpuConfig::default()).unwrap();
        let mut io = BufferedPlatform::default();
        cpu.set_reg(Gpr::Eax, 0x0041);
        assert_eq!(
            software_interrupt(&mut cpu, &mut io, 0x10),
            Step::UnhandledInterrupt {
                vector: 0x10,
                function: Some(0x00),
            }
        );
        assert_eq!(
            software_interrupt(&mut cpu, &mut io, 0x21),
            Step::UnhandledInterrupt {
                vector: 0x21,
                function: None,
            }
        );
        assert!(io.glyphs().is_empty());
    }
}
