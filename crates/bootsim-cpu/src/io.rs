//! Port I/O and display plumbing between the interpreter and its host.

use std::collections::VecDeque;

use crate::bios::Glyph;

/// The one wired I/O port: the first serial port, used as a character console.
pub const COM1_PORT: u16 = 0x3F8;

/// Everything the interpreter calls outside the processor state.
pub trait Platform {
    fn io_in8(&mut self, port: u16) -> u8;
    fn io_out8(&mut self, port: u16, value: u8);
    /// Output of the BIOS teletype service.
    fn teletype(&mut self, glyph: Glyph);
}

/// Renders teletype output.
pub trait DisplaySink {
    fn put_glyph(&mut self, glyph: Glyph);
}

/// Host side of [`COM1_PORT`].
pub trait SerialConsole {
    fn read_byte(&mut self) -> u8;
    fn write_byte(&mut self, value: u8);
}

/// [`Platform`] that routes [`COM1_PORT`] to a serial console and teletype output to a display.
///
/// All other ports are unmapped: reads return 0, writes are dropped.
#[derive(Debug, Default)]
pub struct IoBus<D, S> {
    pub display: D,
    pub serial: S,
}

impl<D, S> IoBus<D, S> {
    pub fn new(display: D, serial: S) -> Self {
        Self { display, serial }
    }
}

impl<D: DisplaySink, S: SerialConsole> Platform for IoBus<D, S> {
    fn io_in8(&mut self, port: u16) -> u8 {
        match port {
            COM1_PORT => self.serial.read_byte(),
            _ => {
                tracing::trace!(port, "read from unmapped port");
                0
            }
        }
    }

    fn io_out8(&mut self, port: u16, value: u8) {
        match port {
            COM1_PORT => self.serial.write_byte(value),
            _ => tracing::trace!(port, value, "write to unmapped port"),
        }
    }

    fn teletype(&mut self, glyph: Glyph) {
        self.display.put_glyph(glyph);
    }
}

impl DisplaySink for Vec<Glyph> {
    fn put_glyph(&mut self, glyph: Glyph) {
        self.push(glyph);
    }
}

/// In-memory serial console: reads drain `input` (0 once empty), writes append to `output`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferedSerial {
    pub input: VecDeque<u8>,
    pub output: Vec<u8>,
}

impl SerialConsole for BufferedSerial {
    fn read_byte(&mut self) -> u8 {
        self.input.pop_front().unwrap_or(0)
    }

    fn write_byte(&mut self, value: u8) {
        self.output.push(value);
    }
}

pub type BufferedPlatform = IoBus<Vec<Glyph>, BufferedSerial>;

impl BufferedPlatform {
    pub fn with_input(input: &[u8]) -> Self {
        IoBus::new(
            Vec::new(),
            BufferedSerial {
                input: input.iter().copied().collect(),
                output: Vec::new(),
            },
        )
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.display
    }

    pub fn serial_output(&self) -> &[u8] {
        &self.serial.output
    }
}
