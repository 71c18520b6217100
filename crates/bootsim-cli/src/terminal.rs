//! Host-side sinks: ANSI rendering of teletype output and a line-based console on COM1.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use bootsim_cpu::{DisplaySink, Glyph, SerialConsole};

/// Renders each glyph as `ESC[{bright};{color}m{ch}ESC[0m`.
///
/// [`DisplaySink`] has no error channel, so the first write error is kept and reported by
/// [`AnsiTerminal::flush`].
pub struct AnsiTerminal<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> AnsiTerminal<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DisplaySink for AnsiTerminal<W> {
    fn put_glyph(&mut self, glyph: Glyph) {
        if self.error.is_some() {
            return;
        }
        // Stdout is line-buffered and glyphs carry no newline, so flush each one.
        let res = write!(
            self.out,
            "\x1b[{};{}m{}\x1b[0m",
            glyph.bright as u8,
            glyph.color.ansi_code(),
            glyph.ch as char
        )
        .and_then(|_| self.out.flush());
        if let Err(err) = res {
            tracing::warn!("teletype output failed: {err}");
            self.error = Some(err);
        }
    }
}

/// COM1 backed by the host console.
///
/// Reads take the next whitespace-separated decimal number from `input` and truncate it to a
/// byte; EOF or an unparsable token reads as 0. Writes go to `output` unmodified.
pub struct StdioSerial<R, W> {
    input: R,
    output: W,
    pending: VecDeque<String>,
}

impl<R: BufRead> StdioSerial<R, io::Stdout> {
    pub fn new(input: R) -> Self {
        Self::with_output(input, io::stdout())
    }
}

impl<R: BufRead, W: Write> StdioSerial<R, W> {
    pub fn with_output(input: R, output: W) -> Self {
        Self {
            input,
            output,
            pending: VecDeque::new(),
        }
    }

    fn next_token(&mut self) -> Option<String> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => self
                    .pending
                    .extend(line.split_whitespace().map(str::to_owned)),
                Err(err) => {
                    tracing::warn!("console read failed: {err}");
                    return None;
                }
            }
        }
    }
}

impl<R: BufRead, W: Write> SerialConsole for StdioSerial<R, W> {
    fn read_byte(&mut self) -> u8 {
        match self.next_token() {
            Some(token) => token.parse::<u32>().map(|v| v as u8).unwrap_or(0),
            None => 0,
        }
    }

    fn write_byte(&mut self, value: u8) {
        if let Err(err) = self.output.write_all(&[value]).and_then(|_| self.output.flush()) {
            tracing::warn!("console write failed: {err}");
        }
    }
}
