//! Serial device adapter.
//!
//! Implements [`TelemetryChannel`] over a `serialport` handle. Opening the
//! port resets most USB boards, so [`SerialChannel::open`] waits for the
//! configured settle delay and discards whatever the bootloader printed.

use std::io::{self, Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, trace};
use serialport::{ClearBuffer, SerialPort};

use crate::app::ports::TelemetryChannel;
use crate::error::ChannelError;

const READ_CHUNK: usize = 256;

/// Longest unterminated tail kept while waiting for `\n`. Real frames are
/// a few dozen bytes.
const MAX_LINE: usize = 1024;

/// Concrete [`TelemetryChannel`] backed by a serial port.
pub struct SerialChannel {
    name: String,
    port: Option<Box<dyn SerialPort>>,
    timeout: Duration,
    lines: LineBuffer,
}

impl SerialChannel {
    /// Open `port` at `baud_rate`. Fails with [`ChannelError::Open`] when the
    /// device is missing, busy or not permitted.
    pub fn open(
        port: &str,
        baud_rate: u32,
        timeout: Duration,
        settle: Duration,
    ) -> Result<Self, ChannelError> {
        let handle = serialport::new(port, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|source| ChannelError::Open {
                port: port.to_string(),
                source,
            })?;

        if !settle.is_zero() {
            debug!("waiting {settle:?} for {port} to settle");
            thread::sleep(settle);
        }
        handle
            .clear(ClearBuffer::Input)
            .map_err(|source| ChannelError::Open {
                port: port.to_string(),
                source,
            })?;

        info!("serial port {port} open at {baud_rate} baud");
        Ok(Self {
            name: port.to_string(),
            port: Some(handle),
            timeout,
            lines: LineBuffer::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn closed() -> ChannelError {
        ChannelError::Io(io::Error::new(io::ErrorKind::NotConnected, "port closed"))
    }
}

impl TelemetryChannel for SerialChannel {
    fn read_line(&mut self) -> Result<Vec<u8>, ChannelError> {
        let Some(port) = self.port.as_mut() else {
            return Err(Self::closed());
        };
        let deadline = Instant::now() + self.timeout;
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            if let Some(line) = self.lines.next_line() {
                return Ok(line);
            }
            let Some(remaining) = remaining_until(deadline, Instant::now()) else {
                return Ok(Vec::new());
            };
            port.set_timeout(remaining).map_err(|e| ChannelError::Io(e.into()))?;
            match port.read(&mut chunk) {
                Ok(0) => return Ok(Vec::new()),
                Ok(n) => self.lines.push(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => return Ok(Vec::new()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn send_command(&mut self, command: &str) -> Result<(), ChannelError> {
        let Some(port) = self.port.as_mut() else {
            return Err(Self::closed());
        };
        port.write_all(command.as_bytes())?;
        port.write_all(b"\n")?;
        port.flush()?;
        debug!("sent {command:?} to {}", self.name);
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            info!("serial port {} closed", self.name);
        }
    }
}

impl Drop for SerialChannel {
    fn drop(&mut self) {
        self.close();
    }
}

/// Time left before `deadline`, or `None` once it has passed.
fn remaining_until(deadline: Instant, now: Instant) -> Option<Duration> {
    let left = deadline.saturating_duration_since(now);
    (!left.is_zero()).then_some(left)
}

// ── Line framing ──────────────────────────────────────────────

/// Accumulates raw bytes and yields complete `\n`-terminated lines.
#[derive(Debug, Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Append raw bytes. An unterminated tail longer than [`MAX_LINE`] is
    /// noise and gets dropped.
    fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
        let tail = self
            .pending
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |end| end + 1);
        if self.pending.len() - tail > MAX_LINE {
            trace!("skip: {} bytes without a line terminator", self.pending.len() - tail);
            self.pending.truncate(tail);
        }
    }

    /// Next complete line including its terminator.
    fn next_line(&mut self) -> Option<Vec<u8>> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        Some(self.pending.drain(..=end).collect())
    }
}
