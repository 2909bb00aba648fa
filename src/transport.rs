use std::thread;
use std::time::{Duration, Instant};

use crate::ReaderError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Parity {
    None,
    Even,
    Odd,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

/// Line settings applied by `Transport::begin`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

impl Default for SerialConfig {
    // SDM meters ship at 4800 8N1
    fn default() -> Self {
        SerialConfig {
            baud_rate: 4800,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Byte stream to the meter.
///
/// Primitives follow stream semantics rather than `io::Result`: an
/// implementation that hits an I/O error logs it and reports nothing
/// available / nothing read, which the exchange resolves as a timeout or a
/// short read.
pub trait Transport {
    /// Apply line settings. Called once from `ModbusFloatReader::begin`.
    fn begin(&mut self, config: &SerialConfig) -> Result<(), ReaderError>;

    /// Number of received bytes ready to be read.
    fn available(&mut self) -> usize;

    fn read_byte(&mut self) -> Option<u8>;

    /// Queue bytes for sending. Returns how many were accepted.
    fn write(&mut self, data: &[u8]) -> usize;

    /// Block until all queued bytes left the wire.
    fn flush(&mut self);

    /// Software-emulated channels receive only while listening and only one
    /// of them can listen at a time.
    fn requires_listen(&self) -> bool {
        false
    }

    fn listen(&mut self) {}

    fn stop_listening(&mut self) {}
}

/// Driver-enable line of an RS-485 transceiver (high = transmit).
pub trait DirectionPin {
    fn set_output(&mut self);
    fn set_level(&mut self, high: bool);
}

/// Placeholder for point-to-point wiring without a transceiver.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoPin;

impl DirectionPin for NoPin {
    fn set_output(&mut self) {}
    fn set_level(&mut self, _high: bool) {}
}

/// Time source and scheduling hooks used by the exchange.
pub trait Clock {
    /// Monotonic time since an arbitrary origin.
    fn now(&self) -> Duration;

    fn delay(&mut self, duration: Duration);

    /// Give other cooperative work a chance to run while waiting for a reply.
    fn yield_now(&mut self);
}

#[derive(Debug)]
pub struct StdClock {
    origin: Instant,
}

impl StdClock {
    pub fn new() -> Self {
        StdClock { origin: Instant::now() }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn delay(&mut self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }

    fn yield_now(&mut self) {
        thread::yield_now();
    }
}
