use std::time::Duration;

use log::{debug, trace, warn};

use crate::core::{build_request, parse_response, ReadError, RESPONSE_FRAME_SIZE};
use crate::stats::Statistics;
use crate::transport::{Clock, DirectionPin, NoPin, SerialConfig, StdClock, Transport};
use crate::ReaderError;

const DEFAULT_SLAVE_ADDRESS: u8 = 0x01;
const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_millis(500);
// some MAX485 boards return garbage if the first byte follows DE too closely
const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(2);
const DEFAULT_DRAIN_LIMIT: usize = 10;
const DRAIN_PACING: Duration = Duration::from_millis(1);

/// State of the transceiver driver-enable line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Transmit,
    Receive,
}

pub struct ModbusFloatReaderBuilder<T, P = NoPin, C = StdClock> {
    transport: Option<T>,
    direction_pin: Option<P>,
    clock: C,
    serial_config: SerialConfig,
    slave_address: u8,
    response_timeout: Duration,
    settle_delay: Duration,
    drain_limit: usize,
}

impl<T: Transport, P: DirectionPin, C: Clock> ModbusFloatReaderBuilder<T, P, C> {
    pub fn transport(mut self, transport: T) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn direction_pin<Q: DirectionPin>(self, pin: Q) -> ModbusFloatReaderBuilder<T, Q, C> {
        ModbusFloatReaderBuilder {
            transport: self.transport,
            direction_pin: Some(pin),
            clock: self.clock,
            serial_config: self.serial_config,
            slave_address: self.slave_address,
            response_timeout: self.response_timeout,
            settle_delay: self.settle_delay,
            drain_limit: self.drain_limit,
        }
    }

    pub fn clock<D: Clock>(self, clock: D) -> ModbusFloatReaderBuilder<T, P, D> {
        ModbusFloatReaderBuilder {
            transport: self.transport,
            direction_pin: self.direction_pin,
            clock,
            serial_config: self.serial_config,
            slave_address: self.slave_address,
            response_timeout: self.response_timeout,
            settle_delay: self.settle_delay,
            drain_limit: self.drain_limit,
        }
    }

    pub fn serial_config(mut self, serial_config: SerialConfig) -> Self {
        self.serial_config = serial_config;
        self
    }

    /// Slave used by `ModbusFloatReader::read`.
    pub fn slave_address(mut self, slave_address: u8) -> Self {
        self.slave_address = slave_address;
        self
    }

    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Upper bound of stale bytes discarded per drain.
    pub fn drain_limit(mut self, limit: usize) -> Self {
        self.drain_limit = limit;
        self
    }

    pub fn build(self) -> Result<ModbusFloatReader<T, P, C>, ReaderError> {
        let transport = self.transport.ok_or(ReaderError::TransportMissing)?;

        if !(1..=247).contains(&self.slave_address) {
            return Err(ReaderError::InvalidSlaveAddress(self.slave_address));
        }
        if self.response_timeout.is_zero() {
            return Err(ReaderError::InvalidTimeout);
        }

        Ok(ModbusFloatReader {
            transport,
            direction_pin: self.direction_pin,
            clock: self.clock,
            serial_config: self.serial_config,
            slave_address: self.slave_address,
            response_timeout: self.response_timeout,
            settle_delay: self.settle_delay,
            drain_limit: self.drain_limit,
            stats: Statistics::new(),
        })
    }
}

/// Modbus RTU master reading 32-bit float input registers over a
/// half-duplex line.
///
/// One exchange at a time: the reader exclusively owns its transport and
/// direction pin, and `read_float_register` must not be re-entered from a
/// `Clock::yield_now` hook.
pub struct ModbusFloatReader<T, P = NoPin, C = StdClock> {
    transport: T,
    direction_pin: Option<P>,
    clock: C,
    serial_config: SerialConfig,
    slave_address: u8,
    response_timeout: Duration,
    settle_delay: Duration,
    drain_limit: usize,
    stats: Statistics,
}

impl<T: Transport> ModbusFloatReader<T, NoPin, StdClock> {
    /// Create new builder with default timing and 4800 8N1 line settings
    pub fn builder() -> ModbusFloatReaderBuilder<T> {
        ModbusFloatReaderBuilder {
            transport: None,
            direction_pin: None,
            clock: StdClock::new(),
            serial_config: SerialConfig::default(),
            slave_address: DEFAULT_SLAVE_ADDRESS,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            drain_limit: DEFAULT_DRAIN_LIMIT,
        }
    }
}

impl<T: Transport, P: DirectionPin, C: Clock> ModbusFloatReader<T, P, C> {
    /// Configure the transport and put the line into receive mode.
    pub fn begin(&mut self) -> Result<(), ReaderError> {
        self.transport.begin(&self.serial_config)?;
        if let Some(pin) = self.direction_pin.as_mut() {
            pin.set_output();
        }
        self.set_direction(Direction::Receive);
        Ok(())
    }

    pub fn set_direction(&mut self, direction: Direction) {
        if let Some(pin) = self.direction_pin.as_mut() {
            trace!("direction -> {:?}", direction);
            pin.set_level(direction == Direction::Transmit);
        }
    }

    /// Discard stale input, at most `drain_limit` bytes. Returns how many
    /// bytes were dropped.
    pub fn drain(&mut self) -> usize {
        let mut dropped = 0;
        while dropped < self.drain_limit && self.transport.available() > 0 {
            if self.transport.read_byte().is_none() {
                break;
            }
            dropped += 1;
            self.clock.delay(DRAIN_PACING);
        }
        if dropped > 0 {
            trace!("drained {} stale bytes", dropped);
        }
        dropped
    }

    /// Read one float; `f32::NAN` on failure with the cause kept in
    /// `error_code`.
    pub fn read_float_register(&mut self, register: u16, slave: u8) -> f32 {
        self.try_read_float_register(register, slave)
            .unwrap_or(f32::NAN)
    }

    /// Read one float from the configured default slave.
    pub fn read(&mut self, register: u16) -> f32 {
        self.read_float_register(register, self.slave_address)
    }

    /// Same exchange and bookkeeping as `read_float_register`, with the
    /// failure cause returned directly.
    pub fn try_read_float_register(
        &mut self,
        register: u16,
        slave: u8,
    ) -> Result<f32, ReadError> {
        let request = build_request(slave, register);
        let listening = self.transport.requires_listen();
        if listening {
            self.transport.listen();
        }

        self.drain();
        self.send(&request);

        let result = self
            .await_reply()
            .and_then(|frame| parse_response(&frame, slave));
        if let Err(err) = &result {
            warn!("read of register {:#06x} from slave {} failed: {}", register, slave, err);
        }
        self.stats.record(&result);

        self.drain();
        if listening {
            self.transport.stop_listening();
        }
        result
    }

    fn send(&mut self, request: &[u8]) {
        debug!("request: {:02X?}", request);
        self.set_direction(Direction::Transmit);
        self.clock.delay(self.settle_delay);

        let written = self.transport.write(request);
        if written != request.len() {
            warn!("short write: {} of {} bytes", written, request.len());
        }
        self.transport.flush();

        self.set_direction(Direction::Receive);
    }

    fn await_reply(&mut self) -> Result<[u8; RESPONSE_FRAME_SIZE], ReadError> {
        let sent_at = self.clock.now();
        while self.transport.available() < RESPONSE_FRAME_SIZE {
            if self.clock.now().saturating_sub(sent_at) > self.response_timeout {
                return Err(ReadError::Timeout);
            }
            self.clock.yield_now();
        }

        if self.transport.available() < RESPONSE_FRAME_SIZE {
            return Err(ReadError::InsufficientBytes);
        }

        let mut frame = [0u8; RESPONSE_FRAME_SIZE];
        for byte in frame.iter_mut() {
            *byte = self.transport.read_byte().ok_or(ReadError::InsufficientBytes)?;
        }
        debug!("response: {:02X?}", frame);
        Ok(frame)
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn error_code(&mut self, clear: bool) -> Option<ReadError> {
        self.stats.error_code(clear)
    }

    /// Numeric form of `error_code`, 0 when no error is pending.
    pub fn error_code_raw(&mut self, clear: bool) -> u16 {
        self.stats.error_code_raw(clear)
    }

    pub fn error_count(&mut self, clear: bool) -> u32 {
        self.stats.error_count(clear)
    }

    pub fn success_count(&mut self, clear: bool) -> u32 {
        self.stats.success_count(clear)
    }

    pub fn clear_error_code(&mut self) {
        self.stats.clear_error_code();
    }

    pub fn clear_error_count(&mut self) {
        self.stats.clear_error_count();
    }

    pub fn clear_success_count(&mut self) {
        self.stats.clear_success_count();
    }
}
