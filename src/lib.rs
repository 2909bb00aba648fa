// lib.rs

mod core;
mod modbus_rtu;
mod stats;
mod transport;

#[cfg(feature = "serialport")]
pub mod serial;

pub use crate::core::{
    build_request, calculate_crc, decode_float, parse_response, ReadError, FUNCTION_CODE,
    REGISTER_COUNT, REPLY_BYTE_COUNT, REQUEST_FRAME_SIZE, RESPONSE_FRAME_SIZE,
};
pub use crate::modbus_rtu::{Direction, ModbusFloatReader, ModbusFloatReaderBuilder};
pub use crate::stats::Statistics;
pub use crate::transport::{
    Clock, DirectionPin, NoPin, Parity, SerialConfig, StdClock, StopBits, Transport,
};

#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("Transport not set")]
    TransportMissing,

    #[error("Invalid slave address: {0}, expected 1..=247")]
    InvalidSlaveAddress(u8),

    #[error("Response timeout must be greater than zero")]
    InvalidTimeout,

    #[error("Serial port error: {0}")]
    Serial(String),
}
