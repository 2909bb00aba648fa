//! Full-duplex transport over an OS serial port (USB-RS485 dongles, UARTs).

use std::io::{Read, Write};

use log::warn;
use serialport::{DataBits, SerialPort};

use crate::transport::{Parity, SerialConfig, StopBits, Transport};
use crate::ReaderError;

pub struct HardwareSerial {
    port: Box<dyn SerialPort>,
}

impl HardwareSerial {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        HardwareSerial { port }
    }

    /// Open `path` at the default baud rate; `begin` applies the final settings.
    pub fn open(path: &str) -> Result<Self, ReaderError> {
        let port = serialport::new(path, SerialConfig::default().baud_rate)
            .open()
            .map_err(|e| ReaderError::Serial(e.to_string()))?;
        Ok(Self::new(port))
    }

    pub fn into_inner(self) -> Box<dyn SerialPort> {
        self.port
    }

    fn apply(&mut self, config: &SerialConfig) -> Result<(), ReaderError> {
        let data_bits = data_bits(config.data_bits)?;
        let parity = match config.parity {
            Parity::None => serialport::Parity::None,
            Parity::Even => serialport::Parity::Even,
            Parity::Odd => serialport::Parity::Odd,
        };
        let stop_bits = match config.stop_bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        };

        self.port
            .set_baud_rate(config.baud_rate)
            .and_then(|_| self.port.set_data_bits(data_bits))
            .and_then(|_| self.port.set_parity(parity))
            .and_then(|_| self.port.set_stop_bits(stop_bits))
            .and_then(|_| self.port.clear(serialport::ClearBuffer::Input))
            .map_err(|e| ReaderError::Serial(e.to_string()))
    }
}

fn data_bits(bits: u8) -> Result<DataBits, ReaderError> {
    match bits {
        5 => Ok(DataBits::Five),
        6 => Ok(DataBits::Six),
        7 => Ok(DataBits::Seven),
        8 => Ok(DataBits::Eight),
        other => Err(ReaderError::Serial(format!("Unsupported data bits: {}", other))),
    }
}

impl Transport for HardwareSerial {
    fn begin(&mut self, config: &SerialConfig) -> Result<(), ReaderError> {
        self.apply(config)
    }

    fn available(&mut self) -> usize {
        match self.port.bytes_to_read() {
            Ok(count) => count as usize,
            Err(e) => {
                warn!("serial bytes_to_read failed: {}", e);
                0
            }
        }
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut buf = [0u8; 1];
        match self.port.read(&mut buf) {
            Ok(1) => Some(buf[0]),
            Ok(_) => None,
            Err(e) => {
                warn!("serial read failed: {}", e);
                None
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> usize {
        match self.port.write_all(data) {
            Ok(()) => data.len(),
            Err(e) => {
                warn!("serial write failed: {}", e);
                0
            }
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.port.flush() {
            warn!("serial flush failed: {}", e);
        }
    }
}
