use thiserror::Error;

/// Read input registers.
pub const FUNCTION_CODE: u8 = 0x04;
/// One IEEE-754 float spans two 16-bit registers.
pub const REGISTER_COUNT: u16 = 0x0002;
/// Byte count field expected in the reply (2 registers * 2 bytes).
pub const REPLY_BYTE_COUNT: u8 = 0x04;

pub const REQUEST_FRAME_SIZE: usize = 8;
pub const RESPONSE_FRAME_SIZE: usize = 9;

#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
pub enum ReadError {
    #[error("CRC mismatch in reply")]
    CrcError,

    #[error("Unexpected header bytes in reply")]
    UnexpectedHeaderBytes,

    #[error("Not enough bytes received")]
    InsufficientBytes,

    #[error("No reply before timeout")]
    Timeout,
}

impl ReadError {
    /// Numeric error code; 0 is reserved for "no error".
    pub fn code(&self) -> u16 {
        match self {
            ReadError::CrcError => 1,
            ReadError::UnexpectedHeaderBytes => 2,
            ReadError::InsufficientBytes => 3,
            ReadError::Timeout => 4,
        }
    }
}

/// CRC-16/Modbus (poly 0xA001 reflected, init 0xFFFF, no final xor).
///
/// Callers pass exactly the bytes that are covered: the first 6 bytes of a
/// request, or the first 7 bytes of a reply.
pub fn calculate_crc(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            let carry = crc & 0x0001;
            crc >>= 1;
            if carry != 0 {
                crc ^= 0xA001;
            }
        }
    }
    crc
}

/// Build the 8 byte read request for one float register.
pub fn build_request(slave: u8, register: u16) -> [u8; REQUEST_FRAME_SIZE] {
    let mut frame: [u8; REQUEST_FRAME_SIZE] = [0; REQUEST_FRAME_SIZE];
    frame[0] = slave;
    frame[1] = FUNCTION_CODE;
    frame[2] = (register >> 8) as u8;
    frame[3] = register as u8;
    frame[4] = (REGISTER_COUNT >> 8) as u8;
    frame[5] = REGISTER_COUNT as u8;

    let crc = calculate_crc(&frame[..REQUEST_FRAME_SIZE - 2]);
    frame[6] = crc as u8;
    frame[7] = (crc >> 8) as u8;
    frame
}

/// Validate a complete reply and decode its payload.
///
/// Header bytes are checked before the CRC, so a reply from the wrong slave
/// reports `UnexpectedHeaderBytes` even when its checksum is also broken.
pub fn parse_response(frame: &[u8; RESPONSE_FRAME_SIZE], slave: u8) -> Result<f32, ReadError> {
    if frame[0] != slave || frame[1] != FUNCTION_CODE || frame[2] != REPLY_BYTE_COUNT {
        return Err(ReadError::UnexpectedHeaderBytes);
    }

    let received_crc =
        (frame[RESPONSE_FRAME_SIZE - 1] as u16) << 8 | frame[RESPONSE_FRAME_SIZE - 2] as u16;
    let calculated_crc = calculate_crc(&frame[..RESPONSE_FRAME_SIZE - 2]);
    if received_crc != calculated_crc {
        return Err(ReadError::CrcError);
    }

    Ok(decode_float([frame[3], frame[4], frame[5], frame[6]]))
}

// Payload byte 0 is the most significant byte of the float. This matches
// captures from SDM meters; other vendors may swap register order.
pub fn decode_float(payload: [u8; 4]) -> f32 {
    f32::from_be_bytes(payload)
}
