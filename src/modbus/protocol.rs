//! Modbus TCP framing: MBAP header, Read Holding Registers PDU and
//! exception responses.

use bytes::{Buf, BufMut, BytesMut};
use std::fmt;

use crate::utils::error::ModbusError;

pub const READ_HOLDING_REGISTERS: u8 = 0x03;
pub const EXCEPTION_FLAG: u8 = 0x80;
pub const MODBUS_PROTOCOL_ID: u16 = 0;
pub const MBAP_HEADER_LEN: usize = 7;
/// Largest PDU allowed by the Modbus application protocol.
pub const MAX_PDU_LEN: usize = 253;
pub const MAX_READ_REGISTERS: u16 = 125;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionCode {
    IllegalFunction,
    IllegalDataAddress,
    IllegalDataValue,
    ServerDeviceFailure,
    Acknowledge,
    ServerDeviceBusy,
    MemoryParityError,
    GatewayPathUnavailable,
    GatewayTargetFailedToRespond,
    Unknown(u8),
}

impl ExceptionCode {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x01 => Self::IllegalFunction,
            0x02 => Self::IllegalDataAddress,
            0x03 => Self::IllegalDataValue,
            0x04 => Self::ServerDeviceFailure,
            0x05 => Self::Acknowledge,
            0x06 => Self::ServerDeviceBusy,
            0x08 => Self::MemoryParityError,
            0x0A => Self::GatewayPathUnavailable,
            0x0B => Self::GatewayTargetFailedToRespond,
            other => Self::Unknown(other),
        }
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            Self::IllegalFunction => 0x01,
            Self::IllegalDataAddress => 0x02,
            Self::IllegalDataValue => 0x03,
            Self::ServerDeviceFailure => 0x04,
            Self::Acknowledge => 0x05,
            Self::ServerDeviceBusy => 0x06,
            Self::MemoryParityError => 0x08,
            Self::GatewayPathUnavailable => 0x0A,
            Self::GatewayTargetFailedToRespond => 0x0B,
            Self::Unknown(code) => *code,
        }
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::IllegalFunction => "Illegal Function",
            Self::IllegalDataAddress => "Illegal Data Address",
            Self::IllegalDataValue => "Illegal Data Value",
            Self::ServerDeviceFailure => "Server Device Failure",
            Self::Acknowledge => "Acknowledge",
            Self::ServerDeviceBusy => "Server Device Busy",
            Self::MemoryParityError => "Memory Parity Error",
            Self::GatewayPathUnavailable => "Gateway Path Unavailable",
            Self::GatewayTargetFailedToRespond => "Gateway Target Device Failed to Respond",
            Self::Unknown(_) => "Unknown Exception",
        };
        write!(f, "{} (0x{:02X})", name, self.as_byte())
    }
}

/// Modbus Application Protocol header that prefixes every TCP frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbapHeader {
    pub transaction_id: u16,
    pub protocol_id: u16,
    /// Number of bytes that follow, unit id included.
    pub length: u16,
    pub unit_id: u8,
}

impl MbapHeader {
    pub fn encode(&self) -> [u8; MBAP_HEADER_LEN] {
        let t = self.transaction_id.to_be_bytes();
        let p = self.protocol_id.to_be_bytes();
        let l = self.length.to_be_bytes();
        [t[0], t[1], p[0], p[1], l[0], l[1], self.unit_id]
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, ModbusError> {
        if bytes.len() < MBAP_HEADER_LEN {
            return Err(ModbusError::InvalidResponse(format!(
                "MBAP header needs {} bytes, got {}",
                MBAP_HEADER_LEN,
                bytes.len()
            )));
        }

        let mut buf = &bytes[..MBAP_HEADER_LEN];
        Ok(Self {
            transaction_id: buf.get_u16(),
            protocol_id: buf.get_u16(),
            length: buf.get_u16(),
            unit_id: buf.get_u8(),
        })
    }

    /// Length of the PDU that follows this header.
    pub fn pdu_len(&self) -> Result<usize, ModbusError> {
        if self.protocol_id != MODBUS_PROTOCOL_ID {
            return Err(ModbusError::InvalidResponse(format!(
                "Unexpected protocol id {}",
                self.protocol_id
            )));
        }

        // length covers the unit id plus at least a function code
        let pdu_len = (self.length as usize).saturating_sub(1);
        if pdu_len == 0 || pdu_len > MAX_PDU_LEN {
            return Err(ModbusError::InvalidResponse(format!(
                "MBAP length {} out of range",
                self.length
            )));
        }
        Ok(pdu_len)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadHoldingRegistersRequest {
    pub unit_id: u8,
    pub start_address: u16,
    pub count: u16,
}

impl ReadHoldingRegistersRequest {
    pub fn new(unit_id: u8, start_address: u16, count: u16) -> Result<Self, ModbusError> {
        if count == 0 || count > MAX_READ_REGISTERS {
            return Err(ModbusError::InvalidRequest(format!(
                "Register count {} must be between 1 and {}",
                count, MAX_READ_REGISTERS
            )));
        }

        if start_address as u32 + count as u32 > 0x1_0000 {
            return Err(ModbusError::InvalidRequest(format!(
                "Range {}+{} exceeds the 16-bit address space",
                start_address, count
            )));
        }

        Ok(Self {
            unit_id,
            start_address,
            count,
        })
    }

    /// Full ADU for this request: MBAP header followed by the 5-byte PDU.
    pub fn encode(&self, transaction_id: u16) -> BytesMut {
        let header = MbapHeader {
            transaction_id,
            protocol_id: MODBUS_PROTOCOL_ID,
            length: 6,
            unit_id: self.unit_id,
        };

        let mut frame = BytesMut::with_capacity(MBAP_HEADER_LEN + 5);
        frame.put_slice(&header.encode());
        frame.put_u8(READ_HOLDING_REGISTERS);
        frame.put_u16(self.start_address);
        frame.put_u16(self.count);
        frame
    }

    /// Decode the PDU that answered this request.
    pub fn decode_response(&self, pdu: &[u8]) -> Result<ModbusResponse, ModbusError> {
        let Some((&function_code, body)) = pdu.split_first() else {
            return Err(ModbusError::InvalidResponse("Empty PDU".to_string()));
        };
        self.decode_parts(function_code, body)
    }

    /// Decode a complete frame already split by [`parse_adu`].
    pub fn decode_frame(&self, frame: &AduFrame) -> Result<ModbusResponse, ModbusError> {
        self.decode_parts(frame.function_code, &frame.data)
    }

    fn decode_parts(&self, function_code: u8, mut body: &[u8]) -> Result<ModbusResponse, ModbusError> {
        if function_code == READ_HOLDING_REGISTERS | EXCEPTION_FLAG {
            return match body {
                [code] => Ok(ModbusResponse::Exception(ExceptionCode::from_byte(*code))),
                _ => Err(ModbusError::InvalidResponse(format!(
                    "Exception PDU has {} bytes after function code",
                    body.len()
                ))),
            };
        }

        if function_code & EXCEPTION_FLAG != 0 {
            let code = match body.first() {
                Some(code) => ExceptionCode::from_byte(*code).to_string(),
                None => "missing".to_string(),
            };
            return Err(ModbusError::InvalidResponse(format!(
                "Exception response for unexpected function code 0x{:02X}, exception {}",
                function_code, code
            )));
        }

        if function_code != READ_HOLDING_REGISTERS {
            return Err(ModbusError::InvalidResponse(format!(
                "Unexpected function code 0x{:02X}",
                function_code
            )));
        }

        let expected = self.count as usize * 2;
        let byte_count = body.first().copied().map(usize::from);
        if byte_count != Some(expected) || body.len() != expected + 1 {
            return Err(ModbusError::InvalidResponse(format!(
                "Expected {} data bytes for {} registers, got byte count {:?} with {} bytes",
                expected,
                self.count,
                byte_count,
                body.len().saturating_sub(1)
            )));
        }

        body.advance(1);
        let registers = (0..self.count).map(|_| body.get_u16()).collect();
        Ok(ModbusResponse::Registers(registers))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModbusResponse {
    Registers(Vec<u16>),
    Exception(ExceptionCode),
}

/// A raw Modbus TCP ADU split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AduFrame {
    pub header: MbapHeader,
    pub function_code: u8,
    pub data: Vec<u8>,
}

impl AduFrame {
    pub fn is_exception(&self) -> bool {
        self.function_code & EXCEPTION_FLAG != 0
    }
}

/// Split a complete Modbus TCP frame. Function code 0 is rejected,
/// as is a bare exception flag with no function behind it.
pub fn parse_adu(payload: &[u8]) -> Result<AduFrame, ModbusError> {
    if payload.len() < MBAP_HEADER_LEN + 1 {
        return Err(ModbusError::InvalidResponse(format!(
            "Frame too short: {} bytes",
            payload.len()
        )));
    }

    let header = MbapHeader::parse(payload)?;
    let pdu_len = header.pdu_len()?;
    if payload.len() != MBAP_HEADER_LEN + pdu_len {
        return Err(ModbusError::InvalidResponse(format!(
            "MBAP length {} does not match frame of {} bytes",
            header.length,
            payload.len()
        )));
    }

    let function_code = payload[MBAP_HEADER_LEN];
    if function_code & !EXCEPTION_FLAG == 0 {
        return Err(ModbusError::InvalidResponse(format!(
            "Invalid function code 0x{:02X}",
            function_code
        )));
    }

    Ok(AduFrame {
        header,
        function_code,
        data: payload[MBAP_HEADER_LEN + 1..].to_vec(),
    })
}
