pub mod client;
pub mod protocol;

pub use client::{ModbusClientTrait, ModbusTcpClient};
pub use protocol::{
    parse_adu, AduFrame, ExceptionCode, MbapHeader, ModbusResponse, ReadHoldingRegistersRequest,
};
