//! One-shot Modbus TCP holding register reader
//!
//! Connects to a Modbus TCP server, issues a single Read Holding Registers
//! request, reports the values or a classified error, and closes the
//! connection on every exit path.

pub mod cli;
pub mod config;
pub mod modbus;
pub mod output;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::{OutputFormat, ReaderConfig};
pub use modbus::{ExceptionCode, ModbusClientTrait, ModbusTcpClient};
pub use output::{ConsoleFormatter, CsvFormatter, DataFormatter, HexFormatter, JsonFormatter};
pub use services::{read_once, RegisterReading};
pub use utils::error::{ErrorKind, ModbusError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
