use std::time::Duration;
use thiserror::Error;

use crate::modbus::protocol::ExceptionCode;

/// Coarse classification used for logging and process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failed: refused, unreachable, reset, timed out.
    Connection,
    /// Device answered, but with an exception or an unusable frame.
    Protocol,
    /// Invalid input from the caller; nothing was sent.
    Usage,
}

#[derive(Error, Debug)]
pub enum ModbusError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Timeout occurred after {0:?}")]
    Timeout(Duration),

    #[error("Not connected to Modbus server")]
    NotConnected,

    #[error("Modbus exception response: {0}")]
    Exception(ExceptionCode),

    #[error("Invalid response from device: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ModbusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModbusError::ConnectionError(_) | ModbusError::Timeout(_) | ModbusError::NotConnected => {
                ErrorKind::Connection
            }
            ModbusError::Exception(_) | ModbusError::InvalidResponse(_) => ErrorKind::Protocol,
            ModbusError::InvalidRequest(_) | ModbusError::ConfigError(_) => ErrorKind::Usage,
        }
    }

    pub fn is_connection_error(&self) -> bool {
        self.kind() == ErrorKind::Connection
    }

    pub fn is_protocol_error(&self) -> bool {
        self.kind() == ErrorKind::Protocol
    }

    /// Exception code carried by an exception response, if any.
    pub fn exception_code(&self) -> Option<ExceptionCode> {
        match self {
            ModbusError::Exception(code) => Some(*code),
            _ => None,
        }
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Usage => 2,
            ErrorKind::Connection => 3,
            ErrorKind::Protocol => 4,
        }
    }
}

impl From<std::io::Error> for ModbusError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => {
                ModbusError::ConnectionError("Connection closed by peer".to_string())
            }
            _ => ModbusError::ConnectionError(format!("IO error: {}", err)),
        }
    }
}

impl From<std::num::ParseIntError> for ModbusError {
    fn from(err: std::num::ParseIntError) -> Self {
        ModbusError::ConfigError(format!("Invalid number: {}", err))
    }
}
