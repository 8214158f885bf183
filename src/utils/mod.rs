pub mod error;
#[cfg(test)]
pub(crate) mod test_log;

pub use error::{ErrorKind, ModbusError};
