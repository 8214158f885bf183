use clap::ArgMatches;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::modbus::protocol::MAX_READ_REGISTERS;
use crate::utils::error::ModbusError;

pub const DEFAULT_PORT: u16 = 502;
pub const DEFAULT_START_ADDRESS: u16 = 0;
pub const DEFAULT_REGISTER_COUNT: u16 = 10;
pub const DEFAULT_UNIT_ID: u8 = 1;
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Console,
    Json,
    Csv,
    Hex,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Result<Self, ModbusError> {
        match value.to_ascii_lowercase().as_str() {
            "console" => Ok(Self::Console),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "hex" => Ok(Self::Hex),
            other => Err(ModbusError::ConfigError(format!("Unknown output format: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    // Connection settings
    pub host: String,
    pub port: u16,
    pub unit_id: u8,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,

    // Register block
    pub start_address: u16,
    pub count: u16,

    pub format: OutputFormat,
}

impl Default for ReaderConfig {
    /// The host has no usable default and must be supplied.
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            unit_id: DEFAULT_UNIT_ID,
            connect_timeout_ms: DEFAULT_TIMEOUT_MS,
            read_timeout_ms: DEFAULT_TIMEOUT_MS,
            start_address: DEFAULT_START_ADDRESS,
            count: DEFAULT_REGISTER_COUNT,
            format: OutputFormat::Console,
        }
    }
}

impl ReaderConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn from_matches(matches: &ArgMatches) -> Result<Self, ModbusError> {
        let mut config = Self::default();

        config.host = required(matches, "host")?.trim().to_string();
        config.port = required(matches, "port")?.parse()?;
        config.unit_id = required(matches, "unit-id")?.parse()?;
        config.start_address = required(matches, "address")?.parse()?;
        config.count = required(matches, "count")?.parse()?;
        config.connect_timeout_ms = required(matches, "connect-timeout-ms")?.parse()?;
        config.read_timeout_ms = required(matches, "read-timeout-ms")?.parse()?;
        config.format = OutputFormat::parse(required(matches, "format")?)?;

        config.validate()?;
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ModbusError> {
        if self.host.is_empty() {
            return Err(ModbusError::ConfigError("Server host is required".to_string()));
        }

        if self.count == 0 || self.count > MAX_READ_REGISTERS {
            return Err(ModbusError::ConfigError(format!(
                "Register count must be between 1 and {}, got {}",
                MAX_READ_REGISTERS, self.count
            )));
        }

        if self.start_address as u32 + self.count as u32 > 0x1_0000 {
            return Err(ModbusError::ConfigError(format!(
                "Reading {} registers from address {} runs past 65535",
                self.count, self.start_address
            )));
        }

        if self.connect_timeout_ms == 0 || self.read_timeout_ms == 0 {
            return Err(ModbusError::ConfigError("Timeouts must be greater than zero".to_string()));
        }

        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a String, ModbusError> {
    matches
        .get_one::<String>(name)
        .ok_or_else(|| ModbusError::ConfigError(format!("Missing argument --{}", name)))
}
