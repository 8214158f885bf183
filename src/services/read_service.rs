use chrono::{DateTime, Utc};
use log::{debug, error, info};
use serde::Serialize;

use crate::config::ReaderConfig;
use crate::modbus::{ModbusClientTrait, ModbusTcpClient};
use crate::utils::error::ModbusError;

/// Result of one successful read cycle.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterReading {
    pub host: String,
    pub port: u16,
    pub unit_id: u8,
    pub start_address: u16,
    pub timestamp: DateTime<Utc>,
    pub values: Vec<u16>,
}

impl RegisterReading {
    /// (address, value) pairs in request order.
    pub fn addressed_values(&self) -> impl Iterator<Item = (u32, u16)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(move |(offset, value)| (self.start_address as u32 + offset as u32, *value))
    }
}

/// Connect, issue a single Read Holding Registers request and close.
///
/// The client is closed on every path out of this function, including a
/// failed connect. Nothing is retried.
pub async fn read_once<C>(client: &mut C, start_address: u16, count: u16) -> Result<Vec<u16>, ModbusError>
where
    C: ModbusClientTrait + ?Sized,
{
    if let Err(e) = client.connect().await {
        debug!("Skipping read, connect failed: {}", e);
        client.close().await;
        return Err(e);
    }
    info!("Connected to Modbus server");

    let result = client.read_holding_registers(start_address, count).await;
    client.close().await;

    match &result {
        Ok(values) => info!("Register values: {:?}", values),
        Err(e) => error!("Error reading registers: {}", e),
    }

    result
}

/// Run one read cycle against the server described by `config`.
pub async fn run(config: &ReaderConfig) -> Result<RegisterReading, ModbusError> {
    config.validate()?;

    let mut client = ModbusTcpClient::new(config);
    let values = read_once(&mut client, config.start_address, config.count).await?;

    Ok(RegisterReading {
        host: config.host.clone(),
        port: config.port,
        unit_id: config.unit_id,
        start_address: config.start_address,
        timestamp: Utc::now(),
        values,
    })
}
