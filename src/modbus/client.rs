use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::protocol::{
    parse_adu, AduFrame, MbapHeader, ModbusResponse, ReadHoldingRegistersRequest, MBAP_HEADER_LEN,
};
use crate::config::settings::ReaderConfig;
use crate::utils::error::ModbusError;

#[async_trait]
pub trait ModbusClientTrait: Send {
    /// Open the transport. Refused, unreachable and timed-out connects
    /// come back as connection errors.
    async fn connect(&mut self) -> Result<(), ModbusError>;

    async fn read_holding_registers(
        &mut self,
        start_addr: u16,
        count: u16,
    ) -> Result<Vec<u16>, ModbusError>;

    /// Release the transport. Safe to call when already closed.
    async fn close(&mut self);

    fn is_connected(&self) -> bool;
}

pub struct ModbusTcpClient {
    host: String,
    port: u16,
    unit_id: u8,
    connect_timeout: Duration,
    read_timeout: Duration,
    stream: Option<TcpStream>,
    transaction_id: u16,
}

impl ModbusTcpClient {
    pub fn new(config: &ReaderConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            unit_id: config.unit_id,
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
            stream: None,
            transaction_id: 0,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn next_transaction_id(&mut self) -> u16 {
        self.transaction_id = self.transaction_id.wrapping_add(1);
        self.transaction_id
    }

    /// Send one request and collect the matching response frame.
    async fn exchange(
        stream: &mut TcpStream,
        frame: &[u8],
        transaction_id: u16,
        unit_id: u8,
    ) -> Result<AduFrame, ModbusError> {
        stream.write_all(frame).await?;
        stream.flush().await?;

        let mut header_bytes = [0u8; MBAP_HEADER_LEN];
        stream.read_exact(&mut header_bytes).await?;
        let header = MbapHeader::parse(&header_bytes)?;
        debug!("📥 Received MBAP header: {}", hex::encode(header_bytes));

        let pdu_len = header.pdu_len()?;
        let mut adu = Vec::with_capacity(MBAP_HEADER_LEN + pdu_len);
        adu.extend_from_slice(&header_bytes);
        adu.resize(MBAP_HEADER_LEN + pdu_len, 0);
        stream.read_exact(&mut adu[MBAP_HEADER_LEN..]).await?;
        debug!("📥 Received PDU: {}", hex::encode(&adu[MBAP_HEADER_LEN..]));

        let response = parse_adu(&adu)?;
        let header = response.header;
        if header.transaction_id != transaction_id {
            return Err(ModbusError::InvalidResponse(format!(
                "Transaction id mismatch: sent {}, received {}",
                transaction_id, header.transaction_id
            )));
        }

        if header.unit_id != unit_id {
            return Err(ModbusError::InvalidResponse(format!(
                "Unit id mismatch: sent {}, received {}",
                unit_id, header.unit_id
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl ModbusClientTrait for ModbusTcpClient {
    async fn connect(&mut self) -> Result<(), ModbusError> {
        if self.stream.is_some() {
            warn!("Already connected to {}", self.endpoint());
            return Ok(());
        }

        info!("🔌 Connecting to Modbus TCP server: {}", self.endpoint());
        debug!("⚙️  Connect timeout {:?}, read timeout {:?}", self.connect_timeout, self.read_timeout);

        let connect = TcpStream::connect((self.host.as_str(), self.port));
        let stream = match timeout(self.connect_timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                error!("❌ Failed to connect to {}: {}", self.endpoint(), e);
                return Err(ModbusError::ConnectionError(format!(
                    "Failed to connect to {}: {}",
                    self.endpoint(),
                    e
                )));
            }
            Err(_) => {
                error!("⏰ Connect to {} timed out after {:?}", self.endpoint(), self.connect_timeout);
                return Err(ModbusError::Timeout(self.connect_timeout));
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Could not disable Nagle on {}: {}", self.endpoint(), e);
        }

        info!("✅ Modbus TCP connection established");
        self.stream = Some(stream);
        Ok(())
    }

    async fn read_holding_registers(
        &mut self,
        start_addr: u16,
        count: u16,
    ) -> Result<Vec<u16>, ModbusError> {
        let request = ReadHoldingRegistersRequest::new(self.unit_id, start_addr, count)?;
        let transaction_id = self.next_transaction_id();
        let unit_id = self.unit_id;
        let read_timeout = self.read_timeout;
        let frame = request.encode(transaction_id);

        info!(
            "📊 Reading {} registers from unit {} starting at address {}",
            count, unit_id, start_addr
        );
        debug!("📤 Sending frame: {}", hex::encode(&frame));

        let Some(stream) = self.stream.as_mut() else {
            return Err(ModbusError::NotConnected);
        };

        let outcome = match timeout(read_timeout, Self::exchange(stream, &frame, transaction_id, unit_id)).await {
            Ok(result) => result,
            Err(_) => Err(ModbusError::Timeout(read_timeout)),
        };

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                if e.is_connection_error() {
                    // the socket is in an unknown state after a transport failure
                    self.stream = None;
                }
                return Err(e);
            }
        };

        match request.decode_frame(&response)? {
            ModbusResponse::Registers(values) => Ok(values),
            ModbusResponse::Exception(code) => Err(ModbusError::Exception(code)),
        }
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!("Shutdown of {} reported: {}", self.endpoint(), e);
            }
            info!("🔌 Connection to {} closed", self.endpoint());
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}
