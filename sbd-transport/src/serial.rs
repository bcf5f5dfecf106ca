//! Serial port transport implementation

use crate::stream::{not_connected, StreamAccessor, TransportLayer};
use async_trait::async_trait;
use sbd_core::{SbdError, SbdResult};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::SerialStream;

/// Baud rate the RockBLOCK and bare 9602/9603 modules ship with
pub const DEFAULT_BAUD_RATE: u32 = 19200;

/// Wrapper for SerialStream that implements Debug
struct DebugSerialStream(SerialStream);

impl fmt::Debug for DebugSerialStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialStream").finish()
    }
}

/// Serial port transport layer settings
#[derive(Debug, Clone)]
pub struct SerialSettings {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: tokio_serial::DataBits,
    pub stop_bits: tokio_serial::StopBits,
    pub parity: tokio_serial::Parity,
    pub flow_control: tokio_serial::FlowControl,
    /// Per read/write timeout; `None` blocks until the modem answers
    pub timeout: Option<Duration>,
}

impl SerialSettings {
    /// Create 8N1 settings without flow control and without a timeout
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            data_bits: tokio_serial::DataBits::Eight,
            stop_bits: tokio_serial::StopBits::One,
            parity: tokio_serial::Parity::None,
            flow_control: tokio_serial::FlowControl::None,
            timeout: None,
        }
    }

    /// Create settings with a bounded read/write timeout
    pub fn with_timeout(port_name: impl Into<String>, baud_rate: u32, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::new(port_name, baud_rate)
        }
    }
}

/// Serial port transport layer implementation
#[derive(Debug)]
pub struct SerialTransport {
    stream: Option<DebugSerialStream>,
    settings: SerialSettings,
    closed: bool,
}

impl SerialTransport {
    /// Create a new, not yet opened, serial transport
    pub fn new(settings: SerialSettings) -> Self {
        Self {
            stream: None,
            settings,
            closed: true,
        }
    }

    /// Create serial transport with port name and baud rate
    pub fn new_simple(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self::new(SerialSettings::new(port_name, baud_rate))
    }

    /// Current settings
    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }

    fn stream_mut(&mut self) -> SbdResult<&mut SerialStream> {
        self.stream
            .as_mut()
            .map(|s| &mut s.0)
            .ok_or_else(|| not_connected("Serial stream"))
    }
}

async fn bounded<T>(
    timeout: Option<Duration>,
    op: impl Future<Output = std::io::Result<T>>,
) -> SbdResult<T> {
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, op)
            .await
            .map_err(|_| SbdError::Timeout)?
            .map_err(SbdError::Transport),
        None => op.await.map_err(SbdError::Transport),
    }
}

#[async_trait]
impl TransportLayer for SerialTransport {
    async fn open(&mut self) -> SbdResult<()> {
        if !self.closed {
            return Err(SbdError::Transport(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Serial port has already been opened",
            )));
        }

        let builder = tokio_serial::new(&self.settings.port_name, self.settings.baud_rate)
            .data_bits(self.settings.data_bits)
            .stop_bits(self.settings.stop_bits)
            .parity(self.settings.parity)
            .flow_control(self.settings.flow_control);

        let stream = SerialStream::open(&builder).map_err(|e| {
            SbdError::Transport(std::io::Error::other(format!(
                "Failed to open serial port {}: {}",
                self.settings.port_name, e
            )))
        })?;

        self.stream = Some(DebugSerialStream(stream));
        self.closed = false;
        Ok(())
    }
}

#[async_trait]
impl StreamAccessor for SerialTransport {
    async fn set_timeout(&mut self, timeout: Option<Duration>) -> SbdResult<()> {
        self.settings.timeout = timeout;
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> SbdResult<usize> {
        let timeout = self.settings.timeout;
        let stream = self.stream_mut()?;
        let result = bounded(timeout, stream.read(buf)).await;
        match result {
            Ok(0) => {
                self.closed = true;
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(SbdError::Timeout) => Err(SbdError::Timeout),
            Err(e) => {
                self.closed = true;
                Err(e)
            }
        }
    }

    async fn write(&mut self, buf: &[u8]) -> SbdResult<usize> {
        let timeout = self.settings.timeout;
        let stream = self.stream_mut()?;
        bounded(timeout, stream.write(buf)).await
    }

    async fn flush(&mut self) -> SbdResult<()> {
        let stream = self.stream_mut()?;
        stream.flush().await.map_err(SbdError::Transport)
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(&mut self) -> SbdResult<()> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.0.flush().await;
        }
        self.closed = true;
        Ok(())
    }
}
