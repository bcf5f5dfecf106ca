//! Stream accessor trait for transport layer

use async_trait::async_trait;
use sbd_core::{SbdError, SbdResult};
use std::time::Duration;

/// Raw byte access to the physical channel of one modem
///
/// The channel is half-duplex and exclusively owned: the protocol layer
/// issues one write and then reads until the matching reply has arrived.
/// Line splitting is not done here.
#[async_trait]
pub trait StreamAccessor: Send {
    /// Set the read/write timeout
    ///
    /// # Arguments
    ///
    /// * `timeout` - The timeout duration. None means block indefinitely.
    async fn set_timeout(&mut self, timeout: Option<Duration>) -> SbdResult<()>;

    /// Read data from the stream
    ///
    /// # Returns
    ///
    /// Number of bytes read, or 0 at end of stream
    async fn read(&mut self, buf: &mut [u8]) -> SbdResult<usize>;

    /// Write data to the stream
    ///
    /// # Returns
    ///
    /// Number of bytes written
    async fn write(&mut self, buf: &[u8]) -> SbdResult<usize>;

    /// Write all data to the stream
    async fn write_all(&mut self, buf: &[u8]) -> SbdResult<()> {
        let mut written = 0;
        while written < buf.len() {
            let n = self.write(&buf[written..]).await?;
            if n == 0 {
                return Err(SbdError::Transport(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "Failed to write all data",
                )));
            }
            written += n;
        }
        Ok(())
    }

    /// Flush any buffered data
    async fn flush(&mut self) -> SbdResult<()>;

    /// Check if the stream is closed
    fn is_closed(&self) -> bool;

    /// Close the stream
    async fn close(&mut self) -> SbdResult<()>;
}

/// Transport that has to be opened before use (e.g. a serial device)
#[async_trait]
pub trait TransportLayer: StreamAccessor {
    /// Open the physical layer connection
    async fn open(&mut self) -> SbdResult<()>;
}

pub(crate) fn not_connected(what: &str) -> SbdError {
    SbdError::Transport(std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        format!("{} not connected", what),
    ))
}
