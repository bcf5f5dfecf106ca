//! Command channel: the send/expect/read-reply primitives
//!
//! Every AT exchange with the modem follows the same shape:
//! ```text
//! host  -> AT+CSQ<cr>
//! modem <- AT+CSQ        (local echo)
//! modem <- +CSQ:4        (reply payload)
//! modem <- OK            (final result code)
//! ```
//! Replies are matched by order alone, so only one command may be in flight.

use crate::observer::{ModemEvent, ModemObserver, NoopObserver};
use crate::statistics::ModemStatistics;
use bytes::{Bytes, BytesMut};
use sbd_core::constants::{COMMAND_TERMINATOR, ERROR, OK};
use sbd_core::{SbdError, SbdResult};
use sbd_transport::StreamAccessor;
use std::sync::Arc;

const READ_CHUNK_SIZE: usize = 256;

/// Owns the transport and the line-reading cursor over it
pub struct CommandChannel<T: StreamAccessor> {
    transport: T,
    /// Bytes read from the transport but not yet consumed as a line
    buffer: BytesMut,
    observer: Arc<dyn ModemObserver>,
    statistics: ModemStatistics,
}

impl<T: StreamAccessor> CommandChannel<T> {
    /// Create a channel over a connected transport
    pub fn new(transport: T) -> Self {
        Self::with_observer(transport, Arc::new(NoopObserver))
    }

    /// Create a channel reporting to the given observer
    pub fn with_observer(transport: T, observer: Arc<dyn ModemObserver>) -> Self {
        Self {
            transport,
            buffer: BytesMut::with_capacity(READ_CHUNK_SIZE),
            observer,
            statistics: ModemStatistics::new(),
        }
    }

    pub fn set_observer(&mut self, observer: Arc<dyn ModemObserver>) {
        self.observer = observer;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn statistics(&self) -> &ModemStatistics {
        &self.statistics
    }

    pub(crate) fn statistics_mut(&mut self) -> &mut ModemStatistics {
        &mut self.statistics
    }

    pub(crate) fn emit(&self, event: ModemEvent) {
        self.observer.on_event(&event);
    }

    /// Write raw bytes to the modem
    ///
    /// No terminator is added; commands that expect a reply must end in `\r`.
    ///
    /// # Errors
    /// Returns `SbdError::Transport` if the write fails
    pub async fn send(&mut self, data: impl AsRef<[u8]>) -> SbdResult<()> {
        let data = data.as_ref();
        self.observer.on_write(data);
        self.transport.write_all(data).await?;
        self.transport.flush().await?;
        self.statistics.increment_writes();
        Ok(())
    }

    /// Read the next non-blank line, trimmed
    ///
    /// Returns an empty string when the stream ends. Blocks until a line
    /// terminator arrives unless the transport has a timeout configured.
    pub async fn read_line(&mut self) -> SbdResult<String> {
        loop {
            let Some(raw) = self.next_line().await? else {
                return Ok(String::new());
            };
            let line = String::from_utf8_lossy(&raw).trim().to_string();
            if !line.is_empty() {
                self.observer.on_line(&line);
                self.statistics.increment_lines_received();
                return Ok(line);
            }
        }
    }

    /// Read the next non-blank line as raw bytes
    ///
    /// Only the line terminator (`\n` and one preceding `\r`) is removed, so
    /// binary bytes at either end of the line survive. Returns an empty buffer
    /// when the stream ends.
    pub async fn read_raw_line(&mut self) -> SbdResult<Bytes> {
        loop {
            let Some(mut raw) = self.next_line().await? else {
                return Ok(Bytes::new());
            };
            if raw.last() == Some(&b'\r') {
                raw.truncate(raw.len() - 1);
            }
            if !raw.iter().all(u8::is_ascii_whitespace) {
                self.observer.on_line(&String::from_utf8_lossy(&raw));
                self.statistics.increment_lines_received();
                return Ok(raw.freeze());
            }
        }
    }

    /// Read exactly `len` raw bytes, ignoring line structure
    ///
    /// # Errors
    /// Returns `SbdError::Transport` with `UnexpectedEof` if the stream ends first
    pub async fn read_exact(&mut self, len: usize) -> SbdResult<Bytes> {
        while self.buffer.len() < len {
            if !self.fill().await? {
                return Err(SbdError::Transport(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("Stream ended after {} of {} bytes", self.buffer.len(), len),
                )));
            }
        }
        Ok(self.buffer.split_to(len).freeze())
    }

    /// Read a line and require it to equal `expected`
    ///
    /// # Errors
    /// Returns `SbdError::ProtocolMismatch` carrying both texts if they differ
    pub async fn expect(&mut self, expected: &str) -> SbdResult<()> {
        let line = self.read_line().await?;
        if line != expected {
            self.statistics.increment_mismatches();
            return Err(SbdError::mismatch(&line, expected));
        }
        Ok(())
    }

    /// Send a command, consume its echo and return the next line
    pub async fn send_and_read_reply(&mut self, command: &str) -> SbdResult<String> {
        self.send(format!("{}{}", command, COMMAND_TERMINATOR)).await?;
        self.expect(command).await?;
        self.read_line().await
    }

    /// Send a command whose reply payload is followed by `OK`
    ///
    /// # Errors
    /// Returns `SbdError::ProtocolMismatch` straight away if the modem answers
    /// `ERROR`, since no `OK` follows in that case.
    pub async fn query(&mut self, command: &str) -> SbdResult<String> {
        let reply = self.send_and_read_reply(command).await?;
        if reply == ERROR {
            self.statistics.increment_mismatches();
            return Err(SbdError::mismatch(&reply, format!("{} reply", command)));
        }
        self.expect(OK).await?;
        Ok(reply)
    }

    /// Close the underlying transport and drop any buffered input
    pub async fn close(&mut self) -> SbdResult<()> {
        self.buffer.clear();
        self.transport.close().await
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Split one `\n` terminated line off the buffer, reading more as needed
    ///
    /// At end of stream a trailing unterminated fragment is returned as the
    /// last line.
    async fn next_line(&mut self) -> SbdResult<Option<BytesMut>> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                let mut line = self.buffer.split_to(pos + 1);
                line.truncate(pos);
                return Ok(Some(line));
            }
            if !self.fill().await? {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.buffer.split()));
            }
        }
    }

    /// Pull one chunk from the transport; `false` at end of stream
    async fn fill(&mut self) -> SbdResult<bool> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let n = self.transport.read(&mut chunk).await?;
        if n == 0 {
            return Ok(false);
        }
        self.buffer.extend_from_slice(&chunk[..n]);
        Ok(true)
    }
}
