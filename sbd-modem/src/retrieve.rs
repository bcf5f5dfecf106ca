//! MT message retrieval (`AT+SBDRB`)
//!
//! The reply carries binary data straight after the echo:
//! ```text
//! AT+SBDRB<cr><length hi><length lo><payload...><checksum hi><checksum lo>
//! OK
//! ```

use crate::checksum::SbdChecksum;
use crate::config::RetrievalMode;
use crate::modem::SbdModem;
use crate::observer::ModemEvent;
use bytes::Bytes;
use sbd_core::constants::OK;
use sbd_core::{SbdError, SbdResult};
use sbd_transport::StreamAccessor;

pub const CMD_READ_BINARY: &str = "AT+SBDRB";

/// Length header plus checksum trailer
const FRAME_OVERHEAD: usize = 4;

/// Extract the payload from one raw `AT+SBDRB` reply line
///
/// A leading echo of the command is removed. Frames of four bytes or less
/// carry no payload and yield an empty message. The length header and the
/// checksum are dropped without being checked.
pub fn extract_line_frame(line: &[u8]) -> Bytes {
    let mut frame = line;
    if let Some(rest) = frame.strip_prefix(CMD_READ_BINARY.as_bytes()) {
        frame = rest.strip_prefix(b"\r").unwrap_or(rest);
    }
    if frame.len() > FRAME_OVERHEAD {
        Bytes::copy_from_slice(&frame[2..frame.len() - 2])
    } else {
        Bytes::new()
    }
}

impl<T: StreamAccessor> SbdModem<T> {
    /// Read the message waiting in the modem's MT buffer
    ///
    /// Returns an empty buffer when the frame holds no payload.
    ///
    /// # Errors
    /// - `SbdError::ProtocolMismatch` if the trailing `OK` is missing
    /// - `SbdError::Parse` on a checksum mismatch (`RetrievalMode::Verified` only)
    pub async fn retrieve_mt_message(&mut self) -> SbdResult<Bytes> {
        self.channel.send(format!("{}\r", CMD_READ_BINARY)).await?;

        let message = match self.config.session.retrieval {
            RetrievalMode::Line => {
                let line = self.channel.read_raw_line().await?;
                let message = extract_line_frame(&line);
                self.channel.expect(OK).await?;
                message
            }
            RetrievalMode::Verified => self.read_verified_frame().await?,
        };

        if !message.is_empty() {
            self.channel.statistics_mut().increment_messages_retrieved();
            self.channel.emit(ModemEvent::MessageRetrieved { len: message.len() });
        }
        Ok(message)
    }

    async fn read_verified_frame(&mut self) -> SbdResult<Bytes> {
        let echo = format!("{}\r", CMD_READ_BINARY);
        let received = self.channel.read_exact(echo.len()).await?;
        if received != echo.as_bytes() {
            self.channel.statistics_mut().increment_mismatches();
            return Err(SbdError::mismatch(String::from_utf8_lossy(&received), &echo));
        }

        let header = self.channel.read_exact(2).await?;
        let length = u16::from_be_bytes([header[0], header[1]]) as usize;
        let payload = self.channel.read_exact(length).await?;
        let trailer = self.channel.read_exact(2).await?;
        self.channel.expect(OK).await?;

        SbdChecksum::of(&payload).validate([trailer[0], trailer[1]])?;
        Ok(payload)
    }
}
