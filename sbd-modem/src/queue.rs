//! MO message submission (`AT+SBDWB`)
//!
//! ```text
//! host  -> AT+SBDWB=<n><cr>
//! modem <- AT+SBDWB=<n>
//! modem <- READY
//! host  -> <n payload bytes><checksum hi><checksum lo>
//! modem <- 0                 (0: ok, 1: timeout, 2: bad checksum, 3: bad length)
//! modem <- OK
//! ```

use crate::checksum::SbdChecksum;
use crate::modem::SbdModem;
use crate::observer::ModemEvent;
use sbd_core::constants::{MAX_MO_PAYLOAD_LEN, OK, READY};
use sbd_core::{SbdError, SbdResult};
use sbd_transport::StreamAccessor;

/// Status line meaning the binary write was accepted
const WRITE_ACCEPTED: &str = "0";

impl<T: StreamAccessor> SbdModem<T> {
    /// Load `payload` into the modem's MO buffer
    ///
    /// The message is transmitted by the next session (`attempt_session`).
    ///
    /// # Errors
    /// - `SbdError::Validation` if the payload exceeds 340 bytes; nothing is written
    /// - `SbdError::ProtocolMismatch` if the modem does not prompt `READY` or
    ///   reports any non-zero write status
    pub async fn queue_message(&mut self, payload: &[u8]) -> SbdResult<()> {
        if payload.len() > MAX_MO_PAYLOAD_LEN {
            return Err(SbdError::Validation(format!(
                "Message is too long, should be <= {} and is {}",
                MAX_MO_PAYLOAD_LEN,
                payload.len()
            )));
        }

        let command = format!("AT+SBDWB={}", payload.len());
        self.channel.send(format!("{}\r", command)).await?;
        self.channel.expect(&command).await?;
        self.channel.expect(READY).await?;

        self.channel.send(payload).await?;
        self.channel.send(SbdChecksum::of(payload).to_bytes()).await?;

        self.channel.expect(WRITE_ACCEPTED).await?;
        self.channel.expect(OK).await?;

        self.channel.statistics_mut().increment_messages_queued();
        self.channel.emit(ModemEvent::MessageQueued { len: payload.len() });
        Ok(())
    }
}
