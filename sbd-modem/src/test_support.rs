//! Helpers shared by the unit tests

use crate::config::{ConnectivityConfig, ModemConfig, SessionConfig};
use crate::modem::SbdModem;
use sbd_transport::IoTransport;
use std::time::Duration;
use tokio_test::io::Mock;

/// Default budgets with every delay set to zero
pub(crate) fn fast_config() -> ModemConfig {
    ModemConfig::default()
        .with_connectivity(
            ConnectivityConfig::default()
                .with_time_polling(20, Duration::ZERO)
                .with_signal_polling(10, Duration::ZERO),
        )
        .with_session(SessionConfig::default())
}

/// Modem talking to a scripted conversation
pub(crate) fn scripted(mock: Mock) -> SbdModem<IoTransport<Mock>> {
    SbdModem::with_config(IoTransport::new(mock), fast_config())
}

/// Bytes of an `AT+SBDRB` reply line for `payload`, echo included
pub(crate) fn sbdrb_reply(payload: &[u8]) -> Vec<u8> {
    let checksum = crate::checksum::SbdChecksum::of(payload);
    let mut reply = b"AT+SBDRB\r".to_vec();
    reply.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    reply.extend_from_slice(payload);
    reply.extend_from_slice(&checksum.to_bytes());
    reply.extend_from_slice(b"\r\nOK\r\n");
    reply
}
