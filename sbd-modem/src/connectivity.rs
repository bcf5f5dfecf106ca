//! Connectivity readiness: network time and signal strength polling

use crate::config::ConnectivityConfig;
use crate::modem::SbdModem;
use crate::observer::ModemEvent;
use sbd_core::constants::{IRIDIUM_EPOCH_MS, IRIDIUM_TICK_MS};
use sbd_core::{SbdError, SbdResult};
use sbd_transport::StreamAccessor;

pub const CMD_SIGNAL_QUALITY: &str = "AT+CSQ";
pub const CMD_SYSTEM_TIME: &str = "AT-MSSTM";

const CSQ_MARKER: &str = "+CSQ";
const CSQ_REPLY_LEN: usize = 6;
const MSSTM_MARKER: &str = "-MSSTM:";
/// `-MSSTM: ` followed by eight hex digits
const MSSTM_REPLY_LEN: usize = 16;
const MSSTM_TICKS_OFFSET: usize = 8;

/// Convert an Iridium system time tick count to Unix seconds
pub fn iridium_ticks_to_unix_seconds(ticks: u32) -> i64 {
    (IRIDIUM_EPOCH_MS + ticks as i64 * IRIDIUM_TICK_MS) / 1000
}

/// Parse a `+CSQ:<n>` reply into signal bars
pub fn parse_signal_reply(reply: &str) -> SbdResult<u8> {
    if !reply.contains(CSQ_MARKER) || reply.len() != CSQ_REPLY_LEN {
        return Err(SbdError::mismatch(reply, "+CSQ:<0-9>"));
    }
    reply
        .chars()
        .last()
        .and_then(|c| c.to_digit(10))
        .map(|bars| bars as u8)
        .ok_or_else(|| SbdError::Parse(format!("Invalid signal strength: {}", reply)))
}

/// Whether an `-MSSTM:` reply carries a complete time field
pub fn is_valid_time_reply(reply: &str) -> bool {
    reply.contains(MSSTM_MARKER) && reply.len() == MSSTM_REPLY_LEN
}

/// Parse the tick count out of an `-MSSTM: <hex>` reply
///
/// The tick field must be exactly eight hex digits. Without network service
/// the modem answers `-MSSTM: no network service`, which fails to parse.
pub fn parse_time_reply(reply: &str) -> SbdResult<u32> {
    if !reply.contains(MSSTM_MARKER) {
        return Err(SbdError::mismatch(reply, "-MSSTM:<ticks>"));
    }
    let field = reply.get(MSSTM_TICKS_OFFSET..).unwrap_or("");
    if field.len() != MSSTM_REPLY_LEN - MSSTM_TICKS_OFFSET
        || !field.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return Err(SbdError::Parse(format!("No network time: {}", field)));
    }
    u32::from_str_radix(field, 16)
        .map_err(|_| SbdError::Parse(format!("No network time: {}", field)))
}

impl<T: StreamAccessor> SbdModem<T> {
    /// `AT-MSSTM`: succeeds when the modem has a valid network time
    ///
    /// # Errors
    /// Returns `SbdError::ProtocolMismatch` while no network time is available
    pub async fn is_network_time_valid(&mut self) -> SbdResult<()> {
        let reply = self.channel.query(CMD_SYSTEM_TIME).await?;
        if !is_valid_time_reply(&reply) {
            self.channel.statistics_mut().increment_mismatches();
            return Err(SbdError::mismatch(&reply, "-MSSTM: <8 hex digits>"));
        }
        Ok(())
    }

    /// `AT+CSQ`: signal strength in bars (0-5 on current hardware)
    pub async fn get_signal_strength(&mut self) -> SbdResult<u8> {
        let reply = self.channel.query(CMD_SIGNAL_QUALITY).await?;
        parse_signal_reply(&reply)
    }

    /// `AT-MSSTM`: network time as Unix seconds
    pub async fn get_network_time(&mut self) -> SbdResult<i64> {
        let reply = self.channel.query(CMD_SYSTEM_TIME).await?;
        parse_time_reply(&reply).map(iridium_ticks_to_unix_seconds)
    }

    /// Wait until the modem has network time and enough signal for a session
    ///
    /// # Process
    /// 1. Probe `AT-MSSTM` up to `time_attempts` times, `time_delay` apart
    /// 2. Probe `AT+CSQ` up to `signal_attempts` times, `signal_delay` apart,
    ///    until the reading reaches `signal_threshold`
    ///
    /// # Errors
    /// - `SbdError::RetryExhausted` if either phase runs out of probes
    /// - transport errors abort immediately in both phases
    /// - any failed signal probe aborts the second phase
    pub async fn attempt_connection(&mut self) -> SbdResult<()> {
        let config = self.config.connectivity.clone();
        self.wait_for_network_time(&config).await?;
        self.wait_for_signal(&config).await
    }

    async fn wait_for_network_time(&mut self, config: &ConnectivityConfig) -> SbdResult<()> {
        self.channel.emit(ModemEvent::ConnectionAttempt {
            attempts: config.time_attempts,
            delay: config.time_delay,
        });

        for probe in 1..=config.time_attempts {
            match self.is_network_time_valid().await {
                Ok(()) => {
                    self.channel.emit(ModemEvent::NetworkTimeValid { probes: probe });
                    return Ok(());
                }
                Err(e) if e.is_transport() => return Err(e),
                Err(_) => {}
            }
            if probe < config.time_attempts {
                tokio::time::sleep(config.time_delay).await;
            }
        }

        Err(SbdError::RetryExhausted(format!(
            "Unable to establish connection: no network time after {} probes",
            config.time_attempts
        )))
    }

    async fn wait_for_signal(&mut self, config: &ConnectivityConfig) -> SbdResult<()> {
        self.channel.emit(ModemEvent::WaitingForSignal {
            threshold: config.signal_threshold,
            attempts: config.signal_attempts,
            delay: config.signal_delay,
        });

        for probe in 1..=config.signal_attempts {
            let signal = self.get_signal_strength().await?;
            self.channel.emit(ModemEvent::SignalStrength(signal));
            if signal >= config.signal_threshold {
                return Ok(());
            }
            if probe < config.signal_attempts {
                tokio::time::sleep(config.signal_delay).await;
            }
        }

        Err(SbdError::RetryExhausted(format!(
            "Unable to find required signal of {} after {} probes",
            config.signal_threshold, config.signal_attempts
        )))
    }
}
