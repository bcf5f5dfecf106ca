//! Device setup commands

use crate::modem::SbdModem;
use sbd_core::constants::OK;
use sbd_core::{SbdError, SbdResult};
use sbd_transport::StreamAccessor;

pub const CMD_PING: &str = "AT";
pub const CMD_ENABLE_ECHO: &str = "ATE1";
pub const CMD_DISABLE_FLOW_CONTROL: &str = "AT&K0";
pub const CMD_DISABLE_RING_ALERTS: &str = "AT+SBDMTA=0";
pub const CMD_SERIAL_IDENTIFIER: &str = "AT+GSN";
pub const CMD_CLEAR_MO_BUFFER: &str = "AT+SBDD0";

impl<T: StreamAccessor> SbdModem<T> {
    /// `AT`: check the modem answers
    pub async fn ping(&mut self) -> SbdResult<()> {
        self.simple_command(CMD_PING).await
    }

    /// `ATE1`: turn local echo on
    ///
    /// Every other command relies on the echo, so this only succeeds when
    /// echo is already enabled or the modem echoes this command before
    /// applying it.
    pub async fn enable_echo(&mut self) -> SbdResult<()> {
        self.simple_command(CMD_ENABLE_ECHO).await
    }

    /// `AT&K0`: RTS/CTS flow control off (3-wire serial)
    pub async fn disable_flow_control(&mut self) -> SbdResult<()> {
        self.simple_command(CMD_DISABLE_FLOW_CONTROL).await
    }

    /// `AT+SBDMTA=0`: no unsolicited `SBDRING` alerts
    pub async fn disable_ring_alerts(&mut self) -> SbdResult<()> {
        self.simple_command(CMD_DISABLE_RING_ALERTS).await
    }

    /// `AT+GSN`: the modem's IMEI
    pub async fn get_serial_identifier(&mut self) -> SbdResult<String> {
        self.channel.query(CMD_SERIAL_IDENTIFIER).await
    }

    /// `AT+SBDD0`: clear the MO buffer
    pub async fn clear_mo_buffer(&mut self) -> SbdResult<()> {
        self.channel.query(CMD_CLEAR_MO_BUFFER).await.map(|_| ())
    }

    /// Usual bring-up: ping, echo on, ring alerts off, flow control off
    pub async fn initialize(&mut self) -> SbdResult<()> {
        self.ping().await?;
        self.enable_echo().await?;
        self.disable_ring_alerts().await?;
        self.disable_flow_control().await
    }

    /// Command whose only reply is `OK`
    async fn simple_command(&mut self, command: &str) -> SbdResult<()> {
        let reply = self.channel.send_and_read_reply(command).await?;
        if reply != OK {
            self.channel.statistics_mut().increment_mismatches();
            return Err(SbdError::mismatch(&reply, OK));
        }
        Ok(())
    }
}
