//! The modem connection handle

use crate::channel::CommandChannel;
use crate::config::ModemConfig;
use crate::observer::ModemObserver;
use crate::statistics::ModemStatistics;
use sbd_core::SbdResult;
use sbd_transport::StreamAccessor;
use std::sync::Arc;

/// Conversation state for one Iridium SBD modem
///
/// Owns the command channel (transport plus line cursor) and the protocol
/// configuration. All operations take `&mut self`: the modem answers strictly
/// in order, so a single caller drives the whole conversation.
///
/// The protocol operations are spread over several modules:
/// - device setup: `ping`, `enable_echo`, `initialize`, ...
/// - `queue_message` for MO submission
/// - `retrieve_mt_message` for MT retrieval
/// - `attempt_connection` and the probes it is built from
/// - `attempt_session`
pub struct SbdModem<T: StreamAccessor> {
    pub(crate) channel: CommandChannel<T>,
    pub(crate) config: ModemConfig,
}

impl<T: StreamAccessor> SbdModem<T> {
    /// Create a modem over a connected transport with the default configuration
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ModemConfig::default())
    }

    /// Create a modem over a connected transport
    pub fn with_config(transport: T, config: ModemConfig) -> Self {
        Self {
            channel: CommandChannel::new(transport),
            config,
        }
    }

    /// Report traffic and protocol events to `observer`
    pub fn with_observer(mut self, observer: Arc<dyn ModemObserver>) -> Self {
        self.channel.set_observer(observer);
        self
    }

    /// Protocol configuration in use
    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    /// Replace the configuration; takes effect with the next operation
    pub fn set_config(&mut self, config: ModemConfig) {
        self.config = config;
    }

    /// Counters collected since the modem was created
    pub fn statistics(&self) -> &ModemStatistics {
        self.channel.statistics()
    }

    /// Direct access to the send/expect primitives
    pub fn channel_mut(&mut self) -> &mut CommandChannel<T> {
        &mut self.channel
    }

    /// Release the transport
    pub async fn close(&mut self) -> SbdResult<()> {
        self.channel.close().await
    }

    /// Give the transport back, dropping any buffered unread bytes
    pub fn into_transport(self) -> T {
        self.channel.into_transport()
    }
}
