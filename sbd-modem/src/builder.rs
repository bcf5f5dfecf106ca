//! Builder for serial modem connections
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use sbd_modem::{LogObserver, ModemBuilder};
//! use std::sync::Arc;
//!
//! # async fn run() -> sbd_modem::SbdResult<()> {
//! let mut modem = ModemBuilder::new()
//!     .serial("/dev/ttyUSB0", 19200)
//!     .observer(Arc::new(LogObserver))
//!     .open()
//!     .await?;
//! modem.ping().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::ModemConfig;
use crate::modem::SbdModem;
use crate::observer::{ModemObserver, NoopObserver};
use sbd_core::{SbdError, SbdResult};
use sbd_transport::{SerialSettings, SerialTransport, TransportLayer, DEFAULT_BAUD_RATE};
use std::sync::Arc;
use std::time::Duration;

/// Builder for `SbdModem<SerialTransport>`
///
/// # Default Settings
/// - Baud rate: 19200, 8N1, no flow control
/// - No read timeout
/// - `ModemConfig::default()`
/// - `NoopObserver`
#[derive(Clone)]
pub struct ModemBuilder {
    port_name: Option<String>,
    baud_rate: u32,
    timeout: Option<Duration>,
    config: ModemConfig,
    observer: Arc<dyn ModemObserver>,
}

impl ModemBuilder {
    pub fn new() -> Self {
        Self {
            port_name: None,
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: None,
            config: ModemConfig::default(),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Configure the serial device
    ///
    /// # Arguments
    /// * `port_name` - Device path (e.g., "/dev/ttyUSB0" or "COM3")
    /// * `baud_rate` - Baud rate (19200 for RockBLOCK)
    pub fn serial(mut self, port_name: impl Into<String>, baud_rate: u32) -> Self {
        self.port_name = Some(port_name.into());
        self.baud_rate = baud_rate;
        self
    }

    /// Bound every transport read and write
    ///
    /// `AT+SBDIX` may take over a minute, so keep this generous.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn config(mut self, config: ModemConfig) -> Self {
        self.config = config;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn ModemObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Serial settings the builder would open
    ///
    /// # Errors
    /// Returns `SbdError::Validation` if no serial port has been configured
    pub fn serial_settings(&self) -> SbdResult<SerialSettings> {
        let port_name = self
            .port_name
            .clone()
            .ok_or_else(|| SbdError::Validation("Serial port not configured".to_string()))?;
        let mut settings = SerialSettings::new(port_name, self.baud_rate);
        settings.timeout = self.timeout;
        Ok(settings)
    }

    /// Open the serial port and wrap it in a modem
    pub async fn open(self) -> SbdResult<SbdModem<SerialTransport>> {
        let mut transport = SerialTransport::new(self.serial_settings()?);
        transport.open().await?;
        Ok(SbdModem::with_config(transport, self.config).with_observer(self.observer))
    }
}

impl Default for ModemBuilder {
    fn default() -> Self {
        Self::new()
    }
}
