//! Retry budgets, delays and thresholds of the modem protocol
//!
//! # Usage
//! ```
//! use sbd_modem::{ModemConfig, RetrievalMode, SessionConfig};
//!
//! let config = ModemConfig::default()
//!     .with_session(SessionConfig::default().with_retrieval(RetrievalMode::Verified));
//! assert_eq!(config.session.attempts, 3);
//! ```
//!
//! All structs derive serde and fill missing fields with their defaults, so a
//! configuration file only needs the values it changes.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How `AT+SBDRB` replies are framed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    /// Read the reply as one raw line and strip the 2-byte header and trailer
    /// without checking them
    ///
    /// A frame containing a `0x0A` byte is split at that byte and the
    /// retrieval fails. Any 10-byte message has such a length header, and
    /// payload or checksum bytes can hit it too. Use `Verified` for binary
    /// traffic.
    #[default]
    Line,
    /// Read exactly the announced number of bytes and verify the checksum
    Verified,
}

/// Polling budgets used by `SbdModem::attempt_connection`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// Network time probes before giving up (default: 20)
    pub time_attempts: u32,
    /// Delay between network time probes (default: 1 second)
    pub time_delay: Duration,
    /// Signal strength probes before giving up (default: 10)
    pub signal_attempts: u32,
    /// Delay between signal strength probes (default: 10 seconds)
    pub signal_delay: Duration,
    /// Minimum signal bars required for a session (default: 2)
    pub signal_threshold: u8,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            time_attempts: 20,
            time_delay: Duration::from_secs(1),
            signal_attempts: 10,
            signal_delay: Duration::from_secs(10),
            signal_threshold: 2,
        }
    }
}

impl ConnectivityConfig {
    /// Set the network time probe count and the delay between probes
    pub fn with_time_polling(mut self, attempts: u32, delay: Duration) -> Self {
        self.time_attempts = attempts;
        self.time_delay = delay;
        self
    }

    /// Set the signal strength probe count and the delay between probes
    pub fn with_signal_polling(mut self, attempts: u32, delay: Duration) -> Self {
        self.signal_attempts = attempts;
        self.signal_delay = delay;
        self
    }

    /// Set the minimum signal bars accepted by `attempt_connection`
    pub fn with_signal_threshold(mut self, threshold: u8) -> Self {
        self.signal_threshold = threshold;
        self
    }
}

/// Attempt budgets used by `SbdModem::attempt_session`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// `AT+SBDIX` attempts per session round (default: 3)
    pub attempts: u32,
    /// Extra rounds allowed for draining queued MT messages, shared by the
    /// whole call (default: 10)
    pub max_drain_sessions: u32,
    /// Framing used for MT retrieval (default: `RetrievalMode::Line`)
    pub retrieval: RetrievalMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            max_drain_sessions: 10,
            retrieval: RetrievalMode::Line,
        }
    }
}

impl SessionConfig {
    /// Set the `AT+SBDIX` attempts of each round
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Set the drain round budget shared by one `attempt_session` call
    ///
    /// Zero disables draining; queued MT messages then wait for the next call.
    pub fn with_max_drain_sessions(mut self, max: u32) -> Self {
        self.max_drain_sessions = max;
        self
    }

    /// Select how MT messages are read back
    pub fn with_retrieval(mut self, retrieval: RetrievalMode) -> Self {
        self.retrieval = retrieval;
        self
    }
}

/// Complete modem protocol configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    /// Budgets of `attempt_connection`
    pub connectivity: ConnectivityConfig,
    /// Budgets of `attempt_session`
    pub session: SessionConfig,
}

impl ModemConfig {
    /// Replace the connectivity budgets
    pub fn with_connectivity(mut self, connectivity: ConnectivityConfig) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Replace the session budgets
    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }
}
