//! Modem conversation statistics

/// Counters collected while talking to one modem
///
/// Updated by the command channel and the session manager; callers can read
/// them at any time through `SbdModem::statistics`.
///
/// # Usage
/// ```
/// use sbd_modem::ModemStatistics;
///
/// let mut stats = ModemStatistics::new();
/// stats.increment_lines_received();
/// stats.increment_mismatches();
/// assert_eq!(stats.mismatch_rate(), 100.0);
/// ```
///
/// A rising mismatch rate usually means the line cursor lost sync with the
/// modem, for example after echo was switched off mid-conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModemStatistics {
    /// Number of writes to the transport (commands and binary payloads)
    pub writes: u64,
    /// Number of non-blank lines read
    pub lines_received: u64,
    /// Number of replies that did not match the expected token
    pub mismatches: u64,
    /// Number of `AT+SBDIX` attempts
    pub session_attempts: u64,
    /// Number of MO messages accepted by the modem
    pub messages_queued: u64,
    /// Number of non-empty MT messages retrieved
    pub messages_retrieved: u64,
}

impl ModemStatistics {
    /// Create new statistics with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all statistics counters
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Count one transport write
    pub fn increment_writes(&mut self) {
        self.writes += 1;
    }

    /// Count one non-blank line read
    pub fn increment_lines_received(&mut self) {
        self.lines_received += 1;
    }

    /// Count one reply that did not match the expected token
    pub fn increment_mismatches(&mut self) {
        self.mismatches += 1;
    }

    /// Count one `AT+SBDIX` attempt
    pub fn increment_session_attempts(&mut self) {
        self.session_attempts += 1;
    }

    /// Count one MO message accepted by the modem
    pub fn increment_messages_queued(&mut self) {
        self.messages_queued += 1;
    }

    /// Count one non-empty MT message retrieved
    pub fn increment_messages_retrieved(&mut self) {
        self.messages_retrieved += 1;
    }

    /// Share of received lines that were protocol mismatches, as a percentage
    ///
    /// Returns 0.0 if no lines have been received.
    pub fn mismatch_rate(&self) -> f64 {
        if self.lines_received == 0 {
            0.0
        } else {
            (self.mismatches as f64 / self.lines_received as f64) * 100.0
        }
    }
}
