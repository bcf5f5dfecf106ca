//! Trace hook for modem traffic and protocol events
//!
//! The protocol code never logs directly. Every write, every received line
//! and every noteworthy state change is reported to a `ModemObserver`.

use crate::sbdix::SbdixReply;
use sbd_core::error::render_visible;
use std::time::Duration;

/// Protocol level events reported while talking to the modem
#[derive(Debug, Clone, PartialEq)]
pub enum ModemEvent {
    /// Waiting for a valid network time before anything else
    ConnectionAttempt { attempts: u32, delay: Duration },
    /// The modem reported a valid network time
    NetworkTimeValid { probes: u32 },
    /// Waiting for the signal to reach the threshold
    WaitingForSignal { threshold: u8, attempts: u32, delay: Duration },
    /// A signal strength reading (0-5 bars on the 9602/9603)
    SignalStrength(u8),
    /// A session round started with a fresh attempt budget
    SessionAttempt { attempts: u32 },
    /// A parsed `+SBDIX` status line
    SessionReply(SbdixReply),
    /// The post-session `AT+SBDD0` failed and was ignored
    MailboxClearFailed(String),
    /// Another round is started to drain MT messages still queued at the gateway
    DrainRound { mt_queued: i32 },
    /// A drain round ran out of attempts; the messages already retrieved are kept
    DrainAbandoned(String),
    /// Draining stopped because the shared drain budget is used up
    DrainLimitReached { max_drain_sessions: u32, mt_queued: i32 },
    /// An MO message was accepted into the modem's transmit buffer
    MessageQueued { len: usize },
    /// An MT message was read out of the modem's receive buffer
    MessageRetrieved { len: usize },
}

/// Observer of modem traffic
///
/// All methods have empty default implementations.
#[cfg_attr(test, mockall::automock)]
pub trait ModemObserver: Send + Sync {
    /// Bytes are about to be written to the transport
    fn on_write(&self, data: &[u8]) {
        let _ = data;
    }

    /// A non-blank line was read from the transport
    fn on_line(&self, line: &str) {
        let _ = line;
    }

    /// A protocol event occurred
    fn on_event(&self, event: &ModemEvent) {
        let _ = event;
    }
}

/// Observer that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ModemObserver for NoopObserver {}

/// Observer that forwards traffic and events to the `log` facade
///
/// Traffic is logged at debug level as `> command` and `# line`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl ModemObserver for LogObserver {
    fn on_write(&self, data: &[u8]) {
        log::debug!("> {}", render_visible(&String::from_utf8_lossy(data)));
    }

    fn on_line(&self, line: &str) {
        log::debug!("# {}", render_visible(line));
    }

    fn on_event(&self, event: &ModemEvent) {
        match event {
            ModemEvent::ConnectionAttempt { attempts, delay } => {
                log::info!("Attempting connection (attempts={}, delay={:?})", attempts, delay)
            }
            ModemEvent::NetworkTimeValid { probes } => {
                log::info!("Network time valid after {} probe(s)", probes)
            }
            ModemEvent::WaitingForSignal { threshold, attempts, delay } => log::info!(
                "Waiting for signal of {} (attempts={}, delay={:?})",
                threshold,
                attempts,
                delay
            ),
            ModemEvent::SignalStrength(signal) => log::info!("Signal strength {}", signal),
            ModemEvent::SessionAttempt { attempts } => {
                log::info!("Attempt session (attempts={})", attempts)
            }
            ModemEvent::SessionReply(reply) => log::info!("Session status {:?}", reply),
            ModemEvent::MailboxClearFailed(reason) => {
                log::warn!("Clearing MO buffer failed: {}", reason)
            }
            ModemEvent::DrainRound { mt_queued } => {
                log::info!("Draining MT queue ({} waiting)", mt_queued)
            }
            ModemEvent::DrainAbandoned(reason) => log::warn!("Drain round failed: {}", reason),
            ModemEvent::DrainLimitReached { max_drain_sessions, mt_queued } => log::warn!(
                "Drain limit of {} rounds reached with {} MT message(s) still queued",
                max_drain_sessions,
                mt_queued
            ),
            ModemEvent::MessageQueued { len } => log::info!("Queued MO message of {} bytes", len),
            ModemEvent::MessageRetrieved { len } => {
                log::info!("Retrieved MT message of {} bytes", len)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static RECORDS: Mutex<Vec<(log::Level, String)>> = Mutex::new(Vec::new());

    struct CaptureLogger;

    impl log::Log for CaptureLogger {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            RECORDS
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }

        fn flush(&self) {}
    }

    static LOGGER: CaptureLogger = CaptureLogger;

    #[test]
    fn test_log_observer_forwards_to_log() {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Debug);

        let observer = LogObserver;
        observer.on_write(b"AT+CSQ\r");
        observer.on_line("+CSQ:5");
        observer.on_event(&ModemEvent::MailboxClearFailed("timeout".into()));
        observer.on_event(&ModemEvent::DrainRound { mt_queued: 2 });

        let records = RECORDS.lock().unwrap();
        assert!(records.contains(&(log::Level::Debug, "> AT+CSQ<cr>".to_string())));
        assert!(records.contains(&(log::Level::Debug, "# +CSQ:5".to_string())));
        assert!(records.contains(&(
            log::Level::Warn,
            "Clearing MO buffer failed: timeout".to_string()
        )));
        assert!(records.contains(&(log::Level::Info, "Draining MT queue (2 waiting)".to_string())));
    }

    #[test]
    fn test_noop_observer_accepts_everything() {
        let observer = NoopObserver;
        observer.on_write(b"AT\r");
        observer.on_line("OK");
        observer.on_event(&ModemEvent::SignalStrength(3));
    }
}
