//! AT command protocol engine for Iridium SBD modems
//!
//! This crate conducts one conversation with an Iridium 9602/9603 based modem
//! (RockBLOCK and similar) over any `StreamAccessor` transport:
//!
//! - **Command channel**: echo/reply synchronization over a line cursor
//! - **Message queueing**: `AT+SBDWB` with checksum framing
//! - **Message retrieval**: `AT+SBDRB` binary frames
//! - **Connectivity**: network time and signal strength polling
//! - **Sessions**: `AT+SBDIX` attempts, mailbox clearing and MT draining
//!
//! Traffic and protocol events go to an injectable `ModemObserver`;
//! `LogObserver` forwards them to the `log` facade.

pub mod builder;
pub mod channel;
pub mod checksum;
pub mod config;
pub mod connectivity;
pub mod device;
pub mod modem;
pub mod observer;
pub mod queue;
pub mod retrieve;
pub mod sbdix;
pub mod session;
pub mod statistics;

#[cfg(test)]
mod test_support;

pub use builder::ModemBuilder;
pub use channel::CommandChannel;
pub use checksum::SbdChecksum;
pub use config::{ConnectivityConfig, ModemConfig, RetrievalMode, SessionConfig};
pub use connectivity::iridium_ticks_to_unix_seconds;
pub use modem::SbdModem;
pub use observer::{LogObserver, ModemEvent, ModemObserver, NoopObserver};
pub use sbd_core::{SbdError, SbdResult};
pub use sbdix::{parse_sbdix, SbdixReply};
pub use session::SessionOutcome;
pub use statistics::ModemStatistics;
