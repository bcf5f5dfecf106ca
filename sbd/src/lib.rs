//! Rust implementation of the Iridium Short Burst Data (SBD) modem protocol
//!
//! This library talks to RockBLOCK style Iridium 9602/9603 modems over a
//! serial line using their AT command set.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `sbd-core`: Error taxonomy and protocol constants
//! - `sbd-transport`: Transport layer (Serial, generic async streams)
//! - `sbd-modem`: Command channel, message queueing/retrieval, connectivity and sessions
//!
//! # Usage
//!
//! ```no_run
//! use sbd::{LogObserver, ModemBuilder};
//! use std::sync::Arc;
//!
//! # async fn run() -> sbd::SbdResult<()> {
//! let mut modem = ModemBuilder::new()
//!     .serial("/dev/ttyUSB0", 19200)
//!     .observer(Arc::new(LogObserver))
//!     .open()
//!     .await?;
//!
//! modem.initialize().await?;
//! modem.queue_message(b"Hello, World").await?;
//! modem.attempt_connection().await?;
//! for message in modem.attempt_session().await.into_result()? {
//!     println!("received {} bytes", message.len());
//! }
//! modem.close().await?;
//! # Ok(())
//! # }
//! ```

pub use sbd_core::constants;
pub use sbd_core::{SbdError, SbdResult};
pub use sbd_modem::*;

/// Transport layer API
pub mod transport {
    pub use sbd_transport::*;
}
