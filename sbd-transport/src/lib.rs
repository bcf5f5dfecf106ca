//! Transport layer module for the Iridium SBD modem protocol
//!
//! This crate provides the byte-stream boundary the modem protocol talks through:
//! a serial port transport and an adapter over any tokio async stream.

pub mod io;
pub mod serial;
pub mod stream;

pub use io::IoTransport;
pub use sbd_core::{SbdError, SbdResult};
pub use serial::{SerialSettings, SerialTransport, DEFAULT_BAUD_RATE};
pub use stream::{StreamAccessor, TransportLayer};
