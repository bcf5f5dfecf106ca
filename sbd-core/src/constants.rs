//! Protocol constants of the Iridium 9602/9603 AT command set

/// Largest mobile-originated payload accepted by `AT+SBDWB`
pub const MAX_MO_PAYLOAD_LEN: usize = 340;

/// Iridium system time epoch in milliseconds since the Unix epoch
/// (May 11, 2014, at 14:23:55 UTC)
pub const IRIDIUM_EPOCH_MS: i64 = 1_399_818_235_000;

/// Duration of one Iridium system time tick in milliseconds
pub const IRIDIUM_TICK_MS: i64 = 90;

/// Terminator appended to every command
pub const COMMAND_TERMINATOR: &str = "\r";

/// Final result code of a successful command
pub const OK: &str = "OK";

/// Final result code of a rejected command
pub const ERROR: &str = "ERROR";

/// Prompt sent by the modem before it accepts a binary write
pub const READY: &str = "READY";
