//! Parser for the `+SBDIX` session status line
//!
//! ```text
//! +SBDIX:<MO status>, <MOMSN>, <MT status>, <MTMSN>, <MT length>, <MT queued>
//! ```

use sbd_core::{SbdError, SbdResult};
use std::str::FromStr;

/// Prefix of the `AT+SBDIX` status line
pub const SBDIX_MARKER: &str = "+SBDIX:";

/// Separator between the status fields
const FIELD_SEPARATOR: &str = ", ";

const FIELD_COUNT: usize = 6;

/// Highest MO status code that still means the session reached the gateway
pub const MO_STATUS_SUCCESS_MAX: i32 = 4;

/// Parsed reply to `AT+SBDIX`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SbdixReply {
    /// MO transfer outcome; 0-4 denote success
    pub mo_status: i32,
    /// MO message sequence number
    pub msn: i32,
    /// 0: no MT message, 1: MT message received, 2: mailbox check failed
    pub mt_status: i32,
    /// MT message sequence number
    pub mt_msn: i32,
    /// Length in bytes of the received MT message
    pub mt_length: i32,
    /// MT messages still waiting at the gateway
    pub mt_queued: i32,
}

impl SbdixReply {
    /// Whether the session reached the gateway and the MO buffer was handled
    pub fn mo_succeeded(&self) -> bool {
        self.mo_status <= MO_STATUS_SUCCESS_MAX
    }

    /// Whether an MT message was delivered into the modem's receive buffer
    pub fn has_mt_message(&self) -> bool {
        self.mt_status == 1 && self.mt_length > 0
    }
}

impl FromStr for SbdixReply {
    type Err = SbdError;

    fn from_str(s: &str) -> SbdResult<Self> {
        parse_sbdix(s)
    }
}

/// Parse one `+SBDIX:` status line
///
/// # Errors
/// Returns `SbdError::Parse` if the prefix is missing, a field is not a
/// decimal integer, or the line does not carry exactly six fields.
pub fn parse_sbdix(line: &str) -> SbdResult<SbdixReply> {
    let body = line
        .trim()
        .strip_prefix(SBDIX_MARKER)
        .ok_or_else(|| SbdError::Parse(format!("Missing {} prefix: {}", SBDIX_MARKER, line)))?;

    let fields = body
        .trim()
        .split(FIELD_SEPARATOR)
        .map(|field| {
            field.parse::<i32>().map_err(|e| {
                SbdError::Parse(format!("Invalid SBDIX field '{}': {}", field, e))
            })
        })
        .collect::<SbdResult<Vec<i32>>>()?;

    let [mo_status, msn, mt_status, mt_msn, mt_length, mt_queued]: [i32; FIELD_COUNT] =
        fields.as_slice().try_into().map_err(|_| {
            SbdError::Parse(format!(
                "Expected {} SBDIX fields, got {}: {}",
                FIELD_COUNT,
                fields.len(),
                line
            ))
        })?;

    Ok(SbdixReply {
        mo_status,
        msn,
        mt_status,
        mt_msn,
        mt_length,
        mt_queued,
    })
}
