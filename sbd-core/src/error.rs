use thiserror::Error;

/// Main error type for SBD modem operations
#[derive(Error, Debug)]
pub enum SbdError {
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Timeout")]
    Timeout,

    #[error("Unexpected reply (got {actual}, expected {expected})")]
    ProtocolMismatch { actual: String, expected: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Retries exhausted: {0}")]
    RetryExhausted(String),
}

impl SbdError {
    /// Build a mismatch error, rendering control characters of both sides visibly
    pub fn mismatch(actual: impl AsRef<str>, expected: impl AsRef<str>) -> Self {
        SbdError::ProtocolMismatch {
            actual: render_visible(actual.as_ref()),
            expected: render_visible(expected.as_ref()),
        }
    }

    /// Whether the error came from the underlying channel rather than the modem's replies
    pub fn is_transport(&self) -> bool {
        matches!(self, SbdError::Transport(_) | SbdError::Timeout)
    }
}

/// Render carriage returns, line feeds and other control characters as readable tokens
pub fn render_visible(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\r' => out.push_str("<cr>"),
            '\n' => out.push_str("<lf>"),
            c if c.is_control() => out.push_str(&format!("<0x{:02X}>", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Result type alias for SBD modem operations
pub type SbdResult<T> = Result<T, SbdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_renders_control_characters() {
        let err = SbdError::mismatch("AT\r\n", "OK");
        match &err {
            SbdError::ProtocolMismatch { actual, expected } => {
                assert_eq!(actual, "AT<cr><lf>");
                assert_eq!(expected, "OK");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.to_string(), "Unexpected reply (got AT<cr><lf>, expected OK)");
    }

    #[test]
    fn test_render_visible_other_controls() {
        assert_eq!(render_visible("a\u{1}b"), "a<0x01>b");
    }

    #[test]
    fn test_is_transport() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        assert!(SbdError::from(io).is_transport());
        assert!(SbdError::Timeout.is_transport());
        assert!(!SbdError::Parse("x".to_string()).is_transport());
    }
}
