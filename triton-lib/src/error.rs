use crate::params::Variant;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while building or parsing a configuration frame.
///
/// Every decode failure is terminal for that frame: no partially decoded
/// parameters are ever returned alongside one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("Cannot encode {field}: {reason}")]
    Encoding { field: &'static str, reason: String },

    #[error("Malformed hex text: {0}")]
    MalformedHex(#[from] hex::FromHexError),

    #[error("Frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort { expected: usize, actual: usize },

    #[error("Invalid footer: expected 0x3B, got {found:#04x}")]
    InvalidFooter { found: u8 },

    #[error("Checksum mismatch: computed {computed:#04x}, frame carries {found:#04x}")]
    ChecksumMismatch { computed: u8, found: u8 },

    #[error("Invalid header: expected 0x24, got {found:#04x}")]
    InvalidHeader { found: u8 },

    #[error("Unknown frame variant for a {len}-byte frame")]
    UnknownVariant { len: usize },

    #[error("Variant mismatch: expected {expected}, frame is {found}")]
    VariantMismatch { expected: Variant, found: Variant },

    #[error("Frame text is not wrapped in '$' ... ';'")]
    MissingDelimiters,

    #[error("Frame text is wrapped in '$' ... ';' but bare hex was requested")]
    UnexpectedDelimiters,
}

impl FrameError {
    pub(crate) fn encoding(field: &'static str, reason: impl Into<String>) -> Self {
        FrameError::Encoding {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors raised by the serial exchange around the codec.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("No acknowledgment within {0:?}")]
    Timeout(Duration),

    #[error("Exchange cancelled")]
    Cancelled,

    #[error("Transport closed before the device acknowledged")]
    Closed,

    #[error("Operation '{operation}' not allowed in state {state}")]
    State {
        operation: &'static str,
        state: crate::session::SessionState,
    },
}
