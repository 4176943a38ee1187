//! Checksum and structural checks shared by the encoder and the decoder.
//!
//! Checks run in this order, and the first failure wins:
//!
//! 1. length (at least one Variant A frame)
//! 2. footer byte
//! 3. checksum byte
//! 4. header byte
//! 5. variant (frame length)
//!
//! This matches the order the device firmware uses, so a frame with both a
//! bad footer and a bad checksum is reported as [`FrameError::InvalidFooter`].

use crate::constants::{FOOTER, HEADER, MIN_FRAME_SIZE, TRAILER_SIZE};
use crate::error::FrameError;
use crate::params::Variant;

/// Modulo-256 sum of `bytes`.
///
/// Byte order does not affect the result, so transposed bytes go undetected.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Validate a complete frame (header through footer) and return its variant.
pub fn validate(frame: &[u8]) -> Result<Variant, FrameError> {
    if frame.len() < MIN_FRAME_SIZE {
        return Err(FrameError::FrameTooShort {
            expected: MIN_FRAME_SIZE,
            actual: frame.len(),
        });
    }

    let footer = frame[frame.len() - 1];
    if footer != FOOTER {
        return Err(FrameError::InvalidFooter { found: footer });
    }

    let body_end = frame.len() - TRAILER_SIZE;
    let found = frame[body_end];
    let computed = checksum(&frame[..body_end]);
    if computed != found {
        return Err(FrameError::ChecksumMismatch { computed, found });
    }

    if frame[0] != HEADER {
        return Err(FrameError::InvalidHeader { found: frame[0] });
    }

    Variant::from_frame_len(frame.len()).ok_or(FrameError::UnknownVariant { len: frame.len() })
}
