//! Frame encoder/decoder.
//!
//! ```text
//! Variant A: 24 | yy mo dd hh mi ss | SS SS  SP SP  ES ES  EP EP | MODE |             CK | 3B
//! Variant B: 24 | yy mo dd hh mi ss | SS SS  SP SP  ES ES  EP EP | MODE | DIVE PRESS | CK | 3B
//! ```
//!
//! Frames travel as uppercase hex text, optionally wrapped in `$` ... `;`.

use crate::constants::{FOOTER, HEADER, TEXT_END, TEXT_START, TRAILER_SIZE};
use crate::error::FrameError;
use crate::params::{DiveSettings, ParameterSet, Timestamp, Variant, pack_mode, unpack_mode};
use crate::validate::{checksum, validate};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How `$` ... `;` wrapping around the hex text is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiting {
    /// Strip the delimiters when both are present, otherwise read bare hex
    #[default]
    Auto,
    /// Delimiters are required (and emitted when encoding)
    Delimited,
    /// Delimiters are rejected (and never emitted when encoding)
    Bare,
}

/// Options for [`decode_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    pub delimiting: Delimiting,
    /// When set, a frame of any other variant is rejected
    pub expected: Option<Variant>,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delimiting(mut self, delimiting: Delimiting) -> Self {
        self.delimiting = delimiting;
        self
    }

    pub fn expect(mut self, variant: Variant) -> Self {
        self.expected = Some(variant);
        self
    }
}

/// A fully validated frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedFrame {
    pub params: ParameterSet,
    pub variant: Variant,
    pub checksum: u8,
}

/// Build the raw frame bytes, header through footer.
pub fn encode_frame(params: &ParameterSet, variant: Variant) -> Result<Bytes, FrameError> {
    let year_offset = params.timestamp.year_offset()?;
    let dive = match (variant, params.dive) {
        (Variant::B, None) => {
            return Err(FrameError::encoding("dive_count", "Variant B requires dive settings"));
        }
        (Variant::B, Some(dive)) => Some(dive),
        (Variant::A, _) => None,
    };

    let ts = &params.timestamp;
    let mut buf = BytesMut::with_capacity(variant.frame_len());
    buf.put_u8(HEADER);
    buf.put_slice(&[year_offset, ts.month, ts.day, ts.hour, ts.minute, ts.second]);
    buf.put_u16(params.sup_start);
    buf.put_u16(params.sup_stop);
    buf.put_u16(params.exh_start);
    buf.put_u16(params.exh_stop);
    buf.put_u8(pack_mode(params.lcd_mode, params.log_mode));
    if let Some(dive) = dive {
        buf.put_u8(dive.dive_count);
        buf.put_u8(dive.press_threshold);
    }

    let ck = checksum(&buf);
    buf.put_u8(ck);
    buf.put_u8(FOOTER);
    debug_assert_eq!(buf.len(), variant.frame_len());

    Ok(buf.freeze())
}

/// Encode `params` as bare uppercase hex text.
pub fn encode(params: &ParameterSet, variant: Variant) -> Result<String, FrameError> {
    let frame = encode_frame(params, variant)?;
    let text = hex::encode_upper(&frame);
    debug!(%variant, frame = %text, "Encoded frame");
    Ok(text)
}

/// Encode `params`, wrapping the hex text in `$` ... `;` when `delimiting`
/// is [`Delimiting::Delimited`].
pub fn encode_with(params: &ParameterSet, variant: Variant, delimiting: Delimiting) -> Result<String, FrameError> {
    let text = encode(params, variant)?;
    Ok(match delimiting {
        Delimiting::Delimited => format!("{TEXT_START}{text}{TEXT_END}"),
        Delimiting::Auto | Delimiting::Bare => text,
    })
}

/// Decode hex text (bare or `$` ... `;` wrapped) into parameters.
pub fn decode(input: &str) -> Result<ParameterSet, FrameError> {
    decode_with(input, &DecodeOptions::default()).map(|frame| frame.params)
}

/// Decode hex text with explicit delimiter and variant expectations.
pub fn decode_with(input: &str, options: &DecodeOptions) -> Result<DecodedFrame, FrameError> {
    let text = strip_delimiters(input, options.delimiting)?;
    let bytes = hex::decode(text)?;
    let frame = decode_frame(&bytes)?;

    if let Some(expected) = options.expected {
        if expected != frame.variant {
            return Err(FrameError::VariantMismatch {
                expected,
                found: frame.variant,
            });
        }
    }

    debug!(variant = %frame.variant, checksum = frame.checksum, "Decoded frame");
    Ok(frame)
}

/// Validate and unpack raw frame bytes.
pub fn decode_frame(frame: &[u8]) -> Result<DecodedFrame, FrameError> {
    let variant = validate(frame)?;

    let body_end = frame.len() - TRAILER_SIZE;
    let mut body = &frame[1..body_end];

    let timestamp = Timestamp::from_year_offset(
        body.get_u8(),
        body.get_u8(),
        body.get_u8(),
        body.get_u8(),
        body.get_u8(),
        body.get_u8(),
    );
    let sup_start = body.get_u16();
    let sup_stop = body.get_u16();
    let exh_start = body.get_u16();
    let exh_stop = body.get_u16();
    let (lcd_mode, log_mode) = unpack_mode(body.get_u8());
    let dive = variant.has_dive_settings().then(|| DiveSettings {
        dive_count: body.get_u8(),
        press_threshold: body.get_u8(),
    });

    Ok(DecodedFrame {
        params: ParameterSet {
            timestamp,
            sup_start,
            sup_stop,
            exh_start,
            exh_stop,
            lcd_mode,
            log_mode,
            dive,
        },
        variant,
        checksum: frame[body_end],
    })
}

fn strip_delimiters(input: &str, delimiting: Delimiting) -> Result<&str, FrameError> {
    let text = input.trim();
    let inner = if text.len() >= 2 && text.starts_with(TEXT_START) && text.ends_with(TEXT_END) {
        Some(&text[1..text.len() - 1])
    } else {
        None
    };

    match (delimiting, inner) {
        (Delimiting::Auto | Delimiting::Delimited, Some(inner)) => Ok(inner),
        (Delimiting::Auto, None) => Ok(text),
        (Delimiting::Delimited, None) => Err(FrameError::MissingDelimiters),
        (Delimiting::Bare, _) if text.starts_with(TEXT_START) || text.ends_with(TEXT_END) => {
            Err(FrameError::UnexpectedDelimiters)
        }
        (Delimiting::Bare, _) => Ok(text),
    }
}
