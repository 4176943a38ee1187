use crate::constants::{FRAME_A_SIZE, FRAME_B_SIZE, YEAR_BASE, YEAR_MAX};
use crate::error::FrameError;
use chrono::{Datelike, Local, Timelike};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::Display;

/// Frame layout tag.
///
/// The discriminant is the full frame length in bytes, so the tag and the
/// layout can never drift apart.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, IntoPrimitive, TryFromPrimitive, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Variant {
    /// Clock, windows and mode byte
    #[default]
    #[strum(to_string = "Variant A")]
    A = 18,
    /// Variant A plus dive count and pressure threshold after the mode byte
    #[strum(to_string = "Variant B")]
    B = 20,
}

impl Variant {
    /// Number of bytes from header through footer
    pub fn frame_len(self) -> usize {
        u8::from(self) as usize
    }

    /// Number of hex characters the frame occupies on the wire (no delimiters)
    pub fn hex_len(self) -> usize {
        self.frame_len() * 2
    }

    pub fn from_frame_len(len: usize) -> Option<Self> {
        u8::try_from(len).ok().and_then(|l| Variant::try_from(l).ok())
    }

    pub fn has_dive_settings(self) -> bool {
        matches!(self, Variant::B)
    }
}

const _: () = assert!(FRAME_A_SIZE == 18 && FRAME_B_SIZE == 20);

/// Wall-clock fields stamped into every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Timestamp {
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Read the local clock. Only the calling application should do this;
    /// the codec always takes an explicit timestamp.
    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }

    pub fn from_datetime<T: Datelike + Timelike>(dt: &T) -> Self {
        // out-of-range years are rejected later by year_offset()
        let year = u16::try_from(dt.year().max(0)).unwrap_or(u16::MAX);
        Self {
            year,
            month: dt.month() as u8,
            day: dt.day() as u8,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
            second: dt.second() as u8,
        }
    }

    /// One-byte year offset carried on the wire
    pub fn year_offset(&self) -> Result<u8, FrameError> {
        if !(YEAR_BASE..=YEAR_MAX).contains(&self.year) {
            return Err(FrameError::encoding(
                "year",
                format!("{} is outside {}..={}", self.year, YEAR_BASE, YEAR_MAX),
            ));
        }
        Ok((self.year - YEAR_BASE) as u8)
    }

    pub fn from_year_offset(offset: u8, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self::new(YEAR_BASE + offset as u16, month, day, hour, minute, second)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Variant B extension fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DiveSettings {
    /// Number of dives to log, 0 for unlimited
    pub dive_count: u8,
    pub press_threshold: u8,
}

/// The configuration payload carried by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterSet {
    pub timestamp: Timestamp,
    pub sup_start: u16,
    pub sup_stop: u16,
    pub exh_start: u16,
    pub exh_stop: u16,
    /// 4-bit display mode (high nibble of the mode byte)
    pub lcd_mode: u8,
    /// 4-bit logging mode (low nibble of the mode byte)
    pub log_mode: u8,
    /// Present only for Variant B frames
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dive: Option<DiveSettings>,
}

impl ParameterSet {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            sup_start: 0,
            sup_stop: 0,
            exh_start: 0,
            exh_stop: 0,
            lcd_mode: 0,
            log_mode: 0,
            dive: None,
        }
    }

    pub fn with_windows(mut self, sup_start: u16, sup_stop: u16, exh_start: u16, exh_stop: u16) -> Self {
        self.sup_start = sup_start;
        self.sup_stop = sup_stop;
        self.exh_start = exh_start;
        self.exh_stop = exh_stop;
        self
    }

    pub fn with_modes(mut self, lcd_mode: u8, log_mode: u8) -> Self {
        self.lcd_mode = lcd_mode;
        self.log_mode = log_mode;
        self
    }

    pub fn with_dive(mut self, dive_count: u8, press_threshold: u8) -> Self {
        self.dive = Some(DiveSettings {
            dive_count,
            press_threshold,
        });
        self
    }

    /// The variant that carries every field set here
    pub fn natural_variant(&self) -> Variant {
        if self.dive.is_some() { Variant::B } else { Variant::A }
    }

    pub fn mode_byte(&self) -> u8 {
        pack_mode(self.lcd_mode, self.log_mode)
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Timestamp: {}", self.timestamp)?;
        writeln!(f, "Sup Start: {}", self.sup_start)?;
        writeln!(f, "Sup Stop:  {}", self.sup_stop)?;
        writeln!(f, "Exh Start: {}", self.exh_start)?;
        writeln!(f, "Exh Stop:  {}", self.exh_stop)?;
        writeln!(f, "LCD Mode:  {}", self.lcd_mode)?;
        write!(f, "Log Mode:  {}", self.log_mode)?;
        if let Some(dive) = self.dive {
            writeln!(f)?;
            writeln!(f, "Dive Count: {}", dive.dive_count)?;
            write!(f, "Press Threshold: {}", dive.press_threshold)?;
        }
        Ok(())
    }
}

/// Pack two mode values into one byte. Values above 15 are masked to their
/// low nibble, so 16 packs the same as 0.
pub fn pack_mode(lcd_mode: u8, log_mode: u8) -> u8 {
    ((lcd_mode & 0x0F) << 4) | (log_mode & 0x0F)
}

/// Split a mode byte into `(lcd_mode, log_mode)`
pub fn unpack_mode(mode: u8) -> (u8, u8) {
    ((mode >> 4) & 0x0F, mode & 0x0F)
}

/// Narrow a caller-supplied integer to a 16-bit window field without
/// truncating.
pub fn narrow_u16(field: &'static str, value: u32) -> Result<u16, FrameError> {
    u16::try_from(value).map_err(|_| FrameError::encoding(field, format!("{value} does not fit in 2 bytes")))
}

/// Narrow a caller-supplied integer to a one-byte field without truncating.
pub fn narrow_u8(field: &'static str, value: u32) -> Result<u8, FrameError> {
    u8::try_from(value).map_err(|_| FrameError::encoding(field, format!("{value} does not fit in 1 byte")))
}
