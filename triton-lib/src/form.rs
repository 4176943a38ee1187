//! Validated parameter entry, kept as an immutable record plus a reducer.
//!
//! Frontends hold a [`ValidatedFormState`], feed every keystroke through
//! [`reduce`] and render whatever comes back. Nothing here knows about
//! widgets.

use crate::error::FrameError;
use crate::params::{ParameterSet, Timestamp, Variant, narrow_u8, narrow_u16};
use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    SupStart,
    SupStop,
    ExhStart,
    ExhStop,
    LcdMode,
    LogMode,
    DiveCount,
    PressThreshold,
}

impl FormField {
    pub const ALL: [FormField; 8] = [
        FormField::SupStart,
        FormField::SupStop,
        FormField::ExhStart,
        FormField::ExhStop,
        FormField::LcdMode,
        FormField::LogMode,
        FormField::DiveCount,
        FormField::PressThreshold,
    ];

    /// Largest accepted value; the smallest is always 0
    pub fn max(self) -> u32 {
        match self {
            FormField::SupStart | FormField::SupStop | FormField::ExhStart | FormField::ExhStop => 65535,
            FormField::LcdMode | FormField::LogMode => 15,
            FormField::DiveCount | FormField::PressThreshold => 255,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::SupStart => "Sup Start",
            FormField::SupStop => "Sup Stop",
            FormField::ExhStart => "Exh Start",
            FormField::ExhStop => "Exh Stop",
            FormField::LcdMode => "LCD Mode",
            FormField::LogMode => "Log Mode",
            FormField::DiveCount => "Dive Count",
            FormField::PressThreshold => "Pressure Threshold",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Current text and last accepted value of one input.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldState {
    pub text: String,
    pub value: u32,
    /// Set when the last edit was not an integer and got reverted
    pub invalid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    Edit { field: FormField, text: String },
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedFormState {
    fields: [FieldState; 8],
}

impl Default for ValidatedFormState {
    fn default() -> Self {
        Self {
            fields: std::array::from_fn(|_| FieldState {
                text: "0".to_string(),
                value: 0,
                invalid: false,
            }),
        }
    }
}

impl ValidatedFormState {
    pub fn field(&self, field: FormField) -> &FieldState {
        &self.fields[field.index()]
    }

    pub fn value(&self, field: FormField) -> u32 {
        self.field(field).value
    }

    /// False while any field shows a reverted edit
    pub fn is_valid(&self) -> bool {
        self.fields.iter().all(|f| !f.invalid)
    }

    /// Build the parameters for one send, stamped with `timestamp`.
    pub fn to_parameters(&self, timestamp: Timestamp, variant: Variant) -> Result<ParameterSet, FrameError> {
        let params = ParameterSet::new(timestamp)
            .with_windows(
                narrow_u16("sup_start", self.value(FormField::SupStart))?,
                narrow_u16("sup_stop", self.value(FormField::SupStop))?,
                narrow_u16("exh_start", self.value(FormField::ExhStart))?,
                narrow_u16("exh_stop", self.value(FormField::ExhStop))?,
            )
            .with_modes(
                narrow_u8("lcd_mode", self.value(FormField::LcdMode))?,
                narrow_u8("log_mode", self.value(FormField::LogMode))?,
            );

        Ok(match variant {
            Variant::A => params,
            Variant::B => params.with_dive(
                narrow_u8("dive_count", self.value(FormField::DiveCount))?,
                narrow_u8("press_threshold", self.value(FormField::PressThreshold))?,
            ),
        })
    }
}

/// Apply one action and return the next state.
///
/// Edits follow these rules:
/// - empty text counts as 0
/// - text that is not an integer reverts to the last accepted value and
///   flags the field
/// - integers outside `0..=max` are clamped into range, however many digits
///   they have
pub fn reduce(state: &ValidatedFormState, action: FormAction) -> ValidatedFormState {
    match action {
        FormAction::Reset => ValidatedFormState::default(),
        FormAction::Edit { field, text } => {
            let mut next = state.clone();
            let previous = state.field(field);
            let trimmed = text.trim();

            next.fields[field.index()] = if trimmed.is_empty() {
                FieldState {
                    text,
                    value: 0,
                    invalid: false,
                }
            } else {
                let parsed = match trimmed.parse::<i64>() {
                    Ok(n) => Some(n),
                    Err(e) => match e.kind() {
                        IntErrorKind::PosOverflow => Some(i64::MAX),
                        IntErrorKind::NegOverflow => Some(i64::MIN),
                        _ => None,
                    },
                };
                match parsed {
                    Some(n) => {
                        let value = n.clamp(0, field.max() as i64) as u32;
                        let text = if value as i64 == n { text } else { value.to_string() };
                        FieldState {
                            text,
                            value,
                            invalid: false,
                        }
                    }
                    None => FieldState {
                        text: previous.value.to_string(),
                        value: previous.value,
                        invalid: true,
                    },
                }
            };
            next
        }
    }
}
