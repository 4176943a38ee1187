//! Argument groups shared by the binaries.

use chrono::NaiveDateTime;
use clap::{Args, ValueEnum};
use std::time::Duration;
use triton_lib::constants::DEFAULT_BAUD_RATE;
use triton_lib::{Delimiting, LinkConfig, ParameterSet, Timestamp, Variant};

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VariantArg {
    /// Clock, windows and modes
    #[default]
    A,
    /// Also dive count and pressure threshold
    B,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::A => Variant::A,
            VariantArg::B => Variant::B,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
    /// Serial device, e.g. /dev/ttyACM0 or COM3 (see `triton-rs` for a list)
    #[arg(short, long)]
    pub port: String,
    #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Seconds to wait for the device before giving up
    #[arg(long, default_value_t = 10)]
    pub ack_timeout_secs: u64,
    /// Wrap frames in '$' ... ';'
    #[arg(long)]
    pub delimited: bool,
    #[arg(long, value_enum, default_value_t = VariantArg::A)]
    pub variant: VariantArg,
}

impl LinkArgs {
    pub fn to_config(&self) -> LinkConfig {
        LinkConfig::new(&self.port)
            .with_baud_rate(self.baud)
            .with_ack_timeout(Duration::from_secs(self.ack_timeout_secs))
            .with_variant(self.variant.into())
            .with_delimiting(if self.delimited {
                Delimiting::Delimited
            } else {
                Delimiting::Bare
            })
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ParamArgs {
    #[arg(long, default_value_t = 0)]
    pub sup_start: u16,
    #[arg(long, default_value_t = 0)]
    pub sup_stop: u16,
    #[arg(long, default_value_t = 0)]
    pub exh_start: u16,
    #[arg(long, default_value_t = 0)]
    pub exh_stop: u16,
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=15))]
    pub lcd_mode: u8,
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=15))]
    pub log_mode: u8,
    /// Variant B only; 0 for unlimited
    #[arg(long, default_value_t = 0)]
    pub dive_count: u8,
    /// Variant B only
    #[arg(long, default_value_t = 0)]
    pub press_threshold: u8,
}

impl ParamArgs {
    pub fn to_parameters(&self, timestamp: Timestamp, variant: Variant) -> ParameterSet {
        let params = ParameterSet::new(timestamp)
            .with_windows(self.sup_start, self.sup_stop, self.exh_start, self.exh_stop)
            .with_modes(self.lcd_mode, self.log_mode);
        match variant {
            Variant::A => params,
            Variant::B => params.with_dive(self.dive_count, self.press_threshold),
        }
    }
}

/// Parse `YYYY-MM-DD HH:MM:SS` (or with a `T` separator).
pub fn parse_timestamp(s: &str) -> Result<Timestamp, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .map(|dt| Timestamp::from_datetime(&dt))
        .map_err(|e| format!("expected YYYY-MM-DD HH:MM:SS: {e}"))
}
