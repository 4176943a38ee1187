use crate::codec::Delimiting;
use crate::constants::DEFAULT_BAUD_RATE;
use crate::params::Variant;
use serde::{Deserialize, Serialize};
use serialport::{DataBits, FlowControl, Parity, SerialPortBuilder, StopBits};
use std::time::Duration;

/// Default per-read timeout; also the granularity of cancellation checks
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Default time to wait for the device's acknowledgment line
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for one serial link to a Triton-Lite device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Resolved device path, e.g. `/dev/ttyACM0` or `COM3`
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout: Duration,
    pub ack_timeout: Duration,
    pub variant: Variant,
    pub delimiting: Delimiting,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            variant: Variant::A,
            delimiting: Delimiting::Bare,
        }
    }
}

impl LinkConfig {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }

    /// Config for firmware that also takes dive count and pressure threshold
    pub fn dive_logger(port: impl Into<String>) -> Self {
        Self::new(port).with_variant(Variant::B)
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_delimiting(mut self, delimiting: Delimiting) -> Self {
        self.delimiting = delimiting;
        self
    }

    /// Serial builder for 8N1 without flow control
    pub fn serial_builder(&self) -> SerialPortBuilder {
        serialport::new(self.port.as_str(), self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.read_timeout)
    }
}
