//! One-frame-out, one-acknowledgment-in exchange over a byte transport.
//!
//! ```text
//! Idle --open--> PortOpen --send--> FrameSent --await_ack--> Acknowledged
//!                                        |
//!                                        +--timeout/cancel/EOF--> Closed
//! ```
//!
//! `sync_clock` runs from PortOpen and leaves the session there.
//!
//! The transport is any blocking `Read + Write`. Reads are expected to return
//! after the transport's own read timeout (`TimedOut`/`WouldBlock`), which is
//! where the deadline and the [`CancelToken`] are checked.

use crate::codec::{Delimiting, encode_with};
use crate::config::LinkConfig;
use crate::constants::{ACK_TOKEN, FIRMWARE_NAK, NAK_PREFIX};
use crate::error::LinkError;
use crate::params::{ParameterSet, Timestamp, Variant};
use bytes::BytesMut;
use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use strum_macros::Display;
use tracing::{debug, info, warn};

const READ_CHUNK: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionState {
    Idle,
    PortOpen,
    FrameSent,
    Acknowledged,
    Closed,
}

/// Shared flag that stops a pending [`Session::await_ack`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgment {
    /// Hex text that was written to the transport
    pub frame: String,
    /// Every non-empty line received, the acknowledgment line last
    pub lines: Vec<String>,
}

pub struct Session<T> {
    config: LinkConfig,
    state: SessionState,
    transport: Option<T>,
    pending: BytesMut,
    sent: Option<String>,
}

impl<T: Read + Write> Session<T> {
    pub fn new(config: LinkConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            transport: None,
            pending: BytesMut::new(),
            sent: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Attach an already opened transport.
    pub fn open(&mut self, transport: T) -> Result<(), LinkError> {
        match self.state {
            SessionState::Idle | SessionState::Acknowledged | SessionState::Closed => {}
            state => {
                return Err(LinkError::State {
                    operation: "open",
                    state,
                });
            }
        }
        self.transport = Some(transport);
        self.pending.clear();
        self.sent = None;
        self.state = SessionState::PortOpen;
        info!(port = %self.config.port, baud = self.config.baud_rate, "Port open");
        Ok(())
    }

    /// Encode `params` and write the hex text to the transport.
    pub fn send(&mut self, params: &ParameterSet, variant: Variant) -> Result<String, LinkError> {
        if self.state != SessionState::PortOpen {
            return Err(LinkError::State {
                operation: "send",
                state: self.state,
            });
        }
        let delimiting = match self.config.delimiting {
            Delimiting::Delimited => Delimiting::Delimited,
            Delimiting::Auto | Delimiting::Bare => Delimiting::Bare,
        };
        let text = encode_with(params, variant, delimiting)?;

        let transport = self.transport.as_mut().ok_or(LinkError::Closed)?;
        if let Err(e) = transport.write_all(text.as_bytes()).and_then(|_| transport.flush()) {
            self.close();
            return Err(e.into());
        }

        info!(frame = %text, %variant, "Frame sent");
        self.sent = Some(text.clone());
        self.state = SessionState::FrameSent;
        Ok(text)
    }

    /// Read response lines until one carries the acknowledgment token.
    pub fn await_ack(&mut self, cancel: &CancelToken) -> Result<Acknowledgment, LinkError> {
        if self.state != SessionState::FrameSent {
            return Err(LinkError::State {
                operation: "await_ack",
                state: self.state,
            });
        }

        let deadline = Instant::now() + self.config.ack_timeout;
        let mut lines = Vec::new();
        loop {
            let line = self.next_line(deadline, cancel)?;
            if line.contains(ACK_TOKEN) {
                info!(%line, "Device acknowledged frame");
                lines.push(line);
                self.transport = None;
                self.state = SessionState::Acknowledged;
                return Ok(Acknowledgment {
                    frame: self.sent.take().unwrap_or_default(),
                    lines,
                });
            }
            if is_rejection(&line) {
                warn!(%line, "Device rejected frame");
            } else {
                info!(%line, "Received");
            }
            lines.push(line);
        }
    }

    /// Set the device clock: write `YYYY-MM-DD HH:MM:SS` and return the
    /// device's confirmation line. The port stays open.
    pub fn sync_clock(&mut self, timestamp: &Timestamp, cancel: &CancelToken) -> Result<String, LinkError> {
        if self.state != SessionState::PortOpen {
            return Err(LinkError::State {
                operation: "sync_clock",
                state: self.state,
            });
        }

        let text = format!("{timestamp}\n");
        let transport = self.transport.as_mut().ok_or(LinkError::Closed)?;
        if let Err(e) = transport.write_all(text.as_bytes()).and_then(|_| transport.flush()) {
            self.close();
            return Err(e.into());
        }
        info!(%timestamp, "Clock sent");

        let deadline = Instant::now() + self.config.ack_timeout;
        let line = self.next_line(deadline, cancel)?;
        info!(%line, "Device confirmed clock");
        Ok(line)
    }

    // Next non-empty line from the transport; closes the session on failure.
    fn next_line(&mut self, deadline: Instant, cancel: &CancelToken) -> Result<String, LinkError> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(line) = take_line(&mut self.pending) {
                return Ok(line);
            }
            if cancel.is_cancelled() {
                self.close();
                return Err(LinkError::Cancelled);
            }
            if Instant::now() >= deadline {
                self.close();
                return Err(LinkError::Timeout(self.config.ack_timeout));
            }

            let Some(transport) = self.transport.as_mut() else {
                self.close();
                return Err(LinkError::Closed);
            };
            match transport.read(&mut chunk) {
                Ok(0) => {
                    self.close();
                    return Err(LinkError::Closed);
                }
                Ok(n) => {
                    debug!(bytes = n, "Read");
                    self.pending.extend_from_slice(&chunk[..n]);
                }
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted) => {}
                Err(e) => {
                    self.close();
                    return Err(e.into());
                }
            }
        }
    }

    /// Open, send and wait for the acknowledgment in one call.
    pub fn exchange(
        &mut self,
        transport: T,
        params: &ParameterSet,
        variant: Variant,
        cancel: &CancelToken,
    ) -> Result<Acknowledgment, LinkError> {
        self.open(transport)?;
        self.send(params, variant)?;
        self.await_ack(cancel)
    }

    /// Drop the transport. Safe to call in any state.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            info!(port = %self.config.port, "Port closed");
        }
        if self.state != SessionState::Acknowledged {
            self.state = SessionState::Closed;
        }
    }
}

impl Session<Box<dyn SerialPort>> {
    /// Open the configured serial port and move to `PortOpen`.
    pub fn open_serial(&mut self) -> Result<(), LinkError> {
        let port = self.config.serial_builder().open()?;
        self.open(port)
    }
}

/// Lines in which the device reports a frame it refused.
pub(crate) fn is_rejection(line: &str) -> bool {
    line.starts_with(NAK_PREFIX) || line.contains(FIRMWARE_NAK)
}

/// Split the first complete line off `buf`, skipping blank lines.
pub(crate) fn take_line(buf: &mut BytesMut) -> Option<String> {
    loop {
        let pos = buf.iter().position(|b| *b == b'\n')?;
        let raw = buf.split_to(pos + 1);
        let line = String::from_utf8_lossy(&raw).trim().to_string();
        if !line.is_empty() {
            return Some(line);
        }
    }
}
