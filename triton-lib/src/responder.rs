//! Device-side half of the link: reassembles frames from a byte stream,
//! decodes them and answers with one text line per frame.

use crate::codec::{DecodeOptions, DecodedFrame, Delimiting, decode_with};
use crate::constants::{ACK_TOKEN, FRAME_A_SIZE, FRAME_B_SIZE, NAK_PREFIX, TEXT_END, TEXT_START};
use crate::error::{FrameError, LinkError};
use crate::params::Variant;
use crate::session::CancelToken;
use crate::validate::validate;
use std::io::{ErrorKind, Read, Write};
use tracing::{debug, info, warn};

/// Longest `$`-wrapped text kept while waiting for `;`
const MAX_PENDING: usize = FRAME_B_SIZE * 4;

const FRAME_A_HEX: usize = FRAME_A_SIZE * 2;
const FRAME_B_HEX: usize = FRAME_B_SIZE * 2;

/// Splits an incoming character stream into candidate frame texts.
///
/// A candidate ends at a line break or at `;` for `$`-wrapped text. Bare hex
/// has no terminator, so its length decides:
///
/// - 40 characters that validate as Variant B are one frame
/// - otherwise, 36 characters ending in the footer are a Variant A candidate
///   and the rest is kept for the next frame
/// - 36 characters ending in the footer are held until the next characters
///   or [`FrameAssembler::flush`] tell the two variants apart
///
/// With an expected variant, bare hex is cut at that variant's length.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    buf: String,
    expected: Option<Variant>,
}

impl FrameAssembler {
    pub fn new(expected: Option<Variant>) -> Self {
        Self {
            buf: String::new(),
            expected,
        }
    }

    pub fn pending(&self) -> &str {
        &self.buf
    }

    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut out = Vec::new();
        for &b in bytes {
            if let Some(candidate) = self.push_char(b as char) {
                out.push(candidate);
            }
        }
        out
    }

    /// Release a held bare candidate once the line has gone quiet.
    pub fn flush(&mut self) -> Option<String> {
        let complete = !self.is_wrapped() && self.buf.len() >= FRAME_A_HEX;
        complete.then(|| self.take())
    }

    fn is_wrapped(&self) -> bool {
        self.buf.starts_with(TEXT_START)
    }

    fn push_char(&mut self, c: char) -> Option<String> {
        let wrapped = self.is_wrapped();
        match c {
            '\r' | '\n' => (!self.buf.is_empty()).then(|| self.take()),
            TEXT_START => {
                let held = self.flush();
                if !self.buf.is_empty() {
                    debug!(discarded = %self.buf, "Dropping partial frame");
                }
                self.buf.clear();
                self.buf.push(c);
                held
            }
            TEXT_END if wrapped => {
                self.buf.push(c);
                Some(self.take())
            }
            _ if wrapped => {
                self.buf.push(c);
                if self.buf.len() >= MAX_PENDING {
                    warn!(len = self.buf.len(), "Delimited text too long, discarding");
                    self.buf.clear();
                }
                None
            }
            c if c.is_ascii_hexdigit() => {
                self.buf.push(c);
                self.resync();
                self.bare_candidate()
            }
            _ => {
                debug!(byte = c as u32, "Ignoring noise");
                None
            }
        }
    }

    // Bare hex must start with the header byte; drop characters until it does.
    fn resync(&mut self) {
        while self.buf.len() >= 2 && !self.buf.starts_with("24") {
            self.buf.remove(0);
        }
    }

    fn bare_candidate(&mut self) -> Option<String> {
        let len = self.buf.len();
        if let Some(variant) = self.expected {
            return (len >= variant.hex_len()).then(|| self.take());
        }
        if len < FRAME_B_HEX {
            return None;
        }

        if self.validates() || !self.buf[FRAME_A_HEX - 2..FRAME_A_HEX].eq_ignore_ascii_case("3B") {
            return Some(self.take());
        }
        let rest = self.buf.split_off(FRAME_A_HEX);
        let candidate = std::mem::replace(&mut self.buf, rest);
        self.resync();
        Some(candidate)
    }

    fn validates(&self) -> bool {
        hex::decode(&self.buf)
            .map(|bytes| validate(&bytes).is_ok())
            .unwrap_or(false)
    }

    fn take(&mut self) -> String {
        std::mem::take(&mut self.buf)
    }
}

/// Outcome of handling one candidate frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub outcome: Result<DecodedFrame, FrameError>,
    /// Newline-terminated line to send back to the host
    pub reply: String,
}

impl Response {
    pub fn is_ack(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Counters reported when [`Responder::serve`] returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeStats {
    pub accepted: usize,
    pub rejected: usize,
}

/// Simulated device endpoint.
#[derive(Debug)]
pub struct Responder {
    options: DecodeOptions,
    assembler: FrameAssembler,
    stats: ServeStats,
}

impl Responder {
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            assembler: FrameAssembler::new(options.expected),
            stats: ServeStats::default(),
        }
    }

    pub fn stats(&self) -> ServeStats {
        self.stats
    }

    /// Decode one complete frame text and build the reply line.
    pub fn handle(&mut self, text: &str) -> Response {
        debug!(%text, "Decoding");
        let outcome = decode_with(text, &self.options);
        let reply = match &outcome {
            Ok(frame) => {
                self.stats.accepted += 1;
                info!(variant = %frame.variant, checksum = frame.checksum, "Frame accepted\n{}", frame.params);
                format!("{ACK_TOKEN}\n")
            }
            Err(e) => {
                self.stats.rejected += 1;
                warn!(%text, error = %e, "Frame rejected");
                format!("{NAK_PREFIX} ({e})\n")
            }
        };
        Response { outcome, reply }
    }

    /// Feed raw bytes; returns a response for every frame they complete.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Response> {
        self.assembler
            .push(bytes)
            .into_iter()
            .map(|text| self.handle(&text))
            .collect()
    }

    /// Answer a bare frame still held by the assembler. Call when reads go quiet.
    pub fn idle(&mut self) -> Vec<Response> {
        self.assembler
            .flush()
            .map(|text| self.handle(&text))
            .into_iter()
            .collect()
    }

    /// Answer frames on `stream` until EOF or `cancel` trips.
    pub fn serve<S: Read + Write>(&mut self, stream: &mut S, cancel: &CancelToken) -> Result<ServeStats, LinkError> {
        let mut chunk = [0u8; 128];
        while !cancel.is_cancelled() {
            let responses = match stream.read(&mut chunk) {
                Ok(0) => {
                    for response in self.idle() {
                        stream.write_all(response.reply.as_bytes())?;
                    }
                    stream.flush()?;
                    info!("Stream closed");
                    break;
                }
                Ok(n) => self.feed(&chunk[..n]),
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => self.idle(),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            for response in responses {
                stream.write_all(response.reply.as_bytes())?;
                stream.flush()?;
            }
        }
        Ok(self.stats)
    }
}

impl Default for Responder {
    fn default() -> Self {
        Self::new(DecodeOptions::new().delimiting(Delimiting::Auto))
    }
}
