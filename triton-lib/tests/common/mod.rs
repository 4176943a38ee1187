//! Common test utilities and shared imports

// Each test binary uses a different subset of these helpers.
#[allow(unused_imports)]
pub use bytes::Bytes;
#[allow(unused_imports)]
pub use hex;
#[allow(unused_imports)]
pub use triton_lib::codec::{DecodeOptions, Delimiting, decode, decode_frame, decode_with, encode, encode_frame};
#[allow(unused_imports)]
pub use triton_lib::error::{FrameError, LinkError};
#[allow(unused_imports)]
pub use triton_lib::params::{DiveSettings, ParameterSet, Timestamp, Variant};
#[allow(unused_imports)]
pub use triton_lib::validate::{checksum, validate};

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;
use triton_lib::responder::Responder;

/// Route library logs to the test harness output. Safe to call from every test.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Reference frame from the device documentation
#[allow(dead_code)]
pub const REFERENCE_FRAME: &str = "2419010713093600320D05100033FF3B583B";

#[allow(dead_code)]
pub fn reference_params() -> ParameterSet {
    ParameterSet::new(Timestamp::new(2025, 1, 7, 19, 9, 54))
        .with_windows(50, 3333, 4096, 13311)
        .with_modes(3, 11)
}

/// Decode hex string to bytes for testing
#[allow(dead_code)]
pub fn hex_to_bytes(hex_data: &str) -> Vec<u8> {
    hex::decode(hex_data).expect("Failed to decode hex")
}

/// Rewrite the checksum byte so only structural checks can fail
#[allow(dead_code)]
pub fn fix_checksum(frame: &mut [u8]) {
    let body_end = frame.len() - 2;
    frame[body_end] = checksum(&frame[..body_end]);
}

/// What the next `read` call on a [`ScriptedPort`] returns.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum ReadEvent {
    Data(Vec<u8>),
    TimedOut,
    Eof,
}

/// Transport that records writes and replays scripted reads. Once the
/// script runs out every read times out, like an idle serial port.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct ScriptedPort {
    pub written: Vec<u8>,
    script: VecDeque<ReadEvent>,
}

#[allow(dead_code)]
impl ScriptedPort {
    pub fn new(script: impl IntoIterator<Item = ReadEvent>) -> Self {
        Self {
            written: Vec::new(),
            script: script.into_iter().collect(),
        }
    }

    pub fn replying(lines: &[&str]) -> Self {
        Self::new(lines.iter().map(|l| ReadEvent::Data(l.as_bytes().to_vec())))
    }
}

impl Read for ScriptedPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.script.pop_front() {
            Some(ReadEvent::Data(mut data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    self.script.push_front(ReadEvent::Data(data.split_off(n)));
                }
                Ok(n)
            }
            Some(ReadEvent::Eof) => Ok(0),
            Some(ReadEvent::TimedOut) | None => {
                thread::sleep(Duration::from_millis(2));
                Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out"))
            }
        }
    }
}

impl Write for ScriptedPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Host-side transport wired straight into a simulated device.
#[allow(dead_code)]
#[derive(Debug)]
pub struct SimulatedDevice {
    pub responder: Responder,
    outbox: VecDeque<u8>,
}

#[allow(dead_code)]
impl SimulatedDevice {
    pub fn new(responder: Responder) -> Self {
        Self {
            responder,
            outbox: VecDeque::new(),
        }
    }
}

impl Read for SimulatedDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.outbox.is_empty() {
            thread::sleep(Duration::from_millis(2));
            // a quiet line lets the device answer a held bare frame
            for response in self.responder.idle() {
                self.outbox.extend(response.reply.bytes());
            }
            return Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out"));
        }
        let n = self.outbox.len().min(buf.len());
        for (slot, byte) in buf.iter_mut().zip(self.outbox.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for SimulatedDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for response in self.responder.feed(buf) {
            self.outbox.extend(response.reply.bytes());
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
