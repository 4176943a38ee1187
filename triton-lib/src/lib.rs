pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod form;
pub mod params;
pub mod responder;
pub mod session;
pub mod validate;

#[cfg(test)]
mod tests;

// Re-export the everyday entry points
pub use codec::{DecodeOptions, DecodedFrame, Delimiting, decode, decode_with, encode, encode_with};
pub use config::LinkConfig;
pub use error::{FrameError, LinkError};
pub use params::{DiveSettings, ParameterSet, Timestamp, Variant};
pub use session::{Acknowledgment, CancelToken, Session, SessionState};
pub use validate::checksum;
