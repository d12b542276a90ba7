//! Session-managed MP3 encoding over LAME.
//!
//! This crate wraps the `mp3lame-encoder` bindings behind an [`Mp3Session`]
//! that owns one live encoder instance at a time together with the scratch
//! buffers reused across calls. A session is opened with a [`SessionConfig`],
//! fed PCM windows through the `encode*` operations, and closed to flush the
//! encoder tail.
//!
//! Scratch buffers grow on demand and never shrink while a session is live,
//! so repeated encode calls do not re-allocate once the buffers have reached
//! their working size. Multi-channel interleaved input can be downmixed to
//! mono before encoding via the `encode_interleaved_mono*` operations.
//!
//! # Example
//!
//! ```rust,no_run
//! use audiobridge_encoder::{EncodeOutput, Mp3Session, SessionConfig};
//!
//! # fn example() -> Result<(), audiobridge_encoder::EncoderError> {
//! let mut session = Mp3Session::new();
//! session.open(SessionConfig::default())?;
//!
//! let samples: Vec<i16> = vec![0; 1152];
//! if let EncodeOutput::Bytes(bytes) = session.encode(&samples, 0, samples.len())? {
//!     println!("encoded {} bytes", bytes.len());
//! }
//!
//! let tail = session.close()?;
//! println!("flushed {} tail bytes", tail.len());
//! # Ok(())
//! # }
//! ```

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod downmix;
pub mod session;

pub use config::SessionConfig;
pub use session::{EncoderError, Mp3Session};

/// Outcome of a single encode call.
///
/// LAME buffers input internally until it has enough samples for a full
/// frame, so a call that produces no bytes is normal streaming behavior and
/// is reported as [`EncodeOutput::Buffered`] rather than an error or an
/// empty byte sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeOutput {
    /// The encoder produced this many MP3 bytes for the call.
    Bytes(Vec<u8>),
    /// The input was consumed, but the encoder is still buffering.
    Buffered,
}

impl EncodeOutput {
    /// Encoded bytes, if this call produced any.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::Buffered => None,
        }
    }

    /// Consumes the output, returning the encoded bytes if any.
    #[must_use]
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::Buffered => None,
        }
    }
}
