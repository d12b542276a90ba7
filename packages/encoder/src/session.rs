//! The encoder session: one live LAME instance plus its scratch buffers.

#![allow(clippy::module_name_repetitions)]

use std::mem;

use mp3lame_encoder::{Builder, DualPcm, Encoder, FlushNoGap, InterleavedPcm};
use thiserror::Error;

use crate::EncodeOutput;
use crate::config::{SessionConfig, bitrate_for, quality_for};
use crate::downmix;

/// Worst-case byte count LAME can emit when flushing its internal state.
pub const FLUSH_BUFFER_SIZE: usize = 7200;

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum EncoderError {
    /// Error from the LAME encode or flush primitives
    #[error("Encoder error")]
    Encode(mp3lame_encoder::EncodeError),
    /// Error applying or finalizing encoder parameters
    #[error("Build error")]
    Build(mp3lame_encoder::BuildError),
    #[error("LAME builder unavailable")]
    BuilderUnavailable,
    #[error("No CBR preset for {0} kbps")]
    UnsupportedBitrate(u32),
    #[error("Empty input buffer")]
    EmptyInput,
    #[error("Sample count must be positive")]
    EmptyWindow,
    #[error("Window {offset}+{count} out of bounds for buffer of {len} samples")]
    WindowOutOfBounds {
        len: usize,
        offset: usize,
        count: usize,
    },
    #[error("Channel count must be positive")]
    InvalidChannelCount,
    #[error("No open encoder session")]
    NotOpen,
}

impl From<mp3lame_encoder::EncodeError> for EncoderError {
    fn from(value: mp3lame_encoder::EncodeError) -> Self {
        Self::Encode(value)
    }
}

impl From<mp3lame_encoder::BuildError> for EncoderError {
    fn from(value: mp3lame_encoder::BuildError) -> Self {
        Self::Build(value)
    }
}

/// How a PCM window is presented to the encoder.
#[derive(Clone, Copy)]
enum PcmShape {
    Mono,
    Interleaved,
}

/// One encoding stream: an optional live encoder and the scratch buffers
/// reused across calls.
///
/// At most one encoder instance is live per session. Scratch buffers grow on
/// demand and never shrink until [`Mp3Session::close`] releases them.
/// Dropping a live session releases the encoder without flushing; buffered
/// tail samples are lost unless `close` is called first.
pub struct Mp3Session {
    encoder: Option<Encoder>,
    channels: u8,
    mp3_buf: Vec<u8>,
    mono_i16: Vec<i16>,
    mono_f32: Vec<f32>,
}

impl Mp3Session {
    /// Creates a session with no live encoder. No allocation happens until
    /// the first encode call.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            encoder: None,
            channels: 0,
            mp3_buf: Vec::new(),
            mono_i16: Vec::new(),
            mono_f32: Vec::new(),
        }
    }

    /// Whether the session holds a live encoder.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.encoder.is_some()
    }

    /// Current capacity of the MP3 output scratch buffer in bytes.
    #[must_use]
    pub fn output_capacity(&self) -> usize {
        self.mp3_buf.capacity()
    }

    /// Opens a new encoder, fully releasing any previous one first.
    ///
    /// Re-open is idempotent: the prior encoder instance and scratch buffers
    /// are torn down before the new instance is created, so no native handle
    /// leaks. On failure the session is left without a live encoder.
    ///
    /// # Errors
    ///
    /// * If the LAME builder cannot be created
    /// * If the bit rate has no CBR preset
    /// * If LAME rejects a parameter or fails to finalize them
    pub fn open(&mut self, config: SessionConfig) -> Result<(), EncoderError> {
        if self.encoder.is_some() {
            log::debug!("open: releasing previous encoder before re-open");
            self.release();
        }

        let mut builder = Builder::new().ok_or(EncoderError::BuilderUnavailable)?;
        builder.set_num_channels(config.channels)?;
        builder.set_sample_rate(config.sample_rate)?;
        builder.set_brate(bitrate_for(config.bit_rate)?)?;
        builder.set_quality(quality_for(config.quality))?;
        let encoder = builder.build()?;

        log::debug!(
            "open: channels={} sample_rate={} bit_rate={} quality={}",
            config.channels,
            config.sample_rate,
            config.bit_rate,
            config.quality
        );

        self.encoder = Some(encoder);
        self.channels = config.channels;
        Ok(())
    }

    /// Encodes a window of 16-bit PCM samples.
    ///
    /// The window is `samples[offset..offset + count]`. For a mono session
    /// it is fed as single-channel PCM; otherwise it is interleaved frames
    /// matching the channel count the session was opened with.
    ///
    /// # Errors
    ///
    /// * If the window is empty or out of bounds
    /// * If the session has no live encoder
    /// * If LAME reports an encode error
    pub fn encode(
        &mut self,
        samples: &[i16],
        offset: usize,
        count: usize,
    ) -> Result<EncodeOutput, EncoderError> {
        let shape = self.input_shape();
        let window = window(samples, offset, count)?;
        self.encode_window_i16(window, shape)
    }

    /// Encodes a window of float PCM samples in `[-1.0, 1.0]`.
    ///
    /// # Errors
    ///
    /// * If the window is empty or out of bounds
    /// * If the session has no live encoder
    /// * If LAME reports an encode error
    pub fn encode_float(
        &mut self,
        samples: &[f32],
        offset: usize,
        count: usize,
    ) -> Result<EncodeOutput, EncoderError> {
        let shape = self.input_shape();
        let window = window(samples, offset, count)?;
        self.encode_window_f32(window, shape)
    }

    /// Downmixes interleaved 16-bit PCM to mono, then encodes the result.
    ///
    /// The window is grouped into `count / channels` frames; a trailing
    /// partial frame is dropped. Each mono sample is the truncated mean of
    /// its frame. With `channels == 1` this behaves exactly as
    /// [`Mp3Session::encode`].
    ///
    /// # Errors
    ///
    /// * If `channels` is zero
    /// * If the window is empty or out of bounds
    /// * If the session has no live encoder
    /// * If LAME reports an encode error
    pub fn encode_interleaved_mono(
        &mut self,
        samples: &[i16],
        offset: usize,
        count: usize,
        channels: usize,
    ) -> Result<EncodeOutput, EncoderError> {
        if channels == 0 {
            return Err(EncoderError::InvalidChannelCount);
        }
        if channels == 1 {
            return self.encode(samples, offset, count);
        }

        let window = window(samples, offset, count)?;
        let mut mono = mem::take(&mut self.mono_i16);
        downmix::mono_mix_i16(window, channels, &mut mono);
        log::trace!(
            "encode_interleaved_mono: {count} samples over {channels} channels -> {} frames",
            mono.len()
        );
        let result = self.encode_window_i16(&mono, PcmShape::Mono);
        self.mono_i16 = mono;
        result
    }

    /// Downmixes interleaved float PCM to mono, then encodes the result.
    ///
    /// Float variant of [`Mp3Session::encode_interleaved_mono`]; the mean is
    /// exact floating-point arithmetic with no truncation.
    ///
    /// # Errors
    ///
    /// * If `channels` is zero
    /// * If the window is empty or out of bounds
    /// * If the session has no live encoder
    /// * If LAME reports an encode error
    pub fn encode_interleaved_mono_float(
        &mut self,
        samples: &[f32],
        offset: usize,
        count: usize,
        channels: usize,
    ) -> Result<EncodeOutput, EncoderError> {
        if channels == 0 {
            return Err(EncoderError::InvalidChannelCount);
        }
        if channels == 1 {
            return self.encode_float(samples, offset, count);
        }

        let window = window(samples, offset, count)?;
        let mut mono = mem::take(&mut self.mono_f32);
        downmix::mono_mix_f32(window, channels, &mut mono);
        log::trace!(
            "encode_interleaved_mono_float: {count} samples over {channels} channels -> {} frames",
            mono.len()
        );
        let result = self.encode_window_f32(&mono, PcmShape::Mono);
        self.mono_f32 = mono;
        result
    }

    /// Flushes the encoder tail and releases the session.
    ///
    /// Without a live encoder this returns an empty byte vector; close is
    /// valid in every state and idempotent. A zero-length flush is a normal
    /// result, not a failure. The encoder handle and scratch buffers are
    /// released even when the flush itself fails.
    ///
    /// # Errors
    ///
    /// * If LAME reports a flush error
    pub fn close(&mut self) -> Result<Vec<u8>, EncoderError> {
        let Some(mut encoder) = self.encoder.take() else {
            return Ok(Vec::new());
        };

        self.mp3_buf.clear();
        self.mp3_buf.reserve(FLUSH_BUFFER_SIZE);
        let flushed = encoder.flush::<FlushNoGap>(self.mp3_buf.spare_capacity_mut());
        drop(encoder);

        let result = match flushed {
            Ok(size) => {
                // SAFETY: flush initialized exactly `size` bytes of the
                // spare capacity reserved above.
                unsafe { self.mp3_buf.set_len(size) };
                log::debug!("close: flushed {size} tail bytes");
                Ok(self.mp3_buf.as_slice().to_vec())
            }
            Err(err) => Err(EncoderError::Encode(err)),
        };

        self.release();
        result
    }

    const fn input_shape(&self) -> PcmShape {
        if self.channels == 1 {
            PcmShape::Mono
        } else {
            PcmShape::Interleaved
        }
    }

    fn release(&mut self) {
        self.encoder = None;
        self.channels = 0;
        self.mp3_buf = Vec::new();
        self.mono_i16 = Vec::new();
        self.mono_f32 = Vec::new();
    }

    fn encode_window_i16(
        &mut self,
        window: &[i16],
        shape: PcmShape,
    ) -> Result<EncodeOutput, EncoderError> {
        let Some(encoder) = self.encoder.as_mut() else {
            return Err(EncoderError::NotOpen);
        };

        self.mp3_buf.clear();
        self.mp3_buf
            .reserve(mp3lame_encoder::max_required_buffer_size(window.len()));
        let size = match shape {
            PcmShape::Mono => encoder.encode(
                DualPcm {
                    left: window,
                    right: window,
                },
                self.mp3_buf.spare_capacity_mut(),
            )?,
            PcmShape::Interleaved => {
                encoder.encode(InterleavedPcm(window), self.mp3_buf.spare_capacity_mut())?
            }
        };
        // SAFETY: encode initialized exactly `size` bytes of the spare
        // capacity reserved above.
        unsafe { self.mp3_buf.set_len(size) };

        log::trace!("encode: {} samples in, {size} bytes out", window.len());

        if size == 0 {
            Ok(EncodeOutput::Buffered)
        } else {
            Ok(EncodeOutput::Bytes(self.mp3_buf.as_slice().to_vec()))
        }
    }

    fn encode_window_f32(
        &mut self,
        window: &[f32],
        shape: PcmShape,
    ) -> Result<EncodeOutput, EncoderError> {
        let Some(encoder) = self.encoder.as_mut() else {
            return Err(EncoderError::NotOpen);
        };

        self.mp3_buf.clear();
        self.mp3_buf
            .reserve(mp3lame_encoder::max_required_buffer_size(window.len()));
        let size = match shape {
            PcmShape::Mono => encoder.encode(
                DualPcm {
                    left: window,
                    right: window,
                },
                self.mp3_buf.spare_capacity_mut(),
            )?,
            PcmShape::Interleaved => {
                encoder.encode(InterleavedPcm(window), self.mp3_buf.spare_capacity_mut())?
            }
        };
        // SAFETY: encode initialized exactly `size` bytes of the spare
        // capacity reserved above.
        unsafe { self.mp3_buf.set_len(size) };

        log::trace!("encode_float: {} samples in, {size} bytes out", window.len());

        if size == 0 {
            Ok(EncodeOutput::Buffered)
        } else {
            Ok(EncodeOutput::Bytes(self.mp3_buf.as_slice().to_vec()))
        }
    }
}

impl Default for Mp3Session {
    fn default() -> Self {
        Self::new()
    }
}

fn window<T>(samples: &[T], offset: usize, count: usize) -> Result<&[T], EncoderError> {
    if samples.is_empty() {
        return Err(EncoderError::EmptyInput);
    }
    if count == 0 {
        return Err(EncoderError::EmptyWindow);
    }

    let out_of_bounds = || EncoderError::WindowOutOfBounds {
        len: samples.len(),
        offset,
        count,
    };
    let end = offset.checked_add(count).ok_or_else(out_of_bounds)?;
    samples.get(offset..end).ok_or_else(out_of_bounds)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test_log::test]
    fn test_window_rejects_malformed_bounds() {
        let samples = [0_i16; 8];

        assert!(matches!(
            window(&samples, 0, 9),
            Err(EncoderError::WindowOutOfBounds {
                len: 8,
                offset: 0,
                count: 9
            })
        ));
        assert!(matches!(
            window(&samples, 8, 1),
            Err(EncoderError::WindowOutOfBounds { .. })
        ));
        assert!(matches!(
            window(&samples, usize::MAX, 2),
            Err(EncoderError::WindowOutOfBounds { .. })
        ));
        assert!(matches!(window(&samples, 0, 0), Err(EncoderError::EmptyWindow)));
        assert!(matches!(
            window::<i16>(&[], 0, 1),
            Err(EncoderError::EmptyInput)
        ));
    }

    #[test_log::test]
    fn test_window_borrows_exact_range() {
        let samples = [1_i16, 2, 3, 4, 5];

        assert_eq!(window(&samples, 1, 3).unwrap(), &[2, 3, 4]);
        assert_eq!(window(&samples, 0, 5).unwrap(), &samples[..]);
    }

    #[test_log::test]
    fn test_encode_without_open_is_rejected_locally() {
        let mut session = Mp3Session::new();
        let samples = [0_i16; 1152];

        assert!(matches!(
            session.encode(&samples, 0, samples.len()),
            Err(EncoderError::NotOpen)
        ));
        assert!(matches!(
            session.encode_interleaved_mono(&samples, 0, samples.len(), 2),
            Err(EncoderError::NotOpen)
        ));
        // Bounds are checked before the session state, so malformed windows
        // never reach the encoder.
        assert!(matches!(
            session.encode(&samples, 1, samples.len()),
            Err(EncoderError::WindowOutOfBounds { .. })
        ));
    }

    #[test_log::test]
    fn test_close_without_open_returns_empty_tail() {
        let mut session = Mp3Session::new();

        assert_eq!(session.close().unwrap(), Vec::<u8>::new());
        // Close stays valid and idempotent in the absent state.
        assert_eq!(session.close().unwrap(), Vec::<u8>::new());
        assert!(!session.is_open());
    }

    #[test_log::test]
    fn test_zero_channel_downmix_is_rejected() {
        let mut session = Mp3Session::new();
        let samples = [0_i16; 4];

        assert!(matches!(
            session.encode_interleaved_mono(&samples, 0, 4, 0),
            Err(EncoderError::InvalidChannelCount)
        ));
        assert!(matches!(
            session.encode_interleaved_mono_float(&[0.0; 4], 0, 4, 0),
            Err(EncoderError::InvalidChannelCount)
        ));
    }
}
