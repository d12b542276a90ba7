//! Session configuration and its mapping onto LAME builder parameters.

#![allow(clippy::module_name_repetitions)]

use mp3lame_encoder::{Bitrate, Quality};

use crate::session::EncoderError;

/// Parameters for opening an encoder session.
///
/// All fields are plain integers; they are validated by LAME when the
/// session is opened, not by this layer. The defaults match a mono voice
/// recording profile (44.1 kHz, 128 kbps CBR, quality 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Number of PCM input channels (1 for mono, 2 for interleaved stereo).
    pub channels: u8,
    /// Input and output sample rate in Hz.
    pub sample_rate: u32,
    /// Target constant bit rate in kbps.
    pub bit_rate: u32,
    /// LAME quality setting, 0 (best) through 9 (worst).
    pub quality: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 44_100,
            bit_rate: 128,
            quality: 6,
        }
    }
}

/// Maps a bit rate in kbps onto the corresponding CBR preset.
///
/// # Errors
///
/// * If the bit rate has no CBR preset
pub(crate) fn bitrate_for(kbps: u32) -> Result<Bitrate, EncoderError> {
    Ok(match kbps {
        64 => Bitrate::Kbps64,
        96 => Bitrate::Kbps96,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        256 => Bitrate::Kbps256,
        320 => Bitrate::Kbps320,
        _ => return Err(EncoderError::UnsupportedBitrate(kbps)),
    })
}

/// Maps a 0-9 quality integer onto the LAME quality scale.
///
/// Values above 9 clamp to the worst quality, mirroring LAME's own handling.
pub(crate) const fn quality_for(quality: u8) -> Quality {
    match quality {
        0 => Quality::Best,
        1 => Quality::SecondBest,
        2 => Quality::NearBest,
        3 => Quality::VeryNice,
        4 => Quality::Nice,
        5 => Quality::Good,
        6 => Quality::Decent,
        7 => Quality::Ok,
        8 => Quality::SecondWorst,
        _ => Quality::Worst,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_default_config_matches_recording_profile() {
        let config = SessionConfig::default();

        assert_eq!(config.channels, 1);
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.bit_rate, 128);
        assert_eq!(config.quality, 6);
    }

    #[test_log::test]
    fn test_bitrate_mapping_covers_cbr_presets() {
        assert!(matches!(bitrate_for(128), Ok(Bitrate::Kbps128)));
        assert!(matches!(bitrate_for(320), Ok(Bitrate::Kbps320)));
    }

    #[test_log::test]
    fn test_bitrate_mapping_rejects_unknown_rates() {
        assert!(matches!(
            bitrate_for(123),
            Err(EncoderError::UnsupportedBitrate(123))
        ));
        assert!(matches!(
            bitrate_for(0),
            Err(EncoderError::UnsupportedBitrate(0))
        ));
    }

    #[test_log::test]
    fn test_quality_mapping_clamps_to_worst() {
        assert!(matches!(quality_for(0), Quality::Best));
        assert!(matches!(quality_for(9), Quality::Worst));
        assert!(matches!(quality_for(200), Quality::Worst));
    }
}
