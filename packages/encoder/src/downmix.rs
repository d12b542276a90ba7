//! Interleaved-to-mono downmix and PCM conversion helpers.
//!
//! The downmix functions write into a caller-owned scratch `Vec` so that a
//! session can reuse the same allocation across calls. The output is
//! cleared first; capacity is only ever grown.

/// Downmixes interleaved `i16` frames to mono by arithmetic mean.
///
/// The input is treated as consecutive frames of `channels` samples each; a
/// trailing partial frame is dropped. Integer division truncates toward
/// zero.
///
/// # Panics
///
/// * If `channels` is zero
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn mono_mix_i16(samples: &[i16], channels: usize, out: &mut Vec<i16>) {
    out.clear();
    out.reserve(samples.len() / channels);

    if channels == 2 {
        out.extend(
            samples
                .chunks_exact(2)
                .map(|frame| ((i32::from(frame[0]) + i32::from(frame[1])) / 2) as i16),
        );
    } else {
        out.extend(samples.chunks_exact(channels).map(|frame| {
            let sum: i64 = frame.iter().copied().map(i64::from).sum();
            (sum / channels as i64) as i16
        }));
    }
}

/// Downmixes interleaved `f32` frames to mono by arithmetic mean.
///
/// The mean is the frame sum scaled by the reciprocal of the channel count;
/// the two-channel path computes `(l + r) * 0.5` exactly.
///
/// # Panics
///
/// * If `channels` is zero
#[allow(clippy::cast_precision_loss)]
pub fn mono_mix_f32(samples: &[f32], channels: usize, out: &mut Vec<f32>) {
    out.clear();
    out.reserve(samples.len() / channels);

    if channels == 2 {
        out.extend(samples.chunks_exact(2).map(|frame| (frame[0] + frame[1]) * 0.5));
    } else {
        let inverse = 1.0 / channels as f32;
        out.extend(
            samples
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() * inverse),
        );
    }
}

/// Converts a float sample in `[-1.0, 1.0]` to a 16-bit PCM sample.
///
/// Out-of-range input is clamped first, so decoder overshoot never wraps.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn f32_to_i16(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * 32767.0) as i16
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test_log::test]
    fn test_stereo_mix_is_truncated_mean() {
        let mut out = Vec::new();

        mono_mix_i16(&[100, 200, -100, -200], 2, &mut out);
        assert_eq!(out, vec![150, -150]);

        // Truncation toward zero, not floor.
        mono_mix_i16(&[1000, -1001], 2, &mut out);
        assert_eq!(out, vec![0]);
    }

    #[test_log::test]
    fn test_alternating_stereo_cancels_to_silence() {
        let mut out = Vec::new();

        mono_mix_i16(&[1000, -1000, 1000, -1000], 2, &mut out);

        assert_eq!(out, vec![0, 0]);
    }

    #[test_log::test]
    fn test_multichannel_mix_is_mean_per_frame() {
        let mut out = Vec::new();

        mono_mix_i16(&[100, 200, 300, 400, -100, -200, -300, -400], 4, &mut out);

        assert_eq!(out, vec![250, -250]);
    }

    #[test_log::test]
    fn test_trailing_partial_frame_is_dropped() {
        let mut out = Vec::new();

        mono_mix_i16(&[10, 20, 30, 40, 50], 2, &mut out);

        assert_eq!(out, vec![15, 35]);
    }

    #[test_log::test]
    fn test_extreme_samples_do_not_overflow() {
        let mut out = Vec::new();

        mono_mix_i16(&[i16::MIN; 8], 4, &mut out);
        assert_eq!(out, vec![i16::MIN, i16::MIN]);

        mono_mix_i16(&[i16::MAX, i16::MAX], 2, &mut out);
        assert_eq!(out, vec![i16::MAX]);
    }

    #[test_log::test]
    fn test_float_stereo_mix_is_exact() {
        let mut out = Vec::new();

        mono_mix_f32(&[0.25, 0.75, -1.0, 1.0], 2, &mut out);

        assert_eq!(out, vec![0.5, 0.0]);
    }

    #[test_log::test]
    fn test_float_multichannel_mix() {
        let mut out = Vec::new();

        mono_mix_f32(&[0.5, 0.5, 0.5, 0.5, 1.0, 1.0, 1.0, 1.0], 4, &mut out);

        assert_eq!(out, vec![0.5, 1.0]);
    }

    #[test_log::test]
    fn test_scratch_capacity_is_reused() {
        let mut out = Vec::new();

        mono_mix_i16(&[0; 4096], 2, &mut out);
        let capacity = out.capacity();

        mono_mix_i16(&[0; 8], 2, &mut out);

        assert_eq!(out.len(), 4);
        assert_eq!(out.capacity(), capacity);
    }

    #[test_log::test]
    fn test_f32_to_i16_clamps_and_scales() {
        assert_eq!(f32_to_i16(0.0), 0);
        assert_eq!(f32_to_i16(1.0), 32767);
        assert_eq!(f32_to_i16(-1.0), -32767);
        assert_eq!(f32_to_i16(2.0), 32767);
        assert_eq!(f32_to_i16(-2.0), -32767);
    }
}
