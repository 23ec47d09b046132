//! Gain compression and peak normalisation
//!
//! Both operate on the whole buffer's peak, across all channels. A silent
//! buffer (peak 0) is passed through rather than divided by zero.

use crate::audio::AudioBuffer;

/// Default compression threshold, relative to the buffer peak
pub const DEFAULT_THRESHOLD: f32 = 0.2;

/// Default compression ratio
pub const DEFAULT_RATIO: f32 = 4.0;

/// Static gain compressor
///
/// The buffer is viewed relative to its own peak. Every sample whose
/// relative magnitude exceeds `threshold` has the excess divided by `ratio`;
/// the rest are returned bit-for-bit. The result is on the original scale.
///
/// Callers guarantee `threshold` in `(0, 1)` and `ratio >= 1`.
pub fn gain_compress(buffer: &AudioBuffer, threshold: f32, ratio: f32) -> AudioBuffer {
    let peak = buffer.peak();
    if peak == 0.0 {
        return buffer.clone();
    }

    buffer.map_channels(|samples| {
        samples
            .iter()
            .map(|&x| {
                let magnitude = x.abs() / peak;
                if magnitude > threshold {
                    let compressed = threshold + (magnitude - threshold) / ratio;
                    x.signum() * compressed * peak
                } else {
                    x
                }
            })
            .collect()
    })
}

/// Divide the buffer by its peak when the peak exceeds 1.0
pub fn peak_normalize(buffer: &AudioBuffer) -> AudioBuffer {
    let peak = buffer.peak();
    if peak <= 1.0 {
        return buffer.clone();
    }
    buffer.map_channels(|samples| samples.iter().map(|&x| x / peak).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compression_formula() {
        let buffer = AudioBuffer::mono(vec![1.0, -1.0, 0.6, 0.1], 48000);
        let out = gain_compress(&buffer, 0.2, 4.0);

        assert_relative_eq!(out.channel(0)[0], 0.4);
        assert_relative_eq!(out.channel(0)[1], -0.4);
        assert_relative_eq!(out.channel(0)[2], 0.3);
        assert_eq!(out.channel(0)[3], 0.1);
    }

    #[test]
    fn test_compression_rescales_to_original_peak() {
        // peak 0.5: 0.5 -> rel 1.0 -> 0.4 -> 0.2 on original scale
        let buffer = AudioBuffer::mono(vec![0.5, 0.05], 48000);
        let out = gain_compress(&buffer, 0.2, 4.0);
        assert_relative_eq!(out.channel(0)[0], 0.2);
        assert_eq!(out.channel(0)[1], 0.05);
    }

    #[test]
    fn test_samples_within_threshold_unchanged() {
        let samples = vec![1.0, 0.2, -0.2, 0.15, -0.001, 0.0];
        let buffer = AudioBuffer::mono(samples.clone(), 48000);
        let out = gain_compress(&buffer, 0.2, 10.0);
        assert_eq!(&out.channel(0)[1..], &samples[1..]);
    }

    #[test]
    fn test_unit_ratio_is_identity() {
        let buffer = AudioBuffer::from_channels(vec![vec![0.9, -0.4], vec![0.3, -0.8]], 48000)
            .unwrap();
        let out = gain_compress(&buffer, 0.2, 1.0);
        for (a, b) in out.channels.iter().flatten().zip(buffer.channels.iter().flatten()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_silent_buffer_passthrough() {
        let silent = AudioBuffer::mono(vec![0.0; 16], 48000);
        assert_eq!(gain_compress(&silent, 0.2, 4.0), silent);
        assert_eq!(peak_normalize(&silent), silent);
    }

    #[test]
    fn test_peak_normalize_caps_at_unity() {
        let buffer = AudioBuffer::from_channels(vec![vec![0.5, 2.5], vec![-3.0, 1.0]], 48000)
            .unwrap();
        let out = peak_normalize(&buffer);
        assert!(out.peak() <= 1.0);
        assert_eq!(out.channel(1)[0], -1.0);
        assert_relative_eq!(out.channel(0)[1], 2.5 / 3.0);
    }

    #[test]
    fn test_peak_normalize_noop_below_unity() {
        let buffer = AudioBuffer::mono(vec![0.5, -1.0, 0.25], 48000);
        assert_eq!(peak_normalize(&buffer), buffer);
    }
}
