//! Mid/side stereo reshaping
//!
//! `mid = (L + R) / 2`, `side = (L - R) / 2`; the side signal is scaled and
//! the pair rebuilt as `L' = mid + side'`, `R' = mid - side'`. A factor above
//! 1 widens the image, below 1 pulls it towards mono. Anything that is not
//! exactly two channels passes through untouched.

use crate::audio::AudioBuffer;

/// Default side gain for stereo enhancement
pub const DEFAULT_SIDE_GAIN: f32 = 1.5;

/// Default side attenuation for mono-ward reshaping
pub const DEFAULT_SIDE_ATTENUATION: f32 = 0.3;

/// Scale the side component of a stereo buffer by `side_factor`
pub fn mid_side_reshape(buffer: &AudioBuffer, side_factor: f32) -> AudioBuffer {
    if buffer.num_channels() != 2 {
        return buffer.clone();
    }

    let (left, right) = (buffer.channel(0), buffer.channel(1));
    let mut out_left = Vec::with_capacity(left.len());
    let mut out_right = Vec::with_capacity(right.len());

    for (&l, &r) in left.iter().zip(right) {
        let mid = (l + r) / 2.0;
        let side = (l - r) / 2.0 * side_factor;
        out_left.push(mid + side);
        out_right.push(mid - side);
    }

    AudioBuffer {
        channels: vec![out_left, out_right],
        sample_rate: buffer.sample_rate,
    }
}

/// Widen the stereo image (`side_gain > 1`)
pub fn stereo_enhancement(buffer: &AudioBuffer, side_gain: f32) -> AudioBuffer {
    mid_side_reshape(buffer, side_gain)
}

/// Narrow the stereo image (`side_attenuation` in `[0, 1]`)
pub fn mono_enhancement(buffer: &AudioBuffer, side_attenuation: f32) -> AudioBuffer {
    mid_side_reshape(buffer, side_attenuation)
}
