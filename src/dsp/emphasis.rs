//! Pre-emphasis
//!
//! First-order high-frequency boost: `y[0] = x[0]`, `y[n] = x[n] - alpha * x[n-1]`.

use crate::audio::AudioBuffer;

/// Default pre-emphasis coefficient
pub const DEFAULT_ALPHA: f32 = 0.97;

/// Apply pre-emphasis independently to every channel
pub fn pre_emphasis(buffer: &AudioBuffer, alpha: f32) -> AudioBuffer {
    buffer.map_channels(|samples| pre_emphasis_mono(samples, alpha))
}

fn pre_emphasis_mono(samples: &[f32], alpha: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(samples.len());
    let mut previous = None;

    for &x in samples {
        out.push(match previous {
            None => x,
            Some(prev) => x - alpha * prev,
        });
        previous = Some(x);
    }

    out
}
