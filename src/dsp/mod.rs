//! DSP Primitives
//!
//! Stateless whole-buffer transforms used by the audio filters. Every
//! function borrows its input and returns a fresh buffer of the same shape.

mod butterworth;
mod dynamics;
mod emphasis;
mod stereo;

pub use butterworth::{
    butterworth_filter, Band, BiquadCoeffs, Butterworth, MAX_NORMALIZED_CUTOFF, MAX_ORDER,
};
pub use dynamics::{gain_compress, peak_normalize, DEFAULT_RATIO, DEFAULT_THRESHOLD};
pub use emphasis::{pre_emphasis, DEFAULT_ALPHA};
pub use stereo::{
    mid_side_reshape, mono_enhancement, stereo_enhancement, DEFAULT_SIDE_ATTENUATION,
    DEFAULT_SIDE_GAIN,
};
