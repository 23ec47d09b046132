//! Audio filters and the chain executor
//!
//! Each named effect is a variant carrying its own parsed parameters.
//! Composite effects (voice, phone, car) end with a peak normalisation so
//! their output never exceeds full scale; the compressor does not.

use log::debug;

use crate::audio::{db_to_linear, AudioBuffer};
use crate::dsp;
use crate::error::{MontageError, Result};
use crate::filters::config::FilterSpec;
use crate::filters::params::Params;

/// Names accepted in the `audio` list of a configuration
pub const AUDIO_FILTER_NAMES: &[&str] = &["gainCompressor", "voiceEnhancement", "phone", "car"];

const FILTER_ORDER: usize = 4;

const VOICE_BAND: (f64, f64) = (300.0, 3400.0);
const PHONE_BAND: (f64, f64) = (800.0, 12000.0);
const CAR_LOWPASS: f64 = 10000.0;

/// A configured audio effect
#[derive(Debug, Clone, PartialEq)]
pub enum AudioFilter {
    /// Static compressor relative to the buffer peak
    GainCompressor { threshold: f32, ratio: f32 },
    /// Pre-emphasis, then 300-3400 Hz band-pass
    VoiceEnhancement { alpha: f32 },
    /// Mono-ward mid/side, then 800-12000 Hz band-pass
    Phone { side_attenuation: f32 },
    /// Stereo widening, then 10 kHz low-pass
    Car { side_gain: f32 },
}

impl AudioFilter {
    /// Build a filter from its name and parameter map
    pub fn from_spec(spec: &FilterSpec) -> Result<Self> {
        let params = Params::new(&spec.name, &spec.params);

        match spec.name.as_str() {
            "gainCompressor" => {
                let threshold = params.f32_or(
                    &["threshold", "gainCompressorThreshold"],
                    dsp::DEFAULT_THRESHOLD,
                )?;
                let ratio = params.f32_or(&["ratio"], dsp::DEFAULT_RATIO)?;
                params.ensure(
                    threshold > 0.0 && threshold < 1.0,
                    "threshold",
                    threshold,
                    "between 0 and 1 (exclusive)",
                )?;
                params.ensure(ratio >= 1.0, "ratio", ratio, "at least 1")?;
                Ok(AudioFilter::GainCompressor { threshold, ratio })
            }
            "voiceEnhancement" => {
                let alpha = params.f32_or(&["alpha", "preemphasisAlpha"], dsp::DEFAULT_ALPHA)?;
                params.ensure((0.0..=1.0).contains(&alpha), "alpha", alpha, "between 0 and 1")?;
                Ok(AudioFilter::VoiceEnhancement { alpha })
            }
            "phone" => {
                let side_attenuation = match (
                    params.opt_f32(&["sideAttenuation"])?,
                    params.opt_f32(&["sideAttenuationDb"])?,
                ) {
                    (Some(linear), _) => {
                        params.ensure(
                            (0.0..=1.0).contains(&linear),
                            "sideAttenuation",
                            linear,
                            "between 0 and 1",
                        )?;
                        linear
                    }
                    (None, Some(db)) => db_to_linear(db).clamp(0.0, 1.0),
                    (None, None) => dsp::DEFAULT_SIDE_ATTENUATION,
                };
                Ok(AudioFilter::Phone { side_attenuation })
            }
            "car" => {
                let side_gain = params.f32_or(&["sideGain"], dsp::DEFAULT_SIDE_GAIN)?;
                params.ensure(side_gain >= 0.0, "sideGain", side_gain, "at least 0")?;
                Ok(AudioFilter::Car { side_gain })
            }
            other => Err(MontageError::UnknownFilter {
                domain: "audio",
                name: other.to_string(),
            }),
        }
    }

    /// Registered name of this filter
    pub fn name(&self) -> &'static str {
        match self {
            AudioFilter::GainCompressor { .. } => "gainCompressor",
            AudioFilter::VoiceEnhancement { .. } => "voiceEnhancement",
            AudioFilter::Phone { .. } => "phone",
            AudioFilter::Car { .. } => "car",
        }
    }

    /// Run the filter over a buffer, returning a new buffer of the same shape
    ///
    /// Fails only when a band cannot be designed at the buffer's sample
    /// rate (for example a band-pass whose edges both clamp to the same
    /// frequency).
    pub fn apply(&self, buffer: &AudioBuffer) -> Result<AudioBuffer> {
        let out = match *self {
            AudioFilter::GainCompressor { threshold, ratio } => {
                dsp::gain_compress(buffer, threshold, ratio)
            }
            AudioFilter::VoiceEnhancement { alpha } => {
                let emphasized = dsp::pre_emphasis(buffer, alpha);
                let banded = dsp::butterworth_filter(
                    &emphasized,
                    Some(VOICE_BAND.0),
                    Some(VOICE_BAND.1),
                    FILTER_ORDER,
                )?;
                dsp::peak_normalize(&banded)
            }
            AudioFilter::Phone { side_attenuation } => {
                let narrowed = dsp::mono_enhancement(buffer, side_attenuation);
                let banded = dsp::butterworth_filter(
                    &narrowed,
                    Some(PHONE_BAND.0),
                    Some(PHONE_BAND.1),
                    FILTER_ORDER,
                )?;
                dsp::peak_normalize(&banded)
            }
            AudioFilter::Car { side_gain } => {
                let widened = dsp::stereo_enhancement(buffer, side_gain);
                let filtered =
                    dsp::butterworth_filter(&widened, None, Some(CAR_LOWPASS), FILTER_ORDER)?;
                dsp::peak_normalize(&filtered)
            }
        };

        Ok(out)
    }
}

/// Apply filters left to right, each consuming the previous output
///
/// An empty chain returns a copy of the input.
pub fn apply_audio_chain(buffer: &AudioBuffer, chain: &[AudioFilter]) -> Result<AudioBuffer> {
    let mut current = buffer.clone();

    for (step, filter) in chain.iter().enumerate() {
        current = filter.apply(&current)?;
        debug!(
            "Audio step {} ({}): {} ch x {} samples, peak {:.4}",
            step,
            filter.name(),
            current.num_channels(),
            current.len(),
            current.peak()
        );
    }

    Ok(current)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;
    use test_case::test_case;

    fn noise(len: usize, seed: u32) -> Vec<f32> {
        // xorshift, deterministic
        let mut state = seed.max(1);
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state as f32 / u32::MAX as f32) * 2.0 - 1.0
            })
            .collect()
    }

    fn stereo_noise(len: usize) -> AudioBuffer {
        AudioBuffer::from_channels(vec![noise(len, 7), noise(len, 11)], 48000).unwrap()
    }

    fn spec(name: &str, params: serde_json::Value) -> FilterSpec {
        FilterSpec::with_params(name, params)
    }

    #[test]
    fn test_defaults() {
        assert_eq!(
            AudioFilter::from_spec(&FilterSpec::named("gainCompressor")).unwrap(),
            AudioFilter::GainCompressor {
                threshold: 0.2,
                ratio: 4.0
            }
        );
        assert_eq!(
            AudioFilter::from_spec(&FilterSpec::named("voiceEnhancement")).unwrap(),
            AudioFilter::VoiceEnhancement { alpha: 0.97 }
        );
        assert_eq!(
            AudioFilter::from_spec(&FilterSpec::named("phone")).unwrap(),
            AudioFilter::Phone {
                side_attenuation: 0.3
            }
        );
        assert_eq!(
            AudioFilter::from_spec(&FilterSpec::named("car")).unwrap(),
            AudioFilter::Car { side_gain: 1.5 }
        );
    }

    #[test]
    fn test_legacy_aliases() {
        let f = AudioFilter::from_spec(&spec(
            "gainCompressor",
            json!({"gainCompressorThreshold": 0.5, "ratio": "2"}),
        ))
        .unwrap();
        assert_eq!(
            f,
            AudioFilter::GainCompressor {
                threshold: 0.5,
                ratio: 2.0
            }
        );

        let f =
            AudioFilter::from_spec(&spec("voiceEnhancement", json!({"preemphasisAlpha": 0.9})))
                .unwrap();
        assert_eq!(f, AudioFilter::VoiceEnhancement { alpha: 0.9 });
    }

    #[test]
    fn test_phone_decibel_attenuation() {
        let f = AudioFilter::from_spec(&spec("phone", json!({"sideAttenuationDb": -20.0})))
            .unwrap();
        match f {
            AudioFilter::Phone { side_attenuation } => {
                assert_relative_eq!(side_attenuation, 0.1, epsilon = 1e-6)
            }
            other => panic!("unexpected filter {:?}", other),
        }

        // positive dB would amplify; clamped to 1
        let f = AudioFilter::from_spec(&spec("phone", json!({"sideAttenuationDb": 6.0})))
            .unwrap();
        assert_eq!(
            f,
            AudioFilter::Phone {
                side_attenuation: 1.0
            }
        );
    }

    #[test_case("gainCompressor", json!({"threshold": 0.0}) ; "zero threshold")]
    #[test_case("gainCompressor", json!({"threshold": 1.0}) ; "unit threshold")]
    #[test_case("gainCompressor", json!({"ratio": 0.5}) ; "expanding ratio")]
    #[test_case("voiceEnhancement", json!({"alpha": 1.5}) ; "alpha too large")]
    #[test_case("phone", json!({"sideAttenuation": 2.0}) ; "linear attenuation too large")]
    #[test_case("car", json!({"sideGain": -1.0}) ; "negative side gain")]
    #[test_case("car", json!({"sideGain": "wide"}) ; "non numeric")]
    fn test_invalid_params(name: &str, params: serde_json::Value) {
        let err = AudioFilter::from_spec(&spec(name, params)).unwrap_err();
        assert!(matches!(err, MontageError::InvalidParameter { .. }));
        assert!(err.is_validation());
    }

    #[test]
    fn test_unknown_name() {
        let err = AudioFilter::from_spec(&FilterSpec::named("reverb")).unwrap_err();
        assert!(matches!(err, MontageError::UnknownFilter { domain: "audio", .. }));
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let buffer = stereo_noise(512);
        assert_eq!(apply_audio_chain(&buffer, &[]).unwrap(), buffer);
    }

    #[test_case(AudioFilter::GainCompressor { threshold: 0.2, ratio: 4.0 } ; "compressor")]
    #[test_case(AudioFilter::VoiceEnhancement { alpha: 0.97 } ; "voice")]
    #[test_case(AudioFilter::Phone { side_attenuation: 0.3 } ; "phone")]
    #[test_case(AudioFilter::Car { side_gain: 1.5 } ; "car")]
    fn test_filters_preserve_shape(filter: AudioFilter) {
        let stereo = stereo_noise(2048);
        let out = filter.apply(&stereo).unwrap();
        assert_eq!(out.num_channels(), 2);
        assert_eq!(out.len(), 2048);
        assert_eq!(out.sample_rate, 48000);
        assert!(out.is_finite());

        let mono = AudioBuffer::mono(noise(300, 3), 22050);
        let out = filter.apply(&mono).unwrap();
        assert_eq!(out.num_channels(), 1);
        assert_eq!(out.len(), 300);
    }

    #[test_case(AudioFilter::VoiceEnhancement { alpha: 0.0 } ; "voice")]
    #[test_case(AudioFilter::Phone { side_attenuation: 1.0 } ; "phone")]
    #[test_case(AudioFilter::Car { side_gain: 3.0 } ; "car")]
    fn test_composites_never_exceed_full_scale(filter: AudioFilter) {
        let hot = stereo_noise(4096).scaled(4.0);
        let out = filter.apply(&hot).unwrap();
        assert!(out.peak() <= 1.0 + 1e-6, "peak {}", out.peak());
    }

    #[test]
    fn test_chain_applies_in_order() {
        let buffer = stereo_noise(1024);
        let chain = vec![
            AudioFilter::Car { side_gain: 2.0 },
            AudioFilter::GainCompressor {
                threshold: 0.3,
                ratio: 2.0,
            },
        ];

        let expected = chain[1].apply(&chain[0].apply(&buffer).unwrap()).unwrap();
        assert_eq!(apply_audio_chain(&buffer, &chain).unwrap(), expected);
        // source untouched
        assert_eq!(buffer, stereo_noise(1024));
    }

    #[test]
    fn test_band_design_failure_surfaces() {
        // Nyquist 300 Hz: both voice band edges clamp to 297 Hz
        let buffer = AudioBuffer::mono(noise(64, 5), 600);
        let err = AudioFilter::VoiceEnhancement { alpha: 0.97 }
            .apply(&buffer)
            .unwrap_err();
        assert!(matches!(err, MontageError::FilterDesign { .. }));
    }

    #[test]
    fn test_names_table_matches_variants() {
        for &name in AUDIO_FILTER_NAMES {
            let filter = AudioFilter::from_spec(&FilterSpec::named(name)).unwrap();
            assert_eq!(filter.name(), name);
        }
    }
}
