//! Butterworth filter design and application
//!
//! Filters are designed from the analog Butterworth prototype, moved to the
//! requested band, and mapped to the z-plane with a pre-warped bilinear
//! transform. The result is kept as a cascade of second-order sections and
//! run causally (direct form I), so the start of the output carries the
//! usual settling transient.
//!
//! Cutoffs are normalised against Nyquist and clamped to at most
//! [`MAX_NORMALIZED_CUTOFF`] so a design always exists.

use std::f64::consts::PI;

use rustfft::num_complex::Complex64;

use crate::audio::AudioBuffer;
use crate::error::{MontageError, Result};

/// Highest cutoff allowed, as a fraction of Nyquist
pub const MAX_NORMALIZED_CUTOFF: f64 = 0.99;

/// Highest filter order accepted by [`Butterworth::design`]
pub const MAX_ORDER: usize = 16;

/// Poles closer than this to the real axis are treated as real
const REAL_POLE_EPSILON: f64 = 1e-12;

/// Which part of the spectrum the filter passes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Band {
    /// Pass below `cutoff` Hz
    LowPass { cutoff: f64 },
    /// Pass above `cutoff` Hz
    HighPass { cutoff: f64 },
    /// Pass between `low` and `high` Hz
    BandPass { low: f64, high: f64 },
}

impl Band {
    /// Pick a band from optional low and high cutoffs
    ///
    /// Only a high cutoff gives a low-pass, only a low cutoff a high-pass,
    /// both give a band-pass.
    pub fn from_cutoffs(lowcut: Option<f64>, highcut: Option<f64>) -> Result<Self> {
        match (lowcut, highcut) {
            (Some(low), Some(high)) => Ok(Band::BandPass { low, high }),
            (None, Some(cutoff)) => Ok(Band::LowPass { cutoff }),
            (Some(cutoff), None) => Ok(Band::HighPass { cutoff }),
            (None, None) => Err(MontageError::FilterDesign {
                reason: "at least one of lowcut/highcut is required".to_string(),
            }),
        }
    }
}

/// Normalised biquad coefficients (a0 = 1)
///
/// A first-order section is stored with `b2 = a2 = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Complex frequency response at digital angular frequency `omega`
    fn response(&self, omega: f64) -> Complex64 {
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        let num = self.b0 + z1 * self.b1 + z2 * self.b2;
        let den = 1.0_f64 + z1 * self.a1 + z2 * self.a2;
        num / den
    }
}

/// Per-section filter history for one channel
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadState {
    /// Direct form I
    fn process(&mut self, input: f64, c: &BiquadCoeffs) -> f64 {
        let output = c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2
            - c.a1 * self.y1
            - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// A designed Butterworth filter
#[derive(Debug, Clone, PartialEq)]
pub struct Butterworth {
    sections: Vec<BiquadCoeffs>,
    sample_rate: u32,
}

impl Butterworth {
    /// Design a Butterworth filter of the given order
    ///
    /// # Errors
    /// `FilterDesign` when the order is 0 or above [`MAX_ORDER`], the sample
    /// rate is 0, a cutoff is not a positive finite number, or the band-pass
    /// low edge is not below the (clamped) high edge.
    pub fn design(order: usize, band: Band, sample_rate: u32) -> Result<Self> {
        if order == 0 || order > MAX_ORDER {
            return Err(MontageError::FilterDesign {
                reason: format!("order {} outside 1..={}", order, MAX_ORDER),
            });
        }
        if sample_rate == 0 {
            return Err(MontageError::FilterDesign {
                reason: "sample rate must be positive".to_string(),
            });
        }

        let nyquist = 0.5 * sample_rate as f64;
        let prototype = prototype_poles(order);

        let (analog_poles, zeros_at_dc, zeros_at_nyquist, reference_omega) = match band {
            Band::LowPass { cutoff } => {
                let warped = prewarp(normalize(cutoff, nyquist)?);
                let poles: Vec<Complex64> = prototype.iter().map(|&p| p * warped).collect();
                (poles, 0, order, 0.0)
            }
            Band::HighPass { cutoff } => {
                let warped = prewarp(normalize(cutoff, nyquist)?);
                let poles: Vec<Complex64> = prototype.iter().map(|&p| warped / p).collect();
                (poles, order, 0, PI)
            }
            Band::BandPass { low, high } => {
                let low = normalize(low, nyquist)?;
                let high = normalize(high, nyquist)?;
                if low >= high {
                    return Err(MontageError::FilterDesign {
                        reason: format!(
                            "band-pass low edge {:.1} Hz must be below high edge {:.1} Hz",
                            low * nyquist,
                            high * nyquist
                        ),
                    });
                }

                let (w1, w2) = (prewarp(low), prewarp(high));
                let bandwidth = w2 - w1;
                let center_sq = w1 * w2;

                let mut poles = Vec::with_capacity(2 * order);
                for &p in &prototype {
                    let half = p * (bandwidth / 2.0);
                    let root = (half * half - center_sq).sqrt();
                    poles.push(half + root);
                    poles.push(half - root);
                }
                (poles, order, order, 2.0 * center_sq.sqrt().atan())
            }
        };

        // Bilinear transform with unit sampling constant: z = (1 + s) / (1 - s)
        let digital: Vec<Complex64> = analog_poles
            .iter()
            .map(|&s| (1.0_f64 + s) / (1.0_f64 - s))
            .collect();

        let sections = build_sections(&digital, zeros_at_dc, zeros_at_nyquist, reference_omega)?;

        Ok(Self {
            sections,
            sample_rate,
        })
    }

    /// Second-order sections, applied first to last
    pub fn sections(&self) -> &[BiquadCoeffs] {
        &self.sections
    }

    /// Magnitude response at `freq_hz`
    pub fn magnitude_at(&self, freq_hz: f64) -> f64 {
        let omega = 2.0 * PI * freq_hz / self.sample_rate as f64;
        self.sections
            .iter()
            .map(|s| s.response(omega).norm())
            .product()
    }

    /// Filter one channel of samples
    pub fn filter(&self, samples: &[f32]) -> Vec<f32> {
        let mut states = vec![BiquadState::default(); self.sections.len()];

        samples
            .iter()
            .map(|&x| {
                let mut y = x as f64;
                for (state, coeffs) in states.iter_mut().zip(&self.sections) {
                    y = state.process(y, coeffs);
                }
                y as f32
            })
            .collect()
    }

    /// Filter every channel of a buffer independently
    pub fn apply(&self, buffer: &AudioBuffer) -> AudioBuffer {
        buffer.map_channels(|samples| self.filter(samples))
    }
}

/// Design and apply a Butterworth filter in one call
///
/// `lowcut`/`highcut` select the band as in [`Band::from_cutoffs`].
pub fn butterworth_filter(
    buffer: &AudioBuffer,
    lowcut: Option<f64>,
    highcut: Option<f64>,
    order: usize,
) -> Result<AudioBuffer> {
    let band = Band::from_cutoffs(lowcut, highcut)?;
    let filter = Butterworth::design(order, band, buffer.sample_rate)?;
    Ok(filter.apply(buffer))
}

// ============================================================================
// Design helpers
// ============================================================================

/// Cutoff as a fraction of Nyquist, clamped to [`MAX_NORMALIZED_CUTOFF`]
fn normalize(cutoff_hz: f64, nyquist: f64) -> Result<f64> {
    if !cutoff_hz.is_finite() || cutoff_hz <= 0.0 {
        return Err(MontageError::FilterDesign {
            reason: format!("cutoff must be a positive frequency, got {}", cutoff_hz),
        });
    }
    Ok((cutoff_hz / nyquist).min(MAX_NORMALIZED_CUTOFF))
}

/// Analog frequency whose bilinear image is the normalised digital cutoff
fn prewarp(normalized: f64) -> f64 {
    (PI * normalized / 2.0).tan()
}

/// Left-half-plane poles of the unit-cutoff analog Butterworth prototype
fn prototype_poles(order: usize) -> Vec<Complex64> {
    let n = order as f64;
    (0..order)
        .map(|k| {
            let theta = PI * (2.0 * k as f64 + 1.0 + n) / (2.0 * n);
            Complex64::from_polar(1.0, theta)
        })
        .collect()
}

/// Group digital poles into sections and attach zeros at z = 1 / z = -1
///
/// Each section is scaled to unit magnitude at `reference_omega`, where the
/// complete Butterworth response is exactly 1.
fn build_sections(
    poles: &[Complex64],
    mut zeros_at_dc: usize,
    mut zeros_at_nyquist: usize,
    reference_omega: f64,
) -> Result<Vec<BiquadCoeffs>> {
    let mut denominators: Vec<(f64, f64, usize)> = Vec::new();
    let mut real_poles = Vec::new();

    for p in poles {
        if p.im > REAL_POLE_EPSILON {
            denominators.push((-2.0 * p.re, p.norm_sqr(), 2));
        } else if p.im.abs() <= REAL_POLE_EPSILON {
            real_poles.push(p.re);
        }
    }

    real_poles.sort_by(|a, b| a.total_cmp(b));
    for pair in real_poles.chunks(2) {
        match pair {
            [r1, r2] => denominators.push((-(r1 + r2), r1 * r2, 2)),
            [r] => denominators.push((-r, 0.0, 1)),
            _ => unreachable!("chunks(2) yields one or two poles"),
        }
    }

    let mut sections = Vec::with_capacity(denominators.len());
    for (a1, a2, degree) in denominators {
        // Numerator polynomial in z^-1, built from this section's share of zeros
        let mut num = [1.0, 0.0, 0.0];
        for slot in 0..degree {
            // take from the larger pool so band-pass sections get one of each
            let zero = if zeros_at_dc > 0 && zeros_at_dc >= zeros_at_nyquist {
                zeros_at_dc -= 1;
                1.0
            } else if zeros_at_nyquist > 0 {
                zeros_at_nyquist -= 1;
                -1.0
            } else {
                continue;
            };
            // multiply by (1 - zero * z^-1)
            for i in (1..=slot + 1).rev() {
                num[i] -= zero * num[i - 1];
            }
        }

        let mut section = BiquadCoeffs {
            b0: num[0],
            b1: num[1],
            b2: num[2],
            a1,
            a2,
        };

        let gain = section.response(reference_omega).norm();
        if !gain.is_finite() || gain < f64::EPSILON {
            return Err(MontageError::FilterDesign {
                reason: "degenerate section gain".to_string(),
            });
        }
        section.b0 /= gain;
        section.b1 /= gain;
        section.b2 /= gain;
        sections.push(section);
    }

    Ok(sections)
}

// ============================================================================
// Tests
// ============================================================================
