//! Audio Buffer Management
//!
//! The sample buffer every audio filter consumes and produces. Samples are
//! stored non-interleaved as 32-bit floats, one `Vec<f32>` per channel, all
//! channels the same length.

use crate::error::{MontageError, Result};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
///
/// # Arguments
/// * `db` - Value in decibels
///
/// # Returns
/// Linear amplitude (0.0 to 1.0+ range)
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Largest absolute sample value in a slice. Returns 0.0 for empty input.
#[inline]
pub fn peak_of(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Multi-channel floating point sample buffer
///
/// Nominal range is `[-1.0, 1.0]`, but intermediate filter output may exceed
/// it. Filters never change the channel count or the number of samples.
///
/// # Example
/// ```
/// use montage::audio::AudioBuffer;
///
/// let buffer = AudioBuffer::from_channels(vec![vec![0.0; 480], vec![0.0; 480]], 48000).unwrap();
/// assert_eq!(buffer.num_channels(), 2);
/// assert_eq!(buffer.len(), 480);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub channels: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a single-channel buffer
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            channels: vec![samples],
            sample_rate,
        }
    }

    /// Create a buffer from per-channel sample vectors
    ///
    /// Fails when the channel list is empty or the channels differ in length.
    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        let Some(first) = channels.first() else {
            return Err(MontageError::InvalidAudio {
                reason: "buffer has no channels".to_string(),
                source: None,
            });
        };

        let expected = first.len();
        if let Some(bad) = channels.iter().position(|ch| ch.len() != expected) {
            return Err(MontageError::InvalidAudio {
                reason: format!(
                    "channel {} has {} samples, expected {}",
                    bad,
                    channels[bad].len(),
                    expected
                ),
                source: None,
            });
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Create an audio buffer from interleaved sample data
    ///
    /// # Arguments
    /// * `interleaved` - Interleaved sample data (L, R, L, R, ... for stereo)
    /// * `num_channels` - Number of interleaved channels
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Returns
    /// Result containing the AudioBuffer, or error if data length doesn't match the channel count
    pub fn from_interleaved(
        interleaved: &[f32],
        num_channels: usize,
        sample_rate: u32,
    ) -> Result<Self> {
        if num_channels == 0 {
            return Err(MontageError::InvalidAudio {
                reason: "channel count must be at least 1".to_string(),
                source: None,
            });
        }

        if interleaved.len() % num_channels != 0 {
            return Err(MontageError::InvalidAudio {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    num_channels
                ),
                source: None,
            });
        }

        let num_samples = interleaved.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(num_samples); num_channels];

        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                channels[ch].push(sample);
            }
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Convert the buffer to interleaved format
    pub fn to_interleaved(&self) -> Vec<f32> {
        let num_samples = self.len();
        let mut interleaved = Vec::with_capacity(self.num_channels() * num_samples);

        for sample_idx in 0..num_samples {
            for channel in &self.channels {
                interleaved.push(channel[sample_idx]);
            }
        }

        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.channels.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty (no samples)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Get immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    /// Largest absolute sample value across all channels
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .map(|ch| peak_of(ch))
            .fold(0.0_f32, f32::max)
    }

    /// Check if all samples are finite (not NaN or Infinity)
    pub fn is_finite(&self) -> bool {
        self.channels
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|s| s.is_finite())
    }

    /// Build a new buffer by running a mono transform over every channel
    ///
    /// The transform must return as many samples as it was given.
    pub fn map_channels<F>(&self, mut transform: F) -> AudioBuffer
    where
        F: FnMut(&[f32]) -> Vec<f32>,
    {
        let channels = self
            .channels
            .iter()
            .map(|ch| {
                let out = transform(ch);
                debug_assert_eq!(out.len(), ch.len());
                out
            })
            .collect();

        AudioBuffer {
            channels,
            sample_rate: self.sample_rate,
        }
    }

    /// Build a new buffer with every sample multiplied by `factor`
    pub fn scaled(&self, factor: f32) -> AudioBuffer {
        self.map_channels(|ch| ch.iter().map(|s| s * factor).collect())
    }

    /// Build a new buffer with every sample clamped to `[-1.0, 1.0]`
    pub fn clipped(&self) -> AudioBuffer {
        self.map_channels(|ch| ch.iter().map(|s| s.clamp(-1.0, 1.0)).collect())
    }
}

// ============================================================================
// Tests
// ============================================================================
