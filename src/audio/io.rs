//! WAV file I/O
//!
//! The transcoder hands us 16-bit PCM extracted from the uploaded video and
//! takes 16-bit PCM back for muxing. Integer samples are normalised by the
//! integer type's maximum on read; on write the buffer is clipped to
//! `[-1.0, 1.0]` and re-quantised to 16 bits.

use std::fs;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::debug;

use crate::audio::buffer::AudioBuffer;
use crate::error::{MontageError, Result};

/// Full scale of 24-bit PCM (hound stores it in an i32)
const I24_MAX: f32 = 8_388_607.0;

/// Read a WAV file into a float buffer
///
/// # Errors
/// * `AssetMissing` - If the file does not exist
/// * `InvalidAudio` - If the file is not a valid WAV file
/// * `UnsupportedFormat` - If the bit depth is not 8, 16, 24 or 32
pub fn read_wav(path: &Path) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(MontageError::AssetMissing {
            path: path.to_path_buf(),
        });
    }

    let reader = WavReader::open(path).map_err(|e| MontageError::InvalidAudio {
        reason: format!("Failed to open WAV file {}: {}", path.display(), e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let num_channels = spec.channels as usize;
    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;

    debug!(
        "Read {} ({} ch, {} Hz, {}-bit {:?})",
        path.display(),
        num_channels,
        spec.sample_rate,
        spec.bits_per_sample,
        spec.sample_format
    );

    AudioBuffer::from_interleaved(&interleaved, num_channels, spec.sample_rate)
}

/// Write a buffer as 16-bit PCM WAV, clipping to `[-1.0, 1.0]`
///
/// Parent directories are created as needed.
pub fn write_wav(path: &Path, buffer: &AudioBuffer) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let spec = WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(hound_to_io)?;

    for sample in buffer.to_interleaved() {
        let scaled = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
        writer.write_sample(scaled).map_err(hound_to_io)?;
    }

    writer.finalize().map_err(hound_to_io)?;

    debug!(
        "Wrote {} ({} ch, {} samples)",
        path.display(),
        buffer.num_channels(),
        buffer.len()
    );
    Ok(())
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn hound_to_io(e: hound::Error) -> MontageError {
    match e {
        hound::Error::IoError(io) => MontageError::Io(io),
        other => MontageError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            other.to_string(),
        )),
    }
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let invalid = |e: hound::Error| MontageError::InvalidAudio {
        reason: format!("Failed to read {}-bit samples: {}", bits_per_sample, e),
        source: Some(Box::new(e)),
    };

    match sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid),
        SampleFormat::Int => match bits_per_sample {
            8 => reader
                .samples::<i8>()
                .map(|s| s.map(|v| v as f32 / i8::MAX as f32))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(invalid),
            16 => reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(invalid),
            24 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / I24_MAX))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(invalid),
            32 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / i32::MAX as f32))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(invalid),
            _ => Err(MontageError::UnsupportedFormat {
                format: format!("{}-bit integer audio", bits_per_sample),
            }),
        },
    }
}

// ============================================================================
// Tests
// ============================================================================
