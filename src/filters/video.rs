//! Video filter graph builder
//!
//! Video filters are never executed here. Each one renders to an ffmpeg
//! filter-graph fragment; the fragments are joined with commas, in configured
//! order, and handed to the transcoder as a single `-vf` argument.

use crate::error::{MontageError, Result};
use crate::filters::config::FilterSpec;
use crate::filters::params::Params;

/// Names accepted in the `video` list of a configuration
pub const VIDEO_FILTER_NAMES: &[&str] =
    &["grayscale", "colorinvert", "frameInterpolate", "upscale"];

/// Frame rate used by `frameInterpolate` when `targetFps` is absent
pub const DEFAULT_TARGET_FPS: u32 = 60;

/// A configured video filter
#[derive(Debug, Clone, PartialEq)]
pub enum VideoFilter {
    /// Desaturate every frame
    Grayscale,
    /// Per-pixel `255 - v` on every plane
    ColorInvert,
    /// Motion-interpolated frame rate conversion
    FrameInterpolate { target_fps: u32 },
    /// Resize to an exact resolution
    Upscale { width: u32, height: u32 },
}

impl VideoFilter {
    /// Build a filter from its name and parameter map
    pub fn from_spec(spec: &FilterSpec) -> Result<Self> {
        let params = Params::new(&spec.name, &spec.params);

        match spec.name.as_str() {
            "grayscale" => Ok(VideoFilter::Grayscale),
            "colorinvert" => Ok(VideoFilter::ColorInvert),
            "frameInterpolate" => {
                let target_fps = params
                    .opt_positive_u32(&["targetFps"])?
                    .unwrap_or(DEFAULT_TARGET_FPS);
                Ok(VideoFilter::FrameInterpolate { target_fps })
            }
            "upscale" => {
                let (Some(width), Some(height)) = (
                    params.opt_positive_u32(&["width"])?,
                    params.opt_positive_u32(&["height"])?,
                ) else {
                    return Err(MontageError::InvalidParameter {
                        filter: spec.name.clone(),
                        param: "width/height".to_string(),
                        value: "missing".to_string(),
                        expected: "both width and height".to_string(),
                    });
                };
                Ok(VideoFilter::Upscale { width, height })
            }
            other => Err(MontageError::UnknownFilter {
                domain: "video",
                name: other.to_string(),
            }),
        }
    }

    /// Registered name of this filter
    pub fn name(&self) -> &'static str {
        match self {
            VideoFilter::Grayscale => "grayscale",
            VideoFilter::ColorInvert => "colorinvert",
            VideoFilter::FrameInterpolate { .. } => "frameInterpolate",
            VideoFilter::Upscale { .. } => "upscale",
        }
    }

    /// Filter-graph fragment for this step
    pub fn fragment(&self) -> String {
        match self {
            VideoFilter::Grayscale => "hue=s=0".to_string(),
            VideoFilter::ColorInvert => "negate".to_string(),
            VideoFilter::FrameInterpolate { target_fps } => {
                format!("minterpolate=fps={}", target_fps)
            }
            VideoFilter::Upscale { width, height } => format!("scale={}:{}", width, height),
        }
    }
}

/// Join the fragments of a chain into one filter graph
///
/// An empty chain yields an empty string, meaning no `-vf` argument.
pub fn build_filter_graph(chain: &[VideoFilter]) -> String {
    chain
        .iter()
        .map(VideoFilter::fragment)
        .collect::<Vec<_>>()
        .join(",")
}
