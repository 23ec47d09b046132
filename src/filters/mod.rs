//! Filter Registries
//!
//! Audio filters transform sample buffers; video filters render to
//! filter-graph fragments for the transcoder. Both sets are closed enums
//! resolved from `{name, params}` entries at configuration time.

pub mod audio;
pub mod config;
mod params;
pub mod video;

pub use audio::{apply_audio_chain, AudioFilter, AUDIO_FILTER_NAMES};
pub use config::{FilterChainConfig, FilterSpec, ResolvedChain};
pub use video::{build_filter_graph, VideoFilter, VIDEO_FILTER_NAMES};
