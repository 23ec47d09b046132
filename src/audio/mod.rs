//! Audio Module
//!
//! Sample buffers and WAV file I/O.

pub mod buffer;
pub mod io;

pub use buffer::{db_to_linear, peak_of, AudioBuffer};
pub use io::{read_wav, write_wav};
