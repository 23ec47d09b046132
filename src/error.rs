//! Error handling for Montage
//!
//! Every failure is either a validation failure (bad input, wrong session
//! state; nothing was changed) or an execution failure (the transcoder or
//! the filesystem let us down; the session stays at its last valid state).

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Montage operations
pub type Result<T> = std::result::Result<T, MontageError>;

/// Broad classification of a [`MontageError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input or an out-of-order request. No side effects were performed.
    Validation,
    /// A runtime failure while doing real work (transcoder, disk, decoding).
    Execution,
}

/// Main error type for Montage operations
#[derive(Error, Debug)]
pub enum MontageError {
    // Validation Errors
    #[error("Unknown {domain} filter: {name}")]
    UnknownFilter { domain: &'static str, name: String },

    #[error("Invalid parameter '{param}' for {filter}: got {value}, expected {expected}")]
    InvalidParameter {
        filter: String,
        param: String,
        value: String,
        expected: String,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Cannot {operation} while session is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: String,
    },

    #[error("Unsupported upload type '{extension}'")]
    UnsupportedUpload { extension: String },

    // Execution Errors
    #[error("Filter design failed: {reason}")]
    FilterDesign { reason: String },

    #[error("Audio extraction failed: {stderr}")]
    Extraction { stderr: String },

    #[error("Muxing failed: {stderr}")]
    Muxing { stderr: String },

    #[error("Could not launch transcoder '{program}'")]
    TranscoderUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Asset missing: {path}")]
    AssetMissing { path: PathBuf },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MontageError {
    /// Shorthand for an out-of-order session request
    pub fn transition(operation: &'static str, state: impl ToString) -> Self {
        MontageError::InvalidTransition {
            operation,
            state: state.to_string(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            MontageError::UnknownFilter { .. } => "UNKNOWN_FILTER",
            MontageError::InvalidParameter { .. } => "INVALID_PARAMETER",
            MontageError::InvalidConfig { .. } => "INVALID_CONFIG",
            MontageError::InvalidTransition { .. } => "INVALID_TRANSITION",
            MontageError::UnsupportedUpload { .. } => "UNSUPPORTED_UPLOAD",
            MontageError::FilterDesign { .. } => "FILTER_DESIGN",
            MontageError::Extraction { .. } => "EXTRACTION_FAILED",
            MontageError::Muxing { .. } => "MUXING_FAILED",
            MontageError::TranscoderUnavailable { .. } => "TRANSCODER_UNAVAILABLE",
            MontageError::AssetMissing { .. } => "ASSET_MISSING",
            MontageError::InvalidAudio { .. } => "INVALID_AUDIO",
            MontageError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            MontageError::SessionNotFound { .. } => "SESSION_NOT_FOUND",
            MontageError::Io(_) => "IO_ERROR",
            MontageError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Classify this error as a validation or execution failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            MontageError::UnknownFilter { .. }
            | MontageError::InvalidParameter { .. }
            | MontageError::InvalidConfig { .. }
            | MontageError::InvalidTransition { .. }
            | MontageError::UnsupportedUpload { .. } => ErrorKind::Validation,
            _ => ErrorKind::Execution,
        }
    }

    /// Check if this is a validation failure
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Check if the same request can succeed after the caller fixes input or retries
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            MontageError::TranscoderUnavailable { .. } | MontageError::SessionNotFound { .. }
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            MontageError::UnknownFilter { .. } => {
                Some("Run 'montage-cli filters' to list the registered filters.")
            }
            MontageError::InvalidTransition { .. } => {
                Some("Run 'montage-cli status' to see which step comes next.")
            }
            MontageError::UnsupportedUpload { .. } => {
                Some("Upload one of: .mp4, .mov, .mkv, .webm, .avi")
            }
            MontageError::Extraction { .. } | MontageError::Muxing { .. } => {
                Some("Check the transcoder output above; the session can be re-applied.")
            }
            MontageError::FilterDesign { .. } => {
                Some("Extract at a higher sample rate or reconfigure the audio chain.")
            }
            MontageError::TranscoderUnavailable { .. } => {
                Some("Install ffmpeg or point MONTAGE_FFMPEG at the binary.")
            }
            MontageError::AssetMissing { .. } => {
                Some("The uploaded file was removed from disk. Upload it again.")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = MontageError::UnknownFilter {
            domain: "audio",
            name: "reverb".to_string(),
        };
        assert_eq!(err.error_code(), "UNKNOWN_FILTER");
        assert_eq!(err.to_string(), "Unknown audio filter: reverb");
    }

    #[test]
    fn test_error_kinds() {
        assert!(MontageError::transition("apply", "Empty").is_validation());
        assert_eq!(
            MontageError::Muxing {
                stderr: "boom".to_string()
            }
            .kind(),
            ErrorKind::Execution
        );

        let design = MontageError::FilterDesign {
            reason: "band collapsed".to_string(),
        };
        assert_eq!(design.kind(), ErrorKind::Execution);
        assert!(design.recovery_suggestion().is_some());
    }

    #[test]
    fn test_recovery_suggestions() {
        let err = MontageError::Extraction {
            stderr: "no audio stream".to_string(),
        };
        assert!(err.recovery_suggestion().is_some());
        assert!(err.is_recoverable());
    }
}
