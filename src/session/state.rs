//! Session states and the transition table
//!
//! `transition` is pure: it only says whether an operation is allowed from a
//! state and where a successful operation lands. Side effects live on
//! [`Session`](super::Session).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MontageError, Result};

/// Where a session is in the upload → configure → apply → stream workflow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Empty,
    Uploaded,
    Configured,
    Processed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Empty => "Empty",
            SessionState::Uploaded => "Uploaded",
            SessionState::Configured => "Configured",
            SessionState::Processed => "Processed",
        };
        f.write_str(name)
    }
}

/// A request against a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Upload,
    Configure,
    Delete,
    Apply,
    Stream,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Upload,
        Operation::Configure,
        Operation::Delete,
        Operation::Apply,
        Operation::Stream,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Upload => "upload",
            Operation::Configure => "configure",
            Operation::Delete => "delete",
            Operation::Apply => "apply",
            Operation::Stream => "stream",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State reached when `op` succeeds from `state`
///
/// | from                  | op          | to           |
/// |-----------------------|-------------|--------------|
/// | Empty, Processed      | `upload`    | Uploaded     |
/// | Uploaded, Configured  | `configure` | Configured   |
/// | Uploaded              | `delete`    | Empty        |
/// | Configured            | `apply`     | Processed    |
/// | Processed             | `stream`    | Processed    |
///
/// Every other pair is an [`MontageError::InvalidTransition`].
pub fn transition(state: SessionState, op: Operation) -> Result<SessionState> {
    use Operation::*;
    use SessionState::*;

    let next = match (state, op) {
        (Empty | Processed, Upload) => Uploaded,
        (Uploaded | Configured, Configure) => Configured,
        (Uploaded, Delete) => Empty,
        (Configured, Apply) => Processed,
        (Processed, Stream) => Processed,
        _ => return Err(MontageError::transition(op.as_str(), state)),
    };
    Ok(next)
}

/// Operations accepted from `state`
pub fn allowed_operations(state: SessionState) -> Vec<Operation> {
    Operation::ALL
        .into_iter()
        .filter(|&op| transition(state, op).is_ok())
        .collect()
}
