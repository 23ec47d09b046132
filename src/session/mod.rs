//! Session State Machine
//!
//! Gates the upload → configure → apply → stream workflow:
//!
//! ```text
//! Empty ──upload──▶ Uploaded ──configure──▶ Configured ──apply──▶ Processed
//!   ▲                  │                                              │
//!   └─────delete───────┘                          upload (new asset) ─┘
//! ```

mod registry;
mod state;
mod store;
mod workflow;

pub use registry::{SessionHandle, SessionRegistry};
pub use state::{allowed_operations, transition, Operation, SessionState};
pub use store::SessionStore;
pub use workflow::{sanitize_file_name, Session, SessionStatus};
