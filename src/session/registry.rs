//! Multi-session registry
//!
//! Sessions are keyed by id and each sits behind its own mutex, so requests
//! against one session are serialized while different sessions proceed in
//! parallel. Every session gets a private workspace under
//! `<workspace>/sessions/<id>` so uploads never clear each other's files.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::info;
use uuid::Uuid;

use crate::config::Settings;
use crate::error::{MontageError, Result};
use crate::session::workflow::Session;

const SESSIONS_DIR: &str = "sessions";

/// Shared handle to one session
pub type SessionHandle = Arc<Mutex<Session>>;

/// Live sessions keyed by id
#[derive(Debug)]
pub struct SessionRegistry {
    settings: Settings,
    sessions: Mutex<HashMap<Uuid, SessionHandle>>,
}

/// A poisoned lock still holds a consistent session: every operation
/// validates before it mutates.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionRegistry {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Start a new `Empty` session and return its id
    pub fn create(&self) -> Uuid {
        let session = Session::new();
        let id = session.id;
        lock(&self.sessions).insert(id, Arc::new(Mutex::new(session)));
        info!("Registered session {}", id);
        id
    }

    /// Handle to a live session
    pub fn get(&self, id: Uuid) -> Result<SessionHandle> {
        lock(&self.sessions)
            .get(&id)
            .cloned()
            .ok_or_else(|| MontageError::SessionNotFound { id: id.to_string() })
    }

    /// Settings rooted at the private workspace of session `id`
    pub fn settings_for(&self, id: Uuid) -> Settings {
        let mut settings = self.settings.clone();
        settings.workspace = self
            .settings
            .workspace
            .join(SESSIONS_DIR)
            .join(id.to_string());
        settings
    }

    /// Run `op` with exclusive access to session `id`
    ///
    /// The registry map is only locked long enough to find the session.
    pub fn with_session<R>(
        &self,
        id: Uuid,
        op: impl FnOnce(&mut Session, &Settings) -> Result<R>,
    ) -> Result<R> {
        let handle = self.get(id)?;
        let settings = self.settings_for(id);
        let mut session = lock(&handle);
        op(&mut *session, &settings)
    }

    /// Forget session `id`
    pub fn remove(&self, id: Uuid) -> Result<()> {
        match lock(&self.sessions).remove(&id) {
            Some(_) => {
                info!("Removed session {}", id);
                Ok(())
            }
            None => Err(MontageError::SessionNotFound { id: id.to_string() }),
        }
    }

    pub fn ids(&self) -> Vec<Uuid> {
        lock(&self.sessions).keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.sessions).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
