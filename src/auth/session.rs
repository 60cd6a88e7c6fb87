use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::auth::Identity;

struct Session {
    identity: Identity,
    expires_at: u64,
}

/// In-process session store for the web surface. Keys are opaque uuid cookie
/// values, entries hold the identity snapshot taken at login time. Entries
/// expire after a fixed max age; expired entries are dropped on access and
/// swept out whenever a new session is created.
///
/// Login and profile update are the only writers. Concurrent updates to the
/// same session resolve as last write wins.
pub struct SessionStore {
    max_age_secs: u64,
    entries: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(max_age_secs: u64) -> Self {
        Self {
            max_age_secs,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a session for a freshly authenticated identity, returning the
    /// opaque cookie value. Every login also sweeps out entries that expired
    /// in the meantime, so abandoned sessions cannot pile up.
    pub fn create(&self, identity: Identity, now: u64) -> String {
        let id = Uuid::new_v4().to_string();
        let session = Session {
            identity,
            expires_at: now + self.max_age_secs,
        };
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.retain(|_, s| s.expires_at > now);
        entries.insert(id.clone(), session);
        id
    }

    /// Looks up the identity snapshot for a session cookie. Returns None for
    /// unknown or expired sessions; expired entries are removed.
    pub fn get(&self, id: &str, now: u64) -> Option<Identity> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        match entries.get(id) {
            Some(session) if session.expires_at > now => Some(session.identity.clone()),
            Some(_) => {
                entries.remove(id);
                None
            }
            None => None,
        }
    }

    /// Destroys a session (logout). Returns false if the session did not
    /// exist.
    pub fn remove(&self, id: &str) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.remove(id).is_some()
    }

    /// Replaces the identity snapshot of a live session. Used by profile
    /// update so name/email changes are reflected without a new login. The
    /// expiry is left untouched.
    pub fn refresh(&self, id: &str, identity: Identity) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        match entries.get_mut(id) {
            Some(session) => {
                session.identity = identity;
                true
            }
            None => false,
        }
    }
}
