//! Durable auth session storage.
//!
//! The session is two string entries in a key/value store: the bearer token
//! under [`TOKEN_KEY`] and the JSON user profile under [`USER_KEY`]. A session
//! counts as authenticated whenever a token is present; validity is only ever
//! decided by the API.
//!
//! Listeners can follow sign-in/sign-out transitions through
//! [`Session::subscribe`]. Front-ends use the `Anonymous` transition to send
//! the user back to the login screen.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use srisri_core::Email;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Storage key for the bearer token.
pub const TOKEN_KEY: &str = "auth_token";

/// Storage key for the JSON-encoded user profile.
pub const USER_KEY: &str = "auth_user";

/// Errors raised by a [`SessionStore`].
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session file {0} is not valid JSON: {1}")]
    Corrupt(PathBuf, String),

    #[error("Failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// String key/value storage that survives process restarts.
pub trait SessionStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;

    /// Delete a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

// =============================================================================
// Stores
// =============================================================================

/// In-process store. Nothing survives the process; used by tests and
/// short-lived tools.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk.
///
/// Every write replaces the file through a temporary sibling and a rename, so
/// a crash never leaves a half-written session. On Unix the file is created
/// readable by the owner only.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, SessionError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| SessionError::Corrupt(self.path.clone(), e.to_string()))
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        restrict_permissions(&tmp)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, apply: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            // A corrupt file is replaced rather than blocking sign-in forever
            Err(SessionError::Corrupt(path, reason)) => {
                warn!(path = %path.display(), %reason, "Discarding corrupt session file");
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        apply(&mut entries);
        self.write_all(&entries)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.update(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
const fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

// =============================================================================
// Session
// =============================================================================

/// Profile of the signed-in admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub email: Email,
    pub name: String,
}

/// Whether a token is currently held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
}

/// Shared handle to the persisted session.
///
/// Cloning is cheap; all clones see the same store and state channel.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    store: Arc<dyn SessionStore>,
    state: watch::Sender<AuthState>,
}

impl Session {
    /// Wrap a store. The initial state reflects whether it already holds a
    /// token.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        let initial = if read_token(store.as_ref()).is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        };
        let (state, _) = watch::channel(initial);

        Self {
            inner: Arc::new(SessionInner { store, state }),
        }
    }

    /// Session backed by a [`MemorySessionStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    /// The stored bearer token, if any.
    ///
    /// Storage read failures are logged and treated as "no token".
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        read_token(self.inner.store.as_ref())
    }

    /// The stored user profile, if any.
    #[must_use]
    pub fn user(&self) -> Option<AuthUser> {
        let raw = match self.inner.store.get(USER_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "Failed to read stored user");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Stored user profile is corrupt");
                None
            }
        }
    }

    /// True iff a token is present. The token is never inspected.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Persist a freshly issued token and profile.
    ///
    /// # Errors
    ///
    /// Returns an error if either entry cannot be written.
    pub fn establish(&self, token: &SecretString, user: &AuthUser) -> Result<(), SessionError> {
        let profile = serde_json::to_string(user)?;
        self.inner.store.set(TOKEN_KEY, token.expose_secret())?;
        self.inner.store.set(USER_KEY, &profile)?;
        self.inner.state.send_replace(AuthState::Authenticated);
        debug!(email = %user.email, "Session established");
        Ok(())
    }

    /// Remove token and profile and publish [`AuthState::Anonymous`].
    ///
    /// Both entries are attempted even if the first removal fails.
    ///
    /// # Errors
    ///
    /// Returns the first storage error encountered.
    pub fn clear(&self) -> Result<(), SessionError> {
        let token = self.inner.store.remove(TOKEN_KEY);
        let user = self.inner.store.remove(USER_KEY);
        self.inner.state.send_replace(AuthState::Anonymous);
        debug!("Session cleared");
        token.and(user)
    }

    /// Follow sign-in/sign-out transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

fn read_token(store: &dyn SessionStore) -> Option<SecretString> {
    match store.get(TOKEN_KEY) {
        Ok(token) => token.filter(|t| !t.is_empty()).map(SecretString::from),
        Err(e) => {
            warn!(error = %e, "Failed to read stored token");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn admin() -> AuthUser {
        AuthUser {
            email: Email::parse("a@b.com").unwrap(),
            name: "A".to_string(),
        }
    }

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("srisri-session-{}", uuid::Uuid::new_v4()))
            .join("session.json")
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemorySessionStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_session_lifecycle() {
        let session = Session::in_memory();
        let mut states = session.subscribe();
        assert!(!session.is_authenticated());
        assert_eq!(*states.borrow_and_update(), AuthState::Anonymous);

        session.establish(&SecretString::from("t1"), &admin()).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.user().unwrap().name, "A");
        assert_eq!(session.token().unwrap().expose_secret(), "t1");
        assert_eq!(*states.borrow_and_update(), AuthState::Authenticated);

        session.clear().unwrap();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
        assert_eq!(*states.borrow_and_update(), AuthState::Anonymous);
    }

    #[test]
    fn test_external_clear_is_seen_immediately() {
        let store = Arc::new(MemorySessionStore::new());
        let session = Session::new(store.clone());
        session.establish(&SecretString::from("t1"), &admin()).unwrap();

        store.remove(TOKEN_KEY).unwrap();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_empty_token_is_anonymous() {
        let store = Arc::new(MemorySessionStore::new());
        store.set(TOKEN_KEY, "").unwrap();
        assert!(!Session::new(store).is_authenticated());
    }

    #[test]
    fn test_corrupt_user_reads_as_none() {
        let store = Arc::new(MemorySessionStore::new());
        store.set(TOKEN_KEY, "t1").unwrap();
        store.set(USER_KEY, "{not json").unwrap();
        let session = Session::new(store);
        assert!(session.is_authenticated());
        assert!(session.user().is_none());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let path = temp_path();

        let first = Session::new(Arc::new(FileSessionStore::new(&path)));
        first.establish(&SecretString::from("t1"), &admin()).unwrap();

        let second = Session::new(Arc::new(FileSessionStore::new(&path)));
        assert!(second.is_authenticated());
        assert_eq!(second.user().unwrap(), admin());
        assert_eq!(*second.subscribe().borrow(), AuthState::Authenticated);

        second.clear().unwrap();
        let third = Session::new(Arc::new(FileSessionStore::new(&path)));
        assert!(!third.is_authenticated());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let store = FileSessionStore::new(temp_path());
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_recovers_from_corrupt_file() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "garbage").unwrap();

        let store = FileSessionStore::new(&path);
        assert!(matches!(store.get(TOKEN_KEY), Err(SessionError::Corrupt(_, _))));

        store.set(TOKEN_KEY, "t2").unwrap();
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("t2"));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
