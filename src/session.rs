//! Bearer credential storage
//!
//! The console keeps exactly one named value: the bearer token returned by
//! the login endpoint. It lives in a small JSON file with a one day expiry,
//! mirroring the cookie the browser console used.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to access token file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Token file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Bearer token attached to backend requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// File-backed store for the single bearer token.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
    lifetime: Duration,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lifetime: Duration::days(1),
        }
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored credential. Missing, expired, or unreadable tokens all
    /// count as "not logged in".
    pub fn load(&self) -> Option<Credential> {
        match self.read() {
            Ok(Some(stored)) if stored.expires_at > Utc::now() => Some(Credential(stored.token)),
            Ok(Some(_)) => {
                debug!("Stored token expired");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Ignoring unreadable token file: {}", e);
                None
            }
        }
    }

    pub fn save(&self, credential: &Credential) -> Result<(), SessionError> {
        let stored = StoredToken {
            token: credential.token().to_string(),
            expires_at: Utc::now() + self.lifetime,
        };
        let body = serde_json::to_string(&stored)?;
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SessionError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        std::fs::write(&self.path, body).map_err(|source| SessionError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        info!("Stored credential in {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Removed credential from {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Io {
                path: self.path.display().to_string(),
                source,
            }),
        }
    }

    fn read(&self) -> Result<Option<StoredToken>, SessionError> {
        let body = match std::fs::read_to_string(&self.path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.display().to_string(),
                    source,
                })
            }
        };
        Ok(Some(serde_json::from_str(&body)?))
    }
}

/// The credential store plus the credential read from it most recently.
#[derive(Debug)]
pub struct Session {
    store: TokenStore,
    credential: Option<Credential>,
}

impl Session {
    pub fn open(store: TokenStore) -> Self {
        let credential = store.load();
        Self { store, credential }
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Re-read the store, picking up logins and expiry since the last read
    pub fn refresh(&mut self) -> Option<&Credential> {
        self.credential = self.store.load();
        self.credential.as_ref()
    }

    pub fn sign_in(&mut self, credential: Credential) -> Result<(), SessionError> {
        self.store.save(&credential)?;
        self.credential = Some(credential);
        Ok(())
    }

    pub fn sign_out(&mut self) -> Result<(), SessionError> {
        self.credential = None;
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_session_sign_in_out() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path().join("token"));
        let mut session = Session::open(store.clone());
        assert!(session.credential().is_none());

        session.sign_in(Credential::new("tok")).unwrap();
        assert_eq!(store.load(), Some(Credential::new("tok")));

        session.sign_out().unwrap();
        assert!(session.refresh().is_none());
    }

    #[test]
    fn test_save_load_clear() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path().join("token"));

        assert!(store.load().is_none());

        store.save(&Credential::new("abc123")).unwrap();
        assert_eq!(store.load().unwrap().token(), "abc123");

        store.clear().unwrap();
        assert!(store.load().is_none());
        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path().join("state").join("posadmin").join("token"));

        store.save(&Credential::new("nested")).unwrap();
        assert_eq!(store.load(), Some(Credential::new("nested")));
    }

    #[test]
    fn test_expired_token_is_absent() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path().join("token")).with_lifetime(Duration::seconds(-1));

        store.save(&Credential::new("stale")).unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_corrupt_file_is_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "not json").unwrap();

        assert!(TokenStore::new(path).load().is_none());
    }

    #[test]
    fn test_credential_debug_hides_token() {
        let credential = Credential::new("secret");
        assert_eq!(format!("{:?}", credential), "Credential(***)");
        assert_eq!(credential.bearer(), "Bearer secret");
    }
}
