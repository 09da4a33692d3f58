//! # Session Credentials
//!
//! Where the channel gets the bearer credential it connects with.
//!
//! ## Lookup Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Credential Lookup                                  │
//! │                                                                         │
//! │  connect(Some(cred)) ──► use cred                                       │
//! │  connect(None)                                                          │
//! │       │                                                                 │
//! │       ├─► in-memory token (set at login)                                │
//! │       │                                                                 │
//! │       ├─► persisted fallback file (survives a console restart)          │
//! │       │     ~/.local/share/bakery-console/session.json (Linux)          │
//! │       │                                                                 │
//! │       └─► SyncError::NoCredential                                       │
//! │                                                                         │
//! │  clear() wipes both. Called on logout.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Credential
// =============================================================================

/// An opaque bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Credential(token.into())
    }

    /// The raw token, for the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential(***)")
    }
}

// =============================================================================
// Credential Source
// =============================================================================

/// Gives the channel the current credential and forgets it on logout.
pub trait CredentialSource: Send + Sync {
    /// The credential to connect with, if any.
    fn current(&self) -> Option<Credential>;

    /// Forgets every stored credential.
    fn clear(&self) -> SyncResult<()>;
}

/// Shape of the persisted fallback file.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    token: Credential,
    saved_at: DateTime<Utc>,
}

/// In-memory credential with a persisted JSON fallback.
///
/// ## Example
/// ```rust,ignore
/// let creds = SessionCredentials::at_default_path();
/// creds.store(Credential::new(login_response.token))?;
/// channel.connect(None).await?;   // picks it up
/// ```
#[derive(Debug)]
pub struct SessionCredentials {
    memory: RwLock<Option<Credential>>,
    path: Option<PathBuf>,
}

impl SessionCredentials {
    /// A source backed by `path`. `None` keeps everything in memory.
    pub fn new(path: Option<PathBuf>) -> Self {
        SessionCredentials {
            memory: RwLock::new(None),
            path,
        }
    }

    /// A source backed by the platform data directory.
    pub fn at_default_path() -> Self {
        Self::new(Self::default_path())
    }

    /// Returns the default fallback file path.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("vn", "bakery", "bakery-console")
            .map(|dirs| dirs.data_dir().join("session.json"))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Keeps `credential` in memory and writes the fallback file.
    pub fn store(&self, credential: Credential) -> SyncResult<()> {
        if credential.is_empty() {
            return Err(SyncError::NoCredential);
        }

        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| SyncError::CredentialStore(e.to_string()))?;
            }
            let session = PersistedSession {
                token: credential.clone(),
                saved_at: Utc::now(),
            };
            let contents = serde_json::to_string_pretty(&session)?;
            std::fs::write(path, contents).map_err(|e| SyncError::CredentialStore(e.to_string()))?;
            debug!(?path, "Credential persisted");
        }

        *self.write_guard() = Some(credential);
        info!("Session credential stored");
        Ok(())
    }

    fn load_persisted(&self) -> Option<Credential> {
        let path = self.path.as_ref()?;
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(?path, error = %e, "Failed to read persisted credential");
                return None;
            }
        };

        match serde_json::from_str::<PersistedSession>(&contents) {
            Ok(session) if !session.token.is_empty() => {
                debug!(saved_at = %session.saved_at, "Using persisted credential");
                Some(session.token)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(?path, error = %e, "Persisted credential is corrupt, ignoring");
                None
            }
        }
    }

    fn write_guard(&self) -> std::sync::RwLockWriteGuard<'_, Option<Credential>> {
        self.memory.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialSource for SessionCredentials {
    fn current(&self) -> Option<Credential> {
        let cached = self
            .memory
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        if cached.is_some() {
            return cached;
        }

        let persisted = self.load_persisted()?;
        *self.write_guard() = Some(persisted.clone());
        Some(persisted)
    }

    fn clear(&self) -> SyncResult<()> {
        *self.write_guard() = None;

        if let Some(path) = &self.path {
            match std::fs::remove_file(path) {
                Ok(()) => debug!(?path, "Persisted credential removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(SyncError::CredentialStore(e.to_string())),
            }
        }

        info!("Session credential cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_secret() {
        let cred = Credential::new("s3cret-token");
        assert_eq!(format!("{:?}", cred), "Credential(***)");
        assert_eq!(cred.expose(), "s3cret-token");
    }

    #[test]
    fn test_memory_only() {
        let creds = SessionCredentials::new(None);
        assert!(creds.current().is_none());

        creds.store(Credential::new("abc")).unwrap();
        assert_eq!(creds.current(), Some(Credential::new("abc")));

        creds.clear().unwrap();
        assert!(creds.current().is_none());
    }

    #[test]
    fn test_persisted_fallback_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        SessionCredentials::new(Some(path.clone()))
            .store(Credential::new("persisted"))
            .unwrap();

        // A fresh source has nothing in memory but finds the file.
        let restarted = SessionCredentials::new(Some(path.clone()));
        assert_eq!(restarted.current(), Some(Credential::new("persisted")));

        restarted.clear().unwrap();
        assert!(!path.exists());
        assert!(SessionCredentials::new(Some(path)).current().is_none());
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(SessionCredentials::new(Some(path)).current().is_none());
    }

    #[test]
    fn test_empty_credential_rejected() {
        let creds = SessionCredentials::new(None);
        assert!(matches!(
            creds.store(Credential::new("  ")),
            Err(SyncError::NoCredential)
        ));
    }

    #[test]
    fn test_clear_without_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let creds = SessionCredentials::new(Some(dir.path().join("missing.json")));
        assert!(creds.clear().is_ok());
    }
}
