//! Durable session credential storage.
//!
//! The WhatsApp session credentials are an opaque blob owned by the
//! provider; the bridge only persists the latest acknowledged state so a
//! completed pairing survives process restarts. A missing or unreadable
//! store simply means "request a fresh pairing".

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::common::error::{SessionError, SessionResult};

/// File name of the credential blob inside the session directory.
const CREDS_FILE: &str = "creds.json";

/// Opaque provider credentials.
///
/// The bridge never inspects the contents; it round-trips whatever the
/// provider last reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials(pub serde_json::Value);

impl Credentials {
    /// An empty credential set, forcing a fresh pairing.
    pub fn fresh() -> Self {
        Self(serde_json::Value::Null)
    }

    /// Whether these credentials hold no prior session.
    pub fn is_fresh(&self) -> bool {
        self.0.is_null()
    }
}

/// Persists credentials at a fixed location across restarts.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn creds_path(&self) -> PathBuf {
        self.dir.join(CREDS_FILE)
    }

    /// Load the last persisted credentials.
    ///
    /// A missing or corrupt file is not an error; it yields fresh
    /// credentials and the operator will be asked to pair again.
    pub fn load(&self) -> Credentials {
        let path = self.creds_path();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => {
                info!("No session found at {} - pairing required", path.display());
                return Credentials::fresh();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Credentials(value),
            Err(e) => {
                warn!(
                    "Session file {} is corrupt ({}) - pairing required",
                    path.display(),
                    e
                );
                Credentials::fresh()
            }
        }
    }

    /// Persist the latest credentials.
    ///
    /// Writes to a temporary file and renames it into place so a crash
    /// mid-write never corrupts the previous state. A failed write is
    /// recoverable: the next successful write self-heals the store.
    pub fn save(&self, credentials: &Credentials) -> SessionResult<()> {
        let path = self.creds_path();
        let raw = serde_json::to_string(&credentials.0)?;

        fs::create_dir_all(&self.dir).map_err(|source| SessionError::WriteFailed {
            path: self.dir.display().to_string(),
            source,
        })?;

        let tmp = self.dir.join(format!("{}.tmp", CREDS_FILE));
        write_and_rename(&tmp, &path, &raw).map_err(|source| SessionError::WriteFailed {
            path: path.display().to_string(),
            source,
        })
    }
}

fn write_and_rename(tmp: &Path, path: &Path, raw: &str) -> std::io::Result<()> {
    fs::write(tmp, raw)?;
    fs::rename(tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_missing_returns_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        assert!(store.load().is_fresh());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        let creds = Credentials(json!({"noiseKey": "abc", "registered": true}));
        store.save(&creds).unwrap();

        let loaded = store.load();
        assert!(!loaded.is_fresh());
        assert_eq!(loaded, creds);
    }

    #[test]
    fn test_corrupt_file_returns_fresh() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CREDS_FILE), "{not json").unwrap();

        let store = SessionStore::new(dir.path());
        assert!(store.load().is_fresh());
    }

    #[test]
    fn test_save_overwrites_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        store.save(&Credentials(json!({"epoch": 1}))).unwrap();
        store.save(&Credentials(json!({"epoch": 2}))).unwrap();

        assert_eq!(store.load(), Credentials(json!({"epoch": 2})));
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested/auth"));

        store.save(&Credentials(json!({"ok": true}))).unwrap();
        assert!(!store.load().is_fresh());
    }
}
