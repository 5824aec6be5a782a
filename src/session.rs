//! Session token providers.
//!
//! The store only ever reads the token; whoever owns the session decides
//! when it is set or cleared.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use zeroize::Zeroize;

pub trait SessionProvider: Send + Sync {
    /// Current bearer token, if a session is active.
    fn token(&self) -> Option<String>;
}

/// In-memory token holder. The token is wiped from memory on `clear`.
#[derive(Default)]
pub struct StaticSession {
    token: RwLock<Option<String>>,
}

impl StaticSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        if let Ok(mut guard) = self.token.write() {
            if let Some(old) = guard.as_mut() {
                old.zeroize();
            }
            *guard = Some(token.into());
        }
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.token.write() {
            if let Some(old) = guard.as_mut() {
                old.zeroize();
            }
            *guard = None;
        }
    }
}

impl SessionProvider for StaticSession {
    fn token(&self) -> Option<String> {
        self.token
            .read()
            .ok()
            .and_then(|guard| guard.clone())
            .filter(|t| !t.is_empty())
    }
}

/// Reads the token from an environment variable on every call.
pub struct EnvSession {
    var: String,
}

impl EnvSession {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl SessionProvider for EnvSession {
    fn token(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

/// Token persisted in a file, the CLI's equivalent of browser local storage.
/// A missing or empty file means no session.
pub struct FileSession {
    path: PathBuf,
}

impl FileSession {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self, token: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)
    }

    /// Ends the session by removing the token file. Missing file is fine.
    pub fn clear(&self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl SessionProvider for FileSession {
    fn token(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim().to_string();
                (!token.is_empty()).then_some(token)
            }
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.path.display(), error = %e, "failed to read token file");
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_session_set_and_clear() {
        let session = StaticSession::anonymous();
        assert!(session.token().is_none());

        session.set("abc");
        assert_eq!(session.token().as_deref(), Some("abc"));

        session.clear();
        assert!(session.token().is_none());
    }

    #[test]
    fn test_static_session_empty_token_is_no_session() {
        let session = StaticSession::new("");
        assert!(session.token().is_none());
    }

    #[test]
    fn test_file_session_roundtrip() {
        let path = std::env::temp_dir().join(format!(
            "jobboard-session-test-{}",
            std::process::id()
        ));
        let session = FileSession::new(&path);
        assert!(session.token().is_none());

        session.store("tok-123\n").unwrap();
        assert_eq!(session.token().as_deref(), Some("tok-123"));

        session.clear().unwrap();
        assert!(session.token().is_none());
        // clearing twice is harmless
        session.clear().unwrap();
    }

    #[test]
    fn test_env_session_missing_var() {
        let session = EnvSession::new("JOBBOARD_TEST_TOKEN_THAT_IS_NEVER_SET");
        assert!(session.token().is_none());
    }
}
