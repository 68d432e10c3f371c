//! Persisted session storage.
//!
//! The document mirrors what a browser frontend keeps under `auth-storage`:
//! the bearer token and the last verified user. [`FileStorage`] writes it as
//! JSON on disk so a session survives restarts; [`MemoryStorage`] is for
//! tests and embedders that do their own persistence.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{fs::File, io::AsyncWriteExt, sync::RwLock};
use tracing::warn;

use super::ClientError;
use crate::api::handlers::auth::types::UserResponse;

pub const DEFAULT_FILE_NAME: &str = "auth-storage.json";

#[derive(Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct StoredSession {
    pub token: Option<String>,
    pub user: Option<UserResponse>,
}

impl StoredSession {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.user.is_none()
    }
}

impl std::fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSession")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("user", &self.user.as_ref().map(|user| user.id))
            .finish()
    }
}

#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn load(&self) -> Result<StoredSession, ClientError>;
    async fn save(&self, session: &StoredSession) -> Result<(), ClientError>;
    async fn clear(&self) -> Result<(), ClientError>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    document: RwLock<StoredSession>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(session: StoredSession) -> Self {
        Self {
            document: RwLock::new(session),
        }
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn load(&self) -> Result<StoredSession, ClientError> {
        Ok(self.document.read().await.clone())
    }

    async fn save(&self, session: &StoredSession) -> Result<(), ClientError> {
        *self.document.write().await = session.clone();
        Ok(())
    }

    async fn clear(&self) -> Result<(), ClientError> {
        *self.document.write().await = StoredSession::default();
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage file named [`DEFAULT_FILE_NAME`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_FILE_NAME))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn storage_error(path: &Path, err: impl std::fmt::Display) -> ClientError {
    ClientError::Storage(format!("{}: {err}", path.display()))
}

#[async_trait]
impl SessionStorage for FileStorage {
    /// A missing file is an empty session; an unreadable document is treated
    /// the same so the next save replaces it.
    async fn load(&self) -> Result<StoredSession, ClientError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(StoredSession::default()),
            Err(err) => return Err(storage_error(&self.path, err)),
        };
        match serde_json::from_slice(&bytes) {
            Ok(session) => Ok(session),
            Err(err) => {
                warn!(path = %self.path.display(), "Discarding unreadable session document: {err}");
                Ok(StoredSession::default())
            }
        }
    }

    async fn save(&self, session: &StoredSession) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| storage_error(parent, err))?;
        }
        let document =
            serde_json::to_vec_pretty(session).map_err(|err| storage_error(&self.path, err))?;

        // Write then rename so a crash never leaves a truncated document.
        let staging = self.path.with_extension("json.tmp");
        let mut file = open_staging(&staging).await?;
        file.write_all(&document)
            .await
            .map_err(|err| storage_error(&staging, err))?;
        file.sync_all()
            .await
            .map_err(|err| storage_error(&staging, err))?;
        drop(file);
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|err| storage_error(&self.path, err))
    }

    async fn clear(&self) -> Result<(), ClientError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(storage_error(&self.path, err)),
        }
    }
}

/// Creates the staging file owner-only (0600 on unix) before any byte of the
/// token is written. A leftover from an interrupted save is removed first so
/// its permissions are never inherited.
async fn open_staging(path: &Path) -> Result<File, ClientError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(storage_error(path, err)),
    }
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);
    options
        .open(path)
        .await
        .map_err(|err| storage_error(path, err))
}
