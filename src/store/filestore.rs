use crate::store::error::{Result, StoreError};
use crate::store::traits::IdentityStore;
use async_trait::async_trait;
use log::warn;
use prattle_core::types::AuthUser;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

const IDENTITY_FILE: &str = "identity.json";

/// Stores the signed-in identity as a small JSON document under a base
/// directory. A corrupt or unreadable document is discarded on load, not
/// surfaced as an error.
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    pub async fn new(path: impl Into<PathBuf>) -> io::Result<Self> {
        let base_path = path.into();
        fs::create_dir_all(&base_path).await?;
        Ok(Self { base_path })
    }

    fn identity_path(&self) -> PathBuf {
        self.base_path.join(IDENTITY_FILE)
    }

    async fn remove_if_present(path: &Path) -> Result<()> {
        fs::remove_file(path)
            .await
            .or_else(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    Ok(())
                } else {
                    Err(e)
                }
            })
            .map_err(StoreError::from)
    }
}

#[async_trait]
impl IdentityStore for FileStore {
    async fn load(&self) -> Result<Option<AuthUser>> {
        let path = self.identity_path();
        match fs::read(&path).await {
            Ok(data) => match serde_json::from_slice(&data) {
                Ok(user) => Ok(Some(user)),
                Err(e) => {
                    // A half-written or hand-edited file must not wedge the
                    // client at startup; drop it and start signed out.
                    warn!(target: "Client/Store", "Discarding corrupt identity file: {e}");
                    Self::remove_if_present(&path).await?;
                    Ok(None)
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn save(&self, user: &AuthUser) -> Result<()> {
        let data = serde_json::to_vec_pretty(user)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        fs::write(self.identity_path(), data)
            .await
            .map_err(StoreError::Io)
    }

    async fn clear(&self) -> Result<()> {
        Self::remove_if_present(&self.identity_path()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> AuthUser {
        AuthUser {
            id: "u1".to_string(),
            nickname: "alice".to_string(),
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();

        assert!(store.load().await.unwrap().is_none());
        store.save(&user()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(user()));
    }

    #[tokio::test]
    async fn corrupt_file_is_discarded_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();
        tokio::fs::write(dir.path().join(IDENTITY_FILE), b"{not json")
            .await
            .unwrap();

        assert!(store.load().await.unwrap().is_none());
        // The broken file is gone, so the next load is clean too.
        assert!(store.load().await.unwrap().is_none());
        assert!(!dir.path().join(IDENTITY_FILE).exists());
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();

        store.clear().await.unwrap();
        store.save(&user()).await.unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}
