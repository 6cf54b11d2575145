use crate::store::error::Result;
use crate::store::traits::IdentityStore;
use async_trait::async_trait;
use prattle_core::types::AuthUser;
use std::sync::Mutex;

/// In-memory identity store, mainly for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    current: Mutex<Option<AuthUser>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn load(&self) -> Result<Option<AuthUser>> {
        Ok(self.current.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn save(&self, user: &AuthUser) -> Result<()> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(user.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
