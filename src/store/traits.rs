use crate::store::error::Result;
use async_trait::async_trait;
use prattle_core::types::AuthUser;

/// Persistence boundary for the signed-in identity. The core consumes this
/// contract but implements no storage policy of its own; the crate ships a
/// JSON file implementation and an in-memory one.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// The persisted identity, or `None` when signed out. Implementations
    /// treat unreadable persisted state as absent rather than fatal.
    async fn load(&self) -> Result<Option<AuthUser>>;

    async fn save(&self, user: &AuthUser) -> Result<()>;

    /// Idempotent; clearing an already-empty store is not an error.
    async fn clear(&self) -> Result<()>;
}
