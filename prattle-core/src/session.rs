use crate::types::user::AuthUser;
use std::sync::RwLock;

/// The explicitly owned holder of the signed-in identity.
///
/// At most one value is current: `None` while signed out, or the opaque user
/// id (plus display nickname) while signed in. Written only by session
/// lifecycle code — login, session restore, sign-out, detected invalidation —
/// and read by the request decorator and the push-channel header builder on
/// every call, never cached across calls.
#[derive(Debug, Default)]
pub struct SessionContext {
    current: RwLock<Option<AuthUser>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, user: AuthUser) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(user);
    }

    pub fn clear(&self) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn current(&self) -> Option<AuthUser> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// The bearer header value for the current identity, or `None` while
    /// signed out (in which case no Authorization header is attached at all).
    pub fn auth_header(&self) -> Option<String> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|user| format!("Bearer {}", user.id))
    }
}
