use serde::{Deserialize, Serialize};

/// The author of a message. The id is the canonical identity; the nickname is
/// display-only and may differ across messages if an account renames, so it
/// must never be used for identity comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub nickname: String,
}

/// The signed-in user, as returned by login and as persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub nickname: String,
}
