use crate::types::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single chat message as delivered by the server. Immutable once created;
/// this client never updates or deletes messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server-assigned, unique within the conversation.
    pub id: String,
    pub content: String,
    /// Preserved verbatim for display-time sorting; storage order in the
    /// cache is arrival order, not timestamp order.
    pub created_at: DateTime<Utc>,
    pub user: User,
}
