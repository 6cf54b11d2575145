use prattle_core::invalidation::InvalidationSignature;
use prattle_core::types::Message;
use std::sync::Arc;
use tokio::sync::broadcast;

// The size of the broadcast channel buffer.
const CHANNEL_CAPACITY: usize = 100;

/// The user-visible notice emitted when a session-invalidation error was
/// detected, shortly before the automatic sign-out.
#[derive(Debug, Clone)]
pub struct SessionNotice {
    pub signature: InvalidationSignature,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    UserRequested,
    SessionInvalidated,
}

#[derive(Debug, Clone)]
pub struct SignedOut {
    pub reason: SignOutReason,
}

/// Lifecycle change of the push lane, published by the background sync task.
#[derive(Debug, Clone)]
pub enum PushLaneState {
    Failed(String),
    Completed,
}

// Macro to generate EventBus fields and constructor
macro_rules! define_event_bus {
    ($(($field:ident, $type:ty)),* $(,)?) => {
        /// Typed event bus that provides separate broadcast channels for each
        /// event type the UI layer can react to.
        #[derive(Debug)]
        pub struct EventBus {
            $(
                pub $field: broadcast::Sender<$type>,
            )*
        }

        impl EventBus {
            pub fn new() -> Self {
                Self {
                    $(
                        $field: broadcast::channel(CHANNEL_CAPACITY).0,
                    )*
                }
            }
        }
    };
}

define_event_bus! {
    // Conversation events
    (message_added, Arc<Message>),

    // Session lifecycle events
    (session_notice, Arc<SessionNotice>),
    (signed_out, Arc<SignedOut>),

    // Push lane events
    (push_state, Arc<PushLaneState>),
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
