use prattle_core::cache::MessageCache;
use prattle_core::types::{ChatState, Message};
use std::sync::Mutex;
use tokio::sync::watch;

/// Exclusive owner of the cached message list. Every mutation goes through
/// here — the write path and the push path both merge via [`MessageStore::append`],
/// and readers only ever see snapshots published on the watch channel.
pub struct MessageStore {
    cache: Mutex<MessageCache>,
    state_tx: watch::Sender<ChatState>,
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageStore {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(MessageCache::new()),
            state_tx: watch::channel(ChatState::default()).0,
        }
    }

    /// The reactive read handed to the UI layer.
    pub fn state(&self) -> watch::Receiver<ChatState> {
        self.state_tx.subscribe()
    }

    pub fn establish(&self, messages: Vec<Message>) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.establish(messages);
        self.publish(&cache, false, None);
    }

    /// The single merge point. Returns `true` only when the candidate was new
    /// and actually appended; replays and the write/push echo race return
    /// `false` without mutation.
    pub fn append(&self, candidate: Message) -> bool {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        let appended = cache.append(candidate);
        if appended {
            self.publish(&cache, false, None);
        }
        appended
    }

    pub fn set_loading(&self, loading: bool) {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        let error = self.state_tx.borrow().last_error.clone();
        self.publish(&cache, loading, error);
    }

    pub fn set_error(&self, error: Option<String>) {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        self.publish(&cache, false, error);
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .messages()
            .to_vec()
    }

    fn publish(&self, cache: &MessageCache, loading: bool, last_error: Option<String>) {
        self.state_tx.send_replace(ChatState {
            messages: cache.messages().to_vec(),
            loading,
            last_error,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use prattle_core::types::User;
    use std::sync::Arc;

    fn message(id: &str) -> Message {
        Message {
            id: id.to_string(),
            content: "hi".to_string(),
            created_at: Utc::now(),
            user: User {
                id: "u1".to_string(),
                nickname: "alice".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn write_result_racing_its_push_echo_keeps_one_entry() {
        let store = Arc::new(MessageStore::new());
        store.establish(vec![]);

        // One append stands in for the completed write, the other for the
        // push-channel echo of the same message; order is arbitrary.
        let a = {
            let store = store.clone();
            tokio::spawn(async move { store.append(message("42")) })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move { store.append(message("42")) })
        };
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        assert!(a ^ b, "exactly one append must win");
        let list = store.snapshot();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, "42");
    }

    #[tokio::test]
    async fn watch_subscribers_see_each_merge() {
        let store = MessageStore::new();
        let mut state = store.state();

        store.establish(vec![message("1")]);
        state.changed().await.unwrap();
        assert_eq!(state.borrow().messages.len(), 1);

        assert!(store.append(message("2")));
        state.changed().await.unwrap();
        let snapshot = state.borrow_and_update().clone();
        assert_eq!(snapshot.messages.len(), 2);
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn loading_flag_survives_an_unrelated_error_update() {
        let store = MessageStore::new();
        store.set_error(Some("boom".to_string()));
        store.set_loading(true);

        let state = store.state();
        assert!(state.borrow().loading);
        assert_eq!(state.borrow().last_error.as_deref(), Some("boom"));
    }

    #[test]
    fn append_before_establish_publishes_nothing() {
        let store = MessageStore::new();
        let state = store.state();
        assert!(!store.append(message("1")));
        assert!(state.borrow().messages.is_empty());
    }
}
