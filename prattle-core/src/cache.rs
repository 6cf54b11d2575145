use crate::types::message::Message;

/// The locally held, ordered, deduplicated view of the conversation.
///
/// The list exists only once an initial read has established it; until then
/// there is nothing to merge into and `append` is a no-op. Storage order is
/// arrival order at the client. Sorting by creation time for display is a UI
/// concern, not done here.
#[derive(Debug, Default)]
pub struct MessageCache {
    messages: Option<Vec<Message>>,
}

impl MessageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs (or wholesale replaces, on a refetch) the cached list from a
    /// successful read.
    pub fn establish(&mut self, messages: Vec<Message>) {
        self.messages = Some(messages);
    }

    pub fn is_established(&self) -> bool {
        self.messages.is_some()
    }

    /// Merges one message record into the list. This is the single merge
    /// point for both a completed local write and an event arriving on the
    /// push lane; callers never touch the list directly.
    ///
    /// Returns `true` only when the candidate was actually appended. A
    /// candidate whose id is already present leaves the list untouched, so a
    /// write's own result racing its push-channel echo is harmless whichever
    /// lands first.
    pub fn append(&mut self, candidate: Message) -> bool {
        let Some(messages) = self.messages.as_mut() else {
            return false;
        };
        if messages.iter().any(|m| m.id == candidate.id) {
            return false;
        }
        messages.push(candidate);
        true
    }

    /// The current list, empty until established.
    pub fn messages(&self) -> &[Message] {
        self.messages.as_deref().unwrap_or_default()
    }
}
