use crate::types::message::Message;

/// Read-only snapshot of the conversation handed to the UI layer: the cached
/// message list plus the loading and error flags of the most recent read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    pub messages: Vec<Message>,
    pub loading: bool,
    pub last_error: Option<String>,
}
