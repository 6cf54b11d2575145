pub mod chat;
pub mod message;
pub mod user;

pub use chat::ChatState;
pub use message::Message;
pub use user::{AuthUser, User};
