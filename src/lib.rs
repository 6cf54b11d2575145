pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod http;
pub mod monitor;
pub mod push;
pub mod store;
pub mod sync;

pub use client::{Client, ClientBuilder};
pub use config::ClientConfig;
pub use error::ClientError;
