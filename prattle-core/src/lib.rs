pub mod cache;
pub mod invalidation;
pub mod net;
pub mod operation;
pub mod response;
pub mod routing;
pub mod session;
pub mod types;
