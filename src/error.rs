use crate::http::TransportError;
use crate::store::error::StoreError;
use thiserror::Error;

/// Failure of a single operation. Nothing here is fatal to the process; every
/// failure is scoped to the operation that produced it.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The transport itself failed (connect, send, malformed body).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server responded but reported an explicit failure; this carries
    /// the first reported error message.
    #[error("{0}")]
    Server(String),

    /// A nominally successful response carried no usable payload.
    #[error("{0}")]
    MissingData(&'static str),

    #[error("identity store error: {0}")]
    Store(#[from] StoreError),

    #[error("operation was routed to the wrong lane")]
    WrongLane,
}
