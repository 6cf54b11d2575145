use crate::operation::{Operation, OperationKind};

/// The two transport lanes an operation can travel on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    /// The request/response HTTP lane (decorated with the auth header).
    Request,
    /// The persistent push-update lane.
    Push,
}

impl Lane {
    /// Picks the lane for an operation. The decision is a total function of
    /// the operation's kind; name and variables never influence it, and no
    /// operation is ever sent on both lanes.
    pub fn for_operation(operation: &Operation) -> Lane {
        match operation.kind {
            OperationKind::Subscribe => Lane::Push,
            OperationKind::Read | OperationKind::Write => Lane::Request,
        }
    }
}
