//! Error types for the call engine.

use thiserror::Error;
use xcall_proto::CodecError;

/// Fatal errors returned by engine entry points.
///
/// Any entry point returning one of these has made no state change and
/// produced no actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// Inbound bytes failed to decode.
    #[error("invalid message: {0}")]
    Codec(#[from] CodecError),

    /// No path was declared and no default is registered for the network.
    #[error("no default connection for network {network}")]
    NoDefaultConnection {
        /// Network without a default path
        network: String,
    },

    /// A path has no fee schedule for the requested network.
    #[error("connection {connection} does not serve network {network}")]
    UnknownConnection {
        /// Path identity
        connection: String,
        /// Target network
        network: String,
    },

    /// Encoded request exceeds the configured ceiling.
    #[error("message of {size} bytes exceeds maximum of {max}")]
    MaxDataSizeExceeded {
        /// Encoded size
        size: usize,
        /// Configured ceiling
        max: usize,
    },

    /// Rollback payload exceeds the configured ceiling.
    #[error("rollback of {size} bytes exceeds maximum of {max}")]
    MaxRollbackSizeExceeded {
        /// Payload size
        size: usize,
        /// Configured ceiling
        max: usize,
    },

    /// A rollback-capable call carries an empty rollback payload, or a
    /// failure result arrived for a call that had none.
    #[error("no rollback data")]
    NoRollbackData,

    /// Attached value does not cover path fees plus the protocol fee.
    #[error("insufficient funds: required {required}, paid {paid}")]
    InsufficientFunds {
        /// Sum of path fees and protocol fee
        required: u128,
        /// Value attached by the caller
        paid: u128,
    },

    /// Rollback requested by an account that cannot be called back, or a
    /// forced rollback requested for a request that reports no result.
    #[error("rollback not possible")]
    RollbackNotPossible,

    /// Rollback executed before a failure result was received.
    #[error("rollback for sn {sn} is not enabled")]
    RollbackNotEnabled {
        /// Sequence number of the outbound call
        sn: u128,
    },

    /// Caller is not an authorised path for this message.
    #[error("protocols mismatch: {reason}")]
    ProtocolsMismatch {
        /// Which origin check failed
        reason: &'static str,
    },

    /// No pending inbound request with this id.
    #[error("invalid request id {req_id}")]
    InvalidRequestId {
        /// Requested id
        req_id: u128,
    },

    /// Supplied payload does not match the stored commitment.
    #[error("data mismatch for request {req_id}")]
    DataMismatch {
        /// Request being executed
        req_id: u128,
    },

    /// No outbound call with this sequence number.
    #[error("call request not found for sn {sn}")]
    CallRequestNotFound {
        /// Sequence number from the result
        sn: u128,
    },

    /// Piggybacked reply claims to come from a network other than the one
    /// the original call went to.
    #[error("invalid reply received")]
    InvalidReplyReceived,

    /// Admin entry point called by someone else.
    #[error("only admin")]
    OnlyAdmin,

    /// Forced rollback requested by an account other than the request target.
    #[error("only the target of request {req_id} may force a rollback")]
    OnlyRequestTarget {
        /// Request being declined
        req_id: u128,
    },

    /// A persistent call failed and stays pending for retry.
    #[error("execution of request {req_id} failed: {reason}")]
    ExecutionFailed {
        /// Request being executed
        req_id: u128,
        /// Handler failure reason
        reason: String,
    },

    /// The rollback handler failed and the rollback stays pending.
    #[error("rollback of sn {sn} failed: {reason}")]
    RollbackFailed {
        /// Sequence number of the outbound call
        sn: u128,
        /// Handler failure reason
        reason: String,
    },

    /// A sequence counter or fee sum would overflow.
    #[error("{what} overflow")]
    Overflow {
        /// Quantity that overflowed
        what: &'static str,
    },

    /// Engine state could not be exported or imported.
    #[error("state serialization failed: {0}")]
    State(String),
}

/// Failure reported by a destination handler.
///
/// Kept apart from [`CallError`] so that a handler failure never turns into an
/// engine failure without the engine deciding so.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct HandlerError {
    reason: String,
}

impl HandlerError {
    /// Create a handler error with a reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    /// Failure reason.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl From<CallError> for HandlerError {
    fn from(err: CallError) -> Self {
        Self::new(err.to_string())
    }
}
