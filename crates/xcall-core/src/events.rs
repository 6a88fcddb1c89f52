//! Notifications emitted by the engine.
//!
//! Off-chain relayers watch these to decide what to deliver or execute next.
//! [`CallEvent::CallMessage`] is the only place an inbound payload is ever
//! surfaced in full; the engine keeps just its hash afterwards.

use xcall_proto::{NetworkAddress, ResponseCode};

/// Notification produced by an entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    /// An outbound call was accepted.
    CallMessageSent {
        /// Sending account on this network
        from: String,
        /// Destination account
        to: NetworkAddress,
        /// Sequence number assigned to the call
        sn: u128,
    },

    /// An inbound request reached quorum and awaits execution.
    CallMessage {
        /// Originating account
        from: NetworkAddress,
        /// Destination account on this network
        to: String,
        /// Sender-side sequence number
        sn: u128,
        /// Request id assigned on this network
        req_id: u128,
        /// Full payload; needed later to execute the request
        data: Vec<u8>,
    },

    /// An inbound request was executed.
    CallExecuted {
        /// Executed request
        req_id: u128,
        /// Outcome
        code: ResponseCode,
        /// Empty on success, otherwise the failure reason
        msg: String,
    },

    /// A result for an outbound call reached quorum.
    ResponseMessage {
        /// Outbound call the result answers
        sn: u128,
        /// Outcome reported by the destination
        code: ResponseCode,
    },

    /// A rollback became available for execution.
    RollbackMessage {
        /// Outbound call that failed
        sn: u128,
    },

    /// A rollback was delivered to the original caller.
    RollbackExecuted {
        /// Outbound call that was rolled back
        sn: u128,
    },
}
