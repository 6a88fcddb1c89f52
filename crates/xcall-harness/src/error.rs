//! Harness errors.

use thiserror::Error;
use xcall_core::CallError;

/// Errors raised while driving a simulated world.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    /// The world has no network with this id.
    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    /// No `CallMessage` notification was seen for this request.
    #[error("no request {req_id} was received on {network}")]
    UnknownRequest {
        /// Network queried
        network: String,
        /// Request id looked up
        req_id: u128,
    },

    /// An engine entry point failed.
    #[error(transparent)]
    Call(#[from] CallError),
}
