//! Actions returned by the engine.

use crate::events::CallEvent;

/// Effects produced by an entry point.
///
/// The driver (test harness or host runtime) executes these actions in order:
/// - `SendMessage`: hand the bytes to the named connection
/// - `Transfer`: move value out of the attached funds
/// - `Emit`: publish a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallAction {
    /// Deliver an encoded wire message over one path.
    SendMessage {
        /// Path identity
        connection: String,
        /// Target network
        network: String,
        /// Service name on the target network
        service: String,
        /// Positive when a result is awaited, zero for one-way calls and
        /// negative when the message is itself a result
        sn: i128,
        /// Encoded wire message
        message: Vec<u8>,
        /// Fee paid to the connection
        fee: u128,
    },

    /// Transfer part of the attached value.
    Transfer {
        /// Recipient account
        to: String,
        /// Amount
        amount: u128,
    },

    /// Publish a notification.
    Emit(CallEvent),
}

impl CallAction {
    /// The notification carried by this action, if any.
    pub fn event(&self) -> Option<&CallEvent> {
        match self {
            Self::Emit(event) => Some(event),
            Self::SendMessage { .. } | Self::Transfer { .. } => None,
        }
    }
}
