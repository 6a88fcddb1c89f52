//! Destination handler capability.
//!
//! Applications that receive calls implement [`CallMessageHandler`]. The
//! engine looks handlers up through a [`HandlerRegistry`] and hands each one an
//! [`XCall`] capability through which the handler may send calls of its own
//! while it runs.

use std::collections::BTreeMap;

use xcall_proto::{Envelope, NetworkAddress};

use crate::error::{CallError, HandlerError};

/// Engine operations available to a running handler.
pub trait XCall {
    /// Send a call on behalf of the running handler.
    ///
    /// A one-way call back to the network currently being served, over the
    /// same set of paths, is piggybacked onto the pending result instead of
    /// being sent on its own.
    ///
    /// # Arguments
    /// * `to` - Destination account
    /// * `envelope` - Message and paths
    /// * `value` - Funds attached for fees
    ///
    /// # Errors
    /// Same as [`crate::CallService::send_call`]
    fn send_call(
        &mut self,
        to: NetworkAddress,
        envelope: Envelope,
        value: u128,
    ) -> Result<u128, CallError>;

    /// Total fee for a call to `network` over `sources`.
    ///
    /// Returns 0 for a one-way call that would be piggybacked.
    ///
    /// # Errors
    /// Same as [`crate::CallService::get_fee`]
    fn get_fee(&self, network: &str, rollback: bool, sources: &[String]) -> Result<u128, CallError>;

    /// Address of the call service itself.
    fn network_address(&self) -> NetworkAddress;
}

/// An application that receives calls.
pub trait CallMessageHandler {
    /// Handle a delivered call or rollback.
    ///
    /// # Arguments
    /// * `xcall` - Engine capability for reentrant sends
    /// * `from` - Originating account; for rollbacks, the call service itself
    /// * `data` - Payload
    /// * `protocols` - Paths that confirmed the delivery
    ///
    /// # Errors
    /// An error marks the call as failed. Everything the handler did through
    /// `xcall` is discarded.
    fn handle_call_message(
        &mut self,
        xcall: &mut dyn XCall,
        from: &NetworkAddress,
        data: &[u8],
        protocols: &[String],
    ) -> Result<(), HandlerError>;
}

/// Resolves accounts to their handlers.
pub trait HandlerRegistry {
    /// Handler for `account`, if it is a registered application.
    fn handler(&mut self, account: &str) -> Option<&mut dyn CallMessageHandler>;
}

impl HandlerRegistry for BTreeMap<String, Box<dyn CallMessageHandler>> {
    fn handler(&mut self, account: &str) -> Option<&mut dyn CallMessageHandler> {
        self.get_mut(account).map(|handler| &mut **handler as &mut dyn CallMessageHandler)
    }
}

/// Registry with no handlers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHandlers;

impl HandlerRegistry for NoHandlers {
    fn handler(&mut self, _account: &str) -> Option<&mut dyn CallMessageHandler> {
        None
    }
}
