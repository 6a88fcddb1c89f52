//! Destination applications for simulated networks.
//!
//! A [`Dapp`] is registered with a world while the test keeps its
//! [`DappHandle`] to inspect deliveries and to switch failure on and off.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use tracing::debug;
use xcall_core::{CallMessageHandler, HandlerError, XCall};
use xcall_proto::{CallMessage, Envelope, NetworkAddress};

/// One call or rollback a dapp accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Originating account, or the call service for rollbacks
    pub from: NetworkAddress,
    /// Payload
    pub data: Vec<u8>,
    /// Paths that confirmed the delivery
    pub protocols: Vec<String>,
}

/// Test-side view of a registered dapp.
#[derive(Debug, Clone, Default)]
pub struct DappHandle {
    deliveries: Rc<RefCell<Vec<Delivery>>>,
    failing: Rc<Cell<bool>>,
}

impl DappHandle {
    /// Deliveries accepted so far, oldest first.
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.borrow().clone()
    }

    /// Number of deliveries accepted so far.
    pub fn count(&self) -> usize {
        self.deliveries.borrow().len()
    }

    /// Make the dapp reject (or accept again) every delivery.
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }
}

/// Scriptable destination application.
///
/// Accepts every delivery unless switched to failing. A replying dapp answers
/// each delivery with a one-way call back to the sender over the paths the
/// delivery arrived on.
#[derive(Debug)]
pub struct Dapp {
    handle: DappHandle,
    reply: Option<Vec<u8>>,
}

impl Dapp {
    /// Dapp that accepts every delivery.
    pub fn new() -> (Self, DappHandle) {
        let handle = DappHandle::default();
        (Self { handle: handle.clone(), reply: None }, handle)
    }

    /// Dapp that answers every delivery with `reply`.
    pub fn replying(reply: impl Into<Vec<u8>>) -> (Self, DappHandle) {
        let handle = DappHandle::default();
        (Self { handle: handle.clone(), reply: Some(reply.into()) }, handle)
    }

    /// Dapp that rejects every delivery until switched back.
    pub fn failing() -> (Self, DappHandle) {
        let (dapp, handle) = Self::new();
        handle.set_failing(true);
        (dapp, handle)
    }
}

impl CallMessageHandler for Dapp {
    fn handle_call_message(
        &mut self,
        xcall: &mut dyn XCall,
        from: &NetworkAddress,
        data: &[u8],
        protocols: &[String],
    ) -> Result<(), HandlerError> {
        if let Some(reply) = &self.reply {
            let fee = xcall.get_fee(from.network(), false, protocols)?;
            let envelope = Envelope::new(
                CallMessage::Call { data: reply.clone() },
                protocols.to_vec(),
                protocols.to_vec(),
            );
            let sn = xcall.send_call(from.clone(), envelope, fee)?;
            debug!(sn, to = %from, "dapp replied");
        }

        if self.handle.failing.get() {
            return Err(HandlerError::new("dapp rejected the call"));
        }

        self.handle.deliveries.borrow_mut().push(Delivery {
            from: from.clone(),
            data: data.to_vec(),
            protocols: protocols.to_vec(),
        });
        Ok(())
    }
}
