//! Execution context for running handlers.
//!
//! A [`CallContext`] exists only while the engine is dispatching to a handler.
//! It carries the handler's account, so sends made through it originate from
//! that account, and, while a call with rollback is being executed, the reply
//! scope: the network and path set the call arrived over.
//!
//! A one-way send made inside that scope to the same network over the same
//! path set becomes the reply piggybacked on the result, instead of a message
//! of its own. The scope is owned by the context and dropped with it, so it
//! cannot outlive the dispatch that created it.

use xcall_proto::{Envelope, MessageRequest, NetworkAddress};

use crate::{
    env::Environment,
    error::CallError,
    handler::XCall,
    service::CallService,
};

/// Network and paths of the call with rollback currently executing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReplyScope {
    network: String,
    protocols: Vec<String>,
    call_reply: Option<MessageRequest>,
}

impl ReplyScope {
    pub(crate) fn new(network: impl Into<String>, protocols: Vec<String>) -> Self {
        Self { network: network.into(), protocols, call_reply: None }
    }

    /// Whether a one-way send to `network` over `sources` becomes the reply.
    ///
    /// Only the first such send does; later ones are sent normally.
    pub(crate) fn accepts(&self, network: &str, sources: &[String]) -> bool {
        self.call_reply.is_none()
            && self.network == network
            && same_paths(&self.protocols, sources)
    }

    pub(crate) fn stash(&mut self, request: MessageRequest) {
        self.call_reply = Some(request);
    }

    pub(crate) fn into_reply(self) -> Option<MessageRequest> {
        self.call_reply
    }
}

fn same_paths(protocols: &[String], sources: &[String]) -> bool {
    protocols.len() == sources.len() && protocols.iter().all(|p| sources.contains(p))
}

/// [`XCall`] capability handed to a running handler.
pub struct CallContext<'a> {
    service: &'a mut CallService,
    env: &'a dyn Environment,
    account: String,
    reply: Option<ReplyScope>,
}

impl<'a> CallContext<'a> {
    pub(crate) fn new(
        service: &'a mut CallService,
        env: &'a dyn Environment,
        account: impl Into<String>,
        reply: Option<ReplyScope>,
    ) -> Self {
        Self { service, env, account: account.into(), reply }
    }

    pub(crate) fn into_reply(self) -> Option<MessageRequest> {
        self.reply.and_then(ReplyScope::into_reply)
    }
}

impl XCall for CallContext<'_> {
    fn send_call(
        &mut self,
        to: NetworkAddress,
        envelope: Envelope,
        value: u128,
    ) -> Result<u128, CallError> {
        self.service.send_from(self.env, &self.account, to, envelope, value, self.reply.as_mut())
    }

    fn get_fee(
        &self,
        network: &str,
        rollback: bool,
        sources: &[String],
    ) -> Result<u128, CallError> {
        if !rollback && self.reply.as_ref().is_some_and(|scope| scope.accepts(network, sources)) {
            return Ok(0);
        }
        self.service.get_fee(self.env, network, rollback, sources)
    }

    fn network_address(&self) -> NetworkAddress {
        self.service.network_address()
    }
}
