//! Inbound requests and results.
//!
//! Connections call [`CallService::handle_message`] with the bytes they
//! delivered. The caller's identity is its vote: a message declaring several
//! paths takes effect only once every one of them has delivered identical
//! bytes.

use tracing::{debug, info, warn};
use xcall_proto::{
    MessageRequest, MessageResult, MessageType, ResponseCode, WireMessage, WireMessageType,
};

use super::{CallService, result_sn};
use crate::{
    action::CallAction,
    error::CallError,
    events::CallEvent,
    hash::keccak256,
    ledger::OutboundCall,
    proxy::ProxyRequest,
    quorum::{Vote, VoteKind},
};

impl CallService {
    /// Accept a message delivered by the path `caller` from `from_network`.
    ///
    /// Returns no actions while the message is still waiting for other
    /// declared paths; that is a normal intermediate state.
    ///
    /// # Arguments
    /// * `caller` - Identity of the delivering path
    /// * `from_network` - Network the path reports the message came from
    /// * `message` - Encoded wire message
    ///
    /// # Errors
    /// - `ProtocolsMismatch` if the message claims to come from this network,
    ///   from a network other than the reported one, or if `caller` is not an
    ///   authorised path for it
    /// - `Codec` if the bytes do not decode
    /// - `Overflow` for a call with rollback whose `sn` cannot be answered
    /// - `CallRequestNotFound` for a result with an unknown `sn`
    /// - `NoRollbackData` for a failure result of a call without rollback
    /// - `InvalidReplyReceived` for a reply from the wrong network
    pub fn handle_message(
        &mut self,
        caller: &str,
        from_network: &str,
        message: &[u8],
    ) -> Result<Vec<CallAction>, CallError> {
        self.transact(|svc| {
            if from_network == svc.config.network_id {
                return Err(CallError::ProtocolsMismatch { reason: "message from own network" });
            }

            let wire = WireMessage::decode(message)?;
            match wire.kind {
                WireMessageType::Request => svc.handle_request(caller, from_network, &wire.payload),
                WireMessageType::Result => svc.handle_result(caller, &wire.payload),
            }
        })
        .map(|((), actions)| actions)
    }

    /// Treat `sn` as failed, as reported by the path `caller`.
    ///
    /// Used by connections that learn a call can never be delivered. Goes
    /// through the same origin and quorum checks as a failure result.
    ///
    /// # Errors
    /// Same as [`CallService::handle_message`] for a result
    pub fn handle_error(&mut self, caller: &str, sn: u128) -> Result<Vec<CallAction>, CallError> {
        let result = MessageResult::new(sn, ResponseCode::Failure).encode();
        self.transact(|svc| svc.handle_result(caller, &result)).map(|((), actions)| actions)
    }

    fn handle_request(
        &mut self,
        caller: &str,
        from_network: &str,
        payload: &[u8],
    ) -> Result<(), CallError> {
        let request = MessageRequest::decode(payload)?;
        if request.from.network() != from_network {
            return Err(CallError::ProtocolsMismatch { reason: "origin network mismatch" });
        }
        if !self.is_valid_source(from_network, caller, &request.protocols)? {
            return Err(CallError::ProtocolsMismatch { reason: "request from undeclared path" });
        }
        // A result travels with the negated sn; refuse what could never be answered.
        if request.message_type == MessageType::CallWithRollback {
            result_sn(request.sn)?;
        }

        if request.protocols.len() > 1 {
            let key = keccak256(payload);
            let vote = self.record_vote(VoteKind::Request, key, caller, &request.protocols);
            if let Vote::Pending { confirmed, required } = vote {
                debug!(sn = request.sn, from = %request.from, confirmed, required, "request vote");
                return Ok(());
            }
        }

        let protocols = request.protocols.clone();
        self.accept_request(request, protocols)
    }

    fn handle_result(&mut self, caller: &str, payload: &[u8]) -> Result<(), CallError> {
        let result = MessageResult::decode(payload)?;
        let sn = result.sn;
        let call = self.state.rollbacks.require(sn)?.clone();

        if !self.is_valid_source(call.to.network(), caller, &call.protocols)? {
            return Err(CallError::ProtocolsMismatch { reason: "result from undeclared path" });
        }

        if call.protocols.len() > 1 {
            let key = keccak256(payload);
            let vote = self.record_vote(VoteKind::Result, key, caller, &call.protocols);
            if let Vote::Pending { confirmed, required } = vote {
                debug!(sn, confirmed, required, "result vote");
                return Ok(());
            }
        }

        info!(sn, code = ?result.code, "response received");
        self.emit(CallEvent::ResponseMessage { sn, code: result.code });

        match result.code {
            ResponseCode::Success => {
                self.complete_call(sn);
                if let Some(reply) = result.reply {
                    self.handle_reply(&call, reply)?;
                }
            },
            ResponseCode::Failure => {
                self.enable_rollback(sn)?;
                warn!(sn, "call failed, rollback enabled");
                self.emit(CallEvent::RollbackMessage { sn });
            },
        }
        Ok(())
    }

    /// Accept a request piggybacked on a success result for `call`.
    ///
    /// The reply must come from the network the original call went to. It
    /// inherits the original call's paths, since it arrived over them.
    fn handle_reply(
        &mut self,
        call: &OutboundCall,
        reply: MessageRequest,
    ) -> Result<(), CallError> {
        if reply.from.network() != call.to.network() {
            return Err(CallError::InvalidReplyReceived);
        }
        self.accept_request(reply, call.protocols.clone())
    }

    /// Assign a request id, publish the payload once and keep its commitment.
    fn accept_request(
        &mut self,
        request: MessageRequest,
        protocols: Vec<String>,
    ) -> Result<(), CallError> {
        let req_id = self.next_req_id()?;
        self.insert_proxy(req_id, ProxyRequest::commit(&request, protocols));

        info!(req_id, sn = request.sn, from = %request.from, to = %request.to, "call received");
        self.emit(CallEvent::CallMessage {
            from: request.from,
            to: request.to,
            sn: request.sn,
            req_id,
            data: request.data,
        });
        Ok(())
    }

    /// Whether `caller` may deliver a message declaring `protocols`.
    ///
    /// A declared path is always valid. With no declared paths only the
    /// default path for `network` is, and a missing default is an error rather
    /// than a rejection.
    fn is_valid_source(
        &self,
        network: &str,
        caller: &str,
        protocols: &[String],
    ) -> Result<bool, CallError> {
        if protocols.iter().any(|p| p == caller) {
            return Ok(true);
        }
        if protocols.is_empty() {
            return Ok(self.state.default_connection(network)? == caller);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use xcall_proto::NetworkAddress;

    use super::*;
    use crate::service::testing::{TestEnv, service};

    fn request(protocols: &[&str]) -> MessageRequest {
        MessageRequest {
            from: NetworkAddress::new("src", "sender"),
            to: "dapp".into(),
            sn: 1,
            message_type: MessageType::Call,
            data: b"payload".to_vec(),
            protocols: protocols.iter().map(|p| (*p).to_string()).collect(),
        }
    }

    fn wire(request: &MessageRequest) -> Vec<u8> {
        WireMessage::request(request).encode()
    }

    fn events(actions: &[CallAction]) -> Vec<&CallEvent> {
        actions.iter().filter_map(CallAction::event).collect()
    }

    #[test]
    fn default_path_request_is_committed() {
        let mut svc = service("dst");

        let actions = svc.handle_message("bridge-a", "src", &wire(&request(&[]))).unwrap();

        assert_eq!(
            events(&actions),
            vec![&CallEvent::CallMessage {
                from: NetworkAddress::new("src", "sender"),
                to: "dapp".into(),
                sn: 1,
                req_id: 1,
                data: b"payload".to_vec(),
            }]
        );
        let proxy = svc.proxy_request(1).unwrap();
        assert_eq!(proxy.data_hash, keccak256(b"payload"));
        assert!(proxy.protocols.is_empty());
    }

    #[test]
    fn rejects_wrong_path_and_spoofed_origin() {
        let mut svc = service("dst");

        assert!(matches!(
            svc.handle_message("bridge-b", "src", &wire(&request(&[]))),
            Err(CallError::ProtocolsMismatch { .. })
        ));
        assert!(matches!(
            svc.handle_message("bridge-a", "other", &wire(&request(&[]))),
            Err(CallError::ProtocolsMismatch { .. })
        ));
        assert!(matches!(
            svc.handle_message("bridge-a", "dst", &wire(&request(&[]))),
            Err(CallError::ProtocolsMismatch { .. })
        ));
        assert!(matches!(
            svc.handle_message("c", "src", &wire(&request(&["a", "b"]))),
            Err(CallError::ProtocolsMismatch { .. })
        ));
        assert_eq!(svc.last_request_id(), 0);
    }

    #[test]
    fn single_declared_path_needs_no_default() {
        let mut svc = service("dst");
        let mut req = request(&["direct"]);
        req.from = NetworkAddress::new("far", "sender");

        let actions = svc.handle_message("direct", "far", &wire(&req)).unwrap();
        assert_eq!(events(&actions).len(), 1);
    }

    #[test]
    fn empty_paths_without_default_is_an_error() {
        let mut svc = service("dst");
        let mut req = request(&[]);
        req.from = NetworkAddress::new("far", "sender");

        assert_eq!(
            svc.handle_message("direct", "far", &wire(&req)),
            Err(CallError::NoDefaultConnection { network: "far".into() })
        );
    }

    #[test]
    fn request_waits_for_every_declared_path() {
        let mut svc = service("dst");
        let bytes = wire(&request(&["a", "b", "c"]));

        assert!(svc.handle_message("a", "src", &bytes).unwrap().is_empty());
        assert!(svc.handle_message("b", "src", &bytes).unwrap().is_empty());
        assert!(svc.handle_message("b", "src", &bytes).unwrap().is_empty());
        assert_eq!(svc.last_request_id(), 0);

        let actions = svc.handle_message("c", "src", &bytes).unwrap();
        assert_eq!(events(&actions).len(), 1);
        assert_eq!(svc.last_request_id(), 1);
        assert!(svc.state().quorum.is_empty());
    }

    #[test]
    fn unanswerable_rollback_sn_is_refused_on_receipt() {
        let mut svc = service("dst");
        let mut req = request(&[]);
        req.message_type = MessageType::CallWithRollback;
        req.sn = u128::MAX;

        assert_eq!(
            svc.handle_message("bridge-a", "src", &wire(&req)),
            Err(CallError::Overflow { what: "sequence number" })
        );
        assert_eq!(svc.last_request_id(), 0);
        assert!(svc.proxy_request(1).is_none());

        req.sn = i128::MAX as u128;
        svc.handle_message("bridge-a", "src", &wire(&req)).unwrap();
        assert_eq!(svc.proxy_request(1).unwrap().sn, i128::MAX as u128);
    }

    #[test]
    fn one_way_request_accepts_any_sn() {
        let mut svc = service("dst");
        let mut req = request(&[]);
        req.sn = u128::MAX;

        svc.handle_message("bridge-a", "src", &wire(&req)).unwrap();
        assert_eq!(svc.last_request_id(), 1);
    }

    #[test]
    fn malformed_message_is_rejected() {
        let mut svc = service("dst");
        assert!(matches!(svc.handle_message("bridge-a", "src", &[0xc0]), Err(CallError::Codec(_))));
    }

    fn sent_with_rollback(svc: &mut CallService, sources: Vec<String>) -> u128 {
        let env = TestEnv::new();
        let envelope = xcall_proto::Envelope::new(
            xcall_proto::CallMessage::CallWithRollback {
                data: b"do".to_vec(),
                rollback: b"undo".to_vec(),
            },
            sources,
            vec![],
        );
        let to = NetworkAddress::new("dst", "receiver");
        svc.send_call(&env, "dapp", to, envelope, 100).unwrap().0
    }

    fn result_wire(result: &MessageResult) -> Vec<u8> {
        WireMessage::result(result).encode()
    }

    #[test]
    fn success_result_cleans_up() {
        let mut svc = service("src");
        let sn = sent_with_rollback(&mut svc, vec![]);

        let bytes = result_wire(&MessageResult::new(sn, ResponseCode::Success));
        let actions = svc.handle_message("bridge-a", "dst", &bytes).unwrap();

        assert_eq!(
            events(&actions),
            vec![&CallEvent::ResponseMessage { sn, code: ResponseCode::Success }]
        );
        assert!(svc.pending_rollback(sn).is_none());
        assert!(svc.verify_success(sn));
    }

    #[test]
    fn failure_result_enables_rollback() {
        let mut svc = service("src");
        let sn = sent_with_rollback(&mut svc, vec![]);

        let bytes = result_wire(&MessageResult::new(sn, ResponseCode::Failure));
        let actions = svc.handle_message("bridge-a", "dst", &bytes).unwrap();

        assert_eq!(
            events(&actions),
            vec![
                &CallEvent::ResponseMessage { sn, code: ResponseCode::Failure },
                &CallEvent::RollbackMessage { sn },
            ]
        );
        assert!(svc.pending_rollback(sn).unwrap().enabled);
        assert!(!svc.verify_success(sn));
    }

    #[test]
    fn unknown_result_is_an_error() {
        let mut svc = service("src");
        let bytes = result_wire(&MessageResult::new(42, ResponseCode::Success));
        assert_eq!(
            svc.handle_message("bridge-a", "dst", &bytes),
            Err(CallError::CallRequestNotFound { sn: 42 })
        );
    }

    #[test]
    fn result_quorum_uses_recorded_sources() {
        let mut svc = service("src");
        let sn = sent_with_rollback(&mut svc, vec!["bridge-a".into(), "bridge-b".into()]);
        let bytes = result_wire(&MessageResult::new(sn, ResponseCode::Success));

        assert!(matches!(
            svc.handle_message("rogue", "dst", &bytes),
            Err(CallError::ProtocolsMismatch { .. })
        ));
        assert!(svc.handle_message("bridge-a", "dst", &bytes).unwrap().is_empty());
        assert!(svc.pending_rollback(sn).is_some());

        svc.handle_message("bridge-b", "dst", &bytes).unwrap();
        assert!(svc.verify_success(sn));
    }

    #[test]
    fn handle_error_acts_as_failure_result() {
        let mut svc = service("src");
        let sn = sent_with_rollback(&mut svc, vec![]);

        assert!(matches!(svc.handle_error("rogue", sn), Err(CallError::ProtocolsMismatch { .. })));
        svc.handle_error("bridge-a", sn).unwrap();
        assert!(svc.pending_rollback(sn).unwrap().enabled);
    }

    #[test]
    fn reply_is_accepted_as_request() {
        let mut svc = service("src");
        let sn = sent_with_rollback(&mut svc, vec![]);
        let mut reply = request(&[]);
        reply.from = NetworkAddress::new("dst", "receiver");
        reply.to = "dapp".into();
        let result = MessageResult { sn, code: ResponseCode::Success, reply: Some(reply) };

        let actions = svc.handle_message("bridge-a", "dst", &result_wire(&result)).unwrap();

        assert!(matches!(events(&actions)[1], CallEvent::CallMessage { req_id: 1, .. }));
        assert_eq!(svc.proxy_request(1).unwrap().from, NetworkAddress::new("dst", "receiver"));
    }

    #[test]
    fn reply_from_other_network_is_rejected() {
        let mut svc = service("src");
        let sn = sent_with_rollback(&mut svc, vec![]);
        let mut reply = request(&[]);
        reply.from = NetworkAddress::new("elsewhere", "receiver");
        let result = MessageResult { sn, code: ResponseCode::Success, reply: Some(reply) };

        assert_eq!(
            svc.handle_message("bridge-a", "dst", &result_wire(&result)),
            Err(CallError::InvalidReplyReceived)
        );
        assert!(svc.pending_rollback(sn).is_some());
        assert!(!svc.verify_success(sn));
    }
}
