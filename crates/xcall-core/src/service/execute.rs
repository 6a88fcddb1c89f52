//! Executing inbound requests and rollbacks.
//!
//! Execution semantics per message type:
//!
//! | Type               | Handler failure                        | Result sent |
//! |--------------------|----------------------------------------|-------------|
//! | `Call`             | recorded as FAILURE, request consumed  | no          |
//! | `CallWithRollback` | recorded as FAILURE, request consumed  | yes (`-sn`) |
//! | `Persistent`       | entry point fails, request kept        | no          |
//!
//! A request is removed before its handler runs, so a handler that calls
//! back into the engine cannot execute it again.

use tracing::{info, warn};
use xcall_proto::{
    MessageRequest, MessageResult, MessageType, NetworkAddress, ResponseCode, WireMessage,
};

use super::{CallService, result_sn};
use crate::{
    action::CallAction,
    context::{CallContext, ReplyScope},
    env::Environment,
    error::{CallError, HandlerError},
    events::CallEvent,
    handler::HandlerRegistry,
    proxy::ProxyRequest,
};

/// Outcome of a dispatch inside the failure boundary.
struct Execution {
    code: ResponseCode,
    msg: String,
    reply: Option<MessageRequest>,
}

/// What a handler is called with.
struct Delivery<'a> {
    account: &'a str,
    from: &'a NetworkAddress,
    data: &'a [u8],
    protocols: &'a [String],
}

impl CallService {
    /// Execute the inbound request `req_id` with its payload.
    ///
    /// # Arguments
    /// * `env` - Host facts, used by sends the handler makes
    /// * `handlers` - Destination handlers
    /// * `req_id` - Request to execute
    /// * `data` - Payload published when the request was received
    ///
    /// # Errors
    /// - `InvalidRequestId` if the request is unknown or already executed
    /// - `DataMismatch` if `data` does not match the commitment
    /// - `ExecutionFailed` if a persistent call's handler fails
    /// - `NoDefaultConnection` if a result must be sent and no path is known
    pub fn execute_call(
        &mut self,
        env: &dyn Environment,
        handlers: &mut dyn HandlerRegistry,
        req_id: u128,
        data: &[u8],
    ) -> Result<Vec<CallAction>, CallError> {
        self.transact(|svc| {
            let request = svc.take_verified_proxy(req_id, data)?;
            let delivery = Delivery {
                account: &request.to,
                from: &request.from,
                data,
                protocols: &request.protocols,
            };

            match request.message_type {
                MessageType::Call => {
                    let execution = svc.try_dispatch(env, handlers, &delivery, None);
                    svc.record_execution(req_id, &execution);
                },
                MessageType::Persistent => {
                    let (outcome, _) = svc.dispatch(env, handlers, &delivery, None);
                    outcome.map_err(|err| CallError::ExecutionFailed {
                        req_id,
                        reason: err.reason().to_string(),
                    })?;
                    svc.record_execution(req_id, &Execution::success(None));
                },
                MessageType::CallWithRollback => {
                    let scope = ReplyScope::new(request.from.network(), request.protocols.clone());
                    let execution = svc.try_dispatch(env, handlers, &delivery, Some(scope));
                    svc.record_execution(req_id, &execution);

                    let result = MessageResult {
                        sn: request.sn,
                        code: execution.code,
                        reply: execution.reply,
                    };
                    svc.send_result(&request, &result)?;
                },
            }
            Ok(())
        })
        .map(|((), actions)| actions)
    }

    /// Deliver the rollback of the failed outbound call `sn` to its sender.
    ///
    /// The sender's handler sees the call service as `from` and the paths the
    /// call was sent over as `protocols`.
    ///
    /// # Errors
    /// - `CallRequestNotFound` if `sn` is unknown or already rolled back
    /// - `RollbackNotEnabled` if no failure result has been received
    /// - `RollbackFailed` if the handler fails; the rollback stays available
    pub fn execute_rollback(
        &mut self,
        env: &dyn Environment,
        handlers: &mut dyn HandlerRegistry,
        sn: u128,
    ) -> Result<Vec<CallAction>, CallError> {
        self.transact(|svc| {
            let call = svc.take_enabled_rollback(sn)?;
            let own = svc.network_address();
            let delivery = Delivery {
                account: &call.from,
                from: &own,
                data: &call.rollback,
                protocols: &call.protocols,
            };

            let (outcome, _) = svc.dispatch(env, handlers, &delivery, None);
            outcome.map_err(|err| CallError::RollbackFailed {
                sn,
                reason: err.reason().to_string(),
            })?;

            info!(sn, to = %call.from, "rollback executed");
            svc.emit(CallEvent::RollbackExecuted { sn });
            Ok(())
        })
        .map(|((), actions)| actions)
    }

    /// Decline the pending request `req_id` on behalf of its target.
    ///
    /// Sends a FAILURE result back without executing the request, so the
    /// sender can roll back.
    ///
    /// # Errors
    /// - `InvalidRequestId` if the request is unknown or already executed
    /// - `OnlyRequestTarget` if `caller` is not the request's target
    /// - `RollbackNotPossible` if the request does not report a result
    pub fn handle_forced_rollback(
        &mut self,
        caller: &str,
        req_id: u128,
    ) -> Result<Vec<CallAction>, CallError> {
        self.transact(|svc| {
            let request = svc
                .state
                .proxy_requests
                .get(req_id)
                .ok_or(CallError::InvalidRequestId { req_id })?;
            if request.to != caller {
                return Err(CallError::OnlyRequestTarget { req_id });
            }
            if request.message_type != MessageType::CallWithRollback {
                return Err(CallError::RollbackNotPossible);
            }

            let request = svc.take_proxy(req_id)?;
            let execution = Execution::failure("forced rollback");
            svc.record_execution(req_id, &execution);
            svc.send_result(&request, &MessageResult::new(request.sn, ResponseCode::Failure))
        })
        .map(|((), actions)| actions)
    }

    /// Send `result` back over the paths `request` arrived on.
    fn send_result(
        &mut self,
        request: &ProxyRequest,
        result: &MessageResult,
    ) -> Result<(), CallError> {
        let network = request.from.network();
        let sn = result_sn(request.sn)?;
        let message = WireMessage::result(result).encode();

        for connection in self.state.resolve_paths(network, &request.protocols)? {
            self.outbox.push(CallAction::SendMessage {
                connection,
                network: network.to_string(),
                service: self.config.service_name.clone(),
                sn,
                message: message.clone(),
                fee: 0,
            });
        }
        Ok(())
    }

    fn record_execution(&mut self, req_id: u128, execution: &Execution) {
        match execution.code {
            ResponseCode::Success => info!(req_id, "call executed"),
            ResponseCode::Failure => {
                warn!(req_id, reason = %execution.msg, "call execution failed");
            },
        }
        self.emit(CallEvent::CallExecuted {
            req_id,
            code: execution.code,
            msg: execution.msg.clone(),
        });
    }

    /// Dispatch inside the failure boundary.
    ///
    /// A failing handler's state changes and actions are rolled back and its
    /// reply is dropped.
    fn try_dispatch(
        &mut self,
        env: &dyn Environment,
        handlers: &mut dyn HandlerRegistry,
        delivery: &Delivery<'_>,
        reply: Option<ReplyScope>,
    ) -> Execution {
        let journal = self.journal.mark();
        let outbox = self.outbox.len();

        match self.dispatch(env, handlers, delivery, reply) {
            (Ok(()), reply) => Execution::success(reply),
            (Err(err), _) => {
                self.journal.revert(journal, &mut self.state);
                self.outbox.truncate(outbox);
                Execution::failure(err.reason())
            },
        }
    }

    fn dispatch(
        &mut self,
        env: &dyn Environment,
        handlers: &mut dyn HandlerRegistry,
        delivery: &Delivery<'_>,
        reply: Option<ReplyScope>,
    ) -> (Result<(), HandlerError>, Option<MessageRequest>) {
        let Some(handler) = handlers.handler(delivery.account) else {
            let err = HandlerError::new(format!("no handler for {}", delivery.account));
            return (Err(err), None);
        };

        let mut context = CallContext::new(self, env, delivery.account, reply);
        let outcome = handler.handle_call_message(
            &mut context,
            delivery.from,
            delivery.data,
            delivery.protocols,
        );
        (outcome, context.into_reply())
    }
}

impl Execution {
    fn success(reply: Option<MessageRequest>) -> Self {
        Self { code: ResponseCode::Success, msg: String::new(), reply }
    }

    fn failure(reason: impl Into<String>) -> Self {
        Self { code: ResponseCode::Failure, msg: reason.into(), reply: None }
    }
}
