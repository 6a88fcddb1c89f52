//! Outbound calls.

use tracing::{debug, info};
use xcall_proto::{CallMessage, Envelope, MessageRequest, NetworkAddress, WireMessage};

use super::{CallService, request_sn};
use crate::{
    action::CallAction,
    context::ReplyScope,
    env::Environment,
    error::CallError,
    events::CallEvent,
    ledger::OutboundCall,
};

impl CallService {
    /// Send a call from `caller` to an account on another network.
    ///
    /// Calls with rollback are recorded in the rollback ledger until their
    /// result arrives. The message is handed to every declared source path,
    /// or to the default path for the destination network when none is
    /// declared.
    ///
    /// # Arguments
    /// * `env` - Host facts (contract check, path fees)
    /// * `caller` - Sending account on this network
    /// * `to` - Destination account
    /// * `envelope` - Message and paths
    /// * `value` - Funds attached for fees; the part not paid to paths goes to
    ///   the fee handler
    ///
    /// # Errors
    /// - `Codec` if `caller` and the network id do not form a valid address
    /// - `RollbackNotPossible` if a rollback is requested by a non-contract
    /// - `NoRollbackData` / `MaxRollbackSizeExceeded` for a bad rollback payload
    /// - `MaxDataSizeExceeded` if the encoded request is too large
    /// - `NoDefaultConnection` if no path is declared and none is registered
    /// - `InsufficientFunds` if `value` does not cover the fees
    pub fn send_call(
        &mut self,
        env: &dyn Environment,
        caller: &str,
        to: NetworkAddress,
        envelope: Envelope,
        value: u128,
    ) -> Result<(u128, Vec<CallAction>), CallError> {
        self.transact(|svc| svc.send_from(env, caller, to, envelope, value, None))
    }

    /// Send a call over the default path.
    ///
    /// A call with `rollback` is a call with rollback; otherwise a one-way
    /// call.
    ///
    /// # Errors
    /// Same as [`CallService::send_call`]
    pub fn send_call_message(
        &mut self,
        env: &dyn Environment,
        caller: &str,
        to: NetworkAddress,
        data: Vec<u8>,
        rollback: Option<Vec<u8>>,
        value: u128,
    ) -> Result<(u128, Vec<CallAction>), CallError> {
        let message = match rollback {
            Some(rollback) => CallMessage::CallWithRollback { data, rollback },
            None => CallMessage::Call { data },
        };
        self.send_call(env, caller, to, Envelope::with_default_path(message), value)
    }

    /// Total fee for a call to `network`.
    ///
    /// Sum of what every path charges plus the protocol fee. `rollback`
    /// selects the fee for a call that expects a result.
    ///
    /// # Errors
    /// - `NoDefaultConnection` if `sources` is empty and no default is registered
    /// - `UnknownConnection` if a path does not serve `network`
    pub fn get_fee(
        &self,
        env: &dyn Environment,
        network: &str,
        rollback: bool,
        sources: &[String],
    ) -> Result<u128, CallError> {
        let mut total = self.state.settings.protocol_fee;
        for connection in self.state.resolve_paths(network, sources)? {
            let fee = path_fee(env, &connection, network, rollback)?;
            total = total.checked_add(fee).ok_or(CallError::Overflow { what: "fee" })?;
        }
        Ok(total)
    }

    /// Send a call, fusing it into `reply` when it qualifies.
    ///
    /// All checks run before any state changes, so a failed send leaves
    /// nothing behind even when it is made from inside a handler.
    pub(crate) fn send_from(
        &mut self,
        env: &dyn Environment,
        caller: &str,
        to: NetworkAddress,
        envelope: Envelope,
        value: u128,
        reply: Option<&mut ReplyScope>,
    ) -> Result<u128, CallError> {
        let from = NetworkAddress::from_parts(&self.config.network_id, caller)?;
        self.validate_message(env, caller, &envelope.message)?;

        let sn = self.state.peek_sn()?;
        let request = MessageRequest {
            from,
            to: to.account().to_string(),
            sn,
            message_type: envelope.message.message_type(),
            data: envelope.message.data().to_vec(),
            protocols: envelope.destinations.clone(),
        };
        let message = WireMessage::request(&request).encode();
        if message.len() > self.config.max_data_size {
            return Err(CallError::MaxDataSizeExceeded {
                size: message.len(),
                max: self.config.max_data_size,
            });
        }

        let needs_response = request.needs_response();
        let reply = reply
            .filter(|scope| !needs_response && scope.accepts(to.network(), &envelope.sources));
        let deliveries = if reply.is_some() {
            Vec::new()
        } else {
            self.plan_delivery(
                env,
                to.network(),
                &envelope.sources,
                request_sn(sn, needs_response)?,
                &message,
                value,
            )?
        };

        self.next_sn()?;
        if let Some(rollback) = envelope.message.rollback() {
            self.insert_rollback(
                sn,
                OutboundCall {
                    from: caller.to_string(),
                    to: to.clone(),
                    protocols: envelope.sources.clone(),
                    rollback: rollback.to_vec(),
                    enabled: false,
                },
            );
        }

        match reply {
            Some(scope) => {
                debug!(sn, network = to.network(), "call piggybacked on pending result");
                scope.stash(request);
            },
            None => self.outbox.extend(deliveries),
        }

        info!(sn, from = caller, to = %to, "call sent");
        self.emit(CallEvent::CallMessageSent { from: caller.to_string(), to, sn });
        Ok(sn)
    }

    fn validate_message(
        &self,
        env: &dyn Environment,
        caller: &str,
        message: &CallMessage,
    ) -> Result<(), CallError> {
        match message {
            CallMessage::Call { .. } | CallMessage::Persistent { .. } => Ok(()),
            CallMessage::CallWithRollback { rollback, .. } => {
                if !env.is_contract(caller) {
                    return Err(CallError::RollbackNotPossible);
                }
                if rollback.is_empty() {
                    return Err(CallError::NoRollbackData);
                }
                if rollback.len() > self.config.max_rollback_size {
                    return Err(CallError::MaxRollbackSizeExceeded {
                        size: rollback.len(),
                        max: self.config.max_rollback_size,
                    });
                }
                Ok(())
            },
        }
    }

    /// Messages for every path plus the transfer of what remains of `value`.
    fn plan_delivery(
        &self,
        env: &dyn Environment,
        network: &str,
        sources: &[String],
        sn: i128,
        message: &[u8],
        value: u128,
    ) -> Result<Vec<CallAction>, CallError> {
        let needs_response = sn > 0;
        let paths = self.state.resolve_paths(network, sources)?;
        let mut actions = Vec::with_capacity(paths.len() + 1);
        let mut spent: u128 = 0;

        for connection in paths {
            let fee = path_fee(env, &connection, network, needs_response)?;
            spent = spent.checked_add(fee).ok_or(CallError::Overflow { what: "fee" })?;
            actions.push(CallAction::SendMessage {
                connection,
                network: network.to_string(),
                service: self.config.service_name.clone(),
                sn,
                message: message.to_vec(),
                fee,
            });
        }

        let required = spent
            .checked_add(self.state.settings.protocol_fee)
            .ok_or(CallError::Overflow { what: "fee" })?;
        if value < required {
            return Err(CallError::InsufficientFunds { required, paid: value });
        }

        let remaining = value - spent;
        if remaining > 0 {
            actions.push(CallAction::Transfer {
                to: self.state.settings.fee_handler.clone(),
                amount: remaining,
            });
        }
        Ok(actions)
    }
}

fn path_fee(
    env: &dyn Environment,
    connection: &str,
    network: &str,
    response: bool,
) -> Result<u128, CallError> {
    env.connection_fee(connection, network, response).ok_or_else(|| CallError::UnknownConnection {
        connection: connection.to_string(),
        network: network.to_string(),
    })
}
