//! The call engine.
//!
//! [`CallService`] owns sequencing, the rollback and proxy ledgers, quorum
//! votes and admin settings for one network. Its entry points are split by
//! direction:
//!
//! - `send`: outbound calls and fee quotes
//! - `receive`: inbound requests, results and piggybacked replies
//! - `execute`: executing requests and rollbacks
//! - `admin`: admin-gated settings
//!
//! # Transactions
//!
//! Every public entry point runs as a transaction. State changes go through
//! an undo journal and actions are collected in an outbox while the entry
//! point runs. On success the actions are returned and the journal is
//! cleared; on error the journal is replayed backwards and the outbox is
//! truncated. Transactions do not nest: handlers reach the engine only
//! through [`crate::CallContext`], which never opens one.
//!
//! Inside an entry point, dispatching to a handler is a nested transaction
//! for call types that convert handler failures into a FAILURE result: a
//! failing handler leaves no trace besides that result.

mod admin;
mod execute;
mod journal;
mod receive;
mod send;

use xcall_proto::NetworkAddress;

use crate::{
    action::CallAction,
    config::CallServiceConfig,
    error::CallError,
    events::CallEvent,
    ledger::OutboundCall,
    proxy::ProxyRequest,
    state::CallState,
};
use journal::Journal;

/// Cross-network call engine for a single network.
#[derive(Debug, Clone)]
pub struct CallService {
    config: CallServiceConfig,
    state: CallState,
    journal: Journal,
    outbox: Vec<CallAction>,
}

impl CallService {
    /// Create an engine with empty state.
    ///
    /// # Arguments
    /// * `config` - Static configuration
    /// * `admin` - Initial admin, also the initial fee handler
    pub fn new(config: CallServiceConfig, admin: impl Into<String>) -> Self {
        Self::from_state(config, CallState::new(admin))
    }

    /// Resume an engine from previously persisted state.
    pub fn from_state(config: CallServiceConfig, state: CallState) -> Self {
        Self { config, state, journal: Journal::default(), outbox: Vec::new() }
    }

    /// Resume an engine from a CBOR export.
    ///
    /// # Errors
    /// Returns `State` if the bytes are not a valid state
    pub fn import_state(config: CallServiceConfig, bytes: &[u8]) -> Result<Self, CallError> {
        Ok(Self::from_state(config, CallState::from_cbor(bytes)?))
    }

    /// Export the current state as CBOR.
    ///
    /// # Errors
    /// Returns `State` if serialization fails
    pub fn export_state(&self) -> Result<Vec<u8>, CallError> {
        self.state.to_cbor()
    }

    /// Static configuration.
    pub fn config(&self) -> &CallServiceConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> &CallState {
        &self.state
    }

    /// Address of the call service itself.
    pub fn network_address(&self) -> NetworkAddress {
        NetworkAddress::new(&self.config.network_id, &self.config.service_name)
    }

    /// Whether the outbound call `sn` completed successfully.
    pub fn verify_success(&self, sn: u128) -> bool {
        self.state.successful.contains(&sn)
    }

    /// Outbound call `sn` if it is still awaiting a result or rollback.
    pub fn pending_rollback(&self, sn: u128) -> Option<&OutboundCall> {
        self.state.rollbacks.get(sn)
    }

    /// Inbound request `req_id` if it is still awaiting execution.
    pub fn proxy_request(&self, req_id: u128) -> Option<&ProxyRequest> {
        self.state.proxy_requests.get(req_id)
    }

    /// Last sequence number assigned to an outbound call.
    pub fn last_sn(&self) -> u128 {
        self.state.last_sn
    }

    /// Last id assigned to an inbound request.
    pub fn last_request_id(&self) -> u128 {
        self.state.last_req_id
    }

    /// Run `f` as a transaction.
    ///
    /// Returns the value of `f` and the actions it produced, or undoes the
    /// state changes and drops the actions if `f` fails.
    fn transact<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, CallError>,
    ) -> Result<(T, Vec<CallAction>), CallError> {
        let journal = self.journal.mark();
        let outbox = self.outbox.len();

        match f(self) {
            Ok(value) => {
                self.journal.commit(journal);
                Ok((value, self.outbox.drain(outbox..).collect()))
            },
            Err(err) => {
                self.journal.revert(journal, &mut self.state);
                self.outbox.truncate(outbox);
                Err(err)
            },
        }
    }

    fn emit(&mut self, event: CallEvent) {
        self.outbox.push(CallAction::Emit(event));
    }
}

/// Connection `sn` for a message that is itself a result.
fn result_sn(sn: u128) -> Result<i128, CallError> {
    i128::try_from(sn).map(|sn| -sn).map_err(|_| CallError::Overflow { what: "sequence number" })
}

/// Connection `sn` for an outbound request.
fn request_sn(sn: u128, needs_response: bool) -> Result<i128, CallError> {
    if !needs_response {
        return Ok(0);
    }
    i128::try_from(sn).map_err(|_| CallError::Overflow { what: "sequence number" })
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by the engine's unit tests.

    use std::collections::{BTreeMap, BTreeSet};

    use xcall_proto::NetworkAddress;

    use crate::{
        config::CallServiceConfig,
        env::Environment,
        error::HandlerError,
        handler::{CallMessageHandler, XCall},
    };

    use super::CallService;

    pub(crate) struct TestEnv {
        pub contracts: BTreeSet<String>,
        pub fees: BTreeMap<String, u128>,
    }

    impl TestEnv {
        pub(crate) fn new() -> Self {
            Self {
                contracts: ["dapp".to_string()].into_iter().collect(),
                fees: [("bridge-a".to_string(), 5), ("bridge-b".to_string(), 7)]
                    .into_iter()
                    .collect(),
            }
        }
    }

    impl Environment for TestEnv {
        fn is_contract(&self, account: &str) -> bool {
            self.contracts.contains(account)
        }

        fn connection_fee(&self, connection: &str, _network: &str, response: bool) -> Option<u128> {
            self.fees.get(connection).map(|fee| if response { fee * 2 } else { *fee })
        }
    }

    pub(crate) fn service(network: &str) -> CallService {
        let mut service = CallService::new(CallServiceConfig::for_network(network), "admin");
        service.set_default_connection("admin", "src", "bridge-a").unwrap();
        service.set_default_connection("admin", "dst", "bridge-a").unwrap();
        service
    }

    /// Records deliveries and fails on payload `b"fail"`.
    #[derive(Default)]
    pub(crate) struct Recorder {
        pub received: Vec<(NetworkAddress, Vec<u8>, Vec<String>)>,
    }

    impl CallMessageHandler for Recorder {
        fn handle_call_message(
            &mut self,
            _xcall: &mut dyn XCall,
            from: &NetworkAddress,
            data: &[u8],
            protocols: &[String],
        ) -> Result<(), HandlerError> {
            if data == b"fail" {
                return Err(HandlerError::new("rejected"));
            }
            self.received.push((from.clone(), data.to_vec(), protocols.to_vec()));
            Ok(())
        }
    }
}
