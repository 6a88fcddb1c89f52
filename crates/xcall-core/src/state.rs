//! Persisted engine state.
//!
//! Everything the engine must remember between entry points lives in
//! [`CallState`]. Hosts persist it in whatever key-value store they have by
//! exporting it as CBOR.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    error::CallError, ledger::RollbackLedger, proxy::ProxyLedger, quorum::QuorumTracker,
};

/// Admin-controlled settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSettings {
    /// Account allowed to change settings
    pub admin: String,
    /// Flat fee charged on every outbound call
    pub protocol_fee: u128,
    /// Recipient of the protocol fee and any overpayment
    pub fee_handler: String,
    /// Default path per network, used when a call declares no paths
    pub default_connections: BTreeMap<String, String>,
}

impl AdminSettings {
    /// Settings with `admin` as both admin and fee handler.
    pub fn new(admin: impl Into<String>) -> Self {
        let admin = admin.into();
        Self {
            fee_handler: admin.clone(),
            admin,
            protocol_fee: 0,
            default_connections: BTreeMap::new(),
        }
    }
}

/// Complete mutable state of a call service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallState {
    /// Admin settings
    pub settings: AdminSettings,
    /// Last sequence number assigned to an outbound call
    pub last_sn: u128,
    /// Last id assigned to an inbound request
    pub last_req_id: u128,
    /// Outbound calls awaiting a result
    pub rollbacks: RollbackLedger,
    /// Inbound requests awaiting execution
    pub proxy_requests: ProxyLedger,
    /// Pending multi-path votes
    pub quorum: QuorumTracker,
    /// Outbound calls that completed successfully
    pub successful: BTreeSet<u128>,
}

impl CallState {
    /// Empty state administered by `admin`.
    pub fn new(admin: impl Into<String>) -> Self {
        Self {
            settings: AdminSettings::new(admin),
            last_sn: 0,
            last_req_id: 0,
            rollbacks: RollbackLedger::default(),
            proxy_requests: ProxyLedger::default(),
            quorum: QuorumTracker::default(),
            successful: BTreeSet::new(),
        }
    }

    /// Sequence number the next outbound call will receive.
    ///
    /// # Errors
    /// Returns `Overflow` when the counter is exhausted
    pub fn peek_sn(&self) -> Result<u128, CallError> {
        self.last_sn.checked_add(1).ok_or(CallError::Overflow { what: "sequence number" })
    }

    /// Assign the next outbound sequence number.
    ///
    /// # Errors
    /// Returns `Overflow` when the counter is exhausted
    pub fn next_sn(&mut self) -> Result<u128, CallError> {
        self.last_sn = self.peek_sn()?;
        Ok(self.last_sn)
    }

    /// Assign the next inbound request id.
    ///
    /// # Errors
    /// Returns `Overflow` when the counter is exhausted
    pub fn next_req_id(&mut self) -> Result<u128, CallError> {
        self.last_req_id =
            self.last_req_id.checked_add(1).ok_or(CallError::Overflow { what: "request id" })?;
        Ok(self.last_req_id)
    }

    /// Default path registered for `network`.
    ///
    /// # Errors
    /// Returns `NoDefaultConnection` if none is registered
    pub fn default_connection(&self, network: &str) -> Result<&str, CallError> {
        self.settings
            .default_connections
            .get(network)
            .map(String::as_str)
            .ok_or_else(|| CallError::NoDefaultConnection { network: network.to_string() })
    }

    /// Declared paths, or the default path when none are declared.
    ///
    /// # Errors
    /// Returns `NoDefaultConnection` if no path is declared and no default is
    /// registered for `network`
    pub fn resolve_paths(
        &self,
        network: &str,
        declared: &[String],
    ) -> Result<Vec<String>, CallError> {
        if declared.is_empty() {
            return Ok(vec![self.default_connection(network)?.to_string()]);
        }
        Ok(declared.to_vec())
    }

    /// Serialize to CBOR.
    ///
    /// # Errors
    /// Returns `State` if serialization fails
    pub fn to_cbor(&self) -> Result<Vec<u8>, CallError> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes).map_err(|e| CallError::State(e.to_string()))?;
        Ok(bytes)
    }

    /// Deserialize from CBOR.
    ///
    /// # Errors
    /// Returns `State` if the bytes are not a valid state
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, CallError> {
        ciborium::from_reader(bytes).map_err(|e| CallError::State(e.to_string()))
    }
}
