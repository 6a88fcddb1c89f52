//! Inbound requests awaiting execution.
//!
//! Once an inbound request reaches quorum its payload is published once in a
//! [`crate::CallEvent::CallMessage`] notification and only a Keccak-256
//! commitment is kept here. Whoever executes the request must resupply the
//! payload, which is checked against the commitment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use xcall_proto::{MessageRequest, MessageType, NetworkAddress};

use crate::{
    error::CallError,
    hash::{Digest, keccak256},
};

/// A committed inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRequest {
    /// Originating account
    pub from: NetworkAddress,
    /// Destination account on this network
    pub to: String,
    /// Sender-side sequence number
    pub sn: u128,
    /// Delivery semantics
    pub message_type: MessageType,
    /// Keccak-256 of the payload
    pub data_hash: Digest,
    /// Paths that confirmed the request; results go back over the same set
    pub protocols: Vec<String>,
}

impl ProxyRequest {
    /// Commit to a request, replacing its payload with the payload hash.
    pub fn commit(request: &MessageRequest, protocols: Vec<String>) -> Self {
        Self {
            from: request.from.clone(),
            to: request.to.clone(),
            sn: request.sn,
            message_type: request.message_type,
            data_hash: keccak256(&request.data),
            protocols,
        }
    }

    /// Whether `data` is the payload this request committed to.
    pub fn matches(&self, data: &[u8]) -> bool {
        keccak256(data) == self.data_hash
    }
}

/// Committed requests keyed by request id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyLedger {
    requests: BTreeMap<u128, ProxyRequest>,
}

impl ProxyLedger {
    /// Store a committed request.
    pub fn insert(&mut self, req_id: u128, request: ProxyRequest) {
        self.requests.insert(req_id, request);
    }

    /// Look up a pending request.
    pub fn get(&self, req_id: u128) -> Option<&ProxyRequest> {
        self.requests.get(&req_id)
    }

    /// Remove a request whose payload matches its commitment.
    ///
    /// The request is removed before anything is dispatched, so a second
    /// execution of the same id fails here.
    ///
    /// # Errors
    /// Returns `InvalidRequestId` if the request is unknown or already
    /// executed and `DataMismatch` if `data` does not match the commitment
    pub fn take_verified(&mut self, req_id: u128, data: &[u8]) -> Result<ProxyRequest, CallError> {
        let request = self.requests.get(&req_id).ok_or(CallError::InvalidRequestId { req_id })?;
        if !request.matches(data) {
            return Err(CallError::DataMismatch { req_id });
        }
        self.requests.remove(&req_id).ok_or(CallError::InvalidRequestId { req_id })
    }

    /// Remove a request without checking a payload.
    ///
    /// # Errors
    /// Returns `InvalidRequestId` if the request is unknown
    pub fn take(&mut self, req_id: u128) -> Result<ProxyRequest, CallError> {
        self.requests.remove(&req_id).ok_or(CallError::InvalidRequestId { req_id })
    }

    /// Put back the request `req_id` as it was before a reverted change.
    pub(crate) fn restore(&mut self, req_id: u128, prior: Option<ProxyRequest>) {
        match prior {
            Some(request) => self.requests.insert(req_id, request),
            None => self.requests.remove(&req_id),
        };
    }

    /// Number of pending requests.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether no request is pending.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
