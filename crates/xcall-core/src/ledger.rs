//! Outbound calls awaiting a result.
//!
//! A record exists only for calls sent with a rollback payload. It is removed
//! when a success result arrives, or enabled by a failure result and removed
//! when the rollback is executed.
//!
//! ```text
//! insert ──> pending ──SUCCESS──> removed
//!               │
//!            FAILURE
//!               ↓
//!            enabled ──execute_rollback──> removed
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use xcall_proto::NetworkAddress;

use crate::error::CallError;

/// Compensating state for one outbound call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundCall {
    /// Account on this network that sent the call
    pub from: String,
    /// Destination of the call
    pub to: NetworkAddress,
    /// Paths the call was sent over; results must arrive over the same set
    pub protocols: Vec<String>,
    /// Payload delivered back to `from` if the call fails
    pub rollback: Vec<u8>,
    /// Set once a failure result has been received
    pub enabled: bool,
}

/// Outbound calls keyed by sequence number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackLedger {
    calls: BTreeMap<u128, OutboundCall>,
}

impl RollbackLedger {
    /// Record a freshly sent call.
    pub fn insert(&mut self, sn: u128, call: OutboundCall) {
        self.calls.insert(sn, call);
    }

    /// Look up a pending call.
    pub fn get(&self, sn: u128) -> Option<&OutboundCall> {
        self.calls.get(&sn)
    }

    /// Look up a pending call, failing if it does not exist.
    ///
    /// # Errors
    /// Returns `CallRequestNotFound` for an unknown or already cleaned up `sn`
    pub fn require(&self, sn: u128) -> Result<&OutboundCall, CallError> {
        self.calls.get(&sn).ok_or(CallError::CallRequestNotFound { sn })
    }

    /// Mark the rollback of `sn` as executable.
    ///
    /// # Errors
    /// Returns `CallRequestNotFound` for an unknown `sn` and `NoRollbackData`
    /// if the call carries no rollback payload
    pub fn enable(&mut self, sn: u128) -> Result<(), CallError> {
        let call = self.calls.get_mut(&sn).ok_or(CallError::CallRequestNotFound { sn })?;
        if call.rollback.is_empty() {
            return Err(CallError::NoRollbackData);
        }
        call.enabled = true;
        Ok(())
    }

    /// Remove an enabled call so its rollback can be delivered.
    ///
    /// # Errors
    /// Returns `CallRequestNotFound` for an unknown `sn` and
    /// `RollbackNotEnabled` if no failure result has been received
    pub fn take_enabled(&mut self, sn: u128) -> Result<OutboundCall, CallError> {
        if !self.require(sn)?.enabled {
            return Err(CallError::RollbackNotEnabled { sn });
        }
        self.calls.remove(&sn).ok_or(CallError::CallRequestNotFound { sn })
    }

    /// Drop a call after a success result.
    pub fn remove(&mut self, sn: u128) -> Option<OutboundCall> {
        self.calls.remove(&sn)
    }

    /// Put back the record of `sn` as it was before a reverted change.
    pub(crate) fn restore(&mut self, sn: u128, prior: Option<OutboundCall>) {
        match prior {
            Some(call) => self.calls.insert(sn, call),
            None => self.calls.remove(&sn),
        };
    }

    /// Number of pending calls.
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Whether no call is pending.
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(rollback: &[u8]) -> OutboundCall {
        OutboundCall {
            from: "dapp".into(),
            to: NetworkAddress::new("dst", "receiver"),
            protocols: vec![],
            rollback: rollback.to_vec(),
            enabled: false,
        }
    }

    #[test]
    fn rollback_requires_enable() {
        let mut ledger = RollbackLedger::default();
        ledger.insert(1, call(b"undo"));
        assert_eq!(ledger.len(), 1);

        assert_eq!(ledger.take_enabled(1), Err(CallError::RollbackNotEnabled { sn: 1 }));

        ledger.enable(1).unwrap();
        assert_eq!(ledger.take_enabled(1).unwrap().rollback, b"undo");
        assert_eq!(ledger.take_enabled(1), Err(CallError::CallRequestNotFound { sn: 1 }));
        assert!(ledger.is_empty());
    }

    #[test]
    fn enable_rejects_missing_rollback() {
        let mut ledger = RollbackLedger::default();
        ledger.insert(2, call(b""));

        assert_eq!(ledger.enable(2), Err(CallError::NoRollbackData));
        assert_eq!(ledger.enable(3), Err(CallError::CallRequestNotFound { sn: 3 }));
    }
}
