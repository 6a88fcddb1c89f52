//! Simulated host facts.

use std::collections::{BTreeMap, BTreeSet};

use xcall_core::Environment;

/// What a path charges for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathFee {
    /// Charged for every message.
    pub message: u128,
    /// Charged on top when the message needs a response.
    pub response: u128,
}

impl PathFee {
    /// Same fee whether or not a response is needed.
    pub fn flat(fee: u128) -> Self {
        Self { message: fee, response: 0 }
    }

    /// Fee for one message.
    pub fn total(self, response: bool) -> u128 {
        if response { self.message.saturating_add(self.response) } else { self.message }
    }
}

/// Host facts for one simulated network.
///
/// Path ids are shared between networks: a path named `bridge-a` exists on
/// every network it is added to and charges the same on each.
#[derive(Debug, Clone, Default)]
pub struct SimEnv {
    contracts: BTreeSet<String>,
    fees: BTreeMap<String, PathFee>,
}

impl SimEnv {
    /// Environment with no contracts and no paths.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `account` as a contract.
    pub fn add_contract(&mut self, account: impl Into<String>) {
        self.contracts.insert(account.into());
    }

    /// Make `connection` available at `fee`.
    pub fn add_path(&mut self, connection: impl Into<String>, fee: PathFee) {
        self.fees.insert(connection.into(), fee);
    }

    /// Fee table entry for `connection`.
    pub fn path_fee(&self, connection: &str) -> Option<PathFee> {
        self.fees.get(connection).copied()
    }
}

impl Environment for SimEnv {
    fn is_contract(&self, account: &str) -> bool {
        self.contracts.contains(account)
    }

    fn connection_fee(&self, connection: &str, _network: &str, response: bool) -> Option<u128> {
        self.path_fee(connection).map(|fee| fee.total(response))
    }
}
