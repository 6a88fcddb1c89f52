//! `network/account` compound addresses.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::CodecError;

/// An account on a specific network.
///
/// The canonical string form is `network + "/" + account`. The network id
/// never contains a `/`; everything after the first separator belongs to the
/// account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NetworkAddress {
    network: String,
    account: String,
}

impl NetworkAddress {
    /// Build an address from its parts.
    pub fn new(network: impl Into<String>, account: impl Into<String>) -> Self {
        Self { network: network.into(), account: account.into() }
    }

    /// Build an address from parts that must survive a round trip through
    /// the string form.
    ///
    /// # Errors
    /// Returns `InvalidAddress` if either part is empty or `network` contains
    /// a `/`
    pub fn from_parts(
        network: impl Into<String>,
        account: impl Into<String>,
    ) -> Result<Self, CodecError> {
        let address = Self::new(network, account);
        let valid = !address.network.is_empty()
            && !address.network.contains('/')
            && !address.account.is_empty();
        if !valid {
            return Err(CodecError::InvalidAddress(address.to_string()));
        }
        Ok(address)
    }

    /// Network id.
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Account on that network.
    pub fn account(&self) -> &str {
        &self.account
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.account)
    }
}

impl FromStr for NetworkAddress {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((network, account)) if !network.is_empty() && !account.is_empty() => {
                Ok(Self::new(network, account))
            },
            _ => Err(CodecError::InvalidAddress(s.to_string())),
        }
    }
}

impl TryFrom<String> for NetworkAddress {
    type Error = CodecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NetworkAddress> for String {
    fn from(value: NetworkAddress) -> Self {
        value.to_string()
    }
}
