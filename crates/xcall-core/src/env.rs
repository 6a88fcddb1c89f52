//! Environment abstraction.
//!
//! The engine never looks outside its own state. Facts owned by the host
//! chain are read through this trait, so production hosts and the simulation
//! harness can supply their own.

/// Read-only host facts consulted by the engine.
pub trait Environment {
    /// Whether `account` is a contract that can receive calls.
    ///
    /// Only contracts may send calls with rollback, since the rollback is
    /// delivered by calling the sender back.
    fn is_contract(&self, account: &str) -> bool;

    /// Fee charged by `connection` for delivering a message to `network`.
    ///
    /// `response` is true when the message expects a result, so the fee
    /// covers the return trip as well.
    ///
    /// Returns `None` if the connection does not serve `network`.
    fn connection_fee(&self, connection: &str, network: &str, response: bool) -> Option<u128>;
}
