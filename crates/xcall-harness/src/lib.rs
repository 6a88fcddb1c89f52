//! Deterministic multi-network simulation harness for xcall.
//!
//! Several [`xcall_core::CallService`] engines run side by side in a [`World`].
//! Outbound messages land in a shared in-flight pool and are delivered over
//! simulated paths in an order chosen by a seeded RNG, so every run is
//! reproducible from its seed.
//!
//! ```text
//!   network "src"                                network "dst"
//!  ┌─────────────┐   SendMessage   ┌──────────┐   handle_message  ┌─────────────┐
//!  │ CallService │ ──────────────► │ in-flight│ ────────────────► │ CallService │
//!  │  + SimEnv   │ ◄────────────── │   pool   │ ◄──────────────── │  + dapps    │
//!  └─────────────┘  handle_error   └──────────┘   SendMessage     └─────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod dapp;
pub mod error;
pub mod scenario;
pub mod sim_env;
pub mod world;

pub use dapp::{Dapp, DappHandle, Delivery};
pub use error::HarnessError;
pub use scenario::Scenario;
pub use sim_env::{PathFee, SimEnv};
pub use world::{DeliveryOutcome, Packet, World};
