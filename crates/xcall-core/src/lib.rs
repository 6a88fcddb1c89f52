//! Cross-network call engine
//!
//! Pure state machine logic for sending calls to accounts on other networks,
//! confirming inbound messages across several relay paths, executing them
//! exactly once and delivering rollbacks when a remote call fails.
//!
//! # Architecture
//!
//! The engine performs no I/O. Every entry point of [`CallService`] returns a
//! list of [`CallAction`]s (messages for connections, fee transfers and
//! notifications) that a host or the simulation harness executes. Host facts
//! the engine cannot know on its own, such as which accounts are contracts and
//! what each connection charges, are supplied through [`Environment`].
//!
//! Entry points are transactional: an entry point that returns an error
//! leaves the engine state exactly as it found it and produces no actions.
//!
//! # Lifecycle of a call with rollback
//!
//! ```text
//!  sender network                              destination network
//!  ──────────────                              ───────────────────
//!  send_call ──── REQUEST (sn) ───────────────> handle_message
//!   ledger[sn] = OutboundCall                    (all paths vote)
//!                                                proxy[req_id] = hash(data)
//!                                               execute_call(req_id, data)
//!  handle_message <── RESULT (-sn) ───────────── dispatch to handler
//!   SUCCESS: ledger[sn] removed
//!   FAILURE: ledger[sn].enabled = true
//!  execute_rollback(sn)
//! ```
//!
//! # Components
//!
//! - [`service`]: the engine and its entry points
//! - [`context`]: execution context handed to destination handlers
//! - [`handler`]: destination handler capability and registry
//! - [`ledger`]: outbound calls awaiting a result
//! - [`proxy`]: inbound requests awaiting execution
//! - [`quorum`]: multi-path confirmation
//! - [`state`]: persisted engine state
//! - [`mod@env`]: host environment abstraction

pub mod action;
pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod events;
pub mod handler;
pub mod hash;
pub mod ledger;
pub mod proxy;
pub mod quorum;
pub mod service;
pub mod state;

pub use action::CallAction;
pub use config::CallServiceConfig;
pub use context::CallContext;
pub use env::Environment;
pub use error::{CallError, HandlerError};
pub use events::CallEvent;
pub use handler::{CallMessageHandler, HandlerRegistry, XCall};
pub use ledger::OutboundCall;
pub use proxy::ProxyRequest;
pub use service::CallService;
pub use state::CallState;
