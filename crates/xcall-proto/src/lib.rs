//! Wire format for the cross-network call protocol.
//!
//! Every structure that crosses a network boundary is encoded as a canonical
//! RLP list in which each field has a fixed position. Optional fields are
//! written as an explicit nullable tag (an empty or single-element list) rather
//! than being omitted, so the shape of an encoding never depends on the value
//! of an intermediate field.
//!
//! There are four top-level shapes:
//!
//! - [`Envelope`]: what an application hands to the call service
//! - [`WireMessage`]: the outer `{type, data}` dispatch wrapper
//! - [`MessageRequest`]: a forward call
//! - [`MessageResult`]: the outcome of a call, optionally carrying a reply
//!
//! # Security
//!
//! Decoding fails closed. A decoder rejects field-count mismatches, trailing
//! bytes after the top-level item, and type tags outside the defined enums.
//! Each message variant is decoded by its own reader; there is no coercion
//! between the `Call`, `CallWithRollback` and `Persistent` payload shapes.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod address;
mod codec;
pub mod envelope;
pub mod errors;
pub mod message;
pub mod request;
pub mod result;
pub mod types;

pub use address::NetworkAddress;
pub use envelope::{CallMessage, Envelope};
pub use errors::{CodecError, Result};
pub use message::{WireMessage, WireMessageType};
pub use request::MessageRequest;
pub use result::MessageResult;
pub use types::{MessageType, ResponseCode};
