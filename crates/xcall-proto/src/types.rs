//! Closed tag enums carried on the wire.

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::CodecError;

/// Delivery semantics requested by the sender of a call.
///
/// The discriminant is the wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum MessageType {
    /// One-way call; destination failures are recorded but not reported back.
    Call = 0,
    /// Call whose outcome is reported back, enabling rollback on failure.
    CallWithRollback = 1,
    /// One-way call that stays pending until it executes successfully.
    Persistent = 2,
}

impl MessageType {
    /// Wire tag for this type.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Whether the destination must send a result back.
    pub fn needs_response(self) -> bool {
        self == Self::CallWithRollback
    }

    /// Whether a failed execution may be retried.
    pub fn allows_retry(self) -> bool {
        self == Self::Persistent
    }
}

impl TryFrom<u8> for MessageType {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Call),
            1 => Ok(Self::CallWithRollback),
            2 => Ok(Self::Persistent),
            other => Err(CodecError::UnknownMessageType(other)),
        }
    }
}

/// Outcome of executing a call on the destination network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum ResponseCode {
    /// Destination handler failed.
    Failure = 0,
    /// Destination handler completed.
    Success = 1,
}

impl ResponseCode {
    /// Wire tag for this code.
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ResponseCode {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Failure),
            1 => Ok(Self::Success),
            other => Err(CodecError::UnknownResponseCode(other)),
        }
    }
}
