//! Decoding errors.

use thiserror::Error;

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Reasons a byte string is rejected by a decoder.
///
/// Every variant is fatal: a message that fails to decode is never partially
/// applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Underlying RLP structure is malformed.
    #[error("malformed encoding: {0}")]
    Rlp(#[from] rlp::DecoderError),

    /// Top-level item is followed by extra bytes.
    #[error("{what}: {extra} trailing bytes after encoding")]
    TrailingBytes {
        /// Structure being decoded
        what: &'static str,
        /// Number of unconsumed bytes
        extra: usize,
    },

    /// Item was expected to be a list.
    #[error("{what}: expected a list")]
    ExpectedList {
        /// Structure being decoded
        what: &'static str,
    },

    /// List has the wrong number of fields.
    #[error("{what}: expected {expected} fields, found {actual}")]
    FieldCount {
        /// Structure being decoded
        what: &'static str,
        /// Number of fields the shape defines
        expected: usize,
        /// Number of fields present
        actual: usize,
    },

    /// Message type tag outside `Call`/`CallWithRollback`/`Persistent`.
    #[error("unknown message type: {0}")]
    UnknownMessageType(u8),

    /// Outer wrapper tag outside `REQUEST`/`RESULT`.
    #[error("unknown wire message type: {0}")]
    UnknownWireMessageType(u8),

    /// Result code outside `FAILURE`/`SUCCESS`.
    #[error("unknown response code: {0}")]
    UnknownResponseCode(u8),

    /// Network address without a `network/account` separator.
    #[error("invalid network address: {0:?}")]
    InvalidAddress(String),
}
