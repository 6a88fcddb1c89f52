//! Outer dispatch wrapper.
//!
//! Connections carry opaque bytes. The receiving call service first decodes
//! this wrapper to learn whether the payload is a [`MessageRequest`] or a
//! [`MessageResult`], then decodes the payload with the matching reader.

use rlp::RlpStream;

use crate::{
    codec::open_list,
    errors::{CodecError, Result},
    request::MessageRequest,
    result::MessageResult,
};

/// Kind of payload inside a [`WireMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireMessageType {
    /// Payload is a [`MessageRequest`]
    Request = 1,
    /// Payload is a [`MessageResult`]
    Result = 2,
}

impl TryFrom<u8> for WireMessageType {
    type Error = CodecError;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Request),
            2 => Ok(Self::Result),
            other => Err(CodecError::UnknownWireMessageType(other)),
        }
    }
}

/// `{type, data}` envelope handed to connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    /// Payload kind
    pub kind: WireMessageType,
    /// Encoded request or result
    pub payload: Vec<u8>,
}

impl WireMessage {
    /// Wrap an encoded request.
    pub fn request(request: &MessageRequest) -> Self {
        Self { kind: WireMessageType::Request, payload: request.encode() }
    }

    /// Wrap an encoded result.
    pub fn result(result: &MessageResult) -> Self {
        Self { kind: WireMessageType::Result, payload: result.encode() }
    }

    /// Encode as `[type, data]`.
    pub fn encode(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(2);
        stream.append(&(self.kind as u8));
        stream.append(&self.payload);
        stream.out().to_vec()
    }

    /// Decode the wrapper without interpreting the payload.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let rlp = open_list(bytes, 2, "WireMessage")?;
        let tag: u8 = rlp.val_at(0)?;
        Ok(Self { kind: WireMessageType::try_from(tag)?, payload: rlp.val_at(1)? })
    }
}
