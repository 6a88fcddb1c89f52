//! Call outcome, optionally carrying a piggybacked reply.

use rlp::RlpStream;

use crate::{
    codec::{append_nullable, nullable_at, open_list},
    errors::Result,
    request::MessageRequest,
    types::ResponseCode,
};

/// Outcome of a call identified by the sender's `sn`.
///
/// Encoded as `[sn, code, reply?]` where `reply?` is an explicit nullable
/// holding an encoded [`MessageRequest`]. A reply lets the destination send a
/// brand-new forward call back to the original caller inside the result
/// instead of as a separate message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageResult {
    /// Sequence number of the call this result answers
    pub sn: u128,
    /// Outcome of the call
    pub code: ResponseCode,
    /// Forward request piggybacked on this result
    pub reply: Option<MessageRequest>,
}

impl MessageResult {
    /// Result without a piggybacked reply.
    pub fn new(sn: u128, code: ResponseCode) -> Self {
        Self { sn, code, reply: None }
    }

    /// Encode as `[sn, code, reply?]`.
    pub fn encode(&self) -> Vec<u8> {
        let reply = self.reply.as_ref().map(MessageRequest::encode);
        let mut stream = RlpStream::new_list(3);
        stream.append(&self.sn);
        stream.append(&self.code.to_u8());
        append_nullable(&mut stream, reply.as_deref());
        stream.out().to_vec()
    }

    /// Decode a result, including strict decoding of any reply.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let rlp = open_list(bytes, 3, "MessageResult")?;
        let code: u8 = rlp.val_at(1)?;
        let reply: Option<Vec<u8>> = nullable_at(&rlp, 2, "MessageResult.reply")?;
        Ok(Self {
            sn: rlp.val_at(0)?,
            code: ResponseCode::try_from(code)?,
            reply: reply.as_deref().map(MessageRequest::decode).transpose()?,
        })
    }
}
