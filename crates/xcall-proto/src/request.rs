//! Forward call request.

use rlp::RlpStream;

use crate::{
    address::NetworkAddress,
    codec::{append_strings, open_list, strings_at},
    errors::Result,
    types::MessageType,
};

/// A call travelling from `from` to the account `to` on the receiving network.
///
/// Encoded as `[from, to, sn, type, data, protocols]`. `protocols` names the
/// paths on the receiving network that must all confirm the request before it
/// is trusted; an empty list means the registered default path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRequest {
    /// Originating account
    pub from: NetworkAddress,
    /// Destination account on the receiving network
    pub to: String,
    /// Sender-side sequence number
    pub sn: u128,
    /// Delivery semantics
    pub message_type: MessageType,
    /// Payload for the destination handler
    pub data: Vec<u8>,
    /// Paths that must confirm delivery
    pub protocols: Vec<String>,
}

impl MessageRequest {
    /// Whether the receiver must answer with a result.
    pub fn needs_response(&self) -> bool {
        self.message_type.needs_response()
    }

    /// Encode as `[from, to, sn, type, data, protocols]`.
    pub fn encode(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(6);
        stream.append(&self.from.to_string());
        stream.append(&self.to);
        stream.append(&self.sn);
        stream.append(&self.message_type.to_u8());
        stream.append(&self.data);
        append_strings(&mut stream, &self.protocols);
        stream.out().to_vec()
    }

    /// Decode a request.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let rlp = open_list(bytes, 6, "MessageRequest")?;
        let from: String = rlp.val_at(0)?;
        let tag: u8 = rlp.val_at(3)?;
        Ok(Self {
            from: from.parse()?,
            to: rlp.val_at(1)?,
            sn: rlp.val_at(2)?,
            message_type: MessageType::try_from(tag)?,
            data: rlp.val_at(4)?,
            protocols: strings_at(&rlp, 5, "MessageRequest.protocols")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CodecError;

    fn sample(message_type: MessageType, protocols: Vec<String>) -> MessageRequest {
        MessageRequest {
            from: "0x1.ETH/0xa".parse().unwrap(),
            to: "cx0000000000000000000000000000000000000102".to_string(),
            sn: 21,
            message_type,
            data: hex::decode("74657374").unwrap(),
            protocols,
        }
    }

    #[test]
    fn encodes_without_protocols() {
        let request = sample(MessageType::Call, vec![]);
        insta::assert_snapshot!(
            hex::encode(request.encode()),
            @"f83f8b3078312e4554482f307861aa63783030303030303030303030303030303030303030303030303030303030303030303030303031303215808474657374c0"
        );
    }

    #[test]
    fn encodes_with_protocols() {
        let request =
            sample(MessageType::CallWithRollback, vec!["abc".into(), "cde".into(), "efg".into()]);
        let encoded = request.encode();
        insta::assert_snapshot!(
            hex::encode(&encoded),
            @"f84b8b3078312e4554482f307861aa63783030303030303030303030303030303030303030303030303030303030303030303030303031303215018474657374cc836162638363646583656667"
        );
        assert_eq!(MessageRequest::decode(&encoded).unwrap(), request);
    }

    #[test]
    fn rejects_invalid_origin() {
        let mut bytes = sample(MessageType::Call, vec![]).encode();
        // "0x1.ETH/0xa" -> "0x1.ETH_0xa"
        let slash = bytes.iter().position(|b| *b == b'/').unwrap();
        bytes[slash] = b'_';

        assert!(matches!(MessageRequest::decode(&bytes), Err(CodecError::InvalidAddress(_))));
    }

    #[test]
    fn rejects_unknown_message_type() {
        let mut stream = RlpStream::new_list(6);
        stream.append(&"net/acc").append(&"to").append(&1u128).append(&9u8);
        stream.append(&Vec::<u8>::new());
        stream.begin_list(0);

        let result = MessageRequest::decode(&stream.out());
        assert!(matches!(result, Err(CodecError::UnknownMessageType(9))));
    }
}
