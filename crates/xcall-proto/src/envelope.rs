//! Application-facing call envelope.
//!
//! An [`Envelope`] is what a sending application hands to the call service:
//! the typed message plus the paths it wants the message to travel over.
//!
//! ```text
//! Envelope = [type, message, sources, destinations]
//!
//! Call             message = [data]
//! CallWithRollback message = [data, rollback]
//! Persistent       message = [data]
//! ```

use rlp::RlpStream;

use crate::{
    codec::{append_strings, open_list, strings_at},
    errors::Result,
    types::MessageType,
};

/// A typed call payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallMessage {
    /// One-way call.
    Call {
        /// Payload for the destination handler
        data: Vec<u8>,
    },
    /// Call that reports its outcome and can be compensated.
    CallWithRollback {
        /// Payload for the destination handler
        data: Vec<u8>,
        /// Payload delivered back to the sender if the call fails
        rollback: Vec<u8>,
    },
    /// One-way call retried until it succeeds.
    Persistent {
        /// Payload for the destination handler
        data: Vec<u8>,
    },
}

impl CallMessage {
    /// Wire tag of this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Call { .. } => MessageType::Call,
            Self::CallWithRollback { .. } => MessageType::CallWithRollback,
            Self::Persistent { .. } => MessageType::Persistent,
        }
    }

    /// Payload for the destination handler.
    pub fn data(&self) -> &[u8] {
        match self {
            Self::Call { data }
            | Self::CallWithRollback { data, .. }
            | Self::Persistent { data } => data,
        }
    }

    /// Rollback payload, present only for [`CallMessage::CallWithRollback`].
    pub fn rollback(&self) -> Option<&[u8]> {
        match self {
            Self::CallWithRollback { rollback, .. } => Some(rollback),
            Self::Call { .. } | Self::Persistent { .. } => None,
        }
    }

    /// Encode the message body (without its type tag).
    pub fn encode(&self) -> Vec<u8> {
        let stream = match self {
            Self::Call { data } | Self::Persistent { data } => {
                let mut stream = RlpStream::new_list(1);
                stream.append(data);
                stream
            },
            Self::CallWithRollback { data, rollback } => {
                let mut stream = RlpStream::new_list(2);
                stream.append(data).append(rollback);
                stream
            },
        };
        stream.out().to_vec()
    }

    /// Decode a message body using the reader for `message_type`.
    pub fn decode(message_type: MessageType, bytes: &[u8]) -> Result<Self> {
        match message_type {
            MessageType::Call => {
                let rlp = open_list(bytes, 1, "CallMessage")?;
                Ok(Self::Call { data: rlp.val_at(0)? })
            },
            MessageType::CallWithRollback => {
                let rlp = open_list(bytes, 2, "CallMessageWithRollback")?;
                Ok(Self::CallWithRollback { data: rlp.val_at(0)?, rollback: rlp.val_at(1)? })
            },
            MessageType::Persistent => {
                let rlp = open_list(bytes, 1, "PersistentMessage")?;
                Ok(Self::Persistent { data: rlp.val_at(0)? })
            },
        }
    }
}

/// A call message plus its declared paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Typed payload
    pub message: CallMessage,
    /// Paths on the sending network that carry the message
    pub sources: Vec<String>,
    /// Paths on the receiving network that must confirm it
    pub destinations: Vec<String>,
}

impl Envelope {
    /// Create an envelope.
    pub fn new(message: CallMessage, sources: Vec<String>, destinations: Vec<String>) -> Self {
        Self { message, sources, destinations }
    }

    /// Envelope that travels over the registered default path.
    pub fn with_default_path(message: CallMessage) -> Self {
        Self::new(message, Vec::new(), Vec::new())
    }

    /// Encode as `[type, message, sources, destinations]`.
    pub fn encode(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(4);
        stream.append(&self.message.message_type().to_u8());
        stream.append(&self.message.encode());
        append_strings(&mut stream, &self.sources);
        append_strings(&mut stream, &self.destinations);
        stream.out().to_vec()
    }

    /// Decode an envelope, rejecting any shape other than the one its type
    /// tag names.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let rlp = open_list(bytes, 4, "Envelope")?;
        let tag: u8 = rlp.val_at(0)?;
        let message_type = MessageType::try_from(tag)?;
        let body: Vec<u8> = rlp.val_at(1)?;
        let message = CallMessage::decode(message_type, &body)?;
        let sources = strings_at(&rlp, 2, "Envelope.sources")?;
        let destinations = strings_at(&rlp, 3, "Envelope.destinations")?;
        Ok(Self { message, sources, destinations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CodecError;

    #[test]
    fn encodes_call_envelope() {
        let envelope = Envelope::new(
            CallMessage::Call { data: vec![1, 2, 3] },
            vec!["source1".into(), "source2".into()],
            vec!["dest1".into(), "dest2".into()],
        );

        let encoded = envelope.encode();
        insta::assert_snapshot!(
            hex::encode(&encoded),
            @"e58085c483010203d087736f757263653187736f7572636532cc856465737431856465737432"
        );
        assert_eq!(Envelope::decode(&encoded).unwrap(), envelope);
    }

    #[test]
    fn rollback_body_is_rejected_under_call_tag() {
        let body = CallMessage::CallWithRollback { data: vec![1], rollback: vec![2] }.encode();
        let result = CallMessage::decode(MessageType::Call, &body);
        assert!(matches!(result, Err(CodecError::FieldCount { expected: 1, actual: 2, .. })));
    }

    #[test]
    fn unknown_type_tag_is_rejected() {
        let mut stream = RlpStream::new_list(4);
        stream.append(&7u8);
        stream.append(&CallMessage::Call { data: vec![] }.encode());
        stream.begin_list(0);
        stream.begin_list(0);
        let bytes = stream.out().to_vec();

        assert!(matches!(Envelope::decode(&bytes), Err(CodecError::UnknownMessageType(7))));
    }

    #[test]
    fn accessors_follow_variant() {
        let msg = CallMessage::CallWithRollback { data: vec![1], rollback: vec![9] };
        assert_eq!(msg.message_type(), MessageType::CallWithRollback);
        assert_eq!(msg.data(), &[1]);
        assert_eq!(msg.rollback(), Some(&[9][..]));
        assert_eq!(CallMessage::Persistent { data: vec![] }.rollback(), None);
    }
}
