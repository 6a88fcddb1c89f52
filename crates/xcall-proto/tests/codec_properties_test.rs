//! Property tests for the wire codec.
//!
//! Decoding must accept exactly what encoding produces and nothing else.

use proptest::prelude::*;
use xcall_proto::{
    CallMessage, CodecError, Envelope, MessageRequest, MessageResult, MessageType,
    NetworkAddress, ResponseCode, WireMessage,
};

fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9.]{1,12}"
}

fn address() -> impl Strategy<Value = NetworkAddress> {
    (segment(), "[a-zA-Z0-9./]{1,20}")
        .prop_map(|(network, account)| NetworkAddress::new(network, account))
}

fn message_type() -> impl Strategy<Value = MessageType> {
    prop_oneof![
        Just(MessageType::Call),
        Just(MessageType::CallWithRollback),
        Just(MessageType::Persistent),
    ]
}

fn request() -> impl Strategy<Value = MessageRequest> {
    (
        address(),
        segment(),
        any::<u128>(),
        message_type(),
        prop::collection::vec(any::<u8>(), 0..64),
        prop::collection::vec(segment(), 0..4),
    )
        .prop_map(|(from, to, sn, message_type, data, protocols)| MessageRequest {
            from,
            to,
            sn,
            message_type,
            data,
            protocols,
        })
}

fn call_message() -> impl Strategy<Value = CallMessage> {
    let data = prop::collection::vec(any::<u8>(), 0..64);
    prop_oneof![
        data.clone().prop_map(|data| CallMessage::Call { data }),
        (data.clone(), prop::collection::vec(any::<u8>(), 0..32))
            .prop_map(|(data, rollback)| CallMessage::CallWithRollback { data, rollback }),
        data.prop_map(|data| CallMessage::Persistent { data }),
    ]
}

proptest! {
    #[test]
    fn request_decodes_to_itself(request in request()) {
        prop_assert_eq!(MessageRequest::decode(&request.encode())?, request);
    }

    #[test]
    fn result_with_optional_reply_decodes_to_itself(
        sn in any::<u128>(),
        success in any::<bool>(),
        reply in prop::option::of(request()),
    ) {
        let code = if success { ResponseCode::Success } else { ResponseCode::Failure };
        let result = MessageResult { sn, code, reply };
        prop_assert_eq!(MessageResult::decode(&result.encode())?, result);
    }

    #[test]
    fn envelope_decodes_to_itself(
        message in call_message(),
        sources in prop::collection::vec(segment(), 0..3),
        destinations in prop::collection::vec(segment(), 0..3),
    ) {
        let envelope = Envelope::new(message, sources, destinations);
        prop_assert_eq!(Envelope::decode(&envelope.encode())?, envelope);
    }

    #[test]
    fn appended_garbage_is_rejected(
        request in request(),
        garbage in prop::collection::vec(any::<u8>(), 1..8),
    ) {
        let mut bytes = WireMessage::request(&request).encode();
        bytes.extend_from_slice(&garbage);
        let decoded = WireMessage::decode(&bytes);
        prop_assert!(
            matches!(decoded, Err(CodecError::TrailingBytes { .. })),
            "garbage suffix accepted: {:?}",
            decoded
        );
    }

    #[test]
    fn truncated_request_is_rejected(request in request(), cut in 1usize..16) {
        let bytes = request.encode();
        let keep = bytes.len().saturating_sub(cut);
        prop_assert!(MessageRequest::decode(&bytes[..keep]).is_err());
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
        let _ = WireMessage::decode(&bytes);
        let _ = MessageRequest::decode(&bytes);
        let _ = MessageResult::decode(&bytes);
        let _ = Envelope::decode(&bytes);
    }
}

#[test]
fn wire_message_carries_request_payload() {
    let request = MessageRequest {
        from: NetworkAddress::new("src", "dapp"),
        to: "receiver".into(),
        sn: 3,
        message_type: MessageType::Persistent,
        data: b"hello".to_vec(),
        protocols: vec!["bridge".into()],
    };

    let wire = WireMessage::decode(&WireMessage::request(&request).encode()).unwrap();
    assert_eq!(wire.kind, xcall_proto::WireMessageType::Request);
    assert_eq!(MessageRequest::decode(&wire.payload).unwrap(), request);
}

#[test]
fn result_payload_is_not_a_request() {
    let result = MessageResult::new(4, ResponseCode::Success);
    assert!(matches!(
        MessageRequest::decode(&result.encode()),
        Err(CodecError::FieldCount { expected: 6, actual: 3, .. })
    ));
}
