//! Wire messages either fail to decode or decode to a canonical encoding.

#![no_main]

use libfuzzer_sys::fuzz_target;
use xcall_proto::{MessageRequest, MessageResult, WireMessage, WireMessageType};

fuzz_target!(|data: &[u8]| {
    let Ok(wire) = WireMessage::decode(data) else {
        return;
    };
    assert_eq!(wire.encode(), data);

    match wire.kind {
        WireMessageType::Request => {
            if let Ok(request) = MessageRequest::decode(&wire.payload) {
                assert_eq!(request.encode(), wire.payload);
            }
        },
        WireMessageType::Result => {
            if let Ok(result) = MessageResult::decode(&wire.payload) {
                assert_eq!(MessageResult::decode(&result.encode()), Ok(result));
            }
        },
    }
});
