//! Envelope decoding never panics, and what decodes survives a round trip.

#![no_main]

use libfuzzer_sys::fuzz_target;
use xcall_proto::Envelope;

fuzz_target!(|data: &[u8]| {
    if let Ok(envelope) = Envelope::decode(data) {
        assert_eq!(Envelope::decode(&envelope.encode()), Ok(envelope));
    }
});
