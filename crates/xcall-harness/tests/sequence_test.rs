//! Sequence numbers: one per accepted send, never reused, untouched by
//! rejected sends.

use proptest::prelude::*;
use xcall_harness::{Dapp, PathFee, Scenario, World};
use xcall_proto::{CallMessage, Envelope, NetworkAddress};

fn world() -> World {
    let (app, _) = Dapp::new();
    Scenario::new("sequence")
        .network("src")
        .network("dst")
        .path("bridge", PathFee { message: 2, response: 1 })
        .default_path("bridge")
        .dapp("src", "app", app)
        .build()
        .unwrap()
}

fn message(kind: u8) -> CallMessage {
    match kind % 3 {
        0 => CallMessage::Call { data: vec![kind] },
        1 => CallMessage::Persistent { data: vec![kind] },
        _ => CallMessage::CallWithRollback { data: vec![kind], rollback: vec![1] },
    }
}

proptest! {
    #[test]
    fn accepted_sends_get_consecutive_numbers(
        sends in prop::collection::vec((any::<u8>(), 0u128..5), 1..40),
    ) {
        let mut world = world();
        let mut expected = 0u128;

        for (kind, value) in sends {
            let envelope = Envelope::with_default_path(message(kind));
            let to = NetworkAddress::new("dst", "dapp");
            match world.send_call("src", "app", to, envelope, value) {
                Ok(sn) => {
                    expected += 1;
                    prop_assert_eq!(sn, expected);
                },
                Err(_) => prop_assert_eq!(world.service("src").unwrap().last_sn(), expected),
            }
        }

        prop_assert_eq!(world.service("src").unwrap().last_sn(), expected);
        prop_assert_eq!(world.in_flight().len() as u128, expected);
    }
}
