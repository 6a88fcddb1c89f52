//! Arbitrary inbound bytes are rejected without touching engine state.

#![no_main]

use libfuzzer_sys::fuzz_target;
use xcall_core::{CallService, CallServiceConfig};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, message)) = data.split_first() else {
        return;
    };
    let caller = if selector & 1 == 0 { "bridge-a" } else { "bridge-b" };

    let mut service = CallService::new(CallServiceConfig::for_network("dst"), "admin");
    let _ = service.set_default_connection("admin", "src", "bridge-a");
    let before = service.state().clone();

    match service.handle_message(caller, "src", message) {
        Ok(actions) => assert!(actions.len() <= 1),
        Err(_) => assert_eq!(service.state(), &before),
    }
});
