//! Engine state survives export and re-import between steps of a call.

use xcall_core::CallService;
use xcall_harness::{Dapp, PathFee, Scenario, World};
use xcall_proto::{CallMessage, Envelope, NetworkAddress};

fn reload(world: &mut World, network: &str) {
    let service = world.service(network).unwrap();
    let bytes = service.export_state().unwrap();
    let restored = CallService::import_state(service.config().clone(), &bytes).unwrap();
    assert_eq!(restored.state(), service.state());
    world.replace_service(network, restored).unwrap();
}

#[test]
fn rollback_survives_restarts_on_both_sides() {
    let (app, app_handle) = Dapp::new();
    let (dapp, _) = Dapp::failing();
    let mut world = Scenario::new("restarts")
        .network("src")
        .network("dst")
        .path("bridge", PathFee::flat(2))
        .default_path("bridge")
        .dapp("src", "app", app)
        .dapp("dst", "dapp", dapp)
        .build()
        .unwrap();

    let envelope = Envelope::with_default_path(CallMessage::CallWithRollback {
        data: b"do".to_vec(),
        rollback: b"undo".to_vec(),
    });
    let to = NetworkAddress::new("dst", "dapp");
    let sn = world.send_call("src", "app", to, envelope, 2).unwrap();
    reload(&mut world, "src");

    world.deliver_all();
    reload(&mut world, "dst");
    let (req_id, _) = world.received("dst")[0].clone();
    assert!(world.service("dst").unwrap().proxy_request(req_id).is_some());

    world.execute_call("dst", req_id).unwrap();
    world.deliver_all();
    reload(&mut world, "src");

    world.execute_rollback("src", sn).unwrap();
    assert_eq!(app_handle.deliveries()[0].data, b"undo");
    assert_eq!(world.service("src").unwrap().last_sn(), sn);
}

#[test]
fn corrupt_state_is_rejected() {
    let world = Scenario::new("corrupt").network("src").build().unwrap();
    let config = world.service("src").unwrap().config().clone();
    assert!(CallService::import_state(config, b"\xff\x00garbage").is_err());
}
