//! Simulated xcall round trip.
//!
//! Sends one call with rollback from an application on the source network to
//! a dapp on the destination network, drives both engines until nothing is in
//! flight, and logs every step. Set `RUST_LOG=debug` to also see votes and
//! individual notifications.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use xcall_harness::{Dapp, DappHandle, HarnessError, PathFee, Scenario, World};
use xcall_proto::{CallMessage, Envelope, NetworkAddress};

const APP: &str = "app";
const DAPP: &str = "dapp";

#[derive(Parser, Debug)]
#[command(name = "xcall-sim", version, about = "Simulated cross-network call round trip")]
struct Args {
    /// Network the call starts on
    #[arg(long, default_value = "src")]
    source_network: String,

    /// Network the call is executed on
    #[arg(long, default_value = "dst")]
    destination_network: String,

    /// Paths the call travels over; more than one requires all to confirm
    #[arg(long, value_delimiter = ',', default_value = "bridge")]
    paths: Vec<String>,

    /// Flat protocol fee charged on both networks
    #[arg(long, default_value_t = 0)]
    protocol_fee: u128,

    /// Seed for the delivery order
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Make the destination dapp reject the call, triggering a rollback
    #[arg(long)]
    fail_destination: bool,

    /// Make the destination dapp answer with a piggybacked reply
    #[arg(long)]
    reply: bool,
}

/// What a run ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Outcome {
    sn: u128,
    succeeded: bool,
    rolled_back: bool,
    replies: usize,
    delivered: usize,
}

fn main() -> Result<(), HarnessError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();
    let outcome = run(&args)?;
    info!(
        sn = outcome.sn,
        succeeded = outcome.succeeded,
        rolled_back = outcome.rolled_back,
        replies = outcome.replies,
        delivered = outcome.delivered,
        "round trip finished"
    );
    Ok(())
}

fn run(args: &Args) -> Result<Outcome, HarnessError> {
    let src = args.source_network.as_str();
    let dst = args.destination_network.as_str();
    let (mut world, app) = build(args)?;

    // A single path goes through the default route, several are declared.
    let paths = if args.paths.len() > 1 { args.paths.clone() } else { Vec::new() };
    let value = world.get_fee(src, dst, true, &paths)?;
    let envelope = Envelope::new(
        CallMessage::CallWithRollback { data: b"ping".to_vec(), rollback: b"undo".to_vec() },
        paths.clone(),
        paths,
    );
    let sn = world.send_call(src, APP, NetworkAddress::new(dst, DAPP), envelope, value)?;
    info!(sn, value, from = src, to = dst, "call sent");

    world.deliver_all();
    for (req_id, result) in world.execute_pending(dst) {
        result?;
        info!(req_id, network = dst, "request executed");
    }
    world.deliver_all();

    let service = world.service(src)?;
    let succeeded = service.verify_success(sn);
    let rolled_back = !succeeded && service.pending_rollback(sn).is_some_and(|c| c.enabled);
    if rolled_back {
        world.execute_rollback(src, sn)?;
        info!(sn, "rollback executed");
    }
    for (req_id, result) in world.execute_pending(src) {
        result?;
        info!(req_id, network = src, "reply executed");
    }

    Ok(Outcome {
        sn,
        succeeded,
        rolled_back,
        replies: replies(&app),
        delivered: world.delivered(),
    })
}

fn build(args: &Args) -> Result<(World, DappHandle), HarnessError> {
    let (app, app_handle) = Dapp::new();
    let (dapp, dapp_handle) =
        if args.reply { Dapp::replying(b"pong".to_vec()) } else { Dapp::new() };
    dapp_handle.set_failing(args.fail_destination);

    let mut scenario = Scenario::new("xcall-sim")
        .seed(args.seed)
        .network(args.source_network.clone())
        .network(args.destination_network.clone())
        .protocol_fee(args.protocol_fee)
        .dapp(args.source_network.clone(), APP, app)
        .dapp(args.destination_network.clone(), DAPP, dapp);
    for path in &args.paths {
        scenario = scenario.path(path.clone(), PathFee { message: 10, response: 5 });
    }
    if let Some(first) = args.paths.first() {
        scenario = scenario.default_path(first.clone());
    }
    Ok((scenario.build()?, app_handle))
}

/// Deliveries to the source app other than the rollback.
fn replies(app: &DappHandle) -> usize {
    app.deliveries().iter().filter(|d| d.data != b"undo").count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["xcall-sim"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn plain_round_trip_succeeds() {
        let outcome = run(&args(&[])).unwrap();
        assert!(outcome.succeeded);
        assert!(!outcome.rolled_back);
        assert_eq!(outcome.delivered, 2);
    }

    #[test]
    fn failing_destination_rolls_back() {
        let outcome = run(&args(&["--fail-destination", "--protocol-fee", "3"])).unwrap();
        assert!(!outcome.succeeded);
        assert!(outcome.rolled_back);
    }

    #[test]
    fn reply_reaches_source_app() {
        let outcome = run(&args(&["--reply", "--paths", "a,b,c", "--seed", "9"])).unwrap();
        assert!(outcome.succeeded);
        assert_eq!(outcome.replies, 1);
        assert_eq!(outcome.delivered, 6);
    }
}
