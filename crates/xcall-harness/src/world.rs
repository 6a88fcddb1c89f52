//! World state for simulated cross-network runs.
//!
//! The [`World`] owns one engine per network, the destination applications
//! registered on each, and the pool of messages in flight between them. It
//! executes the actions every entry point returns:
//!
//! - `SendMessage` enters the in-flight pool; the path keeps the fee
//! - `Transfer` credits the recipient's balance
//! - `Emit` is appended to the network's notification log
//!
//! Deliveries pick a message from the pool with the world's RNG, so messages
//! are reordered across paths and networks. A path marked down drops every
//! message handed to it.

use std::collections::{BTreeMap, BTreeSet};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};
use xcall_core::{
    CallAction, CallError, CallEvent, CallMessageHandler, CallService, CallServiceConfig,
};
use xcall_proto::{Envelope, NetworkAddress, ResponseCode};

use crate::{
    error::HarnessError,
    sim_env::{PathFee, SimEnv},
};

/// Admin account of every simulated engine.
pub const ADMIN: &str = "admin";

/// A message travelling between two networks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Path carrying the message
    pub connection: String,
    /// Sending network
    pub src: String,
    /// Receiving network
    pub dst: String,
    /// Connection sequence number
    pub sn: i128,
    /// Encoded wire message
    pub message: Vec<u8>,
}

/// What happened to a delivered packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The receiving engine accepted the message.
    Accepted,
    /// The receiving engine rejected the message.
    Rejected(CallError),
    /// The path was down or the receiving network does not exist.
    Dropped,
}

struct Network {
    service: CallService,
    env: SimEnv,
    handlers: BTreeMap<String, Box<dyn CallMessageHandler>>,
    events: Vec<CallEvent>,
    balances: BTreeMap<String, u128>,
}

impl Network {
    fn new(id: &str) -> Self {
        Self {
            service: CallService::new(CallServiceConfig::for_network(id), ADMIN),
            env: SimEnv::new(),
            handlers: BTreeMap::new(),
            events: Vec::new(),
            balances: BTreeMap::new(),
        }
    }

    fn credit(&mut self, account: &str, amount: u128) {
        let balance = self.balances.entry(account.to_string()).or_insert(0);
        *balance = balance.saturating_add(amount);
    }
}

/// Networks, their engines and the messages in flight between them.
pub struct World {
    networks: BTreeMap<String, Network>,
    in_flight: Vec<Packet>,
    down: BTreeSet<String>,
    rng: ChaCha8Rng,
    reorder: bool,
    delivered: usize,
    dropped: usize,
}

impl World {
    /// Empty world whose delivery order is fixed by `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            networks: BTreeMap::new(),
            in_flight: Vec::new(),
            down: BTreeSet::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            reorder: true,
            delivered: 0,
            dropped: 0,
        }
    }

    /// Add a network with a fresh engine administered by [`ADMIN`].
    pub fn add_network(&mut self, id: impl Into<String>) {
        let id = id.into();
        let network = Network::new(&id);
        self.networks.insert(id, network);
    }

    /// Make `connection` available on every network at `fee`.
    pub fn add_path(&mut self, connection: &str, fee: PathFee) {
        for network in self.networks.values_mut() {
            network.env.add_path(connection, fee);
        }
    }

    /// Register `connection` as the default path from `network` to `target`.
    ///
    /// # Errors
    /// Returns `UnknownNetwork` if `network` does not exist
    pub fn set_default_path(
        &mut self,
        network: &str,
        target: &str,
        connection: &str,
    ) -> Result<(), HarnessError> {
        self.network_mut(network)?.service.set_default_connection(ADMIN, target, connection)?;
        Ok(())
    }

    /// Set the protocol fee on every network.
    ///
    /// # Errors
    /// Returns `Call` if the engine rejects the change
    pub fn set_protocol_fee(&mut self, fee: u128) -> Result<(), HarnessError> {
        for network in self.networks.values_mut() {
            network.service.set_protocol_fee(ADMIN, fee)?;
        }
        Ok(())
    }

    /// Register `handler` as the contract `account` on `network`.
    ///
    /// # Errors
    /// Returns `UnknownNetwork` if `network` does not exist
    pub fn register_dapp(
        &mut self,
        network: &str,
        account: &str,
        handler: impl CallMessageHandler + 'static,
    ) -> Result<(), HarnessError> {
        self.register_boxed_dapp(network, account, Box::new(handler))
    }

    /// Register an already boxed handler as the contract `account`.
    ///
    /// # Errors
    /// Returns `UnknownNetwork` if `network` does not exist
    pub fn register_boxed_dapp(
        &mut self,
        network: &str,
        account: &str,
        handler: Box<dyn CallMessageHandler>,
    ) -> Result<(), HarnessError> {
        let network = self.network_mut(network)?;
        network.env.add_contract(account);
        network.handlers.insert(account.to_string(), handler);
        Ok(())
    }

    /// Deliver packets in the order they were sent instead of at random.
    pub fn set_reordering(&mut self, reorder: bool) {
        self.reorder = reorder;
    }

    /// Take `connection` down or bring it back up.
    pub fn set_path_down(&mut self, connection: &str, down: bool) {
        if down {
            self.down.insert(connection.to_string());
        } else {
            self.down.remove(connection);
        }
    }

    /// Engine of `network`.
    ///
    /// # Errors
    /// Returns `UnknownNetwork` if `network` does not exist
    pub fn service(&self, network: &str) -> Result<&CallService, HarnessError> {
        Ok(&self.network(network)?.service)
    }

    /// Replace the engine of `network`, keeping its dapps and logs.
    ///
    /// # Errors
    /// Returns `UnknownNetwork` if `network` does not exist
    pub fn replace_service(
        &mut self,
        network: &str,
        service: CallService,
    ) -> Result<(), HarnessError> {
        self.network_mut(network)?.service = service;
        Ok(())
    }

    /// Notifications emitted on `network`, oldest first.
    pub fn events(&self, network: &str) -> &[CallEvent] {
        self.networks.get(network).map(|n| n.events.as_slice()).unwrap_or_default()
    }

    /// Funds credited to `account` on `network`, paths included.
    pub fn balance(&self, network: &str, account: &str) -> u128 {
        self.networks
            .get(network)
            .and_then(|n| n.balances.get(account).copied())
            .unwrap_or(0)
    }

    /// Packets waiting for delivery.
    pub fn in_flight(&self) -> &[Packet] {
        &self.in_flight
    }

    /// Packets delivered so far, rejected ones included.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Packets dropped so far.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Requests announced on `network` by `CallMessage`, as `(req_id, data)`.
    pub fn received(&self, network: &str) -> Vec<(u128, Vec<u8>)> {
        self.events(network)
            .iter()
            .filter_map(|event| match event {
                CallEvent::CallMessage { req_id, data, .. } => Some((*req_id, data.clone())),
                _ => None,
            })
            .collect()
    }

    /// Execution outcomes on `network`, as `(req_id, code)`.
    pub fn executions(&self, network: &str) -> Vec<(u128, ResponseCode)> {
        self.events(network)
            .iter()
            .filter_map(|event| match event {
                CallEvent::CallExecuted { req_id, code, .. } => Some((*req_id, *code)),
                _ => None,
            })
            .collect()
    }

    /// Send a call from `caller` on `network`.
    ///
    /// # Errors
    /// Returns `Call` with the engine's rejection
    pub fn send_call(
        &mut self,
        network: &str,
        caller: &str,
        to: NetworkAddress,
        envelope: Envelope,
        value: u128,
    ) -> Result<u128, HarnessError> {
        let net = self.network_mut(network)?;
        let (sn, actions) = net.service.send_call(&net.env, caller, to, envelope, value)?;
        self.apply(network, actions);
        Ok(sn)
    }

    /// Fee quoted on `network` for a call to `to` over `sources`.
    ///
    /// # Errors
    /// Returns `Call` if no path can be resolved or priced
    pub fn get_fee(
        &self,
        network: &str,
        to: &str,
        rollback: bool,
        sources: &[String],
    ) -> Result<u128, HarnessError> {
        let net = self.network(network)?;
        Ok(net.service.get_fee(&net.env, to, rollback, sources)?)
    }

    /// Execute request `req_id` on `network` with the payload it was
    /// announced with.
    ///
    /// # Errors
    /// - `UnknownRequest` if no such request was announced
    /// - `Call` with the engine's rejection
    pub fn execute_call(&mut self, network: &str, req_id: u128) -> Result<(), HarnessError> {
        let data = self
            .received(network)
            .into_iter()
            .find_map(|(id, data)| (id == req_id).then_some(data))
            .ok_or_else(|| HarnessError::UnknownRequest { network: network.to_string(), req_id })?;
        self.execute_call_with(network, req_id, &data)
    }

    /// Execute request `req_id` on `network` with an explicit payload.
    ///
    /// # Errors
    /// Returns `Call` with the engine's rejection
    pub fn execute_call_with(
        &mut self,
        network: &str,
        req_id: u128,
        data: &[u8],
    ) -> Result<(), HarnessError> {
        let net = self.network_mut(network)?;
        let actions = net.service.execute_call(&net.env, &mut net.handlers, req_id, data)?;
        self.apply(network, actions);
        Ok(())
    }

    /// Execute every announced request on `network` that is still pending.
    ///
    /// Returns the outcome per request id.
    pub fn execute_pending(&mut self, network: &str) -> Vec<(u128, Result<(), HarnessError>)> {
        let pending: Vec<u128> = self
            .received(network)
            .into_iter()
            .map(|(req_id, _)| req_id)
            .filter(|req_id| {
                self.networks
                    .get(network)
                    .is_some_and(|n| n.service.proxy_request(*req_id).is_some())
            })
            .collect();

        pending.into_iter().map(|req_id| (req_id, self.execute_call(network, req_id))).collect()
    }

    /// Deliver the rollback of call `sn` on `network`.
    ///
    /// # Errors
    /// Returns `Call` with the engine's rejection
    pub fn execute_rollback(&mut self, network: &str, sn: u128) -> Result<(), HarnessError> {
        let net = self.network_mut(network)?;
        let actions = net.service.execute_rollback(&net.env, &mut net.handlers, sn)?;
        self.apply(network, actions);
        Ok(())
    }

    /// Decline request `req_id` on `network` on behalf of `caller`.
    ///
    /// # Errors
    /// Returns `Call` with the engine's rejection
    pub fn force_rollback(
        &mut self,
        network: &str,
        caller: &str,
        req_id: u128,
    ) -> Result<(), HarnessError> {
        let actions = self.network_mut(network)?.service.handle_forced_rollback(caller, req_id)?;
        self.apply(network, actions);
        Ok(())
    }

    /// Deliver one in-flight packet.
    ///
    /// Returns `None` when nothing is in flight. A request rejected by its
    /// destination is reported back to the sender through `handle_error` when
    /// it expected a response.
    pub fn deliver_next(&mut self) -> Option<(Packet, DeliveryOutcome)> {
        if self.in_flight.is_empty() {
            return None;
        }
        let index = if self.reorder { self.rng.gen_range(0..self.in_flight.len()) } else { 0 };
        let packet = self.in_flight.remove(index);
        let outcome = self.deliver(&packet);
        Some((packet, outcome))
    }

    /// Deliver packets until none are in flight.
    ///
    /// Returns the number of packets taken from the pool.
    pub fn deliver_all(&mut self) -> usize {
        let mut count = 0;
        while self.deliver_next().is_some() {
            count += 1;
        }
        count
    }

    fn deliver(&mut self, packet: &Packet) -> DeliveryOutcome {
        if self.down.contains(&packet.connection) {
            debug!(connection = %packet.connection, sn = packet.sn, "path down, packet dropped");
            self.dropped += 1;
            return DeliveryOutcome::Dropped;
        }
        let Some(net) = self.networks.get_mut(&packet.dst) else {
            warn!(network = %packet.dst, "packet for unknown network dropped");
            self.dropped += 1;
            return DeliveryOutcome::Dropped;
        };

        self.delivered += 1;
        match net.service.handle_message(&packet.connection, &packet.src, &packet.message) {
            Ok(actions) => {
                let dst = packet.dst.clone();
                self.apply(&dst, actions);
                DeliveryOutcome::Accepted
            },
            Err(err) => {
                warn!(
                    connection = %packet.connection,
                    sn = packet.sn,
                    error = %err,
                    "packet rejected"
                );
                if let Ok(sn) = u128::try_from(packet.sn)
                    && sn > 0
                {
                    self.report_error(packet, sn);
                }
                DeliveryOutcome::Rejected(err)
            },
        }
    }

    fn report_error(&mut self, packet: &Packet, sn: u128) {
        let Some(net) = self.networks.get_mut(&packet.src) else {
            return;
        };
        match net.service.handle_error(&packet.connection, sn) {
            Ok(actions) => {
                let src = packet.src.clone();
                self.apply(&src, actions);
            },
            Err(err) => debug!(sn, error = %err, "error report ignored"),
        }
    }

    fn apply(&mut self, network: &str, actions: Vec<CallAction>) {
        let mut packets = Vec::new();
        if let Some(net) = self.networks.get_mut(network) {
            for action in actions {
                match action {
                    CallAction::SendMessage { connection, network: dst, sn, message, fee, .. } => {
                        net.credit(&connection, fee);
                        let src = network.to_string();
                        packets.push(Packet { connection, src, dst, sn, message });
                    },
                    CallAction::Transfer { to, amount } => net.credit(&to, amount),
                    CallAction::Emit(event) => {
                        debug!(network, event = ?event, "notification");
                        net.events.push(event);
                    },
                }
            }
        }
        self.in_flight.extend(packets);
    }

    fn network(&self, id: &str) -> Result<&Network, HarnessError> {
        self.networks.get(id).ok_or_else(|| HarnessError::UnknownNetwork(id.to_string()))
    }

    fn network_mut(&mut self, id: &str) -> Result<&mut Network, HarnessError> {
        self.networks.get_mut(id).ok_or_else(|| HarnessError::UnknownNetwork(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use xcall_proto::CallMessage;

    use super::*;
    use crate::dapp::Dapp;

    fn two_networks(seed: u64) -> World {
        let mut world = World::new(seed);
        world.add_network("src");
        world.add_network("dst");
        world.add_path("bridge", PathFee::flat(2));
        world.set_default_path("src", "dst", "bridge").unwrap();
        world.set_default_path("dst", "src", "bridge").unwrap();
        world
    }

    #[test]
    fn one_way_call_reaches_destination() {
        let mut world = two_networks(1);
        let (dapp, handle) = Dapp::new();
        world.register_dapp("dst", "dapp", dapp).unwrap();

        let envelope = Envelope::with_default_path(CallMessage::Call { data: b"hi".to_vec() });
        world.send_call("src", "alice", NetworkAddress::new("dst", "dapp"), envelope, 2).unwrap();
        assert_eq!(world.in_flight().len(), 1);
        assert_eq!(world.balance("src", "bridge"), 2);

        assert_eq!(world.deliver_all(), 1);
        let (req_id, _) = world.received("dst")[0].clone();
        world.execute_call("dst", req_id).unwrap();

        assert_eq!(handle.count(), 1);
        assert_eq!(world.executions("dst"), vec![(req_id, ResponseCode::Success)]);
    }

    #[test]
    fn down_path_drops_packets() {
        let mut world = two_networks(1);
        world.set_path_down("bridge", true);

        let envelope = Envelope::with_default_path(CallMessage::Call { data: b"hi".to_vec() });
        world.send_call("src", "alice", NetworkAddress::new("dst", "dapp"), envelope, 2).unwrap();

        assert_eq!(world.deliver_all(), 1);
        assert_eq!(world.dropped(), 1);
        assert!(world.received("dst").is_empty());
    }

    #[test]
    fn unknown_network_is_reported() {
        let mut world = World::new(0);
        assert_eq!(
            world.set_default_path("nowhere", "dst", "bridge"),
            Err(HarnessError::UnknownNetwork("nowhere".into()))
        );
        assert!(world.events("nowhere").is_empty());
    }
}
