//! Scenario builder API.
//!
//! Declares networks, paths and dapps up front, then runs test steps against
//! the resulting [`World`] and checks the outcome with a mandatory oracle.
//!
//! ```text
//! Scenario::new("round trip")
//!     .network("src").network("dst")
//!     .path("bridge", PathFee::flat(2))
//!     .default_path("bridge")
//!     .oracle(Box::new(|world| ...))
//!     .run(|world| { ...steps... })
//! ```

use xcall_core::CallMessageHandler;

use crate::{error::HarnessError, sim_env::PathFee, world::World};

/// Verifies the final state of a scenario.
pub type OracleFn = Box<dyn FnOnce(&World) -> Result<(), String>>;

/// Scenario builder.
pub struct Scenario {
    name: String,
    seed: u64,
    networks: Vec<String>,
    paths: Vec<(String, PathFee)>,
    default_path: Option<String>,
    protocol_fee: u128,
    reorder: bool,
    dapps: Vec<(String, String, Box<dyn CallMessageHandler>)>,
}

impl Scenario {
    /// Create a new scenario with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seed: 0,
            networks: Vec::new(),
            paths: Vec::new(),
            default_path: None,
            protocol_fee: 0,
            reorder: true,
            dapps: Vec::new(),
        }
    }

    /// Seed for the delivery order.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Add a network.
    pub fn network(mut self, id: impl Into<String>) -> Self {
        self.networks.push(id.into());
        self
    }

    /// Add a path available on every network.
    pub fn path(mut self, connection: impl Into<String>, fee: PathFee) -> Self {
        self.paths.push((connection.into(), fee));
        self
    }

    /// Use `connection` as the default path between every pair of networks.
    pub fn default_path(mut self, connection: impl Into<String>) -> Self {
        self.default_path = Some(connection.into());
        self
    }

    /// Protocol fee charged on every network.
    pub fn protocol_fee(mut self, fee: u128) -> Self {
        self.protocol_fee = fee;
        self
    }

    /// Deliver in send order instead of at random.
    pub fn in_order(mut self) -> Self {
        self.reorder = false;
        self
    }

    /// Register a dapp on `network`.
    pub fn dapp(
        mut self,
        network: impl Into<String>,
        account: impl Into<String>,
        handler: impl CallMessageHandler + 'static,
    ) -> Self {
        self.dapps.push((network.into(), account.into(), Box::new(handler)));
        self
    }

    /// Build the world without an oracle.
    ///
    /// # Errors
    /// Returns `UnknownNetwork` if a dapp names a network that was not added
    pub fn build(self) -> Result<World, HarnessError> {
        let mut world = World::new(self.seed);
        for network in &self.networks {
            world.add_network(network.clone());
        }
        for (connection, fee) in &self.paths {
            world.add_path(connection, *fee);
        }
        if let Some(connection) = &self.default_path {
            for from in &self.networks {
                for to in self.networks.iter().filter(|to| *to != from) {
                    world.set_default_path(from, to, connection)?;
                }
            }
        }
        world.set_protocol_fee(self.protocol_fee)?;
        world.set_reordering(self.reorder);
        for (network, account, handler) in self.dapps {
            world.register_boxed_dapp(&network, &account, handler)?;
        }
        Ok(world)
    }

    /// Set the oracle function and return a runnable scenario.
    ///
    /// The oracle is mandatory: a scenario cannot run without verification.
    pub fn oracle(self, oracle: OracleFn) -> RunnableScenario {
        RunnableScenario { scenario: self, oracle }
    }
}

/// A scenario with an oracle function that can be executed.
pub struct RunnableScenario {
    scenario: Scenario,
    oracle: OracleFn,
}

impl RunnableScenario {
    /// Build the world, run `steps` against it, then run the oracle.
    ///
    /// # Errors
    /// Returns a message naming the scenario if building, a step or the
    /// oracle fails
    pub fn run(
        self,
        steps: impl FnOnce(&mut World) -> Result<(), HarnessError>,
    ) -> Result<(), String> {
        let name = self.scenario.name.clone();
        let mut world =
            self.scenario.build().map_err(|e| format!("Scenario '{name}': setup failed: {e}"))?;
        steps(&mut world).map_err(|e| format!("Scenario '{name}': step failed: {e}"))?;
        (self.oracle)(&world).map_err(|e| format!("Scenario '{name}': oracle failed: {e}"))
    }
}
