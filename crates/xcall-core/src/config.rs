//! Static engine configuration.

/// Configuration fixed at construction.
///
/// Runtime settings that an admin may change (protocol fee, fee handler,
/// default connections) live in [`crate::CallState`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallServiceConfig {
    /// Id of the network this engine runs on
    pub network_id: String,
    /// Service name passed to connections and used as the engine's account
    pub service_name: String,
    /// Ceiling for an encoded outbound request, in bytes
    pub max_data_size: usize,
    /// Ceiling for a rollback payload, in bytes
    pub max_rollback_size: usize,
}

impl CallServiceConfig {
    /// Default configuration for the given network.
    pub fn for_network(network_id: impl Into<String>) -> Self {
        Self { network_id: network_id.into(), ..Self::default() }
    }
}

impl Default for CallServiceConfig {
    fn default() -> Self {
        Self {
            network_id: String::new(),
            service_name: "xcall".to_string(),
            max_data_size: 2048,
            max_rollback_size: 1024,
        }
    }
}
