//! Admin-gated settings.

use tracing::info;

use super::CallService;
use crate::error::CallError;

impl CallService {
    /// Current admin.
    pub fn admin(&self) -> &str {
        &self.state.settings.admin
    }

    /// Flat fee charged on every outbound call.
    pub fn protocol_fee(&self) -> u128 {
        self.state.settings.protocol_fee
    }

    /// Recipient of the protocol fee.
    pub fn protocol_fee_handler(&self) -> &str {
        &self.state.settings.fee_handler
    }

    /// Default path for `network`, if one is registered.
    pub fn default_connection(&self, network: &str) -> Option<&str> {
        self.state.settings.default_connections.get(network).map(String::as_str)
    }

    /// Hand admin rights to `admin`.
    ///
    /// # Errors
    /// Returns `OnlyAdmin` if `caller` is not the admin
    pub fn set_admin(&mut self, caller: &str, admin: impl Into<String>) -> Result<(), CallError> {
        self.ensure_admin(caller)?;
        self.state.settings.admin = admin.into();
        info!(admin = %self.state.settings.admin, "admin changed");
        Ok(())
    }

    /// Set the flat protocol fee.
    ///
    /// # Errors
    /// Returns `OnlyAdmin` if `caller` is not the admin
    pub fn set_protocol_fee(&mut self, caller: &str, fee: u128) -> Result<(), CallError> {
        self.ensure_admin(caller)?;
        self.state.settings.protocol_fee = fee;
        info!(fee, "protocol fee changed");
        Ok(())
    }

    /// Set the protocol fee recipient.
    ///
    /// # Errors
    /// Returns `OnlyAdmin` if `caller` is not the admin
    pub fn set_protocol_fee_handler(
        &mut self,
        caller: &str,
        handler: impl Into<String>,
    ) -> Result<(), CallError> {
        self.ensure_admin(caller)?;
        self.state.settings.fee_handler = handler.into();
        info!(handler = %self.state.settings.fee_handler, "protocol fee handler changed");
        Ok(())
    }

    /// Register the path used for `network` when a call declares none.
    ///
    /// # Errors
    /// Returns `OnlyAdmin` if `caller` is not the admin
    pub fn set_default_connection(
        &mut self,
        caller: &str,
        network: impl Into<String>,
        connection: impl Into<String>,
    ) -> Result<(), CallError> {
        self.ensure_admin(caller)?;
        let network = network.into();
        let connection = connection.into();
        info!(network = %network, connection = %connection, "default connection set");
        self.state.settings.default_connections.insert(network, connection);
        Ok(())
    }

    fn ensure_admin(&self, caller: &str) -> Result<(), CallError> {
        if caller != self.state.settings.admin {
            return Err(CallError::OnlyAdmin);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{CallService, CallServiceConfig, error::CallError};

    #[test]
    fn settings_are_admin_gated() {
        let mut svc = CallService::new(CallServiceConfig::for_network("src"), "admin");
        assert_eq!(svc.protocol_fee_handler(), "admin");

        assert_eq!(svc.set_protocol_fee("mallory", 10), Err(CallError::OnlyAdmin));
        assert_eq!(svc.set_default_connection("mallory", "dst", "evil"), Err(CallError::OnlyAdmin));
        assert_eq!(svc.protocol_fee(), 0);
        assert_eq!(svc.default_connection("dst"), None);

        svc.set_protocol_fee("admin", 10).unwrap();
        svc.set_default_connection("admin", "dst", "bridge").unwrap();
        assert_eq!(svc.protocol_fee(), 10);
        assert_eq!(svc.default_connection("dst"), Some("bridge"));
    }

    #[test]
    fn admin_handover() {
        let mut svc = CallService::new(CallServiceConfig::for_network("src"), "admin");
        svc.set_admin("admin", "successor").unwrap();

        assert_eq!(svc.admin(), "successor");
        assert_eq!(svc.set_protocol_fee_handler("admin", "x"), Err(CallError::OnlyAdmin));
        svc.set_protocol_fee_handler("successor", "treasury").unwrap();
        assert_eq!(svc.protocol_fee_handler(), "treasury");
    }
}
