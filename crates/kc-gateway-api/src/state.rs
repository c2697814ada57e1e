//! Gateway API state.

use kc_admin_client::AdminClient;
use kc_gateway::AdminGateway;

/// State shared by all gateway handlers.
pub struct GatewayState<C: AdminClient + ?Sized> {
    /// The gateway every handler delegates to.
    pub gateway: AdminGateway<C>,
    /// Whether enable/disable requests are committed to the server.
    pub persist_user_status: bool,
}

// Manual Clone implementation that doesn't require C: Clone
impl<C: AdminClient + ?Sized> Clone for GatewayState<C> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            persist_user_status: self.persist_user_status,
        }
    }
}

impl<C: AdminClient + ?Sized> GatewayState<C> {
    /// Creates the state.
    pub const fn new(gateway: AdminGateway<C>, persist_user_status: bool) -> Self {
        Self {
            gateway,
            persist_user_status,
        }
    }
}
