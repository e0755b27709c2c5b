//! The network registry: connection parameters for each supported network

use std::fmt::{self, Debug, Formatter};

use tracing::debug;

use crate::{
    constants::{API_KEY_PLACEHOLDER, DEVNET_RPC_URL, ENDPOINT_TEMPLATE, NETWORK_PLACEHOLDER},
    errors::DeployError,
    types::NetworkId,
};

/// Process-wide connection configuration, typically read from CLI flags or
/// the environment. Values are opaque; only their presence is checked.
#[derive(Clone, Default)]
pub struct ConnectionSettings {
    /// The API key substituted into the hosted endpoint template
    pub api_key: Option<String>,
    /// The private key of the deployer
    pub private_key: Option<String>,
    /// An RPC URL used in place of the endpoint template
    pub rpc_url: Option<String>,
}

impl Debug for ConnectionSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("rpc_url", &self.rpc_url)
            .finish()
    }
}

/// Everything needed to open a signing connection to one network
#[derive(Clone)]
pub struct NetworkConnection {
    /// The network connected to
    pub network: NetworkId,
    /// The RPC endpoint of the network
    pub rpc_url: String,
    /// The private key of the deployer
    signing_key: String,
}

impl NetworkConnection {
    /// The private key of the deployer
    pub fn signing_key(&self) -> &str {
        &self.signing_key
    }
}

impl Debug for NetworkConnection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConnection")
            .field("network", &self.network)
            .field("rpc_url", &"<redacted>")
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

/// Resolves connection parameters for the closed set of supported networks
#[derive(Clone, Debug, Default)]
pub struct NetworkRegistry {
    /// The configured connection settings
    settings: ConnectionSettings,
}

impl NetworkRegistry {
    /// Create a registry over the given settings
    pub fn new(settings: ConnectionSettings) -> Self {
        Self { settings }
    }

    /// Resolve the connection parameters for `network`
    pub fn connection(&self, network: NetworkId) -> Result<NetworkConnection, DeployError> {
        let signing_key = present(&self.settings.private_key).ok_or_else(|| {
            DeployError::ConfigurationMissing {
                network,
                detail: "no signing key configured".to_string(),
            }
        })?;

        let rpc_url = match present(&self.settings.rpc_url) {
            Some(url) => url.to_string(),
            None => self.endpoint(network)?,
        };

        debug!(%network, "resolved network connection");
        Ok(NetworkConnection {
            network,
            rpc_url,
            signing_key: signing_key.to_string(),
        })
    }

    /// Render the endpoint of `network` from the hosted endpoint template
    fn endpoint(&self, network: NetworkId) -> Result<String, DeployError> {
        let Some(slug) = network.endpoint_slug() else {
            return Ok(DEVNET_RPC_URL.to_string());
        };

        let api_key = present(&self.settings.api_key).ok_or_else(|| {
            DeployError::ConfigurationMissing {
                network,
                detail: "no API key configured for the hosted endpoint".to_string(),
            }
        })?;

        Ok(ENDPOINT_TEMPLATE
            .replace(NETWORK_PLACEHOLDER, slug)
            .replace(API_KEY_PLACEHOLDER, api_key))
    }
}

/// Treat empty configuration values as absent
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
