//! Utilities for the deploy scripts

use std::{io, str::FromStr};

use alloy::{
    network::EthereumWallet,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use deploy_core::network::NetworkConnection;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    constants::{DEFAULT_LOG_FILTER, LOG_FILTER_ENV_VAR},
    errors::ScriptError,
};

/// Sets up a signing client for the given connection, checking that the node
/// serves the expected chain
pub async fn setup_client(connection: &NetworkConnection) -> Result<DynProvider, ScriptError> {
    let signer = PrivateKeySigner::from_str(connection.signing_key())
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let deployer = signer.address();
    let url = Url::parse(&connection.rpc_url)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .on_http(url);
    let provider = DynProvider::new(provider);

    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let expected = connection.network.chain_id();
    if chain_id != expected {
        return Err(ScriptError::ClientInitialization(format!(
            "node serves chain {chain_id}, expected {expected} for {}",
            connection.network
        )));
    }

    info!(network = %connection.network, %deployer, "connected");
    Ok(provider)
}

/// Install the log subscriber, filtered by `RUST_LOG` and writing to stderr
/// so that command output on stdout stays machine-readable
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Print `value` to stdout as pretty JSON
pub fn print_json(value: &impl Serialize) -> Result<(), ScriptError> {
    let json =
        serde_json::to_string_pretty(value).map_err(|e| ScriptError::Serde(e.to_string()))?;
    println!("{json}");
    Ok(())
}
