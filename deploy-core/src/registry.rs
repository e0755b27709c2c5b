//! The address registry: the last known address of each contract on each network
//!
//! Each network's entries live in their own `addresses-<network>.json` file,
//! a flat object mapping contract names to hex addresses. The registry is
//! edited out-of-band and assumes a single writer.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use tracing::{debug, info};

use crate::{
    constants::ADDRESSES_FILE_PREFIX,
    errors::DeployError,
    types::{Address, ContractId, NetworkId},
};

/// The current address of each tracked contract, per network
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressRegistry {
    /// The recorded addresses, keyed by network then contract
    entries: BTreeMap<NetworkId, BTreeMap<ContractId, Address>>,
}

impl AddressRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The path of the registry file for `network` in `dir`
    pub fn file_path(dir: &Path, network: NetworkId) -> PathBuf {
        network.file_path(dir, ADDRESSES_FILE_PREFIX)
    }

    /// Look up the current address of `contract` on `network`
    pub fn lookup(&self, network: NetworkId, contract: ContractId) -> Result<Address, DeployError> {
        self.entries
            .get(&network)
            .and_then(|contracts| contracts.get(&contract))
            .copied()
            .ok_or(DeployError::AddressNotFound { network, contract })
    }

    /// Record `address` as the current address of `contract` on `network`,
    /// returning the address it replaces, if any
    pub fn record(
        &mut self,
        network: NetworkId,
        contract: ContractId,
        address: Address,
    ) -> Option<Address> {
        self.entries
            .entry(network)
            .or_default()
            .insert(contract, address)
    }

    /// Iterate over the entries recorded for `network`
    pub fn entries(&self, network: NetworkId) -> impl Iterator<Item = (ContractId, Address)> + '_ {
        self.entries
            .get(&network)
            .into_iter()
            .flat_map(|contracts| contracts.iter().map(|(id, addr)| (*id, *addr)))
    }

    /// Load the entries of every supported network found in `dir`
    pub fn load_all(dir: &Path) -> Result<Self, DeployError> {
        let mut registry = Self::new();
        for network in NetworkId::ALL {
            registry.load_network(dir, network)?;
        }

        Ok(registry)
    }

    /// Load the entries of `network` from `dir`.
    ///
    /// A missing file is an empty registry: nothing has been deployed yet.
    pub fn load(dir: &Path, network: NetworkId) -> Result<Self, DeployError> {
        let mut registry = Self::new();
        registry.load_network(dir, network)?;
        Ok(registry)
    }

    /// Read the file for `network` into this registry, replacing its entries
    fn load_network(&mut self, dir: &Path, network: NetworkId) -> Result<(), DeployError> {
        let path = Self::file_path(dir, network);
        if !path.exists() {
            debug!(%network, path = %path.display(), "no address registry file");
            self.entries.remove(&network);
            return Ok(());
        }

        let contents = fs::read_to_string(&path).map_err(|e| DeployError::io(&path, e))?;
        let raw: BTreeMap<String, String> =
            serde_json::from_str(&contents).map_err(|e| DeployError::serde(&path, e))?;

        let mut contracts = BTreeMap::new();
        for (name, address) in raw {
            let contract = ContractId::from_str(&name)?;
            let address = Address::from_str(&address)
                .map_err(|e| DeployError::serde(&path, format!("{name}: {e}")))?;
            contracts.insert(contract, address);
        }

        debug!(%network, entries = contracts.len(), "loaded address registry");
        self.entries.insert(network, contracts);
        Ok(())
    }

    /// Write the entries of `network` to its file in `dir`
    pub fn save(&self, dir: &Path, network: NetworkId) -> Result<(), DeployError> {
        let path = Self::file_path(dir, network);
        let contracts: BTreeMap<ContractId, Address> = self.entries(network).collect();

        fs::create_dir_all(dir).map_err(|e| DeployError::io(dir, e))?;
        let contents =
            serde_json::to_string_pretty(&contracts).map_err(|e| DeployError::serde(&path, e))?;
        fs::write(&path, contents + "\n").map_err(|e| DeployError::io(&path, e))?;

        info!(%network, path = %path.display(), "wrote address registry");
        Ok(())
    }
}
