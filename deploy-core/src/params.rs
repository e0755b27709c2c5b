//! The parameter store: per-network inputs consumed by deployment modules
//!
//! A parameter file maps module IDs to objects of named values:
//!
//! ```json
//! {
//!   "UniswapV3ActionsModule": { "factory": "0x…", "positionManager": "0x…" },
//!   "$global": { "owner": "0x…" }
//! }
//! ```
//!
//! Values are kept as opaque JSON; each module decides how to interpret them.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde_json::Value;
use tracing::debug;

use crate::{
    constants::{GLOBAL_PARAMETERS_KEY, PARAMETERS_FILE_PREFIX},
    errors::DeployError,
    types::NetworkId,
};

/// The parameter values bound to one network
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterSet {
    /// The network the values apply to
    network: NetworkId,
    /// The values, keyed by module ID then parameter name
    modules: BTreeMap<String, BTreeMap<String, Value>>,
}

impl ParameterSet {
    /// Create an empty parameter set for `network`
    pub fn new(network: NetworkId) -> Self {
        Self {
            network,
            modules: BTreeMap::new(),
        }
    }

    /// Parse a parameter set from the contents of a parameter file
    pub fn from_json(network: NetworkId, json: &str) -> Result<Self, serde_json::Error> {
        let modules = serde_json::from_str(json)?;
        Ok(Self { network, modules })
    }

    /// The network the values apply to
    pub fn network(&self) -> NetworkId {
        self.network
    }

    /// Set the value of `name` for `module`
    pub fn insert(&mut self, module: &str, name: &str, value: impl Into<Value>) {
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(name.to_string(), value.into());
    }

    /// Builder-style variant of [`ParameterSet::insert`]
    pub fn with(mut self, module: &str, name: &str, value: impl Into<Value>) -> Self {
        self.insert(module, name, value);
        self
    }

    /// Look up `name` for `module`, falling back to the global parameters
    pub fn get(&self, module: &str, name: &str) -> Option<&Value> {
        self.lookup_in(module, name)
            .or_else(|| self.lookup_in(GLOBAL_PARAMETERS_KEY, name))
    }

    /// Look up `name` in exactly the section for `module`
    fn lookup_in(&self, module: &str, name: &str) -> Option<&Value> {
        self.modules.get(module).and_then(|params| params.get(name))
    }
}

/// Loads parameter sets from a directory of `parameters-<network>.json` files
#[derive(Clone, Debug)]
pub struct ParameterStore {
    /// The directory holding the parameter files
    dir: PathBuf,
}

impl ParameterStore {
    /// Create a store reading from `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The path of the parameter file for `network`
    pub fn file_path(&self, network: NetworkId) -> PathBuf {
        network.file_path(&self.dir, PARAMETERS_FILE_PREFIX)
    }

    /// Load the parameter set for `network`
    pub fn load(&self, network: NetworkId) -> Result<ParameterSet, DeployError> {
        let path = self.file_path(network);
        let contents = read_parameter_file(&path)?;

        let params = ParameterSet::from_json(network, &contents).map_err(|e| {
            DeployError::ParameterParseError {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;

        debug!(%network, modules = params.modules.len(), "loaded parameters");
        Ok(params)
    }
}

/// Read a parameter file, distinguishing a missing file from an unreadable one
fn read_parameter_file(path: &Path) -> Result<String, DeployError> {
    if !path.is_file() {
        return Err(DeployError::ParameterFileMissing(path.to_path_buf()));
    }

    fs::read_to_string(path).map_err(|e| DeployError::io(path, e))
}
