//! Constants used throughout the deployment tooling

/// The endpoint template for hosted networks.
///
/// `{network}` is replaced by the network's endpoint slug and `{api_key}` by
/// the configured API key.
pub const ENDPOINT_TEMPLATE: &str = "https://{network}.g.alchemy.com/v2/{api_key}";

/// The placeholder for the network slug in [`ENDPOINT_TEMPLATE`]
pub const NETWORK_PLACEHOLDER: &str = "{network}";

/// The placeholder for the API key in [`ENDPOINT_TEMPLATE`]
pub const API_KEY_PLACEHOLDER: &str = "{api_key}";

/// The RPC URL of a locally running devnet node
pub const DEVNET_RPC_URL: &str = "http://127.0.0.1:8545";

/// The key in a parameter file holding parameters shared by every module
pub const GLOBAL_PARAMETERS_KEY: &str = "$global";

/// The prefix of per-network parameter file names
pub const PARAMETERS_FILE_PREFIX: &str = "parameters";

/// The prefix of per-network address registry file names
pub const ADDRESSES_FILE_PREFIX: &str = "addresses";

/// The prefix of per-network deployment journal file names
pub const JOURNAL_FILE_PREFIX: &str = "journal";

/// The extension of every file the tooling reads or writes
pub const JSON_EXTENSION: &str = "json";

/// The separator between the module and node halves of a node key
pub const NODE_KEY_SEPARATOR: char = '#';
