//! Constants used in the deploy scripts

/// The number of confirmations to wait for a contract creation transaction
pub const NUM_DEPLOY_CONFIRMATIONS: u64 = 1;

/// The number of seconds to wait for a creation transaction to confirm
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 120;

/// The default directory holding per-network parameter files
pub const DEFAULT_PARAMETERS_DIR: &str = "parameters";

/// The default directory holding address registries and run journals
pub const DEFAULT_DEPLOYMENTS_DIR: &str = "deployments";

/// The default directory searched for compiled contract artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "out";

/// The directory name under which Hardhat and Foundry place compiler
/// metadata, skipped when indexing artifacts
pub const BUILD_INFO_DIR: &str = "build-info";

/// The suffix of Hardhat debug files, skipped when indexing artifacts
pub const DEBUG_ARTIFACT_SUFFIX: &str = ".dbg.json";

/// The extension of contract artifacts
pub const ARTIFACT_EXTENSION: &str = "json";

/// The environment variable configuring the log filter
pub const LOG_FILTER_ENV_VAR: &str = "RUST_LOG";

/// The log filter used when none is configured
pub const DEFAULT_LOG_FILTER: &str = "info";

// -----------------------------
// | Uniswap V3 actions module |
// -----------------------------

/// The ID of the module deploying the Uniswap V3 LP actions contract
pub const UNISWAP_V3_ACTIONS_MODULE: &str = "UniswapV3ActionsModule";

/// The artifact name of the Uniswap V3 LP actions contract
pub const UNISWAP_V3_LP_ACTIONS_ARTIFACT: &str = "UniswapV3LPActions";

/// The node, and output, name of the Uniswap V3 LP actions contract
pub const LP_ACTION_NODE: &str = "lpAction";

/// The parameter holding the Uniswap V3 factory address
pub const FACTORY_PARAM: &str = "factory";

/// The parameter holding the Uniswap V3 position manager address
pub const POSITION_MANAGER_PARAM: &str = "positionManager";
