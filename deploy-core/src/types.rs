//! Type definitions shared by the registries, modules, and executor

use std::{
    fmt::{self, Display, Formatter},
    path::{Path, PathBuf},
    str::FromStr,
};

pub use alloy_primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::{
    constants::{JSON_EXTENSION, NODE_KEY_SEPARATOR},
    errors::DeployError,
};

// ------------
// | Networks |
// ------------

/// The networks contracts can be deployed to
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NetworkId {
    /// The Arbitrum Sepolia testnet
    ArbitrumSepolia,
    /// The Arbitrum One mainnet
    ArbitrumOne,
    /// A local development node
    Devnet,
}

impl NetworkId {
    /// Every supported network
    pub const ALL: [NetworkId; 3] = [
        NetworkId::ArbitrumSepolia,
        NetworkId::ArbitrumOne,
        NetworkId::Devnet,
    ];

    /// The canonical name of the network, used in file names
    pub fn name(&self) -> &'static str {
        match self {
            NetworkId::ArbitrumSepolia => "arbitrumSepolia",
            NetworkId::ArbitrumOne => "arbitrumOne",
            NetworkId::Devnet => "devnet",
        }
    }

    /// The chain ID the network's nodes report
    pub fn chain_id(&self) -> u64 {
        match self {
            NetworkId::ArbitrumSepolia => 421614,
            NetworkId::ArbitrumOne => 42161,
            NetworkId::Devnet => 31337,
        }
    }

    /// The slug substituted into the hosted endpoint template, if the network
    /// is reached through a hosted endpoint at all
    pub fn endpoint_slug(&self) -> Option<&'static str> {
        match self {
            NetworkId::ArbitrumSepolia => Some("arb-sepolia"),
            NetworkId::ArbitrumOne => Some("arb-mainnet"),
            NetworkId::Devnet => None,
        }
    }

    /// The path of this network's `<prefix>-<network>.json` file in `dir`
    pub fn file_path(&self, dir: &Path, prefix: &str) -> PathBuf {
        dir.join(format!("{prefix}-{}.{JSON_EXTENSION}", self.name()))
    }
}

impl Display for NetworkId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for NetworkId {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "arbitrumSepolia" | "arbitrum-sepolia" => Ok(NetworkId::ArbitrumSepolia),
            "arbitrumOne" | "arbitrum-one" => Ok(NetworkId::ArbitrumOne),
            "devnet" => Ok(NetworkId::Devnet),
            _ => Err(DeployError::UnknownNetwork(s.to_string())),
        }
    }
}

// -------------
// | Contracts |
// -------------

/// The logical contract roles whose addresses are tracked per network
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractId {
    /// The fee handler plugin
    FeeHandler,
    /// The fee controller plugin
    FeeController,
    /// The price oracle plugin
    PriceOracle,
    /// The strategy builder plugin
    StrategyBuilderPlugin,
    /// The Uniswap V3 swap router
    UniswapV3SwapRouter,
    /// The Uniswap V3 nonfungible position manager
    UniswapV3PositionManager,
    /// The Uniswap V3 pool factory
    UniswapV3Factory,
    /// The Uniswap V3 liquidity-provision actions contract
    UniswapV3LpActions,
}

impl ContractId {
    /// Every tracked contract role
    pub const ALL: [ContractId; 8] = [
        ContractId::FeeHandler,
        ContractId::FeeController,
        ContractId::PriceOracle,
        ContractId::StrategyBuilderPlugin,
        ContractId::UniswapV3SwapRouter,
        ContractId::UniswapV3PositionManager,
        ContractId::UniswapV3Factory,
        ContractId::UniswapV3LpActions,
    ];

    /// The canonical name of the contract role, used as its registry key
    pub fn name(&self) -> &'static str {
        match self {
            ContractId::FeeHandler => "fee_handler",
            ContractId::FeeController => "fee_controller",
            ContractId::PriceOracle => "price_oracle",
            ContractId::StrategyBuilderPlugin => "strategy_builder_plugin",
            ContractId::UniswapV3SwapRouter => "uniswap_v3_swap_router",
            ContractId::UniswapV3PositionManager => "uniswap_v3_position_manager",
            ContractId::UniswapV3Factory => "uniswap_v3_factory",
            ContractId::UniswapV3LpActions => "uniswap_v3_lp_actions",
        }
    }
}

impl Display for ContractId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ContractId {
    type Err = DeployError;

    /// Accepts both the canonical `snake_case` name and its `kebab-case` form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace('-', "_");
        ContractId::ALL
            .into_iter()
            .find(|id| id.name() == normalized)
            .ok_or_else(|| DeployError::UnknownContract(s.to_string()))
    }
}

// ---------
// | Nodes |
// ---------

/// The fully-qualified identity of a node in a deployment graph,
/// rendered as `<module>#<node>`
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct NodeKey {
    /// The module declaring the node
    pub module: String,
    /// The node's name within its module
    pub node: String,
}

impl NodeKey {
    /// Construct a node key
    pub fn new(module: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            node: node.into(),
        }
    }
}

impl Display for NodeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{NODE_KEY_SEPARATOR}{}", self.module, self.node)
    }
}

impl FromStr for NodeKey {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(NODE_KEY_SEPARATOR) {
            Some((module, node)) if !module.is_empty() && !node.is_empty() => {
                Ok(NodeKey::new(module, node))
            }
            _ => Err(DeployError::InvalidNodeKey(s.to_string())),
        }
    }
}

/// A fully resolved constructor argument, ready to be encoded for submission
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructorArg {
    /// The address of a deployed or external contract
    Address(Address),
    /// An opaque literal, either declared inline or read from a parameter file
    Value(Value),
}

impl Display for ConstructorArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConstructorArg::Address(address) => write!(f, "{address:#x}"),
            ConstructorArg::Value(value) => write!(f, "{value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::errors::DeployError;

    use super::{ContractId, NetworkId, NodeKey};

    #[test]
    fn test_network_names() {
        for network in NetworkId::ALL {
            assert_eq!(NetworkId::from_str(network.name()).unwrap(), network);
        }
        assert_eq!(
            NetworkId::from_str("arbitrum-sepolia").unwrap(),
            NetworkId::ArbitrumSepolia
        );
        assert!(matches!(
            NetworkId::from_str("goerli"),
            Err(DeployError::UnknownNetwork(_))
        ));
    }

    #[test]
    fn test_contract_ids_are_closed() {
        assert_eq!(
            ContractId::from_str("fee-handler").unwrap(),
            ContractId::FeeHandler
        );
        assert_eq!(
            ContractId::from_str("uniswap_v3_lp_actions").unwrap(),
            ContractId::UniswapV3LpActions
        );
        assert!(matches!(
            ContractId::from_str("swap_router_v4"),
            Err(DeployError::UnknownContract(name)) if name == "swap_router_v4"
        ));
    }

    #[test]
    fn test_contract_id_serde_matches_name() {
        for id in ContractId::ALL {
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id.name()));
        }
    }

    #[test]
    fn test_node_key_parsing() {
        let key = NodeKey::from_str("UniswapV3ActionsModule#lpAction").unwrap();
        assert_eq!(key, NodeKey::new("UniswapV3ActionsModule", "lpAction"));
        assert_eq!(key.to_string(), "UniswapV3ActionsModule#lpAction");

        assert!(NodeKey::from_str("lpAction").is_err());
        assert!(NodeKey::from_str("#lpAction").is_err());
    }
}
