//! The deployment modules of the protocol's periphery contracts

use clap::ValueEnum;
use deploy_core::{errors::DeployError, module::Module, module::ModuleBuilder};

use crate::constants::{
    FACTORY_PARAM, LP_ACTION_NODE, POSITION_MANAGER_PARAM, UNISWAP_V3_ACTIONS_MODULE,
    UNISWAP_V3_LP_ACTIONS_ARTIFACT,
};

/// The deployments the scripts can run
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeploymentModule {
    /// The Uniswap V3 liquidity-provision actions contract
    #[value(name = "UniswapV3ActionsModule", alias = "uniswap-v3-actions")]
    UniswapV3Actions,
}

impl DeploymentModule {
    /// The modules to compose for this deployment
    pub fn modules(&self) -> Result<Vec<Module>, DeployError> {
        match self {
            DeploymentModule::UniswapV3Actions => Ok(vec![uniswap_v3_actions_module()?]),
        }
    }
}

/// Deploys `UniswapV3LPActions(positionManager, factory)` against an existing
/// Uniswap V3 deployment and exposes it as `lpAction`
pub fn uniswap_v3_actions_module() -> Result<Module, DeployError> {
    let mut m = ModuleBuilder::new(UNISWAP_V3_ACTIONS_MODULE);
    let factory = m.declare_parameter(FACTORY_PARAM)?;
    let position_manager = m.declare_parameter(POSITION_MANAGER_PARAM)?;

    let lp_action = m.declare_contract_from_artifact(
        LP_ACTION_NODE,
        UNISWAP_V3_LP_ACTIONS_ARTIFACT,
        [position_manager.into(), factory.into()],
    )?;
    m.expose_output(LP_ACTION_NODE, &lp_action)?;

    m.build()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use deploy_core::{
        executor::Executor, graph::DeploymentGraph, params::ParameterStore,
        registry::AddressRegistry, test_helpers::MockLedger, types::ConstructorArg,
        types::NetworkId,
    };
    use serde_json::json;

    use super::DeploymentModule;

    /// The parameter files shipped with the scripts
    fn shipped_parameters() -> ParameterStore {
        ParameterStore::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("../parameters"))
    }

    #[tokio::test]
    async fn test_uniswap_v3_actions_on_arbitrum_sepolia() -> eyre::Result<()> {
        let network = NetworkId::ArbitrumSepolia;
        let params = shipped_parameters().load(network)?;
        let graph = DeploymentGraph::compose(DeploymentModule::UniswapV3Actions.modules()?)?;

        let registry = AddressRegistry::new();
        let ledger = MockLedger::new().with_artifact("UniswapV3LPActions", 2);
        let mut executor = Executor::new(ledger, network, &registry);
        let result = executor.execute(&graph, &params).await?;

        let requests = executor.ledger().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].args,
            vec![
                ConstructorArg::Value(json!("0x6b2937Bde17889EDCf8fbD8dE31C3C2a70Bc4d65")),
                ConstructorArg::Value(json!("0x248AB79Bbb9bC29bB72f7Cd42F17e054Fc40188e")),
            ]
        );
        assert_eq!(
            result.output("UniswapV3ActionsModule", "lpAction"),
            Some(MockLedger::address_for(1))
        );
        Ok(())
    }
}
