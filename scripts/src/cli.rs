//! Definitions of CLI arguments and commands for deploy scripts

use std::{path::PathBuf, str::FromStr};

use alloy::primitives::Address;
use clap::{Args, Parser, Subcommand};
use deploy_core::{
    graph::DeploymentGraph,
    network::ConnectionSettings,
    types::{ContractId, NetworkId, NodeKey},
};
use itertools::Itertools;

use crate::{
    commands::{deploy, lookup, plan, record},
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_CONFIRMATION_TIMEOUT_SECS, DEFAULT_DEPLOYMENTS_DIR,
        DEFAULT_PARAMETERS_DIR, NUM_DEPLOY_CONFIRMATIONS,
    },
    errors::ScriptError,
    modules::DeploymentModule,
};

/// Deploy and track the protocol's periphery contracts
#[derive(Parser)]
pub struct Cli {
    /// The network to operate on
    #[arg(short, long, env = "NETWORK", default_value = "arbitrumSepolia")]
    pub network: NetworkId,

    /// API key of the hosted RPC provider
    #[arg(long, env = "ALCHEMY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Private key of the deployer
    #[arg(short, long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub priv_key: Option<String>,

    /// RPC URL used in place of the hosted endpoint
    #[arg(short, long, env = "RPC_URL")]
    pub rpc_url: Option<String>,

    /// Directory holding the per-network parameter files
    #[arg(long, default_value = DEFAULT_PARAMETERS_DIR)]
    pub parameters_dir: PathBuf,

    /// Directory holding the address registries and run journals
    #[arg(long, default_value = DEFAULT_DEPLOYMENTS_DIR)]
    pub deployments_dir: PathBuf,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// The connection settings given on the command line or in the environment
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            api_key: self.api_key.clone(),
            private_key: self.priv_key.clone(),
            rpc_url: self.rpc_url.clone(),
        }
    }
}

/// The available commands
#[derive(Subcommand)]
pub enum Command {
    /// Deploy a module and print the resulting addresses
    Deploy(DeployArgs),
    /// Print the bound execution plan of a module without connecting to a network
    Plan(PlanArgs),
    /// Print the recorded address of a contract
    Lookup(LookupArgs),
    /// Record the address of a contract
    Record(RecordArgs),
}

impl Command {
    /// Run the command
    pub async fn run(self, cli_args: CommonArgs) -> Result<(), ScriptError> {
        match self {
            Command::Deploy(args) => deploy(args, cli_args).await,
            Command::Plan(args) => plan(args, &cli_args),
            Command::Lookup(args) => lookup(args, &cli_args),
            Command::Record(args) => record(args, &cli_args),
        }
    }
}

/// The global options every command receives
#[derive(Clone, Debug)]
pub struct CommonArgs {
    /// The network to operate on
    pub network: NetworkId,
    /// How to connect to the network
    pub settings: ConnectionSettings,
    /// Directory holding the per-network parameter files
    pub parameters_dir: PathBuf,
    /// Directory holding the address registries and run journals
    pub deployments_dir: PathBuf,
}

/// Deploy a module.
///
/// Contracts confirmed by an earlier, interrupted run on the same network are
/// reused unless `--reset` is given.
#[derive(Args)]
pub struct DeployArgs {
    /// The module to deploy
    #[arg(short, long)]
    pub module: DeploymentModule,

    /// Discard the run journal and deploy every contract again
    #[arg(long)]
    pub reset: bool,

    /// Record a module output in the address registry once deployed,
    /// as `[<module>#]<output>=<contract>`
    #[arg(long = "record", value_name = "OUTPUT=CONTRACT")]
    pub records: Vec<OutputRecord>,

    /// Directory searched for compiled contract artifacts
    #[arg(long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: PathBuf,

    /// Number of confirmations to wait for each creation
    #[arg(long, default_value_t = NUM_DEPLOY_CONFIRMATIONS)]
    pub confirmations: u64,

    /// Seconds to wait for each creation to confirm
    #[arg(long, default_value_t = DEFAULT_CONFIRMATION_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

/// Print the execution plan of a module
#[derive(Args)]
pub struct PlanArgs {
    /// The module to plan
    #[arg(short, long)]
    pub module: DeploymentModule,
}

/// Look up a contract in the address registry
#[derive(Args)]
pub struct LookupArgs {
    /// The contract to look up
    #[arg(short, long)]
    pub contract: ContractId,
}

/// Record a contract in the address registry
#[derive(Args)]
pub struct RecordArgs {
    /// The contract to record
    #[arg(short, long)]
    pub contract: ContractId,

    /// The contract's address
    #[arg(short, long)]
    pub address: Address,
}

/// A request to record a module output under a registry contract ID
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputRecord {
    /// The module exposing the output, if qualified
    pub module: Option<String>,
    /// The output name
    pub output: String,
    /// The registry entry to record it as
    pub contract: ContractId,
}

impl OutputRecord {
    /// Find the module exposing this output in `graph`, returning its
    /// `(module, output)` pair
    pub fn resolve(&self, graph: &DeploymentGraph) -> Result<(String, String), ScriptError> {
        let exposing = graph
            .modules()
            .iter()
            .filter(|m| self.module.as_deref().map_or(true, |id| m.id() == id))
            .filter(|m| m.outputs().contains_key(&self.output))
            .map(|m| m.id().to_string())
            .collect_vec();

        match exposing.as_slice() {
            [module] => Ok((module.clone(), self.output.clone())),
            [] => Err(ScriptError::UnknownOutput(self.output.clone())),
            _ => Err(ScriptError::AmbiguousOutput(self.output.clone())),
        }
    }
}

impl FromStr for OutputRecord {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (output, contract) = s
            .split_once('=')
            .ok_or_else(|| format!("expected <output>=<contract>, got {s}"))?;
        let contract = ContractId::from_str(contract).map_err(|e| e.to_string())?;

        let (module, output) = match NodeKey::from_str(output) {
            Ok(key) => (Some(key.module), key.node),
            Err(_) => (None, output.to_string()),
        };
        if output.is_empty() {
            return Err(format!("empty output name in {s}"));
        }

        Ok(Self {
            module,
            output,
            contract,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use clap::{CommandFactory, Parser};
    use deploy_core::{graph::DeploymentGraph, types::ContractId};

    use crate::{errors::ScriptError, modules::uniswap_v3_actions_module};

    use super::{Cli, Command, OutputRecord};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_deploy() {
        let cli = Cli::try_parse_from([
            "scripts",
            "--network",
            "devnet",
            "deploy",
            "--module",
            "UniswapV3ActionsModule",
            "--reset",
            "--record",
            "lpAction=uniswap_v3_lp_actions",
        ])
        .unwrap();

        let Command::Deploy(args) = cli.command else {
            panic!("expected the deploy command");
        };
        assert!(args.reset);
        assert_eq!(args.confirmations, 1);
        assert_eq!(args.records[0].contract, ContractId::UniswapV3LpActions);
    }

    #[test]
    fn test_output_records() {
        let graph = DeploymentGraph::compose([uniswap_v3_actions_module().unwrap()]).unwrap();

        let bare = OutputRecord::from_str("lpAction=uniswap-v3-lp-actions").unwrap();
        assert_eq!(bare.module, None);
        assert_eq!(
            bare.resolve(&graph).unwrap(),
            ("UniswapV3ActionsModule".to_string(), "lpAction".to_string())
        );

        let qualified =
            OutputRecord::from_str("UniswapV3ActionsModule#lpAction=uniswap_v3_lp_actions")
                .unwrap();
        assert_eq!(qualified.module.as_deref(), Some("UniswapV3ActionsModule"));
        assert!(qualified.resolve(&graph).is_ok());

        let unknown = OutputRecord::from_str("router=uniswap_v3_swap_router").unwrap();
        assert!(matches!(
            unknown.resolve(&graph),
            Err(ScriptError::UnknownOutput(_))
        ));

        assert!(OutputRecord::from_str("lpAction").is_err());
        assert!(OutputRecord::from_str("lpAction=darkpool").is_err());
    }
}
