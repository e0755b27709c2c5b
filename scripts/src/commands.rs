//! Implementations of the deploy script commands

use std::time::Duration;

use deploy_core::{
    executor::{bind, Executor, Journal, ResumePolicy},
    graph::DeploymentGraph,
    network::NetworkRegistry,
    params::ParameterStore,
    registry::AddressRegistry,
};
use tracing::{info, warn};

use crate::{
    artifacts::ArtifactStore,
    cli::{CommonArgs, DeployArgs, LookupArgs, PlanArgs, RecordArgs},
    errors::ScriptError,
    ledger::AlloyLedger,
    utils::{print_json, setup_client},
};

/// Deploy a module, print the result, and record the requested outputs
pub async fn deploy(args: DeployArgs, cli_args: CommonArgs) -> Result<(), ScriptError> {
    let CommonArgs {
        network,
        settings,
        parameters_dir,
        deployments_dir,
    } = cli_args;

    let graph = DeploymentGraph::compose(args.module.modules()?)?;
    let params = ParameterStore::new(parameters_dir).load(network)?;
    let mut registry = AddressRegistry::load(&deployments_dir, network)?;

    // Resolve the outputs to record before anything is deployed
    let records: Vec<_> = args
        .records
        .iter()
        .map(|r| r.resolve(&graph).map(|target| (target, r.contract)))
        .collect::<Result<_, _>>()?;

    let connection = NetworkRegistry::new(settings).connection(network)?;
    let provider = setup_client(&connection).await?;
    let artifacts = ArtifactStore::index(&args.artifacts_dir)?;
    let ledger = AlloyLedger::new(
        provider,
        artifacts,
        args.confirmations,
        Duration::from_secs(args.timeout_secs),
    );

    let journal = Journal::open(Journal::file_path(&deployments_dir, network))?;
    let policy = if args.reset {
        ResumePolicy::Fresh
    } else {
        ResumePolicy::Resume
    };

    let outcome = {
        let mut executor = Executor::new(ledger, network, &registry)
            .with_journal(journal)
            .with_policy(policy);
        executor.execute(&graph, &params).await
    };

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            if let Some(partial) = e.partial() {
                warn!(error = %e, "deployment stopped after submitting transactions");
                print_json(partial)?;
            }
            return Err(e.into());
        }
    };

    if !records.is_empty() {
        for ((module, output), contract) in records {
            let address = result
                .output(&module, &output)
                .ok_or_else(|| ScriptError::UnknownOutput(output.clone()))?;
            if let Some(previous) = registry.record(network, contract, address) {
                info!(%contract, %previous, %address, "replacing recorded address");
            }
        }
        registry.save(&deployments_dir, network)?;
    }

    print_json(&result)
}

/// Print the bound execution plan of a module
pub fn plan(args: PlanArgs, cli_args: &CommonArgs) -> Result<(), ScriptError> {
    let graph = DeploymentGraph::compose(args.module.modules()?)?;
    let params = ParameterStore::new(&cli_args.parameters_dir).load(cli_args.network)?;
    let registry = AddressRegistry::load(&cli_args.deployments_dir, cli_args.network)?;

    let plan = bind(&graph, &params, &registry, cli_args.network)?;
    print_json(&plan)
}

/// Print the recorded address of a contract
pub fn lookup(args: LookupArgs, cli_args: &CommonArgs) -> Result<(), ScriptError> {
    let registry = AddressRegistry::load(&cli_args.deployments_dir, cli_args.network)?;
    let address = registry.lookup(cli_args.network, args.contract)?;

    println!("{address:#x}");
    Ok(())
}

/// Record the address of a contract
pub fn record(args: RecordArgs, cli_args: &CommonArgs) -> Result<(), ScriptError> {
    let CommonArgs {
        network,
        deployments_dir,
        ..
    } = cli_args;

    let mut registry = AddressRegistry::load(deployments_dir, *network)?;
    match registry.record(*network, args.contract, args.address) {
        Some(previous) => info!(contract = %args.contract, %previous, "replacing recorded address"),
        None => info!(contract = %args.contract, address = %args.address, "recording address"),
    }

    registry.save(deployments_dir, *network)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;
    use deploy_core::{
        errors::DeployError,
        network::ConnectionSettings,
        registry::AddressRegistry,
        types::{ContractId, NetworkId},
    };

    use crate::{
        cli::{CommonArgs, LookupArgs, PlanArgs, RecordArgs},
        errors::ScriptError,
        modules::DeploymentModule,
    };

    use super::{lookup, plan, record};

    /// Common arguments rooted at `dir`
    fn cli_args(dir: &std::path::Path, network: NetworkId) -> CommonArgs {
        CommonArgs {
            network,
            settings: ConnectionSettings::default(),
            parameters_dir: dir.join("parameters"),
            deployments_dir: dir.join("deployments"),
        }
    }

    #[test]
    fn test_record_then_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let cli_args = cli_args(dir.path(), NetworkId::Devnet);
        let router = address!("101F443B4d1b059569D643917553c771E1b9663E");

        assert!(matches!(
            lookup(LookupArgs { contract: ContractId::UniswapV3SwapRouter }, &cli_args),
            Err(ScriptError::Deploy(DeployError::AddressNotFound { .. }))
        ));

        record(
            RecordArgs {
                contract: ContractId::UniswapV3SwapRouter,
                address: router,
            },
            &cli_args,
        )
        .unwrap();

        let registry = AddressRegistry::load(&cli_args.deployments_dir, NetworkId::Devnet).unwrap();
        assert_eq!(
            registry.lookup(NetworkId::Devnet, ContractId::UniswapV3SwapRouter).unwrap(),
            router
        );
        lookup(LookupArgs { contract: ContractId::UniswapV3SwapRouter }, &cli_args).unwrap();
    }

    #[test]
    fn test_plan_needs_parameter_file() {
        let dir = tempfile::tempdir().unwrap();
        let args = PlanArgs {
            module: DeploymentModule::UniswapV3Actions,
        };

        assert!(matches!(
            plan(args, &cli_args(dir.path(), NetworkId::ArbitrumOne)),
            Err(ScriptError::Deploy(DeployError::ParameterFileMissing(_)))
        ));
    }

    #[test]
    fn test_plan_shipped_parameters() {
        let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("..");
        let args = PlanArgs {
            module: DeploymentModule::UniswapV3Actions,
        };

        plan(args, &cli_args(&root, NetworkId::ArbitrumSepolia)).unwrap();
    }
}
