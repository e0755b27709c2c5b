//! Tests for binding and executing deployment graphs

use alloy_primitives::address;
use serde_json::json;

use crate::{
    errors::{DeployError, LedgerError},
    graph::DeploymentGraph,
    module::{ExternalSource, Module, ModuleBuilder},
    params::ParameterSet,
    registry::AddressRegistry,
    test_helpers::{address_args, LedgerEvent, MockLedger},
    types::{Address, ConstructorArg, ContractId, NetworkId, NodeKey},
};

use super::{bind, Executor, Journal, NodeStatus, PlannedArg, PlannedStep, ResumePolicy};

/// The network the tests deploy to
const NETWORK: NetworkId = NetworkId::ArbitrumSepolia;
/// The Uniswap V3 position manager on Arbitrum Sepolia
const POSITION_MANAGER: Address = address!("6b2937Bde17889EDCf8fbD8dE31C3C2a70Bc4d65");
/// The Uniswap V3 factory on Arbitrum Sepolia
const FACTORY: Address = address!("248AB79Bbb9bC29bB72f7Cd42F17e054Fc40188e");

// -----------
// | Helpers |
// -----------

/// A module deploying a single LP actions contract from two parameters
fn lp_actions_module() -> Module {
    let mut m = ModuleBuilder::new("UniswapV3ActionsModule");
    let factory = m.declare_parameter("factory").unwrap();
    let position_manager = m.declare_parameter("positionManager").unwrap();
    let lp_action = m
        .declare_contract_from_artifact(
            "lpAction",
            "UniswapV3LPActions",
            [position_manager.into(), factory.into()],
        )
        .unwrap();
    m.expose_output("lpAction", &lp_action).unwrap();
    m.build().unwrap()
}

/// Parameters binding the LP actions module
fn lp_actions_params() -> ParameterSet {
    ParameterSet::new(NETWORK)
        .with("UniswapV3ActionsModule", "factory", FACTORY.to_string())
        .with(
            "UniswapV3ActionsModule",
            "positionManager",
            POSITION_MANAGER.to_string(),
        )
}

/// A module deploying `A`, then `B(A)`, then `C(B)`
fn chain_module() -> Module {
    let mut m = ModuleBuilder::new("Chain");
    let a = m.declare_contract("A", []).unwrap();
    let b = m.declare_contract("B", [a.into()]).unwrap();
    let c = m.declare_contract("C", [b.into()]).unwrap();
    m.expose_output("c", &c).unwrap();
    m.build().unwrap()
}

/// The key of `node` in the chain module
fn chain_key(node: &str) -> NodeKey {
    NodeKey::new("Chain", node)
}

// ---------
// | Tests |
// ---------

#[tokio::test]
async fn test_lp_actions_deployment() {
    let graph = DeploymentGraph::compose([lp_actions_module()]).unwrap();
    let registry = AddressRegistry::new();
    let mut executor = Executor::new(MockLedger::new(), NETWORK, &registry);

    let result = executor.execute(&graph, &lp_actions_params()).await.unwrap();

    // One transaction, with the arguments in declaration order
    let requests = executor.ledger().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].artifact, "UniswapV3LPActions");
    assert_eq!(
        requests[0].args,
        vec![
            ConstructorArg::Value(json!(POSITION_MANAGER.to_string())),
            ConstructorArg::Value(json!(FACTORY.to_string())),
        ]
    );

    assert!(result.is_complete());
    assert_eq!(
        result.output("UniswapV3ActionsModule", "lpAction"),
        Some(MockLedger::address_for(1))
    );
    assert_eq!(result.submitted().count(), 1);
}

#[tokio::test]
async fn test_dependency_confirmed_before_consumer_submitted() {
    let mut m1 = ModuleBuilder::new("M1");
    let base = m1.declare_contract("Base", []).unwrap();
    m1.expose_output("base", &base).unwrap();
    let m1 = m1.build().unwrap();

    let mut m2 = ModuleBuilder::new("M2");
    let consumer = m2
        .declare_contract("Consumer", [m1.output("base").unwrap().into()])
        .unwrap();
    m2.expose_output("consumer", &consumer).unwrap();

    let graph = DeploymentGraph::compose([m2.build().unwrap(), m1]).unwrap();
    let registry = AddressRegistry::new();
    let mut executor = Executor::new(MockLedger::new(), NETWORK, &registry);
    let result = executor.execute(&graph, &ParameterSet::new(NETWORK)).await.unwrap();

    let base_key = NodeKey::new("M1", "Base");
    let consumer_key = NodeKey::new("M2", "Consumer");
    let base_addr = MockLedger::address_for(1);
    assert_eq!(
        executor.ledger().events(),
        &[
            LedgerEvent::Submitted(base_key.clone()),
            LedgerEvent::Confirmed(base_key, base_addr),
            LedgerEvent::Submitted(consumer_key.clone()),
            LedgerEvent::Confirmed(consumer_key, MockLedger::address_for(2)),
        ]
    );

    // The consumer received the base contract's confirmed address
    assert_eq!(address_args(&executor.ledger().requests()[1].args), vec![base_addr]);
    assert_eq!(result.output("M1", "base"), Some(base_addr));
}

#[tokio::test]
async fn test_unbound_parameter_submits_nothing() {
    let graph = DeploymentGraph::compose([lp_actions_module()]).unwrap();
    let params =
        ParameterSet::new(NETWORK).with("UniswapV3ActionsModule", "factory", FACTORY.to_string());
    let registry = AddressRegistry::new();
    let mut executor = Executor::new(MockLedger::new(), NETWORK, &registry);

    let err = executor.execute(&graph, &params).await.unwrap_err();
    assert!(matches!(
        err,
        DeployError::UnboundParameter { ref module, ref name }
            if module == "UniswapV3ActionsModule" && name == "positionManager"
    ));
    assert!(!err.leaves_partial_state());
    assert!(executor.ledger().requests().is_empty());
    assert_eq!(executor.ledger().preflights(), 0);
}

#[tokio::test]
async fn test_parameter_default_and_global_values() {
    let mut m = ModuleBuilder::new("Fees");
    let fee = m.declare_parameter_with_default("fee", 30).unwrap();
    let owner = m.declare_parameter("owner").unwrap();
    m.declare_contract("FeeController", [fee.into(), owner.into()])
        .unwrap();
    let graph = DeploymentGraph::compose([m.build().unwrap()]).unwrap();

    let owner_addr = "0x00000000000000000000000000000000000000ff";
    let params = ParameterSet::new(NETWORK).with("$global", "owner", owner_addr);
    let registry = AddressRegistry::new();
    let mut executor = Executor::new(MockLedger::new(), NETWORK, &registry);
    executor.execute(&graph, &params).await.unwrap();

    assert_eq!(
        executor.ledger().requests()[0].args,
        vec![
            ConstructorArg::Value(json!(30)),
            ConstructorArg::Value(json!(owner_addr)),
        ]
    );
}

#[tokio::test]
async fn test_external_nodes_need_no_transaction() {
    let fee_handler = address!("8804615641422382359690192207736354395780");
    let mut registry = AddressRegistry::new();
    registry.record(NETWORK, ContractId::FeeHandler, fee_handler);

    let mut m = ModuleBuilder::new("Plugins");
    let handler = m
        .declare_external("feeHandler", ExternalSource::Registry(ContractId::FeeHandler))
        .unwrap();
    let factory = m
        .declare_external("factory", ExternalSource::Address(FACTORY))
        .unwrap();
    let plugin = m
        .declare_contract("StrategyBuilderPlugin", [handler.into(), factory.into()])
        .unwrap();
    m.expose_output("plugin", &plugin).unwrap();
    let handler = m.node("feeHandler");
    m.expose_output("feeHandler", &handler).unwrap();
    let graph = DeploymentGraph::compose([m.build().unwrap()]).unwrap();

    // External addresses are bound before execution
    let plan = bind(&graph, &ParameterSet::new(NETWORK), &registry, NETWORK).unwrap();
    let contracts = plan.contracts();
    assert_eq!(contracts.len(), 1);
    assert!(contracts[0].args.iter().all(|arg| matches!(arg, PlannedArg::Known(_))));

    let mut executor = Executor::new(MockLedger::new(), NETWORK, &registry);
    let result = executor.execute(&graph, &ParameterSet::new(NETWORK)).await.unwrap();

    assert_eq!(executor.ledger().requests().len(), 1);
    assert_eq!(
        address_args(&executor.ledger().requests()[0].args),
        vec![fee_handler, FACTORY]
    );
    assert_eq!(result.output("Plugins", "feeHandler"), Some(fee_handler));
    let record = result.node(&NodeKey::new("Plugins", "feeHandler")).unwrap();
    assert_eq!(record.status, NodeStatus::Confirmed);
    assert_eq!(record.tx_hash, None);
}

#[tokio::test]
async fn test_missing_registry_entry_submits_nothing() {
    let mut m = ModuleBuilder::new("Plugins");
    let oracle = m
        .declare_external("oracle", ExternalSource::Registry(ContractId::PriceOracle))
        .unwrap();
    m.declare_contract("Consumer", [oracle.into()]).unwrap();
    let graph = DeploymentGraph::compose([m.build().unwrap()]).unwrap();

    let registry = AddressRegistry::new();
    let mut executor = Executor::new(MockLedger::new(), NETWORK, &registry);
    let err = executor
        .execute(&graph, &ParameterSet::new(NETWORK))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DeployError::AddressNotFound { network: NETWORK, contract: ContractId::PriceOracle }
    ));
    assert!(executor.ledger().requests().is_empty());
}

#[tokio::test]
async fn test_network_mismatch() {
    let graph = DeploymentGraph::compose([lp_actions_module()]).unwrap();
    let registry = AddressRegistry::new();
    let mut executor = Executor::new(MockLedger::new(), NetworkId::ArbitrumOne, &registry);

    assert!(matches!(
        executor.execute(&graph, &lp_actions_params()).await,
        Err(DeployError::NetworkMismatch {
            expected: NetworkId::ArbitrumOne,
            found: NETWORK,
        })
    ));
}

#[tokio::test]
async fn test_failure_returns_partial_result_and_resumes() {
    let graph = DeploymentGraph::compose([chain_module()]).unwrap();
    let params = ParameterSet::new(NETWORK);
    let registry = AddressRegistry::new();
    let rejection = LedgerError::Rejected("nonce too low".into());
    let ledger = MockLedger::new().fail_on(chain_key("C"), rejection.clone());
    let mut executor = Executor::new(ledger, NETWORK, &registry);

    let err = executor.execute(&graph, &params).await.unwrap_err();
    assert!(err.leaves_partial_state());
    let DeployError::DeploymentFailed { node, cause, partial } = err else {
        panic!("expected a deployment failure");
    };
    assert_eq!(node, chain_key("C"));
    assert_eq!(cause, rejection);
    assert_eq!(partial.address_of(&chain_key("A")), Some(MockLedger::address_for(1)));
    assert_eq!(partial.address_of(&chain_key("B")), Some(MockLedger::address_for(2)));
    assert_eq!(partial.node(&chain_key("C")).unwrap().status, NodeStatus::Failed);
    assert_eq!(partial.output("Chain", "c"), None);
    assert!(!partial.is_complete());

    // A second run with the same journal only submits the failed node
    let journal = executor.journal().clone();
    assert_eq!(journal.len(), 2);
    let mut executor = Executor::new(MockLedger::new(), NETWORK, &registry).with_journal(journal);
    let result = executor.execute(&graph, &params).await.unwrap();

    assert_eq!(executor.ledger().submitted(), vec![chain_key("C")]);
    assert_eq!(
        address_args(&executor.ledger().requests()[0].args),
        vec![MockLedger::address_for(2)]
    );
    assert!(result.is_complete());
    assert!(result.node(&chain_key("A")).unwrap().reused);
    assert_eq!(result.submitted().collect::<Vec<_>>(), vec![&chain_key("C")]);
}

#[tokio::test]
async fn test_fresh_policy_redeploys_everything() {
    let graph = DeploymentGraph::compose([chain_module()]).unwrap();
    let params = ParameterSet::new(NETWORK);
    let registry = AddressRegistry::new();

    let mut executor = Executor::new(MockLedger::new(), NETWORK, &registry);
    executor.execute(&graph, &params).await.unwrap();
    let journal = executor.journal().clone();

    let mut executor = Executor::new(MockLedger::new(), NETWORK, &registry)
        .with_journal(journal)
        .with_policy(ResumePolicy::Fresh);
    executor.execute(&graph, &params).await.unwrap();

    assert_eq!(
        executor.ledger().submitted(),
        vec![chain_key("A"), chain_key("B"), chain_key("C")]
    );
    assert_eq!(executor.journal().len(), 3);
}

#[tokio::test]
async fn test_journal_mismatch_on_changed_arguments() {
    let graph = DeploymentGraph::compose([lp_actions_module()]).unwrap();
    let registry = AddressRegistry::new();
    let mut executor = Executor::new(MockLedger::new(), NETWORK, &registry);
    executor.execute(&graph, &lp_actions_params()).await.unwrap();
    let journal = executor.journal().clone();

    let params = lp_actions_params().with(
        "UniswapV3ActionsModule",
        "factory",
        "0x1F98431c8aD98523631AE4a59f267346ea31F984",
    );
    let mut executor = Executor::new(MockLedger::new(), NETWORK, &registry).with_journal(journal);

    assert!(matches!(
        executor.execute(&graph, &params).await,
        Err(DeployError::JournalMismatch { node, .. })
            if node == NodeKey::new("UniswapV3ActionsModule", "lpAction")
    ));
    assert!(executor.ledger().requests().is_empty());
}

#[tokio::test]
async fn test_inserted_dependency_is_caught_before_submission() {
    let params = ParameterSet::new(NETWORK);
    let registry = AddressRegistry::new();
    let graph = DeploymentGraph::compose([chain_module()]).unwrap();
    let mut executor = Executor::new(MockLedger::new(), NETWORK, &registry);
    executor.execute(&graph, &params).await.unwrap();
    let journal = executor.journal().clone();

    // `C` now consumes a new node `D` instead of `B`
    let mut m = ModuleBuilder::new("Chain");
    let a = m.declare_contract("A", []).unwrap();
    let b = m.declare_contract("B", [a.into()]).unwrap();
    let d = m.declare_contract("D", [b.into()]).unwrap();
    let c = m.declare_contract("C", [d.into()]).unwrap();
    m.expose_output("c", &c).unwrap();
    let graph = DeploymentGraph::compose([m.build().unwrap()]).unwrap();

    let mut executor = Executor::new(MockLedger::new(), NETWORK, &registry).with_journal(journal);
    let err = executor.execute(&graph, &params).await.unwrap_err();

    assert!(matches!(
        &err,
        DeployError::JournalMismatch { node, .. } if *node == chain_key("C")
    ));
    assert!(!err.leaves_partial_state());
    assert!(executor.ledger().requests().is_empty());
}

#[tokio::test]
async fn test_journal_write_failure_reports_confirmed_node() {
    let dir = tempfile::tempdir().unwrap();
    let not_a_dir = dir.path().join("not_a_dir");
    std::fs::write(&not_a_dir, "").unwrap();
    let journal = Journal::open(Journal::file_path(&not_a_dir, NETWORK)).unwrap();

    let graph = DeploymentGraph::compose([chain_module()]).unwrap();
    let registry = AddressRegistry::new();
    let mut executor = Executor::new(MockLedger::new(), NETWORK, &registry).with_journal(journal);
    let err = executor
        .execute(&graph, &ParameterSet::new(NETWORK))
        .await
        .unwrap_err();

    assert!(err.leaves_partial_state());
    assert_eq!(executor.ledger().submitted(), vec![chain_key("A")]);
    let DeployError::JournalWriteFailed { node, address, source, partial } = err else {
        panic!("expected a journal write failure");
    };
    assert_eq!(node, chain_key("A"));
    assert_eq!(address, MockLedger::address_for(1));
    assert!(matches!(*source, DeployError::Io { .. }));
    assert_eq!(partial.address_of(&chain_key("A")), Some(address));
    assert_eq!(partial.node(&chain_key("B")).unwrap().status, NodeStatus::Declared);
}

#[tokio::test]
async fn test_preflight_failure_submits_nothing() {
    let graph = DeploymentGraph::compose([lp_actions_module()]).unwrap();
    let registry = AddressRegistry::new();
    let ledger = MockLedger::new().with_artifact("UniswapV3LPActions", 3);
    let mut executor = Executor::new(ledger, NETWORK, &registry);

    assert!(matches!(
        executor.execute(&graph, &lp_actions_params()).await,
        Err(DeployError::ArgumentMismatch { .. })
    ));
    assert_eq!(executor.ledger().preflights(), 1);
    assert!(executor.ledger().requests().is_empty());
}

#[test]
fn test_plan_marks_contract_outputs_pending() {
    let graph = DeploymentGraph::compose([chain_module()]).unwrap();
    let plan = bind(
        &graph,
        &ParameterSet::new(NETWORK),
        &AddressRegistry::new(),
        NETWORK,
    )
    .unwrap();

    let nodes: Vec<&NodeKey> = plan.steps.iter().map(PlannedStep::node).collect();
    assert_eq!(nodes, vec![&chain_key("A"), &chain_key("B"), &chain_key("C")]);
    assert_eq!(
        plan.contracts()[2].args,
        vec![PlannedArg::Pending(chain_key("B"))]
    );
}

#[test]
fn test_external_parameter_must_be_an_address() {
    let mut m = ModuleBuilder::new("Router");
    let router = m.declare_parameter("swapRouter").unwrap();
    m.declare_external("router", ExternalSource::Parameter(router))
        .unwrap();
    let graph = DeploymentGraph::compose([m.build().unwrap()]).unwrap();
    let registry = AddressRegistry::new();

    let params = ParameterSet::new(NETWORK).with("Router", "swapRouter", "not an address");
    assert!(matches!(
        bind(&graph, &params, &registry, NETWORK),
        Err(DeployError::ArgumentMismatch { .. })
    ));

    let router_addr = address!("101F443B4d1b059569D643917553c771E1b9663E");
    let params = ParameterSet::new(NETWORK).with("Router", "swapRouter", router_addr.to_string());
    let plan = bind(&graph, &params, &registry, NETWORK).unwrap();
    assert_eq!(
        plan.steps,
        vec![PlannedStep::External {
            node: NodeKey::new("Router", "router"),
            address: router_addr,
        }]
    );
}

