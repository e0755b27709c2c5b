//! The deployment executor: walks a graph in dependency order against a ledger
//!
//! A run happens in two phases. Binding resolves every parameter, literal, and
//! external address into an [`ExecutionPlan`] and lets the ledger check it;
//! nothing is submitted until binding succeeds. Execution then processes the
//! plan one node at a time, waiting for each creation to be confirmed before
//! the nodes that consume its address are resolved.

mod journal;
mod ledger;
mod result;

use serde::Serialize;
use tracing::{error, info, instrument};

pub use journal::{Journal, JournalEntry};
pub use ledger::{CreationRequest, Deployment, Ledger, PlannedArg, PlannedContract};
pub use result::{DeploymentResult, NodeRecord, NodeStatus};

use crate::{
    errors::DeployError,
    graph::DeploymentGraph,
    module::{Arg, ExternalSource, Node, NodeKind, ParameterHandle},
    params::ParameterSet,
    registry::AddressRegistry,
    types::{Address, ConstructorArg, NetworkId, NodeKey},
};

/// Whether a run reuses the creations journaled by earlier runs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResumePolicy {
    /// Skip every node the journal already holds a confirmed creation for
    #[default]
    Resume,
    /// Discard the journal and deploy every node again
    Fresh,
}

/// One bound step of a run
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannedStep {
    /// An external node, resolved without a transaction
    External {
        /// The node
        node: NodeKey,
        /// Its address
        address: Address,
    },
    /// A contract creation
    Contract(PlannedContract),
}

impl PlannedStep {
    /// The node this step processes
    pub fn node(&self) -> &NodeKey {
        match self {
            PlannedStep::External { node, .. } => node,
            PlannedStep::Contract(contract) => &contract.node,
        }
    }
}

/// A graph with every input bound, in execution order
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExecutionPlan {
    /// The network the plan is bound to
    pub network: NetworkId,
    /// The steps, in topological order
    pub steps: Vec<PlannedStep>,
}

impl ExecutionPlan {
    /// The contract creations of the plan
    pub fn contracts(&self) -> Vec<PlannedContract> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                PlannedStep::Contract(contract) => Some(contract.clone()),
                PlannedStep::External { .. } => None,
            })
            .collect()
    }
}

/// Bind every input of `graph` for a run on `network`.
///
/// Has no side effects; fails with [`DeployError::UnboundParameter`] for the
/// first parameter in execution order that has neither a value nor a default.
pub fn bind(
    graph: &DeploymentGraph,
    params: &ParameterSet,
    registry: &AddressRegistry,
    network: NetworkId,
) -> Result<ExecutionPlan, DeployError> {
    if params.network() != network {
        return Err(DeployError::NetworkMismatch {
            expected: network,
            found: params.network(),
        });
    }

    let binder = Binder {
        graph,
        params,
        registry,
        network,
    };
    let mut steps: Vec<PlannedStep> = Vec::with_capacity(graph.len());
    for node in graph.nodes() {
        let step = binder.bind_node(node, &steps)?;
        steps.push(step);
    }

    Ok(ExecutionPlan { network, steps })
}

/// Resolves the inputs of individual nodes
struct Binder<'a> {
    /// The graph being bound
    graph: &'a DeploymentGraph,
    /// The parameter values
    params: &'a ParameterSet,
    /// The address registry, for external nodes
    registry: &'a AddressRegistry,
    /// The network of the run
    network: NetworkId,
}

impl Binder<'_> {
    /// Bind `node`, given the steps of every node ordered before it
    fn bind_node(&self, node: &Node, bound: &[PlannedStep]) -> Result<PlannedStep, DeployError> {
        match &node.kind {
            NodeKind::External(source) => Ok(PlannedStep::External {
                node: node.key.clone(),
                address: self.external_address(node, source)?,
            }),
            NodeKind::Contract { artifact, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.bind_arg(arg, bound))
                    .collect::<Result<_, _>>()?;

                Ok(PlannedStep::Contract(PlannedContract {
                    node: node.key.clone(),
                    artifact: artifact.clone(),
                    args,
                }))
            }
        }
    }

    /// Bind a single constructor argument
    fn bind_arg(&self, arg: &Arg, bound: &[PlannedStep]) -> Result<PlannedArg, DeployError> {
        match arg {
            Arg::Literal(value) => Ok(PlannedArg::Known(ConstructorArg::Value(value.clone()))),
            Arg::Parameter(handle) => Ok(PlannedArg::Known(ConstructorArg::Value(
                self.parameter(handle)?,
            ))),
            Arg::Output(handle) => {
                // External addresses are known up front; contract addresses
                // only once the dependency is confirmed
                let dep = handle.key();
                let known = bound.iter().find_map(|step| match step {
                    PlannedStep::External { node, address } if node == dep => Some(*address),
                    _ => None,
                });

                Ok(match known {
                    Some(address) => PlannedArg::Known(ConstructorArg::Address(address)),
                    None => PlannedArg::Pending(dep.clone()),
                })
            }
        }
    }

    /// Resolve the address of an external node
    fn external_address(
        &self,
        node: &Node,
        source: &ExternalSource,
    ) -> Result<Address, DeployError> {
        match source {
            ExternalSource::Address(address) => Ok(*address),
            ExternalSource::Registry(contract) => self.registry.lookup(self.network, *contract),
            ExternalSource::Parameter(handle) => {
                let value = self.parameter(handle)?;
                value
                    .as_str()
                    .and_then(|s| s.parse::<Address>().ok())
                    .ok_or_else(|| DeployError::ArgumentMismatch {
                        node: node.key.clone(),
                        reason: format!("parameter `{}` is not an address: {value}", handle.name()),
                    })
            }
        }
    }

    /// Resolve a parameter from the parameter set or its declared default
    fn parameter(&self, handle: &ParameterHandle) -> Result<serde_json::Value, DeployError> {
        if let Some(value) = self.params.get(handle.module(), handle.name()) {
            return Ok(value.clone());
        }

        self.graph
            .module(handle.module())
            .and_then(|module| module.parameter(handle.name()))
            .and_then(|decl| decl.default.clone())
            .ok_or_else(|| DeployError::UnboundParameter {
                module: handle.module().to_string(),
                name: handle.name().to_string(),
            })
    }
}

/// Executes deployment graphs against a ledger, one node at a time
pub struct Executor<'a, L> {
    /// The ledger deployed to
    ledger: L,
    /// The network the ledger is connected to
    network: NetworkId,
    /// The address registry, for external nodes
    registry: &'a AddressRegistry,
    /// The creations confirmed by earlier runs
    journal: Journal,
    /// Whether journaled creations are reused
    policy: ResumePolicy,
}

impl<'a, L: Ledger> Executor<'a, L> {
    /// Create an executor with an in-memory journal and the default policy
    pub fn new(ledger: L, network: NetworkId, registry: &'a AddressRegistry) -> Self {
        Self {
            ledger,
            network,
            registry,
            journal: Journal::in_memory(),
            policy: ResumePolicy::default(),
        }
    }

    /// Use `journal` to skip and record creations
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    /// Set the resume policy
    pub fn with_policy(mut self, policy: ResumePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The ledger deployed to
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// The journal of confirmed creations
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Bind `graph` for this executor's network without executing it
    pub fn plan(
        &self,
        graph: &DeploymentGraph,
        params: &ParameterSet,
    ) -> Result<ExecutionPlan, DeployError> {
        bind(graph, params, self.registry, self.network)
    }

    /// Deploy every node of `graph`.
    ///
    /// Journaled creations are checked against the plan before anything is
    /// submitted. On a ledger failure the run stops at the failing node and the
    /// error carries the partial result; nodes confirmed before it stay
    /// journaled.
    #[instrument(skip_all, fields(network = %self.network))]
    pub async fn execute(
        &mut self,
        graph: &DeploymentGraph,
        params: &ParameterSet,
    ) -> Result<DeploymentResult, DeployError> {
        let plan = self.plan(graph, params)?;
        self.ledger.preflight(&plan.contracts())?;
        match self.policy {
            ResumePolicy::Fresh => self.journal.clear()?,
            ResumePolicy::Resume => self.check_journal(&plan)?,
        }

        info!(nodes = plan.steps.len(), "executing deployment");
        let mut result = DeploymentResult::new(self.network, graph);
        for step in &plan.steps {
            match step {
                PlannedStep::External { node, address } => {
                    info!(%node, %address, "resolved external contract");
                    result.confirm(node, *address, None /* tx_hash */, false /* reused */);
                }
                PlannedStep::Contract(contract) => {
                    self.execute_contract(graph, contract, &mut result).await?;
                }
            }
        }

        result.resolve_outputs(graph);
        info!(submitted = result.submitted().count(), "deployment complete");
        Ok(result)
    }

    /// Check every journaled creation against the contract it would stand in for.
    ///
    /// A journaled node is reusable only if its artifact and known arguments
    /// are unchanged, and every dependency it consumes is itself journaled at
    /// the address it was deployed with. Contracts are checked in plan order,
    /// so each dependency is checked before its consumers.
    fn check_journal(&self, plan: &ExecutionPlan) -> Result<(), DeployError> {
        let mismatch = |node: &NodeKey, reason: String| DeployError::JournalMismatch {
            node: node.clone(),
            reason,
        };

        for contract in plan.contracts() {
            let node = &contract.node;
            let Some(entry) = self.journal.get(node) else {
                continue;
            };

            if entry.artifact != contract.artifact {
                let reason = format!(
                    "journaled artifact {} differs from {}",
                    entry.artifact, contract.artifact
                );
                return Err(mismatch(node, reason));
            }
            if entry.args.len() != contract.args.len() {
                return Err(mismatch(node, "constructor arguments changed".to_string()));
            }

            for (planned, journaled) in contract.args.iter().zip(&entry.args) {
                let unchanged = match planned {
                    PlannedArg::Known(arg) => arg == journaled,
                    PlannedArg::Pending(dep) => {
                        let dep_entry = self.journal.get(dep).ok_or_else(|| {
                            mismatch(node, format!("dependency {dep} is not journaled"))
                        })?;
                        *journaled == ConstructorArg::Address(dep_entry.address)
                    }
                };
                if !unchanged {
                    return Err(mismatch(node, "constructor arguments changed".to_string()));
                }
            }
        }

        Ok(())
    }

    /// Resolve, submit, and confirm a single contract creation
    async fn execute_contract(
        &mut self,
        graph: &DeploymentGraph,
        contract: &PlannedContract,
        result: &mut DeploymentResult,
    ) -> Result<(), DeployError> {
        let node = &contract.node;
        result.set_status(node, NodeStatus::Resolving);
        let args = resolve_args(contract, result)?;

        if let Some(entry) = self.journal.get(node) {
            info!(%node, address = %entry.address, "reusing journaled deployment");
            result.confirm(node, entry.address, Some(entry.tx_hash), true /* reused */);
            return Ok(());
        }

        let request = CreationRequest {
            node: node.clone(),
            artifact: contract.artifact.clone(),
            args,
        };
        result.set_status(node, NodeStatus::Submitted);
        info!(%node, artifact = %request.artifact, "submitting contract creation");

        let deployment = match self.ledger.deploy(&request).await {
            Ok(deployment) => deployment,
            Err(cause) => {
                error!(%node, %cause, "contract creation failed");
                result.set_status(node, NodeStatus::Failed);
                result.resolve_outputs(graph);
                return Err(DeployError::DeploymentFailed {
                    node: node.clone(),
                    cause,
                    partial: Box::new(result.clone()),
                });
            }
        };

        info!(%node, address = %deployment.address, tx = %deployment.tx_hash, "contract deployed");
        result.confirm(node, deployment.address, Some(deployment.tx_hash), false);
        let entry = JournalEntry {
            artifact: request.artifact,
            args: request.args,
            address: deployment.address,
            tx_hash: deployment.tx_hash,
        };
        if let Err(e) = self.journal.record(node.clone(), entry) {
            error!(%node, address = %deployment.address, error = %e, "failed to journal deployment");
            result.resolve_outputs(graph);
            return Err(DeployError::JournalWriteFailed {
                node: node.clone(),
                address: deployment.address,
                source: Box::new(e),
                partial: Box::new(result.clone()),
            });
        }

        Ok(())
    }
}

/// Substitute the confirmed addresses of dependencies into a planned creation
fn resolve_args(
    contract: &PlannedContract,
    result: &DeploymentResult,
) -> Result<Vec<ConstructorArg>, DeployError> {
    contract
        .args
        .iter()
        .map(|arg| match arg {
            PlannedArg::Known(arg) => Ok(arg.clone()),
            PlannedArg::Pending(dep) => result
                .address_of(dep)
                .map(ConstructorArg::Address)
                .ok_or_else(|| DeployError::UnknownNode(dep.clone())),
        })
        .collect()
}

#[cfg(test)]
mod tests;
