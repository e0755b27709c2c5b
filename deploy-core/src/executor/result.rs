//! The outcome of an execution run

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    graph::DeploymentGraph,
    types::{Address, NetworkId, NodeKey, TxHash},
};

/// The lifecycle of a node within a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Not yet reached
    Declared,
    /// Its constructor arguments are being resolved
    Resolving,
    /// Its creation transaction has been submitted
    Submitted,
    /// Its address is known
    Confirmed,
    /// Its creation transaction failed
    Failed,
}

/// The state of one node at the end of a run
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NodeRecord {
    /// How far the node got
    pub status: NodeStatus,
    /// The node's address, once confirmed
    pub address: Option<Address>,
    /// The creation transaction, for contract nodes
    pub tx_hash: Option<TxHash>,
    /// Whether the address was taken from the journal rather than deployed
    pub reused: bool,
}

impl NodeRecord {
    /// A record for a node that has not been reached
    fn declared() -> Self {
        Self {
            status: NodeStatus::Declared,
            address: None,
            tx_hash: None,
            reused: false,
        }
    }
}

/// The addresses produced by a run
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeploymentResult {
    /// The network deployed to
    pub network: NetworkId,
    /// The exposed outputs, keyed by module ID then output name
    outputs: BTreeMap<String, BTreeMap<String, Address>>,
    /// The state of every node in the graph
    nodes: BTreeMap<NodeKey, NodeRecord>,
}

impl DeploymentResult {
    /// A result in which every node of `graph` is still declared
    pub(crate) fn new(network: NetworkId, graph: &DeploymentGraph) -> Self {
        let nodes = graph
            .order()
            .iter()
            .map(|key| (key.clone(), NodeRecord::declared()))
            .collect();

        Self {
            network,
            outputs: BTreeMap::new(),
            nodes,
        }
    }

    /// The address exposed by `module` as `name`
    pub fn output(&self, module: &str, name: &str) -> Option<Address> {
        self.outputs.get(module)?.get(name).copied()
    }

    /// The exposed outputs, keyed by module ID then output name
    pub fn outputs(&self) -> &BTreeMap<String, BTreeMap<String, Address>> {
        &self.outputs
    }

    /// The state of `node`
    pub fn node(&self, node: &NodeKey) -> Option<&NodeRecord> {
        self.nodes.get(node)
    }

    /// The state of every node in the graph
    pub fn nodes(&self) -> &BTreeMap<NodeKey, NodeRecord> {
        &self.nodes
    }

    /// The address of `node`, if it has been confirmed
    pub fn address_of(&self, node: &NodeKey) -> Option<Address> {
        self.nodes
            .get(node)
            .filter(|record| record.status == NodeStatus::Confirmed)
            .and_then(|record| record.address)
    }

    /// The nodes whose creation was submitted during this run
    pub fn submitted(&self) -> impl Iterator<Item = &NodeKey> {
        self.nodes
            .iter()
            .filter(|(_, record)| record.tx_hash.is_some() && !record.reused)
            .map(|(key, _)| key)
    }

    /// Whether every node was confirmed
    pub fn is_complete(&self) -> bool {
        self.nodes
            .values()
            .all(|record| record.status == NodeStatus::Confirmed)
    }

    // --- Transitions --- //

    /// Move `node` to `status`
    pub(crate) fn set_status(&mut self, node: &NodeKey, status: NodeStatus) {
        if let Some(record) = self.nodes.get_mut(node) {
            record.status = status;
        }
    }

    /// Mark `node` confirmed at `address`
    pub(crate) fn confirm(
        &mut self,
        node: &NodeKey,
        address: Address,
        tx_hash: Option<TxHash>,
        reused: bool,
    ) {
        if let Some(record) = self.nodes.get_mut(node) {
            *record = NodeRecord {
                status: NodeStatus::Confirmed,
                address: Some(address),
                tx_hash,
                reused,
            };
        }
    }

    /// Resolve the exposed outputs of every module in `graph`
    pub(crate) fn resolve_outputs(&mut self, graph: &DeploymentGraph) {
        for module in graph.modules() {
            let outputs: BTreeMap<String, Address> = module
                .outputs()
                .iter()
                .filter_map(|(name, key)| Some((name.clone(), self.address_of(key)?)))
                .collect();
            self.outputs.insert(module.id().to_string(), outputs);
        }
    }
}
