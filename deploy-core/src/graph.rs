//! The combined dependency graph of a set of modules

use std::collections::HashMap;

use itertools::Itertools;
use petgraph::{algo::toposort, graph::NodeIndex, Graph};
use tracing::debug;

use crate::{
    errors::DeployError,
    module::{Module, Node},
    types::NodeKey,
};

/// A set of modules whose cross-references all resolve and whose nodes form a
/// DAG, together with a topological order of those nodes
#[derive(Clone, Debug)]
pub struct DeploymentGraph {
    /// The composed modules
    modules: Vec<Module>,
    /// The position of each node, as (module index, node index)
    index: HashMap<NodeKey, (usize, usize)>,
    /// Every node, ordered so that each follows all of its dependencies
    order: Vec<NodeKey>,
}

impl DeploymentGraph {
    /// Compose `modules` into a single graph
    pub fn compose(modules: impl IntoIterator<Item = Module>) -> Result<Self, DeployError> {
        let modules: Vec<Module> = modules.into_iter().collect();
        if let Some(dup) = modules.iter().map(Module::id).duplicates().next() {
            return Err(DeployError::DuplicateModule(dup.to_string()));
        }

        let mut index = HashMap::new();
        for (i, module) in modules.iter().enumerate() {
            for (j, node) in module.nodes().iter().enumerate() {
                index.insert(node.key.clone(), (i, j));
            }
        }

        // Outputs may name nodes of other modules; those must exist as well
        if let Some(missing) = modules
            .iter()
            .flat_map(|m| m.outputs().values())
            .find(|key| !index.contains_key(*key))
        {
            return Err(DeployError::UnknownNode(missing.clone()));
        }

        let order = topological_order(
            modules.iter().flat_map(|m| m.nodes()),
            true, /* strict */
        )?;
        debug!(order = %order.iter().join(" -> "), "composed deployment graph");

        Ok(Self {
            modules,
            index,
            order,
        })
    }

    /// The composed modules
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// The module with ID `id`
    pub fn module(&self, id: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.id() == id)
    }

    /// The node identified by `key`
    pub fn node(&self, key: &NodeKey) -> Option<&Node> {
        let (i, j) = self.index.get(key)?;
        self.modules.get(*i)?.nodes().get(*j)
    }

    /// The node keys in topological order
    pub fn order(&self) -> &[NodeKey] {
        &self.order
    }

    /// The nodes in topological order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|key| self.node(key))
    }

    /// The number of nodes in the graph
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Order `nodes` so that every node follows the nodes it depends on.
///
/// References to nodes outside of `nodes` fail with
/// [`DeployError::UnknownNode`] when `strict` is set, and are ignored otherwise.
pub(crate) fn topological_order<'a>(
    nodes: impl IntoIterator<Item = &'a Node>,
    strict: bool,
) -> Result<Vec<NodeKey>, DeployError> {
    let nodes: Vec<&Node> = nodes.into_iter().collect();

    let mut graph = Graph::<&NodeKey, ()>::with_capacity(nodes.len(), nodes.len());
    let indices: HashMap<&NodeKey, NodeIndex> = nodes
        .iter()
        .map(|node| (&node.key, graph.add_node(&node.key)))
        .collect();

    for node in &nodes {
        let to = indices[&node.key];
        for dep in node.dependencies() {
            match indices.get(dep) {
                Some(from) => {
                    graph.add_edge(*from, to, ());
                }
                None if strict => return Err(DeployError::UnknownNode(dep.clone())),
                None => {}
            }
        }
    }

    toposort(&graph, None /* space */)
        .map(|order| order.into_iter().map(|i| graph[i].clone()).collect())
        .map_err(|cycle| DeployError::CyclicDependency(graph[cycle.node_id()].clone()))
}
