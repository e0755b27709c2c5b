//! Deployment modules: named sets of nodes and the handles that wire them together
//!
//! A module is declared through a [`ModuleBuilder`] and is immutable once
//! built. Nodes are stored in declaration order and refer to each other by
//! [`NodeKey`], so references may cross module boundaries; the
//! [`DeploymentGraph`](crate::graph::DeploymentGraph) resolves them.

mod builder;

use std::collections::BTreeMap;

pub use builder::ModuleBuilder;
use serde_json::Value;

use crate::types::{Address, ContractId, NodeKey};

/// A named input of a module, resolved from the bound parameter set
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParameterHandle {
    /// The declaring module
    module: String,
    /// The parameter's name
    name: String,
}

impl ParameterHandle {
    /// The declaring module
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The parameter's name
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A reference to the address a node resolves to
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeOutputHandle {
    /// The referenced node
    key: NodeKey,
}

impl NodeOutputHandle {
    /// The referenced node
    pub fn key(&self) -> &NodeKey {
        &self.key
    }
}

/// A constructor argument as declared
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    /// A value fixed in the module definition
    Literal(Value),
    /// A value read from the parameter set
    Parameter(ParameterHandle),
    /// The address of another node
    Output(NodeOutputHandle),
}

impl Arg {
    /// A literal argument
    pub fn literal(value: impl Into<Value>) -> Self {
        Arg::Literal(value.into())
    }

    /// The node this argument depends on, if any
    pub fn dependency(&self) -> Option<&NodeKey> {
        match self {
            Arg::Output(handle) => Some(handle.key()),
            _ => None,
        }
    }
}

impl From<ParameterHandle> for Arg {
    fn from(handle: ParameterHandle) -> Self {
        Arg::Parameter(handle)
    }
}

impl From<&ParameterHandle> for Arg {
    fn from(handle: &ParameterHandle) -> Self {
        Arg::Parameter(handle.clone())
    }
}

impl From<NodeOutputHandle> for Arg {
    fn from(handle: NodeOutputHandle) -> Self {
        Arg::Output(handle)
    }
}

impl From<&NodeOutputHandle> for Arg {
    fn from(handle: &NodeOutputHandle) -> Self {
        Arg::Output(handle.clone())
    }
}

impl From<Address> for Arg {
    fn from(address: Address) -> Self {
        Arg::Literal(Value::String(address.to_string()))
    }
}

/// Where an external node's address comes from
#[derive(Clone, Debug, PartialEq)]
pub enum ExternalSource {
    /// A fixed address
    Address(Address),
    /// An address read from the parameter set
    Parameter(ParameterHandle),
    /// The address recorded in the address registry for the run's network
    Registry(ContractId),
}

/// What a node does when executed
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// Deploy a contract from an artifact
    Contract {
        /// The name of the compiled contract artifact
        artifact: String,
        /// The constructor arguments
        args: Vec<Arg>,
    },
    /// Refer to a contract that is already deployed
    External(ExternalSource),
}

/// One step of a module
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// The node's identity
    pub key: NodeKey,
    /// What the node does
    pub kind: NodeKind,
}

impl Node {
    /// The nodes whose addresses this node's constructor consumes
    pub fn dependencies(&self) -> impl Iterator<Item = &NodeKey> {
        let args: &[Arg] = match &self.kind {
            NodeKind::Contract { args, .. } => args,
            NodeKind::External(_) => &[],
        };
        args.iter().filter_map(Arg::dependency)
    }
}

/// A declared module parameter
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterDecl {
    /// The parameter's name
    pub name: String,
    /// The value used when the parameter set has none
    pub default: Option<Value>,
}

/// An immutable, fully declared deployment module
#[derive(Clone, Debug, PartialEq)]
pub struct Module {
    /// The module's ID, also its section name in parameter files
    id: String,
    /// The declared parameters
    parameters: Vec<ParameterDecl>,
    /// The declared nodes, in declaration order
    nodes: Vec<Node>,
    /// The exposed outputs, by name
    outputs: BTreeMap<String, NodeKey>,
}

impl Module {
    /// The module's ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The declaration of parameter `name`
    pub fn parameter(&self, name: &str) -> Option<&ParameterDecl> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// The declared nodes, in declaration order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The exposed outputs, by name
    pub fn outputs(&self) -> &BTreeMap<String, NodeKey> {
        &self.outputs
    }

    /// A handle to the exposed output `name`, for use in another module
    pub fn output(&self, name: &str) -> Option<NodeOutputHandle> {
        self.outputs
            .get(name)
            .map(|key| NodeOutputHandle { key: key.clone() })
    }
}
