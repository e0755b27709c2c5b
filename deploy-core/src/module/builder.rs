//! The builder through which modules are declared

use std::collections::BTreeMap;

use serde_json::Value;

use crate::{
    constants::NODE_KEY_SEPARATOR, errors::DeployError, graph::topological_order,
    types::NodeKey,
};

use super::{
    Arg, ExternalSource, Module, Node, NodeKind, NodeOutputHandle, ParameterDecl,
    ParameterHandle,
};

/// Accumulates the declarations of a module.
///
/// Every declaration is validated as it is made, so a builder never holds a
/// duplicate name or a cycle among the nodes it has seen.
#[derive(Debug)]
pub struct ModuleBuilder {
    /// The module under construction
    module: Module,
}

impl ModuleBuilder {
    /// Start declaring the module `id`
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            module: Module {
                id: id.into(),
                parameters: Vec::new(),
                nodes: Vec::new(),
                outputs: BTreeMap::new(),
            },
        }
    }

    /// Declare a parameter that must be bound at execution time
    pub fn declare_parameter(&mut self, name: &str) -> Result<ParameterHandle, DeployError> {
        self.add_parameter(name, None)
    }

    /// Declare a parameter, falling back to `default` when the parameter set
    /// has no value for it
    pub fn declare_parameter_with_default(
        &mut self,
        name: &str,
        default: impl Into<Value>,
    ) -> Result<ParameterHandle, DeployError> {
        self.add_parameter(name, Some(default.into()))
    }

    /// Declare a contract deployment whose artifact shares the node's name
    pub fn declare_contract(
        &mut self,
        node: &str,
        args: impl IntoIterator<Item = Arg>,
    ) -> Result<NodeOutputHandle, DeployError> {
        self.declare_contract_from_artifact(node, node, args)
    }

    /// Declare a contract deployment of the artifact `artifact`
    pub fn declare_contract_from_artifact(
        &mut self,
        node: &str,
        artifact: &str,
        args: impl IntoIterator<Item = Arg>,
    ) -> Result<NodeOutputHandle, DeployError> {
        let kind = NodeKind::Contract {
            artifact: artifact.to_string(),
            args: args.into_iter().collect(),
        };
        self.insert_node(node, kind)
    }

    /// Declare a reference to an already deployed contract
    pub fn declare_external(
        &mut self,
        node: &str,
        source: ExternalSource,
    ) -> Result<NodeOutputHandle, DeployError> {
        self.insert_node(node, NodeKind::External(source))
    }

    /// A reference to node `node` of this module, which need not be declared yet
    pub fn node(&self, node: &str) -> NodeOutputHandle {
        Self::reference(&self.module.id, node)
    }

    /// A reference to node `node` of module `module`, resolved when modules are
    /// composed into a graph
    pub fn reference(module: &str, node: &str) -> NodeOutputHandle {
        NodeOutputHandle {
            key: NodeKey::new(module, node),
        }
    }

    /// Expose the address of `handle` as the module output `name`
    pub fn expose_output(
        &mut self,
        name: &str,
        handle: &NodeOutputHandle,
    ) -> Result<(), DeployError> {
        if self.module.outputs.contains_key(name) {
            return Err(DeployError::DuplicateOutputName {
                module: self.module.id.clone(),
                name: name.to_string(),
            });
        }

        self.module
            .outputs
            .insert(name.to_string(), handle.key().clone());
        Ok(())
    }

    /// Finish the module.
    ///
    /// Fails with [`DeployError::UnknownNode`] if a reference into this module
    /// names a node that was never declared.
    pub fn build(self) -> Result<Module, DeployError> {
        let module = self.module;
        check_name(&module.id)?;
        let is_declared = |key: &NodeKey| module.nodes.iter().any(|n| &n.key == key);

        let local_refs = module
            .nodes
            .iter()
            .flat_map(Node::dependencies)
            .chain(module.outputs.values())
            .filter(|key| key.module == module.id);
        if let Some(missing) = local_refs.into_iter().find(|key| !is_declared(key)) {
            return Err(DeployError::UnknownNode(missing.clone()));
        }

        Ok(module)
    }

    // -----------
    // | Helpers |
    // -----------

    /// Register a parameter declaration
    fn add_parameter(
        &mut self,
        name: &str,
        default: Option<Value>,
    ) -> Result<ParameterHandle, DeployError> {
        if self.module.parameter(name).is_some() {
            return Err(DeployError::DuplicateParameterName {
                module: self.module.id.clone(),
                name: name.to_string(),
            });
        }

        self.module.parameters.push(ParameterDecl {
            name: name.to_string(),
            default,
        });
        Ok(ParameterHandle {
            module: self.module.id.clone(),
            name: name.to_string(),
        })
    }

    /// Register a node, rejecting it if it closes a cycle among the nodes
    /// declared so far
    fn insert_node(&mut self, name: &str, kind: NodeKind) -> Result<NodeOutputHandle, DeployError> {
        check_name(&self.module.id)?;
        check_name(name)?;

        let key = NodeKey::new(self.module.id.clone(), name);
        if self.module.nodes.iter().any(|n| n.key == key) {
            return Err(DeployError::DuplicateNodeName(key));
        }

        self.module.nodes.push(Node {
            key: key.clone(),
            kind,
        });
        if let Err(e) = topological_order(&self.module.nodes, false /* strict */) {
            self.module.nodes.pop();
            return Err(e);
        }

        Ok(NodeOutputHandle { key })
    }
}

/// Reject names that would not survive a round trip through a [`NodeKey`]
fn check_name(name: &str) -> Result<(), DeployError> {
    if name.is_empty() || name.contains(NODE_KEY_SEPARATOR) {
        return Err(DeployError::InvalidName(name.to_string()));
    }

    Ok(())
}
