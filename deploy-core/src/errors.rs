//! Definitions of errors that can occur while declaring or executing a deployment

use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

use crate::{
    executor::DeploymentResult,
    types::{Address, ContractId, NetworkId, NodeKey, TxHash},
};

/// Errors that can occur while declaring, binding, or executing a deployment
#[derive(Debug, Error)]
pub enum DeployError {
    // --- Configuration --- //
    /// A connection parameter required for the network is absent
    #[error("missing configuration for {network}: {detail}")]
    ConfigurationMissing {
        /// The network being connected to
        network: NetworkId,
        /// Which connection parameter is missing
        detail: String,
    },
    /// A network name outside the supported set
    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    // --- Registry --- //
    /// A contract name outside the tracked set
    #[error("unknown contract: {0}")]
    UnknownContract(String),
    /// No address has been recorded for the contract on the network
    #[error("no address recorded for {contract} on {network}")]
    AddressNotFound {
        /// The network looked up
        network: NetworkId,
        /// The contract looked up
        contract: ContractId,
    },

    // --- Module authoring --- //
    /// A parameter was declared twice in the same module
    #[error("parameter `{name}` declared twice in module {module}")]
    DuplicateParameterName {
        /// The declaring module
        module: String,
        /// The duplicated parameter name
        name: String,
    },
    /// A node was declared twice in the same module
    #[error("node {0} declared twice")]
    DuplicateNodeName(NodeKey),
    /// An output was exposed twice by the same module
    #[error("output `{name}` exposed twice by module {module}")]
    DuplicateOutputName {
        /// The exposing module
        module: String,
        /// The duplicated output name
        name: String,
    },
    /// Two modules with the same ID were composed into one graph
    #[error("module {0} included twice")]
    DuplicateModule(String),
    /// A reference to a node that no composed module declares
    #[error("reference to undeclared node {0}")]
    UnknownNode(NodeKey),
    /// The dependency graph contains a cycle through the given node
    #[error("cyclic dependency through {0}")]
    CyclicDependency(NodeKey),
    /// A module ID or node name that is empty or contains `#`
    #[error("invalid module or node name `{0}`")]
    InvalidName(String),
    /// A string that does not have the `<module>#<node>` shape
    #[error("invalid node key: {0}")]
    InvalidNodeKey(String),

    // --- Binding --- //
    /// No parameter file exists for the network
    #[error("no parameter file at {}", .0.display())]
    ParameterFileMissing(PathBuf),
    /// The parameter file exists but is malformed
    #[error("error parsing parameter file {}: {reason}", .path.display())]
    ParameterParseError {
        /// The offending file
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },
    /// A parameter referenced in the graph has no value and no default
    #[error("parameter `{name}` of module {module} is unbound")]
    UnboundParameter {
        /// The declaring module
        module: String,
        /// The unbound parameter
        name: String,
    },
    /// The parameter set was loaded for a different network than the run
    #[error("parameters for {found} cannot be used on {expected}")]
    NetworkMismatch {
        /// The network of the run
        expected: NetworkId,
        /// The network the parameters were loaded for
        found: NetworkId,
    },
    /// A node's constructor arguments do not fit its contract
    #[error("invalid constructor arguments for {node}: {reason}")]
    ArgumentMismatch {
        /// The offending node
        node: NodeKey,
        /// Why the arguments were rejected
        reason: String,
    },
    /// A journaled deployment no longer matches the node it was recorded for
    #[error("journaled deployment of {node} does not match the current plan: {reason}")]
    JournalMismatch {
        /// The offending node
        node: NodeKey,
        /// What differs
        reason: String,
    },

    // --- Ledger interaction --- //
    /// Submitting or confirming a node's creation transaction failed.
    ///
    /// Nodes confirmed before the failure stay deployed; they are reported in
    /// `partial`.
    #[error("error deploying {node}: {cause}")]
    DeploymentFailed {
        /// The node whose transaction failed
        node: NodeKey,
        /// The underlying ledger failure
        #[source]
        cause: LedgerError,
        /// The state of the run at the time of the failure
        partial: Box<DeploymentResult>,
    },
    /// A node's creation was confirmed but could not be journaled.
    ///
    /// The contract is live at `address`; a resumed run does not know about it
    /// and would deploy it again.
    #[error("deployed {node} at {address} but failed to journal it: {source}")]
    JournalWriteFailed {
        /// The confirmed node
        node: NodeKey,
        /// The address it was deployed at
        address: Address,
        /// The journal failure
        #[source]
        source: Box<DeployError>,
        /// The state of the run at the time of the failure, with the node
        /// confirmed
        partial: Box<DeploymentResult>,
    },

    // --- Files --- //
    /// Error reading or writing a file
    #[error("error accessing {}: {source}", .path.display())]
    Io {
        /// The file being accessed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
    /// Error de/serializing a registry or journal file
    #[error("error de/serializing {}: {reason}", .path.display())]
    Serde {
        /// The file being de/serialized
        path: PathBuf,
        /// The underlying serde error
        reason: String,
    },
}

impl DeployError {
    /// Whether the error may have left contracts deployed on the ledger.
    ///
    /// Every other error is raised before the first transaction is submitted.
    pub fn leaves_partial_state(&self) -> bool {
        self.partial().is_some()
    }

    /// The state of the run when it stopped, for errors raised after a
    /// transaction was submitted
    pub fn partial(&self) -> Option<&DeploymentResult> {
        match self {
            DeployError::DeploymentFailed { partial, .. }
            | DeployError::JournalWriteFailed { partial, .. } => Some(partial),
            _ => None,
        }
    }

    /// Construct an [`DeployError::Io`] for the given path
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DeployError::Io {
            path: path.into(),
            source,
        }
    }

    /// Construct a [`DeployError::Serde`] for the given path
    pub(crate) fn serde(path: impl Into<PathBuf>, err: impl ToString) -> Self {
        DeployError::Serde {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

/// Errors surfaced by a ledger while submitting or confirming a transaction
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The node refused the transaction
    #[error("transaction rejected: {0}")]
    Rejected(String),
    /// The node could not be reached or returned garbage
    #[error("network error: {0}")]
    Transport(String),
    /// The transaction was not confirmed in time
    #[error("confirmation timed out after {0:?}")]
    Timeout(Duration),
    /// The transaction was mined but reverted
    #[error("transaction {0} reverted")]
    Reverted(TxHash),
    /// The receipt of a creation transaction carries no contract address
    #[error("receipt of {0} carries no contract address")]
    MissingContractAddress(TxHash),
}
