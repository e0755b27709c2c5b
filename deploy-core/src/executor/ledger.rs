//! The interface between the executor and the chain it deploys to

use serde::{Deserialize, Serialize};

use crate::{
    errors::{DeployError, LedgerError},
    types::{Address, ConstructorArg, NodeKey, TxHash},
};

/// A constructor argument as known before execution starts
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannedArg {
    /// The argument is already resolved
    Known(ConstructorArg),
    /// The argument is the address of a node deployed earlier in the run
    Pending(NodeKey),
}

/// A contract creation step as known before execution starts
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlannedContract {
    /// The node being deployed
    pub node: NodeKey,
    /// The name of the contract artifact
    pub artifact: String,
    /// The constructor arguments
    pub args: Vec<PlannedArg>,
}

/// A contract creation with every constructor argument resolved
#[derive(Clone, Debug, PartialEq)]
pub struct CreationRequest {
    /// The node being deployed
    pub node: NodeKey,
    /// The name of the contract artifact
    pub artifact: String,
    /// The constructor arguments
    pub args: Vec<ConstructorArg>,
}

/// A confirmed contract creation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deployment {
    /// The address of the new contract
    pub address: Address,
    /// The hash of the creation transaction
    pub tx_hash: TxHash,
}

/// A chain the executor can deploy contracts to.
///
/// A ledger owns the signing credential and the connection for the length of
/// a run; the executor never has more than one creation in flight.
#[allow(async_fn_in_trait)]
pub trait Ledger {
    /// Check every contract creation of a run before the first submission.
    ///
    /// Implementations should reject unknown artifacts and arguments that do
    /// not fit the constructor with [`DeployError::ArgumentMismatch`].
    fn preflight(&mut self, _contracts: &[PlannedContract]) -> Result<(), DeployError> {
        Ok(())
    }

    /// Submit a contract creation and wait until it is confirmed
    async fn deploy(&mut self, request: &CreationRequest) -> Result<Deployment, LedgerError>;
}
