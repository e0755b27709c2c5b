//! A ledger that submits contract creations through an alloy provider

use std::time::Duration;

use alloy::{
    network::TransactionBuilder,
    providers::{DynProvider, PendingTransactionError, Provider, WatchTxError},
    rpc::types::TransactionRequest,
    transports::{RpcError, TransportError},
};
use deploy_core::{
    errors::{DeployError, LedgerError},
    executor::{CreationRequest, Deployment, Ledger, PlannedContract},
};
use tracing::{debug, info};

use crate::artifacts::ArtifactStore;

/// Deploys contracts from compiled artifacts, one confirmed creation at a time
pub struct AlloyLedger {
    /// The signing provider transactions are sent through
    provider: DynProvider,
    /// The artifacts contracts are deployed from
    artifacts: ArtifactStore,
    /// The number of confirmations to wait for
    confirmations: u64,
    /// How long to wait for the confirmations
    timeout: Duration,
}

impl AlloyLedger {
    /// Create a ledger over a signing provider
    pub fn new(
        provider: DynProvider,
        artifacts: ArtifactStore,
        confirmations: u64,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            artifacts,
            confirmations,
            timeout,
        }
    }
}

impl Ledger for AlloyLedger {
    fn preflight(&mut self, contracts: &[PlannedContract]) -> Result<(), DeployError> {
        for contract in contracts {
            let artifact = self.artifacts.get(&contract.artifact).map_err(|e| {
                DeployError::ArgumentMismatch {
                    node: contract.node.clone(),
                    reason: e.to_string(),
                }
            })?;
            artifact.check_args(contract)?;
        }

        debug!(contracts = contracts.len(), "preflight passed");
        Ok(())
    }

    async fn deploy(&mut self, request: &CreationRequest) -> Result<Deployment, LedgerError> {
        let code = self
            .artifacts
            .get(&request.artifact)
            .and_then(|artifact| artifact.deploy_code(&request.args))
            .map_err(|e| LedgerError::Rejected(e.to_string()))?;

        let tx = TransactionRequest::default().with_deploy_code(code);
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(transport_error)?;

        let tx_hash = *pending.tx_hash();
        info!(node = %request.node, tx = %tx_hash, "creation transaction sent");

        let receipt = pending
            .with_required_confirmations(self.confirmations)
            .with_timeout(Some(self.timeout))
            .get_receipt()
            .await
            .map_err(|e| confirmation_error(e, self.timeout))?;

        if !receipt.status() {
            return Err(LedgerError::Reverted(tx_hash));
        }

        let address = receipt
            .contract_address
            .ok_or(LedgerError::MissingContractAddress(tx_hash))?;
        Ok(Deployment { address, tx_hash })
    }
}

/// Classify an RPC failure: error responses are rejections by the node,
/// everything else is a connectivity problem
fn transport_error(err: TransportError) -> LedgerError {
    match err {
        RpcError::ErrorResp(payload) => LedgerError::Rejected(payload.message.to_string()),
        other => LedgerError::Transport(other.to_string()),
    }
}

/// Classify a failure while waiting for a receipt
fn confirmation_error(err: PendingTransactionError, timeout: Duration) -> LedgerError {
    match err {
        PendingTransactionError::TxWatcher(WatchTxError::Timeout) => LedgerError::Timeout(timeout),
        PendingTransactionError::TransportError(e) => transport_error(e),
        other => LedgerError::Transport(other.to_string()),
    }
}
