//! Helpers for exercising the executor without a chain

use std::collections::HashMap;

use alloy_primitives::B256;

use crate::{
    errors::{DeployError, LedgerError},
    executor::{CreationRequest, Deployment, Ledger, PlannedContract},
    types::{Address, ConstructorArg, NodeKey},
};

/// Something the mock ledger observed
#[derive(Clone, Debug, PartialEq)]
pub enum LedgerEvent {
    /// A creation was submitted
    Submitted(NodeKey),
    /// A creation was confirmed at the given address
    Confirmed(NodeKey, Address),
}

/// An in-memory ledger that confirms creations immediately at deterministic
/// addresses
#[derive(Debug, Default)]
pub struct MockLedger {
    /// Everything the ledger observed, in order
    events: Vec<LedgerEvent>,
    /// Every request submitted, in order
    requests: Vec<CreationRequest>,
    /// Nodes whose creation fails, and how
    failures: HashMap<NodeKey, LedgerError>,
    /// The constructor arity of every known artifact; unchecked when empty
    artifacts: HashMap<String, usize>,
    /// The number of creations confirmed so far
    nonce: u64,
    /// The number of times preflight ran
    preflights: usize,
}

impl MockLedger {
    /// A ledger accepting every creation
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the creation of `node` with `err`
    pub fn fail_on(mut self, node: NodeKey, err: LedgerError) -> Self {
        self.failures.insert(node, err);
        self
    }

    /// Only accept `artifact`, with a constructor taking `arity` arguments.
    ///
    /// Once any artifact is registered, preflight rejects unknown artifacts.
    pub fn with_artifact(mut self, artifact: &str, arity: usize) -> Self {
        self.artifacts.insert(artifact.to_string(), arity);
        self
    }

    /// Everything the ledger observed, in order
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Every request submitted, in order
    pub fn requests(&self) -> &[CreationRequest] {
        &self.requests
    }

    /// The nodes submitted, in order
    pub fn submitted(&self) -> Vec<NodeKey> {
        self.requests.iter().map(|r| r.node.clone()).collect()
    }

    /// The number of times preflight ran
    pub fn preflights(&self) -> usize {
        self.preflights
    }

    /// The address the `n`th confirmed creation lands at
    pub fn address_for(n: u64) -> Address {
        Address::left_padding_from(&(0x1000 + n).to_be_bytes())
    }
}

impl Ledger for MockLedger {
    fn preflight(&mut self, contracts: &[PlannedContract]) -> Result<(), DeployError> {
        self.preflights += 1;
        if self.artifacts.is_empty() {
            return Ok(());
        }

        for contract in contracts {
            let arity = self.artifacts.get(&contract.artifact).ok_or_else(|| {
                DeployError::ArgumentMismatch {
                    node: contract.node.clone(),
                    reason: format!("unknown artifact {}", contract.artifact),
                }
            })?;

            if *arity != contract.args.len() {
                return Err(DeployError::ArgumentMismatch {
                    node: contract.node.clone(),
                    reason: format!("expected {arity} arguments, got {}", contract.args.len()),
                });
            }
        }

        Ok(())
    }

    async fn deploy(&mut self, request: &CreationRequest) -> Result<Deployment, LedgerError> {
        self.events.push(LedgerEvent::Submitted(request.node.clone()));
        self.requests.push(request.clone());
        if let Some(err) = self.failures.get(&request.node) {
            return Err(err.clone());
        }

        self.nonce += 1;
        let address = Self::address_for(self.nonce);
        let tx_hash = B256::left_padding_from(&self.nonce.to_be_bytes());
        self.events.push(LedgerEvent::Confirmed(request.node.clone(), address));

        Ok(Deployment { address, tx_hash })
    }
}

/// The addresses among `args`
pub fn address_args(args: &[ConstructorArg]) -> Vec<Address> {
    args.iter()
        .filter_map(|arg| match arg {
            ConstructorArg::Address(address) => Some(*address),
            ConstructorArg::Value(_) => None,
        })
        .collect()
}
