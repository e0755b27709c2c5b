//! Declarative, network-aware deployment of the protocol's smart contracts.
//!
//! Deployments are described as [`module::Module`]s: named sets of contract
//! creation steps whose constructor arguments are literals, per-network
//! parameters, or the addresses produced by other steps. Modules are composed
//! into a [`graph::DeploymentGraph`] and walked in dependency order by an
//! [`executor::Executor`] against some [`executor::Ledger`].

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod constants;
pub mod errors;
pub mod executor;
pub mod graph;
pub mod module;
pub mod network;
pub mod params;
pub mod registry;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod types;
