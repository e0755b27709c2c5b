//! Scripts for deploying and tracking the protocol's periphery contracts.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod cli;
mod commands;
pub mod constants;
pub mod errors;
pub mod ledger;
pub mod modules;
pub mod utils;
