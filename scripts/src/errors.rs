//! Definitions of errors that can occur during the execution of the deploy scripts

use deploy_core::errors::DeployError;
use thiserror::Error;

/// Errors that can occur during the execution of the deploy scripts
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Error raised by the deployment engine
    #[error(transparent)]
    Deploy(#[from] DeployError),
    /// Error initializing the RPC client
    #[error("error initializing client: {0}")]
    ClientInitialization(String),
    /// Error reading or parsing a contract artifact
    #[error("error parsing artifact: {0}")]
    ArtifactParsing(String),
    /// Error encoding constructor arguments
    #[error("error constructing calldata: {0}")]
    CalldataConstruction(String),
    /// A `--record` flag names an output no composed module exposes
    #[error("no module exposes an output named {0}")]
    UnknownOutput(String),
    /// A `--record` flag names an output exposed by several modules
    #[error("output {0} is exposed by several modules; qualify it as <module>#<output>")]
    AmbiguousOutput(String),
    /// Error serializing script output
    #[error("error serializing output: {0}")]
    Serde(String),
}
