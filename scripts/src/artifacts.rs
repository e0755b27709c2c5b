//! Loading of compiled contract artifacts and encoding of their constructors
//!
//! Both Hardhat (`"bytecode": "0x…"`) and Foundry (`"bytecode": { "object":
//! "0x…" }`) artifacts are understood. Artifacts are indexed by contract name,
//! which is the artifact file's stem.

use std::{
    collections::HashMap,
    fs, iter,
    path::{Path, PathBuf},
};

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, Specifier},
    json_abi::{JsonAbi, Param},
    primitives::{hex, Bytes},
};
use deploy_core::{
    errors::DeployError,
    executor::{PlannedArg, PlannedContract},
    types::ConstructorArg,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::{
    constants::{ARTIFACT_EXTENSION, BUILD_INFO_DIR, DEBUG_ARTIFACT_SUFFIX},
    errors::ScriptError,
};

/// The fields of an artifact file the scripts consume
#[derive(Deserialize)]
struct RawArtifact {
    /// The contract ABI
    abi: JsonAbi,
    /// The creation bytecode
    bytecode: RawBytecode,
}

/// The creation bytecode, in either toolchain's layout
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    /// Hardhat stores the bytecode as a hex string
    Hardhat(String),
    /// Foundry nests it under `object`
    Foundry {
        /// The hex-encoded bytecode
        object: String,
    },
}

impl RawBytecode {
    /// The hex-encoded bytecode
    fn hex(&self) -> &str {
        match self {
            RawBytecode::Hardhat(s) => s,
            RawBytecode::Foundry { object } => object,
        }
    }
}

/// A compiled contract
#[derive(Clone, Debug)]
pub struct Artifact {
    /// The contract name
    pub name: String,
    /// The contract ABI
    pub abi: JsonAbi,
    /// The creation bytecode, without constructor arguments
    pub bytecode: Bytes,
}

impl Artifact {
    /// Parse the artifact of contract `name` from its JSON representation
    pub fn from_json(name: &str, json: &str) -> Result<Self, ScriptError> {
        let raw: RawArtifact = serde_json::from_str(json)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{name}: {e}")))?;

        let bytecode = hex::decode(raw.bytecode.hex())
            .map_err(|e| ScriptError::ArtifactParsing(format!("{name}: invalid bytecode: {e}")))?;
        if bytecode.is_empty() {
            return Err(ScriptError::ArtifactParsing(format!(
                "{name}: empty bytecode, the contract may be abstract or an interface"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            abi: raw.abi,
            bytecode: bytecode.into(),
        })
    }

    /// The constructor's parameters, empty if the ABI declares no constructor
    pub fn constructor_inputs(&self) -> &[Param] {
        self.abi
            .constructor
            .as_ref()
            .map(|c| c.inputs.as_slice())
            .unwrap_or_default()
    }

    /// Check a planned creation of this artifact against its constructor
    pub fn check_args(&self, contract: &PlannedContract) -> Result<(), DeployError> {
        let mismatch = |reason: String| DeployError::ArgumentMismatch {
            node: contract.node.clone(),
            reason,
        };

        let types = self.constructor_types().map_err(mismatch)?;
        if types.len() != contract.args.len() {
            return Err(mismatch(format!(
                "{} takes {} constructor arguments, {} given",
                self.name,
                types.len(),
                contract.args.len()
            )));
        }

        for (i, (ty, arg)) in types.iter().zip(contract.args.iter()).enumerate() {
            match arg {
                PlannedArg::Known(arg) => {
                    coerce(ty, arg).map_err(|e| mismatch(format!("argument {i}: {e}")))?;
                }
                PlannedArg::Pending(dep) if *ty != DynSolType::Address => {
                    return Err(mismatch(format!(
                        "argument {i}: the address of {dep} given for a {ty} parameter"
                    )));
                }
                PlannedArg::Pending(_) => {}
            }
        }

        Ok(())
    }

    /// The creation code of this artifact with `args` ABI-encoded after it
    pub fn deploy_code(&self, args: &[ConstructorArg]) -> Result<Bytes, ScriptError> {
        let types = self
            .constructor_types()
            .map_err(ScriptError::CalldataConstruction)?;
        if types.len() != args.len() {
            return Err(ScriptError::CalldataConstruction(format!(
                "{} takes {} constructor arguments, {} given",
                self.name,
                types.len(),
                args.len()
            )));
        }

        let values = types
            .iter()
            .zip(args)
            .map(|(ty, arg)| coerce(ty, arg))
            .collect::<Result<Vec<_>, _>>()
            .map_err(ScriptError::CalldataConstruction)?;

        let mut code = self.bytecode.to_vec();
        code.extend(DynSolValue::Tuple(values).abi_encode_params());
        Ok(code.into())
    }

    /// The resolved Solidity types of the constructor's parameters
    fn constructor_types(&self) -> Result<Vec<DynSolType>, String> {
        self.constructor_inputs()
            .iter()
            .map(|param| param.resolve().map_err(|e| format!("{}: {e}", self.name)))
            .collect()
    }
}

/// Coerce a constructor argument into a value of Solidity type `ty`
fn coerce(ty: &DynSolType, arg: &ConstructorArg) -> Result<DynSolValue, String> {
    match arg {
        ConstructorArg::Address(address) if *ty == DynSolType::Address => {
            Ok(DynSolValue::Address(*address))
        }
        ConstructorArg::Address(address) => {
            Err(format!("address {address} given for a {ty} parameter"))
        }
        ConstructorArg::Value(value) => coerce_json(ty, value),
    }
}

/// Coerce a JSON value into a value of Solidity type `ty`
fn coerce_json(ty: &DynSolType, value: &Value) -> Result<DynSolValue, String> {
    match (ty, value) {
        (DynSolType::Array(inner), Value::Array(items)) => {
            coerce_items(iter::repeat(inner.as_ref()), items).map(DynSolValue::Array)
        }
        (DynSolType::FixedArray(inner, len), Value::Array(items)) if items.len() == *len => {
            coerce_items(iter::repeat(inner.as_ref()), items).map(DynSolValue::FixedArray)
        }
        (DynSolType::Tuple(types), Value::Array(items)) if items.len() == types.len() => {
            coerce_items(types.iter(), items).map(DynSolValue::Tuple)
        }
        (_, Value::String(s)) => ty.coerce_str(s).map_err(|e| e.to_string()),
        (_, Value::Number(n)) => ty.coerce_str(&n.to_string()).map_err(|e| e.to_string()),
        (_, Value::Bool(b)) => ty.coerce_str(&b.to_string()).map_err(|e| e.to_string()),
        _ => Err(format!("cannot encode {value} as {ty}")),
    }
}

/// Coerce each of `items` into the corresponding type of `types`
fn coerce_items<'a>(
    types: impl Iterator<Item = &'a DynSolType>,
    items: &[Value],
) -> Result<Vec<DynSolValue>, String> {
    types
        .zip(items)
        .map(|(ty, item)| coerce_json(ty, item))
        .collect()
}

// ------------------
// | Artifact Store |
// ------------------

/// An index of the contract artifacts under a directory, loaded on first use
#[derive(Debug, Default)]
pub struct ArtifactStore {
    /// The artifact file of each contract, by contract name
    paths: HashMap<String, PathBuf>,
    /// The artifacts loaded so far
    loaded: HashMap<String, Artifact>,
}

impl ArtifactStore {
    /// Index every artifact under `root`.
    ///
    /// Compiler metadata and debug files are skipped. If two artifacts share a
    /// contract name, the first one found wins.
    pub fn index(root: &Path) -> Result<Self, ScriptError> {
        let mut paths: HashMap<String, PathBuf> = HashMap::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;
            let path = entry.path();
            if !is_artifact(path) {
                continue;
            }

            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(existing) = paths.get(name) {
                warn!(
                    contract = name,
                    kept = %existing.display(),
                    ignored = %path.display(),
                    "duplicate contract artifact"
                );
                continue;
            }
            paths.insert(name.to_string(), path.to_path_buf());
        }

        debug!(root = %root.display(), artifacts = paths.len(), "indexed contract artifacts");
        Ok(Self {
            paths,
            loaded: HashMap::new(),
        })
    }

    /// Whether an artifact exists for contract `name`
    pub fn contains(&self, name: &str) -> bool {
        self.loaded.contains_key(name) || self.paths.contains_key(name)
    }

    /// The artifact of contract `name`
    pub fn get(&mut self, name: &str) -> Result<&Artifact, ScriptError> {
        if !self.loaded.contains_key(name) {
            let path = self
                .paths
                .get(name)
                .ok_or_else(|| ScriptError::ArtifactParsing(format!("no artifact for {name}")))?;
            let json = fs::read_to_string(path)
                .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", path.display())))?;

            let artifact = Artifact::from_json(name, &json)?;
            debug!(contract = name, path = %path.display(), "loaded contract artifact");
            self.loaded.insert(name.to_string(), artifact);
        }

        self.loaded
            .get(name)
            .ok_or_else(|| ScriptError::ArtifactParsing(format!("no artifact for {name}")))
    }
}

/// Whether `path` looks like a contract artifact
fn is_artifact(path: &Path) -> bool {
    let in_build_info = path.components().any(|c| c.as_os_str() == BUILD_INFO_DIR);
    let is_debug = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(DEBUG_ARTIFACT_SUFFIX));

    path.is_file()
        && path.extension().is_some_and(|ext| ext == ARTIFACT_EXTENSION)
        && !in_build_info
        && !is_debug
}
