//! The deployment journal: every confirmed creation of previous runs on a network
//!
//! The journal is written through to disk after each confirmation, so a run
//! interrupted at any point can be resumed without resubmitting the nodes it
//! already confirmed.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    constants::JOURNAL_FILE_PREFIX,
    errors::DeployError,
    types::{Address, ConstructorArg, NetworkId, NodeKey, TxHash},
};

/// The journaled outcome of one contract creation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// The artifact the contract was deployed from
    pub artifact: String,
    /// The resolved constructor arguments
    pub args: Vec<ConstructorArg>,
    /// The address of the contract
    pub address: Address,
    /// The hash of the creation transaction
    pub tx_hash: TxHash,
}

/// The on-disk representation of a journal
#[derive(Default, Serialize, Deserialize)]
struct JournalFile {
    /// The entries, keyed by the `module#node` form of their node key
    entries: BTreeMap<NodeKey, JournalEntry>,
}

/// The confirmed creations of previous runs, optionally persisted to a file
#[derive(Clone, Debug, Default)]
pub struct Journal {
    /// The file the journal is persisted to, if any
    path: Option<PathBuf>,
    /// The journaled creations
    entries: BTreeMap<NodeKey, JournalEntry>,
}

impl Journal {
    /// A journal that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// The path of the journal for `network` in `dir`
    pub fn file_path(dir: &Path, network: NetworkId) -> PathBuf {
        network.file_path(dir, JOURNAL_FILE_PREFIX)
    }

    /// Open the journal persisted at `path`, starting empty if it does not exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DeployError> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| DeployError::io(&path, e))?;
            let file: JournalFile =
                serde_json::from_str(&contents).map_err(|e| DeployError::serde(&path, e))?;
            file.entries
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), entries = entries.len(), "opened deployment journal");
        Ok(Self {
            path: Some(path),
            entries,
        })
    }

    /// The journaled creation of `node`, if any
    pub fn get(&self, node: &NodeKey) -> Option<&JournalEntry> {
        self.entries.get(node)
    }

    /// The journaled creations
    pub fn entries(&self) -> &BTreeMap<NodeKey, JournalEntry> {
        &self.entries
    }

    /// The number of journaled creations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been journaled
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Journal the confirmed creation of `node`
    pub fn record(&mut self, node: NodeKey, entry: JournalEntry) -> Result<(), DeployError> {
        self.entries.insert(node, entry);
        self.persist()
    }

    /// Forget every journaled creation
    pub fn clear(&mut self) -> Result<(), DeployError> {
        if !self.entries.is_empty() {
            warn!(entries = self.entries.len(), "discarding deployment journal");
        }

        self.entries.clear();
        self.persist()
    }

    /// Write the journal to its file, if it has one
    fn persist(&self) -> Result<(), DeployError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| DeployError::io(dir, e))?;
        }

        let file = JournalFile {
            entries: self.entries.clone(),
        };
        let contents =
            serde_json::to_string_pretty(&file).map_err(|e| DeployError::serde(path, e))?;
        fs::write(path, contents + "\n").map_err(|e| DeployError::io(path, e))
    }
}
