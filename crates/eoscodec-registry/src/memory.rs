//! In-memory contract registry.
//!
//! Suitable for testing, CLI use, and embedded deployments.
//! Thread-safe via `Arc<RwLock<Inner>>`.

use eoscodec_core::{error::RegistryError, ActionRegistry, Name, RecordDescriptor};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use tracing::{debug, info};

use crate::abi::{AbiParser, ContractAbi};

#[derive(Default)]
struct Inner {
    contracts: HashMap<Name, ContractAbi>,
}

/// Thread-safe in-memory registry keyed by contract account.
#[derive(Clone, Default)]
pub struct MemoryRegistry {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave `Inner` half-updated, so a
    // poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a contract's layouts. A contract can be registered once.
    pub fn add_contract(&self, abi: ContractAbi) -> Result<(), RegistryError> {
        let mut inner = self.write();
        if inner.contracts.contains_key(&abi.account) {
            return Err(RegistryError::AlreadyExists {
                contract: abi.account.to_string(),
            });
        }
        debug!(
            contract = %abi.account,
            actions = abi.actions.len(),
            tables = abi.tables.len(),
            "registered contract"
        );
        inner.contracts.insert(abi.account, abi);
        Ok(())
    }

    /// Load a single ABI file. Returns the number of contracts loaded.
    pub fn load_file(&self, path: &Path) -> Result<usize, RegistryError> {
        let content = std::fs::read_to_string(path)?;
        let contracts = AbiParser::parse_all(&content)?;
        if contracts.is_empty() {
            return Err(RegistryError::ParseError(format!(
                "{}: empty ABI file",
                path.display()
            )));
        }
        let count = contracts.len();
        for abi in contracts {
            self.add_contract(abi)?;
        }
        info!(path = %path.display(), count, "loaded ABI file");
        Ok(count)
    }

    /// Load all `.yaml`/`.yml` files under a directory recursively, in path
    /// order. Returns the total number of contracts loaded.
    pub fn load_directory(&self, dir: &Path) -> Result<usize, RegistryError> {
        let mut files = collect_abi_files(dir)?;
        files.sort();
        let mut count = 0;
        for file in &files {
            count += self.load_file(file)?;
        }
        info!(dir = %dir.display(), files = files.len(), count, "loaded ABI directory");
        Ok(count)
    }

    /// Payload layout of `contract::action`.
    pub fn action(&self, contract: Name, action: Name) -> Option<RecordDescriptor> {
        self.read()
            .contracts
            .get(&contract)
            .and_then(|abi| abi.action(action))
            .cloned()
    }

    /// Row layout of `contract`'s `table`.
    pub fn table(&self, contract: Name, table: Name) -> Option<RecordDescriptor> {
        self.read()
            .contracts
            .get(&contract)
            .and_then(|abi| abi.table(table))
            .cloned()
    }

    /// A full contract entry.
    pub fn contract(&self, contract: Name) -> Option<ContractAbi> {
        self.read().contracts.get(&contract).cloned()
    }

    /// Registered contract accounts, sorted by name text.
    pub fn contracts(&self) -> Vec<Name> {
        let mut names: Vec<Name> = self.read().contracts.keys().copied().collect();
        names.sort_by_key(|n| n.to_string());
        names
    }

    /// Number of registered contracts.
    pub fn len(&self) -> usize {
        self.read().contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ActionRegistry for MemoryRegistry {
    fn resolve(&self, contract: Name, action: Name) -> Option<RecordDescriptor> {
        self.action(contract, action)
    }
}

/// Collect all ABI files under `dir` recursively.
fn collect_abi_files(dir: &Path) -> Result<Vec<PathBuf>, RegistryError> {
    if !dir.is_dir() {
        return Err(RegistryError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", dir.display()),
        )));
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(collect_abi_files(&path)?);
        } else if path
            .extension()
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(false)
        {
            files.push(path);
        }
    }
    Ok(files)
}
