mod rest;

pub use rest::RestObjectiveStore;

use crate::domain::ObjectiveCode;
use crate::foundation::{Identity, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Read-only view of the off-chain objective record store. This core never
/// mutates it; records are immutable once written by the quest platform.
#[async_trait]
pub trait ObjectiveStore: Send + Sync {
    /// Whether a successful record exists for (identity, objective). A missing
    /// record is `Ok(false)`, never an error; only store unreachability errors.
    async fn get_success(&self, identity: &Identity, code: ObjectiveCode) -> Result<bool>;

    /// Identities whose off-chain records cover the whole required set. Drives
    /// store-side discovery for bulk reconciliation.
    async fn fully_complete_identities(&self) -> Result<Vec<Identity>>;
}

/// In-memory store used by tests and local tooling. Counts queries so tests
/// can assert on "zero collaborator calls" boundaries.
pub struct MemoryObjectiveStore {
    records: Mutex<HashSet<(Identity, ObjectiveCode)>>,
    queries: AtomicU64,
    fail_next: Mutex<Option<String>>,
}

impl MemoryObjectiveStore {
    pub fn new() -> Self {
        Self { records: Mutex::new(HashSet::new()), queries: AtomicU64::new(0), fail_next: Mutex::new(None) }
    }

    pub fn record_success(&self, identity: &Identity, code: ObjectiveCode) {
        if let Ok(mut records) = self.records.lock() {
            records.insert((identity.clone(), code));
        }
    }

    /// Make every subsequent query fail as store-unavailable until cleared.
    pub fn set_unavailable(&self, details: impl Into<String>) {
        if let Ok(mut fail) = self.fail_next.lock() {
            *fail = Some(details.into());
        }
    }

    pub fn clear_unavailable(&self) {
        if let Ok(mut fail) = self.fail_next.lock() {
            *fail = None;
        }
    }

    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    fn check_available(&self, operation: &str) -> Result<()> {
        let fail = self.fail_next.lock().map_err(|_| crate::QuestDropError::StorageError {
            operation: "memory store lock".to_string(),
            details: "poisoned".to_string(),
        })?;
        match fail.as_ref() {
            Some(details) => Err(crate::QuestDropError::StoreUnavailable {
                operation: operation.to_string(),
                details: details.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Default for MemoryObjectiveStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectiveStore for MemoryObjectiveStore {
    async fn get_success(&self, identity: &Identity, code: ObjectiveCode) -> Result<bool> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.check_available("get_success")?;
        let records = self.records.lock().map_err(|_| crate::QuestDropError::StorageError {
            operation: "memory store lock".to_string(),
            details: "poisoned".to_string(),
        })?;
        Ok(records.contains(&(identity.clone(), code)))
    }

    async fn fully_complete_identities(&self) -> Result<Vec<Identity>> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.check_available("fully_complete_identities")?;
        let records = self.records.lock().map_err(|_| crate::QuestDropError::StorageError {
            operation: "memory store lock".to_string(),
            details: "poisoned".to_string(),
        })?;
        let mut complete: Vec<Identity> = records
            .iter()
            .map(|(identity, _)| identity.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .filter(|identity| {
                ObjectiveCode::REQUIRED.iter().all(|code| records.contains(&(identity.clone(), *code)))
            })
            .collect();
        complete.sort();
        Ok(complete)
    }
}
