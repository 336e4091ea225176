mod http;
pub mod retry;

pub use http::HttpLedgerClient;
pub use retry::retry;

use crate::domain::{LedgerEntrypoint, ObjectiveCode};
use crate::foundation::{Identity, QuestDropError, Result, TransactionId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Read-only ledger scripts this core executes. Script sources live with the
/// gateway; we only name them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LedgerQuery {
    /// Aggregate eligibility flag derived on chain from the registrations.
    AirdropEligibility,
    /// Whether the identity has linked the reward-collection capability.
    CollectionCapability,
    /// Whether a specific objective registration has landed. Used for
    /// post-timeout recovery before any resubmission.
    ObjectiveRegistered(ObjectiveCode),
}

impl LedgerQuery {
    pub fn script_id(&self) -> &'static str {
        match self {
            Self::AirdropEligibility => "airdrop_eligibility",
            Self::CollectionCapability => "collection_capability",
            Self::ObjectiveRegistered(ObjectiveCode::Slacker) => "slacker_registered",
            Self::ObjectiveRegistered(ObjectiveCode::Overachiever) => "overachiever_registered",
        }
    }
}

/// On-chain collaborator boundary. Mutations carry the admin authorization the
/// client was constructed with; this core never signs or authors transactions.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn query(&self, query: LedgerQuery, identity: &Identity) -> Result<bool>;

    /// Submit the named entrypoint for `identity`. A duplicate registration or
    /// issuance is rejected by the ledger itself and surfaces as
    /// `AlreadyRegistered` / `AlreadyClaimed`.
    async fn mutate(&self, entrypoint: LedgerEntrypoint, identity: &Identity) -> Result<TransactionId>;

    /// Block until the transaction reaches finality or `deadline` elapses.
    /// Expiry means the outcome is unknown, never that the mutation failed.
    async fn await_sealed(&self, tx_id: &TransactionId, deadline: Duration) -> Result<()>;
}

#[derive(Default)]
struct MockLedgerInner {
    eligible: HashSet<Identity>,
    has_collection: HashSet<Identity>,
    registered: HashSet<(Identity, ObjectiveCode)>,
    airdropped: HashMap<Identity, TransactionId>,
    unsealed: HashSet<TransactionId>,
    fail_queries: Option<String>,
    fail_mutations: Option<String>,
    fail_mutations_for: HashMap<Identity, String>,
    next_tx: u8,
}

/// Scriptable in-memory ledger for tests and local runs. Registrations feed
/// the eligibility flag the way the on-chain contract derives it, duplicate
/// mutations are rejected, and individual transactions can be held unsealed
/// to exercise the timeout path.
pub struct MockLedgerClient {
    inner: Mutex<MockLedgerInner>,
    queries: AtomicU64,
    mutations: AtomicU64,
}

impl MockLedgerClient {
    pub fn new() -> Self {
        Self { inner: Mutex::new(MockLedgerInner::default()), queries: AtomicU64::new(0), mutations: AtomicU64::new(0) }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MockLedgerInner>> {
        self.inner.lock().map_err(|_| QuestDropError::StorageError {
            operation: "mock ledger lock".to_string(),
            details: "poisoned".to_string(),
        })
    }

    pub fn grant_collection(&self, identity: &Identity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.has_collection.insert(identity.clone());
        }
    }

    pub fn set_query_failure(&self, details: impl Into<String>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_queries = Some(details.into());
        }
    }

    pub fn set_mutation_failure(&self, details: impl Into<String>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_mutations = Some(details.into());
        }
    }

    /// Fail mutations for a single identity only; other identities proceed.
    pub fn set_mutation_failure_for(&self, identity: &Identity, details: impl Into<String>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_mutations_for.insert(identity.clone(), details.into());
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_queries = None;
            inner.fail_mutations = None;
            inner.fail_mutations_for.clear();
        }
    }

    /// Keep the next submitted transaction unsealed so `await_sealed` times out.
    pub fn hold_next_seal(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            let next = inner.next_tx.wrapping_add(1);
            inner.unsealed.insert(Self::tx_for(next));
        }
    }

    /// Release every held transaction, as if finality eventually landed.
    pub fn seal_all(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.unsealed.clear();
        }
    }

    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    pub fn mutation_count(&self) -> u64 {
        self.mutations.load(Ordering::Relaxed)
    }

    pub fn is_registered(&self, identity: &Identity, code: ObjectiveCode) -> bool {
        self.inner.lock().map(|inner| inner.registered.contains(&(identity.clone(), code))).unwrap_or(false)
    }

    fn tx_for(counter: u8) -> TransactionId {
        TransactionId::new([counter; 32])
    }

    fn refresh_eligibility(inner: &mut MockLedgerInner, identity: &Identity) {
        let all = ObjectiveCode::REQUIRED.iter().all(|code| inner.registered.contains(&(identity.clone(), *code)));
        if all {
            inner.eligible.insert(identity.clone());
        }
    }
}

impl Default for MockLedgerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerClient for MockLedgerClient {
    async fn query(&self, query: LedgerQuery, identity: &Identity) -> Result<bool> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let inner = self.lock()?;
        if let Some(details) = inner.fail_queries.as_ref() {
            return Err(QuestDropError::LedgerUnavailable { operation: query.script_id().to_string(), details: details.clone() });
        }
        Ok(match query {
            LedgerQuery::AirdropEligibility => inner.eligible.contains(identity),
            LedgerQuery::CollectionCapability => inner.has_collection.contains(identity),
            LedgerQuery::ObjectiveRegistered(code) => inner.registered.contains(&(identity.clone(), code)),
        })
    }

    async fn mutate(&self, entrypoint: LedgerEntrypoint, identity: &Identity) -> Result<TransactionId> {
        self.mutations.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.lock()?;
        if let Some(details) = inner.fail_mutations.as_ref().or_else(|| inner.fail_mutations_for.get(identity)) {
            return Err(QuestDropError::LedgerUnavailable {
                operation: entrypoint.template_id().to_string(),
                details: details.clone(),
            });
        }

        let code = match entrypoint {
            LedgerEntrypoint::RegisterSlacker => Some(ObjectiveCode::Slacker),
            LedgerEntrypoint::RegisterOverachiever => Some(ObjectiveCode::Overachiever),
            LedgerEntrypoint::IssueAirdrop => None,
        };

        match code {
            Some(code) => {
                if inner.registered.contains(&(identity.clone(), code)) {
                    return Err(QuestDropError::AlreadyRegistered {
                        identity: identity.to_string(),
                        objective: code.to_string(),
                    });
                }
                inner.registered.insert((identity.clone(), code));
                Self::refresh_eligibility(&mut inner, identity);
            }
            None => {
                if inner.airdropped.contains_key(identity) {
                    return Err(QuestDropError::AlreadyClaimed { identity: identity.to_string() });
                }
            }
        }

        inner.next_tx = inner.next_tx.wrapping_add(1);
        let tx_id = Self::tx_for(inner.next_tx);
        if code.is_none() {
            inner.airdropped.insert(identity.clone(), tx_id);
        }
        Ok(tx_id)
    }

    async fn await_sealed(&self, tx_id: &TransactionId, deadline: Duration) -> Result<()> {
        let held = self.lock()?.unsealed.contains(tx_id);
        if held {
            return Err(QuestDropError::SealDeadlineExpired {
                tx_id: tx_id.to_string(),
                waited_ms: deadline.as_millis() as u64,
            });
        }
        Ok(())
    }
}
