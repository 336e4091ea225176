use super::{claim_live, ClaimOutcome, StateStore};
use crate::domain::{EligibilityRecord, ObjectiveCode, SyncRecord};
use crate::foundation::{Identity, QuestDropError, Result, TransactionId};
use bincode::Options;
use log::{debug, info, trace};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Options as DbOptions, DB};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const CF_SYNC: &str = "sync";
const CF_ELIGIBILITY: &str = "eligibility";
const DB_DIR_NAME: &str = "questdrop-state";

/// Durable state store backed by RocksDB. Records live in two column
/// families keyed by identity (plus objective code for sync records), with
/// bincode values. A single process-wide lock serializes every
/// read-modify-write so the claim methods stay compare-and-set even though
/// RocksDB itself has no transactions here.
pub struct RocksStateStore {
    db: DB,
    claim_lock: Mutex<()>,
}

impl RocksStateStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("opening RocksStateStore path={}", path.display());
        let mut opts = DbOptions::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        let cfs = vec![
            ColumnFamilyDescriptor::new(CF_SYNC, DbOptions::default()),
            ColumnFamilyDescriptor::new(CF_ELIGIBILITY, DbOptions::default()),
        ];
        let db = DB::open_cf_descriptors(&opts, path, cfs).map_err(|err| QuestDropError::StorageError {
            operation: "rocksdb open".to_string(),
            details: err.to_string(),
        })?;
        info!("RocksStateStore opened path={}", path.display());
        Ok(Self { db, claim_lock: Mutex::new(()) })
    }

    pub fn open_in_dir(data_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = data_dir.as_ref();
        fs::create_dir_all(dir).map_err(|err| QuestDropError::StorageError {
            operation: "fs::create_dir_all open_in_dir".to_string(),
            details: err.to_string(),
        })?;
        Self::open(dir.join(DB_DIR_NAME))
    }

    fn lock_claims(&self) -> Result<MutexGuard<'_, ()>> {
        self.claim_lock.lock().map_err(|_| QuestDropError::StorageError {
            operation: "rocks claim lock".to_string(),
            details: "poisoned".to_string(),
        })
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| QuestDropError::StorageError {
            operation: "rocksdb cf_handle".to_string(),
            details: format!("missing column family: {name}"),
        })
    }

    fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        Ok(bincode::DefaultOptions::new().with_fixint_encoding().serialize(value)?)
    }

    fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(bincode::DefaultOptions::new().with_fixint_encoding().deserialize(bytes)?)
    }

    fn key_sync(identity: &Identity, code: ObjectiveCode) -> Vec<u8> {
        let mut key = Vec::with_capacity(identity.as_str().len() + 1 + code.as_str().len());
        key.extend_from_slice(identity.as_str().as_bytes());
        key.push(b':');
        key.extend_from_slice(code.as_str().as_bytes());
        key
    }

    fn key_eligibility(identity: &Identity) -> Vec<u8> {
        identity.as_str().as_bytes().to_vec()
    }

    fn get_record<T: serde::de::DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf_handle(cf_name)?;
        let value = self.db.get_cf(cf, key).map_err(|err| QuestDropError::StorageError {
            operation: format!("rocksdb get_cf {cf_name}"),
            details: err.to_string(),
        })?;
        match value {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_record<T: serde::Serialize>(&self, cf_name: &str, key: &[u8], record: &T) -> Result<()> {
        let cf = self.cf_handle(cf_name)?;
        let value = Self::encode(record)?;
        self.db.put_cf(cf, key, value).map_err(|err| QuestDropError::StorageError {
            operation: format!("rocksdb put_cf {cf_name}"),
            details: err.to_string(),
        })
    }
}

impl StateStore for RocksStateStore {
    fn claim_sync(&self, identity: &Identity, code: ObjectiveCode, now_nanos: u64, ttl_nanos: u64) -> Result<ClaimOutcome> {
        let _guard = self.lock_claims()?;
        let key = Self::key_sync(identity, code);
        let mut record: SyncRecord = self.get_record(CF_SYNC, &key)?.unwrap_or_default();
        if record.synced {
            trace!("claim_sync already synced identity={} objective={}", identity, code);
            return Ok(ClaimOutcome::AlreadyDone { tx_id: record.tx_id });
        }
        if claim_live(record.in_flight_since_nanos, now_nanos, ttl_nanos) {
            return Ok(ClaimOutcome::InFlight);
        }
        let prior = if record.last_attempt_nanos > 0 { Some(record.clone()) } else { None };
        record.in_flight_since_nanos = Some(now_nanos);
        record.last_attempt_nanos = now_nanos;
        self.put_record(CF_SYNC, &key, &record)?;
        Ok(ClaimOutcome::Acquired { prior })
    }

    fn complete_sync(&self, identity: &Identity, code: ObjectiveCode, tx_id: Option<TransactionId>, now_nanos: u64) -> Result<()> {
        let _guard = self.lock_claims()?;
        let key = Self::key_sync(identity, code);
        let mut record: SyncRecord = self.get_record(CF_SYNC, &key)?.unwrap_or_default();
        record.synced = true;
        record.tx_id = tx_id.or(record.tx_id);
        record.in_flight_since_nanos = None;
        record.last_attempt_nanos = now_nanos;
        record.last_error = None;
        debug!("sync recorded identity={} objective={} tx_id={:?}", identity, code, record.tx_id);
        self.put_record(CF_SYNC, &key, &record)
    }

    fn release_sync(&self, identity: &Identity, code: ObjectiveCode, error: &str, now_nanos: u64) -> Result<()> {
        let _guard = self.lock_claims()?;
        let key = Self::key_sync(identity, code);
        let mut record: SyncRecord = self.get_record(CF_SYNC, &key)?.unwrap_or_default();
        record.in_flight_since_nanos = None;
        record.last_attempt_nanos = now_nanos;
        record.last_error = Some(error.to_string());
        self.put_record(CF_SYNC, &key, &record)
    }

    fn get_sync(&self, identity: &Identity, code: ObjectiveCode) -> Result<Option<SyncRecord>> {
        self.get_record(CF_SYNC, &Self::key_sync(identity, code))
    }

    fn claim_airdrop(&self, identity: &Identity, now_nanos: u64, ttl_nanos: u64) -> Result<ClaimOutcome> {
        let _guard = self.lock_claims()?;
        let key = Self::key_eligibility(identity);
        let mut record: EligibilityRecord = self.get_record(CF_ELIGIBILITY, &key)?.unwrap_or_default();
        if record.airdropped {
            trace!("claim_airdrop already airdropped identity={}", identity);
            return Ok(ClaimOutcome::AlreadyDone { tx_id: record.tx_id });
        }
        if claim_live(record.in_flight_since_nanos, now_nanos, ttl_nanos) {
            return Ok(ClaimOutcome::InFlight);
        }
        record.in_flight_since_nanos = Some(now_nanos);
        record.updated_at_nanos = now_nanos;
        self.put_record(CF_ELIGIBILITY, &key, &record)?;
        Ok(ClaimOutcome::Acquired { prior: None })
    }

    fn complete_airdrop(&self, identity: &Identity, tx_id: Option<TransactionId>, now_nanos: u64) -> Result<()> {
        let _guard = self.lock_claims()?;
        let key = Self::key_eligibility(identity);
        let mut record: EligibilityRecord = self.get_record(CF_ELIGIBILITY, &key)?.unwrap_or_default();
        record.airdropped = true;
        record.tx_id = tx_id.or(record.tx_id);
        record.in_flight_since_nanos = None;
        record.updated_at_nanos = now_nanos;
        record.last_error = None;
        debug!("airdrop recorded identity={} tx_id={:?}", identity, record.tx_id);
        self.put_record(CF_ELIGIBILITY, &key, &record)
    }

    fn release_airdrop(&self, identity: &Identity, error: &str, now_nanos: u64) -> Result<()> {
        let _guard = self.lock_claims()?;
        let key = Self::key_eligibility(identity);
        let mut record: EligibilityRecord = self.get_record(CF_ELIGIBILITY, &key)?.unwrap_or_default();
        record.in_flight_since_nanos = None;
        record.updated_at_nanos = now_nanos;
        record.last_error = Some(error.to_string());
        self.put_record(CF_ELIGIBILITY, &key, &record)
    }

    fn get_eligibility(&self, identity: &Identity) -> Result<Option<EligibilityRecord>> {
        self.get_record(CF_ELIGIBILITY, &Self::key_eligibility(identity))
    }

    fn record_eligibility(&self, identity: &Identity, eligible: bool, has_collection: bool, now_nanos: u64) -> Result<()> {
        let _guard = self.lock_claims()?;
        let key = Self::key_eligibility(identity);
        let mut record: EligibilityRecord = self.get_record(CF_ELIGIBILITY, &key)?.unwrap_or_default();
        record.eligible = eligible;
        record.has_collection = has_collection;
        record.updated_at_nanos = now_nanos;
        self.put_record(CF_ELIGIBILITY, &key, &record)
    }

    fn health_check(&self) -> Result<()> {
        self.cf_handle(CF_SYNC)?;
        self.cf_handle(CF_ELIGIBILITY)?;
        Ok(())
    }
}
