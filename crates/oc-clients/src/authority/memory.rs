//! In-memory client authority for tests and local runs

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::ClientAuthority;
use crate::error::AuthorityError;
use crate::model::RawClientRecord;

/// Map-backed authority. Can be flipped into an "unavailable" mode to simulate
/// a backend outage.
#[derive(Default)]
pub struct InMemoryClientAuthority {
    records: DashMap<String, RawClientRecord>,
    unavailable: AtomicBool,
    lookups: AtomicUsize,
}

impl InMemoryClientAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, record: RawClientRecord) -> Self {
        self.insert(record);
        self
    }

    /// Insert or replace a record, keyed by its client id
    pub fn insert(&self, record: RawClientRecord) {
        self.records.insert(record.client_id.clone(), record);
    }

    /// Insert a record under an explicit key, regardless of its own client id
    pub fn insert_as(&self, client_id: impl Into<String>, record: RawClientRecord) {
        self.records.insert(client_id.into(), record);
    }

    pub fn remove(&self, client_id: &str) -> Option<RawClientRecord> {
        self.records.remove(client_id).map(|(_, record)| record)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of lookups served (including failed ones)
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientAuthority for InMemoryClientAuthority {
    async fn fetch_client_record(
        &self,
        client_id: &str,
    ) -> Result<Option<RawClientRecord>, AuthorityError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AuthorityError::Unavailable(
                "in-memory authority marked unavailable".to_string(),
            ));
        }

        Ok(self.records.get(client_id).map(|entry| entry.value().clone()))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
