//! Client Authority Collaborators
//!
//! The authority is the external system of record for client registrations.
//! Transport, wire protocol and retries belong to the implementation; the
//! resolver only sees a record, an absent record, or an [`AuthorityError`].

use async_trait::async_trait;

use crate::error::AuthorityError;
use crate::model::RawClientRecord;

mod http;
mod memory;

pub use http::{ApiResponse, HttpClientAuthority};
pub use memory::InMemoryClientAuthority;

/// Lookup of raw client records by client id
#[async_trait]
pub trait ClientAuthority: Send + Sync {
    /// Fetch the record for `client_id`. `Ok(None)` means the authority has no
    /// such client.
    async fn fetch_client_record(
        &self,
        client_id: &str,
    ) -> Result<Option<RawClientRecord>, AuthorityError>;

    /// Authority name, for diagnostics
    fn name(&self) -> &str;
}
