//! Client Details Resolver
//!
//! One lookup-and-transform pipeline: fetch the raw record from the authority,
//! validate required fields, normalize comma lists, hash the secret and fill
//! in token validity defaults.
//!
//! The resolver keeps no state besides handles to its collaborators, so a
//! single instance can be shared across tasks. It never retries; retry policy
//! belongs to the authority transport.

use std::sync::Arc;

use oc_config::AppConfig;
use tracing::{debug, info, warn};

use crate::authority::ClientAuthority;
use crate::error::{HashError, ResolveError, Result};
use crate::hasher::{Argon2Config, Argon2SecretHasher, SecretHasher};
use crate::model::{split_comma_list, ClientDetails, RawClientRecord, TokenValidityDefaults};

pub struct ClientDetailsResolver {
    authority: Arc<dyn ClientAuthority>,
    hasher: Arc<dyn SecretHasher>,
    validity: TokenValidityDefaults,
}

impl ClientDetailsResolver {
    pub fn new(
        authority: Arc<dyn ClientAuthority>,
        hasher: Arc<dyn SecretHasher>,
        validity: TokenValidityDefaults,
    ) -> Self {
        Self { authority, hasher, validity }
    }

    /// Build a resolver with an Argon2id hasher and validity defaults taken
    /// from `config`.
    pub fn from_config(
        authority: Arc<dyn ClientAuthority>,
        config: &AppConfig,
    ) -> std::result::Result<Self, HashError> {
        let hasher = Argon2SecretHasher::new(Argon2Config::from(&config.hasher))?;
        info!(
            algorithm = hasher.algorithm(),
            memory_cost_kib = config.hasher.memory_cost_kib,
            time_cost = config.hasher.time_cost,
            "Client secret hasher configured"
        );
        Ok(Self::new(
            authority,
            Arc::new(hasher),
            TokenValidityDefaults::from(&config.resolver),
        ))
    }

    pub fn validity_defaults(&self) -> TokenValidityDefaults {
        self.validity
    }

    /// Resolve a client id into validated, normalized client details.
    pub async fn resolve(&self, client_id: &str) -> Result<ClientDetails> {
        if client_id.trim().is_empty() {
            return Err(ResolveError::InvalidClientId);
        }

        debug!(client_id, authority = self.authority.name(), "Resolving client details");

        let record = match self.authority.fetch_client_record(client_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!(client_id, "Client not found");
                return Err(ResolveError::client_not_found(client_id));
            }
            Err(e) => {
                warn!(client_id, error = %e, "Client authority unavailable");
                return Err(ResolveError::authority_unavailable(client_id, e));
            }
        };

        self.build_details(client_id, record)
    }

    /// Check a presented secret against resolved details.
    pub fn verify_secret(
        &self,
        details: &ClientDetails,
        plaintext: &str,
    ) -> std::result::Result<bool, HashError> {
        self.hasher.verify(plaintext, details.hashed_secret())
    }

    fn build_details(&self, client_id: &str, record: RawClientRecord) -> Result<ClientDetails> {
        let RawClientRecord {
            client_id: record_client_id,
            client_secret,
            resource_ids,
            authorized_grant_types,
            scope,
            access_token_validity_seconds,
            refresh_token_validity_seconds,
            auto_approve,
        } = record;

        // Validation runs to completion before the secret is touched.
        if record_client_id.trim().is_empty() {
            return Err(invalid(client_id, "clientId"));
        }
        let authorized_grant_types = required_list(client_id, authorized_grant_types, "authorizedGrantTypes")?;
        let scope = required_list(client_id, scope, "scope")?;
        let resource_ids = resource_ids
            .as_deref()
            .map(split_comma_list)
            .unwrap_or_default()
            .into_iter()
            .collect();

        let hashed_secret = self
            .hasher
            .hash(client_secret.as_deref().unwrap_or_default())
            .map_err(|source| ResolveError::Hashing {
                client_id: client_id.to_string(),
                source,
            })?;

        Ok(ClientDetails {
            client_id: record_client_id.trim().to_string(),
            hashed_secret,
            resource_ids,
            authorized_grant_types,
            scope,
            access_token_validity_seconds: self.validity.access(access_token_validity_seconds),
            refresh_token_validity_seconds: self.validity.refresh(refresh_token_validity_seconds),
            auto_approve,
        })
    }
}

fn required_list(client_id: &str, value: Option<String>, field: &'static str) -> Result<Vec<String>> {
    let tokens = value.as_deref().map(split_comma_list).unwrap_or_default();
    if tokens.is_empty() {
        return Err(invalid(client_id, field));
    }
    Ok(tokens)
}

fn invalid(client_id: &str, field: &'static str) -> ResolveError {
    warn!(client_id, field, "Invalid client record");
    ResolveError::invalid_record(client_id, field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::InMemoryClientAuthority;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    /// Wraps the Argon2 hasher and counts hash calls
    struct CountingHasher {
        inner: Argon2SecretHasher,
        hashes: AtomicUsize,
    }

    impl CountingHasher {
        fn new() -> Self {
            Self {
                inner: Argon2SecretHasher::new(Argon2Config::testing()).unwrap(),
                hashes: AtomicUsize::new(0),
            }
        }

        fn count(&self) -> usize {
            self.hashes.load(Ordering::SeqCst)
        }
    }

    impl SecretHasher for CountingHasher {
        fn hash(&self, plaintext: &str) -> std::result::Result<String, HashError> {
            self.hashes.fetch_add(1, Ordering::SeqCst);
            self.inner.hash(plaintext)
        }

        fn verify(&self, plaintext: &str, hash: &str) -> std::result::Result<bool, HashError> {
            self.inner.verify(plaintext, hash)
        }

        fn algorithm(&self) -> &str {
            "counting-argon2id"
        }
    }

    struct FailingHasher;

    impl SecretHasher for FailingHasher {
        fn hash(&self, _plaintext: &str) -> std::result::Result<String, HashError> {
            Err(HashError::Hash("backend offline".to_string()))
        }

        fn verify(&self, _plaintext: &str, _hash: &str) -> std::result::Result<bool, HashError> {
            Err(HashError::Hash("backend offline".to_string()))
        }

        fn algorithm(&self) -> &str {
            "failing"
        }
    }

    fn app1() -> RawClientRecord {
        RawClientRecord::new("app1")
            .with_secret("pw1")
            .with_resource_ids("")
            .with_grant_types("password,refresh_token")
            .with_scope("read")
            .with_access_token_validity(0)
    }

    fn setup(records: Vec<RawClientRecord>) -> (ClientDetailsResolver, Arc<InMemoryClientAuthority>, Arc<CountingHasher>) {
        let authority = Arc::new(InMemoryClientAuthority::new());
        for record in records {
            authority.insert(record);
        }
        let hasher = Arc::new(CountingHasher::new());
        let resolver = ClientDetailsResolver::new(
            authority.clone(),
            hasher.clone(),
            TokenValidityDefaults::default(),
        );
        (resolver, authority, hasher)
    }

    #[tokio::test]
    async fn test_resolves_reference_example() {
        let (resolver, _, _) = setup(vec![app1()]);

        let details = assert_ok!(resolver.resolve("app1").await);

        assert_eq!(details.client_id(), "app1");
        assert!(details.resource_ids().is_empty());
        assert_eq!(details.authorized_grant_types(), ["password", "refresh_token"]);
        assert_eq!(details.scope(), ["read"]);
        assert_eq!(details.access_token_validity_seconds(), 43_200);
        assert_eq!(details.refresh_token_validity_seconds(), 2_592_000);
        assert!(!details.is_auto_approve());
        assert_ne!(details.hashed_secret(), "pw1");
        assert!(resolver.verify_secret(&details, "pw1").unwrap());
        assert!(!resolver.verify_secret(&details, "pw2").unwrap());
    }

    #[tokio::test]
    async fn test_normalizes_lists() {
        let record = RawClientRecord::new("app2")
            .with_secret("pw2")
            .with_resource_ids(" orders-api, ,billing-api ,orders-api")
            .with_grant_types(" authorization_code ,, refresh_token ")
            .with_scope("write, read ,")
            .with_auto_approve(true);
        let (resolver, _, _) = setup(vec![record]);

        let details = resolver.resolve("app2").await.unwrap();

        assert_eq!(details.authorized_grant_types(), ["authorization_code", "refresh_token"]);
        assert_eq!(details.scope(), ["write", "read"]);
        assert_eq!(details.resource_ids().len(), 2);
        assert!(details.can_access_resource("billing-api"));
        assert!(!details.can_access_resource("admin-api"));
        assert!(details.is_auto_approve());
    }

    #[tokio::test]
    async fn test_validity_passthrough_and_defaults() {
        let positive = app1()
            .with_access_token_validity(3600)
            .with_refresh_token_validity(7200);
        let negative = RawClientRecord::new("neg")
            .with_secret("x")
            .with_grant_types("client_credentials")
            .with_scope("read")
            .with_access_token_validity(-1)
            .with_refresh_token_validity(0);
        let (resolver, _, _) = setup(vec![positive, negative]);

        let details = resolver.resolve("app1").await.unwrap();
        assert_eq!(details.access_token_validity_seconds(), 3600);
        assert_eq!(details.refresh_token_validity_seconds(), 7200);

        let details = resolver.resolve("neg").await.unwrap();
        assert_eq!(details.access_token_validity_seconds(), 43_200);
        assert_eq!(details.refresh_token_validity_seconds(), 2_592_000);
    }

    #[tokio::test]
    async fn test_configured_validity_defaults() {
        let authority = Arc::new(InMemoryClientAuthority::new().with_record(app1()));
        let defaults = TokenValidityDefaults {
            access_token_seconds: 600,
            refresh_token_seconds: 1200,
        };
        let resolver = ClientDetailsResolver::new(authority, Arc::new(CountingHasher::new()), defaults);

        let details = resolver.resolve("app1").await.unwrap();
        assert_eq!(details.access_token_validity_seconds(), 600);
        assert_eq!(details.refresh_token_validity_seconds(), 1200);
    }

    #[tokio::test]
    async fn test_missing_grant_types_is_invalid_without_hashing() {
        let record = RawClientRecord::new("app1").with_secret("pw1").with_scope("read");
        let (resolver, _, hasher) = setup(vec![record]);

        let err = assert_err!(resolver.resolve("app1").await);
        assert!(matches!(
            err,
            ResolveError::InvalidRecord { ref client_id, field: "authorizedGrantTypes" } if client_id == "app1"
        ));
        assert_eq!(hasher.count(), 0);
    }

    #[tokio::test]
    async fn test_blank_scope_is_invalid_without_hashing() {
        let record = RawClientRecord::new("app1")
            .with_secret("pw1")
            .with_grant_types("password")
            .with_scope(" , ");
        let (resolver, _, hasher) = setup(vec![record]);

        let err = resolver.resolve("app1").await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidRecord { field: "scope", .. }));
        assert_eq!(hasher.count(), 0);
    }

    #[tokio::test]
    async fn test_record_without_client_id_is_invalid() {
        let (resolver, authority, hasher) = setup(vec![]);
        let mut record = app1();
        record.client_id = " ".to_string();
        authority.insert_as("app1", record);

        let err = resolver.resolve("app1").await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidRecord { field: "clientId", .. }));
        assert_eq!(hasher.count(), 0);
    }

    #[tokio::test]
    async fn test_absent_record_is_not_found() {
        let (resolver, authority, hasher) = setup(vec![app1()]);

        let err = resolver.resolve("ghost").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.client_id(), Some("ghost"));
        assert_eq!(authority.lookup_count(), 1);
        assert_eq!(hasher.count(), 0);
    }

    #[tokio::test]
    async fn test_authority_failure_is_unavailable_and_not_retried() {
        let (resolver, authority, _) = setup(vec![app1()]);
        authority.set_unavailable(true);

        let err = resolver.resolve("app1").await.unwrap_err();
        assert!(matches!(err, ResolveError::AuthorityUnavailable { .. }));
        assert!(err.is_retryable());
        assert_eq!(authority.lookup_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_client_id_skips_authority() {
        let (resolver, authority, _) = setup(vec![app1()]);

        let err = resolver.resolve("").await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidClientId));
        assert_eq!(authority.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_hashing_failure_is_surfaced() {
        let authority = Arc::new(InMemoryClientAuthority::new().with_record(app1()));
        let resolver = ClientDetailsResolver::new(
            authority,
            Arc::new(FailingHasher),
            TokenValidityDefaults::default(),
        );

        let err = resolver.resolve("app1").await.unwrap_err();
        assert!(matches!(err, ResolveError::Hashing { .. }));
        assert!(!err.to_string().contains("pw1"));
    }

    #[tokio::test]
    async fn test_repeated_resolution_differs_only_in_hash() {
        let (resolver, _, _) = setup(vec![app1()]);

        let first = resolver.resolve("app1").await.unwrap();
        let second = resolver.resolve("app1").await.unwrap();

        assert_ne!(first.hashed_secret(), second.hashed_secret());
        assert_eq!(first.authorized_grant_types(), second.authorized_grant_types());
        assert_eq!(first.scope(), second.scope());
        assert_eq!(first.resource_ids(), second.resource_ids());
        assert_eq!(first.access_token_validity_seconds(), second.access_token_validity_seconds());
        assert!(resolver.verify_secret(&first, "pw1").unwrap());
        assert!(resolver.verify_secret(&second, "pw1").unwrap());
    }

    #[tokio::test]
    async fn test_missing_secret_hashes_empty_string() {
        let mut record = app1();
        record.client_secret = None;
        let (resolver, _, hasher) = setup(vec![record]);

        let details = resolver.resolve("app1").await.unwrap();
        assert!(resolver.verify_secret(&details, "").unwrap());
        assert_eq!(hasher.count(), 1);
    }

    #[tokio::test]
    async fn test_from_config() {
        let mut config = AppConfig::default();
        config.hasher.memory_cost_kib = 4096;
        config.hasher.time_cost = 1;
        config.resolver.default_access_token_validity_secs = 120;

        let authority = Arc::new(InMemoryClientAuthority::new().with_record(app1()));
        let resolver = ClientDetailsResolver::from_config(authority, &config).unwrap();
        assert_eq!(resolver.validity_defaults().access_token_seconds, 120);

        let details = resolver.resolve("app1").await.unwrap();
        assert_eq!(details.access_token_validity_seconds(), 120);
        assert!(details.hashed_secret().starts_with("$argon2id$"));
    }

    #[test]
    fn test_resolver_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClientDetailsResolver>();
    }
}
