//! Client Record Types
//!
//! [`RawClientRecord`] is the authority's wire representation of a client
//! registration. [`ClientDetails`] is the validated, normalized value handed
//! to callers.

use std::collections::BTreeSet;
use std::fmt;

use oc_config::ResolverConfig;
use serde::{Deserialize, Deserializer, Serialize};

/// Client registration as stored by the authority.
///
/// Comma-separated fields are kept verbatim; normalization happens in the
/// resolver. The secret is plaintext and must never be logged.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawClientRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub client_id: String,

    #[serde(skip_serializing)]
    pub client_secret: Option<String>,

    /// Comma-separated resource ids, may be empty
    pub resource_ids: Option<String>,

    /// Comma-separated grant types, required
    pub authorized_grant_types: Option<String>,

    /// Comma-separated scopes, required
    pub scope: Option<String>,

    #[serde(alias = "accessTokenValidity")]
    pub access_token_validity_seconds: Option<i64>,

    #[serde(alias = "refreshTokenValidity")]
    pub refresh_token_validity_seconds: Option<i64>,

    /// The authority stores this as a string column (`"true"`, `"false"` or a
    /// scope name); only `"true"` enables auto-approval.
    #[serde(alias = "autoapprove", deserialize_with = "flag_or_string")]
    pub auto_approve: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagOrString {
    Flag(bool),
    Text(String),
}

fn flag_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<FlagOrString>::deserialize(deserializer)? {
        Some(FlagOrString::Flag(flag)) => flag,
        Some(FlagOrString::Text(text)) => text.trim().eq_ignore_ascii_case("true"),
        None => false,
    })
}

impl RawClientRecord {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Default::default()
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn with_resource_ids(mut self, resource_ids: impl Into<String>) -> Self {
        self.resource_ids = Some(resource_ids.into());
        self
    }

    pub fn with_grant_types(mut self, grant_types: impl Into<String>) -> Self {
        self.authorized_grant_types = Some(grant_types.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_access_token_validity(mut self, seconds: i64) -> Self {
        self.access_token_validity_seconds = Some(seconds);
        self
    }

    pub fn with_refresh_token_validity(mut self, seconds: i64) -> Self {
        self.refresh_token_validity_seconds = Some(seconds);
        self
    }

    pub fn with_auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }
}

impl fmt::Debug for RawClientRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawClientRecord")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("resource_ids", &self.resource_ids)
            .field("authorized_grant_types", &self.authorized_grant_types)
            .field("scope", &self.scope)
            .field("access_token_validity_seconds", &self.access_token_validity_seconds)
            .field("refresh_token_validity_seconds", &self.refresh_token_validity_seconds)
            .field("auto_approve", &self.auto_approve)
            .finish()
    }
}

/// Resolved, immutable client registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetails {
    pub(crate) client_id: String,
    pub(crate) hashed_secret: String,
    pub(crate) resource_ids: BTreeSet<String>,
    pub(crate) authorized_grant_types: Vec<String>,
    pub(crate) scope: Vec<String>,
    pub(crate) access_token_validity_seconds: i64,
    pub(crate) refresh_token_validity_seconds: i64,
    pub(crate) auto_approve: bool,
}

impl ClientDetails {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// One-way hash of the client secret (PHC string for the Argon2 hasher)
    pub fn hashed_secret(&self) -> &str {
        &self.hashed_secret
    }

    pub fn resource_ids(&self) -> &BTreeSet<String> {
        &self.resource_ids
    }

    pub fn authorized_grant_types(&self) -> &[String] {
        &self.authorized_grant_types
    }

    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    pub fn access_token_validity_seconds(&self) -> i64 {
        self.access_token_validity_seconds
    }

    pub fn refresh_token_validity_seconds(&self) -> i64 {
        self.refresh_token_validity_seconds
    }

    pub fn is_auto_approve(&self) -> bool {
        self.auto_approve
    }

    pub fn supports_grant_type(&self, grant_type: &str) -> bool {
        self.authorized_grant_types.iter().any(|g| g == grant_type)
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.iter().any(|s| s == scope)
    }

    /// An empty resource set places no restriction on the client.
    pub fn can_access_resource(&self, resource_id: &str) -> bool {
        self.resource_ids.is_empty() || self.resource_ids.contains(resource_id)
    }
}

/// Token lifetimes substituted when a record leaves them unset or non-positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenValidityDefaults {
    pub access_token_seconds: i64,
    pub refresh_token_seconds: i64,
}

impl TokenValidityDefaults {
    /// 12 hours
    pub const ACCESS_TOKEN_SECONDS: i64 = 12 * 60 * 60;
    /// 30 days
    pub const REFRESH_TOKEN_SECONDS: i64 = 30 * 24 * 60 * 60;

    pub fn access(&self, configured: Option<i64>) -> i64 {
        positive_or(configured, self.access_token_seconds)
    }

    pub fn refresh(&self, configured: Option<i64>) -> i64 {
        positive_or(configured, self.refresh_token_seconds)
    }
}

impl Default for TokenValidityDefaults {
    fn default() -> Self {
        Self {
            access_token_seconds: Self::ACCESS_TOKEN_SECONDS,
            refresh_token_seconds: Self::REFRESH_TOKEN_SECONDS,
        }
    }
}

impl From<&ResolverConfig> for TokenValidityDefaults {
    fn from(config: &ResolverConfig) -> Self {
        Self {
            access_token_seconds: config.default_access_token_validity_secs,
            refresh_token_seconds: config.default_refresh_token_validity_secs,
        }
    }
}

fn positive_or(value: Option<i64>, default: i64) -> i64 {
    match value {
        Some(v) if v > 0 => v,
        _ => default,
    }
}

/// Split a comma-separated list, trimming tokens and dropping empty ones.
pub fn split_comma_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
