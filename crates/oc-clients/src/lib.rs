//! OAuth Client Details Resolution
//!
//! Resolves an OAuth2 client id into an immutable [`ClientDetails`] value:
//!
//! 1. Look the raw record up through a [`ClientAuthority`]
//! 2. Validate required fields (grant types, scope)
//! 3. Normalize comma-separated lists
//! 4. Hash the client secret through a [`SecretHasher`]
//! 5. Fill in token validity defaults
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use oc_clients::{ClientDetailsResolver, HttpClientAuthority};
//!
//! let config = oc_config::AppConfig::load()?;
//! let authority = Arc::new(HttpClientAuthority::new(&config.authority)?);
//! let resolver = ClientDetailsResolver::from_config(authority, &config)?;
//!
//! let details = resolver.resolve("app1").await?;
//! assert!(details.supports_grant_type("password"));
//! ```

pub mod authority;
pub mod error;
pub mod hasher;
pub mod model;
pub mod resolver;

pub use authority::{ApiResponse, ClientAuthority, HttpClientAuthority, InMemoryClientAuthority};
pub use error::{AuthorityError, HashError, ResolveError, Result};
pub use hasher::{Argon2Config, Argon2SecretHasher, SecretHasher};
pub use model::{split_comma_list, ClientDetails, RawClientRecord, TokenValidityDefaults};
pub use resolver::ClientDetailsResolver;
