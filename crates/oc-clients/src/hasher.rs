//! Client Secret Hashing
//!
//! One-way, salted hashing of client secrets. Argon2id is the default backend;
//! anything implementing [`SecretHasher`] can be plugged into the resolver.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use oc_config::HasherConfig;
use tracing::debug;

use crate::error::HashError;

/// Pluggable one-way secret hash
pub trait SecretHasher: Send + Sync {
    /// Hash a plaintext secret. Two calls with the same input must produce
    /// different outputs (salted).
    fn hash(&self, plaintext: &str) -> Result<String, HashError>;

    /// Check a plaintext secret against a hash produced by [`SecretHasher::hash`]
    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError>;

    /// Algorithm identifier, for diagnostics
    fn algorithm(&self) -> &str;
}

/// Argon2id configuration
#[derive(Debug, Clone)]
pub struct Argon2Config {
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Iterations
    pub time_cost: u32,
    pub parallelism: u32,
    /// Output hash length in bytes
    pub output_len: usize,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_cost: 19_456, // 19 MiB
            time_cost: 2,
            parallelism: 1,
            output_len: 32,
        }
    }
}

impl Argon2Config {
    /// Low memory config for tests (fast, not for production)
    pub fn testing() -> Self {
        Self {
            memory_cost: 4096,
            time_cost: 1,
            parallelism: 1,
            output_len: 32,
        }
    }

    fn to_params(&self) -> Result<Params, HashError> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.output_len),
        )
        .map_err(|e| HashError::Configuration(e.to_string()))
    }
}

impl From<&HasherConfig> for Argon2Config {
    fn from(config: &HasherConfig) -> Self {
        Self {
            memory_cost: config.memory_cost_kib,
            time_cost: config.time_cost,
            parallelism: config.parallelism,
            ..Default::default()
        }
    }
}

/// Argon2id secret hasher producing PHC strings (`$argon2id$v=19$...`)
pub struct Argon2SecretHasher {
    argon2: Argon2<'static>,
}

impl Argon2SecretHasher {
    pub fn new(config: Argon2Config) -> Result<Self, HashError> {
        let params = config.to_params()?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        Ok(Self { argon2 })
    }
}

impl SecretHasher for Argon2SecretHasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| HashError::Hash(e.to_string()))?;

        Ok(hash.to_string())
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| HashError::InvalidHash(e.to_string()))?;

        match self.argon2.verify_password(plaintext.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => {
                debug!("Client secret verification failed");
                Ok(false)
            }
            Err(e) => Err(HashError::Hash(e.to_string())),
        }
    }

    fn algorithm(&self) -> &str {
        "argon2id"
    }
}
