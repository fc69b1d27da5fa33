//! Password hashing and verification.
//!
//! Hashes are Argon2id PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`),
//! so the salt and the work factor travel with the hash. Raising the work
//! factor only affects new hashes; old ones still verify with their own
//! parameters.

use anyhow::{Context, Result, anyhow};
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;

/// Hashed when the email is unknown so both login failure paths cost the same.
const DUMMY_PASSWORD: &str = "chirpy-dummy-password";

/// Argon2id cost parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkFactor {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for WorkFactor {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CredentialHasher {
    params: Params,
    dummy_hash: String,
}

impl CredentialHasher {
    /// Build a hasher for the given work factor.
    ///
    /// # Errors
    /// Returns an error if Argon2 rejects the parameters.
    pub fn new(work_factor: WorkFactor) -> Result<Self> {
        let params = Params::new(
            work_factor.memory_kib,
            work_factor.iterations,
            work_factor.parallelism,
            None,
        )
        .map_err(|err| anyhow!("invalid Argon2 parameters: {err}"))?;

        let mut hasher = Self {
            params,
            dummy_hash: String::new(),
        };
        hasher.dummy_hash = hasher.hash(DUMMY_PASSWORD)?;
        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a fresh random salt.
    ///
    /// # Errors
    /// Returns an error only if the hasher fails.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|err| anyhow!("failed to hash password: {err}"))?
            .to_string();
        Ok(hash)
    }

    /// Check a password against a stored hash.
    ///
    /// Wrong passwords, empty input and unparsable hashes all return `false`.
    /// Empty input still pays for a full Argon2 run.
    #[must_use]
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        let matches = self
            .argon2()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok();
        matches && !plaintext.is_empty()
    }

    /// Verify against `hash`, or burn the same CPU on the dummy hash when the
    /// account does not exist. Always `false` in the latter case.
    #[must_use]
    pub fn verify_or_dummy(&self, plaintext: &str, hash: Option<&str>) -> bool {
        match hash {
            Some(hash) => self.verify(plaintext, hash),
            None => {
                let _ = self.verify(plaintext, &self.dummy_hash);
                false
            }
        }
    }

    /// [`Self::hash`] on the blocking pool.
    ///
    /// # Errors
    /// Returns an error if hashing fails or the blocking task panics.
    pub async fn hash_blocking(&self, plaintext: String) -> Result<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .context("password hashing task failed")?
    }

    /// [`Self::verify_or_dummy`] on the blocking pool.
    ///
    /// # Errors
    /// Returns an error only if the blocking task panics.
    pub async fn verify_blocking(&self, plaintext: String, hash: Option<String>) -> Result<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify_or_dummy(&plaintext, hash.as_deref()))
            .await
            .context("password verification task failed")
    }
}
