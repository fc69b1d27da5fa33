//! HS256 access tokens.
//!
//! A token is `base64url(header).base64url(claims).base64url(hmac)` with
//! unpadded URL-safe base64. Verification never touches storage.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use ulid::Ulid;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "HS256";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct AccessTokenHeader {
    alg: String,
    typ: String,
}

impl AccessTokenHeader {
    fn hs256() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessTokenClaims {
    pub iss: String,
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    /// Bad structure, bad encoding, wrong algorithm or signature mismatch.
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("invalid issuer")]
    WrongIssuer,
    #[error("failed to encode token")]
    Encode(#[from] serde_json::Error),
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| TokenError::InvalidSignature)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::InvalidSignature)
}

fn mac(key: &[u8], signing_input: &str) -> Result<HmacSha256, TokenError> {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(key).map_err(|_| TokenError::InvalidSignature)?;
    mac.update(signing_input.as_bytes());
    Ok(mac)
}

/// Sign `claims` with HS256.
///
/// # Errors
/// Returns an error if the header or claims cannot be encoded.
pub fn sign_hs256(key: &[u8], claims: &AccessTokenClaims) -> Result<String, TokenError> {
    let header_b64 = b64e_json(&AccessTokenHeader::hs256())?;
    let claims_b64 = b64e_json(claims)?;
    let signing_input = format!("{header_b64}.{claims_b64}");

    let signature = mac(key, &signing_input)?.finalize().into_bytes();
    let signature_b64 = Base64UrlUnpadded::encode_string(&signature);

    Ok(format!("{signing_input}.{signature_b64}"))
}

/// Verify an HS256 token and return its claims.
///
/// Checks run in a fixed order: structure and signature, then `exp`, then
/// `iss`. A token is valid while `now_unix_seconds < exp`.
///
/// # Errors
/// Returns the first failing check.
pub fn verify_hs256(
    token: &str,
    key: &[u8],
    expected_issuer: &str,
    now_unix_seconds: i64,
) -> Result<AccessTokenClaims, TokenError> {
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(TokenError::InvalidSignature)?;
    let claims_b64 = parts.next().ok_or(TokenError::InvalidSignature)?;
    let sig_b64 = parts.next().ok_or(TokenError::InvalidSignature)?;
    if parts.next().is_some() {
        return Err(TokenError::InvalidSignature);
    }

    let header: AccessTokenHeader = b64d_json(header_b64)?;
    if header.alg != ALGORITHM {
        return Err(TokenError::InvalidSignature);
    }

    let signature =
        Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| TokenError::InvalidSignature)?;
    let signing_input = format!("{header_b64}.{claims_b64}");
    mac(key, &signing_input)?
        .verify_slice(&signature)
        .map_err(|_| TokenError::InvalidSignature)?;

    let claims: AccessTokenClaims = b64d_json(claims_b64)?;
    if claims.exp <= now_unix_seconds {
        return Err(TokenError::Expired);
    }
    if claims.iss != expected_issuer {
        return Err(TokenError::WrongIssuer);
    }

    Ok(claims)
}

/// Issues and verifies access tokens for one signing key and issuer.
pub struct AccessTokenCodec {
    key: SecretString,
    issuer: String,
    ttl_seconds: i64,
}

impl std::fmt::Debug for AccessTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenCodec")
            .field("issuer", &self.issuer)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl AccessTokenCodec {
    /// # Errors
    /// Returns an error if the key is empty or the TTL is not positive.
    pub fn new(
        key: SecretString,
        issuer: impl Into<String>,
        ttl_seconds: i64,
    ) -> anyhow::Result<Self> {
        if key.expose_secret().is_empty() {
            anyhow::bail!("signing key must not be empty");
        }
        if ttl_seconds <= 0 {
            anyhow::bail!("access token TTL must be positive");
        }
        Ok(Self {
            key,
            issuer: issuer.into(),
            ttl_seconds,
        })
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// # Errors
    /// Returns an error if the token cannot be encoded.
    pub fn issue(&self, subject: Uuid) -> Result<String, TokenError> {
        self.issue_at(subject, chrono::Utc::now().timestamp())
    }

    /// Issue a token as if the clock read `now_unix_seconds`.
    ///
    /// # Errors
    /// Returns an error if the token cannot be encoded.
    pub fn issue_at(&self, subject: Uuid, now_unix_seconds: i64) -> Result<String, TokenError> {
        let claims = AccessTokenClaims {
            iss: self.issuer.clone(),
            sub: subject,
            iat: now_unix_seconds,
            exp: now_unix_seconds.saturating_add(self.ttl_seconds),
            jti: Ulid::new().to_string(),
        };
        sign_hs256(self.key.expose_secret().as_bytes(), &claims)
    }

    /// Verify a token and return its subject.
    ///
    /// # Errors
    /// See [`verify_hs256`].
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
            .map(|claims| claims.sub)
    }

    /// # Errors
    /// See [`verify_hs256`].
    pub fn verify_at(
        &self,
        token: &str,
        now_unix_seconds: i64,
    ) -> Result<AccessTokenClaims, TokenError> {
        verify_hs256(
            token,
            self.key.expose_secret().as_bytes(),
            &self.issuer,
            now_unix_seconds,
        )
    }
}
