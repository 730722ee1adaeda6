//! Cart owner resolution from the stored credential.
//!
//! The credential is a JWT issued by the backend at login. The client only
//! reads the claims; verifying the signature is the issuer's job. Anything
//! that prevents reading a subject identifier resolves to the guest owner.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use secrecy::{ExposeSecret, SecretString};
use shopkart_core::OwnerKey;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Claims;
use crate::models::session::keys;
use crate::storage::{ClientStorage, StorageError};

/// Why a credential could not be turned into an identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("credential has no payload segment")]
    MissingPayload,

    #[error("credential payload is not base64url: {0}")]
    Encoding(String),

    #[error("credential claims are not valid JSON: {0}")]
    Claims(String),

    #[error("credential has no subject identifier")]
    MissingSubject,

    #[error("credential could not be read: {0}")]
    Unreadable(String),
}

/// Outcome of resolving the current credential.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// No credential is stored.
    Anonymous,
    /// A credential is stored but cannot be decoded.
    Malformed(IdentityError),
    /// The credential decoded but its `exp` has passed.
    Expired(Claims),
    /// A usable credential.
    Authenticated {
        owner: OwnerKey,
        claims: Claims,
    },
}

impl Resolution {
    /// The cart owner for this resolution. Everything except an
    /// authenticated credential is the guest.
    #[must_use]
    pub fn owner_key(&self) -> OwnerKey {
        match self {
            Self::Authenticated { owner, .. } => owner.clone(),
            _ => OwnerKey::guest(),
        }
    }

    /// Claims of an authenticated credential.
    #[must_use]
    pub const fn claims(&self) -> Option<&Claims> {
        match self {
            Self::Authenticated { claims, .. } => Some(claims),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Source of "now" for expiry checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    #[default]
    System,
    /// Fixed Unix timestamp, in seconds.
    Fixed(i64),
}

impl Clock {
    fn now(self) -> i64 {
        match self {
            Self::System => chrono::Utc::now().timestamp(),
            Self::Fixed(now) => now,
        }
    }
}

/// Derives the cart owner from the credential in client storage.
///
/// Resolution has no side effects and can be repeated freely.
#[derive(Clone, Default)]
pub struct IdentityResolver {
    clock: Clock,
    token_override: Option<SecretString>,
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("clock", &self.clock)
            .field("token_override", &self.token_override.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl IdentityResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `clock` for expiry checks.
    #[must_use]
    pub const fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Resolve `token` instead of whatever is in storage.
    #[must_use]
    pub fn with_token_override(mut self, token: SecretString) -> Self {
        self.token_override = Some(token);
        self
    }

    /// The raw credential in effect: the override if set, else the stored
    /// token. Unreadable storage counts as no credential.
    #[must_use]
    pub fn credential<S: ClientStorage>(&self, storage: &S) -> Option<SecretString> {
        if let Some(token) = &self.token_override {
            return Some(token.clone());
        }
        match storage.get(keys::TOKEN) {
            Ok(token) => token.filter(|t| !t.is_empty()).map(SecretString::from),
            Err(e) => {
                warn!(error = %e, "Failed to read credential");
                None
            }
        }
    }

    /// Resolve the credential in effect.
    pub fn resolve<S: ClientStorage>(&self, storage: &S) -> Resolution {
        if let Some(token) = &self.token_override {
            return self.resolve_token(token.expose_secret());
        }

        match storage.get(keys::TOKEN) {
            Ok(Some(token)) if !token.is_empty() => self.resolve_token(&token),
            Ok(_) => Resolution::Anonymous,
            Err(e) => {
                warn!(error = %e, "Credential unreadable, resolving as guest");
                Resolution::Malformed(IdentityError::Unreadable(e.to_string()))
            }
        }
    }

    /// Resolve a raw credential.
    pub fn resolve_token(&self, token: &str) -> Resolution {
        let claims = match decode_claims(token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(error = %e, "Malformed credential, resolving as guest");
                return Resolution::Malformed(e);
            }
        };

        if claims.is_expired_at(self.clock.now()) {
            debug!(exp = ?claims.exp, "Credential expired, resolving as guest");
            return Resolution::Expired(claims);
        }

        match claims.subject_id() {
            Some(id) => Resolution::Authenticated {
                owner: OwnerKey::subject(id),
                claims,
            },
            None => {
                warn!("Credential has no subject, resolving as guest");
                Resolution::Malformed(IdentityError::MissingSubject)
            }
        }
    }

    /// Shorthand for `resolve(storage).owner_key()`.
    pub fn owner_key<S: ClientStorage>(&self, storage: &S) -> OwnerKey {
        self.resolve(storage).owner_key()
    }
}

/// Decode the claims segment of a JWT without verifying it.
///
/// Accepts padded input and the standard base64 alphabet as well as base64url.
///
/// # Errors
///
/// Returns `IdentityError` if the payload segment is missing or undecodable.
pub fn decode_claims(token: &str) -> Result<Claims, IdentityError> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|p| !p.is_empty())
        .ok_or(IdentityError::MissingPayload)?;

    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD
        .decode(normalized)
        .map_err(|e| IdentityError::Encoding(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| IdentityError::Claims(e.to_string()))
}

/// Store a credential, replacing any previous one.
///
/// # Errors
///
/// Returns `StorageError` if the token could not be written.
pub fn save_credential<S: ClientStorage>(storage: &mut S, token: &str) -> Result<(), StorageError> {
    storage.set(keys::TOKEN, token.trim())
}

/// Forget the stored credential.
///
/// # Errors
///
/// Returns `StorageError` if the token could not be removed.
pub fn clear_credential<S: ClientStorage>(storage: &mut S) -> Result<(), StorageError> {
    storage.remove(keys::TOKEN)
}

/// Build an unsigned token carrying `claims`, for tests.
#[cfg(test)]
pub(crate) fn test_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::storage::MemoryStorage;

    fn resolver() -> IdentityResolver {
        IdentityResolver::new().with_clock(Clock::Fixed(1_700_000_000))
    }

    #[test]
    fn test_no_token_is_guest() {
        let storage = MemoryStorage::new();
        let resolution = resolver().resolve(&storage);
        assert_eq!(resolution, Resolution::Anonymous);
        assert!(resolution.owner_key().is_guest());
    }

    #[test]
    fn test_valid_token_yields_subject() {
        let mut storage = MemoryStorage::new();
        let token = test_token(&json!({"sub": "asha@example.com", "name": "Asha", "id": 42, "exp": 1_800_000_000}));
        save_credential(&mut storage, &token).unwrap();

        let resolution = resolver().resolve(&storage);
        assert!(resolution.is_authenticated());
        assert_eq!(resolution.owner_key().as_str(), "42");
        assert_eq!(resolution.claims().unwrap().name.as_deref(), Some("Asha"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut storage = MemoryStorage::new();
        save_credential(&mut storage, &test_token(&json!({"id": "u-7"}))).unwrap();
        let resolver = resolver();
        assert_eq!(resolver.resolve(&storage), resolver.resolve(&storage));
    }

    #[test]
    fn test_malformed_tokens_are_guest() {
        let resolver = resolver();
        for token in ["garbage", "a.%%%.c", "a.bm90IGpzb24.c", "a..c"] {
            let resolution = resolver.resolve_token(token);
            assert!(
                matches!(resolution, Resolution::Malformed(_)),
                "{token}: {resolution:?}"
            );
            assert!(resolution.owner_key().is_guest());
        }
    }

    #[test]
    fn test_missing_subject_is_guest() {
        let resolution = resolver().resolve_token(&test_token(&json!({"sub": "a@b.c"})));
        assert_eq!(
            resolution,
            Resolution::Malformed(IdentityError::MissingSubject)
        );
    }

    #[test]
    fn test_expired_token_is_guest() {
        let resolution = resolver().resolve_token(&test_token(&json!({"id": 42, "exp": 1_600_000_000})));
        assert!(matches!(resolution, Resolution::Expired(_)));
        assert!(resolution.owner_key().is_guest());
    }

    #[test]
    fn test_padded_payload_decodes() {
        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let payload = base64::engine::general_purpose::STANDARD.encode(br#"{"id":1}"#);
        let claims = decode_claims(&format!("{header}.{payload}.sig")).unwrap();
        assert_eq!(claims.subject_id().as_deref(), Some("1"));
    }

    #[test]
    fn test_override_wins_over_storage() {
        let mut storage = MemoryStorage::new();
        save_credential(&mut storage, &test_token(&json!({"id": 1}))).unwrap();

        let resolver = resolver().with_token_override(SecretString::from(test_token(&json!({"id": 2}))));
        assert_eq!(resolver.owner_key(&storage).as_str(), "2");
        assert!(resolver.credential(&storage).is_some());
    }

    #[test]
    fn test_clear_credential() {
        let mut storage = MemoryStorage::new();
        save_credential(&mut storage, &test_token(&json!({"id": 1}))).unwrap();
        clear_credential(&mut storage).unwrap();
        assert_eq!(resolver().resolve(&storage), Resolution::Anonymous);
        assert!(resolver().credential(&storage).is_none());
    }
}
