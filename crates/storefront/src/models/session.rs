//! Session-related types.
//!
//! The credential issued at login is a JWT kept in client storage. Only its
//! claims are read on the client; verifying the signature is the issuer's job.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Claims carried by the credential token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identifier used as the cart owner key (integer or string).
    #[serde(default)]
    pub id: Option<Value>,
    /// Login email.
    #[serde(default)]
    pub sub: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Expiry as a Unix timestamp.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl Claims {
    /// The subject identifier rendered as a string, if present and non-empty.
    #[must_use]
    pub fn subject_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Whether the token has expired at `now` (Unix seconds).
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp.is_some_and(|exp| exp < now)
    }
}

/// Client storage keys for session data.
pub mod keys {
    /// Key for storing the credential token.
    pub const TOKEN: &str = "token";
}
