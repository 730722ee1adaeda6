//! Cart owner key.

use core::fmt;

/// Identifies whose cart is being read or written.
///
/// Either the subject identifier decoded from the current credential, or the
/// guest sentinel when there is no usable credential. Owner keys are derived
/// on every resolution and never stored on their own; they only appear as
/// part of a storage key (see [`OwnerKey::storage_key`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerKey(String);

impl OwnerKey {
    /// Sentinel owner for anonymous sessions.
    pub const GUEST: &'static str = "guestUser";

    /// Prefix of every persisted cart entry.
    pub const STORAGE_PREFIX: &'static str = "cartItems_";

    /// The anonymous owner.
    #[must_use]
    pub fn guest() -> Self {
        Self(Self::GUEST.to_owned())
    }

    /// Owner for an authenticated subject.
    ///
    /// An empty subject is not an identity and yields the guest owner.
    #[must_use]
    pub fn subject(id: impl Into<String>) -> Self {
        let id = id.into();
        if id.is_empty() {
            Self::guest()
        } else {
            Self(id)
        }
    }

    /// Whether this is the anonymous owner.
    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.0 == Self::GUEST
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage key under which this owner's cart is persisted.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("{}{}", Self::STORAGE_PREFIX, self.0)
    }
}

impl Default for OwnerKey {
    fn default() -> Self {
        Self::guest()
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
