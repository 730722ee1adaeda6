//! Per-owner cart persistence with merge-on-login.
//!
//! # Architecture
//!
//! - The owner is re-resolved from the credential on every call, so a login
//!   or logout elsewhere is picked up by the next operation
//! - The cart for the current owner is read from storage once and kept in
//!   memory; every mutation writes the whole cart back before returning
//! - On the first load for a signed-in owner, any guest cart is appended to
//!   the owner's cart and the guest entry is deleted
//! - Storage failures are logged and the cart is treated as empty
//!
//! # Example
//!
//! ```rust,ignore
//! let mut store = CartStore::new(FileStorage::open(".shopkart")?);
//! store.add_or_increment(CartLineInput::new(product_id, variant_id, price));
//! let count = store.item_count();
//! ```

use rust_decimal::Decimal;
use shopkart_core::{Cart, CartLine, CartLineInput, OwnerKey, ProductId, VariantId};
use tracing::{debug, info, warn};

use crate::services::identity::{self, IdentityResolver, Resolution};
use crate::services::pricing::{OrderSummary, Pricing};
use crate::storage::{ClientStorage, StorageError};

/// The current owner's cart, persisted in client storage.
#[derive(Debug)]
pub struct CartStore<S> {
    storage: S,
    resolver: IdentityResolver,
    loaded: Option<LoadedCart>,
}

#[derive(Debug)]
struct LoadedCart {
    owner: OwnerKey,
    cart: Cart,
    /// The guest lines are already in `cart` but the guest entry could not
    /// be deleted yet.
    pending_guest_delete: bool,
}

impl<S: ClientStorage> CartStore<S> {
    /// Create a store over `storage` with the default resolver.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self::with_resolver(storage, IdentityResolver::new())
    }

    #[must_use]
    pub const fn with_resolver(storage: S, resolver: IdentityResolver) -> Self {
        Self {
            storage,
            resolver,
            loaded: None,
        }
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Resolve the current credential.
    pub fn resolution(&self) -> Resolution {
        self.resolver.resolve(&self.storage)
    }

    /// The owner whose cart operations apply to right now.
    pub fn owner(&self) -> OwnerKey {
        self.resolution().owner_key()
    }

    #[must_use]
    pub const fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    /// Store a credential. The next cart access picks up the new owner and
    /// merges the guest cart into it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the credential could not be written.
    pub fn login(&mut self, token: &str) -> Result<Resolution, StorageError> {
        identity::save_credential(&mut self.storage, token)?;
        let resolution = self.resolution();
        info!(owner = %resolution.owner_key(), "Credential stored");
        Ok(resolution)
    }

    /// Forget the credential. The next cart access uses the guest cart.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the credential could not be removed.
    pub fn logout(&mut self) -> Result<(), StorageError> {
        identity::clear_credential(&mut self.storage)?;
        self.loaded = None;
        info!("Credential cleared");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// The current owner's cart.
    pub fn load(&mut self) -> &Cart {
        &self.current().cart
    }

    pub fn contains(&mut self, product_id: &ProductId, variant_id: &VariantId) -> bool {
        self.load().contains(product_id, variant_id)
    }

    /// Total units in the cart.
    pub fn item_count(&mut self) -> u64 {
        self.load().total_quantity()
    }

    pub fn subtotal(&mut self) -> Decimal {
        self.load().subtotal()
    }

    pub fn summary(&mut self, pricing: &Pricing) -> OrderSummary {
        OrderSummary::for_cart(self.load(), pricing)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a line, or increase the quantity of the matching one.
    pub fn add_or_increment(&mut self, input: CartLineInput) {
        self.mutate(|cart| {
            cart.add_or_increment(input);
            true
        });
    }

    /// Decrease a line by `by`, removing it if nothing would remain.
    ///
    /// Returns `true` if the cart changed.
    pub fn decrement_or_remove(
        &mut self,
        product_id: &ProductId,
        variant_id: &VariantId,
        by: u32,
    ) -> bool {
        self.mutate(|cart| cart.decrement_or_remove(product_id, variant_id, by))
    }

    /// Remove a line. Absent lines are a no-op.
    ///
    /// Returns `true` if the cart changed.
    pub fn remove(&mut self, product_id: &ProductId, variant_id: &VariantId) -> bool {
        self.mutate(|cart| cart.remove(product_id, variant_id))
    }

    /// Empty the cart and delete its storage entry.
    pub fn clear(&mut self) {
        let loaded = self.current();
        loaded.cart.clear();
        let key = loaded.owner.storage_key();

        match self.storage.remove(&key) {
            Ok(()) => self.finish_guest_merge(),
            Err(e) => warn!(key = %key, error = %e, "Failed to delete cart"),
        }
    }

    /// Lines snapshot for code that must not hold the store borrowed.
    pub fn lines(&mut self) -> Vec<CartLine> {
        self.load().lines().to_vec()
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Apply `change` to the current cart and persist it if it reports a
    /// change.
    fn mutate(&mut self, change: impl FnOnce(&mut Cart) -> bool) -> bool {
        let changed = change(&mut self.current().cart);
        if changed {
            self.persist();
        }
        changed
    }

    /// The loaded cart for the current owner, loading it if the owner changed.
    fn current(&mut self) -> &mut LoadedCart {
        let owner = self.owner();
        let loaded = match self.loaded.take() {
            Some(loaded) if loaded.owner == owner => loaded,
            _ => self.load_for(owner),
        };
        self.loaded.insert(loaded)
    }

    fn load_for(&mut self, owner: OwnerKey) -> LoadedCart {
        let mut cart = self.read(&owner);
        let unmerged = |cart| LoadedCart {
            owner: owner.clone(),
            cart,
            pending_guest_delete: false,
        };

        if owner.is_guest() {
            debug!(lines = cart.len(), "Loaded guest cart");
            return unmerged(cart);
        }

        let guest_cart = self.read(&OwnerKey::guest());
        if guest_cart.is_empty() {
            debug!(owner = %owner, lines = cart.len(), "Loaded cart");
            return unmerged(cart);
        }

        let merged_lines = guest_cart.len();
        cart.append(guest_cart);
        info!(owner = %owner, merged_lines, lines = cart.len(), "Merged guest cart");

        // The guest entry goes only once the merged cart is stored under the
        // owner; until then it is the sole stored copy of those lines.
        let pending_guest_delete = match self.write(&owner, &cart) {
            Ok(()) => !self.delete_guest_entry(),
            Err(e) => {
                warn!(owner = %owner, error = %e, "Failed to persist merged cart");
                true
            }
        };

        LoadedCart {
            owner,
            cart,
            pending_guest_delete,
        }
    }

    /// Delete the guest entry after a successful owner write, if a merge is
    /// still waiting on it.
    fn finish_guest_merge(&mut self) {
        let pending = self
            .loaded
            .as_ref()
            .is_some_and(|loaded| loaded.pending_guest_delete);
        if pending && self.delete_guest_entry() {
            if let Some(loaded) = self.loaded.as_mut() {
                loaded.pending_guest_delete = false;
            }
        }
    }

    fn delete_guest_entry(&mut self) -> bool {
        match self.storage.remove(&OwnerKey::guest().storage_key()) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to delete merged guest cart");
                false
            }
        }
    }

    fn read(&self, owner: &OwnerKey) -> Cart {
        let key = owner.storage_key();
        let raw = match self.storage.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Cart::new(),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read cart, using empty cart");
                return Cart::new();
            }
        };

        match serde_json::from_str::<Vec<CartLine>>(&raw) {
            Ok(lines) => Cart::from_lines(lines),
            Err(e) => {
                warn!(key = %key, error = %e, "Corrupt cart entry, using empty cart");
                Cart::new()
            }
        }
    }

    fn write(&mut self, owner: &OwnerKey, cart: &Cart) -> Result<(), StorageError> {
        let json = serde_json::to_string(cart).unwrap_or_else(|_| "[]".to_string());
        self.storage.set(&owner.storage_key(), &json)
    }

    fn persist(&mut self) {
        let Some(loaded) = self.loaded.take() else {
            return;
        };
        let written = self.write(&loaded.owner, &loaded.cart);
        if let Err(e) = &written {
            warn!(owner = %loaded.owner, error = %e, "Failed to persist cart");
        }
        self.loaded = Some(loaded);

        if written.is_ok() {
            self.finish_guest_merge();
        }
    }
}
