//! Domain and wire models for the storefront client.

pub mod account;
pub mod catalog;
pub mod inventory;
pub mod order;
pub mod payment;
pub mod session;

pub use account::{
    AddressInput, AddressUpdate, Credentials, FormError, Registration, TokenResponse, UserProfile,
};
pub use catalog::{Category, Product, ProductQuery, ProductVariant};
pub use inventory::{VariantLookupRequest, VariantStock};
pub use order::{Address, OrderDraft, OrderHistory, OrderLine, OrderRecord};
pub use payment::{PaymentIntent, PaymentIntentRequest, PaymentProof};
pub use session::{Claims, keys as session_keys};
