//! Command implementations.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod session;

use shopkart_storefront::api::ApiError;
use shopkart_storefront::error::CheckoutError;
use shopkart_storefront::models::FormError;
use shopkart_storefront::storage::StorageError;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Client storage could not be written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Backend request failed.
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    /// Checkout step rejected or failed. Shown as the user-facing message.
    #[error("{}", .0.user_message())]
    Checkout(#[from] CheckoutError),

    /// Terminal or file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input rejected before it was sent.
    #[error("{0}")]
    Form(#[from] FormError),

    /// The backend rejected the email and password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The product has no such variant.
    #[error("Product {product} has no variant {variant}")]
    UnknownVariant { product: String, variant: String },

    /// The variant cannot be added right now.
    #[error("Variant {0} is out of stock")]
    OutOfStock(String),

    /// The command needs a signed-in user.
    #[error("Not signed in. Run `sk-cli login --email <email>` first.")]
    NotSignedIn,
}
