//! Sign-in state commands.

use shopkart_storefront::error::{clear_sentry_user, set_sentry_user};
use shopkart_storefront::services::Resolution;
use shopkart_storefront::state::StorefrontContext;
use shopkart_storefront::storage::ClientStorage;

use super::CommandError;

/// Store a credential and load the owner's cart, merging the guest cart.
///
/// # Errors
///
/// Returns `CommandError::Storage` if the credential could not be stored.
pub fn login<S: ClientStorage>(
    ctx: &mut StorefrontContext<S>,
    token: &str,
) -> Result<(), CommandError> {
    let resolution = ctx.cart_mut().login(token)?;

    match &resolution {
        Resolution::Authenticated { owner, claims } => {
            set_sentry_user(owner, claims);
            let items = ctx.cart_mut().item_count();
            tracing::info!(
                "Signed in as {} ({} item(s) in cart)",
                claims.name.as_deref().unwrap_or(owner.as_str()),
                items
            );
        }
        Resolution::Expired(_) => {
            tracing::warn!("Token stored, but it has expired. Continuing as guest.");
        }
        Resolution::Malformed(e) => {
            tracing::warn!("Token stored, but it cannot be read ({e}). Continuing as guest.");
        }
        Resolution::Anonymous => tracing::warn!("Empty token. Continuing as guest."),
    }
    Ok(())
}

/// Forget the credential.
///
/// # Errors
///
/// Returns `CommandError::Storage` if the credential could not be removed.
pub fn logout<S: ClientStorage>(ctx: &mut StorefrontContext<S>) -> Result<(), CommandError> {
    ctx.cart_mut().logout()?;
    clear_sentry_user();
    tracing::info!("Signed out");
    Ok(())
}

/// Report the current owner.
pub fn whoami<S: ClientStorage>(ctx: &StorefrontContext<S>) {
    match ctx.cart().resolution() {
        Resolution::Authenticated { owner, claims } => tracing::info!(
            "Signed in as {} <{}> (owner {})",
            claims.name.as_deref().unwrap_or("-"),
            claims.sub.as_deref().unwrap_or("-"),
            owner
        ),
        Resolution::Expired(claims) => tracing::info!(
            "Guest (session for {} has expired)",
            claims.sub.as_deref().unwrap_or("unknown user")
        ),
        Resolution::Malformed(e) => tracing::info!("Guest (stored token unreadable: {e})"),
        Resolution::Anonymous => tracing::info!("Guest"),
    }
}
