//! Account commands: password sign-in, registration and saved addresses.

use secrecy::{ExposeSecret, SecretString};
use shopkart_core::AddressId;
use shopkart_storefront::api::ApiError;
use shopkart_storefront::models::{AddressInput, AddressUpdate, Credentials, Registration};
use shopkart_storefront::state::StorefrontContext;
use shopkart_storefront::storage::ClientStorage;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{CommandError, session};

/// Take the password from the flag, or read one line from stdin.
async fn password(flag: Option<String>) -> Result<SecretString, CommandError> {
    if let Some(password) = flag {
        return Ok(SecretString::from(password));
    }

    tracing::info!("Password:");
    let line = BufReader::new(tokio::io::stdin())
        .lines()
        .next_line()
        .await?
        .unwrap_or_default();
    Ok(SecretString::from(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Sign in with email and password, then store the issued token.
///
/// # Errors
///
/// Returns `CommandError::Form` for unusable input,
/// `CommandError::InvalidCredentials` if the backend rejects them, or any
/// storage or backend error.
pub async fn login<S: ClientStorage>(
    ctx: &mut StorefrontContext<S>,
    email: &str,
    password_flag: Option<String>,
) -> Result<(), CommandError> {
    let credentials = Credentials::new(email, password(password_flag).await?)?;

    let token = match ctx.api().login(&credentials).await {
        Ok(token) => token,
        Err(ApiError::Unauthorized) => return Err(CommandError::InvalidCredentials),
        Err(e) => return Err(e.into()),
    };
    session::login(ctx, token.access_token.expose_secret())
}

/// Create an account.
///
/// # Errors
///
/// Returns `CommandError::Form` for unusable input, or any backend error
/// (such as an email that is already registered).
pub async fn register<S: ClientStorage>(
    ctx: &StorefrontContext<S>,
    name: &str,
    email: &str,
    phone: Option<String>,
    password_flag: Option<String>,
) -> Result<(), CommandError> {
    let registration = Registration::new(name, email, password(password_flag).await?, phone)?;
    let user = ctx.api().register(&registration).await?;
    tracing::info!(
        "Account created for {} <{}>. Sign in with `sk-cli login --email {}`",
        user.name,
        user.email,
        user.email
    );
    Ok(())
}

fn require_sign_in<S: ClientStorage>(
    ctx: &StorefrontContext<S>,
) -> Result<shopkart_storefront::api::ApiClient, CommandError> {
    let api = ctx.api();
    if !api.is_authenticated() {
        return Err(CommandError::NotSignedIn);
    }
    Ok(api)
}

/// List the signed-in user's saved addresses.
///
/// # Errors
///
/// Returns `CommandError::NotSignedIn` for guests, or any backend error.
pub async fn addresses<S: ClientStorage>(ctx: &StorefrontContext<S>) -> Result<(), CommandError> {
    let addresses = require_sign_in(ctx)?.addresses().await?;
    if addresses.is_empty() {
        tracing::info!("No saved addresses");
    }
    for address in addresses {
        tracing::info!("  [{}] {}", address.id, address.label());
    }
    Ok(())
}

/// Save a new address.
///
/// # Errors
///
/// Returns `CommandError::Form` for blank fields, `CommandError::NotSignedIn`
/// for guests, or any backend error.
pub async fn add_address<S: ClientStorage>(
    ctx: &StorefrontContext<S>,
    input: AddressInput,
) -> Result<(), CommandError> {
    input.validate()?;
    let address = require_sign_in(ctx)?.create_address(&input).await?;
    tracing::info!("Saved address [{}] {}", address.id, address.label());
    Ok(())
}

/// Change fields of a saved address.
///
/// # Errors
///
/// Returns `CommandError::Form` for blank fields, `CommandError::NotSignedIn`
/// for guests, or any backend error.
pub async fn update_address<S: ClientStorage>(
    ctx: &StorefrontContext<S>,
    address_id: AddressId,
    update: AddressUpdate,
) -> Result<(), CommandError> {
    if update.is_empty() {
        tracing::warn!("Nothing to change");
        return Ok(());
    }
    update.validate()?;
    let address = require_sign_in(ctx)?
        .update_address(address_id, &update)
        .await?;
    tracing::info!("Updated address [{}] {}", address.id, address.label());
    Ok(())
}

/// Delete a saved address.
///
/// # Errors
///
/// Returns `CommandError::NotSignedIn` for guests, or any backend error.
pub async fn delete_address<S: ClientStorage>(
    ctx: &StorefrontContext<S>,
    address_id: AddressId,
) -> Result<(), CommandError> {
    require_sign_in(ctx)?.delete_address(address_id).await?;
    tracing::info!("Deleted address {address_id}");
    Ok(())
}
