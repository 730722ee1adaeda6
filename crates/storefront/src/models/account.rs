//! Account types: sign-in, registration and address forms.
//!
//! Forms are checked on the client before they are sent, with the same
//! rules the backend's sign-up and address pages apply.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use shopkart_core::UserId;
use thiserror::Error;

const MIN_PASSWORD_LEN: usize = 6;
const MIN_NAME_LEN: usize = 3;

/// A form field failed client-side validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("Enter a valid email")]
    InvalidEmail,

    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },
}

fn required(field: &'static str, value: &str) -> Result<(), FormError> {
    if value.trim().is_empty() {
        return Err(FormError::Required(field));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), FormError> {
    required("Email", email)?;
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    });
    if !valid || email.contains(char::is_whitespace) {
        return Err(FormError::InvalidEmail);
    }
    Ok(())
}

fn check_password(password: &SecretString) -> Result<(), FormError> {
    let password = password.expose_secret();
    required("Password", password)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(FormError::TooShort {
            field: "Password",
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

// =============================================================================
// Sign-in and registration
// =============================================================================

/// Email and password for `POST /auth/login`.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    /// # Errors
    ///
    /// Returns `FormError` if the email or password is unusable.
    pub fn new(email: impl Into<String>, password: SecretString) -> Result<Self, FormError> {
        let email = email.into().trim().to_string();
        check_email(&email)?;
        check_password(&password)?;
        Ok(Self { email, password })
    }

    /// Request body. The password is exposed only here.
    #[must_use]
    pub fn body(&self) -> LoginRequest<'_> {
        LoginRequest {
            email: &self.email,
            password: self.password.expose_secret(),
        }
    }
}

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response of a successful sign-in.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawTokenResponse")]
pub struct TokenResponse {
    pub access_token: SecretString,
    pub token_type: String,
}

#[derive(Deserialize)]
struct RawTokenResponse {
    access_token: String,
    token_type: String,
}

impl From<RawTokenResponse> for TokenResponse {
    fn from(raw: RawTokenResponse) -> Self {
        Self {
            access_token: SecretString::from(raw.access_token),
            token_type: raw.token_type,
        }
    }
}

/// New account details for `POST /auth/register`.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub phone: Option<String>,
}

impl Registration {
    /// # Errors
    ///
    /// Returns `FormError` for a short name, bad email or weak password.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: SecretString,
        phone: Option<String>,
    ) -> Result<Self, FormError> {
        let name = name.into().trim().to_string();
        required("Name", &name)?;
        if name.chars().count() < MIN_NAME_LEN {
            return Err(FormError::TooShort {
                field: "Name",
                min: MIN_NAME_LEN,
            });
        }

        let email = email.into().trim().to_string();
        check_email(&email)?;
        check_password(&password)?;

        Ok(Self {
            name,
            email,
            password,
            phone: phone.filter(|p| !p.trim().is_empty()),
        })
    }

    #[must_use]
    pub fn body(&self) -> RegisterRequest<'_> {
        RegisterRequest {
            name: &self.name,
            email: &self.email,
            password: self.password.expose_secret(),
            phone: self.phone.as_deref(),
        }
    }
}

#[derive(Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
}

/// A user account as the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

// =============================================================================
// Addresses
// =============================================================================

/// A new shipping address. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressInput {
    pub alias: String,
    pub address_line1: String,
    pub city: String,
    pub state: String,
    pub zip_code: i64,
}

impl AddressInput {
    /// # Errors
    ///
    /// Returns `FormError::Required` for the first blank field.
    pub fn validate(&self) -> Result<(), FormError> {
        required("Alias", &self.alias)?;
        required("Address line", &self.address_line1)?;
        required("City", &self.city)?;
        required("State", &self.state)
    }
}

/// Partial address update. Only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<i64>,
}

impl AddressUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.alias.is_none()
            && self.address_line1.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.zip_code.is_none()
    }

    /// # Errors
    ///
    /// Returns `FormError::Required` if a field is set to blank text.
    pub fn validate(&self) -> Result<(), FormError> {
        let fields = [
            ("Alias", &self.alias),
            ("Address line", &self.address_line1),
            ("City", &self.city),
            ("State", &self.state),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                required(field, value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s)
    }

    #[test]
    fn test_credentials_validation() {
        assert!(Credentials::new(" asha@shop.test ", secret("hunter22")).is_ok());
        assert_eq!(
            Credentials::new("asha", secret("hunter22")).unwrap_err(),
            FormError::InvalidEmail
        );
        assert_eq!(
            Credentials::new("asha@shop.test", secret("12345")).unwrap_err(),
            FormError::TooShort {
                field: "Password",
                min: 6
            }
        );
        assert_eq!(
            Credentials::new("", secret("hunter22")).unwrap_err(),
            FormError::Required("Email")
        );
    }

    #[test]
    fn test_login_body_exposes_password_only_on_the_wire() {
        let credentials = Credentials::new("asha@shop.test", secret("hunter22")).expect("valid");
        assert!(!format!("{credentials:?}").contains("hunter22"));

        let body = serde_json::to_value(credentials.body()).expect("serialize");
        assert_eq!(
            body,
            serde_json::json!({"email": "asha@shop.test", "password": "hunter22"})
        );
    }

    #[test]
    fn test_registration_rules() {
        assert_eq!(
            Registration::new("Al", "al@shop.test", secret("hunter22"), None).unwrap_err(),
            FormError::TooShort {
                field: "Name",
                min: 3
            }
        );

        let registration =
            Registration::new("Asha", "asha@shop.test", secret("hunter22"), Some(" ".into()))
                .expect("valid");
        let body = serde_json::to_value(registration.body()).expect("serialize");
        assert!(body.get("phone").is_none());
        assert_eq!(body["name"], "Asha");
    }

    #[test]
    fn test_token_response_parses() {
        let token: TokenResponse =
            serde_json::from_str(r#"{"access_token": "a.b.c", "token_type": "bearer"}"#)
                .expect("parse");
        assert_eq!(token.access_token.expose_secret(), "a.b.c");
        assert_eq!(token.token_type, "bearer");
    }

    #[test]
    fn test_address_forms() {
        let mut input = AddressInput {
            alias: "Home".into(),
            address_line1: "12 MG Road".into(),
            city: "Pune".into(),
            state: "MH".into(),
            zip_code: 411_001,
        };
        assert!(input.validate().is_ok());
        input.city = "  ".into();
        assert_eq!(input.validate().unwrap_err(), FormError::Required("City"));

        let update = AddressUpdate {
            city: Some("Mumbai".into()),
            ..AddressUpdate::default()
        };
        assert!(!update.is_empty());
        assert_eq!(
            serde_json::to_value(&update).expect("serialize"),
            serde_json::json!({"city": "Mumbai"})
        );
        assert!(AddressUpdate::default().is_empty());
    }
}
