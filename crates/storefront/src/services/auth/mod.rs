//! Authentication service.
//!
//! Wraps the remote auth endpoints: registration, password sign-in,
//! sign-out, and current-user lookup. Credentials live entirely on the
//! remote service; this layer validates input locally, maps remote errors
//! into the storefront taxonomy, and shapes sessions for the cookie store.

mod error;

pub use error::AuthError;

use rewear_core::Email;

use crate::models::{CurrentUser, SessionAuth};
use crate::supabase::{SignUpOutcome, SupabaseClient, SupabaseError, UserMetadata};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Result of a registration attempt.
#[derive(Debug)]
pub enum RegisterOutcome {
    /// The remote project auto-confirms; the user is signed in.
    SignedIn(Box<SessionAuth>),
    /// The user must confirm their email before signing in.
    ConfirmationRequired,
}

/// Authentication service.
pub struct AuthService<'a> {
    supabase: &'a SupabaseClient,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(supabase: &'a SupabaseClient) -> Self {
        Self { supabase }
    }

    /// Register a new user with email, password, and profile metadata.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        username: &str,
        full_name: Option<String>,
    ) -> Result<RegisterOutcome, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let metadata = UserMetadata {
            username: Some(username.to_owned()),
            full_name,
        };

        let outcome = self
            .supabase
            .auth()
            .sign_up(email.as_str(), password, &metadata)
            .await
            .map_err(map_sign_up_error)?;

        match outcome {
            SignUpOutcome::Session(session) => {
                let auth = SessionAuth::from_auth_session(session).ok_or(AuthError::MissingEmail)?;
                Ok(RegisterOutcome::SignedIn(Box::new(auth)))
            }
            SignUpOutcome::ConfirmationRequired(_) => Ok(RegisterOutcome::ConfirmationRequired),
        }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionAuth, AuthError> {
        let email = Email::parse(email)?;

        let session = self
            .supabase
            .auth()
            .sign_in_with_password(email.as_str(), password)
            .await
            .map_err(map_sign_in_error)?;

        SessionAuth::from_auth_session(session).ok_or(AuthError::MissingEmail)
    }

    /// Revoke the remote session.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote revocation fails; callers clear the
    /// local session regardless.
    pub async fn logout(&self, access_token: &str) -> Result<(), AuthError> {
        self.supabase.auth().sign_out(access_token).await?;
        Ok(())
    }

    /// Fetch the current user behind an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid or the request fails.
    pub async fn current_user(&self, access_token: &str) -> Result<CurrentUser, AuthError> {
        let user = self.supabase.auth().user(access_token).await?;
        CurrentUser::from_auth_user(user).ok_or(AuthError::MissingEmail)
    }
}

/// Validate password requirements before any remote call.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// A credential failure from the token endpoint is a client mistake, not a
/// remote outage.
fn map_sign_in_error(error: SupabaseError) -> AuthError {
    match error {
        SupabaseError::Remote {
            status: 400 | 401, ..
        } => AuthError::InvalidCredentials,
        other => AuthError::Remote(other),
    }
}

fn map_sign_up_error(error: SupabaseError) -> AuthError {
    match error {
        SupabaseError::Remote {
            status: 400 | 422,
            ref message,
        } if message.to_lowercase().contains("already registered") => AuthError::UserAlreadyExists,
        other => AuthError::Remote(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_too_short() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_validate_password_ok() {
        assert!(validate_password("long enough secret").is_ok());
    }

    #[test]
    fn test_sign_in_error_mapping() {
        let remote = SupabaseError::Remote {
            status: 400,
            message: "Invalid login credentials".to_string(),
        };
        assert!(matches!(
            map_sign_in_error(remote),
            AuthError::InvalidCredentials
        ));

        let outage = SupabaseError::Remote {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(matches!(map_sign_in_error(outage), AuthError::Remote(_)));
    }

    #[test]
    fn test_sign_up_error_mapping() {
        let duplicate = SupabaseError::Remote {
            status: 422,
            message: "User already registered".to_string(),
        };
        assert!(matches!(
            map_sign_up_error(duplicate),
            AuthError::UserAlreadyExists
        ));

        let other = SupabaseError::Remote {
            status: 400,
            message: "Signup disabled".to_string(),
        };
        assert!(matches!(map_sign_up_error(other), AuthError::Remote(_)));
    }
}
