//! Remote auth (GoTrue) endpoints.
//!
//! Session lifecycle lives entirely on the remote service: the storefront
//! exchanges credentials for tokens and otherwise just forwards them.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use rewear_core::{Email, UserId};

use super::{ClientInner, SupabaseError, check_response};

/// A user as reported by the remote auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Option<Email>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Sign-up metadata stored alongside the auth user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    pub username: Option<String>,
    pub full_name: Option<String>,
}

/// An authenticated remote session.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: AuthUser,
}

/// Result of a sign-up request.
///
/// Depending on the remote project's confirmation settings, sign-up either
/// returns a full session (auto-confirm) or just the pending user.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SignUpOutcome {
    /// Auto-confirm is enabled; the user is signed in immediately.
    Session(AuthSession),
    /// Email confirmation is required before sign-in.
    ConfirmationRequired(AuthUser),
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: &'a UserMetadata,
}

#[derive(Serialize)]
struct PasswordGrantRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrantRequest<'a> {
    refresh_token: &'a str,
}

/// Auth API handle, borrowed from [`super::SupabaseClient`].
pub struct AuthApi<'a> {
    pub(super) inner: &'a ClientInner,
}

impl AuthApi<'_> {
    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.inner.base_url)
    }

    /// Register a new user with email, password, and profile metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the remote service rejects
    /// the registration (e.g., the email is already registered).
    #[instrument(skip(self, password, metadata), fields(email = %email))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &UserMetadata,
    ) -> Result<SignUpOutcome, SupabaseError> {
        let request = self.inner.http.post(self.endpoint("signup")).json(&SignUpRequest {
            email,
            password,
            data: metadata,
        });

        let response = self.inner.authed(request, None).send().await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    /// Exchange email and password for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the credentials are invalid.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, SupabaseError> {
        let request = self
            .inner
            .http
            .post(self.endpoint("token"))
            .query(&[("grant_type", "password")])
            .json(&PasswordGrantRequest { email, password });

        let response = self.inner.authed(request, None).send().await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    /// Exchange a refresh token for a fresh session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token has been revoked.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, SupabaseError> {
        let request = self
            .inner
            .http
            .post(self.endpoint("token"))
            .query(&[("grant_type", "refresh_token")])
            .json(&RefreshGrantRequest { refresh_token });

        let response = self.inner.authed(request, None).send().await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    /// Revoke the session behind an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; an already-expired token is a
    /// remote-side error, not a local one.
    #[instrument(skip(self, access_token))]
    pub async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError> {
        let request = self.inner.http.post(self.endpoint("logout"));
        let response = self.inner.authed(request, Some(access_token)).send().await?;
        check_response(response).await?;
        Ok(())
    }

    /// Fetch the user behind an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is invalid.
    #[instrument(skip(self, access_token))]
    pub async fn user(&self, access_token: &str) -> Result<AuthUser, SupabaseError> {
        let request = self.inner.http.get(self.endpoint("user"));
        let response = self.inner.authed(request, Some(access_token)).send().await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    /// Ping the auth service health endpoint (used by readiness checks).
    ///
    /// # Errors
    ///
    /// Returns an error if the service is unreachable or unhealthy.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<(), SupabaseError> {
        let request = self.inner.http.get(self.endpoint("health"));
        let response = self.inner.authed(request, None).send().await?;
        check_response(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_up_outcome_with_session() {
        let json = serde_json::json!({
            "access_token": "jwt-access",
            "refresh_token": "jwt-refresh",
            "expires_in": 3600,
            "user": {
                "id": "11111111-2222-3333-4444-555555555555",
                "email": "renter@example.com",
                "user_metadata": { "username": "renter", "full_name": "Ren Ter" }
            }
        });

        let outcome: SignUpOutcome = serde_json::from_value(json).unwrap();
        assert!(matches!(outcome, SignUpOutcome::Session(_)));
    }

    #[test]
    fn test_sign_up_outcome_pending_confirmation() {
        let json = serde_json::json!({
            "id": "11111111-2222-3333-4444-555555555555",
            "email": "renter@example.com",
            "user_metadata": {}
        });

        let outcome: SignUpOutcome = serde_json::from_value(json).unwrap();
        assert!(matches!(outcome, SignUpOutcome::ConfirmationRequired(_)));
    }
}
