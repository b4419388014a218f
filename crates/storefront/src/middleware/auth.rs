//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a signed-in user in route handlers.
//! The remote session (tokens + user) lives in the cookie session under
//! [`session_keys::AUTH`].

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::models::{SessionAuth, session_keys};

/// Extractor that requires a signed-in user.
///
/// Rejects with 401 before any remote call is made, so auth-required
/// actions attempted while logged out never hit the network.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(auth): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", auth.user.email)
/// }
/// ```
pub struct RequireAuth(pub SessionAuth);

/// Error returned when authentication is required but absent.
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "authentication required" })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts.extensions.get::<Session>().ok_or(AuthRejection)?;

        let auth: SessionAuth = session
            .get(session_keys::AUTH)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRejection)?;

        Ok(Self(auth))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request when no one is
/// signed in.
pub struct OptionalAuth(pub Option<SessionAuth>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<SessionAuth>(session_keys::AUTH)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(auth))
    }
}

/// Store the remote session in the cookie session after sign-in.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_session_auth(
    session: &Session,
    auth: &SessionAuth,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::AUTH, auth).await
}

/// Remove every storefront key from the session (sign-out sweep).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_session_auth(session: &Session) -> Result<(), tower_sessions::session::Error> {
    for key in session_keys::ALL {
        session.remove::<serde_json::Value>(key).await?;
    }
    Ok(())
}
