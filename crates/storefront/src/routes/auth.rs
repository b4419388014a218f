//! Authentication route handlers.
//!
//! All credential handling is remote; these handlers exchange credentials
//! for a remote session, mirror it into the cookie session, and sweep it
//! out again on logout.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, RequireAuth, clear_session_auth, set_session_auth};
use crate::models::CurrentUser;
use crate::services::auth::{AuthService, RegisterOutcome};
use crate::state::AppState;

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: String,
    pub full_name: Option<String>,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration response.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<CurrentUser>,
}

/// Register a new account.
///
/// When the remote project auto-confirms, the user is signed in right
/// away; otherwise the response asks for email confirmation.
#[instrument(skip(state, session, request), fields(email = %request.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let service = AuthService::new(state.supabase());
    let outcome = service
        .register(
            &request.email,
            &request.password,
            &request.username,
            request.full_name,
        )
        .await?;

    let response = match outcome {
        RegisterOutcome::SignedIn(auth) => {
            set_session_auth(&session, &auth)
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;
            set_sentry_user(&auth.user.id, Some(auth.user.email.as_str()));

            RegisterResponse {
                status: "signed_in",
                user: Some(auth.user),
            }
        }
        RegisterOutcome::ConfirmationRequired => RegisterResponse {
            status: "confirmation_required",
            user: None,
        },
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Sign in with email and password.
#[instrument(skip(state, session, request), fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<CurrentUser>> {
    let service = AuthService::new(state.supabase());
    let auth = service.login(&request.email, &request.password).await?;

    set_session_auth(&session, &auth)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    set_sentry_user(&auth.user.id, Some(auth.user.email.as_str()));

    Ok(Json(auth.user))
}

/// Sign out.
///
/// The remote revocation is best-effort: the local session is swept (every
/// `sb.`-prefixed key) even when the remote call fails.
#[instrument(skip(state, session, auth))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
) -> Result<Json<serde_json::Value>> {
    if let Some(auth) = auth {
        let service = AuthService::new(state.supabase());
        if let Err(error) = service.logout(&auth.access_token).await {
            tracing::warn!(%error, "remote sign-out failed");
        }
    }

    clear_session_auth(&session)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    clear_sentry_user();

    Ok(Json(serde_json::json!({ "status": "signed_out" })))
}

/// The current signed-in user.
#[instrument(skip(auth))]
pub async fn me(RequireAuth(auth): RequireAuth) -> Json<CurrentUser> {
    Json(auth.user)
}
