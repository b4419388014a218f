//! Session-related types.
//!
//! Types stored in the cookie session for authentication and checkout
//! state. Everything the storefront writes to the session lives under the
//! `sb.` prefix so sign-out can sweep it in one pass.

use serde::{Deserialize, Serialize};

use rewear_core::{Email, UserId};

use crate::supabase::{AuthSession, AuthUser};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Remote auth user id.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Profile username from sign-up metadata.
    pub username: Option<String>,
    /// Display name from sign-up metadata.
    pub full_name: Option<String>,
}

impl CurrentUser {
    /// Build from a remote auth user, rejecting users without an email.
    #[must_use]
    pub fn from_auth_user(user: AuthUser) -> Option<Self> {
        Some(Self {
            id: user.id,
            email: user.email?,
            username: user.user_metadata.username,
            full_name: user.user_metadata.full_name,
        })
    }
}

/// The remote session as held in the cookie session.
///
/// The tokens are the durable state; the hosted service can always be
/// asked for the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionAuth {
    pub access_token: String,
    pub refresh_token: String,
    pub user: CurrentUser,
}

impl SessionAuth {
    /// Build from a freshly issued remote session.
    #[must_use]
    pub fn from_auth_session(session: AuthSession) -> Option<Self> {
        let user = CurrentUser::from_auth_user(session.user)?;
        Some(Self {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            user,
        })
    }
}

/// Session keys for storefront data.
pub mod session_keys {
    /// Common prefix for every storefront session key.
    pub const PREFIX: &str = "sb.";

    /// Key for the remote auth session (tokens + user).
    pub const AUTH: &str = "sb.auth";

    /// Key for the active checkout payment flow.
    pub const CHECKOUT_FLOW: &str = "sb.checkout_flow";

    /// Every key under [`PREFIX`]; sign-out removes them all.
    pub const ALL: &[&str] = &[AUTH, CHECKOUT_FLOW];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_keys_share_prefix() {
        for key in session_keys::ALL {
            assert!(
                key.starts_with(session_keys::PREFIX),
                "session key {key} missing the sweep prefix"
            );
        }
    }

    #[test]
    fn test_current_user_requires_email() {
        let user = AuthUser {
            id: UserId::generate(),
            email: None,
            user_metadata: crate::supabase::UserMetadata::default(),
        };
        assert!(CurrentUser::from_auth_user(user).is_none());
    }
}
