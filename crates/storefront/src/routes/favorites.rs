//! Favorites route handlers.
//!
//! Favorites are (user, product) pairs in the remote store, toggled from
//! the catalog. The toggle decision runs over the fetched set so the
//! response can report the new membership without a second fetch.

use std::collections::HashSet;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use rewear_core::ProductId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Toggle form data.
#[derive(Debug, Deserialize)]
pub struct ToggleFavoriteRequest {
    pub product_id: ProductId,
}

/// Toggle response: the product's new membership.
#[derive(Debug, Serialize)]
pub struct ToggleFavoriteResponse {
    pub product_id: ProductId,
    pub favorite: bool,
}

/// What a toggle did to the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FavoriteAction {
    Added,
    Removed,
}

/// Flip a product's membership in the favorite set.
fn toggle_membership(favorites: &mut HashSet<ProductId>, product: ProductId) -> FavoriteAction {
    if favorites.remove(&product) {
        FavoriteAction::Removed
    } else {
        favorites.insert(product);
        FavoriteAction::Added
    }
}

/// The caller's favorited product ids.
#[instrument(skip(state, auth), fields(user_id = %auth.user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Vec<ProductId>>> {
    let favorites = state
        .supabase()
        .favorite_product_ids(auth.user.id, &auth.access_token)
        .await?;
    Ok(Json(favorites))
}

/// Toggle a product in the caller's favorites.
#[instrument(skip(state, auth, request), fields(user_id = %auth.user.id, product_id = %request.product_id))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(request): Json<ToggleFavoriteRequest>,
) -> Result<Json<ToggleFavoriteResponse>> {
    let supabase = state.supabase();
    let user = auth.user.id;
    let token = auth.access_token.as_str();

    let mut favorites: HashSet<ProductId> = supabase
        .favorite_product_ids(user, token)
        .await?
        .into_iter()
        .collect();

    let action = toggle_membership(&mut favorites, request.product_id);
    match action {
        FavoriteAction::Added => {
            supabase.add_favorite(user, request.product_id, token).await?;
        }
        FavoriteAction::Removed => {
            supabase
                .remove_favorite(user, request.product_id, token)
                .await?;
        }
    }

    Ok(Json(ToggleFavoriteResponse {
        product_id: request.product_id,
        favorite: action == FavoriteAction::Added,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_twice_restores_the_set() {
        let product = ProductId::generate();
        let other = ProductId::generate();
        let mut favorites: HashSet<ProductId> = [other].into_iter().collect();
        let original = favorites.clone();

        assert_eq!(
            toggle_membership(&mut favorites, product),
            FavoriteAction::Added
        );
        assert!(favorites.contains(&product));

        assert_eq!(
            toggle_membership(&mut favorites, product),
            FavoriteAction::Removed
        );
        assert_eq!(favorites, original);
    }
}
