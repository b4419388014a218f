//! Cart route handlers.
//!
//! The cart is a set of (user, product) rows in the remote store with
//! optional rental dates; the quote endpoint runs the pricing arithmetic
//! over a fresh fetch.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use rewear_core::ProductId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::pricing::{self, CartQuote};
use crate::state::AppState;
use crate::supabase::{BareCartItemRow, CartItemRow, NewCartItem};

/// Add-to-cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub rental_start_date: Option<DateTime<Utc>>,
    pub rental_end_date: Option<DateTime<Utc>>,
}

/// Remove-from-cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: ProductId,
}

/// The caller's cart with products embedded.
#[instrument(skip(state, auth), fields(user_id = %auth.user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Vec<CartItemRow>>> {
    let items = state
        .supabase()
        .cart_items(auth.user.id, &auth.access_token)
        .await?;
    Ok(Json(items))
}

/// Add a product to the cart, with optional rental dates.
///
/// The remote (user, product) uniqueness constraint rejects duplicates.
#[instrument(skip(state, auth, request), fields(user_id = %auth.user.id, product_id = %request.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(request): Json<AddToCartRequest>,
) -> Result<(StatusCode, Json<BareCartItemRow>)> {
    let item = NewCartItem {
        user_id: auth.user.id,
        product_id: request.product_id,
        rental_start_date: request.rental_start_date,
        rental_end_date: request.rental_end_date,
    };

    let row = state
        .supabase()
        .add_cart_item(&item, &auth.access_token)
        .await?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// Remove a product from the cart.
#[instrument(skip(state, auth, request), fields(user_id = %auth.user.id, product_id = %request.product_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<StatusCode> {
    state
        .supabase()
        .remove_cart_item(auth.user.id, request.product_id, &auth.access_token)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The checkout quote for the caller's cart.
#[instrument(skip(state, auth), fields(user_id = %auth.user.id))]
pub async fn quote(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<CartQuote>> {
    let items = state
        .supabase()
        .cart_items(auth.user.id, &auth.access_token)
        .await?;

    let quote = pricing::quote_cart(
        &items,
        state.config().fees.as_ref(),
        state.config().razorpay.currency,
    );

    Ok(Json(quote))
}
