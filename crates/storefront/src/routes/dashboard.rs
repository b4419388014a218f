//! Dashboard route handler.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use rewear_core::ProductId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::conversations::MessageService;
use crate::state::AppState;
use crate::supabase::{OrderRow, ProductRow};

/// Everything the signed-in dashboard renders.
#[derive(Debug, Serialize)]
pub struct DashboardPage {
    /// The browsable catalog, newest first.
    pub products: Vec<ProductRow>,
    /// Product ids the caller has favorited.
    pub favorites: Vec<ProductId>,
    /// Listings the caller owns.
    pub my_listings: Vec<ProductRow>,
    /// The caller's payment orders, newest first.
    pub orders: Vec<OrderRow>,
    /// Conversations with at least one unread message.
    pub unread_conversations: usize,
}

/// The signed-in dashboard.
#[instrument(skip(state, auth), fields(user_id = %auth.user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<DashboardPage>> {
    let supabase = state.supabase();
    let user = auth.user.id;
    let token = auth.access_token.as_str();

    let products = supabase.list_products().await?;
    let favorites = supabase.favorite_product_ids(user, token).await?;
    let my_listings = supabase.products_by_owner(user, Some(token)).await?;
    let orders = supabase.orders_for_user(user, token).await?;

    let conversations = MessageService::new(supabase).conversations(&auth).await?;
    let unread_conversations = conversations
        .iter()
        .filter(|conversation| conversation.unread > 0)
        .count();

    Ok(Json(DashboardPage {
        products,
        favorites,
        my_listings,
        orders,
        unread_conversations,
    }))
}
