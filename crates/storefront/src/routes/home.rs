//! Home page route handler.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::state::AppState;
use crate::supabase::ProductRow;

/// Number of listings featured on the landing page.
const FEATURED_COUNT: usize = 8;

/// Landing page data.
#[derive(Debug, Serialize)]
pub struct HomePage {
    pub featured: Vec<ProductRow>,
}

/// The landing page: newest listings.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<Json<HomePage>> {
    let products = state.supabase().list_products().await?;

    Ok(Json(HomePage {
        featured: products.into_iter().take(FEATURED_COUNT).collect(),
    }))
}
