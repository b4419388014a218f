//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use rewear_core::ProductId;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;
use crate::supabase::{NewProduct, PRODUCT_IMAGES_BUCKET, ProductPatch, ProductRow};

/// Create-listing form data.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Decimal,
    pub deposit: Option<Decimal>,
    pub size: Option<String>,
    pub condition: Option<String>,
    pub age: Option<String>,
}

/// Image upload payload: the file bytes arrive base64-encoded.
#[derive(Debug, Deserialize)]
pub struct ImageUploadRequest {
    pub file_name: String,
    pub content_type: String,
    pub data_base64: String,
}

/// Image upload response.
#[derive(Debug, Serialize)]
pub struct ImageUploadResponse {
    pub image_url: String,
}

/// Browse the catalog, newest first.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<ProductRow>>> {
    Ok(Json(state.supabase().list_products().await?))
}

/// One product's detail.
#[instrument(skip(state), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductRow>> {
    Ok(Json(state.supabase().get_product(id).await?))
}

/// The caller's own listings.
#[instrument(skip(state, auth), fields(user_id = %auth.user.id))]
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Vec<ProductRow>>> {
    let listings = state
        .supabase()
        .products_by_owner(auth.user.id, Some(&auth.access_token))
        .await?;
    Ok(Json(listings))
}

/// List a product for rent.
#[instrument(skip(state, auth, request), fields(user_id = %auth.user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductRow>)> {
    let product = NewProduct {
        owner_id: auth.user.id,
        title: request.title,
        description: request.description,
        image_url: request.image_url,
        price: request.price,
        deposit: request.deposit,
        size: request.size,
        condition: request.condition,
        age: request.age,
    };

    let row = state
        .supabase()
        .create_product(&product, &auth.access_token)
        .await?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// Update one of the caller's listings.
#[instrument(skip(state, auth, patch), fields(product_id = %id, user_id = %auth.user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<ProductId>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<ProductRow>> {
    if patch.is_empty() {
        return Err(AppError::BadRequest("no fields to update".to_string()));
    }

    let row = state
        .supabase()
        .update_product(id, auth.user.id, &patch, &auth.access_token)
        .await?;

    Ok(Json(row))
}

/// Delete one of the caller's listings.
#[instrument(skip(state, auth), fields(product_id = %id, user_id = %auth.user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    state
        .supabase()
        .delete_product(id, auth.user.id, &auth.access_token)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload a listing image to the storage bucket and point the listing's
/// `image_url` at its public URL.
#[instrument(skip(state, auth, request), fields(product_id = %id, user_id = %auth.user.id))]
pub async fn upload_image(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<ProductId>,
    Json(request): Json<ImageUploadRequest>,
) -> Result<Json<ImageUploadResponse>> {
    let bytes = BASE64
        .decode(request.data_base64.as_bytes())
        .map_err(|e| AppError::BadRequest(format!("invalid image encoding: {e}")))?;

    let path = format!("{}/{id}/{}", auth.user.id, request.file_name);
    let storage = state.supabase().storage();

    storage
        .upload(
            PRODUCT_IMAGES_BUCKET,
            &path,
            bytes,
            &request.content_type,
            &auth.access_token,
        )
        .await?;

    let image_url = storage.public_url(PRODUCT_IMAGES_BUCKET, &path);

    let patch = ProductPatch {
        image_url: Some(image_url.clone()),
        ..ProductPatch::default()
    };
    state
        .supabase()
        .update_product(id, auth.user.id, &patch, &auth.access_token)
        .await?;

    Ok(Json(ImageUploadResponse { image_url }))
}
