//! Hosted backend client (PostgREST tables, GoTrue auth, Storage, Functions).
//!
//! # Architecture
//!
//! - The remote service is the source of truth - NO local sync, direct API
//!   calls per request
//! - Row-level security applies remotely: requests carry the anon key plus
//!   the caller's bearer token when one exists
//! - In-memory caching via `moka` for catalog reads (5 minute TTL),
//!   invalidated on catalog mutations
//!
//! # Example
//!
//! ```rust,ignore
//! use rewear_storefront::supabase::SupabaseClient;
//!
//! let client = SupabaseClient::new(&config.supabase);
//!
//! // Browse the catalog (anonymous)
//! let products = client.list_products().await?;
//!
//! // Add one to the caller's cart
//! client.add_cart_item(&NewCartItem {
//!     user_id,
//!     product_id: products[0].id,
//!     rental_start_date: None,
//!     rental_end_date: None,
//! }, &access_token).await?;
//! ```

pub mod auth;
pub mod functions;
pub mod query;
pub mod storage;
pub mod types;

pub use auth::{AuthApi, AuthSession, AuthUser, SignUpOutcome, UserMetadata};
pub use functions::{CreatedPaymentOrder, FunctionsApi, GatewayCompletion, VerifyPaymentResponse};
pub use query::{Query, SortOrder};
pub use storage::{PRODUCT_IMAGES_BUCKET, StorageApi};
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::RequestBuilder;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use rewear_core::{OrderId, ProductId, UserId};

use crate::config::SupabaseConfig;

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote service returned an error response.
    #[error("remote error (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    /// JSON decoding of a response body failed.
    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the remote service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

/// Error body shapes the remote services produce. PostgREST uses
/// `code`/`message`, GoTrue uses `msg` or `error_description`, the
/// functions runtime uses `error`.
#[derive(Debug, Default, serde::Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
    }
}

/// Validate a response status, turning remote failures into typed errors.
pub(crate) async fn check_response(
    response: reqwest::Response,
) -> Result<reqwest::Response, SupabaseError> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(SupabaseError::RateLimited(retry_after));
    }

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| body.chars().take(200).collect());

    tracing::debug!(status = %status, message = %message, "remote service error");

    Err(SupabaseError::Remote {
        status: status.as_u16(),
        message,
    })
}

// =============================================================================
// SupabaseClient
// =============================================================================

/// Cached catalog values.
#[derive(Clone)]
enum CacheValue {
    Product(Box<ProductRow>),
    Products(Vec<ProductRow>),
}

pub(crate) struct ClientInner {
    pub(crate) http: reqwest::Client,
    /// Project URL without a trailing slash.
    pub(crate) base_url: String,
    pub(crate) anon_key: String,
    cache: Cache<String, CacheValue>,
}

impl ClientInner {
    /// Attach the anon API key and a bearer token (the caller's when
    /// present, the anon key otherwise, matching the remote SDK).
    pub(crate) fn authed(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(token.unwrap_or(&self.anon_key))
    }
}

/// Client for the hosted backend.
///
/// Provides typed access to the marketplace tables plus the auth, storage,
/// and functions services. Catalog reads are cached for 5 minutes.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<ClientInner>,
}

impl SupabaseClient {
    /// Create a new client.
    #[must_use]
    pub fn new(config: &SupabaseConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(ClientInner {
                http: reqwest::Client::new(),
                base_url: config.url.as_str().trim_end_matches('/').to_owned(),
                anon_key: config.anon_key.expose_secret().to_owned(),
                cache,
            }),
        }
    }

    /// Auth (GoTrue) endpoints.
    #[must_use]
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { inner: &self.inner }
    }

    /// Storage bucket endpoints.
    #[must_use]
    pub fn storage(&self) -> StorageApi<'_> {
        StorageApi { inner: &self.inner }
    }

    /// Serverless function endpoints.
    #[must_use]
    pub fn functions(&self) -> FunctionsApi<'_> {
        FunctionsApi { inner: &self.inner }
    }

    // =========================================================================
    // REST helpers
    // =========================================================================

    fn rest_endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.inner.base_url)
    }

    async fn select_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
        token: Option<&str>,
    ) -> Result<Vec<T>, SupabaseError> {
        let request = self
            .inner
            .http
            .get(self.rest_endpoint(table))
            .query(&query.params());
        let response = self.inner.authed(request, token).send().await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    async fn insert_row<T, B>(
        &self,
        table: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<T, SupabaseError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
    {
        let request = self
            .inner
            .http
            .post(self.rest_endpoint(table))
            .header("Prefer", "return=representation")
            .json(body);
        let response = self.inner.authed(request, token).send().await?;
        let response = check_response(response).await?;
        let rows: Vec<T> = response.json().await?;
        single_row(rows, table)
    }

    async fn update_rows<T, B>(
        &self,
        table: &str,
        query: &Query,
        body: &B,
        token: Option<&str>,
    ) -> Result<Vec<T>, SupabaseError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
    {
        let request = self
            .inner
            .http
            .patch(self.rest_endpoint(table))
            .header("Prefer", "return=representation")
            .query(&query.params())
            .json(body);
        let response = self.inner.authed(request, token).send().await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    async fn delete_rows(
        &self,
        table: &str,
        query: &Query,
        token: Option<&str>,
    ) -> Result<(), SupabaseError> {
        let request = self
            .inner
            .http
            .delete(self.rest_endpoint(table))
            .query(&query.params());
        let response = self.inner.authed(request, token).send().await?;
        check_response(response).await?;
        Ok(())
    }

    /// Filter clause matching rows where the user is either participant.
    fn participant_clauses(user: UserId) -> [String; 2] {
        [
            format!("sender_id.eq.{user}"),
            format!("receiver_id.eq.{user}"),
        ]
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get the public catalog, newest listings first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductRow>, SupabaseError> {
        let cache_key = "products:all".to_owned();

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product listing");
            return Ok(products);
        }

        let query = Query::new()
            .select("*")
            .order("created_at", SortOrder::Descending);
        let products: Vec<ProductRow> = self.select_rows("products", &query, None).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get a single product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<ProductRow, SupabaseError> {
        let cache_key = format!("product:{id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let query = Query::new().select("*").eq("id", id).limit(1);
        let rows: Vec<ProductRow> = self.select_rows("products", &query, None).await?;
        let product = single_row(rows, &format!("product {id}"))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get the listings owned by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(owner_id = %owner))]
    pub async fn products_by_owner(
        &self,
        owner: UserId,
        token: Option<&str>,
    ) -> Result<Vec<ProductRow>, SupabaseError> {
        let query = Query::new()
            .select("*")
            .eq("owner_id", owner)
            .order("created_at", SortOrder::Descending);
        self.select_rows("products", &query, token).await
    }

    /// Create a listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the remote policy rejects
    /// the insert.
    #[instrument(skip(self, product, token), fields(owner_id = %product.owner_id))]
    pub async fn create_product(
        &self,
        product: &NewProduct,
        token: &str,
    ) -> Result<ProductRow, SupabaseError> {
        let row = self.insert_row("products", product, Some(token)).await?;
        self.invalidate_catalog(None).await;
        Ok(row)
    }

    /// Update a listing owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no row matches the (id, owner) pair.
    #[instrument(skip(self, patch, token), fields(product_id = %id, owner_id = %owner))]
    pub async fn update_product(
        &self,
        id: ProductId,
        owner: UserId,
        patch: &ProductPatch,
        token: &str,
    ) -> Result<ProductRow, SupabaseError> {
        let query = Query::new().eq("id", id).eq("owner_id", owner);
        let rows = self
            .update_rows("products", &query, patch, Some(token))
            .await?;
        self.invalidate_catalog(Some(id)).await;
        single_row(rows, &format!("product {id}"))
    }

    /// Delete a listing owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(product_id = %id, owner_id = %owner))]
    pub async fn delete_product(
        &self,
        id: ProductId,
        owner: UserId,
        token: &str,
    ) -> Result<(), SupabaseError> {
        let query = Query::new().eq("id", id).eq("owner_id", owner);
        self.delete_rows("products", &query, Some(token)).await?;
        self.invalidate_catalog(Some(id)).await;
        Ok(())
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Get the user's cart with products embedded.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(user_id = %user))]
    pub async fn cart_items(
        &self,
        user: UserId,
        token: &str,
    ) -> Result<Vec<CartItemRow>, SupabaseError> {
        let query = Query::new()
            .select("id,product_id,rental_start_date,rental_end_date,products(*)")
            .eq("user_id", user);
        self.select_rows("cart_items", &query, Some(token)).await
    }

    /// Add a product to the user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, including the remote
    /// uniqueness violation when the (user, product) pair already exists.
    #[instrument(skip(self, item, token), fields(user_id = %item.user_id, product_id = %item.product_id))]
    pub async fn add_cart_item(
        &self,
        item: &NewCartItem,
        token: &str,
    ) -> Result<BareCartItemRow, SupabaseError> {
        self.insert_row("cart_items", item, Some(token)).await
    }

    /// Remove a product from the user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(user_id = %user, product_id = %product))]
    pub async fn remove_cart_item(
        &self,
        user: UserId,
        product: ProductId,
        token: &str,
    ) -> Result<(), SupabaseError> {
        let query = Query::new().eq("user_id", user).eq("product_id", product);
        self.delete_rows("cart_items", &query, Some(token)).await
    }

    /// Empty the user's cart (post-payment side effect).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(user_id = %user))]
    pub async fn clear_cart(&self, user: UserId, token: &str) -> Result<(), SupabaseError> {
        let query = Query::new().eq("user_id", user);
        self.delete_rows("cart_items", &query, Some(token)).await
    }

    // =========================================================================
    // Favorite Methods
    // =========================================================================

    /// Product ids the user has favorited.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(user_id = %user))]
    pub async fn favorite_product_ids(
        &self,
        user: UserId,
        token: &str,
    ) -> Result<Vec<ProductId>, SupabaseError> {
        let query = Query::new().select("product_id").eq("user_id", user);
        let rows: Vec<FavoriteProductId> = self.select_rows("favorites", &query, Some(token)).await?;
        Ok(rows.into_iter().map(|row| row.product_id).collect())
    }

    /// Favorite a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(user_id = %user, product_id = %product))]
    pub async fn add_favorite(
        &self,
        user: UserId,
        product: ProductId,
        token: &str,
    ) -> Result<FavoriteRow, SupabaseError> {
        #[derive(Serialize)]
        struct NewFavorite {
            user_id: UserId,
            product_id: ProductId,
        }

        self.insert_row(
            "favorites",
            &NewFavorite {
                user_id: user,
                product_id: product,
            },
            Some(token),
        )
        .await
    }

    /// Unfavorite a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(user_id = %user, product_id = %product))]
    pub async fn remove_favorite(
        &self,
        user: UserId,
        product: ProductId,
        token: &str,
    ) -> Result<(), SupabaseError> {
        let query = Query::new().eq("user_id", user).eq("product_id", product);
        self.delete_rows("favorites", &query, Some(token)).await
    }

    // =========================================================================
    // Message Methods
    // =========================================================================

    /// Column projection for message fetches: the row plus both profiles
    /// and the referenced product for display.
    const MESSAGE_SELECT: &'static str = "*,sender:sender_id(username,full_name,avatar_url),receiver:receiver_id(username,full_name,avatar_url),product:product_id(title,image_url)";

    /// Every message where the user is sender or receiver, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(user_id = %user))]
    pub async fn messages_for_user(
        &self,
        user: UserId,
        token: &str,
    ) -> Result<Vec<MessageRow>, SupabaseError> {
        let query = Query::new()
            .select(Self::MESSAGE_SELECT)
            .or(Self::participant_clauses(user))
            .order("created_at", SortOrder::Descending);
        self.select_rows("messages", &query, Some(token)).await
    }

    /// The user's message thread for one product, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product_id = %product, user_id = %user))]
    pub async fn messages_by_product(
        &self,
        product: ProductId,
        user: UserId,
        token: &str,
    ) -> Result<Vec<MessageRow>, SupabaseError> {
        let query = Query::new()
            .select(Self::MESSAGE_SELECT)
            .eq("product_id", product)
            .or(Self::participant_clauses(user))
            .order("created_at", SortOrder::Ascending);
        self.select_rows("messages", &query, Some(token)).await
    }

    /// Insert a message row.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, message, token), fields(receiver_id = %message.receiver_id))]
    pub async fn insert_message(
        &self,
        message: &NewMessage,
        token: &str,
    ) -> Result<MessageRow, SupabaseError> {
        self.insert_row("messages", message, Some(token)).await
    }

    /// Mark messages from `sender` to `receiver` as read, optionally
    /// scoped to one product thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(sender_id = %sender, receiver_id = %receiver))]
    pub async fn mark_messages_read(
        &self,
        sender: UserId,
        receiver: UserId,
        product: Option<ProductId>,
        token: &str,
    ) -> Result<(), SupabaseError> {
        #[derive(Serialize)]
        struct ReadFlag {
            read: bool,
        }

        let mut query = Query::new().eq("sender_id", sender).eq("receiver_id", receiver);
        if let Some(product) = product {
            query = query.eq("product_id", product);
        }

        let _: Vec<MessageRow> = self
            .update_rows("messages", &query, &ReadFlag { read: true }, Some(token))
            .await?;
        Ok(())
    }

    // =========================================================================
    // Order and Profile Methods
    // =========================================================================

    /// Get one payment order row.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the order does not exist or is not visible to
    /// the caller.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn get_order(&self, id: OrderId, token: &str) -> Result<OrderRow, SupabaseError> {
        let query = Query::new().select("*").eq("id", id).limit(1);
        let rows: Vec<OrderRow> = self.select_rows("orders", &query, Some(token)).await?;
        single_row(rows, &format!("order {id}"))
    }

    /// The user's payment orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(user_id = %user))]
    pub async fn orders_for_user(
        &self,
        user: UserId,
        token: &str,
    ) -> Result<Vec<OrderRow>, SupabaseError> {
        let query = Query::new()
            .select("*")
            .eq("user_id", user)
            .order("created_at", SortOrder::Descending);
        self.select_rows("orders", &query, Some(token)).await
    }

    /// Get a user's profile row.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the profile does not exist.
    #[instrument(skip(self, token), fields(user_id = %user))]
    pub async fn get_profile(
        &self,
        user: UserId,
        token: Option<&str>,
    ) -> Result<ProfileRow, SupabaseError> {
        let query = Query::new()
            .select("id,username,full_name,avatar_url")
            .eq("id", user)
            .limit(1);
        let rows: Vec<ProfileRow> = self.select_rows("profiles", &query, token).await?;
        single_row(rows, &format!("profile {user}"))
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate cached catalog entries after a mutation.
    async fn invalidate_catalog(&self, product: Option<ProductId>) {
        self.inner.cache.invalidate(&"products:all".to_owned()).await;
        if let Some(id) = product {
            self.inner.cache.invalidate(&format!("product:{id}")).await;
        }
    }
}

/// Expect exactly one row from a representation response.
fn single_row<T>(rows: Vec<T>, what: &str) -> Result<T, SupabaseError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| SupabaseError::NotFound(what.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supabase_error_display() {
        let err = SupabaseError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = SupabaseError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");

        let err = SupabaseError::Remote {
            status: 409,
            message: "duplicate key value violates unique constraint".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "remote error (HTTP 409): duplicate key value violates unique constraint"
        );
    }

    #[test]
    fn test_error_body_precedence() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"msg":"gotrue says no","error":"ignored"}"#).unwrap_or_default();
        assert_eq!(body.into_message().as_deref(), Some("gotrue says no"));

        let body: ErrorBody = serde_json::from_str(r#"{"error":"only this"}"#).unwrap_or_default();
        assert_eq!(body.into_message().as_deref(), Some("only this"));

        let body: ErrorBody = serde_json::from_str("{}").unwrap_or_default();
        assert!(body.into_message().is_none());
    }

    #[test]
    fn test_single_row() {
        assert!(matches!(
            single_row::<u32>(vec![], "nothing"),
            Err(SupabaseError::NotFound(_))
        ));
        assert!(matches!(single_row(vec![7], "seven"), Ok(7)));
    }
}
