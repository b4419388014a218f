//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Featured listings
//! GET  /dashboard              - Catalog + caller's favorites, listings, orders (auth)
//! GET  /health                 - Health check
//! GET  /health/ready           - Readiness check (pings the remote auth service)
//!
//! # Products
//! GET    /products             - Product listing
//! POST   /products             - Create listing (auth)
//! GET    /products/mine        - Caller's listings (auth)
//! GET    /products/{id}        - Product detail
//! PATCH  /products/{id}        - Update own listing (auth)
//! DELETE /products/{id}        - Delete own listing (auth)
//! POST   /products/{id}/image  - Upload listing image (auth)
//!
//! # Cart
//! GET  /cart                   - Cart with products embedded (auth)
//! POST /cart/add               - Add product with optional rental dates (auth)
//! POST /cart/remove            - Remove product (auth)
//! GET  /cart/quote             - Checkout quote (auth)
//!
//! # Favorites
//! GET  /favorites              - Favorited product ids (auth)
//! POST /favorites/toggle       - Toggle a favorite (auth)
//!
//! # Messages
//! GET  /messages/conversations - Conversation summaries (auth)
//! GET  /messages/product/{id}  - Thread for a product (auth)
//! POST /messages/send          - Send a message (auth)
//! POST /messages/read          - Mark a thread read (auth)
//!
//! # Checkout
//! GET  /checkout               - Cart + quote for the summary page (auth)
//! POST /checkout/order         - Create a payment order, returns widget options
//! POST /checkout/complete      - Gateway completion callback (auth)
//! POST /checkout/cancel        - Gateway dismissal callback (auth)
//!
//! # Auth
//! POST /auth/register          - Register
//! POST /auth/login             - Login
//! POST /auth/logout            - Logout
//! GET  /auth/me                - Current user (auth)
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod dashboard;
pub mod favorites;
pub mod home;
pub mod messages;
pub mod products;

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, checkout_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .layer(auth_rate_limiter())
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/mine", get(products::mine))
        .route(
            "/{id}",
            get(products::show)
                .patch(products::update)
                .delete(products::delete),
        )
        .route("/{id}/image", post(products::upload_image))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
        .route("/quote", get(cart::quote))
}

/// Create the favorites routes router.
pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(favorites::index))
        .route("/toggle", post(favorites::toggle))
}

/// Create the messages routes router.
pub fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/conversations", get(messages::conversations))
        .route("/product/{id}", get(messages::product_thread))
        .route("/send", post(messages::send))
        .route("/read", post(messages::mark_read))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/order", post(checkout::create_order))
        .route("/complete", post(checkout::complete))
        .route("/cancel", post(checkout::cancel))
        .layer(checkout_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Dashboard
        .route("/dashboard", get(dashboard::dashboard))
        // Product routes
        .nest("/products", product_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Favorites routes
        .nest("/favorites", favorite_routes())
        // Messages routes
        .nest("/messages", message_routes())
        // Checkout routes
        .nest("/checkout", checkout_routes())
        // Auth routes
        .nest("/auth", auth_routes())
}

/// Catch-all 404 handler.
pub async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "not found" })),
    )
}
