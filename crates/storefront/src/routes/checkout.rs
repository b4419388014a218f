//! Checkout route handlers.
//!
//! The payment flow state machine lives in the cookie session between
//! requests; every handler loads it, lets the checkout service drive one
//! transition, and stores the result. Out-of-order gateway callbacks fail
//! the transition instead of corrupting state.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::session_keys;
use crate::services::payments::{CheckoutService, PaymentError, PaymentFlow, WidgetOptions};
use crate::services::pricing::{self, CartQuote};
use crate::state::AppState;
use crate::supabase::{CartItemRow, GatewayCompletion};

/// Order-creation form data.
#[derive(Debug, Default, Deserialize)]
pub struct CreateOrderRequest {
    /// Phone number for the widget prefill.
    pub contact: Option<String>,
}

/// Checkout summary page data.
#[derive(Debug, Serialize)]
pub struct CheckoutPage {
    pub items: Vec<CartItemRow>,
    pub quote: CartQuote,
}

/// Completion response passed back to the client.
#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub success: bool,
    pub order_id: rewear_core::OrderId,
    pub status: String,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Load the active payment flow, defaulting to idle.
async fn load_flow(session: &Session) -> PaymentFlow {
    session
        .get::<PaymentFlow>(session_keys::CHECKOUT_FLOW)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Store the payment flow for the next callback.
async fn save_flow(session: &Session, flow: &PaymentFlow) -> Result<()> {
    session
        .insert(session_keys::CHECKOUT_FLOW, flow)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))
}

fn checkout_service(state: &AppState) -> CheckoutService<'_> {
    CheckoutService::new(
        state.supabase(),
        &state.config().razorpay,
        state.config().fees.as_ref(),
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// The checkout summary: cart items and their quote.
#[instrument(skip(state, auth), fields(user_id = %auth.user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<CheckoutPage>> {
    let items = state
        .supabase()
        .cart_items(auth.user.id, &auth.access_token)
        .await?;

    let quote = pricing::quote_cart(
        &items,
        state.config().fees.as_ref(),
        state.config().razorpay.currency,
    );

    Ok(Json(CheckoutPage { items, quote }))
}

/// Create a payment order for the caller's cart.
///
/// Requires a signed-in user: without one, the flow aborts locally with
/// 401 before any remote call. A remote order-creation failure lands the
/// flow in `failed` with the error surfaced.
#[instrument(skip(state, session, auth, request))]
pub async fn create_order(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<WidgetOptions>> {
    let flow = load_flow(&session).await;
    let service = checkout_service(&state);

    match service.begin(auth.as_ref(), flow, request.contact).await {
        Ok((flow, options)) => {
            save_flow(&session, &flow).await?;
            Ok(Json(options))
        }
        Err(error) => {
            if matches!(
                error,
                PaymentError::OrderCreation(_) | PaymentError::Remote(_)
            ) {
                save_flow(
                    &session,
                    &PaymentFlow::Failed {
                        reason: error.to_string(),
                    },
                )
                .await?;
            }
            Err(error.into())
        }
    }
}

/// Gateway completion callback: verify remotely, then run the
/// post-payment side effect.
///
/// A rejected verification moves the flow to `failed` and leaves the
/// order unpaid.
#[instrument(skip(state, session, auth, completion), fields(user_id = %auth.user.id))]
pub async fn complete(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Json(completion): Json<GatewayCompletion>,
) -> Result<Json<CompletionResponse>> {
    let flow = load_flow(&session).await;
    let service = checkout_service(&state);

    match service.complete(&auth, flow, completion).await {
        Ok((flow, response)) => {
            save_flow(&session, &flow).await?;
            Ok(Json(CompletionResponse {
                success: response.success,
                order_id: response.order_id,
                status: response.status,
            }))
        }
        Err(error) => {
            if matches!(error, PaymentError::Verification(_)) {
                save_flow(
                    &session,
                    &PaymentFlow::Failed {
                        reason: error.to_string(),
                    },
                )
                .await?;
            }
            Err(error.into())
        }
    }
}

/// Gateway dismissal callback: the flow is cancelled, the local order
/// keeps its `created` status.
#[instrument(skip(state, session, auth), fields(user_id = %auth.user.id))]
pub async fn cancel(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<serde_json::Value>> {
    let flow = load_flow(&session).await;
    let flow = checkout_service(&state).cancel(flow)?;
    save_flow(&session, &flow).await?;

    Ok(Json(serde_json::json!({ "status": "cancelled" })))
}
