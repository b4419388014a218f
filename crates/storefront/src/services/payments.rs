//! Checkout payment flow against the gateway functions.
//!
//! The flow is an explicit state machine carried in the cookie session
//! between requests:
//!
//! ```text
//! Idle -> CreatingOrder -> AwaitingGateway -> Succeeded | Cancelled
//!                      \-> Failed
//! ```
//!
//! The gateway result arrives as a single [`GatewayOutcome`] resolution;
//! an out-of-order callback is an invalid transition, never a partial
//! state. Verification and signature checking happen in the remote
//! functions - this service only forwards the callback and refuses to
//! treat an unverified completion as paid.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rewear_core::Price;

use crate::config::{FeeConfig, RazorpayConfig};
use crate::models::SessionAuth;
use crate::services::pricing;
use crate::supabase::{
    CreatedPaymentOrder, GatewayCompletion, SupabaseClient, SupabaseError, VerifyPaymentResponse,
};

/// Merchant display name for the checkout widget.
const MERCHANT_NAME: &str = "ReWear";

/// Payment description shown in the widget.
const PAYMENT_DESCRIPTION: &str = "Clothing Rental Payment";

/// Errors from the checkout flow.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// No signed-in user; nothing was sent to the network.
    #[error("authentication required")]
    AuthRequired,

    /// The cart has nothing to pay for.
    #[error("cart is empty")]
    EmptyCart,

    /// The requested transition does not apply to the current state.
    #[error("invalid payment flow transition: {0}")]
    InvalidTransition(&'static str),

    /// The remote order creation failed.
    #[error("order creation failed: {0}")]
    OrderCreation(String),

    /// The remote verification rejected the completion; the order stays
    /// unpaid.
    #[error("payment verification failed: {0}")]
    Verification(String),

    /// Another remote call failed.
    #[error("remote error: {0}")]
    Remote(#[from] SupabaseError),
}

/// The gateway's single resolution of a pending payment.
#[derive(Debug, Clone)]
pub enum GatewayOutcome {
    /// The widget reported a completed payment.
    Completed { payment_id: String },
    /// The user dismissed the widget.
    Dismissed,
}

/// Per-checkout payment state, serialized into the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PaymentFlow {
    #[default]
    Idle,
    CreatingOrder,
    AwaitingGateway {
        order: CreatedPaymentOrder,
    },
    Succeeded {
        order: CreatedPaymentOrder,
        payment_id: String,
    },
    Cancelled {
        order: CreatedPaymentOrder,
    },
    Failed {
        reason: String,
    },
}

impl PaymentFlow {
    /// Start a new order creation. Terminal states restart; an in-flight
    /// payment refuses.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` while a payment is already in progress.
    pub fn begin(self) -> Result<Self, PaymentError> {
        match self {
            Self::CreatingOrder | Self::AwaitingGateway { .. } => Err(
                PaymentError::InvalidTransition("a payment is already in progress"),
            ),
            Self::Idle | Self::Succeeded { .. } | Self::Cancelled { .. } | Self::Failed { .. } => {
                Ok(Self::CreatingOrder)
            }
        }
    }

    /// Record the created gateway order and start awaiting its result.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless an order creation is in progress.
    pub fn order_created(self, order: CreatedPaymentOrder) -> Result<Self, PaymentError> {
        match self {
            Self::CreatingOrder => Ok(Self::AwaitingGateway { order }),
            _ => Err(PaymentError::InvalidTransition(
                "no order creation in progress",
            )),
        }
    }

    /// Resolve the pending payment with the gateway's outcome.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless a gateway result is awaited.
    pub fn resolve(self, outcome: GatewayOutcome) -> Result<Self, PaymentError> {
        match self {
            Self::AwaitingGateway { order } => Ok(match outcome {
                GatewayOutcome::Completed { payment_id } => Self::Succeeded { order, payment_id },
                GatewayOutcome::Dismissed => Self::Cancelled { order },
            }),
            _ => Err(PaymentError::InvalidTransition(
                "no payment awaiting a gateway result",
            )),
        }
    }
}

/// Options payload handed to the embedded checkout widget.
#[derive(Debug, Clone, Serialize)]
pub struct WidgetOptions {
    /// Gateway key id (public).
    pub key: String,
    /// Amount in minor units (paise).
    pub amount: i64,
    pub currency: String,
    /// Gateway order id.
    pub order_id: String,
    /// Merchant display name.
    pub name: String,
    pub description: String,
    pub prefill: WidgetPrefill,
    pub theme_color: String,
    /// Local order row id, echoed back by the completion callback.
    pub db_order_id: rewear_core::OrderId,
}

/// Contact prefill for the checkout widget.
#[derive(Debug, Clone, Serialize)]
pub struct WidgetPrefill {
    pub name: String,
    pub email: String,
    pub contact: String,
}

/// Drives the payment flow: order creation, gateway resolution, and the
/// post-payment side effect.
pub struct CheckoutService<'a> {
    supabase: &'a SupabaseClient,
    razorpay: &'a RazorpayConfig,
    fees: Option<&'a FeeConfig>,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(
        supabase: &'a SupabaseClient,
        razorpay: &'a RazorpayConfig,
        fees: Option<&'a FeeConfig>,
    ) -> Self {
        Self {
            supabase,
            razorpay,
            fees,
        }
    }

    /// Begin a payment: quote the cart and create the gateway order.
    ///
    /// Requires a signed-in user; without one this aborts before any
    /// network call with `AuthRequired` and the flow stays where it was.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCart` for a cart with nothing to pay for and
    /// `OrderCreation` when the remote function rejects the order.
    pub async fn begin(
        &self,
        auth: Option<&SessionAuth>,
        flow: PaymentFlow,
        contact: Option<String>,
    ) -> Result<(PaymentFlow, WidgetOptions), PaymentError> {
        let Some(auth) = auth else {
            return Err(PaymentError::AuthRequired);
        };

        let flow = flow.begin()?;

        let items = self
            .supabase
            .cart_items(auth.user.id, &auth.access_token)
            .await?;
        if items.is_empty() {
            return Err(PaymentError::EmptyCart);
        }

        let quote = pricing::quote_cart(&items, self.fees, self.razorpay.currency);

        let order = self
            .supabase
            .functions()
            .create_payment_order(
                quote.total,
                self.razorpay.currency,
                auth.user.id,
                &auth.access_token,
            )
            .await
            .map_err(|error| PaymentError::OrderCreation(error.to_string()))?;

        let options = self.widget_options(&order, auth, contact).await;
        let flow = flow.order_created(order)?;

        Ok((flow, options))
    }

    async fn widget_options(
        &self,
        order: &CreatedPaymentOrder,
        auth: &SessionAuth,
        contact: Option<String>,
    ) -> WidgetOptions {
        // Prefill the payer name from the profile row; fall back to the
        // sign-up metadata, then to empty like the original widget.
        let profile_name = self
            .supabase
            .get_profile(auth.user.id, Some(&auth.access_token))
            .await
            .ok()
            .and_then(|profile| profile.full_name);
        let name = profile_name
            .or_else(|| auth.user.full_name.clone())
            .unwrap_or_default();

        WidgetOptions {
            key: self.razorpay.key_id.clone(),
            amount: Price::new(order.amount, self.razorpay.currency).to_minor_units(),
            currency: order.currency.clone(),
            order_id: order.order_id.clone(),
            name: MERCHANT_NAME.to_owned(),
            description: PAYMENT_DESCRIPTION.to_owned(),
            prefill: WidgetPrefill {
                name,
                email: auth.user.email.to_string(),
                contact: contact.unwrap_or_default(),
            },
            theme_color: self.razorpay.theme_color.clone(),
            db_order_id: order.db_order_id,
        }
    }

    /// Handle a completion callback from the widget.
    ///
    /// Forwards the callback to the remote verification function; a
    /// rejected signature leaves the order unpaid. On verified success
    /// the user's cart is cleared - a failure there is logged and never
    /// reverts the payment state.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` when no payment awaits a result and
    /// `Verification` when the callback does not match the pending order
    /// or the remote check rejects it.
    pub async fn complete(
        &self,
        auth: &SessionAuth,
        flow: PaymentFlow,
        completion: GatewayCompletion,
    ) -> Result<(PaymentFlow, VerifyPaymentResponse), PaymentError> {
        let PaymentFlow::AwaitingGateway { order } = &flow else {
            return Err(PaymentError::InvalidTransition(
                "no payment awaiting a gateway result",
            ));
        };

        if order.order_id != completion.razorpay_order_id
            || order.db_order_id != completion.db_order_id
        {
            return Err(PaymentError::Verification(
                "callback does not match the pending order".to_owned(),
            ));
        }

        let response = self
            .supabase
            .functions()
            .verify_payment(&completion, &auth.access_token)
            .await
            .map_err(|error| PaymentError::Verification(error.to_string()))?;

        if !response.success {
            return Err(PaymentError::Verification(response.status));
        }

        let flow = flow.resolve(GatewayOutcome::Completed {
            payment_id: completion.razorpay_payment_id,
        })?;

        // Post-payment side effect; a failure here is logged and does not
        // revert the payment state.
        if let Err(error) = self
            .supabase
            .clear_cart(auth.user.id, &auth.access_token)
            .await
        {
            tracing::error!(%error, "cart was not cleared after a successful payment");
        }

        Ok((flow, response))
    }

    /// Handle the widget's dismissal hook. The local order keeps its
    /// `created` status.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` when no payment awaits a result.
    pub fn cancel(&self, flow: PaymentFlow) -> Result<PaymentFlow, PaymentError> {
        flow.resolve(GatewayOutcome::Dismissed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    use rewear_core::OrderId;

    fn order() -> CreatedPaymentOrder {
        CreatedPaymentOrder {
            order_id: "order_LkTq8s".to_string(),
            currency: "INR".to_string(),
            amount: Decimal::from(2350),
            db_order_id: OrderId::generate(),
        }
    }

    #[test]
    fn test_begin_from_idle() {
        let flow = PaymentFlow::Idle.begin().unwrap();
        assert_eq!(flow, PaymentFlow::CreatingOrder);
    }

    #[test]
    fn test_begin_restarts_terminal_states() {
        for terminal in [
            PaymentFlow::Cancelled { order: order() },
            PaymentFlow::Failed {
                reason: "gateway down".to_string(),
            },
            PaymentFlow::Succeeded {
                order: order(),
                payment_id: "pay_1".to_string(),
            },
        ] {
            assert_eq!(terminal.begin().unwrap(), PaymentFlow::CreatingOrder);
        }
    }

    #[test]
    fn test_begin_refuses_while_in_flight() {
        let awaiting = PaymentFlow::AwaitingGateway { order: order() };
        assert!(matches!(
            awaiting.begin(),
            Err(PaymentError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_order_created_only_from_creating() {
        let flow = PaymentFlow::CreatingOrder.order_created(order()).unwrap();
        assert!(matches!(flow, PaymentFlow::AwaitingGateway { .. }));

        assert!(matches!(
            PaymentFlow::Idle.order_created(order()),
            Err(PaymentError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_dismissal_resolves_to_cancelled_not_paid() {
        let pending = order();
        let flow = PaymentFlow::AwaitingGateway {
            order: pending.clone(),
        };

        let resolved = flow.resolve(GatewayOutcome::Dismissed).unwrap();
        // The order rides along unchanged; only a verified completion can
        // produce Succeeded.
        assert_eq!(resolved, PaymentFlow::Cancelled { order: pending });
    }

    #[test]
    fn test_completion_resolves_to_succeeded() {
        let flow = PaymentFlow::AwaitingGateway { order: order() };
        let resolved = flow
            .resolve(GatewayOutcome::Completed {
                payment_id: "pay_9".to_string(),
            })
            .unwrap();
        assert!(matches!(resolved, PaymentFlow::Succeeded { .. }));
    }

    #[test]
    fn test_resolve_requires_pending_payment() {
        assert!(matches!(
            PaymentFlow::Idle.resolve(GatewayOutcome::Dismissed),
            Err(PaymentError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_flow_survives_session_serialization() {
        let flow = PaymentFlow::AwaitingGateway { order: order() };
        let json = serde_json::to_string(&flow).unwrap();
        let restored: PaymentFlow = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, flow);
    }

    #[tokio::test]
    async fn test_begin_without_auth_short_circuits() {
        use secrecy::SecretString;

        use crate::config::SupabaseConfig;

        // An unroutable backend: if begin touched the network this test
        // would fail rather than return immediately.
        let supabase = SupabaseClient::new(&SupabaseConfig {
            url: "http://192.0.2.1".parse().unwrap(),
            anon_key: SecretString::from("anon"),
        });
        let razorpay = RazorpayConfig {
            key_id: "rzp_test_k3y".to_string(),
            currency: rewear_core::CurrencyCode::INR,
            theme_color: "#6366F1".to_string(),
        };
        let service = CheckoutService::new(&supabase, &razorpay, None);

        let result = service.begin(None, PaymentFlow::Idle, None).await;
        assert!(matches!(result, Err(PaymentError::AuthRequired)));
    }
}
