//! Remote serverless function invocation.
//!
//! The two payment functions own the gateway credentials: order creation
//! talks to the Razorpay API and records the order row; verification checks
//! the HMAC signature against the shared secret and marks the row paid.
//! Neither secret ever reaches this binary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::instrument;

use rewear_core::{CurrencyCode, OrderId, UserId};

use super::{ClientInner, SupabaseError, check_response};

/// A payment order as returned by `create-razorpay-order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedPaymentOrder {
    /// Gateway-side order id (`order_...`).
    pub order_id: String,
    pub currency: String,
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// Local `orders` row id.
    pub db_order_id: OrderId,
}

/// The gateway completion callback payload, forwarded verbatim to the
/// verification function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayCompletion {
    pub razorpay_payment_id: String,
    pub razorpay_order_id: String,
    pub razorpay_signature: String,
    pub db_order_id: OrderId,
}

/// Result of `verify-razorpay-payment`.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub order_id: OrderId,
    pub status: String,
}

#[derive(Serialize)]
struct CreateOrderRequest<'a> {
    amount: Decimal,
    currency: &'a str,
    #[serde(rename = "userId")]
    user_id: UserId,
}

/// Functions API handle, borrowed from [`super::SupabaseClient`].
pub struct FunctionsApi<'a> {
    pub(super) inner: &'a ClientInner,
}

impl FunctionsApi<'_> {
    async fn invoke<B, T>(&self, name: &str, body: &B, token: &str) -> Result<T, SupabaseError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let endpoint = format!("{}/functions/v1/{name}", self.inner.base_url);
        let request = self.inner.http.post(endpoint).json(body);
        let response = self.inner.authed(request, Some(token)).send().await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    /// Create a payment order for the given amount.
    ///
    /// The function records a local order row with status `created` and
    /// returns the gateway order to hand to the checkout widget.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the function rejects the
    /// amount.
    #[instrument(skip(self, token), fields(user_id = %user_id, amount = %amount))]
    pub async fn create_payment_order(
        &self,
        amount: Decimal,
        currency: CurrencyCode,
        user_id: UserId,
        token: &str,
    ) -> Result<CreatedPaymentOrder, SupabaseError> {
        self.invoke(
            "create-razorpay-order",
            &CreateOrderRequest {
                amount,
                currency: currency.code(),
                user_id,
            },
            token,
        )
        .await
    }

    /// Verify a gateway completion callback.
    ///
    /// On a valid signature the function marks the local order `paid`; on a
    /// mismatch it returns an error and the order stays unpaid.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or verification is rejected.
    #[instrument(skip(self, completion, token), fields(db_order_id = %completion.db_order_id))]
    pub async fn verify_payment(
        &self,
        completion: &GatewayCompletion,
        token: &str,
    ) -> Result<VerifyPaymentResponse, SupabaseError> {
        self.invoke("verify-razorpay-payment", completion, token).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_create_order_request_uses_camel_case_user_id() {
        let request = CreateOrderRequest {
            amount: Decimal::from(1500),
            currency: "INR",
            user_id: UserId::generate(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("userId").is_some());
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn test_created_order_deserializes_numeric_amount() {
        let json = serde_json::json!({
            "order_id": "order_LkTq8s",
            "currency": "INR",
            "amount": 2450.0,
            "db_order_id": "11111111-2222-3333-4444-555555555555"
        });

        let order: CreatedPaymentOrder = serde_json::from_value(json).unwrap();
        assert_eq!(order.amount, Decimal::from(2450));
    }
}
