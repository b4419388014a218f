//! Boundary types for the hosted backend tables.
//!
//! Every remote row is deserialized into an explicit record here, at the
//! service boundary; nothing downstream works with loosely-typed JSON.
//! Field names match the remote columns, including the embedded-resource
//! keys PostgREST uses for joins (`products`, `sender`, `receiver`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rewear_core::{CartItemId, FavoriteId, MessageId, OrderId, OrderStatus, ProductId, UserId};

// =============================================================================
// Profiles
// =============================================================================

/// A row in the `profiles` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: UserId,
    pub username: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Profile columns embedded on a message row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRef {
    pub username: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

// =============================================================================
// Products
// =============================================================================

/// A row in the `products` table.
///
/// `price` is the rental price per day; `deposit` is the refundable hold.
/// Both are treated as zero when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRow {
    pub id: ProductId,
    pub owner_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Decimal,
    pub deposit: Option<Decimal>,
    pub size: Option<String>,
    pub condition: Option<String>,
    pub age: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product columns embedded on a message row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub title: String,
    pub image_url: Option<String>,
}

/// Insert payload for `products`.
#[derive(Debug, Clone, Serialize)]
pub struct NewProduct {
    pub owner_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Decimal,
    pub deposit: Option<Decimal>,
    pub size: Option<String>,
    pub condition: Option<String>,
    pub age: Option<String>,
}

/// Update payload for `products`; only set fields are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
}

impl ProductPatch {
    /// True when no field is set; such a patch would be a no-op PATCH.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
            && self.price.is_none()
            && self.deposit.is_none()
            && self.size.is_none()
            && self.condition.is_none()
            && self.age.is_none()
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A row in `cart_items` with its product embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemRow {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub rental_start_date: Option<DateTime<Utc>>,
    pub rental_end_date: Option<DateTime<Utc>>,
    #[serde(rename = "products")]
    pub product: ProductRow,
}

/// A `cart_items` row as returned from inserts, without the product embed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BareCartItemRow {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub rental_start_date: Option<DateTime<Utc>>,
    pub rental_end_date: Option<DateTime<Utc>>,
}

/// Insert payload for `cart_items`.
#[derive(Debug, Clone, Serialize)]
pub struct NewCartItem {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub rental_start_date: Option<DateTime<Utc>>,
    pub rental_end_date: Option<DateTime<Utc>>,
}

// =============================================================================
// Favorites
// =============================================================================

/// A row in the `favorites` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteRow {
    pub id: FavoriteId,
    pub user_id: UserId,
    pub product_id: ProductId,
}

/// Projection of `favorites` onto its product reference.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FavoriteProductId {
    pub product_id: ProductId,
}

// =============================================================================
// Messages
// =============================================================================

/// A row in the `messages` table with sender/receiver profiles and the
/// referenced product embedded.
///
/// Immutable once created except for the `read` flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub product_id: Option<ProductId>,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub sender: Option<ProfileRef>,
    #[serde(default)]
    pub receiver: Option<ProfileRef>,
    #[serde(default)]
    pub product: Option<ProductRef>,
}

/// Insert payload for `messages`.
#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub product_id: Option<ProductId>,
    pub content: String,
    pub read: bool,
}

// =============================================================================
// Orders
// =============================================================================

/// A row in the `orders` table.
///
/// Rows are inserted by the remote `create-razorpay-order` function with
/// status `created` and flipped to `paid` by `verify-razorpay-payment`;
/// the storefront only ever reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRow {
    pub id: OrderId,
    pub user_id: UserId,
    pub amount: Decimal,
    pub currency: String,
    pub razorpay_order_id: String,
    pub status: OrderStatus,
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_item_row_embeds_product() {
        let json = serde_json::json!({
            "id": "7b1c8a52-13a5-4e5e-8f2a-4a35f2f9c111",
            "product_id": "0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0",
            "rental_start_date": null,
            "rental_end_date": null,
            "products": {
                "id": "0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0",
                "owner_id": "11111111-2222-3333-4444-555555555555",
                "title": "Silk saree",
                "description": null,
                "image_url": null,
                "price": 450,
                "deposit": 1000,
                "size": "M",
                "condition": "Like new",
                "age": null,
                "created_at": "2025-05-01T10:00:00Z",
                "updated_at": "2025-05-01T10:00:00Z"
            }
        });

        let row: CartItemRow = serde_json::from_value(json).unwrap();
        assert_eq!(row.product.title, "Silk saree");
        assert_eq!(row.product.price, Decimal::from(450));
        assert!(row.rental_start_date.is_none());
    }

    #[test]
    fn test_message_row_without_embeds() {
        // Plain thread fetches skip the profile/product joins.
        let json = serde_json::json!({
            "id": "7b1c8a52-13a5-4e5e-8f2a-4a35f2f9c111",
            "sender_id": "11111111-2222-3333-4444-555555555555",
            "receiver_id": "66666666-7777-8888-9999-aaaaaaaaaaaa",
            "product_id": null,
            "content": "Is this available?",
            "read": false,
            "created_at": "2025-05-01T10:00:00Z"
        });

        let row: MessageRow = serde_json::from_value(json).unwrap();
        assert!(row.sender.is_none());
        assert!(!row.read);
    }

    #[test]
    fn test_product_patch_skips_unset_fields() {
        let patch = ProductPatch {
            price: Some(Decimal::from(300)),
            ..ProductPatch::default()
        };

        let json = serde_json::to_value(&patch).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert!(object.contains_key("price"));
        assert!(!patch.is_empty());
        assert!(ProductPatch::default().is_empty());
    }
}
