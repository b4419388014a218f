//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Remote session handling (sign-up, sign-in, sign-out)
//! - `conversations` - Message fetches and conversation aggregation
//! - `payments` - Checkout payment flow against the gateway functions
//! - `pricing` - Rental duration and cart quote arithmetic
//!
//! Plain CRUD has no service; route handlers call
//! [`crate::supabase::SupabaseClient`] directly.

pub mod auth;
pub mod conversations;
pub mod payments;
pub mod pricing;
