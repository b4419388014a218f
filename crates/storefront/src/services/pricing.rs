//! Rental duration and cart quote arithmetic.
//!
//! Pure functions over fetched cart rows; nothing here touches the
//! network. The pricing policy is duration-multiplied: a line costs its
//! per-day price times the rental duration, the deposit is a refundable
//! hold summed separately, and an optional fee schedule adds a flat
//! delivery fee plus a service percentage of the subtotal.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use rewear_core::{CartItemId, CurrencyCode, Price, ProductId};

use crate::config::FeeConfig;
use crate::supabase::CartItemRow;

/// Milliseconds per rental day.
const MS_PER_DAY: i64 = 86_400_000;

/// Rental duration in days for a date range.
///
/// The duration is the millisecond delta divided by a day, rounded up,
/// with a floor of one day. A missing date on either end also means one
/// day. The range may be given in either order.
#[must_use]
pub fn rental_days(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> i64 {
    let (Some(start), Some(end)) = (start, end) else {
        return 1;
    };

    let ms = (end - start).num_milliseconds().abs();
    // `ms` is non-negative (`.abs()`) and `MS_PER_DAY` is positive, so the
    // stable unsigned `div_ceil` yields the same result as the (nightly-only)
    // signed one the author wrote.
    i64::try_from((ms as u64).div_ceil(MS_PER_DAY as u64)).unwrap_or(i64::MAX).max(1)
}

/// Per-item figures on a checkout quote.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteLine {
    pub cart_item_id: CartItemId,
    pub product_id: ProductId,
    pub title: String,
    pub days: i64,
    pub price_per_day: Decimal,
    pub line_total: Decimal,
    pub deposit: Decimal,
}

/// Aggregate monetary figures for the checkout summary.
#[derive(Debug, Clone, Serialize)]
pub struct CartQuote {
    pub lines: Vec<QuoteLine>,
    /// Sum of line totals (rental revenue).
    pub subtotal: Decimal,
    /// Sum of deposits (refundable hold, not revenue).
    pub deposit_total: Decimal,
    /// Flat delivery fee, zero without a fee schedule.
    pub delivery_fee: Decimal,
    /// Percentage service fee on the subtotal, zero without a schedule.
    pub service_fee: Decimal,
    /// subtotal + deposit + fees.
    pub total: Decimal,
    pub currency: CurrencyCode,
}

/// Compute the checkout quote for a fetched cart.
///
/// An empty cart quotes a zero subtotal and deposit; with a fee schedule
/// configured the grand total is then the flat fee alone.
#[must_use]
pub fn quote_cart(
    items: &[CartItemRow],
    fees: Option<&FeeConfig>,
    currency: CurrencyCode,
) -> CartQuote {
    let lines: Vec<QuoteLine> = items
        .iter()
        .map(|item| {
            let days = rental_days(item.rental_start_date, item.rental_end_date);
            // Clamp through Price: a missing or negative price/deposit is zero.
            let price_per_day = Price::new(item.product.price, currency).amount;
            let deposit =
                Price::new(item.product.deposit.unwrap_or(Decimal::ZERO), currency).amount;

            QuoteLine {
                cart_item_id: item.id,
                product_id: item.product_id,
                title: item.product.title.clone(),
                days,
                price_per_day,
                line_total: price_per_day * Decimal::from(days),
                deposit,
            }
        })
        .collect();

    let subtotal: Decimal = lines.iter().map(|line| line.line_total).sum();
    let deposit_total: Decimal = lines.iter().map(|line| line.deposit).sum();

    let (delivery_fee, service_fee) = fees.map_or((Decimal::ZERO, Decimal::ZERO), |schedule| {
        (
            schedule.delivery_fee,
            (subtotal * schedule.service_fee_rate).round_dp(2),
        )
    });

    CartQuote {
        total: subtotal + deposit_total + delivery_fee + service_fee,
        lines,
        subtotal,
        deposit_total,
        delivery_fee,
        service_fee,
        currency,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use rewear_core::{ProductId, UserId};

    use crate::supabase::ProductRow;

    fn date(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, day, hour, 0, 0).unwrap()
    }

    fn cart_item(
        price: Decimal,
        deposit: Option<Decimal>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> CartItemRow {
        let product_id = ProductId::generate();
        CartItemRow {
            id: CartItemId::generate(),
            product_id,
            rental_start_date: start,
            rental_end_date: end,
            product: ProductRow {
                id: product_id,
                owner_id: UserId::generate(),
                title: "Linen kurta".to_string(),
                description: None,
                image_url: None,
                price,
                deposit,
                size: Some("M".to_string()),
                condition: Some("Good".to_string()),
                age: None,
                created_at: date(1, 0),
                updated_at: date(1, 0),
            },
        }
    }

    #[test]
    fn test_rental_days_without_dates_is_one() {
        assert_eq!(rental_days(None, None), 1);
        assert_eq!(rental_days(Some(date(1, 10)), None), 1);
        assert_eq!(rental_days(None, Some(date(4, 10))), 1);
    }

    #[test]
    fn test_rental_days_exactly_three_days() {
        assert_eq!(rental_days(Some(date(1, 10)), Some(date(4, 10))), 3);
    }

    #[test]
    fn test_rental_days_rounds_partial_days_up() {
        // 2 days and 5 hours -> 3 days
        assert_eq!(rental_days(Some(date(1, 10)), Some(date(3, 15))), 3);
    }

    #[test]
    fn test_rental_days_reversed_range() {
        assert_eq!(rental_days(Some(date(4, 10)), Some(date(1, 10))), 3);
    }

    #[test]
    fn test_rental_days_same_instant_is_one() {
        assert_eq!(rental_days(Some(date(2, 10)), Some(date(2, 10))), 1);
    }

    #[test]
    fn test_quote_empty_cart() {
        let quote = quote_cart(&[], None, CurrencyCode::INR);
        assert_eq!(quote.subtotal, Decimal::ZERO);
        assert_eq!(quote.deposit_total, Decimal::ZERO);
        assert_eq!(quote.total, Decimal::ZERO);
        assert!(quote.lines.is_empty());
    }

    #[test]
    fn test_quote_empty_cart_with_fees_is_flat_fee_alone() {
        let fees = FeeConfig {
            delivery_fee: Decimal::from(49),
            service_fee_rate: Decimal::new(5, 2), // 5%
        };
        let quote = quote_cart(&[], Some(&fees), CurrencyCode::INR);
        assert_eq!(quote.subtotal, Decimal::ZERO);
        assert_eq!(quote.service_fee, Decimal::ZERO);
        assert_eq!(quote.total, Decimal::from(49));
    }

    #[test]
    fn test_quote_multiplies_price_by_duration() {
        let items = vec![cart_item(
            Decimal::from(450),
            Some(Decimal::from(1000)),
            Some(date(1, 10)),
            Some(date(4, 10)),
        )];

        let quote = quote_cart(&items, None, CurrencyCode::INR);
        assert_eq!(quote.lines.len(), 1);
        assert_eq!(quote.lines[0].days, 3);
        assert_eq!(quote.lines[0].line_total, Decimal::from(1350));
        assert_eq!(quote.subtotal, Decimal::from(1350));
        assert_eq!(quote.deposit_total, Decimal::from(1000));
        assert_eq!(quote.total, Decimal::from(2350));
    }

    #[test]
    fn test_quote_undated_item_costs_one_day() {
        let items = vec![cart_item(Decimal::from(300), None, None, None)];

        let quote = quote_cart(&items, None, CurrencyCode::INR);
        assert_eq!(quote.lines[0].days, 1);
        assert_eq!(quote.subtotal, Decimal::from(300));
        // Missing deposit is zero
        assert_eq!(quote.deposit_total, Decimal::ZERO);
        assert_eq!(quote.total, Decimal::from(300));
    }

    #[test]
    fn test_quote_with_fee_schedule() {
        let items = vec![
            cart_item(Decimal::from(200), Some(Decimal::from(500)), None, None),
            cart_item(
                Decimal::from(100),
                None,
                Some(date(1, 0)),
                Some(date(3, 0)),
            ),
        ];
        let fees = FeeConfig {
            delivery_fee: Decimal::from(49),
            service_fee_rate: Decimal::new(5, 2), // 5%
        };

        let quote = quote_cart(&items, Some(&fees), CurrencyCode::INR);
        // 200*1 + 100*2 = 400 subtotal
        assert_eq!(quote.subtotal, Decimal::from(400));
        assert_eq!(quote.delivery_fee, Decimal::from(49));
        assert_eq!(quote.service_fee, Decimal::from(20));
        assert_eq!(quote.total, Decimal::from(969));
    }

    #[test]
    fn test_quote_clamps_negative_price() {
        let items = vec![cart_item(Decimal::from(-250), None, None, None)];
        let quote = quote_cart(&items, None, CurrencyCode::INR);
        assert_eq!(quote.subtotal, Decimal::ZERO);
    }
}
