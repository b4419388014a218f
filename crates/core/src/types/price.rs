//! Money amounts using decimal arithmetic.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A monetary amount with currency information.
///
/// Amounts are stored in the currency's standard unit (rupees, not paise)
/// and are never negative: construction clamps at zero, matching the remote
/// catalog where a missing price or deposit is treated as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price, clamping negative amounts to zero.
    #[must_use]
    pub fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount: amount.max(Decimal::ZERO),
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency_code,
        }
    }

    /// Amount in the currency's minor unit (paise for INR, cents for USD),
    /// rounded half-away-from-zero. Payment gateways take integer minor
    /// units.
    #[must_use]
    pub fn to_minor_units(&self) -> i64 {
        (self.amount * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or(0)
    }

    /// Format for display (e.g., "₹1499.00").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.amount)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INR" => Ok(Self::INR),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            _ => Err(format!("unsupported currency code: {s}")),
        }
    }
}

impl CurrencyCode {
    /// Currency symbol for display.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// ISO 4217 code as a string.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_amount_clamped() {
        let price = Price::new(Decimal::new(-500, 0), CurrencyCode::INR);
        assert_eq!(price.amount, Decimal::ZERO);
    }

    #[test]
    fn test_to_minor_units() {
        let price = Price::new(Decimal::new(149950, 2), CurrencyCode::INR);
        assert_eq!(price.to_minor_units(), 149_950);

        let whole = Price::new(Decimal::new(1500, 0), CurrencyCode::INR);
        assert_eq!(whole.to_minor_units(), 150_000);
    }

    #[test]
    fn test_to_minor_units_rounds_sub_paise() {
        // 10.005 rupees rounds away from zero to 1001 paise
        let price = Price::new(Decimal::new(10_005, 3), CurrencyCode::INR);
        assert_eq!(price.to_minor_units(), 1001);
    }

    #[test]
    fn test_display() {
        let price = Price::new(Decimal::new(1500, 0), CurrencyCode::INR);
        assert_eq!(price.display(), "₹1500.00");
    }
}
