//! # Money & Tax Calculator
//!
//! Monetary values are carried in currency minor units (`i64`) so tax
//! rounding is exact. Tax rates are flat per-line numerics stored in basis
//! points; the calculator functions are pure and side-effect free.

use crate::cart::{CartLine, CartTotals};
use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    USD,
    EUR,
    GBP,
    INR,
    JPY,
    CAD,
    AUD,
    SGD,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::USD => "usd",
            Currency::EUR => "eur",
            Currency::GBP => "gbp",
            Currency::INR => "inr",
            Currency::JPY => "jpy",
            Currency::CAD => "cad",
            Currency::AUD => "aud",
            Currency::SGD => "sgd",
        }
    }

    /// Returns the number of decimal places for this currency
    /// (JPY has 0 decimals, the others here have 2)
    pub fn decimal_places(&self) -> u8 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    /// Convert a decimal amount to minor units (cents, paise, ...)
    pub fn to_minor_units(&self, amount: f64) -> i64 {
        let multiplier = 10_f64.powi(self.decimal_places() as i32);
        (amount * multiplier).round() as i64
    }

    /// Convert from minor units back to a decimal amount
    pub fn from_minor_units(&self, minor: i64) -> f64 {
        let divisor = 10_f64.powi(self.decimal_places() as i32);
        minor as f64 / divisor
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::INR
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// A monetary value in minor units of its currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in minor units (paise for INR, cents for USD)
    pub minor: i64,
    /// Currency
    pub currency: Currency,
}

impl Money {
    /// Create from a decimal amount
    pub fn new(amount: f64, currency: Currency) -> Self {
        Self {
            minor: currency.to_minor_units(amount),
            currency,
        }
    }

    /// Create from minor units
    pub fn from_minor(minor: i64, currency: Currency) -> Self {
        Self { minor, currency }
    }

    /// Zero in the given currency
    pub fn zero(currency: Currency) -> Self {
        Self { minor: 0, currency }
    }

    /// Get the decimal amount
    pub fn as_decimal(&self) -> f64 {
        self.currency.from_minor_units(self.minor)
    }

    pub fn is_positive(&self) -> bool {
        self.minor > 0
    }

    /// Format for display (e.g., "₹210.00")
    pub fn display(&self) -> String {
        let symbol = match self.currency {
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::INR => "₹",
            Currency::JPY => "¥",
            Currency::CAD => "C$",
            Currency::AUD => "A$",
            Currency::SGD => "S$",
        };
        if self.currency.decimal_places() == 0 {
            format!("{}{}", symbol, self.minor)
        } else {
            format!("{}{:.2}", symbol, self.as_decimal())
        }
    }
}

/// Flat per-line tax rate, stored in basis points (1% == 100 bps).
///
/// The source data carried the rate as a plain numeric percentage on each
/// item; it is never a nested object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Zero-rated
    pub fn zero() -> Self {
        Self(0)
    }

    /// Build from basis points
    pub fn from_basis_points(bps: u32) -> Self {
        Self(bps)
    }

    /// Build from a percentage; rejects negative or non-finite input
    pub fn from_percent(percent: f64) -> EngineResult<Self> {
        if !percent.is_finite() || percent < 0.0 {
            return Err(EngineError::InvalidAmount(format!(
                "tax rate must be a non-negative percentage, got {percent}"
            )));
        }
        Ok(Self((percent * 100.0).round() as u32))
    }

    pub fn basis_points(&self) -> u32 {
        self.0
    }

    pub fn as_percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

/// Total price of a line: `unit_price * quantity`.
pub fn line_total(unit_price: Money, quantity: u32) -> EngineResult<Money> {
    if unit_price.minor < 0 {
        return Err(EngineError::InvalidAmount(format!(
            "unit price must not be negative, got {}",
            unit_price.minor
        )));
    }
    let minor = unit_price
        .minor
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| EngineError::InvalidAmount("line total overflows".to_string()))?;
    Ok(Money::from_minor(minor, unit_price.currency))
}

/// Tax owed on a line: `unit_price * quantity * rate / 100`, rounded to
/// minor-unit precision with round-half-up.
pub fn line_tax(unit_price: Money, quantity: u32, rate: TaxRate) -> EngineResult<Money> {
    let total = line_total(unit_price, quantity)?;
    let scaled = total
        .minor
        .checked_mul(i64::from(rate.basis_points()))
        .ok_or_else(|| EngineError::InvalidAmount("line tax overflows".to_string()))?;
    // scaled is non-negative here, so truncating division rounds half up
    let tax = (scaled + 5_000) / 10_000;
    Ok(Money::from_minor(tax, unit_price.currency))
}

/// Fold subtotal, total tax and grand total over all cart lines.
pub fn cart_totals(lines: &[CartLine]) -> EngineResult<CartTotals> {
    let mut subtotal: i64 = 0;
    let mut total_tax: i64 = 0;
    for line in lines {
        subtotal = subtotal
            .checked_add(line_total(line.unit_price, line.quantity)?.minor)
            .ok_or_else(|| EngineError::InvalidAmount("subtotal overflows".to_string()))?;
        total_tax = total_tax
            .checked_add(line_tax(line.unit_price, line.quantity, line.tax_rate)?.minor)
            .ok_or_else(|| EngineError::InvalidAmount("total tax overflows".to_string()))?;
    }
    Ok(CartTotals {
        subtotal,
        total_tax,
        grand_total: subtotal + total_tax,
    })
}
