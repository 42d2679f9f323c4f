//! # Cart Aggregate
//!
//! In-memory cart state with the single-seller invariant and tax-inclusive
//! totals. Every public operation either mutates the cart and recomputes the
//! totals, or rejects without touching state at all — there is no partial
//! failure path.

use crate::error::{EngineError, EngineResult};
use crate::money::{self, Currency, Money, TaxRate};
use serde::{Deserialize, Serialize};

/// A line in the cart. Identity is `id`; repeat adds merge by incrementing
/// the quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Item identifier (menu item, product)
    pub id: String,

    /// Display name (denormalized)
    pub name: String,

    /// Unit price
    pub unit_price: Money,

    /// Quantity
    pub quantity: u32,

    /// Seller owning this line
    pub seller_id: String,

    /// Flat per-item tax rate
    #[serde(default)]
    pub tax_rate: TaxRate,
}

impl CartLine {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
        seller_id: impl Into<String>,
        tax_rate: TaxRate,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            quantity,
            seller_id: seller_id.into(),
            tax_rate,
        }
    }

    /// Total price for this line
    pub fn total(&self) -> EngineResult<Money> {
        money::line_total(self.unit_price, self.quantity)
    }

    /// Tax owed on this line
    pub fn tax(&self) -> EngineResult<Money> {
        money::line_tax(self.unit_price, self.quantity, self.tax_rate)
    }
}

/// Derived totals, recomputed after every mutation. At every observable
/// point `grand_total == subtotal + total_tax`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Sum of line totals, minor units
    pub subtotal: i64,
    /// Sum of per-line taxes, minor units
    pub total_tax: i64,
    /// subtotal + total_tax
    pub grand_total: i64,
}

/// The cart aggregate. Lines keep insertion order for display; totals do not
/// depend on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    currency: Currency,
    totals: CartTotals,
    /// Optional per-line quantity ceiling; unconstrained when `None`
    #[serde(default)]
    quantity_limit: Option<u32>,
}

impl Cart {
    /// Create an empty cart
    pub fn new(currency: Currency) -> Self {
        Self {
            lines: Vec::new(),
            currency,
            totals: CartTotals::default(),
            quantity_limit: None,
        }
    }

    /// Builder: cap the quantity of any single line
    pub fn with_quantity_limit(mut self, limit: u32) -> Self {
        self.quantity_limit = Some(limit);
        self
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn totals(&self) -> CartTotals {
        self.totals
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total unit count across all lines
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Seller owning the cart, if non-empty
    pub fn seller_id(&self) -> Option<&str> {
        self.lines.first().map(|l| l.seller_id.as_str())
    }

    /// Add a line, merging by id.
    ///
    /// Rejects without mutating: a line from a different seller
    /// (`CrossSellerConflict`), a negative price (`InvalidAmount`), a
    /// currency mismatch (`InvalidAmount`), or a merge past the quantity
    /// ceiling (`QuantityLimitExceeded`). A zero-quantity add is a no-op.
    pub fn add_line(&mut self, line: CartLine) -> EngineResult<()> {
        if line.quantity == 0 {
            return Ok(());
        }
        if line.unit_price.currency != self.currency {
            return Err(EngineError::InvalidAmount(format!(
                "line priced in {} cannot join a {} cart",
                line.unit_price.currency, self.currency
            )));
        }
        // Validates the price sign and overflow before any mutation
        line.tax()?;

        if let Some(seller) = self.seller_id() {
            if seller != line.seller_id {
                return Err(EngineError::CrossSellerConflict {
                    in_cart: seller.to_string(),
                    offered: line.seller_id,
                });
            }
        }

        let merged_quantity = match self.lines.iter().find(|l| l.id == line.id) {
            Some(existing) => existing.quantity.saturating_add(line.quantity),
            None => line.quantity,
        };
        if let Some(limit) = self.quantity_limit {
            if merged_quantity > limit {
                return Err(EngineError::QuantityLimitExceeded {
                    item_id: line.id,
                    limit,
                });
            }
        }

        match self.lines.iter_mut().find(|l| l.id == line.id) {
            Some(existing) => existing.quantity = merged_quantity,
            None => self.lines.push(line),
        }
        self.recalculate()
    }

    /// Decrement a line's quantity by `delta`, removing it when the quantity
    /// reaches zero. `ItemNotFound` if the id is absent (cart unchanged).
    pub fn remove_line(&mut self, id: &str, delta: u32) -> EngineResult<()> {
        let index = self
            .lines
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| EngineError::ItemNotFound {
                item_id: id.to_string(),
            })?;

        let remaining = self.lines[index].quantity.saturating_sub(delta);
        if remaining == 0 {
            self.lines.remove(index);
        } else {
            self.lines[index].quantity = remaining;
        }
        self.recalculate()
    }

    /// Empty the cart and zero the totals. Idempotent.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.totals = CartTotals::default();
    }

    /// Immutable view for the checkout flow. The cart may keep mutating
    /// after a snapshot is taken; checkout must operate on the snapshot only.
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self.lines.clone(),
            currency: self.currency,
            totals: self.totals,
            seller_id: self.seller_id().map(String::from),
        }
    }

    fn recalculate(&mut self) -> EngineResult<()> {
        self.totals = money::cart_totals(&self.lines)?;
        Ok(())
    }
}

/// Frozen copy of the cart handed to the checkout flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
    pub currency: Currency,
    pub totals: CartTotals,
    pub seller_id: Option<String>,
}

impl CartSnapshot {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn grand_total(&self) -> Money {
        Money::from_minor(self.totals.grand_total, self.currency)
    }

    /// Recompute the totals from the lines and compare against the carried
    /// values. A mismatch means the snapshot was tampered with or the totals
    /// identity was broken upstream.
    pub fn verify_totals(&self) -> EngineResult<()> {
        let recomputed = money::cart_totals(&self.lines)?;
        if recomputed != self.totals {
            return Err(EngineError::InvalidAmount(format!(
                "snapshot totals out of sync: carried {:?}, recomputed {:?}",
                self.totals, recomputed
            )));
        }
        Ok(())
    }
}
