//! Cart line items and money arithmetic
//!
//! Prices travel as `f64` in the serialized form; all arithmetic is done
//! with `Decimal` internally and rounded to 2 decimal places before being
//! converted back for display.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::{CartError, CartResult};

/// Rounding for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed unit price
const MAX_PRICE: f64 = 1_000_000.0;

/// Maximum allowed quantity per line item
const MAX_QUANTITY: u32 = 9999;

/// A product line item in the cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    /// Product ID (unique within the cart)
    pub id: String,
    /// Display title
    pub title: String,
    /// Product image reference
    pub image_url: String,
    /// Unit price
    pub price: f64,
    /// Quantity (>= 1 for any item present in the cart)
    pub quantity: u32,
}

impl CartItem {
    /// Line total (`price * quantity`), rounded to 2 decimal places
    pub fn line_total(&self) -> f64 {
        to_f64(to_decimal(self.price) * Decimal::from(self.quantity))
    }

    /// Validate the item before it enters the cart
    ///
    /// A stated quantity of 0 is accepted: insertion raises it by one, so
    /// any item present in the cart ends up with quantity >= 1.
    pub fn validate(&self) -> CartResult<()> {
        if self.id.is_empty() {
            return Err(CartError::InvalidItem("id must not be empty".to_string()));
        }
        if !self.price.is_finite() {
            return Err(CartError::InvalidItem(format!(
                "price must be a finite number, got {}",
                self.price
            )));
        }
        if self.price < 0.0 {
            return Err(CartError::InvalidItem(format!(
                "price must be non-negative, got {}",
                self.price
            )));
        }
        if self.price > MAX_PRICE {
            return Err(CartError::InvalidItem(format!(
                "price exceeds maximum allowed ({}), got {}",
                MAX_PRICE, self.price
            )));
        }
        if self.quantity > MAX_QUANTITY {
            return Err(CartError::InvalidItem(format!(
                "quantity exceeds maximum allowed ({}), got {}",
                MAX_QUANTITY, self.quantity
            )));
        }
        Ok(())
    }
}

/// Convert f64 to Decimal for precise calculation
#[inline]
pub(crate) fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64, rounded to 2 decimal places (half-up)
#[inline]
pub(crate) fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}
