//! Cart change events - broadcast after each completed operation

use serde::{Deserialize, Serialize};

/// Cart change event
///
/// Broadcast to all subscribers after the mutation has been applied and
/// persisted. Carries the item id and the resulting quantity so renderers
/// can update without re-reading the whole cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartEvent {
    /// Cart contents were replaced from durable storage
    CartLoaded {
        /// Number of line items restored
        item_count: usize,
    },
    /// A new line item entered the cart
    ItemAdded {
        /// Product ID
        id: String,
        /// Quantity after insertion
        quantity: u32,
    },
    /// Quantity increased on an existing line item
    ItemIncremented {
        /// Product ID
        id: String,
        /// Quantity after the increment
        quantity: u32,
    },
    /// Quantity decreased on an existing line item
    ItemDecremented {
        /// Product ID
        id: String,
        /// Quantity after the decrement
        quantity: u32,
    },
}
