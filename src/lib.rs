//! Marketplace Cart - persistent shopping cart state container
//!
//! Holds the current shopping cart in memory and rewrites the full
//! serialized cart to an embedded redb key-value store after every
//! mutation, so cart contents survive process restarts.
//!
//! # Module Structure
//!
//! ```text
//! src/
//! └── cart/
//!     ├── item.rs      # CartItem model and money helpers
//!     ├── event.rs     # Change notifications
//!     ├── error.rs     # Error taxonomy
//!     ├── storage.rs   # redb persistence layer
//!     └── store.rs     # CartStore operations
//! ```

pub mod cart;

// Re-export public types
pub use cart::{CartError, CartEvent, CartItem, CartResult, CartStorage, CartStore};
pub use cart::{StorageError, StorageResult};
