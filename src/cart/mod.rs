//! Shopping Cart Module
//!
//! This module implements the cart state container:
//!
//! - **store**: Core CartStore holding in-memory state and the mutating operations
//! - **storage**: redb-based persistence layer (single fixed key, full-snapshot writes)
//! - **item**: CartItem model, validation, and money arithmetic
//! - **event**: Change notifications broadcast to subscribers
//!
//! # Data Flow
//!
//! ```text
//! Operation → CartStore → in-memory mutation (write lock)
//!                  ↓
//!            Storage (redb, full snapshot rewrite)
//!                  ↓
//!            Broadcast CartEvent to all subscribers
//! ```
//!
//! 1. UI callback invokes an operation on CartStore
//! 2. The in-memory item list is mutated under the write lock
//! 3. The updated snapshot is serialized and persisted on the blocking pool
//! 4. A CartEvent is broadcast to all subscribers
//! 5. The operation returns; lookup misses are silent no-ops

pub mod error;
pub mod event;
pub mod item;
pub mod storage;
pub mod store;

// Re-exports
pub use error::{CartError, CartResult};
pub use event::CartEvent;
pub use item::CartItem;
pub use storage::{CartStorage, StorageError, StorageResult, CART_KEY};
pub use store::CartStore;
