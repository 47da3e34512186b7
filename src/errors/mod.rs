//! Error types for the order engine
//!
//! Every failure in this crate is recoverable at the boundary where it
//! occurs: store reads fail soft to an empty collection, ineligible item
//! transitions are no-ops, and remote mirror failures leave the local store
//! authoritative. Nothing here is expected to reach a top-level crash.

use thiserror::Error;

/// Order engine errors.
#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    /// Lock acquisition failed (poisoned interior mutex).
    #[error("failed to acquire lock")]
    Lock,

    /// Backing store entry was missing or unparseable.
    ///
    /// Callers of `RecordStore::load` never see this variant; the store
    /// recovers by treating the collection as empty and logging the cause.
    #[error("could not read collection `{collection}`: {reason}")]
    StoreRead {
        /// Collection key that failed to decode.
        collection: String,
        /// Decode or backend failure detail.
        reason:     String,
    },

    /// Writing a collection back to the backing store failed.
    #[error("could not write collection `{collection}`: {reason}")]
    StoreWrite {
        /// Collection key that failed to persist.
        collection: String,
        /// Backend failure detail.
        reason:     String,
    },

    /// Cancel/return/advance requested for an item that is unknown or
    /// already in a terminal status. A no-op for state, not a hard failure.
    #[error("item `{item_id}` in order `{order_id}` is not eligible for this transition")]
    ItemNotEligible {
        /// Order the request named.
        order_id: String,
        /// Item the request named.
        item_id:  String,
    },

    /// Checkout submitted an order with no line items.
    #[error("order has no items")]
    EmptyOrder,

    /// Checkout submitted a line item with quantity zero.
    #[error("invalid quantity")]
    InvalidQuantity,

    /// Remote order mirror unreachable or erroring. Swallowed at call
    /// sites; the local store stays authoritative for the session.
    #[error("remote mirror sync failed: {0}")]
    RemoteSync(String),
}

impl OrderFlowError {
    /// Whether this error means "nothing to do" rather than "something broke".
    #[must_use]
    pub fn is_not_eligible(&self) -> bool {
        matches!(self, Self::ItemNotEligible { .. })
    }
}

/// Result type for order engine operations.
pub type OrderFlowResult<T> = Result<T, OrderFlowError>;
